//! Request and result types of a single conversion

use crate::audio::{AudioClip, RawAudio};
use crate::error::VcError;

/// One conversion: two speaker names and at most one audio input
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source_speaker: String,
    pub target_speaker: String,
    pub audio: Option<RawAudio>,
}

impl ConversionRequest {
    pub fn new(
        source_speaker: impl Into<String>,
        target_speaker: impl Into<String>,
        audio: Option<RawAudio>,
    ) -> Self {
        Self {
            source_speaker: source_speaker.into(),
            target_speaker: target_speaker.into(),
            audio,
        }
    }

    /// Pick the input from the two intake paths; a recording wins over an
    /// upload.
    pub fn from_inputs(
        source_speaker: impl Into<String>,
        target_speaker: impl Into<String>,
        recorded: Option<RawAudio>,
        uploaded: Option<RawAudio>,
    ) -> Self {
        Self::new(source_speaker, target_speaker, recorded.or(uploaded))
    }
}

/// Outcome category of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Success,
    /// Neither a recording nor an upload was provided
    InputMissing,
    Failure,
}

/// Status, a human-readable message, and audio on success
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub status: ConversionStatus,
    pub message: String,
    /// Present iff `status == Success`
    pub output_audio: Option<AudioClip>,
}

impl ConversionResult {
    pub fn success(audio: AudioClip) -> Self {
        Self {
            status: ConversionStatus::Success,
            message: "Success".to_string(),
            output_audio: Some(audio),
        }
    }

    pub fn from_error(error: &VcError) -> Self {
        let status = match error {
            VcError::InputMissing => ConversionStatus::InputMissing,
            _ => ConversionStatus::Failure,
        };
        Self {
            status,
            message: error.to_string(),
            output_audio: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }

    /// `(sample_rate, samples)` ready for playback
    pub fn into_playback(self) -> Option<(u32, Vec<f32>)> {
        self.output_audio.map(|clip| (clip.sample_rate, clip.samples))
    }
}
