//! Input canonicalization
//!
//! Turns whatever the recorder or the uploaded file delivered into the mono
//! `f32` waveform at the model's sampling rate.

use super::{AudioClip, RawAudio, ResampleQuality, Resampler, SampleData};
use crate::error::{Result, VcError};

/// Converts [`RawAudio`] of any encoding, channel count and rate into a
/// mono [`AudioClip`] at a fixed rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioNormalizer {
    resampler: Resampler,
}

impl AudioNormalizer {
    pub fn new(quality: ResampleQuality) -> Self {
        Self {
            resampler: Resampler::new(quality),
        }
    }

    /// Rescale, downmix and resample `raw` to `target_rate`.
    ///
    /// Only the resampling step is lossy; the first two are exact.
    pub fn normalize(&self, raw: &RawAudio, target_rate: u32) -> Result<AudioClip> {
        validate(raw)?;

        let interleaved = to_f32(&raw.data)?;
        let mono = downmix(interleaved, raw.channels);
        let clip = AudioClip::new(mono, raw.sample_rate);

        tracing::debug!(
            sample_rate = raw.sample_rate,
            channels = raw.channels,
            frames = clip.len(),
            target_rate,
            "Normalizing input audio"
        );

        self.resampler.resample(&clip, target_rate)
    }
}

/// Convenience function using the default resampler
pub fn normalize(raw: &RawAudio, target_rate: u32) -> Result<AudioClip> {
    AudioNormalizer::default().normalize(raw, target_rate)
}

fn validate(raw: &RawAudio) -> Result<()> {
    if raw.sample_rate == 0 {
        return Err(VcError::InvalidAudioFormat(
            "sample rate must be positive".to_string(),
        ));
    }
    if raw.channels == 0 {
        return Err(VcError::InvalidAudioFormat(
            "channel count must be at least 1".to_string(),
        ));
    }
    if raw.data.is_empty() {
        return Err(VcError::InvalidAudioFormat("no samples".to_string()));
    }
    if raw.data.len() % raw.channels != 0 {
        return Err(VcError::InvalidAudioFormat(format!(
            "{} samples do not divide into {} channels",
            raw.data.len(),
            raw.channels
        )));
    }
    let non_finite = match &raw.data {
        SampleData::F32(v) => v.iter().position(|s| !s.is_finite()),
        SampleData::F64(v) => v.iter().position(|s| !s.is_finite()),
        _ => None,
    };
    if let Some(index) = non_finite {
        return Err(VcError::InvalidAudioFormat(format!(
            "non-finite sample at index {index}"
        )));
    }
    Ok(())
}

/// Scale samples into [-1.0, 1.0] by the largest positive value the
/// encoding can hold. Division happens in `f64`, so full-scale input maps
/// to exactly 1.0.
fn to_f32(data: &SampleData) -> Result<Vec<f32>> {
    let scaled = match data {
        SampleData::U8(v) => scale(v.iter().map(|&s| s as f64 - 128.0), 127.0),
        SampleData::I16(v) => scale(v.iter().map(|&s| s as f64), i16::MAX as f64),
        SampleData::I32(v) => scale(v.iter().map(|&s| s as f64), i32::MAX as f64),
        SampleData::F32(v) => v.clone(),
        SampleData::F64(v) => v.iter().map(|&s| s as f32).collect(),
        SampleData::Packed {
            bits_per_sample,
            samples,
        } => {
            let bits = data.bits_per_sample().ok_or_else(|| {
                VcError::InvalidAudioFormat(format!(
                    "cannot determine sample width from {bits_per_sample} bits per sample"
                ))
            })?;
            let max = ((1u64 << (bits - 1)) - 1).max(1) as f64;
            scale(samples.iter().map(|&s| s as f64), max)
        }
    };
    Ok(scaled)
}

fn scale(samples: impl Iterator<Item = f64>, max: f64) -> Vec<f32> {
    samples.map(|s| (s / max) as f32).collect()
}

/// Arithmetic mean over interleaved channels
fn downmix(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
