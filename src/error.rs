//! Error types for the conversion pipeline

use thiserror::Error;

/// Message returned to the user when neither intake path carries audio
pub const INPUT_MISSING_MESSAGE: &str = "You need to record or upload an audio";

/// Errors raised by the conversion pipeline.
///
/// Every variant is caught at the [`ConversionEngine`](crate::ConversionEngine)
/// boundary and reported through a [`ConversionResult`](crate::ConversionResult).
#[derive(Error, Debug)]
pub enum VcError {
    #[error("You need to record or upload an audio")]
    InputMissing,

    #[error("unknown speaker: {0}")]
    UnknownSpeaker(String),

    #[error("invalid audio format: {0}")]
    InvalidAudioFormat(String),

    #[error("audio too short: {samples} samples, need at least {required}")]
    AudioTooShort { samples: usize, required: usize },

    #[error("sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("invalid analysis parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid speaker table: {0}")]
    InvalidSpeakerTable(String),

    #[error("voice conversion transform failed: {0}")]
    TransformFailure(String),

    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl From<rubato::ResamplerConstructionError> for VcError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        VcError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for VcError {
    fn from(e: rubato::ResampleError) -> Self {
        VcError::Resample(e.to_string())
    }
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, VcError>;
