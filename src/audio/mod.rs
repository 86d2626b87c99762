//! Audio processing for the conversion front end
//!
//! This module provides:
//! - WAV file I/O and the raw / canonical audio containers
//! - Input normalization (rescale, downmix, resample)
//! - Band-limited resampling
//! - Linear magnitude spectrograms

mod io;
pub mod normalize;
pub mod resample;
pub mod spectrogram;

pub use io::{load_wav, save_wav, AudioClip, RawAudio, SampleData};
pub use normalize::AudioNormalizer;
pub use resample::{ResampleQuality, Resampler};
pub use spectrogram::{Spectrogram, SpectrogramExtractor, SpectrogramParams, MAGNITUDE_EPSILON};
