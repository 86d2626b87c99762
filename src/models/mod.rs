//! Model-side types for voice conversion
//!
//! This module contains:
//! - `config`: hyperparameter file of a fine-tuned checkpoint
//! - `speaker`: speaker name to embedding index mapping
//! - `onnx`: ONNX backend for the conversion transform (feature `onnx`)
//!
//! The synthesizer itself is opaque. The pipeline only needs its
//! `voice_conversion` entry point, expressed as [`VoiceConversionModel`].

pub mod config;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod speaker;

pub use config::{DataConfig, VcConfig};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxIoNames, OnnxVoiceConversion};
pub use speaker::{SpeakerId, SpeakerIdentity, SpeakerRegistry};

use anyhow::Result;
use candle_core::Tensor;
use parking_lot::Mutex;

/// The pretrained voice-conversion transform.
///
/// `spec` is a linear magnitude spectrogram of shape
/// `[1, n_freq_bins, spec_len]`. The returned tensor holds the synthesized
/// waveform at the model sample rate in any shape that flattens to
/// `[samples]` (typically `[1, 1, samples]`).
///
/// Implementations must be safe to call from several threads at once.
/// Backends with mutable inference state implement
/// [`VoiceConversionModelMut`] and go through [`Serialized`] instead.
pub trait VoiceConversionModel: Send + Sync {
    fn voice_conversion(
        &self,
        spec: &Tensor,
        spec_len: usize,
        source: SpeakerId,
        target: SpeakerId,
    ) -> Result<Tensor>;
}

/// A transform that needs exclusive access while running
pub trait VoiceConversionModelMut: Send {
    fn voice_conversion(
        &mut self,
        spec: &Tensor,
        spec_len: usize,
        source: SpeakerId,
        target: SpeakerId,
    ) -> Result<Tensor>;
}

/// Runs a [`VoiceConversionModelMut`] one call at a time
pub struct Serialized<M> {
    inner: Mutex<M>,
}

impl<M: VoiceConversionModelMut> Serialized<M> {
    pub fn new(model: M) -> Self {
        Self {
            inner: Mutex::new(model),
        }
    }

    pub fn into_inner(self) -> M {
        self.inner.into_inner()
    }
}

impl<M: VoiceConversionModelMut> VoiceConversionModel for Serialized<M> {
    fn voice_conversion(
        &self,
        spec: &Tensor,
        spec_len: usize,
        source: SpeakerId,
        target: SpeakerId,
    ) -> Result<Tensor> {
        self.inner
            .lock()
            .voice_conversion(spec, spec_len, source, target)
    }
}

impl<M: VoiceConversionModel + ?Sized> VoiceConversionModel for Box<M> {
    fn voice_conversion(
        &self,
        spec: &Tensor,
        spec_len: usize,
        source: SpeakerId,
        target: SpeakerId,
    ) -> Result<Tensor> {
        (**self).voice_conversion(spec, spec_len, source, target)
    }
}

impl<M: VoiceConversionModel + ?Sized> VoiceConversionModel for std::sync::Arc<M> {
    fn voice_conversion(
        &self,
        spec: &Tensor,
        spec_len: usize,
        source: SpeakerId,
        target: SpeakerId,
    ) -> Result<Tensor> {
        (**self).voice_conversion(spec, spec_len, source, target)
    }
}
