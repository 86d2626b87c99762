//! Single-utterance conversion pipeline
//!
//! normalize → spectrogram → model transform → waveform. Each call is
//! independent; the only shared state is the speaker table and the model,
//! both read-only.

use candle_core::Device;
use std::sync::Arc;

use super::{ConversionRequest, ConversionResult};
use crate::audio::{
    AudioClip, AudioNormalizer, RawAudio, SpectrogramExtractor, SpectrogramParams,
};
use crate::error::{Result, VcError};
use crate::models::{SpeakerRegistry, VcConfig, VoiceConversionModel};

/// Converts one utterance at a time from a source to a target speaker
pub struct ConversionEngine<M> {
    registry: Arc<SpeakerRegistry>,
    model: M,
    normalizer: AudioNormalizer,
    extractor: SpectrogramExtractor,
    device: Device,
}

impl<M: VoiceConversionModel> ConversionEngine<M> {
    /// Create an engine. `params` must be the analysis parameters the
    /// model was trained with.
    pub fn new(
        registry: Arc<SpeakerRegistry>,
        model: M,
        params: SpectrogramParams,
        device: Device,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            model,
            normalizer: AudioNormalizer::default(),
            extractor: SpectrogramExtractor::new(params)?,
            device,
        })
    }

    /// Build the registry and analysis parameters from a model config
    pub fn from_config(config: &VcConfig, model: M, device: Device) -> Result<Self> {
        let registry = Arc::new(SpeakerRegistry::from_config(config)?);
        Self::new(registry, model, config.spectrogram_params(), device)
    }

    /// Replace the default resampling quality
    pub fn with_normalizer(mut self, normalizer: AudioNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn registry(&self) -> &SpeakerRegistry {
        &self.registry
    }

    pub fn params(&self) -> &SpectrogramParams {
        self.extractor.params()
    }

    /// Output (and model) sample rate
    pub fn sample_rate(&self) -> u32 {
        self.extractor.params().sampling_rate
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Run one conversion. Never fails: errors become a `Failure` or
    /// `InputMissing` result with a readable message.
    pub fn convert(&self, request: ConversionRequest) -> ConversionResult {
        match self.try_convert(&request) {
            Ok(clip) => {
                tracing::info!(
                    source = %request.source_speaker,
                    target = %request.target_speaker,
                    samples = clip.len(),
                    "Conversion succeeded"
                );
                ConversionResult::success(clip)
            }
            Err(e) => {
                tracing::warn!(
                    source = %request.source_speaker,
                    target = %request.target_speaker,
                    error = %e,
                    "Conversion rejected"
                );
                ConversionResult::from_error(&e)
            }
        }
    }

    /// Same as [`convert`](Self::convert), taking the two intake paths
    pub fn convert_inputs(
        &self,
        source_speaker: &str,
        target_speaker: &str,
        recorded: Option<RawAudio>,
        uploaded: Option<RawAudio>,
    ) -> ConversionResult {
        self.convert(ConversionRequest::from_inputs(
            source_speaker,
            target_speaker,
            recorded,
            uploaded,
        ))
    }

    fn try_convert(&self, request: &ConversionRequest) -> Result<AudioClip> {
        let raw = match &request.audio {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(VcError::InputMissing),
        };

        let source = self.registry.resolve(&request.source_speaker)?;
        let target = self.registry.resolve(&request.target_speaker)?;

        let sample_rate = self.sample_rate();
        let clip = self.normalizer.normalize(raw, sample_rate)?;
        let spec = self.extractor.extract(&clip)?;
        let spec_len = spec.n_frames();
        let spec = spec.to_tensor(&self.device)?;

        tracing::debug!(
            source = source.get(),
            target = target.get(),
            spec_len,
            "Running voice conversion"
        );

        let waveform = self
            .model
            .voice_conversion(&spec, spec_len, source, target)
            .map_err(|e| VcError::TransformFailure(format!("{e:#}")))?;

        let output = AudioClip::from_tensor(&waveform, sample_rate)
            .map_err(|e| VcError::TransformFailure(format!("unreadable model output: {e:#}")))?;

        if output.is_empty() {
            return Err(VcError::TransformFailure(
                "model returned an empty waveform".to_string(),
            ));
        }
        if let Some(pos) = output.samples.iter().position(|s| !s.is_finite()) {
            return Err(VcError::TransformFailure(format!(
                "model returned a non-finite sample at index {pos}"
            )));
        }

        Ok(output)
    }
}
