//! # vits-vc
//!
//! Pure Rust inference front end for VITS voice conversion.
//!
//! Takes an utterance in whatever format the recorder or uploaded file
//! provides, brings it to the exact spectrogram the pretrained synthesizer
//! was trained on, runs the synthesizer's voice-conversion transform between
//! two known speakers, and returns playable audio.
//!
//! ## Features
//!
//! - **CPU**: Default, with optional MKL/Accelerate for faster BLAS
//! - **CUDA**: NVIDIA GPU acceleration
//! - **Metal**: Apple Silicon GPU acceleration
//! - **onnx**: Run an exported synthesizer with `candle-onnx`
//!
//! ## Example
//!
//! ```rust,ignore
//! use vits_vc::{ConversionEngine, ConversionRequest, RawAudio, VcConfig};
//! use vits_vc::models::OnnxVoiceConversion;
//!
//! let config = VcConfig::from_file("configs/finetune_speaker.json")?;
//! let model = OnnxVoiceConversion::from_file("G_latest.onnx")?;
//! let engine = ConversionEngine::from_config(&config, model, vits_vc::auto_device()?)?;
//!
//! let input = RawAudio::load("input.wav")?;
//! let result = engine.convert(ConversionRequest::new("User", "taffy", Some(input)));
//! if let Some(audio) = result.output_audio {
//!     audio.save("output.wav")?;
//! }
//! ```

pub mod audio;
pub mod conversion;
pub mod error;
pub mod models;

use anyhow::Result;
use candle_core::Device;

/// Re-exports for convenience
pub use audio::{AudioClip, AudioNormalizer, RawAudio, SampleData, SpectrogramExtractor};
pub use audio::{Spectrogram, SpectrogramParams};
pub use conversion::{ConversionEngine, ConversionRequest, ConversionResult, ConversionStatus};
pub use error::VcError;
pub use models::{SpeakerId, SpeakerRegistry, VcConfig, VoiceConversionModel};

/// Select the best available device
pub fn auto_device() -> Result<Device> {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::cuda_if_available(0) {
            if device.is_cuda() {
                tracing::info!("Using CUDA device");
                return Ok(device);
            }
        }
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            tracing::info!("Using Metal device");
            return Ok(device);
        }
    }

    tracing::info!("Using CPU device");
    Ok(Device::Cpu)
}

/// Parse a device name: `auto`, `cpu`, `cuda`, `cuda:N` or `metal`
pub fn parse_device(name: &str) -> Result<Device> {
    match name.to_lowercase().as_str() {
        "auto" => auto_device(),
        "cpu" => Ok(Device::Cpu),
        "cuda" => Ok(Device::new_cuda(0)?),
        "metal" => Ok(Device::new_metal(0)?),
        other => match other.strip_prefix("cuda:") {
            Some(ordinal) => {
                let ordinal: usize = ordinal
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid CUDA ordinal: {}", ordinal))?;
                Ok(Device::new_cuda(ordinal)?)
            }
            None => anyhow::bail!(
                "Unknown device: {}. Options: auto, cpu, cuda, cuda:N, metal",
                name
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_device() {
        // Should always succeed on CPU
        let device = auto_device().unwrap();
        assert!(
            matches!(device, Device::Cpu)
                || matches!(device, Device::Cuda(_))
                || matches!(device, Device::Metal(_))
        );
    }

    #[test]
    fn test_parse_device_cpu() {
        assert!(matches!(parse_device("cpu").unwrap(), Device::Cpu));
        assert!(matches!(parse_device("CPU").unwrap(), Device::Cpu));
    }

    #[test]
    fn test_parse_device_unknown() {
        let err = parse_device("tpu").unwrap_err();
        assert!(err.to_string().contains("Unknown device"));
    }

    #[test]
    fn test_parse_device_bad_ordinal() {
        assert!(parse_device("cuda:x").is_err());
    }

    #[test]
    fn test_reexports() {
        let clip = AudioClip::new(vec![0.0f32; 100], 22050);
        assert_eq!(clip.sample_rate, 22050);
        let params = SpectrogramParams::default();
        assert!(!params.center);
    }
}
