//! Integration tests for vits-vc
//!
//! These tests drive the full pipeline with stand-in transforms in place of
//! real synthesizer weights.

use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use parking_lot::Mutex;
use std::sync::Arc;

use vits_vc::models::{Serialized, SpeakerId, VoiceConversionModelMut};
use vits_vc::{
    ConversionEngine, ConversionRequest, ConversionStatus, RawAudio, SampleData, VcConfig,
    VoiceConversionModel,
};

const CONFIG: &str = r#"{
    "data": {
        "sampling_rate": 22050,
        "filter_length": 1024,
        "hop_length": 256,
        "win_length": 1024,
        "n_speakers": 3
    },
    "speakers": {"taffy": 0, "azusa": 1, "User": 2}
}"#;

/// Upsamples each spectrogram frame to `hop` samples of a low sine, so the
/// output length tracks the input the way a real decoder's does
struct Vocoder {
    hop: usize,
}

impl VoiceConversionModel for Vocoder {
    fn voice_conversion(
        &self,
        spec: &Tensor,
        spec_len: usize,
        _source: SpeakerId,
        _target: SpeakerId,
    ) -> Result<Tensor> {
        let samples: Vec<f32> = (0..spec_len * self.hop)
            .map(|i| (i as f32 * 0.05).sin() * 0.1)
            .collect();
        let len = samples.len();
        Ok(Tensor::from_vec(samples, (1, 1, len), spec.device())?)
    }
}

/// Remembers what the engine handed to the transform
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(Vec<usize>, usize, u32, u32)>>,
}

impl VoiceConversionModel for Recorder {
    fn voice_conversion(
        &self,
        spec: &Tensor,
        spec_len: usize,
        source: SpeakerId,
        target: SpeakerId,
    ) -> Result<Tensor> {
        self.seen
            .lock()
            .push((spec.dims().to_vec(), spec_len, source.get(), target.get()));
        Ok(Tensor::zeros((1, 1, spec_len * 256), DType::F32, spec.device())?)
    }
}

struct Broken;

impl VoiceConversionModel for Broken {
    fn voice_conversion(
        &self,
        _spec: &Tensor,
        _spec_len: usize,
        _source: SpeakerId,
        _target: SpeakerId,
    ) -> Result<Tensor> {
        anyhow::bail!("flow decoder exploded")
    }
}

fn config() -> VcConfig {
    VcConfig::from_json(CONFIG).unwrap()
}

fn engine<M: VoiceConversionModel>(model: M) -> ConversionEngine<M> {
    ConversionEngine::from_config(&config(), model, Device::Cpu).unwrap()
}

fn silence_16k(seconds: usize) -> RawAudio {
    RawAudio::mono(16000, SampleData::I16(vec![0; 16000 * seconds]))
}

mod conversion_tests {
    use super::*;

    #[test]
    fn test_missing_audio() {
        let engine = engine(Vocoder { hop: 256 });
        let result = engine.convert(ConversionRequest::new("User", "taffy", None));
        assert_eq!(result.status, ConversionStatus::InputMissing);
        assert_eq!(result.message, "You need to record or upload an audio");
        assert!(result.output_audio.is_none());
    }

    #[test]
    fn test_identity_conversion_of_silence() {
        let engine = engine(Vocoder { hop: 256 });
        let result = engine.convert(ConversionRequest::new("User", "User", Some(silence_16k(2))));

        assert_eq!(result.status, ConversionStatus::Success);
        assert_eq!(result.message, "Success");
        let audio = result.output_audio.unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 1);
        assert!(!audio.samples.is_empty());
        assert!(audio.samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_unknown_target_speaker() {
        let engine = engine(Vocoder { hop: 256 });
        let result = engine.convert(ConversionRequest::new(
            "User",
            "paimon",
            Some(silence_16k(1)),
        ));
        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.message.contains("paimon"));
        assert!(result.output_audio.is_none());
    }

    #[test]
    fn test_transform_failure_is_reported() {
        let engine = engine(Broken);
        let result = engine.convert(ConversionRequest::new("User", "taffy", Some(silence_16k(1))));
        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.message.contains("flow decoder exploded"));
        assert!(result.output_audio.is_none());
    }

    #[test]
    fn test_malformed_audio_is_reported() {
        let engine = engine(Vocoder { hop: 256 });
        let bad = RawAudio::new(44100, 2, SampleData::I16(vec![0; 44101]));
        let result = engine.convert(ConversionRequest::new("User", "taffy", Some(bad)));
        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.message.contains("invalid audio format"));
    }

    #[test]
    fn test_non_finite_upload_is_rejected_before_transform() {
        let recorder = Arc::new(Recorder::default());
        let engine =
            ConversionEngine::from_config(&config(), Arc::clone(&recorder), Device::Cpu).unwrap();

        let mut samples = vec![0.0f32; 22050];
        samples[5000] = f32::NAN;
        samples[9000] = f32::INFINITY;
        let result = engine.convert(ConversionRequest::new(
            "User",
            "taffy",
            Some(RawAudio::mono(22050, SampleData::F32(samples))),
        ));

        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.message.contains("non-finite"));
        assert!(result.output_audio.is_none());
        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn test_transform_receives_spectrogram_and_ids() {
        let recorder = Arc::new(Recorder::default());
        let engine =
            ConversionEngine::from_config(&config(), Arc::clone(&recorder), Device::Cpu).unwrap();
        assert_eq!(engine.params().n_freq_bins(), 513);

        let result = engine.convert(ConversionRequest::new(
            "azusa",
            "taffy",
            Some(RawAudio::mono(22050, SampleData::F32(vec![0.0; 22050]))),
        ));
        assert!(result.is_success());

        let expected_frames = (22050 - 1024) / 256 + 1;
        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 1);
        let (dims, spec_len, source, target) = &seen[0];
        assert_eq!(dims, &vec![1, 513, expected_frames]);
        assert_eq!(*spec_len, expected_frames);
        assert_eq!((*source, *target), (1, 0));
    }

    #[test]
    fn test_recording_preferred_over_upload() {
        let shared = Arc::new(Recorder::default());
        let engine =
            ConversionEngine::from_config(&config(), Arc::clone(&shared), Device::Cpu).unwrap();

        let recorded = RawAudio::mono(22050, SampleData::F32(vec![0.0; 22050]));
        let uploaded = RawAudio::mono(22050, SampleData::F32(vec![0.0; 44100]));
        let result = engine.convert_inputs("User", "taffy", Some(recorded), Some(uploaded));
        assert!(result.is_success());

        let seen = shared.seen.lock();
        assert_eq!(seen[0].1, (22050 - 1024) / 256 + 1);
    }

    #[test]
    fn test_upload_used_when_nothing_recorded() {
        let engine = engine(Vocoder { hop: 256 });
        let result = engine.convert_inputs("User", "taffy", None, Some(silence_16k(1)));
        assert!(result.is_success());
    }

    #[test]
    fn test_requests_are_independent() {
        let engine = engine(Vocoder { hop: 256 });
        let first = engine.convert(ConversionRequest::new("User", "taffy", Some(silence_16k(1))));
        let missing = engine.convert(ConversionRequest::new("User", "taffy", None));
        let second = engine.convert(ConversionRequest::new("User", "taffy", Some(silence_16k(1))));

        assert_eq!(missing.status, ConversionStatus::InputMissing);
        assert_eq!(first, second);
    }
}

mod concurrency_tests {
    use super::*;

    #[test]
    fn test_shared_engine_across_threads() {
        let engine = Arc::new(engine(Vocoder { hop: 256 }));

        let handles: Vec<_> = ["taffy", "azusa", "User", "taffy"]
            .into_iter()
            .map(|target| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine.convert(ConversionRequest::new("User", target, Some(silence_16k(1))))
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().unwrap();
            assert_eq!(result.status, ConversionStatus::Success);
        }
    }

    /// A backend with per-call scratch state
    struct Stateful {
        scratch: Vec<f32>,
    }

    impl VoiceConversionModelMut for Stateful {
        fn voice_conversion(
            &mut self,
            spec: &Tensor,
            spec_len: usize,
            _source: SpeakerId,
            _target: SpeakerId,
        ) -> Result<Tensor> {
            self.scratch.clear();
            self.scratch.resize(spec_len * 256, 0.0);
            let len = self.scratch.len();
            Ok(Tensor::from_slice(self.scratch.as_slice(), (1, 1, len), spec.device())?)
        }
    }

    #[test]
    fn test_serialized_backend_in_engine() {
        let model = Serialized::new(Stateful {
            scratch: Vec::new(),
        });
        let engine = Arc::new(engine(model));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine.convert(ConversionRequest::new("taffy", "User", Some(silence_16k(1))))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_success());
        }
    }
}

mod audio_tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::f32::consts::PI;
    use vits_vc::audio::{load_wav, normalize, spectrogram};

    #[test]
    fn test_uploaded_wav_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..44100 {
            let s = ((2.0 * PI * 440.0 * i as f32 / 44100.0).sin() * 16000.0) as i16;
            writer.write_sample(s).unwrap();
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let raw = load_wav(&path).unwrap();
        assert_eq!(raw.channels, 2);
        assert_eq!(raw.frames(), 44100);

        let engine = engine(Vocoder { hop: 256 });
        let result = engine.convert_inputs("User", "azusa", None, Some(raw));
        assert!(result.is_success());

        let out_path = dir.path().join("converted.wav");
        let audio = result.output_audio.unwrap();
        audio.save(&out_path).unwrap();
        let reloaded = load_wav(&out_path).unwrap();
        assert_eq!(reloaded.sample_rate, 22050);
        assert_eq!(reloaded.data, SampleData::F32(audio.samples));
    }

    #[test]
    fn test_front_end_matches_engine_params() {
        let config = config();
        let raw = RawAudio::new(48000, 2, SampleData::F32(vec![0.1; 96000]));

        let clip = normalize::normalize(&raw, config.data.sampling_rate).unwrap();
        assert_eq!(clip.sample_rate, 22050);
        assert_eq!(clip.len(), 22050);

        let spec = spectrogram::extract(&clip, config.spectrogram_params()).unwrap();
        assert_eq!(spec.n_freq_bins(), 513);
        assert_eq!(spec.n_frames(), (22050 - 1024) / 256 + 1);
        assert!(spec.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_spectrogram_consistency() {
        let samples: Vec<f32> = (0..22050).map(|i| (i as f32 * 0.01).sin()).collect();
        let clip = vits_vc::AudioClip::new(samples, 22050);
        let params = config().spectrogram_params();

        let spec1 = spectrogram::extract(&clip, params).unwrap();
        let spec2 = spectrogram::extract(&clip, params).unwrap();
        assert_eq!(spec1.as_slice(), spec2.as_slice());
    }
}
