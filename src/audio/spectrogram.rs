//! Linear magnitude spectrogram
//!
//! This is the model's input feature. The framing follows the convention
//! the synthesizer was trained with: the first frame starts at sample 0
//! (no centering), each frame is `win_length` samples under a periodic Hann
//! window, zero-padded or truncated to `filter_length`, and the magnitude
//! carries a small epsilon under the square root.

use candle_core::{Device, Tensor};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use super::AudioClip;
use crate::error::{Result, VcError};

/// Added to `re² + im²` before the square root
pub const MAGNITUDE_EPSILON: f32 = 1e-6;

/// STFT parameters shared with the pretrained weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrogramParams {
    /// FFT size
    pub filter_length: usize,
    /// Sample rate the clip must have
    pub sampling_rate: u32,
    /// Hop between frames
    pub hop_length: usize,
    /// Analysis window length
    pub win_length: usize,
    /// Reflect-pad by `win_length / 2` so frames are centred on their hop
    pub center: bool,
}

impl Default for SpectrogramParams {
    fn default() -> Self {
        Self {
            filter_length: 1024,
            sampling_rate: 22050,
            hop_length: 256,
            win_length: 1024,
            center: false,
        }
    }
}

impl SpectrogramParams {
    /// Number of one-sided frequency bins
    pub fn n_freq_bins(&self) -> usize {
        self.filter_length / 2 + 1
    }

    /// Shortest signal that yields at least one frame. Centered analysis
    /// reflects `win_length / 2` samples, which needs one more than that.
    pub fn min_samples(&self) -> usize {
        if self.center {
            self.win_length / 2 + 1
        } else {
            self.win_length
        }
    }

    /// Frames produced for a signal of `len` samples, if it is long enough
    pub fn n_frames(&self, len: usize) -> Option<usize> {
        if len < self.min_samples() {
            return None;
        }
        let padded = if self.center {
            len + 2 * (self.win_length / 2)
        } else {
            len
        };
        Some((padded - self.win_length) / self.hop_length + 1)
    }

    fn validate(&self) -> Result<()> {
        let zero = [
            ("filter_length", self.filter_length == 0),
            ("sampling_rate", self.sampling_rate == 0),
            ("hop_length", self.hop_length == 0),
            ("win_length", self.win_length == 0),
        ];
        if let Some((name, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(VcError::InvalidParameters(format!("{name} must be positive")));
        }
        Ok(())
    }
}

/// Magnitude spectrogram, indexed by `(frequency_bin, time_frame)`
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// Row-major `[n_freq_bins, n_frames]`
    data: Vec<f32>,
    n_freq_bins: usize,
    n_frames: usize,
}

impl Spectrogram {
    pub fn n_freq_bins(&self) -> usize {
        self.n_freq_bins
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Magnitude at `(bin, frame)`
    pub fn get(&self, bin: usize, frame: usize) -> Option<f32> {
        if bin >= self.n_freq_bins || frame >= self.n_frames {
            return None;
        }
        Some(self.data[bin * self.n_frames + frame])
    }

    /// All magnitudes of one frequency bin over time
    pub fn bin(&self, bin: usize) -> Option<&[f32]> {
        if bin >= self.n_freq_bins {
            return None;
        }
        self.data.get(bin * self.n_frames..(bin + 1) * self.n_frames)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Model input layout: `[1, n_freq_bins, n_frames]`
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_slice(
            &self.data,
            (1, self.n_freq_bins, self.n_frames),
            device,
        )?)
    }
}

/// Short-time Fourier analysis with fixed parameters
pub struct SpectrogramExtractor {
    params: SpectrogramParams,
    /// Precomputed periodic Hann window
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl fmt::Debug for SpectrogramExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrogramExtractor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl SpectrogramExtractor {
    /// Create an extractor, planning the FFT once
    pub fn new(params: SpectrogramParams) -> Result<Self> {
        params.validate()?;
        let fft = FftPlanner::new().plan_fft_forward(params.filter_length);
        Ok(Self {
            window: hann_window(params.win_length),
            params,
            fft,
        })
    }

    pub fn params(&self) -> &SpectrogramParams {
        &self.params
    }

    /// Compute the magnitude spectrogram of a mono clip
    pub fn extract(&self, clip: &AudioClip) -> Result<Spectrogram> {
        if clip.channels != 1 {
            return Err(VcError::InvalidAudioFormat(format!(
                "spectrogram needs mono audio, got {} channels",
                clip.channels
            )));
        }
        if clip.sample_rate != self.params.sampling_rate {
            return Err(VcError::SampleRateMismatch {
                expected: self.params.sampling_rate,
                actual: clip.sample_rate,
            });
        }

        let SpectrogramParams {
            filter_length: n_fft,
            hop_length,
            win_length,
            ..
        } = self.params;

        let too_short = VcError::AudioTooShort {
            samples: clip.len(),
            required: self.params.min_samples(),
        };
        let n_frames = self.params.n_frames(clip.len()).ok_or(too_short)?;

        let padded;
        let signal: &[f32] = if self.params.center {
            padded = reflect_pad(&clip.samples, win_length / 2).ok_or(VcError::AudioTooShort {
                samples: clip.len(),
                required: self.params.min_samples(),
            })?;
            &padded
        } else {
            &clip.samples
        };
        let n_freq_bins = self.params.n_freq_bins();
        let copy_len = win_length.min(n_fft);

        let mut data = vec![0.0f32; n_freq_bins * n_frames];
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for frame in 0..n_frames {
            let start = frame * hop_length;
            let segment = &signal[start..start + copy_len];

            for (slot, (&sample, &w)) in buffer
                .iter_mut()
                .zip(segment.iter().zip(self.window.iter()))
            {
                *slot = Complex::new(sample * w, 0.0);
            }
            for slot in buffer.iter_mut().skip(copy_len) {
                *slot = Complex::new(0.0, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (bin, c) in buffer.iter().take(n_freq_bins).enumerate() {
                data[bin * n_frames + frame] = (c.norm_sqr() + MAGNITUDE_EPSILON).sqrt();
            }
        }

        tracing::debug!(
            samples = clip.len(),
            n_freq_bins,
            n_frames,
            "Extracted spectrogram"
        );

        Ok(Spectrogram {
            data,
            n_freq_bins,
            n_frames,
        })
    }
}

/// Convenience function: build an extractor and run it once
pub fn extract(clip: &AudioClip, params: SpectrogramParams) -> Result<Spectrogram> {
    SpectrogramExtractor::new(params)?.extract(clip)
}

/// Periodic Hann window
fn hann_window(length: usize) -> Vec<f32> {
    (0..length)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / length as f32).cos()))
        .collect()
}

/// Mirror `pad` samples at each end, excluding the edge sample itself
fn reflect_pad(samples: &[f32], pad: usize) -> Option<Vec<f32>> {
    if pad == 0 {
        return Some(samples.to_vec());
    }
    if samples.len() <= pad {
        return None;
    }
    let mut out = Vec::with_capacity(samples.len() + 2 * pad);
    out.extend(samples[1..=pad].iter().rev());
    out.extend_from_slice(samples);
    out.extend(samples[samples.len() - 1 - pad..samples.len() - 1].iter().rev());
    Some(out)
}
