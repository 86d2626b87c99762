//! Audio resampling using rubato
//!
//! Band-limited sinc interpolation only: the cutoff is placed below the
//! lower of the two Nyquist limits, so downsampling does not alias.

use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use super::AudioClip;
use crate::error::{Result, VcError};

/// Resampling quality preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResampleQuality {
    /// Balanced speed and quality
    #[default]
    Normal,
    /// Longer sinc kernel, slower
    High,
}

impl ResampleQuality {
    fn sinc_len(self) -> usize {
        match self {
            ResampleQuality::Normal => 128,
            ResampleQuality::High => 256,
        }
    }
}

/// Mono audio resampler
#[derive(Debug, Clone, Copy, Default)]
pub struct Resampler {
    quality: ResampleQuality,
}

impl Resampler {
    const CHUNK_SIZE: usize = 1024;

    /// Create a new resampler
    pub fn new(quality: ResampleQuality) -> Self {
        Self { quality }
    }

    /// Resample a mono clip to a target sample rate.
    ///
    /// Output holds exactly `ceil(len * target / source)` samples, aligned
    /// with the input (the filter delay is removed). Same-rate input is
    /// returned unchanged.
    pub fn resample(&self, audio: &AudioClip, target_rate: u32) -> Result<AudioClip> {
        if audio.channels != 1 {
            return Err(VcError::InvalidAudioFormat(format!(
                "resampler expects mono audio, got {} channels",
                audio.channels
            )));
        }
        if audio.sample_rate == 0 || target_rate == 0 {
            return Err(VcError::Resample(format!(
                "invalid rates: {} Hz -> {} Hz",
                audio.sample_rate, target_rate
            )));
        }
        if audio.sample_rate == target_rate || audio.is_empty() {
            return Ok(AudioClip::new(audio.samples.clone(), target_rate));
        }

        let ratio = target_rate as f64 / audio.sample_rate as f64;
        let sinc_len = self.quality.sinc_len();

        let params = SincInterpolationParameters {
            sinc_len,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: sinc_len,
            window: WindowFunction::BlackmanHarris2,
        };

        let mut resampler = SincFixedIn::<f32>::new(
            ratio,
            1.0,
            params,
            Self::CHUNK_SIZE,
            1, // mono
        )?;

        let expected = output_len(audio.len(), audio.sample_rate, target_rate);
        let output = Self::process_chunks(&mut resampler, &audio.samples, expected)?;

        tracing::debug!(
            from = audio.sample_rate,
            to = target_rate,
            input_len = audio.len(),
            output_len = output.len(),
            "Resampled"
        );

        Ok(AudioClip::new(output, target_rate))
    }

    /// Push the signal through in fixed chunks, then flush with silence
    /// until the delayed tail is out, and cut the delay off the front.
    fn process_chunks<R: RubatoResampler<f32>>(
        resampler: &mut R,
        samples: &[f32],
        expected: usize,
    ) -> Result<Vec<f32>> {
        let delay = resampler.output_delay();
        let mut output = Vec::with_capacity(expected + delay + Self::CHUNK_SIZE);

        for chunk in samples.chunks(Self::CHUNK_SIZE) {
            let input: [&[f32]; 1] = [chunk];
            let result = if chunk.len() == Self::CHUNK_SIZE {
                resampler.process(&input[..], None)?
            } else {
                resampler.process_partial(Some(&input[..]), None)?
            };
            if let Some(channel) = result.first() {
                output.extend_from_slice(channel);
            }
        }

        while output.len() < delay + expected {
            let result = resampler.process_partial(None::<&[&[f32]]>, None)?;
            match result.first() {
                Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
                _ => break,
            }
        }

        let end = (delay + expected).min(output.len());
        let start = delay.min(end);
        Ok(output[start..end].to_vec())
    }
}

/// `ceil(len * target / source)`, in integer arithmetic
fn output_len(len: usize, source_rate: u32, target_rate: u32) -> usize {
    let numerator = len as u64 * target_rate as u64;
    numerator.div_ceil(source_rate as u64) as usize
}

/// Convenience function to resample audio
pub fn resample(audio: &AudioClip, target_rate: u32) -> Result<AudioClip> {
    Resampler::default().resample(audio, target_rate)
}
