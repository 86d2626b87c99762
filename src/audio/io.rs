//! Audio containers and WAV I/O

use anyhow::{Context, Result};
use candle_core::{DType, Tensor};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Floating-point audio clip
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Interleaved samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: usize,
}

impl AudioClip {
    /// Create a mono clip
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Create a clip with interleaved channels
    pub fn with_channels(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Create a mono clip from a Candle tensor of any shape.
    ///
    /// Model outputs come back as `[batch, 1, samples]`; everything is
    /// flattened and converted to `f32`.
    pub fn from_tensor(tensor: &Tensor, sample_rate: u32) -> Result<Self> {
        let samples: Vec<f32> = tensor.flatten_all()?.to_dtype(DType::F32)?.to_vec1()?;
        Ok(Self::new(samples, sample_rate))
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Save to WAV file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_wav(path, self)
    }
}

/// Sample storage of a [`RawAudio`], in the encoding it arrived with
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    /// Unsigned 8-bit, offset binary (silence at 128)
    U8(Vec<u8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// Signed integers of a declared width stored in `i32` (e.g. 24-bit PCM)
    Packed {
        bits_per_sample: u16,
        samples: Vec<i32>,
    },
}

impl SampleData {
    /// Number of stored samples across all channels
    pub fn len(&self) -> usize {
        match self {
            SampleData::U8(v) => v.len(),
            SampleData::I16(v) => v.len(),
            SampleData::I32(v) => v.len(),
            SampleData::F32(v) => v.len(),
            SampleData::F64(v) => v.len(),
            SampleData::Packed { samples, .. } => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bits per sample, if the width is known
    pub fn bits_per_sample(&self) -> Option<u16> {
        match self {
            SampleData::U8(_) => Some(8),
            SampleData::I16(_) => Some(16),
            SampleData::I32(_) | SampleData::F32(_) => Some(32),
            SampleData::F64(_) => Some(64),
            SampleData::Packed {
                bits_per_sample, ..
            } => match *bits_per_sample {
                1..=32 => Some(*bits_per_sample),
                _ => None,
            },
        }
    }

    /// Whether the samples are integers that need rescaling
    pub fn is_integer(&self) -> bool {
        !matches!(self, SampleData::F32(_) | SampleData::F64(_))
    }
}

/// Audio as delivered by a recorder or an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: usize,
    /// Interleaved samples
    pub data: SampleData,
}

impl RawAudio {
    pub fn new(sample_rate: u32, channels: usize, data: SampleData) -> Self {
        Self {
            sample_rate,
            channels,
            data,
        }
    }

    /// Single-channel input
    pub fn mono(sample_rate: u32, data: SampleData) -> Self {
        Self::new(sample_rate, 1, data)
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Load from WAV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_wav(path)
    }
}

/// Load a WAV file, keeping its sample encoding and channel layout
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<RawAudio> {
    let path = path.as_ref();
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let data = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => SampleData::F32(
            reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?,
        ),
        (SampleFormat::Int, 16) => SampleData::I16(
            reader
                .into_samples::<i16>()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?,
        ),
        (SampleFormat::Int, 32) => SampleData::I32(
            reader
                .into_samples::<i32>()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?,
        ),
        // hound hands 8-bit PCM back as signed values, so it is packed too
        (SampleFormat::Int, bits) => SampleData::Packed {
            bits_per_sample: bits,
            samples: reader
                .into_samples::<i32>()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?,
        },
    };

    tracing::debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "Loaded WAV"
    );

    Ok(RawAudio::new(spec.sample_rate, spec.channels as usize, data))
}

/// Save a clip to a 32-bit float WAV file
pub fn save_wav<P: AsRef<Path>>(path: P, clip: &AudioClip) -> Result<()> {
    let path = path.as_ref();
    let channels = u16::try_from(clip.channels)
        .with_context(|| format!("Too many channels to write: {}", clip.channels))?;
    let spec = WavSpec {
        channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for &sample in &clip.samples {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}
