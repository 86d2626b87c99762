//! Model hyperparameter configuration
//!
//! Reads the JSON file that ships next to a fine-tuned checkpoint. Only the
//! `data` section and the `speakers` table matter here; `train`, `model`,
//! `symbols` and anything else are ignored.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::SpectrogramParams;

/// Top-level hyperparameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VcConfig {
    /// Feature extraction and speaker count
    #[serde(default)]
    pub data: DataConfig,

    /// Speaker name to model index, in file order
    #[serde(default)]
    pub speakers: IndexMap<String, i64>,
}

/// The `data` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Model sample rate in Hz
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,

    /// FFT size
    #[serde(default = "default_filter_length")]
    pub filter_length: usize,

    /// Hop between frames
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,

    /// Analysis window length
    #[serde(default = "default_win_length")]
    pub win_length: usize,

    /// Size of the speaker embedding table; 0 when unknown
    #[serde(default)]
    pub n_speakers: usize,
}

fn default_sampling_rate() -> u32 {
    22050
}

fn default_filter_length() -> usize {
    1024
}

fn default_hop_length() -> usize {
    256
}

fn default_win_length() -> usize {
    1024
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sampling_rate: default_sampling_rate(),
            filter_length: default_filter_length(),
            hop_length: default_hop_length(),
            win_length: default_win_length(),
            n_speakers: 0,
        }
    }
}

impl VcConfig {
    /// Load configuration from a local JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            sampling_rate = config.data.sampling_rate,
            speakers = config.speakers.len(),
            "Loaded model config"
        );
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Analysis parameters the weights were trained with.
    ///
    /// `center` is always `false`.
    pub fn spectrogram_params(&self) -> SpectrogramParams {
        SpectrogramParams {
            filter_length: self.data.filter_length,
            sampling_rate: self.data.sampling_rate,
            hop_length: self.data.hop_length,
            win_length: self.data.win_length,
            center: false,
        }
    }

    /// Speaker bound declared by the model, if any
    pub fn n_speakers(&self) -> Option<usize> {
        match self.data.n_speakers {
            0 => None,
            n => Some(n),
        }
    }
}
