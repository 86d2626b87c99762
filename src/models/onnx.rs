//! ONNX backend for the conversion transform
//!
//! Runs a synthesizer whose `voice_conversion` method was exported to ONNX
//! with inputs `(spec, spec_lengths, sid_src, sid_tgt)` and a single
//! waveform output. Evaluation is a pure function of the graph, so one
//! loaded model can serve concurrent requests.

use anyhow::{Context, Result};
use candle_core::{DType, Tensor};
use candle_onnx::onnx::ModelProto;
use std::collections::HashMap;
use std::path::Path;

use super::{SpeakerId, VoiceConversionModel};

/// Graph input and output names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnnxIoNames {
    pub spec: String,
    pub spec_lengths: String,
    pub sid_src: String,
    pub sid_tgt: String,
    /// Output to read; the first graph output when `None`
    pub audio: Option<String>,
}

impl Default for OnnxIoNames {
    fn default() -> Self {
        Self {
            spec: "spec".to_string(),
            spec_lengths: "spec_lengths".to_string(),
            sid_src: "sid_src".to_string(),
            sid_tgt: "sid_tgt".to_string(),
            audio: None,
        }
    }
}

/// Voice conversion graph evaluated with `candle-onnx`
pub struct OnnxVoiceConversion {
    model: ModelProto,
    names: OnnxIoNames,
    output: String,
}

impl OnnxVoiceConversion {
    /// Load a graph using the default input names
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_names(path, OnnxIoNames::default())
    }

    pub fn from_file_with_names<P: AsRef<Path>>(path: P, names: OnnxIoNames) -> Result<Self> {
        let path = path.as_ref();
        let model = candle_onnx::read_file(path)
            .with_context(|| format!("Failed to read ONNX model: {}", path.display()))?;
        let model = Self::new(model, names)?;
        tracing::info!(path = %path.display(), output = %model.output, "Loaded ONNX model");
        Ok(model)
    }

    /// Wrap an already parsed graph, checking that the expected inputs exist
    pub fn new(model: ModelProto, names: OnnxIoNames) -> Result<Self> {
        let graph = model
            .graph
            .as_ref()
            .context("ONNX model has no graph")?;

        let inputs: Vec<&str> = graph.input.iter().map(|i| i.name.as_str()).collect();
        for expected in [&names.spec, &names.spec_lengths, &names.sid_src, &names.sid_tgt] {
            if !inputs.contains(&expected.as_str()) {
                anyhow::bail!(
                    "ONNX model has no input '{}' (inputs: {:?})",
                    expected,
                    inputs
                );
            }
        }

        let output = match &names.audio {
            Some(name) => name.clone(),
            None => graph
                .output
                .first()
                .map(|o| o.name.clone())
                .context("ONNX model has no outputs")?,
        };

        Ok(Self {
            model,
            names,
            output,
        })
    }
}

impl VoiceConversionModel for OnnxVoiceConversion {
    fn voice_conversion(
        &self,
        spec: &Tensor,
        spec_len: usize,
        source: SpeakerId,
        target: SpeakerId,
    ) -> Result<Tensor> {
        let device = spec.device();
        let index = |v: i64| Tensor::new(&[v], device);

        let mut inputs = HashMap::new();
        inputs.insert(self.names.spec.clone(), spec.to_dtype(DType::F32)?);
        inputs.insert(self.names.spec_lengths.clone(), index(spec_len as i64)?);
        inputs.insert(self.names.sid_src.clone(), index(source.get() as i64)?);
        inputs.insert(self.names.sid_tgt.clone(), index(target.get() as i64)?);

        let mut outputs = candle_onnx::simple_eval(&self.model, inputs)?;
        outputs
            .remove(&self.output)
            .with_context(|| format!("ONNX model produced no output '{}'", self.output))
    }
}
