//! Local sentiment classification with ONNX Runtime.
//!
//! Expects a sequence-classification export (e.g. DistilBERT fine-tuned on
//! SST-2). The model directory must contain `model.onnx` and `tokenizer.json`;
//! an optional `config.json` supplies `id2label`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::provider::{InferenceError, InferenceProvider, Prediction, SummaryBounds};

/// Longest token sequence fed to the model.
const MAX_TOKENS: usize = 512;

/// Sentiment classifier backed by an ONNX sequence-classification model.
pub struct SentimentModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    name: String,
}

impl SentimentModel {
    /// Load a classifier from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        let labels = match std::fs::read_to_string(model_dir.join("config.json")) {
            Ok(raw) => parse_labels(&raw)?,
            Err(_) => default_labels(),
        };

        let name = format!(
            "onnx:{}",
            model_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".into())
        );

        info!(model = %model_path.display(), "loaded sentiment model");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            name,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn logits(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError::Other(format!("tokenize: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let shape = [1i64, input_ids.len() as i64];

        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Other("onnx session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
        ])?;

        // Logits: [1, num_labels].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        if dims.len() != 2 || dims[0] != 1 || dims[1] as usize != self.labels.len() {
            return Err(InferenceError::Other(format!(
                "unexpected output shape {dims:?}, expected [1, {}]",
                self.labels.len()
            )));
        }
        Ok(output_data.to_vec())
    }
}

impl InferenceProvider for SentimentModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, text: &str) -> Result<Prediction, InferenceError> {
        let probs = softmax(&self.logits(text)?);
        let (best, score) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| InferenceError::Other("model produced no logits".into()))?;
        Ok(Prediction {
            label: self.labels[best].clone(),
            score: f64::from(score),
        })
    }

    fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> Result<String, InferenceError> {
        Err(InferenceError::Unsupported("summarization"))
    }
}

fn default_labels() -> Vec<String> {
    vec!["NEGATIVE".into(), "POSITIVE".into()]
}

/// Read `id2label` from a Hugging Face `config.json`, ordered by index.
fn parse_labels(raw: &str) -> anyhow::Result<Vec<String>> {
    let config: serde_json::Value = serde_json::from_str(raw)?;
    let Some(map) = config.get("id2label").and_then(|v| v.as_object()) else {
        return Ok(default_labels());
    };

    let mut by_index = BTreeMap::new();
    for (idx, label) in map {
        let idx: usize = idx
            .parse()
            .map_err(|_| anyhow::anyhow!("id2label key {idx:?} is not an index"))?;
        let label = label
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("id2label value for {idx} is not a string"))?;
        by_index.insert(idx, label.to_string());
    }
    anyhow::ensure!(
        by_index.keys().copied().eq(0..by_index.len()),
        "id2label indices are not contiguous from 0"
    );
    Ok(by_index.into_values().collect())
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
