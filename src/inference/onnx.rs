// Local ONNX sequence classifiers.
//
// The models are Hugging Face exports (toxic-bert, toxic-comment-model,
// bart-large-mnli) converted to ONNX. Each model directory carries the graph,
// its tokenizer.json, and the config.json that names the output labels.
// Everything runs on the local CPU — no API calls, no rate limits.
//
// OnnxModel is the shared plumbing (loading, padding, forward pass).
// OnnxTextClassifier wraps it as a fixed-label classifier; the NLI zero-shot
// adapter in zero_shot.rs reuses the same plumbing with sentence pairs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::utils::truncation::TruncationParams;
use tokenizers::{Encoding, Tokenizer};
use tracing::debug;

use super::traits::{InferenceError, LabelScore, TextClassifier};
use super::{sigmoid, softmax};

/// Graph file names, in order of preference.
const MODEL_FILES: [&str; 2] = ["model_quantized.onnx", "model.onnx"];
pub(crate) const TOKENIZER_FILE: &str = "tokenizer.json";
pub(crate) const CONFIG_FILE: &str = "config.json";

/// Longest token sequence the BERT/BART family accepts.
const MAX_SEQUENCE_LEN: usize = 512;

/// The parts of a Hugging Face config.json that inference needs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelConfig {
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub problem_type: Option<String>,
    pub id2label: HashMap<String, String>,
}

impl ModelConfig {
    /// Output labels ordered by their logit index.
    pub fn labels(&self) -> Result<Vec<String>> {
        let mut indexed: Vec<(usize, String)> = self
            .id2label
            .iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|i| (i, label.clone()))
                    .with_context(|| format!("Non-numeric label id in config.json: {id}"))
            })
            .collect::<Result<Vec<_>>>()?;
        indexed.sort_by_key(|(i, _)| *i);

        for (expected, (i, _)) in indexed.iter().enumerate() {
            if *i != expected {
                anyhow::bail!("config.json id2label has a gap at index {expected}");
            }
        }
        Ok(indexed.into_iter().map(|(_, label)| label).collect())
    }

    /// Multi-label heads are scored independently with sigmoid.
    pub fn is_multi_label(&self) -> bool {
        self.problem_type.as_deref() == Some("multi_label_classification")
            || self.id2label.len() == 1
    }

    /// Plain BERT graphs take a third `token_type_ids` input.
    pub fn needs_token_type_ids(&self) -> bool {
        self.model_type.as_deref() == Some("bert")
    }
}

/// Find the graph file inside a model directory.
pub(crate) fn model_file(dir: &Path) -> Option<PathBuf> {
    MODEL_FILES
        .iter()
        .map(|f| dir.join(f))
        .find(|path| path.exists())
}

/// Check whether a directory holds a loadable model export.
pub fn model_files_present(dir: &Path) -> bool {
    model_file(dir).is_some() && dir.join(TOKENIZER_FILE).exists() && dir.join(CONFIG_FILE).exists()
}

/// A loaded ONNX graph with its tokenizer and label metadata.
///
/// The session sits behind a Mutex because `Session::run` takes `&mut self`;
/// that also serializes inference per model handle, which keeps shared
/// handles safe across concurrent requests.
pub(crate) struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    pub config: ModelConfig,
    pub labels: Vec<String>,
    pad_id: u32,
}

impl OnnxModel {
    /// Load graph, tokenizer and config.json from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_file(model_dir).ok_or_else(|| {
            anyhow::anyhow!(
                "Model file not found in {}\nRun `moderacao download-model` to download it.",
                model_dir.display()
            )
        })?;
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let config_path = model_dir.join(CONFIG_FILE);

        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}\nRun `moderacao download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let config_json = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: ModelConfig = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        let labels = config.labels()?;

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        let pad_id = ["<pad>", "[PAD]"]
            .iter()
            .find_map(|t| tokenizer.token_to_id(t))
            .unwrap_or(0);

        debug!(
            labels = ?labels,
            model_type = ?config.model_type,
            "Loaded ONNX model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            config,
            labels,
            pad_id,
        })
    }

    pub fn encode_single(&self, text: &str) -> Result<Encoding> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
    }

    pub fn encode_pair(&self, premise: &str, hypothesis: &str) -> Result<Encoding> {
        self.tokenizer
            .encode((premise, hypothesis), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
    }

    /// Run one forward pass over a batch and return one logit row per input.
    pub fn logits(&self, encodings: &[Encoding]) -> Result<Vec<Vec<f64>>> {
        let batch_size = encodings.len();
        if batch_size == 0 {
            return Ok(Vec::new());
        }
        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

        // Flat right-padded inputs, shape [batch_size, max_len]
        let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut type_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

        for enc in encodings {
            let seq_len = enc.get_ids().len();
            input_ids_flat.extend(enc.get_ids().iter().map(|&id| id as i64));
            attention_mask_flat.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
            type_ids_flat.extend(enc.get_type_ids().iter().map(|&t| t as i64));

            for _ in seq_len..max_len {
                input_ids_flat.push(self.pad_id as i64);
                attention_mask_flat.push(0);
                type_ids_flat.push(0);
            }
        }

        let shape = [batch_size as i64, max_len as i64];
        let input_ids = Tensor::from_array((shape, input_ids_flat))
            .context("Failed to create input_ids tensor")?;
        let attention_mask = Tensor::from_array((shape, attention_mask_flat))
            .context("Failed to create attention_mask tensor")?;

        let data = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = if self.config.needs_token_type_ids() {
                let token_type_ids = Tensor::from_array((shape, type_ids_flat))
                    .context("Failed to create token_type_ids tensor")?;
                session.run(ort::inputs! {
                    "input_ids" => input_ids,
                    "attention_mask" => attention_mask,
                    "token_type_ids" => token_type_ids
                })
            } else {
                session.run(ort::inputs! {
                    "input_ids" => input_ids,
                    "attention_mask" => attention_mask
                })
            }
            .context("ONNX inference failed")?;

            // Output shape: [batch_size, num_labels] raw logits
            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract output tensor")?;
            data.to_vec()
        };

        let width = self.labels.len();
        if width == 0 || data.len() != batch_size * width {
            anyhow::bail!(
                "Expected {} logits ({} x {}), model produced {}",
                batch_size * width,
                batch_size,
                width,
                data.len()
            );
        }

        Ok(data
            .chunks(width)
            .map(|row| row.iter().map(|&l| l as f64).collect())
            .collect())
    }
}

/// Turn one logit row into the model's top label and its probability.
pub(crate) fn top_label(labels: &[String], logits: &[f64], multi_label: bool) -> Option<LabelScore> {
    let probs: Vec<f64> = if multi_label {
        logits.iter().map(|&l| sigmoid(l)).collect()
    } else {
        softmax(logits)
    };

    labels
        .iter()
        .zip(probs)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(label, score)| LabelScore::new(label.clone(), score))
}

/// Fixed-label classifier backed by a local ONNX export.
pub struct OnnxTextClassifier {
    name: String,
    model: Arc<OnnxModel>,
}

impl OnnxTextClassifier {
    /// Load the model found in `model_dir` and register it under `name`.
    pub fn load(name: &str, model_dir: &Path) -> Result<Self> {
        let model = OnnxModel::load(model_dir)
            .with_context(|| format!("Failed to load {name} classifier"))?;
        Ok(Self {
            name: name.to_string(),
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl TextClassifier for OnnxTextClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    /// Tokenization and the forward pass run on spawn_blocking so they don't
    /// stall the tokio runtime.
    async fn classify_fixed(&self, text: &str) -> Result<LabelScore, InferenceError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        let name = self.name.clone();

        let outcome = tokio::task::spawn_blocking(move || -> Result<Option<LabelScore>> {
            let encoding = model.encode_single(&text)?;
            let rows = model.logits(std::slice::from_ref(&encoding))?;
            Ok(rows
                .first()
                .and_then(|row| top_label(&model.labels, row, model.config.is_multi_label())))
        })
        .await
        .map_err(|e| InferenceError::backend(&name, anyhow::anyhow!("spawn_blocking panicked: {e}")))?;

        match outcome {
            Ok(Some(result)) => {
                debug!(model = %name, label = %result.label, score = result.score, "ONNX classified text");
                Ok(result)
            }
            Ok(None) => Err(InferenceError::invalid_output(&name, "model produced no labels")),
            Err(e) => Err(InferenceError::backend(&name, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> ModelConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_labels_follow_index_order() {
        let cfg = config(r#"{"id2label": {"1": "toxic", "0": "non-toxic"}}"#);
        assert_eq!(cfg.labels().unwrap(), vec!["non-toxic", "toxic"]);
    }

    #[test]
    fn test_labels_reject_gaps() {
        let cfg = config(r#"{"id2label": {"0": "a", "2": "c"}}"#);
        assert!(cfg.labels().is_err());
    }

    #[test]
    fn test_multi_label_detection() {
        let multi = config(
            r#"{"problem_type": "multi_label_classification", "id2label": {"0": "toxic", "1": "insult"}}"#,
        );
        let single = config(r#"{"id2label": {"0": "non-toxic", "1": "toxic"}}"#);
        assert!(multi.is_multi_label());
        assert!(!single.is_multi_label());
    }

    #[test]
    fn test_token_type_ids_only_for_bert() {
        assert!(config(r#"{"model_type": "bert", "id2label": {"0": "a"}}"#).needs_token_type_ids());
        assert!(!config(r#"{"model_type": "bart", "id2label": {"0": "a"}}"#).needs_token_type_ids());
        assert!(!config(r#"{"id2label": {"0": "a"}}"#).needs_token_type_ids());
    }

    #[test]
    fn test_top_label_softmax() {
        let labels = vec!["non-toxic".to_string(), "toxic".to_string()];
        let top = top_label(&labels, &[0.0, 2.0], false).unwrap();
        assert_eq!(top.label, "toxic");
        assert!(top.score > 0.85 && top.score < 0.9);
    }

    #[test]
    fn test_top_label_sigmoid_scores_independently() {
        let labels = vec!["toxic".to_string(), "threat".to_string()];
        let top = top_label(&labels, &[0.0, -3.0], true).unwrap();
        assert_eq!(top.label, "toxic");
        assert!((top.score - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_model_files_present_false_when_empty() {
        let dir = std::env::temp_dir().join("moderacao-test-nonexistent");
        assert!(!model_files_present(&dir));
    }
}
