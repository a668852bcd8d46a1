// Zero-shot classification with a local NLI model (bart-large-mnli).
//
// Each candidate label becomes a hypothesis ("This example is {label}.")
// paired with the input text as premise. One batched forward pass yields an
// entailment logit per label; a softmax across those logits gives the
// single-label zero-shot distribution, ranked highest first.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::onnx::OnnxModel;
use super::softmax;
use super::traits::{rank_descending, InferenceError, LabelScore, TextClassifier};

/// Hypothesis template applied to every candidate label.
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

/// Zero-shot classifier backed by a local NLI ONNX export.
pub struct OnnxZeroShotClassifier {
    name: String,
    model: Arc<OnnxModel>,
    entailment_index: usize,
    template: String,
}

impl OnnxZeroShotClassifier {
    /// Load the NLI model found in `model_dir` and register it under `name`.
    pub fn load(name: &str, model_dir: &Path) -> Result<Self> {
        let model = OnnxModel::load(model_dir)
            .with_context(|| format!("Failed to load {name} zero-shot model"))?;
        let entailment_index = entailment_index(&model.labels).ok_or_else(|| {
            anyhow::anyhow!(
                "{} has no entailment label (labels: {:?})",
                model_dir.display(),
                model.labels
            )
        })?;

        Ok(Self {
            name: name.to_string(),
            model: Arc::new(model),
            entailment_index,
            template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
        })
    }
}

/// Index of the entailment class in an NLI head.
fn entailment_index(labels: &[String]) -> Option<usize> {
    labels
        .iter()
        .position(|l| l.to_lowercase().starts_with("entail"))
}

pub(crate) fn hypothesis(template: &str, label: &str) -> String {
    template.replace("{}", label)
}

/// Softmax the entailment logits across labels and rank them.
pub(crate) fn rank_entailment(labels: &[String], entailment_logits: &[f64]) -> Vec<LabelScore> {
    let probs = softmax(entailment_logits);
    rank_descending(
        labels
            .iter()
            .zip(probs)
            .map(|(label, score)| LabelScore::new(label.clone(), score))
            .collect(),
    )
}

#[async_trait]
impl TextClassifier for OnnxZeroShotClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, InferenceError> {
        if labels.is_empty() {
            return Err(InferenceError::invalid_output(
                &self.name,
                "no candidate labels supplied",
            ));
        }

        let model = Arc::clone(&self.model);
        let text = text.to_string();
        let labels = labels.to_vec();
        let template = self.template.clone();
        let entail = self.entailment_index;
        let name = self.name.clone();

        let outcome = tokio::task::spawn_blocking(move || -> Result<Vec<LabelScore>> {
            let encodings = labels
                .iter()
                .map(|label| model.encode_pair(&text, &hypothesis(&template, label)))
                .collect::<Result<Vec<_>>>()?;
            let rows = model.logits(&encodings)?;

            let entailment: Vec<f64> = rows
                .iter()
                .map(|row| {
                    row.get(entail)
                        .copied()
                        .ok_or_else(|| anyhow::anyhow!("logit row has no index {entail}"))
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(rank_entailment(&labels, &entailment))
        })
        .await
        .map_err(|e| InferenceError::backend(&name, anyhow::anyhow!("spawn_blocking panicked: {e}")))?
        .map_err(|e| InferenceError::backend(&name, e))?;

        for (i, entry) in outcome.iter().take(3).enumerate() {
            debug!(model = %name, rank = i + 1, label = %entry.label, score = entry.score, "Zero-shot ranking");
        }

        Ok(outcome)
    }
}
