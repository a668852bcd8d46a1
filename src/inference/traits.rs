// Text classifier trait — the swap-ready abstraction over model inference.
//
// Two result shapes exist in practice: zero-shot models rank a caller-supplied
// label list, fixed-label models return their own single top label. Both live
// behind one trait; an adapter implements the call it supports and the other
// one reports `InferenceError::Unsupported`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One label with the model's confidence in it (0.0 to 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Which of the two classifier calls was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ZeroShot,
    Fixed,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ZeroShot => write!(f, "zero-shot classification"),
            Operation::Fixed => write!(f, "fixed-label classification"),
        }
    }
}

/// Failure of a single model call. Every variant is recoverable: callers
/// log it and fall back, none of them abort a request.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("{model} does not support {operation}")]
    Unsupported { model: String, operation: Operation },

    #[error("{model} timed out after {after:?}")]
    Timeout { model: String, after: Duration },

    #[error("{model} is unavailable: {reason}")]
    Unavailable { model: String, reason: String },

    #[error("{model} inference failed: {source:#}")]
    Backend {
        model: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{model} returned unusable output: {reason}")]
    InvalidOutput { model: String, reason: String },
}

impl InferenceError {
    pub fn backend(model: &str, source: anyhow::Error) -> Self {
        InferenceError::Backend {
            model: model.to_string(),
            source,
        }
    }

    pub fn invalid_output(model: &str, reason: impl Into<String>) -> Self {
        InferenceError::InvalidOutput {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// Trait for classifying text with a pretrained model. Implementations must
/// be async because inference is either CPU-bound (offloaded to a blocking
/// thread) or an HTTP call. Handles are shared read-only across requests.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Short model name used in logs and report entries (e.g. "toxic_bert").
    fn name(&self) -> &str;

    /// Rank every candidate label against the text, highest score first.
    async fn classify(
        &self,
        _text: &str,
        _labels: &[String],
    ) -> Result<Vec<LabelScore>, InferenceError> {
        Err(InferenceError::Unsupported {
            model: self.name().to_string(),
            operation: Operation::ZeroShot,
        })
    }

    /// Classify with the model's own label set and return its top label.
    async fn classify_fixed(&self, _text: &str) -> Result<LabelScore, InferenceError> {
        Err(InferenceError::Unsupported {
            model: self.name().to_string(),
            operation: Operation::Fixed,
        })
    }
}

/// Sort a ranking by descending score. NaN scores sink to the bottom.
pub fn rank_descending(mut scores: Vec<LabelScore>) -> Vec<LabelScore> {
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or_else(|| a.score.is_nan().cmp(&b.score.is_nan()))
    });
    scores
}
