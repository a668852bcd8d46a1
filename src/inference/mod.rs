// Model inference — trait-based abstraction for swappable providers.
//
// The TextClassifier trait defines the interface every model adapter speaks.
// Local ONNX adapters run bart-large-mnli and toxic-bert on the CPU; the
// hosted adapter calls the Hugging Face Inference API instead. The decision
// engine and the age estimator only ever see the trait.

pub mod download;
pub mod hosted;
pub mod onnx;
pub mod rate_limiter;
pub mod traits;
pub mod zero_shot;

use std::future::Future;
use std::time::Duration;

use traits::InferenceError;

/// Run one adapter call under a deadline. Expiry is reported as
/// `InferenceError::Timeout` so callers treat it like any other model failure.
pub async fn bounded<T, F>(model: &str, after: Duration, call: F) -> Result<T, InferenceError>
where
    F: Future<Output = Result<T, InferenceError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(InferenceError::Timeout {
            model: model.to_string(),
            after,
        }),
    }
}

/// Numerically stable softmax over raw logits.
pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Sigmoid activation: maps any real number to (0, 1).
pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
