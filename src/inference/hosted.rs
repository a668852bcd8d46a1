// Hugging Face Inference API implementation.
//
// Runs the same models as the local ONNX backend, but on Hugging Face's
// hosted endpoints. Useful when the service host can't fit bart-large-mnli
// in memory. Each adapter is bound to one model and one task: a zero-shot
// model answers `classify`, a text-classification model answers
// `classify_fixed`.
//
// API docs: https://huggingface.co/docs/inference-providers/tasks/zero-shot-classification

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::{rank_descending, InferenceError, LabelScore, Operation, TextClassifier};
use crate::output::truncate_chars;

/// Default base URL for the serverless inference provider.
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";

/// Hub model ids behind each roster name.
pub const TOXIC_BERT_MODEL_ID: &str = "unitary/toxic-bert";
pub const HATE_SPEECH_MODEL_ID: &str = "martin-ha/toxic-comment-model";
pub const ZERO_SHOT_MODEL_ID: &str = "facebook/bart-large-mnli";

/// Hosted model adapter.
pub struct HostedClassifier {
    name: String,
    model_id: String,
    task: Operation,
    client: Client,
    base_url: String,
    api_token: String,
    rate_limiter: Option<RateLimiter>,
}

impl HostedClassifier {
    /// Create an adapter for `model_id` (e.g. "facebook/bart-large-mnli")
    /// answering the given task.
    pub fn new(
        name: &str,
        model_id: &str,
        task: Operation,
        client: Client,
        base_url: &str,
        api_token: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            model_id: model_id.to_string(),
            task,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            rate_limiter: None,
        }
    }

    /// Throttle calls through a (possibly shared) rate limiter.
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model_id)
    }

    fn unsupported(&self, operation: Operation) -> InferenceError {
        InferenceError::Unsupported {
            model: self.name.clone(),
            operation,
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<String, InferenceError> {
        // Respect rate limits before making the call
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await
            .context("Failed to call Hugging Face Inference API")
            .map_err(|e| InferenceError::backend(&self.name, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read Hugging Face Inference API response")
            .map_err(|e| InferenceError::backend(&self.name, e))?;

        if !status.is_success() {
            return Err(InferenceError::backend(
                &self.name,
                anyhow::anyhow!("Inference API returned {}: {}", status, text),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextClassifier for HostedClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, InferenceError> {
        if self.task != Operation::ZeroShot {
            return Err(self.unsupported(Operation::ZeroShot));
        }

        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
            },
        };
        let body = self.post(&request).await?;
        let ranking = parse_zero_shot(&body).map_err(|e| InferenceError::invalid_output(&self.name, e))?;

        debug!(
            model = %self.name,
            top = ?ranking.first(),
            text_preview = %truncate_chars(text, 50),
            "Hosted zero-shot ranked text"
        );
        Ok(ranking)
    }

    async fn classify_fixed(&self, text: &str) -> Result<LabelScore, InferenceError> {
        if self.task != Operation::Fixed {
            return Err(self.unsupported(Operation::Fixed));
        }

        let body = self.post(&TextRequest { inputs: text }).await?;
        let top = parse_text_classification(&body)
            .map_err(|e| InferenceError::invalid_output(&self.name, e))?;

        debug!(
            model = %self.name,
            label = %top.label,
            score = top.score,
            text_preview = %truncate_chars(text, 50),
            "Hosted classifier scored text"
        );
        Ok(top)
    }
}

/// Parse a zero-shot response into a descending ranking.
///
/// The API has answered in two shapes over time: parallel `labels`/`scores`
/// arrays, and a flat list of `{label, score}` objects.
pub(crate) fn parse_zero_shot(body: &str) -> Result<Vec<LabelScore>, String> {
    let parsed: ZeroShotResponse =
        serde_json::from_str(body).map_err(|e| format!("unexpected zero-shot payload: {e}"))?;

    let entries = match parsed {
        ZeroShotResponse::Parallel { labels, scores } => {
            if labels.len() != scores.len() {
                return Err(format!(
                    "{} labels but {} scores",
                    labels.len(),
                    scores.len()
                ));
            }
            labels
                .into_iter()
                .zip(scores)
                .map(|(label, score)| LabelScore::new(label, score))
                .collect()
        }
        ZeroShotResponse::Entries(entries) => entries,
    };

    if entries.is_empty() {
        return Err("empty zero-shot ranking".to_string());
    }
    Ok(rank_descending(entries))
}

/// Parse a text-classification response and return its top label.
///
/// Single inputs come back either as `[{label, score}, ...]` or nested one
/// level deeper as `[[{label, score}, ...]]`.
pub(crate) fn parse_text_classification(body: &str) -> Result<LabelScore, String> {
    let parsed: TextClassificationResponse =
        serde_json::from_str(body).map_err(|e| format!("unexpected classification payload: {e}"))?;

    let entries = match parsed {
        TextClassificationResponse::Flat(entries) => entries,
        TextClassificationResponse::Nested(mut batches) => {
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.swap_remove(0)
            }
        }
    };

    rank_descending(entries)
        .into_iter()
        .next()
        .ok_or_else(|| "empty classification result".to_string())
}

// --- Inference API request/response types ---

#[derive(Serialize)]
struct TextRequest<'a> {
    inputs: &'a str,
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Parallel { labels: Vec<String>, scores: Vec<f64> },
    Entries(Vec<LabelScore>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextClassificationResponse {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
}
