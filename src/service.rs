// Use-case boundaries shared by the HTTP handlers and the CLI.
//
// Every entry point answers with a structured response, never an error:
// invalid input and unexpected failures (including a panic inside the
// engine, caught at the task boundary) become `success: false` and the text
// is treated as safe.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::age::estimator::{fallback_rating, AgeEstimator};
use crate::age::table::{AgeRating, AgeRatingTable};
use crate::config::{Backend, Config};
use crate::detection::config::DetectionConfig;
use crate::detection::engine::{HateSpeechEngine, ModelSlot};
use crate::detection::report::AnalysisReport;
use crate::error::ModerationError;
use crate::inference::download::{model_subdir, HATE_SPEECH, TOXIC_BERT, ZERO_SHOT};
use crate::inference::hosted::{
    HostedClassifier, HATE_SPEECH_MODEL_ID, TOXIC_BERT_MODEL_ID, ZERO_SHOT_MODEL_ID,
};
use crate::inference::onnx::OnnxTextClassifier;
use crate::inference::rate_limiter::RateLimiter;
use crate::inference::traits::{Operation, TextClassifier};
use crate::inference::zero_shot::OnnxZeroShotClassifier;
use crate::output::truncate_chars;

const DETECT_OK: &str = "Análise concluída com sucesso";
const DETECT_FAILED: &str = "Erro na análise - assumindo conteúdo seguro";

/// Body of `POST /ia/hate_speech/detect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    pub is_hate_speech: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}

/// Body of `POST /ia/hate_speech/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /ia/age_classification`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeRatingResponse {
    pub rating: AgeRating,
}

/// Trimmed, non-empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent(String);

impl TextContent {
    pub fn new(text: &str) -> Result<Self, ModerationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ModerationError::EmptyText);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The moderation use cases, wired once at startup.
pub struct ModerationService {
    engine: HateSpeechEngine,
    age: AgeEstimator,
}

/// Models available to the service, in evaluation order.
pub struct ModelRoster {
    pub fixed: Vec<Arc<dyn TextClassifier>>,
    pub zero_shot: Option<Arc<dyn TextClassifier>>,
}

impl ModelRoster {
    /// Build the roster for the configured backend. A local model that fails
    /// to load is left out with a warning; the rest keep working without it.
    pub fn load(config: &Config) -> Self {
        match config.backend {
            Backend::Onnx => {
                let mut fixed: Vec<Arc<dyn TextClassifier>> = Vec::new();
                for name in [TOXIC_BERT, HATE_SPEECH] {
                    match OnnxTextClassifier::load(name, &model_subdir(&config.model_dir, name)) {
                        Ok(classifier) => {
                            info!(model = name, "Loaded local classifier");
                            fixed.push(Arc::new(classifier));
                        }
                        Err(e) => {
                            warn!(model = name, error = %format!("{e:#}"), "Classifier not loaded")
                        }
                    }
                }

                let zero_shot: Option<Arc<dyn TextClassifier>> = match OnnxZeroShotClassifier::load(
                    ZERO_SHOT,
                    &model_subdir(&config.model_dir, ZERO_SHOT),
                ) {
                    Ok(classifier) => {
                        info!(model = ZERO_SHOT, "Loaded local zero-shot model");
                        Some(Arc::new(classifier))
                    }
                    Err(e) => {
                        warn!(
                            model = ZERO_SHOT,
                            error = %format!("{e:#}"),
                            "Zero-shot model not loaded"
                        );
                        None
                    }
                };

                Self { fixed, zero_shot }
            }
            Backend::Hosted => {
                let client = reqwest::Client::new();
                let limiter = config.hosted_qps.map(RateLimiter::new);
                let hosted = |name: &str, model_id: &str, task: Operation| -> Arc<dyn TextClassifier> {
                    let classifier = HostedClassifier::new(
                        name,
                        model_id,
                        task,
                        client.clone(),
                        &config.hf_inference_url,
                        &config.hf_api_token,
                    );
                    match &limiter {
                        Some(limiter) => Arc::new(classifier.with_rate_limiter(limiter.clone())),
                        None => Arc::new(classifier),
                    }
                };

                info!(url = %config.hf_inference_url, "Using hosted inference backend");
                Self {
                    fixed: vec![
                        hosted(TOXIC_BERT, TOXIC_BERT_MODEL_ID, Operation::Fixed),
                        hosted(HATE_SPEECH, HATE_SPEECH_MODEL_ID, Operation::Fixed),
                    ],
                    zero_shot: Some(hosted(ZERO_SHOT, ZERO_SHOT_MODEL_ID, Operation::ZeroShot)),
                }
            }
        }
    }
}

impl ModerationService {
    pub fn new(engine: HateSpeechEngine, age: AgeEstimator) -> Self {
        Self { engine, age }
    }

    /// Wire the engine and the estimator around one shared model roster.
    /// The zero-shot handle serves both hate speech and age rating.
    pub fn from_roster(
        detection: DetectionConfig,
        roster: ModelRoster,
        call_timeout: std::time::Duration,
    ) -> Result<Self> {
        detection.validate()?;
        let detection = Arc::new(detection);

        let mut slots: Vec<ModelSlot> = roster
            .fixed
            .into_iter()
            .map(|classifier| {
                let threshold = detection.threshold_for(classifier.name());
                ModelSlot::fixed(classifier, threshold)
            })
            .collect();
        if let Some(zero_shot) = &roster.zero_shot {
            slots.push(ModelSlot::zero_shot(Arc::clone(zero_shot)));
        }

        let engine = HateSpeechEngine::new(detection, slots, call_timeout);
        let age = AgeEstimator::new(roster.zero_shot, AgeRatingTable::default(), call_timeout);
        Ok(Self::new(engine, age))
    }

    /// Build the production service from process configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_roster(
            DetectionConfig::default(),
            ModelRoster::load(config),
            config.inference_timeout,
        )
    }

    pub fn engine(&self) -> &HateSpeechEngine {
        &self.engine
    }

    /// Hate speech yes/no.
    pub async fn detect(self: &Arc<Self>, text: &str) -> DetectionResponse {
        if text.trim().is_empty() {
            return DetectionResponse {
                success: false,
                is_hate_speech: false,
                message: None,
                error: Some(ModerationError::EmptyText.to_string()),
                text_length: None,
            };
        }

        let this = Arc::clone(self);
        let owned = text.to_string();
        match guarded(async move { Ok(this.engine.detect(&owned).await) }).await {
            Ok(is_hate_speech) => {
                info!(
                    is_hate_speech,
                    text_preview = %truncate_chars(text, 50),
                    "Detection finished"
                );
                DetectionResponse {
                    success: true,
                    is_hate_speech,
                    message: Some(DETECT_OK.to_string()),
                    error: None,
                    text_length: Some(text.chars().count()),
                }
            }
            Err(e) => {
                error!(error = %e, "Detection use case failed");
                DetectionResponse {
                    success: false,
                    is_hate_speech: false,
                    message: Some(DETECT_FAILED.to_string()),
                    error: Some(e.to_string()),
                    text_length: None,
                }
            }
        }
    }

    /// Full hate speech analysis.
    pub async fn analyze(self: &Arc<Self>, text: &str) -> AnalysisResponse {
        let this = Arc::clone(self);
        let owned = text.to_string();
        match guarded(async move { this.engine.analyze(&owned).await }).await {
            Ok(report) => {
                info!(
                    is_hate_speech = report.verdict,
                    text_preview = %truncate_chars(text, 50),
                    "Analysis finished"
                );
                AnalysisResponse {
                    success: true,
                    analysis: Some(report),
                    error: None,
                }
            }
            Err(e) => {
                if !matches!(e, ModerationError::EmptyText) {
                    error!(error = %e, "Analysis use case failed");
                }
                AnalysisResponse {
                    success: false,
                    analysis: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Minimum recommended age. Only empty input is an error; model trouble
    /// is absorbed by the estimator's fallback, and so is a crash inside it.
    pub async fn classify_age(
        self: &Arc<Self>,
        text: &str,
    ) -> Result<AgeRatingResponse, ModerationError> {
        let content = TextContent::new(text)?;
        let this = Arc::clone(self);
        let owned = content.clone();
        let rating = match guarded(async move { Ok(this.age.estimate(owned.as_str()).await) }).await {
            Ok(rating) => rating,
            Err(e) => {
                error!(error = %e, "Age rating use case failed, using word-count fallback");
                fallback_rating(content.as_str())
            }
        };
        Ok(AgeRatingResponse { rating })
    }
}

/// Run a use case on its own task so a panic surfaces as an error value.
async fn guarded<T, F>(work: F) -> Result<T, ModerationError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ModerationError>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(join_error) => Err(ModerationError::Unexpected(anyhow::anyhow!(
            "use case aborted: {join_error}"
        ))),
    }
}
