// Hate speech decision engine.
//
// One evaluation pipeline feeds both entry points:
//   detect  — short-circuit depth, stops at the first deterministic layer
//             that fires so no model is paid for in the obvious cases
//   analyze — full depth, every layer and every model runs exactly once
// The boolean verdict is always `LayerSignals::verdict`, so a report's
// verdict and its detected categories come from the same signal set.
//
// Layer order: pattern -> keyword with violent context -> models (OR).
// A failing model contributes "not hate speech" and never aborts the request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use super::config::{DetectionConfig, ENGINE_VERSION};
use super::matcher::{ContextScorer, KeywordMatcher};
use super::report::{AnalysisReport, ClassificationResult};
use crate::error::ModerationError;
use crate::inference::bounded;
use crate::inference::traits::{InferenceError, LabelScore, TextClassifier};
use crate::output::truncate_chars;

/// Confidence credited to a danger pattern hit.
const PATTERN_CONFIDENCE: f64 = 0.95;
/// Confidence credited to a keyword hit.
const KEYWORD_CONFIDENCE: f64 = 0.8;

/// How a model's output turns into a sub-verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelRole {
    /// Single top label; flagged when it is a toxic spelling scoring above
    /// `threshold`.
    Fixed { threshold: f64 },
    /// Ranks the configured label vocabulary; flagged when the top label is
    /// a hate indicator scoring above the hate threshold.
    ZeroShot,
}

/// A classifier registered with the engine.
#[derive(Clone)]
pub struct ModelSlot {
    pub role: ModelRole,
    pub classifier: Arc<dyn TextClassifier>,
}

impl ModelSlot {
    pub fn fixed(classifier: Arc<dyn TextClassifier>, threshold: f64) -> Self {
        Self {
            role: ModelRole::Fixed { threshold },
            classifier,
        }
    }

    pub fn zero_shot(classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            role: ModelRole::ZeroShot,
            classifier,
        }
    }

    pub fn name(&self) -> &str {
        self.classifier.name()
    }
}

/// What one model said about the text.
#[derive(Debug)]
pub enum ModelOpinion {
    Fixed {
        model: String,
        result: LabelScore,
        flagged: bool,
    },
    ZeroShot {
        model: String,
        ranking: Vec<LabelScore>,
        flagged: bool,
    },
    Failed {
        model: String,
        error: InferenceError,
    },
}

impl ModelOpinion {
    pub fn model(&self) -> &str {
        match self {
            ModelOpinion::Fixed { model, .. }
            | ModelOpinion::ZeroShot { model, .. }
            | ModelOpinion::Failed { model, .. } => model,
        }
    }

    /// Sub-verdict; failures count as false.
    pub fn flagged(&self) -> bool {
        match self {
            ModelOpinion::Fixed { flagged, .. } | ModelOpinion::ZeroShot { flagged, .. } => {
                *flagged
            }
            ModelOpinion::Failed { .. } => false,
        }
    }
}

/// How far evaluation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Stop once a deterministic layer decides the verdict.
    ShortCircuit,
    /// Run every layer and every model.
    Full,
}

/// Everything the layers found for one text.
#[derive(Debug, Default)]
pub struct LayerSignals<'a> {
    pub pattern: Option<&'a str>,
    pub keyword: Option<&'a str>,
    pub violent_context: bool,
    pub opinions: Vec<ModelOpinion>,
}

impl LayerSignals<'_> {
    /// Disjunction over the layers, in order.
    pub fn verdict(&self) -> bool {
        self.pattern.is_some()
            || (self.keyword.is_some() && self.violent_context)
            || self.opinions.iter().any(ModelOpinion::flagged)
    }
}

/// Layered hate speech detector. Shared read-only across requests.
pub struct HateSpeechEngine {
    config: Arc<DetectionConfig>,
    models: Vec<ModelSlot>,
    call_timeout: Duration,
}

impl HateSpeechEngine {
    pub fn new(config: Arc<DetectionConfig>, models: Vec<ModelSlot>, call_timeout: Duration) -> Self {
        Self {
            config,
            models,
            call_timeout,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Names of the registered models, in evaluation order.
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(ModelSlot::name).collect()
    }

    /// Boolean verdict. Empty or whitespace-only text is never hate speech.
    pub async fn detect(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        info!(text_preview = %truncate_chars(text, 50), "Analyzing text");
        let verdict = self.evaluate(text, Depth::ShortCircuit).await.verdict();
        if !verdict {
            info!("No hate speech detected");
        }
        verdict
    }

    /// Structured analysis of the text.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisReport, ModerationError> {
        if text.trim().is_empty() {
            return Err(ModerationError::EmptyText);
        }

        info!(text_preview = %truncate_chars(text, 50), "Analyzing text in full");
        let signals = self.evaluate(text, Depth::Full).await;
        Ok(self.build_report(text, &signals))
    }

    /// Run the layers over `text` up to the requested depth.
    pub async fn evaluate(&self, text: &str, depth: Depth) -> LayerSignals<'_> {
        let lowered = text.to_lowercase();
        let matcher = KeywordMatcher::new(&self.config);
        let mut signals = LayerSignals::default();

        // Layer 1: danger patterns
        signals.pattern = matcher.find_pattern(&lowered);
        if let Some(pattern) = signals.pattern {
            warn!(pattern, "Danger pattern detected");
            if depth == Depth::ShortCircuit {
                return signals;
            }
        }

        // Layer 2: keywords, decisive only with violent context
        signals.keyword = matcher.find_keyword(&lowered);
        signals.violent_context = ContextScorer::new(&self.config).has_violent_context(&lowered);
        if let Some(keyword) = signals.keyword {
            warn!(keyword, violent_context = signals.violent_context, "Keyword detected");
            if signals.violent_context && depth == Depth::ShortCircuit {
                return signals;
            }
        }

        // Layer 3: every model, independently
        for slot in &self.models {
            let opinion = self.consult(slot, text).await;
            match &opinion {
                ModelOpinion::Failed { model, error } => {
                    error!(model = %model, error = %error, "Model call failed, counting as not detected");
                }
                other => info!(model = %other.model(), detected = other.flagged(), "Model sub-verdict"),
            }
            signals.opinions.push(opinion);
        }

        if signals.opinions.iter().any(ModelOpinion::flagged) {
            warn!("Hate speech detected by model layer");
        }
        signals
    }

    async fn consult(&self, slot: &ModelSlot, text: &str) -> ModelOpinion {
        let model = slot.name().to_string();
        match slot.role {
            ModelRole::Fixed { threshold } => {
                match bounded(&model, self.call_timeout, slot.classifier.classify_fixed(text)).await {
                    Ok(result) => {
                        let flagged = self.config.is_toxic_label(&result.label) && result.score > threshold;
                        info!(model = %model, label = %result.label, score = result.score, "Classifier result");
                        ModelOpinion::Fixed {
                            model,
                            result,
                            flagged,
                        }
                    }
                    Err(error) => ModelOpinion::Failed { model, error },
                }
            }
            ModelRole::ZeroShot => {
                let call = slot.classifier.classify(text, &self.config.zero_shot_labels);
                match bounded(&model, self.call_timeout, call).await {
                    Ok(ranking) => match ranking.first() {
                        Some(top) => {
                            let flagged = self.config.is_hate_indicator(&top.label)
                                && top.score > self.config.hate_threshold;
                            info!(model = %model, top = %top.label, score = top.score, "Zero-shot result");
                            ModelOpinion::ZeroShot {
                                model,
                                ranking,
                                flagged,
                            }
                        }
                        None => ModelOpinion::Failed {
                            error: InferenceError::invalid_output(&model, "empty ranking"),
                            model,
                        },
                    },
                    Err(error) => ModelOpinion::Failed { model, error },
                }
            }
        }
    }

    fn build_report(&self, text: &str, signals: &LayerSignals<'_>) -> AnalysisReport {
        let mut detected_categories = Vec::new();
        let mut classifications = Vec::new();
        let mut confidence_score: f64 = 0.0;
        let mut failures = Vec::new();

        if let Some(pattern) = signals.pattern {
            detected_categories.push(format!("Padrão perigoso: {pattern}"));
            confidence_score = confidence_score.max(PATTERN_CONFIDENCE);
        }

        if let Some(keyword) = signals.keyword {
            detected_categories.push(format!("Palavra-chave: {keyword}"));
            confidence_score = confidence_score.max(KEYWORD_CONFIDENCE);
        }

        for opinion in &signals.opinions {
            match opinion {
                ModelOpinion::ZeroShot { ranking, .. } => {
                    // Every label is reported, not only the top one
                    for entry in ranking {
                        let is_flagged = self.config.is_hate_indicator(&entry.label)
                            && entry.score > self.config.hate_threshold;
                        if is_flagged {
                            detected_categories.push(format!("ML: {}", entry.label));
                            confidence_score = confidence_score.max(entry.score);
                        }
                        classifications.push(ClassificationResult {
                            category: entry.label.clone(),
                            confidence: entry.score,
                            is_flagged,
                        });
                    }
                }
                ModelOpinion::Fixed {
                    model,
                    result,
                    flagged: true,
                } => {
                    detected_categories.push(format!("ML: {} ({})", model, result.label.to_uppercase()));
                    confidence_score = confidence_score.max(result.score);
                }
                ModelOpinion::Fixed { .. } => {}
                ModelOpinion::Failed { model, error } => {
                    failures.push(format!("{model}: {error}"));
                }
            }
        }

        AnalysisReport {
            source_text: text.to_string(),
            verdict: signals.verdict(),
            confidence_score,
            detected_categories,
            classifications,
            timestamp: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            fallback_triggered: !failures.is_empty(),
            error_detail: if failures.is_empty() {
                None
            } else {
                Some(failures.join("; "))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(model: &str, flagged: bool) -> ModelOpinion {
        ModelOpinion::Fixed {
            model: model.to_string(),
            result: LabelScore::new("TOXIC", 0.9),
            flagged,
        }
    }

    #[test]
    fn test_verdict_empty_signals_is_false() {
        assert!(!LayerSignals::default().verdict());
    }

    #[test]
    fn test_verdict_keyword_needs_context() {
        let lone = LayerSignals {
            keyword: Some("praga"),
            ..Default::default()
        };
        assert!(!lone.verdict());

        let corroborated = LayerSignals {
            keyword: Some("praga"),
            violent_context: true,
            ..Default::default()
        };
        assert!(corroborated.verdict());
    }

    #[test]
    fn test_verdict_context_without_keyword_is_false() {
        let signals = LayerSignals {
            violent_context: true,
            ..Default::default()
        };
        assert!(!signals.verdict());
    }

    #[test]
    fn test_verdict_any_model_flag_wins() {
        let signals = LayerSignals {
            opinions: vec![
                fixed("toxic_bert", false),
                ModelOpinion::Failed {
                    model: "zero_shot".to_string(),
                    error: InferenceError::invalid_output("zero_shot", "empty ranking"),
                },
                fixed("hate_speech", true),
            ],
            ..Default::default()
        };
        assert!(signals.verdict());
    }

    #[test]
    fn test_failed_opinion_is_not_flagged() {
        let failed = ModelOpinion::Failed {
            model: "toxic_bert".to_string(),
            error: InferenceError::invalid_output("toxic_bert", "nothing"),
        };
        assert!(!failed.flagged());
        assert_eq!(failed.model(), "toxic_bert");
    }
}
