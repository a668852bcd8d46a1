use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use super::table::{AgeRating, AgeRatingTable};
use crate::inference::bounded;
use crate::inference::traits::{InferenceError, TextClassifier};
use crate::output::truncate_chars;

/// Top score below which the rating is lowered.
pub const LOW_CONFIDENCE: f64 = 0.3;
/// Top score above which the rating is reported as high-confidence.
pub const HIGH_CONFIDENCE: f64 = 0.8;
/// Years subtracted under low confidence, before snapping to a valid rating.
const LOW_CONFIDENCE_STEP: u8 = 2;
/// Word count above which the fallback treats text as complex.
pub const LONG_TEXT_WORDS: usize = 100;

/// Zero-shot age estimator with a word-count fallback.
pub struct AgeEstimator {
    classifier: Option<Arc<dyn TextClassifier>>,
    table: AgeRatingTable,
    call_timeout: Duration,
}

impl AgeEstimator {
    /// `classifier` is the shared zero-shot model; `None` means every
    /// estimate uses the fallback.
    pub fn new(
        classifier: Option<Arc<dyn TextClassifier>>,
        table: AgeRatingTable,
        call_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            table,
            call_timeout,
        }
    }

    /// Minimum recommended age for `text`. Never fails: model trouble falls
    /// back to the word-count heuristic.
    pub async fn estimate(&self, text: &str) -> AgeRating {
        match self.classify(text).await {
            Ok((label, score)) => {
                let mapped = self.table.lookup(&label);
                info!(
                    category = %label,
                    confidence = score,
                    text_preview = %truncate_chars(text, 100),
                    "Top age classification"
                );
                adjust_for_confidence(mapped, score)
            }
            Err(e) => {
                error!(error = %e, "Age classification failed, using word-count fallback");
                fallback_rating(text)
            }
        }
    }

    async fn classify(&self, text: &str) -> Result<(String, f64), InferenceError> {
        let classifier = self.classifier.as_ref().ok_or_else(|| InferenceError::Unavailable {
            model: "zero_shot".to_string(),
            reason: "no zero-shot model configured".to_string(),
        })?;
        let name = classifier.name().to_string();

        let labels = self.table.labels();
        let ranking = bounded(&name, self.call_timeout, classifier.classify(text, &labels)).await?;
        ranking
            .into_iter()
            .next()
            .map(|top| (top.label, top.score))
            .ok_or_else(|| InferenceError::invalid_output(&name, "empty ranking"))
    }
}

/// Lower the rating when the model is unsure; keep it otherwise.
pub fn adjust_for_confidence(mapped: AgeRating, confidence: f64) -> AgeRating {
    if confidence < LOW_CONFIDENCE {
        let adjusted = AgeRating::at_most(mapped.value().saturating_sub(LOW_CONFIDENCE_STEP));
        info!(from = mapped.value(), to = adjusted.value(), "Low confidence, lowering rating");
        adjusted
    } else {
        if confidence > HIGH_CONFIDENCE {
            info!(rating = mapped.value(), "High confidence classification");
        }
        mapped
    }
}

/// Rating from text length alone: long texts are treated as more complex.
pub fn fallback_rating(text: &str) -> AgeRating {
    if text.split_whitespace().count() > LONG_TEXT_WORDS {
        AgeRating::at_most(12)
    } else {
        AgeRating::at_most(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(age: u8) -> AgeRating {
        AgeRating::new(age).unwrap()
    }

    #[test]
    fn test_low_confidence_lowers_rating() {
        assert_eq!(adjust_for_confidence(rating(12), 0.25), rating(10));
        assert_eq!(adjust_for_confidence(rating(18), 0.1), rating(16));
    }

    #[test]
    fn test_low_confidence_never_leaves_rating_set() {
        assert_eq!(adjust_for_confidence(rating(10), 0.2), rating(0));
        assert_eq!(adjust_for_confidence(rating(0), 0.2), rating(0));
    }

    #[test]
    fn test_mid_and_high_confidence_keep_rating() {
        assert_eq!(adjust_for_confidence(rating(14), 0.5), rating(14));
        assert_eq!(adjust_for_confidence(rating(14), 0.85), rating(14));
        assert_eq!(adjust_for_confidence(rating(14), LOW_CONFIDENCE), rating(14));
    }

    #[test]
    fn test_fallback_by_word_count() {
        assert_eq!(fallback_rating(&"palavra ".repeat(150)), rating(12));
        assert_eq!(fallback_rating(&"palavra ".repeat(50)), rating(10));
        assert_eq!(fallback_rating(&"palavra ".repeat(100)), rating(10));
    }
}
