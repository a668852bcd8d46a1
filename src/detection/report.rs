// Analysis report types.
//
// Field names on the wire match the HTTP analysis payload, so a report
// serializes straight into the `analysis` object of the response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One zero-shot label's score for the analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    pub confidence: f64,
    /// Hate indicator scored above the hate threshold.
    #[serde(rename = "is_hate_speech")]
    pub is_flagged: bool,
}

/// Full outcome of one `analyze` call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(rename = "text")]
    pub source_text: String,
    #[serde(rename = "is_hate_speech")]
    pub verdict: bool,
    pub confidence_score: f64,
    pub detected_categories: Vec<String>,
    pub classifications: Vec<ClassificationResult>,
    #[serde(rename = "analysis_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "model_version")]
    pub engine_version: String,
    pub fallback_triggered: bool,
    #[serde(rename = "error_message")]
    pub error_detail: Option<String>,
}

impl AnalysisReport {
    /// The classification the zero-shot model was most confident in.
    pub fn primary_classification(&self) -> Option<&ClassificationResult> {
        self.classifications.iter().max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}
