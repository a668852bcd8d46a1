// Scripted classifiers shared by the integration tests.
//
// Each stub answers with a fixed result and counts its calls, so tests can
// assert both what the engine decided and which models it paid for.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use moderacao::inference::traits::{rank_descending, InferenceError, LabelScore, TextClassifier};

/// Fixed-label model that always answers the same top label.
pub struct FixedStub {
    pub name: String,
    pub answer: LabelScore,
    pub calls: Arc<AtomicUsize>,
}

impl FixedStub {
    pub fn new(name: &str, label: &str, score: f64) -> Self {
        Self {
            name: name.to_string(),
            answer: LabelScore::new(label, score),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TextClassifier for FixedStub {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify_fixed(&self, _text: &str) -> Result<LabelScore, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Zero-shot model that puts `top` first with `score` and spreads the rest
/// of the mass evenly over the other candidate labels. Vocabularies without
/// `top` get uniform scores.
pub struct ZeroShotStub {
    pub name: String,
    pub top: String,
    pub score: f64,
    pub calls: Arc<AtomicUsize>,
}

impl ZeroShotStub {
    pub fn new(top: &str, score: f64) -> Self {
        Self {
            name: "zero_shot".to_string(),
            top: top.to_string(),
            score,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TextClassifier for ZeroShotStub {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        _text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !labels.contains(&self.top) {
            // Asked about a vocabulary it has no opinion on: uniform scores
            let uniform = 1.0 / labels.len().max(1) as f64;
            return Ok(labels.iter().map(|l| LabelScore::new(l.clone(), uniform)).collect());
        }
        let others = labels.iter().filter(|l| **l != self.top).count().max(1);
        let rest = (1.0 - self.score) / others as f64;
        let mut ranking: Vec<LabelScore> = labels
            .iter()
            .filter(|l| **l != self.top)
            .map(|l| LabelScore::new(l.clone(), rest))
            .collect();
        ranking.push(LabelScore::new(self.top.clone(), self.score));
        Ok(rank_descending(ranking))
    }
}

/// Model whose every call fails.
pub struct FailingStub {
    pub name: String,
    pub calls: Arc<AtomicUsize>,
}

impl FailingStub {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn fail(&self) -> InferenceError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        InferenceError::Unavailable {
            model: self.name.clone(),
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl TextClassifier for FailingStub {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        _text: &str,
        _labels: &[String],
    ) -> Result<Vec<LabelScore>, InferenceError> {
        Err(self.fail())
    }

    async fn classify_fixed(&self, _text: &str) -> Result<LabelScore, InferenceError> {
        Err(self.fail())
    }
}

/// Model that never answers within any reasonable deadline.
pub struct StalledStub {
    pub name: String,
}

#[async_trait]
impl TextClassifier for StalledStub {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        _text: &str,
        _labels: &[String],
    ) -> Result<Vec<LabelScore>, InferenceError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn classify_fixed(&self, _text: &str) -> Result<LabelScore, InferenceError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(LabelScore::new("TOXIC", 1.0))
    }
}

/// Model with a bug: panics instead of answering.
pub struct PanickingStub;

#[async_trait]
impl TextClassifier for PanickingStub {
    fn name(&self) -> &str {
        "toxic_bert"
    }

    async fn classify_fixed(&self, _text: &str) -> Result<LabelScore, InferenceError> {
        panic!("tensor shape mismatch");
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Generous deadline for stubs that answer immediately.
pub const TIMEOUT: Duration = Duration::from_secs(5);
