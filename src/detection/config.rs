// Detection tables and thresholds.
//
// Built once at startup and shared read-only (`Arc<DetectionConfig>`) by
// every request. `Default` carries the production Portuguese tables.

use std::collections::HashSet;

use anyhow::Result;

/// Version string stamped on every analysis report.
pub const ENGINE_VERSION: &str = "1.1.0";

/// Immutable configuration for the hate speech decision engine.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Multi-word phrases that alone make text hate speech. Order is the
    /// tie-break when several match.
    pub danger_patterns: Vec<String>,
    /// Single keywords that need violent context to count. Ordered.
    pub keywords: Vec<String>,
    /// Vocabulary counted by the context scorer.
    pub violent_context: Vec<String>,
    /// Distinct violent-context tokens needed for corroboration.
    pub violent_context_min: usize,
    /// Candidate labels offered to the zero-shot model.
    pub zero_shot_labels: Vec<String>,
    /// Zero-shot labels that indicate hate speech.
    pub hate_indicators: HashSet<String>,
    /// Zero-shot score a hate indicator must exceed.
    pub hate_threshold: f64,
    /// Default score a fixed-label model's toxic label must exceed.
    pub toxic_threshold: f64,
    /// Per-model overrides of `toxic_threshold`, keyed by model name.
    pub model_thresholds: Vec<(String, f64)>,
    /// Uppercased fixed-label spellings that mean "toxic".
    pub toxic_labels: HashSet<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let zero_shot_labels = owned(&[
            "discurso de ódio extremo e violento",
            "incitação à violência e eliminação",
            "desumanização e comparação com pragas",
            "linguagem discriminatória severa",
            "ameaças e intimidação",
            "bullying e assédio grave",
            "conteúdo tóxico moderado",
            "linguagem ofensiva leve",
            "crítica construtiva",
            "conteúdo neutro e respeitoso",
        ]);
        // The first seven labels are the hateful ones
        let hate_indicators = zero_shot_labels.iter().take(7).cloned().collect();

        Self {
            danger_patterns: owned(&[
                "deveriam ser eliminad",
                "são uma praga",
                "não merecem viver",
                "mundo seria melhor sem",
                "deveria morrer",
                "não são humanos",
                "raça inferior",
                "merecem sofrer",
            ]),
            keywords: owned(&[
                // violence and elimination
                "eliminar", "eliminadas", "eliminados", "exterminar", "extermínio",
                "matar", "morrer", "morte", "assassinar", "acabar com",
                // dehumanization
                "praga", "pragas", "parasita", "parasitas", "lixo", "escória",
                "verme", "vermes", "animal", "animais", "coisa", "coisas",
                // hatred and discrimination
                "ódio", "odio", "nojo", "repugnante", "asqueroso", "nojento",
                "inferior", "inferiores", "superiores", "raça", "espécie",
                // direct violence
                "violência", "agressão", "atacar", "destruir", "aniquilar",
                "sumir", "desaparecer", "banir", "expulsar",
            ]),
            violent_context: owned(&[
                "eliminar", "matar", "morrer", "violência", "destruir", "praga", "inferior",
            ]),
            violent_context_min: 2,
            zero_shot_labels,
            hate_indicators,
            hate_threshold: 0.4,
            toxic_threshold: 0.5,
            // toxic-bert scores conservatively, so it gets a lower bar
            model_thresholds: vec![("toxic_bert".to_string(), 0.3)],
            toxic_labels: owned(&["TOXIC", "HATE", "OFFENSIVE", "1", "POSITIVE", "LABEL_1"])
                .into_iter()
                .collect(),
        }
    }
}

impl DetectionConfig {
    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        let overrides = self
            .model_thresholds
            .iter()
            .map(|(model, value)| (model.as_str(), *value));
        for (name, value) in [
            ("hate_threshold", self.hate_threshold),
            ("toxic_threshold", self.toxic_threshold),
        ]
        .into_iter()
        .chain(overrides)
        {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must be within [0, 1], got {value}");
            }
        }

        if let Some(stray) = self
            .hate_indicators
            .iter()
            .find(|label| !self.zero_shot_labels.contains(label))
        {
            anyhow::bail!("Hate indicator {stray:?} is not offered to the zero-shot model");
        }

        if self.violent_context_min == 0 {
            anyhow::bail!("violent_context_min must be at least 1");
        }

        // Matching runs on lowercased text, so uppercase entries could never match
        for entry in self
            .danger_patterns
            .iter()
            .chain(&self.keywords)
            .chain(&self.violent_context)
        {
            if entry.is_empty() || entry.to_lowercase() != *entry {
                anyhow::bail!("Match table entry {entry:?} must be non-empty and lowercase");
            }
        }

        Ok(())
    }

    pub fn is_hate_indicator(&self, label: &str) -> bool {
        self.hate_indicators.contains(label)
    }

    /// Score a fixed-label model must exceed to flag text.
    pub fn threshold_for(&self, model: &str) -> f64 {
        self.model_thresholds
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, value)| *value)
            .unwrap_or(self.toxic_threshold)
    }

    pub fn is_toxic_label(&self, label: &str) -> bool {
        self.toxic_labels.contains(&label.to_uppercase())
    }
}
