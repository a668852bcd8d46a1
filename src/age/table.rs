use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::ModerationError;

/// Supported ratings, ascending.
pub const VALID_AGES: [u8; 6] = [0, 10, 12, 14, 16, 18];

/// Rating used when the model returns a label missing from the table.
pub const DEFAULT_AGE: u8 = 10;

/// A validated minimum recommended age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AgeRating(u8);

impl AgeRating {
    pub fn new(age: u8) -> Result<Self, ModerationError> {
        if VALID_AGES.contains(&age) {
            Ok(Self(age))
        } else {
            Err(ModerationError::InvalidRating(age))
        }
    }

    /// Highest valid rating not above `age`.
    pub fn at_most(age: u8) -> Self {
        let snapped = VALID_AGES
            .iter()
            .rev()
            .find(|&&valid| valid <= age)
            .copied()
            .unwrap_or(0);
        Self(snapped)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Rendered the way ratings are displayed, e.g. "12+".
impl fmt::Display for AgeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+", self.0)
    }
}

impl Serialize for AgeRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered mapping from content category to minimum age.
#[derive(Debug, Clone)]
pub struct AgeRatingTable {
    entries: Vec<(String, AgeRating)>,
}

impl Default for AgeRatingTable {
    fn default() -> Self {
        let entries = [
            ("conteúdo adequado para todas as idades", 0),
            ("conteúdo infantil e educativo", 0),
            ("conteúdo com violência leve ou aventura", 10),
            ("conteúdo com conflitos e suspense", 12),
            ("conteúdo com violência moderada", 14),
            ("conteúdo com violência intensa ou temas adultos", 16),
            ("conteúdo extremamente violento ou perturbador", 18),
        ]
        .into_iter()
        .map(|(label, age)| (label.to_string(), AgeRating(age)))
        .collect();
        Self { entries }
    }
}

impl AgeRatingTable {
    /// Build a table from (label, age) pairs, rejecting unsupported ages.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ModerationError>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(label, age)| AgeRating::new(age).map(|rating| (label.into(), rating)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Category labels in table order, as offered to the zero-shot model.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(label, _)| label.clone()).collect()
    }

    /// Rating for a category, or the default for unknown labels.
    pub fn lookup(&self, label: &str) -> AgeRating {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, rating)| *rating)
            .unwrap_or(AgeRating(DEFAULT_AGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ages_accepted() {
        for age in VALID_AGES {
            assert_eq!(AgeRating::new(age).unwrap().value(), age);
        }
    }

    #[test]
    fn test_invalid_age_rejected() {
        assert!(matches!(
            AgeRating::new(8),
            Err(ModerationError::InvalidRating(8))
        ));
    }

    #[test]
    fn test_at_most_snaps_down() {
        assert_eq!(AgeRating::at_most(8).value(), 0);
        assert_eq!(AgeRating::at_most(12).value(), 12);
        assert_eq!(AgeRating::at_most(15).value(), 14);
        assert_eq!(AgeRating::at_most(40).value(), 18);
    }

    #[test]
    fn test_display_and_serialize() {
        let rating = AgeRating::new(16).unwrap();
        assert_eq!(rating.to_string(), "16+");
        assert_eq!(serde_json::to_string(&rating).unwrap(), "\"16+\"");
    }

    #[test]
    fn test_default_table_lookup() {
        let table = AgeRatingTable::default();
        assert_eq!(table.labels().len(), 7);
        assert_eq!(table.lookup("conteúdo com conflitos e suspense").value(), 12);
        assert_eq!(table.lookup("conteúdo infantil e educativo").value(), 0);
    }

    #[test]
    fn test_unknown_label_defaults_to_ten() {
        assert_eq!(AgeRatingTable::default().lookup("outra coisa").value(), 10);
    }

    #[test]
    fn test_from_entries_rejects_unsupported_age() {
        assert!(AgeRatingTable::from_entries([("a", 0), ("b", 13)]).is_err());
        assert!(AgeRatingTable::from_entries([("a", 0), ("b", 12)]).is_ok());
    }
}
