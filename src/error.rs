// Use-case level errors.
//
// Model failures never reach this type; the engine and the age estimator
// absorb them. What remains is bad input and the catch-all for anything
// unexpected, both of which the service layer turns into safe responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModerationError {
    /// Empty or whitespace-only text.
    #[error("Texto vazio ou inválido")]
    EmptyText,

    /// An age outside the supported rating set.
    #[error("Classificação inválida: {0}")]
    InvalidRating(u8),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
