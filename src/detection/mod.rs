// Hate speech detection — the layered decision engine.
//
// Text flows through cheap deterministic layers first (danger patterns,
// keywords corroborated by violent context) and only then through the model
// layer, where every configured classifier gives an independent opinion.
// Any layer firing makes the verdict true.

pub mod config;
pub mod engine;
pub mod matcher;
pub mod report;
