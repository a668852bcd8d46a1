// Moderação: age rating and hate speech detection for Portuguese text
//
// This is the library root. `service` wires the use cases; `web` and the
// CLI in main.rs are the two front ends over it.

pub mod age;
pub mod config;
pub mod detection;
pub mod error;
pub mod inference;
pub mod output;
pub mod service;
pub mod status;
pub mod web;
