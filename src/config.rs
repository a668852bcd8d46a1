use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::inference::download::{self, TOXIC_BERT, ZERO_SHOT};
use crate::inference::hosted::DEFAULT_INFERENCE_URL;
use crate::inference::onnx::model_files_present;

/// Which inference backend runs the models.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    /// Local ONNX models (default) — no API key needed, no rate limits
    Onnx,
    /// Hugging Face Inference API — requires HF_API_TOKEN
    Hosted,
}

/// Central configuration loaded from environment variables.
///
/// Secrets come from env vars only. The .env file is loaded at startup via
/// dotenvy.
pub struct Config {
    pub backend: Backend,
    /// Root directory of the local ONNX model exports
    pub model_dir: PathBuf,
    /// Bearer token for the hosted backend
    pub hf_api_token: String,
    /// Base URL of the hosted inference provider
    pub hf_inference_url: String,
    /// Optional request ceiling for the hosted backend
    pub hosted_qps: Option<f64>,
    /// Deadline for a single model call
    pub inference_timeout: Duration,
    pub bind: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables. Everything has a
    /// default except the hosted API token.
    pub fn load() -> Result<Self> {
        let backend = match env::var("MODERACAO_BACKEND").as_deref() {
            Ok("hosted") => Backend::Hosted,
            // "onnx" or unset both default to ONNX
            _ => Backend::Onnx,
        };

        let model_dir = env::var("MODERACAO_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| download::default_model_dir());

        let hosted_qps = match env::var("MODERACAO_HOSTED_QPS") {
            Ok(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|qps| qps.is_finite() && *qps > 0.0)
                    .with_context(|| {
                        format!("MODERACAO_HOSTED_QPS must be a positive number, got {raw:?}")
                    })?,
            ),
            Err(_) => None,
        };

        let timeout_secs = match env::var("MODERACAO_INFERENCE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| {
                    format!(
                        "MODERACAO_INFERENCE_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    )
                })?,
            Err(_) => 30,
        };

        let port = match env::var("MODERACAO_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("MODERACAO_PORT must be a port number, got {raw:?}"))?,
            Err(_) => 8000,
        };

        Ok(Self {
            backend,
            model_dir,
            hf_api_token: env::var("HF_API_TOKEN").unwrap_or_default(),
            hf_inference_url: env::var("HF_INFERENCE_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string()),
            hosted_qps,
            inference_timeout: Duration::from_secs(timeout_secs),
            bind: env::var("MODERACAO_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
        })
    }

    /// Validate that the chosen backend has what it needs.
    /// For ONNX: the zero-shot and toxic-bert exports must exist.
    /// For Hosted: the API token must be set.
    pub fn require_backend(&self) -> Result<()> {
        match self.backend {
            Backend::Onnx => {
                for name in [ZERO_SHOT, TOXIC_BERT] {
                    let dir = download::model_subdir(&self.model_dir, name);
                    if !model_files_present(&dir) {
                        anyhow::bail!(
                            "ONNX model files for {name} not found in {}\n\
                             Run `moderacao download-model` to download them.\n\
                             Or set MODERACAO_BACKEND=hosted to use the Hugging Face Inference API instead.",
                            dir.display()
                        );
                    }
                }
                Ok(())
            }
            Backend::Hosted => {
                if self.hf_api_token.is_empty() {
                    anyhow::bail!(
                        "HF_API_TOKEN not set. Add it to your .env file to use the hosted backend."
                    );
                }
                Ok(())
            }
        }
    }
}
