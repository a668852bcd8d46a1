// System status display — backend, model files on disk, hosted credentials.

use std::path::Path;

use colored::Colorize;

use crate::config::{Backend, Config};
use crate::inference::download::{model_subdir, HATE_SPEECH, TOXIC_BERT, ZERO_SHOT};
use crate::inference::onnx::{model_file, model_files_present};

/// Display system status to the terminal.
pub fn show(config: &Config) {
    match config.backend {
        Backend::Onnx => println!("Backend: local ONNX"),
        Backend::Hosted => println!("Backend: hosted ({})", config.hf_inference_url),
    }
    println!("Model directory: {}", config.model_dir.display());

    for name in [TOXIC_BERT, HATE_SPEECH, ZERO_SHOT] {
        let dir = model_subdir(&config.model_dir, name);
        println!("  {:<12} {}", name, describe_model(&dir));
    }

    let token = if config.hf_api_token.is_empty() {
        "not set".dimmed()
    } else {
        "set".green()
    };
    println!("HF_API_TOKEN: {token}");
    if let Some(qps) = config.hosted_qps {
        println!("Hosted rate limit: {qps} req/s");
    }
    println!(
        "Inference timeout: {}s",
        config.inference_timeout.as_secs()
    );

    if config.backend == Backend::Onnx
        && !model_files_present(&model_subdir(&config.model_dir, ZERO_SHOT))
    {
        println!("\nRun `moderacao download-model` to fetch the local models.");
    }
}

fn describe_model(dir: &Path) -> String {
    if !model_files_present(dir) {
        return "missing".yellow().to_string();
    }
    let size = model_file(dir)
        .and_then(|path| std::fs::metadata(path).ok())
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|| "unknown size".to_string());
    format!("{} ({size})", "present".green())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
