// Model download helper for the local ONNX backend.
//
// Downloads two ONNX exports from HuggingFace:
// 1. toxic-bert — fixed-label toxicity classifier (~110MB quantized)
// 2. bart-large-mnli — NLI model used for zero-shot classification (~410MB quantized)
//
// Each model gets its own subdirectory of the model dir, holding
// tokenizer.json, config.json and model_quantized.onnx. The optional
// hate_speech classifier has no public ONNX export; drop one into
// <model_dir>/hate_speech to enable it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Roster names, which double as subdirectory names under the model dir.
pub const TOXIC_BERT: &str = "toxic_bert";
pub const HATE_SPEECH: &str = "hate_speech";
pub const ZERO_SHOT: &str = "zero_shot";

/// One downloadable ONNX export.
struct ModelSource {
    name: &'static str,
    base_url: &'static str,
    approx_size: &'static str,
}

const SOURCES: [ModelSource; 2] = [
    ModelSource {
        name: TOXIC_BERT,
        base_url: "https://huggingface.co/Xenova/toxic-bert/resolve/main",
        approx_size: "~110 MB",
    },
    ModelSource {
        name: ZERO_SHOT,
        base_url: "https://huggingface.co/Xenova/bart-large-mnli/resolve/main",
        approx_size: "~410 MB",
    },
];

/// (remote path, local file name, large) for every file of an export.
const FILES: [(&str, &str, bool); 3] = [
    ("tokenizer.json", "tokenizer.json", false),
    ("config.json", "config.json", false),
    ("onnx/model_quantized.onnx", "model_quantized.onnx", true),
];

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/moderacao/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moderacao")
        .join("models")
}

/// Directory holding the export for one roster entry.
pub fn model_subdir(base: &Path, name: &str) -> PathBuf {
    base.join(name)
}

/// Download every ONNX export the local backend needs.
///
/// Shows progress bars for large files. Skips files that already exist.
pub async fn download_models(dir: &Path) -> Result<()> {
    let client = reqwest::Client::new();

    for source in &SOURCES {
        println!("\n{} ({}):", source.name, source.approx_size);

        let target = model_subdir(dir, source.name);
        std::fs::create_dir_all(&target)
            .with_context(|| format!("Failed to create model directory: {}", target.display()))?;

        for (remote, local, large) in FILES {
            let dest = target.join(local);
            if dest.exists() {
                info!(model = source.name, file = local, "Already present, skipping");
                println!("  {} (already exists)", local);
                continue;
            }
            println!("  Downloading {}...", local);
            download_file(&client, &format!("{}/{}", source.base_url, remote), &dest, large)
                .await?;
        }
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    show_progress: bool,
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        let pb = match response.content_length() {
            Some(size) => {
                let pb = ProgressBar::new(size);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                        .context("Invalid progress template")?
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("    {spinner} {bytes}")
                        .context("Invalid progress template")?,
                );
                pb
            }
        };
        Some(pb)
    } else {
        None
    };

    // Stream chunks into memory, advancing the bar as they arrive
    let mut bytes: Vec<u8> = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    // Write to a temp name first so an interrupted download never looks complete
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move {} into place", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_dir_is_under_moderacao() {
        let dir = default_model_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("moderacao") && path_str.contains("models"),
            "Expected path containing moderacao/models, got: {path_str}"
        );
    }

    #[test]
    fn test_model_subdir_uses_roster_name() {
        let base = PathBuf::from("/tmp/test-models");
        assert_eq!(model_subdir(&base, ZERO_SHOT), base.join("zero_shot"));
    }

    #[test]
    fn test_every_source_has_a_distinct_directory() {
        let names: std::collections::HashSet<&str> = SOURCES.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), SOURCES.len());
        assert!(!names.contains(HATE_SPEECH));
    }
}
