use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use moderacao::config::Config;
use moderacao::output::terminal;
use moderacao::service::ModerationService;

/// Moderação: age rating and hate speech detection for Portuguese text.
///
/// Runs the moderation HTTP API, or answers one-off questions from the
/// command line with the same models.
#[derive(Parser)]
#[command(name = "moderacao", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the moderation HTTP API
    Serve {
        /// Port to listen on (default: MODERACAO_PORT or 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: MODERACAO_BIND or 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Download the ONNX models (~520 MB total)
    DownloadModel,

    /// Check whether a text is hate speech
    Detect {
        /// The text to check
        text: String,
    },

    /// Full layered hate speech analysis of a text
    Analyze {
        /// The text to analyze
        text: String,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Recommend a minimum age for a text
    Age {
        /// The text to rate
        text: String,
    },

    /// Show backend, model files and credentials
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("moderacao=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            config.require_backend()?;
            let service = build_service(&config)?;

            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            moderacao::web::run_server(service, port, &bind).await?;
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", model_dir.display());

            moderacao::inference::download::download_models(model_dir).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `moderacao serve`.");
        }

        Commands::Detect { text } => {
            let service = load_service()?;
            let response = service.detect(&text).await;
            terminal::display_detection(&response);
        }

        Commands::Analyze { text, json } => {
            let service = load_service()?;
            let response = service.analyze(&text).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                terminal::display_analysis(&response);
            }
        }

        Commands::Age { text } => {
            let service = load_service()?;
            let response = service.classify_age(&text).await?;
            terminal::display_age(&response);
        }

        Commands::Status => {
            let config = Config::load()?;
            moderacao::status::show(&config);
        }
    }

    Ok(())
}

/// Load configuration, check the backend and wire the service.
fn load_service() -> Result<Arc<ModerationService>> {
    let config = Config::load()?;
    config.require_backend()?;
    build_service(&config)
}

fn build_service(config: &Config) -> Result<Arc<ModerationService>> {
    let service = ModerationService::from_config(config)?;
    info!(
        models = ?service.engine().model_names(),
        "Moderation service ready"
    );
    Ok(Arc::new(service))
}
