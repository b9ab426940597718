//! RAG Server binary
//!
//! Run with: cargo run -p normes-rag --bin normes-rag-server -- --config normes-rag.toml

use clap::Parser;
use normes_rag::{config::RagConfig, generation::OllamaClient, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "normes-rag-server")]
#[command(about = "Question answering over electrical standards", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides the configuration file)
    #[arg(long)]
    host: Option<String>,

    /// Port (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "normes_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = RagConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Generation model: {}", config.llm.generate_model);
    tracing::info!("  - Classifier model: {}", config.llm.formulator_model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!(
        "  - Relevance threshold: {} (top_k {})",
        config.retrieval.relevance_threshold,
        config.retrieval.top_k
    );

    // Check Ollama
    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    let ollama = OllamaClient::new(&config.llm)?;
    match ollama.list_models().await {
        Ok(installed) => {
            tracing::info!("Ollama is running ({} models installed)", installed.len());
            for model in [
                &config.llm.generate_model,
                &config.llm.formulator_model,
                &config.llm.embed_model,
            ] {
                let found = installed.iter().any(|name| {
                    name == model || name.strip_suffix(":latest") == Some(model.as_str())
                });
                if !found {
                    tracing::warn!("Model {} is not installed, run: ollama pull {}", model, model);
                }
            }
        }
        Err(e) => {
            tracing::warn!("Ollama not available at {}: {}", config.llm.base_url, e);
        }
    }

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}/api/rag", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
