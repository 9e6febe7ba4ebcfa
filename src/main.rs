use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rag_qa::chunking::DEFAULT_CHUNK_SIZE;
use rag_qa::context::DEFAULT_MAX_CONTEXT_CHARS;
use rag_qa::gemini::{GeminiClient, GeminiConfig};
use rag_qa::rag::{EngineSettings, RagEngine};
use rag_qa::server;

/// Question answering over a directory of text and PDF documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory scanned for *.txt and *.pdf files (created if missing)
    #[arg(long, env = "DOCUMENTS_DIR", default_value = "./documents")]
    documents_dir: PathBuf,

    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Chunk window in characters
    #[arg(long, env = "CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE,
          value_parser = parse_positive)]
    chunk_size: usize,

    /// Cap on the context handed to the generator, in characters (0 disables it)
    #[arg(long, env = "MAX_CONTEXT_CHARS", default_value_t = DEFAULT_MAX_CONTEXT_CHARS)]
    max_context_chars: usize,

    /// Timeout for each embedding or generation call while answering
    #[arg(long, env = "MODEL_TIMEOUT_SECS", default_value_t = 30)]
    model_timeout_secs: u64,
}

fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let gemini_config = GeminiConfig::from_env().context("Missing model configuration")?;
    info!(
        "Using {}-dimensional embeddings, answers capped at {} tokens",
        gemini_config.embedding_dimension, gemini_config.max_output_tokens
    );
    let gemini = Arc::new(GeminiClient::new(gemini_config));

    let settings = EngineSettings {
        documents_dir: args.documents_dir,
        chunk_size: args.chunk_size,
        max_context_chars: args.max_context_chars,
        model_timeout: Duration::from_secs(args.model_timeout_secs),
    };
    let engine = Arc::new(RagEngine::new(gemini.clone(), gemini, settings));

    // A failed initial build leaves the service up with an empty corpus
    info!(
        "Building corpus from {}",
        engine.settings().documents_dir.display()
    );
    if let Err(e) = engine.rebuild().await {
        error!("Initial corpus build failed, serving an empty corpus: {:#}", e);
    }

    let app = server::router(engine);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("Server listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
