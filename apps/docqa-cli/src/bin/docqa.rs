use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use docqa_cli::factory::{OpenAiPipelineFactory, PipelineFactory};
use docqa_cli::render::snippet_line;
use docqa_cli::web::{self, AppState, AskResponse};
use docqa_core::credentials::resolve_api_key;
use docqa_core::{logging, AppConfig, Chunker, CorpusFingerprint, CorpusLoader};
use docqa_embed::{get_default_embedder, use_fake_embeddings};
use docqa_vector::{IndexCache, VectorIndex};

#[derive(Parser)]
#[command(name = "docqa", version, about = "Ask questions about a folder of text documents")]
struct Cli {
    /// Directory holding config.toml and config.<env>.toml
    #[arg(long, global = true, env = "DOCQA_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Config profile (dev, prod, test)
    #[arg(long = "env", global = true, env = "RUST_ENV", default_value = "dev")]
    env_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web UI
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Answer one question and exit
    Ask {
        question: String,
        /// Overrides openai.api_key and OPENAI_API_KEY
        #[arg(long)]
        api_key: Option<String>,
        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load, chunk and embed the corpus once, then print statistics
    Index {
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir, &cli.env_name)?;
    logging::init(&config.logging)?;

    match cli.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Ask { question, api_key, json } => ask(config, &question, api_key.as_deref(), json).await,
        Command::Index { api_key } => index(&config, api_key.as_deref()).await,
    }
}

async fn serve(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;

    let server_key = match resolve_api_key(None, config.openai.api_key.as_deref()) {
        Ok(key) => {
            info!(key = %key, "Using API key from configuration");
            Some(key.expose().to_string())
        }
        Err(e) => {
            if e.is_credential() && !matches!(e, docqa_core::Error::MissingCredential) {
                warn!(error = %e, "Ignoring configured API key");
            }
            None
        }
    };

    let factory = OpenAiPipelineFactory::new(config, Arc::new(IndexCache::new()))?;
    let state = AppState { factory: Arc::new(factory), server_key };
    web::serve(state, addr, shutdown_signal()).await
}

async fn ask(config: AppConfig, question: &str, api_key: Option<&str>, json: bool) -> Result<()> {
    let key = resolve_api_key(api_key, config.openai.api_key.as_deref())?;
    let factory = OpenAiPipelineFactory::new(config, Arc::new(IndexCache::new()))?;
    let answer = factory.pipeline(&key)?.answer(question, &[]).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&AskResponse::from(&answer))?);
        return Ok(());
    }
    println!("🤖 Answer: {}", answer.answer);
    println!("📚 Sources:");
    for citation in &answer.sources {
        println!("{}", snippet_line(&citation.chunk));
    }
    Ok(())
}

async fn index(config: &AppConfig, api_key: Option<&str>) -> Result<()> {
    let key = if use_fake_embeddings(&config.openai) {
        None
    } else {
        Some(resolve_api_key(api_key, config.openai.api_key.as_deref())?)
    };
    let embedder = get_default_embedder(&config.openai, key.as_ref())?;
    let loader = CorpusLoader::from_config(&config.corpus)?;
    let chunker = Chunker::new(config.chunking)?;

    let started = Instant::now();
    let docs = loader.load()?;
    let chunks = chunker.chunk_all(&docs);
    let fingerprint = CorpusFingerprint::of(&docs);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message(format!("Embedding {} chunks with {}", chunks.len(), embedder.embedder_id()));
    spinner.enable_steady_tick(Duration::from_millis(120));
    let built = VectorIndex::build(chunks, embedder.as_ref(), fingerprint).await;
    spinner.finish_and_clear();
    let index = built?;

    println!("✅ Index built");
    println!("📂 Corpus: {}", loader.dir().display());
    println!("📊 Documents: {}", docs.len());
    println!("📊 Chunks: {}", index.len());
    println!("🔢 Dimension: {}", index.dim());
    println!("🧠 Embedder: {}", index.embedder_id());
    println!("🔑 Fingerprint: {}", index.fingerprint().short());
    println!("🕒 Built at: {}", index.built_at().to_rfc3339());
    println!("⏱️  Took {:.2?}", started.elapsed());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
