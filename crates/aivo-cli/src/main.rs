//! AIVO chat - interactive course assistant
//!
//! Usage:
//!   aivo [--config <path>]

use aivo_core::{AppConfig, LlmClient};
use aivo_cli::{logging, repl};
use aivo_rag::{create_llm_client, ChatBot};
use aivo_vector::{create_embedding_client, QdrantStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "aivo")]
#[command(about = "KTU Virtual Professor Assistant")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "AIVO_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.logging)?;

    let embedder = create_embedding_client(&config.llm)?;
    let store = QdrantStore::new(&config.vector)?.with_embedder(embedder);
    let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);
    let mut bot = ChatBot::from_config(Arc::new(store), llm, &config);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = std::io::stdout();
    repl::run(&mut bot, repl::spawn_stdin_lines(), &mut stdout, shutdown).await?;

    Ok(())
}
