//! AIVO admin - vector store collection management
//!
//! Usage:
//!   aivo-admin --list
//!   aivo-admin --delete <name>

use aivo_cli::logging;
use aivo_cli::manage::{self, AdminAction};
use aivo_core::AppConfig;
use aivo_vector::{CollectionAdmin, QdrantStore};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "aivo-admin")]
#[command(about = "Manage vector store collections")]
#[command(version)]
struct Cli {
    /// List all collections
    #[arg(long, conflicts_with = "delete")]
    list: bool,

    /// Delete specified collection by name
    #[arg(long, value_name = "NAME")]
    delete: Option<String>,

    /// Path to a TOML config file
    #[arg(long, env = "AIVO_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(action) = AdminAction::from_flags(cli.list, cli.delete) else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = AppConfig::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.logging)?;

    let store = Arc::new(QdrantStore::new(&config.vector)?);
    let admin = CollectionAdmin::from_config(store, &config.vector);

    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout();
    manage::execute(action, &admin, &mut stdin, &mut stdout).await
}
