// src/cli/mod.rs — CLI definition (clap derive)

pub mod patterns;
pub mod replay;
pub mod status;
pub mod workflows;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::infra::config::Config;
use crate::infra::paths;
use crate::memory::SqliteStorage;

#[derive(Parser)]
#[command(
    name = "flowcast",
    about = "Predict the next step and replay repeated workflows",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Database file (overrides storage.db_path)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Storage namespace (overrides storage.namespace)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Feed a JSONL event file through the kernel, printing predictions
    Replay {
        /// One JSON event per line: {"id", "signature", "timestamp"}
        file: PathBuf,
        /// Save every automation suggestion as a workflow
        #[arg(long)]
        accept: bool,
    },
    /// List saved workflows
    Workflows,
    /// Replay a saved workflow over HTTP
    Run {
        /// Workflow id
        id: String,
    },
    /// Show the most frequent patterns
    Patterns {
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
    /// Run one pattern mining pass over the event log
    Rebuild,
    /// Show store and kernel state
    Status,
}

/// Open the namespaced SQLite store selected by flags and config.
pub fn open_storage(cli: &Cli, config: &Config) -> anyhow::Result<Arc<SqliteStorage>> {
    let path = match cli.db.as_ref().or(config.storage.db_path.as_ref()) {
        Some(path) => PathBuf::from(path),
        None => {
            paths::ensure_data_dir()?;
            paths::db_path()
        }
    };
    let namespace = cli
        .namespace
        .as_deref()
        .unwrap_or(&config.storage.namespace);

    tracing::debug!("Opening {} (namespace {})", path.display(), namespace);
    let storage = SqliteStorage::open(&path, namespace, config.kernel.event_log_capacity)?;
    Ok(Arc::new(storage))
}
