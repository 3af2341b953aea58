use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use adpost_history::{CollectionKind, ContentHistory, HistoryConfig, Metadata, check_storage};

#[derive(Parser)]
#[command(
    name = "adpost-admin",
    about = "Operator helpers for the ad posting content history"
)]
struct Cli {
    /// Directory holding config.toml; the storage path is resolved against it
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Use this storage directory instead of the configured one
    #[arg(long)]
    storage: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    #[command(flatten)]
    Store(StoreCmd),
    /// Exit non-zero unless the storage directory and all files exist
    Health,
}

/// Commands that open (and so initialize) the store.
#[derive(Subcommand)]
enum StoreCmd {
    /// Create the storage directory and any missing collection files
    Init,
    /// Storage health, totals and recent activity
    Status {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Newest records of one collection
    Recent {
        collection: CollectionKind,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Submit a prompt through the duplicate screen
    AddPrompt {
        text: String,
        /// Metadata entry as key=value; values that parse as JSON are kept typed
        #[arg(long = "meta", value_parser = parse_meta)]
        meta: Vec<(String, Value)>,
    },
    /// Drop records older than the retention window
    Cleanup {
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = HistoryConfig::load_with_env(&cli.root)
        .with_context(|| format!("load config under {}", cli.root.display()))?;
    if let Some(storage) = cli.storage {
        cfg.storage.path = storage;
    }

    match cli.cmd {
        // opening the store creates missing files, which would mask the problem
        Cmd::Health => health(&cfg.storage.path),
        Cmd::Store(cmd) => {
            tracing::debug!(storage = %cfg.storage.path.display(), "opening content history");
            let store = ContentHistory::open_with_config(&cfg)
                .with_context(|| format!("open history at {}", cfg.storage.path.display()))?;
            run(&store, &cfg, cmd)
        }
    }
}

fn run(store: &ContentHistory, cfg: &HistoryConfig, cmd: StoreCmd) -> Result<()> {
    let default_limit = cfg.reporting.recent_limit;
    match cmd {
        StoreCmd::Init => print_json(&init_report(store.root())),
        StoreCmd::Status { limit } => print_json(&store.status(limit.unwrap_or(default_limit))),
        StoreCmd::Recent { collection, limit } => {
            let limit = limit.unwrap_or(default_limit);
            let records = match collection {
                CollectionKind::Prompts => serde_json::to_value(store.get_recent_prompts(limit))?,
                CollectionKind::Captions => serde_json::to_value(store.get_recent_captions(limit))?,
                CollectionKind::Images => serde_json::to_value(store.get_recent_images(limit))?,
                CollectionKind::Posts => serde_json::to_value(store.get_recent_posts(limit))?,
            };
            print_json(&records)
        }
        StoreCmd::AddPrompt { text, meta } => {
            let metadata: Metadata = meta.into_iter().collect();
            let accepted = store
                .add_prompt_record(&text, metadata)
                .context("append prompt")?;
            match accepted {
                Some(rec) => print_json(&serde_json::json!({ "accepted": true, "id": rec.id })),
                None => print_json(&serde_json::json!({ "accepted": false })),
            }
        }
        StoreCmd::Cleanup { days } => {
            let days = days.unwrap_or(cfg.retention.days);
            let report = store.cleanup_old_data(days).context("cleanup")?;
            print_json(&report)
        }
    }
}

fn init_report(root: &Path) -> Value {
    serde_json::json!({ "initialized": root.display().to_string() })
}

fn health(root: &Path) -> Result<()> {
    let report = check_storage(root);
    print_json(&report)?;
    anyhow::ensure!(report.is_healthy(), "{}", report.message);
    Ok(())
}

fn parse_meta(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty metadata key in '{raw}'"));
    }
    let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
