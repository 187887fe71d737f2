use anyhow::{Context, Result};
use clap::Parser;
use sift::app::App;
use sift::command::{build_registry, Command};
use sift::config::{default_config_dir, ConfigStore};
use sift::storage::{Database, StorageError};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sift", about = "Multi-user RSS feed aggregator", version)]
struct Args {
    /// Path to the config file (default: $XDG_CONFIG_HOME/sift/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the SQLite database (default: next to the config file)
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Command to run: login, register, reset, users, agg, addfeed,
    /// feeds, follow, following, unfollow
    command: String,

    /// Arguments for the command
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_dir()?.join("config.toml"),
    };
    let config = ConfigStore::load(config_path.clone())
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Precedence: --database flag, then the config file, then a default
    // next to the config file itself.
    let db_path = match args
        .database
        .or_else(|| config.database_path().map(|p| p.to_path_buf()))
    {
        Some(path) => path,
        None => match config_path.parent() {
            Some(dir) => dir.join("sift.db"),
            None => PathBuf::from("sift.db"),
        },
    };

    if let Some(dir) = db_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(StorageError::Locked) => {
            eprintln!(
                "Error: Another sift process appears to be using the database. Close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let mut app = App::new(db, config);
    let registry = build_registry();
    let cmd = Command::new(args.command, args.args);
    registry.run(&mut app, &cmd).await?;

    Ok(())
}
