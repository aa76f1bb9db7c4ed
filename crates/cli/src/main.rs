//! postgrid-cli entry point.

use anyhow::{Context, Result};
use clap::Parser;
use postgrid_core::{AppConfig, CacheDb};
use postgrid_query::{Extensions, GridPlanner};
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Commands};
use commands::Admin;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("loading configuration")?;

    if let Commands::Key(key_args) = &cli.command {
        // Same extension set the server registers.
        let planner = GridPlanner::new(Extensions::new(), &config);
        println!("{}", commands::derive_key(key_args, &planner)?);
        return Ok(());
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let db = CacheDb::open(&db_path)
        .await
        .with_context(|| format!("opening cache database {}", db_path.display()))?;
    let admin = Admin::new(db, &config);

    match cli.command {
        Commands::Flush => {
            let flushed = admin.flush().await;
            println!("{}", serde_json::json!({ "flushed": flushed }));
            if !flushed {
                anyhow::bail!("cache flush failed");
            }
        }
        Commands::Purge => {
            let (entries, windows) = admin.purge().await;
            println!("{}", serde_json::json!({ "entries": entries, "rate_windows": windows }));
        }
        Commands::Stats => {
            println!("{}", serde_json::to_string(&admin.stats().await)?);
        }
        Commands::Key(_) => {}
    }

    Ok(())
}
