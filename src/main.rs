mod config;
mod data;
mod server;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use config::Args;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;

    let state = AppState::load(config.source.clone(), config.default_page_size)
        .with_context(|| format!("loading {}", config.source.path.display()))?;
    {
        let table = state.snapshot();
        log::info!(
            "Loaded {} rows from {} (columns {:?}, identifier column {:?})",
            table.len(),
            config.source.path.display(),
            table.columns,
            table.identifier_column_name()
        );
        if table.is_empty() {
            log::warn!("{} has a header but no rows", config.source.path.display());
        }
    }

    server::run_server(Arc::new(state), config.addr).await
}
