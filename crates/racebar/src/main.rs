//! Main entry point for racebar.

use anyhow::Context;
use racebar::RaceApp;
use racebar_common::init_logging;
use racebar_config::ConfigLoader;
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::discover()
        .load()
        .context("failed to load configuration")?;
    let _guard = init_logging(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting racebar");

    let input = env::args_os().nth(1).map(PathBuf::from);
    let app = RaceApp::new(config);
    let stdout = io::stdout().lock();

    match input.filter(|path| path.as_os_str() != "-") {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            app.run(BufReader::new(file), stdout).await?;
        }
        None => {
            app.run(io::stdin().lock(), stdout).await?;
        }
    }

    Ok(())
}
