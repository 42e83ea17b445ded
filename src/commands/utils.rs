use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use webtrail::config::RunPaths;
use webtrail::store::FileStore;

/// Resolves on Ctrl-C, never if the handler cannot be installed
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Store rooted at the run directory
pub fn open_store(paths: &RunPaths) -> Result<Arc<FileStore>> {
    let store = FileStore::new(paths.dir())
        .with_context(|| format!("Cannot use directory {}", paths.dir().display()))?;
    Ok(Arc::new(store))
}

/// Print a result as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
