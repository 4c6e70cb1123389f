//! The `lessonflow reset` command.

use std::path::PathBuf;

use anyhow::Result;

use lessonflow_adapters::config::{load_config_from, open_progress_store};
use lessonflow_core::traits::ProgressStore;

pub fn execute(module_id: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = open_progress_store(&config)?;
    store.clear(&module_id)?;
    tracing::info!(module = %module_id, "progress cleared");
    println!("Progress for {module_id} cleared.");
    Ok(())
}
