//! The `lessonflow progress` command.

use std::path::PathBuf;

use anyhow::Result;

use lessonflow_adapters::config::{load_config_from, open_progress_store};
use lessonflow_core::traits::ProgressStore;

pub fn execute(module_id: String, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = open_progress_store(&config)?;
    let progress = store.get(&module_id)?;

    if json {
        let value = serde_json::json!({
            "module_id": module_id,
            "progress": progress,
            "completed": progress.is_some_and(|p| p.is_completed()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match progress {
        None => println!("{module_id}: no progress recorded"),
        Some(p) if p.is_completed() => {
            println!("{module_id}: completed ({} sections)", p.section_count)
        }
        Some(p) => println!(
            "{module_id}: on section {} of {}",
            p.current_section_index + 1,
            p.section_count
        ),
    }
    Ok(())
}
