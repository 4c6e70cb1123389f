//! The `lessonflow modules` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use lessonflow_adapters::config::{load_config_from, open_progress_store};
use lessonflow_core::catalog::{module_statuses, parse_catalog, ModuleStatus};

pub fn execute(course_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog_path = config.catalog_path();
    let content = std::fs::read_to_string(&catalog_path)
        .with_context(|| format!("failed to read catalog: {}", catalog_path.display()))?;
    let catalog = parse_catalog(&content)?;
    let store = open_progress_store(&config)?;

    if let Some(course_id) = &course_filter {
        anyhow::ensure!(
            catalog.course(course_id).is_some(),
            "unknown course '{course_id}'"
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["Course", "Module", "Title", "Progress"]);

    for (course_id, course) in &catalog.courses {
        if course_filter.as_ref().is_some_and(|c| c != course_id) {
            continue;
        }
        for status in module_statuses(course, &store) {
            table.add_row(vec![
                Cell::new(course_id),
                Cell::new(&status.module.module_id),
                Cell::new(&status.module.title),
                Cell::new(progress_label(&status)),
            ]);
        }
    }

    println!("{table}");
    Ok(())
}

fn progress_label(status: &ModuleStatus<'_>) -> String {
    match status.progress {
        None => "not started".to_string(),
        Some(_) if status.is_completed() => "completed".to_string(),
        Some(p) if p.section_count == 0 => format!("page {}", p.current_section_index + 1),
        Some(p) => format!(
            "page {} / {}",
            p.current_section_index + 1,
            p.section_count
        ),
    }
}
