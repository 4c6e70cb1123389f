//! The `lessonflow validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use lessonflow_core::parser::{parse_modules, validate_module};

/// Skipped when validating a whole content directory.
const CATALOG_FILE: &str = "courseList.json";

pub fn execute(path: PathBuf) -> Result<()> {
    let files = if path.is_dir() {
        content_files(&path)?
    } else {
        vec![path]
    };
    anyhow::ensure!(!files.is_empty(), "no content files found");

    let mut total_warnings = 0;

    for file in &files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let modules = parse_modules(&content, &file.display().to_string())
            .with_context(|| format!("failed to parse {}", file.display()))?;

        for module in &modules {
            println!(
                "Module: {} ({} sections) in {}",
                module.module_id,
                module.sections.len(),
                file.display()
            );

            let warnings = validate_module(&module.sections);
            for w in &warnings {
                let prefix = w
                    .section
                    .as_ref()
                    .map(|title| format!("  [{title}]"))
                    .unwrap_or_else(|| "  ".to_string());
                println!("{prefix} WARNING: {}", w.message);
            }
            total_warnings += warnings.len();
        }
    }

    if total_warnings == 0 {
        println!("All modules valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn content_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let is_catalog = path.file_name().is_some_and(|name| name == CATALOG_FILE);
        if is_json && !is_catalog {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
