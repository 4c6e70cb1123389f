//! Course catalog (`courseList.json`).
//!
//! The catalog is an object keyed by course id; each course lists the modules
//! a learner can open.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::ModuleProgress;
use crate::traits::ProgressStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modules: Vec<ModuleSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSummary {
    #[serde(rename = "moduleId")]
    pub module_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// All courses, ordered by course id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub courses: BTreeMap<String, Course>,
}

impl Catalog {
    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.get(course_id)
    }
}

/// Parse a catalog document.
pub fn parse_catalog(content: &str) -> Result<Catalog> {
    serde_json::from_str(content).context("failed to parse course catalog")
}

/// A module with the learner's stored position in it.
#[derive(Debug, Clone)]
pub struct ModuleStatus<'a> {
    pub module: &'a ModuleSummary,
    pub progress: Option<ModuleProgress>,
}

impl ModuleStatus<'_> {
    pub fn is_completed(&self) -> bool {
        self.progress.is_some_and(|p| p.is_completed())
    }
}

/// Pair each module of `course` with its stored progress.
///
/// Unreadable progress is treated as absent.
pub fn module_statuses<'a>(course: &'a Course, store: &dyn ProgressStore) -> Vec<ModuleStatus<'a>> {
    course
        .modules
        .iter()
        .map(|module| {
            let progress = store.get(&module.module_id).unwrap_or_else(|e| {
                tracing::warn!(module = %module.module_id, "could not read progress: {e}");
                None
            });
            ModuleStatus { module, progress }
        })
        .collect()
}
