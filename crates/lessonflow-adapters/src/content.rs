//! File-backed module content.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use lessonflow_core::error::ContentError;
use lessonflow_core::model::Section;
use lessonflow_core::parser::parse_module_payload;
use lessonflow_core::traits::ContentProvider;

/// Module identifiers shipped with the stock content set, and their files.
pub const DEFAULT_MODULE_FILES: &[(&str, &str)] = &[
    ("PMFIDS_PM", "project_management.json"),
    ("PMFIDS_BCM", "budget_cost_management.json"),
    ("PMFIDS_RISK", "project_risk_management.json"),
    ("ABSTIT_ABS", "aligning_business_strat.json"),
    ("CM_INTRO", "change_management_intro.json"),
    ("CM_PREPARE", "change_management_prepare.json"),
    ("CM_MANAGE", "change_management_manage.json"),
    ("CM_SUSTAIN", "change_management_sustain.json"),
    ("DCO_SEAMLESS", "seamless_digital.json"),
    ("DCO_NEW_APPLICATION", "new_application.json"),
    ("DCO_APPLICATION_APPROVAL", "application_approval.json"),
    ("DATAGOV_MAPPING", "data_gov.json"),
];

/// The stock module-to-file mapping.
pub fn default_module_files() -> BTreeMap<String, String> {
    DEFAULT_MODULE_FILES
        .iter()
        .map(|(id, file)| (id.to_string(), file.to_string()))
        .collect()
}

/// Loads modules from JSON files under a content directory.
///
/// Each module identifier maps to a file name relative to the root. Several
/// modules may share one file; the file's `moduleId` records select which.
#[derive(Debug, Clone)]
pub struct FileContentProvider {
    root: PathBuf,
    mapping: BTreeMap<String, String>,
}

impl FileContentProvider {
    /// Provider over `root` using the stock module mapping.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_mapping(root, default_module_files())
    }

    pub fn with_mapping(root: impl Into<PathBuf>, mapping: BTreeMap<String, String>) -> Self {
        Self {
            root: root.into(),
            mapping,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Known module identifiers, sorted.
    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.mapping.keys().map(String::as_str)
    }

    /// Absolute path of the file holding `module_id`, if the module is mapped.
    pub fn path_for(&self, module_id: &str) -> Option<PathBuf> {
        self.mapping.get(module_id).map(|file| self.root.join(file))
    }
}

#[async_trait]
impl ContentProvider for FileContentProvider {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn load(&self, module_id: &str) -> Result<Vec<Section>, ContentError> {
        let path = self
            .path_for(module_id)
            .ok_or_else(|| ContentError::NotFound(module_id.to_string()))?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ContentError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let sections = parse_module_payload(module_id, &content)?;
        tracing::debug!(sections = sections.len(), path = %path.display(), "loaded module");
        Ok(sections)
    }
}
