//! Progress persistence on top of a string-keyed store.
//!
//! Layout, per module id:
//!
//! - `currentPage-<moduleId>` → cursor (decimal integer)
//! - `sectionlength-<moduleId>` → section count at last write

use crate::error::ProgressError;
use crate::model::ModuleProgress;
use crate::traits::{KeyValueStore, ProgressStore};

pub fn cursor_key(module_id: &str) -> String {
    format!("currentPage-{module_id}")
}

pub fn section_count_key(module_id: &str) -> String {
    format!("sectionlength-{module_id}")
}

/// [`ProgressStore`] that encodes progress into two keys of a [`KeyValueStore`].
pub struct KeyedProgressStore<S> {
    backend: S,
}

impl<S: KeyValueStore> KeyedProgressStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn read_usize(&self, key: &str) -> Result<Option<usize>, ProgressError> {
        match self.backend.get(key)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ProgressError::Corrupt {
                    key: key.to_string(),
                    value: raw,
                }),
        }
    }
}

impl<S: KeyValueStore> ProgressStore for KeyedProgressStore<S> {
    fn get(&self, module_id: &str) -> Result<Option<ModuleProgress>, ProgressError> {
        let Some(cursor) = self.read_usize(&cursor_key(module_id))? else {
            return Ok(None);
        };
        // The count is written once content has loaded; a cursor without it is
        // still a valid resume point.
        let section_count = self.read_usize(&section_count_key(module_id))?.unwrap_or(0);
        Ok(Some(ModuleProgress::new(cursor, section_count)))
    }

    fn set(&self, module_id: &str, progress: &ModuleProgress) -> Result<(), ProgressError> {
        self.backend.set(
            &cursor_key(module_id),
            &progress.current_section_index.to_string(),
        )?;
        if progress.section_count > 0 {
            self.backend.set(
                &section_count_key(module_id),
                &progress.section_count.to_string(),
            )?;
        }
        Ok(())
    }

    fn clear(&self, module_id: &str) -> Result<(), ProgressError> {
        self.backend.remove(&cursor_key(module_id))?;
        self.backend.remove(&section_count_key(module_id))
    }
}
