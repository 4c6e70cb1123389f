//! In-memory collaborators for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use lessonflow_core::error::{ContentError, SubmissionError};
use lessonflow_core::model::Section;
use lessonflow_core::traits::{ContentProvider, ExamSubmission, ResultSink};

/// A result sink that records every submission.
///
/// Can be told to fail so callers can exercise their error paths.
pub struct MockResultSink {
    failure: Option<SubmissionError>,
    call_count: AtomicU32,
    received: Mutex<Vec<ExamSubmission>>,
}

impl MockResultSink {
    pub fn new() -> Self {
        Self {
            failure: None,
            call_count: AtomicU32::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// A sink that answers every submission with `error`.
    pub fn failing(error: SubmissionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Submissions accepted so far.
    pub fn received(&self) -> Vec<ExamSubmission> {
        self.received.lock().unwrap().clone()
    }
}

impl Default for MockResultSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultSink for MockResultSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, submission: &ExamSubmission) -> Result<(), SubmissionError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.received.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

/// Content held in memory, keyed by module id.
#[derive(Debug, Default)]
pub struct MemoryContentProvider {
    modules: HashMap<String, Vec<Section>>,
    call_count: AtomicU32,
}

impl MemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module_id: &str, sections: Vec<Section>) -> Self {
        self.modules.insert(module_id.to_string(), sections);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContentProvider for MemoryContentProvider {
    async fn load(&self, module_id: &str) -> Result<Vec<Section>, ContentError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.modules
            .get(module_id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(module_id.to_string()))
    }
}
