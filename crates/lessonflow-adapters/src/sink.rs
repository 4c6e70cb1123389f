//! Local result sinks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use lessonflow_core::error::SubmissionError;
use lessonflow_core::traits::{ExamSubmission, ResultSink};

/// Appends each result as one JSON line to a local file.
#[derive(Debug, Clone)]
pub struct JsonlResultSink {
    path: PathBuf,
}

impl JsonlResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonlResultSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn submit(&self, submission: &ExamSubmission) -> Result<(), SubmissionError> {
        let storage = |e: std::io::Error| {
            SubmissionError::Storage(format!("{}: {e}", self.path.display()))
        };

        let mut line = serde_json::to_string(submission)
            .map_err(|e| SubmissionError::Storage(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(storage)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(storage)?;
        file.write_all(line.as_bytes()).await.map_err(storage)?;
        file.flush().await.map_err(storage)?;

        tracing::info!(
            path = %self.path.display(),
            exam = %submission.exam_id,
            percentage = submission.percentage,
            "exam result recorded"
        );
        Ok(())
    }
}

/// Accepts and drops every result.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

#[async_trait]
impl ResultSink for DiscardSink {
    fn name(&self) -> &str {
        "none"
    }

    async fn submit(&self, submission: &ExamSubmission) -> Result<(), SubmissionError> {
        tracing::debug!(exam = %submission.exam_id, "no result sink configured, discarding");
        Ok(())
    }
}
