//! Collaborator trait definitions.
//!
//! Content loading and result submission are asynchronous; progress storage
//! and identity lookup are synchronous from the engine's point of view. The
//! `lessonflow-adapters` crate provides the concrete implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContentError, ProgressError, SubmissionError};
use crate::model::{ModuleProgress, Section};

// ---------------------------------------------------------------------------
// Content provider
// ---------------------------------------------------------------------------

/// Read-only source of module content.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Load the normalized sections of a module, in authored order.
    ///
    /// The engine sorts the result by `order`; providers need not.
    async fn load(&self, module_id: &str) -> Result<Vec<Section>, ContentError>;
}

// ---------------------------------------------------------------------------
// Progress storage
// ---------------------------------------------------------------------------

/// String-keyed durable storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ProgressError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ProgressError>;
    fn remove(&self, key: &str) -> Result<(), ProgressError>;
}

/// Durable per-module cursor storage.
pub trait ProgressStore: Send + Sync {
    fn get(&self, module_id: &str) -> Result<Option<ModuleProgress>, ProgressError>;
    fn set(&self, module_id: &str, progress: &ModuleProgress) -> Result<(), ProgressError>;
    fn clear(&self, module_id: &str) -> Result<(), ProgressError>;
}

// ---------------------------------------------------------------------------
// Result sink and identity
// ---------------------------------------------------------------------------

/// One exam result, as handed to a [`ResultSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSubmission {
    /// Unique per finish action so the sink can deduplicate.
    pub submission_id: Uuid,
    pub module_id: String,
    pub exam_id: String,
    pub exam_title: String,
    pub user_id: String,
    pub total_questions: u32,
    /// Score percentage rounded to two decimals.
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

/// Durable destination for exam results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Human-readable sink name (e.g. "http").
    fn name(&self) -> &str;

    /// Store one exam result. Idempotency is the sink's responsibility.
    async fn submit(&self, submission: &ExamSubmission) -> Result<(), SubmissionError>;
}

/// Supplies the identifier of the signed-in learner.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}
