//! lessonflow-adapters — Concrete collaborators for the progression engine.
//!
//! File-backed content, key-value progress storage, exam result sinks
//! (HTTP, JSON lines), a static identity, test doubles, and the TOML
//! configuration that wires them together.

pub mod config;
pub mod content;
pub mod http;
pub mod identity;
pub mod kv;
pub mod mock;
pub mod sink;

pub use config::{
    create_content_provider, create_identity, create_sink, load_config, load_config_from,
    open_progress_store, LessonflowConfig, SinkConfig,
};
pub use content::FileContentProvider;
pub use http::HttpResultSink;
pub use identity::StaticIdentity;
pub use kv::{JsonFileStore, MemoryStore};
pub use sink::{DiscardSink, JsonlResultSink};
