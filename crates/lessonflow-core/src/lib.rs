//! lessonflow-core — Module progression and assessment engine.
//!
//! This crate defines the section data model, the collaborator traits, and the
//! state machines (navigation, answer attempts, exam scoring) that the rest of
//! lessonflow builds on.

pub mod attempt;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod navigator;
pub mod parser;
pub mod progress;
pub mod scorer;
pub mod traits;
