//! Answer evaluation.
//!
//! A selection is correct when it is exactly the canonical key set: nothing
//! missing, nothing extra.

use std::collections::BTreeSet;

use crate::error::AnswerKeyError;

/// Result of grading one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub correct: bool,
}

/// Parse a canonical answer key (`"a, b"`) into its key set.
///
/// Fails on an empty key or on a key listed twice after trimming.
pub fn parse_answer_key(canonical: &str) -> Result<BTreeSet<String>, AnswerKeyError> {
    let mut keys = BTreeSet::new();
    for token in canonical.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }
        if !keys.insert(token.to_string()) {
            return Err(AnswerKeyError::DuplicateKey(token.to_string()));
        }
    }
    if keys.is_empty() {
        return Err(AnswerKeyError::Empty);
    }
    Ok(keys)
}

/// Grade `selected` against the canonical answer key.
pub fn evaluate(
    selected: &BTreeSet<String>,
    canonical: &str,
) -> Result<Evaluation, AnswerKeyError> {
    let expected = parse_answer_key(canonical)?;
    let correct = selected.len() == expected.len()
        && selected.iter().all(|key| expected.contains(key))
        && expected.iter().all(|key| selected.contains(key));
    Ok(Evaluation { correct })
}
