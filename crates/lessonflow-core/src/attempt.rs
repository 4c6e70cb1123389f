//! Answer attempt state and the bounded retry policy.
//!
//! An [`AttemptState`] lives for exactly one visit to a question: it is
//! created empty whenever the cursor moves and dropped on the next move.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::AttemptError;
use crate::evaluator::{evaluate, Evaluation};
use crate::model::{FieldType, KnowledgeCheck};

/// Retries allowed on one attempt before it is force-reset.
pub const MAX_RETRIES: u32 = 3;

/// Grading feedback for the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    /// Not graded yet.
    #[default]
    Pending,
    Correct,
    Incorrect,
}

/// Outcome of a retry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetryDecision {
    pub allowed: bool,
}

/// Ephemeral selection, feedback and retry state for one question visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttemptState {
    selected: BTreeSet<String>,
    retry_count: u32,
    revealed: bool,
    feedback: Feedback,
    exhausted: bool,
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    /// Set once a retry has been refused; no further retry is offered.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether "Show Answer" should be offered.
    pub fn can_reveal(&self) -> bool {
        !self.revealed && !self.selected.is_empty()
    }

    /// Whether "Retry" should be offered.
    pub fn can_retry(&self) -> bool {
        self.feedback == Feedback::Incorrect && !self.exhausted && self.retry_count < MAX_RETRIES
    }

    /// Mark `key` as selected. Single-select questions replace the previous choice.
    pub fn select(&mut self, question: &KnowledgeCheck, key: &str) -> Result<(), AttemptError> {
        self.ensure_editable(question, key)?;
        if question.field_type == FieldType::SingleSelect {
            self.selected.clear();
        }
        self.selected.insert(key.to_string());
        self.feedback = Feedback::Pending;
        Ok(())
    }

    /// Remove `key` from the selection.
    pub fn deselect(&mut self, question: &KnowledgeCheck, key: &str) -> Result<(), AttemptError> {
        self.ensure_editable(question, key)?;
        self.selected.remove(key);
        self.feedback = Feedback::Pending;
        Ok(())
    }

    /// Flip `key`: checkbox semantics for multi-select, radio semantics for single-select.
    pub fn toggle(&mut self, question: &KnowledgeCheck, key: &str) -> Result<(), AttemptError> {
        if self.selected.contains(key) && question.field_type == FieldType::MultiSelect {
            self.deselect(question, key)
        } else {
            self.select(question, key)
        }
    }

    fn ensure_editable(&self, question: &KnowledgeCheck, key: &str) -> Result<(), AttemptError> {
        if self.revealed {
            return Err(AttemptError::InputFrozen);
        }
        if !question.has_option(key) {
            return Err(AttemptError::UnknownOption(key.to_string()));
        }
        Ok(())
    }

    /// Grade the current selection and freeze input.
    ///
    /// A malformed answer key is logged and graded as incorrect.
    pub fn reveal(&mut self, question: &KnowledgeCheck) -> Result<Evaluation, AttemptError> {
        if self.revealed {
            return Err(AttemptError::InputFrozen);
        }
        if self.selected.is_empty() {
            return Err(AttemptError::NoSelection);
        }

        let evaluation = match evaluate(&self.selected, &question.answer_key) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::error!(
                    answer_key = %question.answer_key,
                    "malformed answer key, grading as incorrect: {e}"
                );
                Evaluation { correct: false }
            }
        };

        self.revealed = true;
        if evaluation.correct {
            self.feedback = Feedback::Correct;
            self.retry_count = 0;
        } else {
            self.feedback = Feedback::Incorrect;
        }
        Ok(evaluation)
    }

    /// Clear the graded selection so the learner can try again.
    ///
    /// Allowed while fewer than [`MAX_RETRIES`] retries were used; past that
    /// the attempt is reset to zero retries and marked exhausted.
    pub fn request_retry(&mut self) -> Result<RetryDecision, AttemptError> {
        if self.feedback != Feedback::Incorrect {
            return Err(AttemptError::RetryWithoutIncorrect);
        }

        self.selected.clear();
        self.feedback = Feedback::Pending;
        self.revealed = false;

        if !self.exhausted && self.retry_count < MAX_RETRIES {
            self.retry_count += 1;
            Ok(RetryDecision { allowed: true })
        } else {
            self.retry_count = 0;
            self.exhausted = true;
            Ok(RetryDecision { allowed: false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceOption;

    fn question(field_type: FieldType, answer_key: &str) -> KnowledgeCheck {
        KnowledgeCheck {
            options: ["a", "b", "c", "d"]
                .iter()
                .map(|k| ChoiceOption {
                    key: k.to_string(),
                    text: format!("Option {k}"),
                })
                .collect(),
            field_type,
            answer_key: answer_key.to_string(),
        }
    }

    #[test]
    fn single_select_replaces_choice() {
        let q = question(FieldType::SingleSelect, "b");
        let mut attempt = AttemptState::new();
        attempt.select(&q, "a").unwrap();
        attempt.select(&q, "b").unwrap();
        assert_eq!(attempt.selected().len(), 1);
        assert!(attempt.selected().contains("b"));
    }

    #[test]
    fn multi_select_toggle() {
        let q = question(FieldType::MultiSelect, "a,b");
        let mut attempt = AttemptState::new();
        attempt.toggle(&q, "a").unwrap();
        attempt.toggle(&q, "b").unwrap();
        attempt.toggle(&q, "a").unwrap();
        assert_eq!(attempt.selected().iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn unknown_option_rejected() {
        let q = question(FieldType::MultiSelect, "a");
        let mut attempt = AttemptState::new();
        assert_eq!(
            attempt.select(&q, "z"),
            Err(AttemptError::UnknownOption("z".into()))
        );
        assert!(attempt.selected().is_empty());
    }

    #[test]
    fn reveal_without_selection_is_refused() {
        let q = question(FieldType::MultiSelect, "a");
        let mut attempt = AttemptState::new();
        assert_eq!(attempt.reveal(&q), Err(AttemptError::NoSelection));
        assert_eq!(attempt, AttemptState::new());
    }

    #[test]
    fn reveal_freezes_input() {
        let q = question(FieldType::MultiSelect, "a");
        let mut attempt = AttemptState::new();
        attempt.select(&q, "b").unwrap();
        let eval = attempt.reveal(&q).unwrap();
        assert!(!eval.correct);
        assert!(attempt.is_revealed());
        assert_eq!(attempt.feedback(), Feedback::Incorrect);
        assert_eq!(attempt.select(&q, "a"), Err(AttemptError::InputFrozen));
        assert_eq!(attempt.reveal(&q), Err(AttemptError::InputFrozen));
    }

    #[test]
    fn malformed_key_grades_incorrect() {
        let q = question(FieldType::MultiSelect, "a, a");
        let mut attempt = AttemptState::new();
        attempt.select(&q, "a").unwrap();
        assert!(!attempt.reveal(&q).unwrap().correct);
        assert_eq!(attempt.feedback(), Feedback::Incorrect);
    }

    #[test]
    fn retry_sequence_then_refusal() {
        let q = question(FieldType::MultiSelect, "a");
        let mut attempt = AttemptState::new();
        let mut counts = Vec::new();
        for _ in 0..3 {
            attempt.select(&q, "b").unwrap();
            attempt.reveal(&q).unwrap();
            assert!(attempt.can_retry());
            let decision = attempt.request_retry().unwrap();
            assert!(decision.allowed);
            assert!(attempt.selected().is_empty());
            assert_eq!(attempt.feedback(), Feedback::Pending);
            counts.push(attempt.retry_count());
        }
        assert_eq!(counts, vec![1, 2, 3]);

        attempt.select(&q, "b").unwrap();
        attempt.reveal(&q).unwrap();
        assert!(!attempt.can_retry());
        let decision = attempt.request_retry().unwrap();
        assert!(!decision.allowed);
        assert_eq!(attempt.retry_count(), 0);
        assert!(attempt.is_exhausted());
        assert!(attempt.selected().is_empty());

        // Input is editable again, but retry is never offered for this attempt.
        attempt.select(&q, "c").unwrap();
        assert!(attempt.can_reveal());
        attempt.reveal(&q).unwrap();
        assert!(!attempt.can_retry());
    }

    #[test]
    fn retry_after_correct_is_a_contract_violation() {
        let q = question(FieldType::SingleSelect, "a");
        let mut attempt = AttemptState::new();
        attempt.select(&q, "a").unwrap();
        attempt.reveal(&q).unwrap();
        assert_eq!(
            attempt.request_retry(),
            Err(AttemptError::RetryWithoutIncorrect)
        );
        assert!(attempt.is_revealed());
        assert_eq!(attempt.feedback(), Feedback::Correct);
    }

    #[test]
    fn correct_answer_clears_retry_count() {
        let q = question(FieldType::MultiSelect, "a, c");
        let mut attempt = AttemptState::new();
        for _ in 0..2 {
            attempt.select(&q, "a").unwrap();
            attempt.reveal(&q).unwrap();
            attempt.request_retry().unwrap();
        }
        assert_eq!(attempt.retry_count(), 2);
        attempt.select(&q, "a").unwrap();
        attempt.select(&q, "c").unwrap();
        assert!(attempt.reveal(&q).unwrap().correct);
        assert_eq!(attempt.retry_count(), 0);
        assert_eq!(attempt.feedback(), Feedback::Correct);
    }
}
