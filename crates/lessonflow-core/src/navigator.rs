//! Section cursor state machine.
//!
//! The cursor ranges over `[0, section_count]`. Indices below the count point
//! at a section; the count itself is the terminal "module completed" state,
//! reachable only through [`SectionNavigator::complete`]. Every cursor change
//! starts a fresh [`AttemptState`] and is written through to the progress
//! store before the call returns.

use std::sync::Arc;

use serde::Serialize;

use crate::attempt::AttemptState;
use crate::model::{ModuleProgress, Section, SectionKind};
use crate::traits::ProgressStore;

/// Single-step navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Back,
}

impl Direction {
    pub fn delta(self) -> isize {
        match self {
            Direction::Next => 1,
            Direction::Back => -1,
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved { from: usize, to: usize },
    Unchanged,
}

impl NavOutcome {
    pub fn moved(self) -> bool {
        matches!(self, NavOutcome::Moved { .. })
    }
}

/// Which actions the presentation layer should offer for the current section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Controls {
    pub back: bool,
    pub next: bool,
    pub finish: bool,
    pub show_answer: bool,
    pub retry: bool,
}

/// Stable ascending sort by `order`; ties keep their authored order.
pub fn sort_sections(sections: &mut [Section]) {
    sections.sort_by(|a, b| a.order.total_cmp(&b.order));
}

/// Cursor over the sections of one loaded module.
pub struct SectionNavigator {
    module_id: String,
    sections: Vec<Section>,
    cursor: usize,
    attempt: AttemptState,
    store: Arc<dyn ProgressStore>,
}

impl SectionNavigator {
    /// Build a navigator for freshly loaded sections, resuming from the
    /// persisted cursor.
    ///
    /// A persisted cursor past the end of the content (an older, longer
    /// version of the module) is clamped to the section count and the
    /// corrected value is written back.
    pub fn resume(
        module_id: impl Into<String>,
        mut sections: Vec<Section>,
        store: Arc<dyn ProgressStore>,
    ) -> Self {
        let module_id = module_id.into();
        sort_sections(&mut sections);
        let count = sections.len();

        let (persisted, read_failed) = match store.get(&module_id) {
            Ok(progress) => (progress, false),
            Err(e) => {
                tracing::warn!(module = %module_id, "could not read progress, starting at 0: {e}");
                (None, true)
            }
        };

        let cursor = match persisted {
            None => 0,
            Some(p) if p.current_section_index > count => {
                tracing::warn!(
                    module = %module_id,
                    stored = p.current_section_index,
                    section_count = count,
                    "stored cursor beyond content, clamping"
                );
                count
            }
            Some(p) => p.current_section_index,
        };

        let navigator = Self {
            module_id,
            sections,
            cursor,
            attempt: AttemptState::new(),
            store,
        };
        // Neither an empty module nor an unreadable record is worth overwriting
        // stored progress with; the first real move writes it.
        if count > 0 && !read_failed {
            navigator.persist();
        }
        navigator
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The visible section, or `None` once the module is completed or empty.
    pub fn current_section(&self) -> Option<&Section> {
        self.sections.get(self.cursor)
    }

    pub fn attempt(&self) -> &AttemptState {
        &self.attempt
    }

    pub fn attempt_mut(&mut self) -> &mut AttemptState {
        &mut self.attempt
    }

    pub fn is_completed(&self) -> bool {
        !self.sections.is_empty() && self.cursor >= self.sections.len()
    }

    pub fn is_last_section(&self) -> bool {
        !self.sections.is_empty() && self.cursor == self.sections.len() - 1
    }

    pub fn progress(&self) -> ModuleProgress {
        ModuleProgress::new(self.cursor, self.sections.len())
    }

    /// Move one section in `direction` if the destination exists.
    pub fn go_to(&mut self, direction: Direction) -> NavOutcome {
        let target = self.cursor.checked_add_signed(direction.delta());
        let Some(to) = target.filter(|&t| t < self.sections.len()) else {
            return NavOutcome::Unchanged;
        };

        let from = self.cursor;
        self.cursor = to;
        self.attempt = AttemptState::new();
        self.persist();
        tracing::debug!(module = %self.module_id, from, to, "section changed");
        NavOutcome::Moved { from, to }
    }

    pub fn next(&mut self) -> NavOutcome {
        self.go_to(Direction::Next)
    }

    pub fn back(&mut self) -> NavOutcome {
        self.go_to(Direction::Back)
    }

    /// Enter the terminal state: cursor equals the section count.
    pub fn complete(&mut self) {
        self.cursor = self.sections.len();
        self.attempt = AttemptState::new();
        self.persist();
        tracing::debug!(module = %self.module_id, "module completed");
    }

    /// Actions available on the current section.
    pub fn controls(&self) -> Controls {
        let Some(section) = self.current_section() else {
            return Controls::default();
        };
        if section.is_exam() {
            return Controls {
                finish: true,
                ..Controls::default()
            };
        }
        let question = section.kind == SectionKind::KnowledgeCheck && section.question.is_some();
        Controls {
            back: self.cursor > 0,
            next: self.cursor + 1 < self.sections.len(),
            finish: false,
            show_answer: question && self.attempt.can_reveal(),
            retry: question && self.attempt.can_retry(),
        }
    }

    /// `"Page 3 / 12"`, or the completed count once finished.
    pub fn page_label(&self) -> String {
        let total = self.sections.len();
        format!("Page {} / {}", (self.cursor + 1).min(total), total)
    }

    /// Fraction of the module traversed, in `[0, 1]`.
    pub fn progress_ratio(&self) -> f64 {
        match self.sections.len() {
            0 => 0.0,
            1 => {
                if self.cursor > 0 {
                    1.0
                } else {
                    0.0
                }
            }
            n => (self.cursor as f64 / (n - 1) as f64).clamp(0.0, 1.0),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.set(&self.module_id, &self.progress()) {
            tracing::warn!(
                module = %self.module_id,
                cursor = self.cursor,
                "failed to persist progress: {e}"
            );
        }
    }
}
