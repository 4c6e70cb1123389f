//! Progression engine orchestrator.
//!
//! Owns the module that is currently open and routes learner actions (select,
//! reveal, retry, navigate, finish) to the navigator, the attempt state and
//! the exam scorer. Collaborators are injected; nothing is read from ambient
//! process state.
//!
//! The two asynchronous operations are split into a synchronous part that
//! mutates engine state and an awaited part that does not:
//!
//! - content loads are issued with [`ProgressionEngine::begin_load`] and
//!   applied with [`ProgressionEngine::complete_load`]; a result whose ticket
//!   is no longer current is discarded.
//! - [`ProgressionEngine::finish_section`] scores, persists and advances
//!   immediately and hands back the submission; sending it never touches the
//!   cursor, so learner actions may interleave with the in-flight request.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::attempt::{AttemptState, RetryDecision};
use crate::error::{AttemptError, ContentError, SubmissionError};
use crate::evaluator::Evaluation;
use crate::model::{KnowledgeCheck, Section};
use crate::navigator::{Controls, Direction, NavOutcome, SectionNavigator};
use crate::scorer::{score_exam, ExamScore};
use crate::traits::{
    ContentProvider, ExamSubmission, IdentityProvider, ProgressStore, ResultSink,
};

/// Receives engine signals the presentation layer reacts to.
pub trait ProgressionObserver: Send + Sync {
    /// The cursor moved; animate the transition and scroll to the top.
    fn on_section_changed(&self, module_id: &str, from: usize, to: usize);
    fn on_module_completed(&self, module_id: &str);
    fn on_content_unavailable(&self, module_id: &str, error: &ContentError);
    fn on_submission_failed(&self, module_id: &str, error: &SubmissionError);
}

/// No-op observer.
pub struct NoopObserver;

impl ProgressionObserver for NoopObserver {
    fn on_section_changed(&self, _: &str, _: usize, _: usize) {}
    fn on_module_completed(&self, _: &str) {}
    fn on_content_unavailable(&self, _: &str, _: &ContentError) {}
    fn on_submission_failed(&self, _: &str, _: &SubmissionError) {}
}

/// Handle for one issued content load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    module_id: String,
}

impl LoadTicket {
    pub fn module_id(&self) -> &str {
        &self.module_id
    }
}

/// What happened to a completed content load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Sections are in place; the cursor resumed at `cursor`.
    Ready { cursor: usize, section_count: usize },
    /// The load failed; the module shows the "no content available" view.
    Unavailable(ContentError),
    /// The module changed while the load was in flight; the result was dropped.
    Discarded,
}

enum ModuleState {
    Closed,
    Loading(LoadTicket),
    Ready(SectionNavigator),
    Unavailable { module_id: String },
}

/// What the presentation layer should render.
#[derive(Debug)]
pub enum View<'a> {
    /// No module open; show the module list.
    ModuleList,
    Loading { module_id: &'a str },
    Section {
        section: &'a Section,
        attempt: &'a AttemptState,
        controls: Controls,
        page_label: String,
        progress_ratio: f64,
    },
    Completed { module_id: &'a str },
    /// Terminal view with a single "back to modules" action.
    NoContent { module_id: &'a str },
}

/// Result of a finish action, before the submission is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishOutcome {
    pub score: ExamScore,
    /// The exam section was the last one and the module is now completed.
    pub completed: bool,
    pub navigation: NavOutcome,
    /// The result to send, or why it cannot be sent.
    pub submission: Result<ExamSubmission, SubmissionError>,
}

/// Result of [`ProgressionEngine::finish_module`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinishReport {
    pub score: ExamScore,
    pub completed: bool,
    pub navigation: NavOutcome,
    pub submission: Option<ExamSubmission>,
    /// Submission outcome. Failures never undo the navigation above.
    pub result: Result<(), SubmissionError>,
}

/// The central progression engine.
pub struct ProgressionEngine {
    content: Arc<dyn ContentProvider>,
    store: Arc<dyn ProgressStore>,
    sink: Arc<dyn ResultSink>,
    identity: Arc<dyn IdentityProvider>,
    observer: Arc<dyn ProgressionObserver>,
    state: ModuleState,
    generation: u64,
}

impl ProgressionEngine {
    pub fn new(
        content: Arc<dyn ContentProvider>,
        store: Arc<dyn ProgressStore>,
        sink: Arc<dyn ResultSink>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            content,
            store,
            sink,
            identity,
            observer: Arc::new(NoopObserver),
            state: ModuleState::Closed,
            generation: 0,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressionObserver>) -> Self {
        self.observer = observer;
        self
    }

    // -----------------------------------------------------------------------
    // Module lifecycle
    // -----------------------------------------------------------------------

    /// Load and open a module, resuming at the stored cursor.
    pub async fn open_module(&mut self, module_id: &str) -> LoadOutcome {
        let ticket = self.begin_load(module_id);
        let content = Arc::clone(&self.content);
        let result = content.load(module_id).await;
        self.complete_load(ticket, result)
    }

    /// Start loading `module_id`. Any load still in flight becomes stale.
    pub fn begin_load(&mut self, module_id: &str) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket {
            generation: self.generation,
            module_id: module_id.to_string(),
        };
        tracing::debug!(module = module_id, generation = self.generation, "loading module");
        self.state = ModuleState::Loading(ticket.clone());
        ticket
    }

    /// Apply the result of a load, unless the engine has moved on since it was issued.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Section>, ContentError>,
    ) -> LoadOutcome {
        let current = matches!(&self.state, ModuleState::Loading(t) if *t == ticket);
        if !current {
            tracing::debug!(module = %ticket.module_id, "discarding stale content load");
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(sections) => {
                let navigator =
                    SectionNavigator::resume(&ticket.module_id, sections, Arc::clone(&self.store));
                let outcome = LoadOutcome::Ready {
                    cursor: navigator.cursor(),
                    section_count: navigator.section_count(),
                };
                tracing::info!(
                    module = %ticket.module_id,
                    sections = navigator.section_count(),
                    cursor = navigator.cursor(),
                    "module opened"
                );
                self.state = ModuleState::Ready(navigator);
                outcome
            }
            Err(e) => {
                tracing::warn!(module = %ticket.module_id, "content unavailable: {e}");
                self.observer.on_content_unavailable(&ticket.module_id, &e);
                self.state = ModuleState::Unavailable {
                    module_id: ticket.module_id,
                };
                LoadOutcome::Unavailable(e)
            }
        }
    }

    /// Return to the module list. A load in flight is discarded on arrival.
    pub fn close_module(&mut self) {
        self.generation += 1;
        self.state = ModuleState::Closed;
    }

    pub fn module_id(&self) -> Option<&str> {
        match &self.state {
            ModuleState::Closed => None,
            ModuleState::Loading(ticket) => Some(&ticket.module_id),
            ModuleState::Ready(nav) => Some(nav.module_id()),
            ModuleState::Unavailable { module_id } => Some(module_id),
        }
    }

    pub fn navigator(&self) -> Option<&SectionNavigator> {
        match &self.state {
            ModuleState::Ready(nav) => Some(nav),
            _ => None,
        }
    }

    pub fn view(&self) -> View<'_> {
        match &self.state {
            ModuleState::Closed => View::ModuleList,
            ModuleState::Loading(ticket) => View::Loading {
                module_id: &ticket.module_id,
            },
            ModuleState::Unavailable { module_id } => View::NoContent { module_id },
            ModuleState::Ready(nav) => match nav.current_section() {
                Some(section) => View::Section {
                    section,
                    attempt: nav.attempt(),
                    controls: nav.controls(),
                    page_label: nav.page_label(),
                    progress_ratio: nav.progress_ratio(),
                },
                None if nav.is_completed() => View::Completed {
                    module_id: nav.module_id(),
                },
                None => View::NoContent {
                    module_id: nav.module_id(),
                },
            },
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn next(&mut self) -> NavOutcome {
        self.navigate(Direction::Next)
    }

    pub fn back(&mut self) -> NavOutcome {
        self.navigate(Direction::Back)
    }

    /// Move one section. Exam sections leave only through [`Self::finish_section`].
    pub fn navigate(&mut self, direction: Direction) -> NavOutcome {
        let ModuleState::Ready(nav) = &mut self.state else {
            return NavOutcome::Unchanged;
        };
        if nav.current_section().is_some_and(Section::is_exam) {
            tracing::debug!(module = %nav.module_id(), "navigation suppressed on exam section");
            return NavOutcome::Unchanged;
        }
        let outcome = nav.go_to(direction);
        if let NavOutcome::Moved { from, to } = outcome {
            self.observer.on_section_changed(nav.module_id(), from, to);
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Knowledge checks
    // -----------------------------------------------------------------------

    fn question_parts(&mut self) -> Result<(KnowledgeCheck, &mut AttemptState), AttemptError> {
        let ModuleState::Ready(nav) = &mut self.state else {
            return Err(AttemptError::NotGradable);
        };
        let question = nav
            .current_section()
            .and_then(|s| s.question.clone())
            .ok_or(AttemptError::NotGradable)?;
        Ok((question, nav.attempt_mut()))
    }

    pub fn select(&mut self, key: &str) -> Result<(), AttemptError> {
        let (question, attempt) = self.question_parts()?;
        attempt.select(&question, key)
    }

    pub fn deselect(&mut self, key: &str) -> Result<(), AttemptError> {
        let (question, attempt) = self.question_parts()?;
        attempt.deselect(&question, key)
    }

    pub fn toggle(&mut self, key: &str) -> Result<(), AttemptError> {
        let (question, attempt) = self.question_parts()?;
        attempt.toggle(&question, key)
    }

    /// Grade the current selection ("Show Answer").
    pub fn reveal(&mut self) -> Result<Evaluation, AttemptError> {
        let (question, attempt) = self.question_parts()?;
        attempt.reveal(&question)
    }

    /// Clear an incorrect answer for another try.
    pub fn retry(&mut self) -> Result<RetryDecision, AttemptError> {
        let (_, attempt) = self.question_parts()?;
        attempt.request_retry()
    }

    // -----------------------------------------------------------------------
    // Exams
    // -----------------------------------------------------------------------

    /// Score the current exam section from the tallied `score`, mark the
    /// module completed when it is the last section, and advance.
    ///
    /// Returns `None` (and changes nothing) when the current section is not
    /// an exam boundary. An exam section without an exam still completes and
    /// advances, but yields [`SubmissionError::NoExam`] instead of a
    /// submission. The returned submission still has to be sent; see
    /// [`Self::submit`].
    pub fn finish_section(&mut self, score: u32) -> Option<FinishOutcome> {
        let ModuleState::Ready(nav) = &mut self.state else {
            return None;
        };
        let Some(exam_score) = nav.current_section().and_then(|s| score_exam(s, score)) else {
            tracing::debug!(module = %nav.module_id(), "finish requested outside an exam section");
            return None;
        };

        let module_id = nav.module_id().to_string();
        let completed = nav.is_last_section();
        if completed {
            nav.complete();
            self.observer.on_module_completed(&module_id);
        }

        let submission = match (&exam_score.exam_id, self.identity.current_user()) {
            (None, _) => {
                tracing::warn!(module = %module_id, "exam section has no exam, skipping submission");
                Err(SubmissionError::NoExam)
            }
            (Some(exam_id), Some(user_id)) => Ok(ExamSubmission {
                submission_id: Uuid::new_v4(),
                module_id: module_id.clone(),
                exam_id: exam_id.clone(),
                exam_title: exam_score.exam_title.clone().unwrap_or_default(),
                user_id,
                total_questions: exam_score.total_questions,
                percentage: exam_score.percentage,
                submitted_at: Utc::now(),
            }),
            (Some(_), None) => {
                tracing::error!(module = %module_id, "no current user, skipping exam submission");
                Err(SubmissionError::MissingIdentity)
            }
        };

        let navigation = nav.go_to(Direction::Next);
        if let NavOutcome::Moved { from, to } = navigation {
            self.observer.on_section_changed(&module_id, from, to);
        }

        tracing::info!(
            module = %module_id,
            exam = exam_score.exam_id.as_deref().unwrap_or("-"),
            percentage = exam_score.percentage,
            completed,
            "exam section finished"
        );

        Some(FinishOutcome {
            score: exam_score,
            completed,
            navigation,
            submission,
        })
    }

    /// Send one exam result to the sink. Failures are reported, never retried here.
    pub async fn submit(&self, submission: &ExamSubmission) -> Result<(), SubmissionError> {
        let sink = Arc::clone(&self.sink);
        let result = sink.submit(submission).await;
        if let Err(e) = &result {
            tracing::warn!(
                sink = sink.name(),
                exam = %submission.exam_id,
                "failed to submit exam result: {e}"
            );
            self.observer.on_submission_failed(&submission.module_id, e);
        }
        result
    }

    /// Finish the current exam section and submit its result.
    ///
    /// Navigation has already happened when the submission is sent, so a
    /// failed submission never holds the learner back.
    pub async fn finish_module(&mut self, score: u32) -> Option<FinishReport> {
        let outcome = self.finish_section(score)?;
        let (submission, result) = match outcome.submission {
            Ok(submission) => {
                let result = self.submit(&submission).await;
                (Some(submission), result)
            }
            Err(e) => {
                if let Some(module_id) = self.module_id() {
                    self.observer.on_submission_failed(module_id, &e);
                }
                (None, Err(e))
            }
        };
        Some(FinishReport {
            score: outcome.score,
            completed: outcome.completed,
            navigation: outcome.navigation,
            submission,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::Feedback;
    use crate::model::{Exam, ExamQuestion, ModuleProgress, SectionKind, POST_EXAM_TITLE};
    use crate::navigator::tests::{knowledge_check, RecordingStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticContent(HashMap<String, Vec<Section>>);

    #[async_trait]
    impl ContentProvider for StaticContent {
        async fn load(&self, module_id: &str) -> Result<Vec<Section>, ContentError> {
            self.0
                .get(module_id)
                .cloned()
                .ok_or_else(|| ContentError::NotFound(module_id.to_string()))
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        fail: bool,
        received: Mutex<Vec<ExamSubmission>>,
    }

    #[async_trait]
    impl ResultSink for CollectingSink {
        fn name(&self) -> &str {
            "collecting"
        }

        async fn submit(&self, submission: &ExamSubmission) -> Result<(), SubmissionError> {
            if self.fail {
                return Err(SubmissionError::Network("connection reset".into()));
            }
            self.received.lock().unwrap().push(submission.clone());
            Ok(())
        }
    }

    struct User(Option<&'static str>);

    impl IdentityProvider for User {
        fn current_user(&self) -> Option<String> {
            self.0.map(String::from)
        }
    }

    #[derive(Default)]
    struct Signals(Mutex<Vec<String>>);

    impl ProgressionObserver for Signals {
        fn on_section_changed(&self, module_id: &str, from: usize, to: usize) {
            self.0.lock().unwrap().push(format!("{module_id}:{from}->{to}"));
        }
        fn on_module_completed(&self, module_id: &str) {
            self.0.lock().unwrap().push(format!("{module_id}:completed"));
        }
        fn on_content_unavailable(&self, module_id: &str, _: &ContentError) {
            self.0.lock().unwrap().push(format!("{module_id}:unavailable"));
        }
        fn on_submission_failed(&self, module_id: &str, _: &SubmissionError) {
            self.0.lock().unwrap().push(format!("{module_id}:submission_failed"));
        }
    }

    fn post_exam(order: f64, questions: usize) -> Section {
        let mut section = Section::content(order, POST_EXAM_TITLE);
        section.kind = SectionKind::PostExam;
        section.exams = vec![Exam {
            exam_id: "exam-1".into(),
            title: "Final".into(),
            questions: vec![
                ExamQuestion {
                    id: None,
                    prompt: None
                };
                questions
            ],
        }];
        section
    }

    fn module() -> Vec<Section> {
        vec![
            Section::content(1.0, "Intro"),
            knowledge_check(2.0, "a, b"),
            post_exam(3.0, 10),
        ]
    }

    struct Harness {
        engine: ProgressionEngine,
        store: Arc<RecordingStore>,
        sink: Arc<CollectingSink>,
        signals: Arc<Signals>,
    }

    fn harness(sink: CollectingSink, user: Option<&'static str>) -> Harness {
        let mut modules = HashMap::new();
        modules.insert("m".to_string(), module());
        modules.insert(
            "plain".to_string(),
            vec![
                Section::content(1.0, "A"),
                knowledge_check(2.0, "a"),
                Section::content(3.0, "C"),
            ],
        );
        let store = Arc::new(RecordingStore::default());
        let sink = Arc::new(sink);
        let signals = Arc::new(Signals::default());
        let engine = ProgressionEngine::new(
            Arc::new(StaticContent(modules)),
            store.clone(),
            sink.clone(),
            Arc::new(User(user)),
        )
        .with_observer(signals.clone());
        Harness {
            engine,
            store,
            sink,
            signals,
        }
    }

    #[tokio::test]
    async fn opens_module_at_start() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let outcome = h.engine.open_module("m").await;
        assert_eq!(
            outcome,
            LoadOutcome::Ready {
                cursor: 0,
                section_count: 3
            }
        );
        assert!(matches!(h.engine.view(), View::Section { section, .. } if section.title == "Intro"));
    }

    #[tokio::test]
    async fn missing_module_shows_no_content() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let outcome = h.engine.open_module("ghost").await;
        assert_eq!(
            outcome,
            LoadOutcome::Unavailable(ContentError::NotFound("ghost".into()))
        );
        assert!(matches!(
            h.engine.view(),
            View::NoContent { module_id: "ghost" }
        ));
        assert_eq!(h.engine.next(), NavOutcome::Unchanged);
        assert_eq!(h.signals.0.lock().unwrap().clone(), vec!["ghost:unavailable"]);
        h.engine.close_module();
        assert!(matches!(h.engine.view(), View::ModuleList));
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let first = h.engine.begin_load("m");
        let second = h.engine.begin_load("plain");

        assert_eq!(
            h.engine.complete_load(first, Ok(module())),
            LoadOutcome::Discarded
        );
        assert!(matches!(
            h.engine.view(),
            View::Loading { module_id: "plain" }
        ));

        let outcome = h.engine.complete_load(
            second,
            Ok(vec![Section::content(1.0, "A"), Section::content(2.0, "B")]),
        );
        assert_eq!(
            outcome,
            LoadOutcome::Ready {
                cursor: 0,
                section_count: 2
            }
        );
        assert_eq!(h.engine.module_id(), Some("plain"));
        // The discarded module never touched the store.
        assert!(h.store.writes().iter().all(|(module, _)| module == "plain"));
    }

    #[test]
    fn load_after_close_is_discarded() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let ticket = h.engine.begin_load("m");
        h.engine.close_module();
        assert_eq!(
            h.engine.complete_load(ticket, Ok(module())),
            LoadOutcome::Discarded
        );
        assert!(matches!(h.engine.view(), View::ModuleList));
    }

    #[tokio::test]
    async fn knowledge_check_scenario() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        h.engine.open_module("plain").await;
        assert!(h.engine.next().moved());

        for _ in 0..2 {
            h.engine.select("b").unwrap();
            assert!(!h.engine.reveal().unwrap().correct);
            assert!(h.engine.retry().unwrap().allowed);
        }
        h.engine.select("a").unwrap();
        assert!(h.engine.reveal().unwrap().correct);

        let attempt = h.engine.navigator().unwrap().attempt().clone();
        assert_eq!(attempt.retry_count(), 0);
        assert_eq!(attempt.feedback(), Feedback::Correct);

        assert_eq!(h.engine.next(), NavOutcome::Moved { from: 1, to: 2 });
        let attempt = h.engine.navigator().unwrap().attempt();
        assert!(attempt.selected().is_empty());
        assert_eq!(attempt.feedback(), Feedback::Pending);
        assert_eq!(attempt.retry_count(), 0);
        assert!(!attempt.is_revealed());
        assert_eq!(
            h.signals.0.lock().unwrap().clone(),
            vec!["plain:0->1", "plain:1->2"]
        );
    }

    #[tokio::test]
    async fn question_actions_outside_questions_are_refused() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        assert_eq!(h.engine.select("a"), Err(AttemptError::NotGradable));
        h.engine.open_module("m").await;
        assert_eq!(h.engine.reveal(), Err(AttemptError::NotGradable));
        h.engine.next();
        assert_eq!(h.engine.reveal(), Err(AttemptError::NoSelection));
    }

    #[tokio::test]
    async fn exam_section_suppresses_navigation() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        h.engine.open_module("m").await;
        h.engine.next();
        h.engine.next();
        assert_eq!(h.engine.navigator().unwrap().cursor(), 2);
        assert_eq!(h.engine.back(), NavOutcome::Unchanged);
        assert!(matches!(
            h.engine.view(),
            View::Section { controls, .. } if controls.finish && !controls.back && !controls.next
        ));
    }

    #[tokio::test]
    async fn finishing_last_exam_completes_and_submits() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        h.engine.open_module("m").await;
        h.engine.next();
        h.engine.next();

        let report = h.engine.finish_module(7).await.unwrap();
        assert!(report.completed);
        assert_eq!(report.score.percentage, 70.0);
        assert_eq!(report.score.total_questions, 10);
        assert_eq!(report.navigation, NavOutcome::Unchanged);
        assert_eq!(report.result, Ok(()));

        let received = h.sink.received.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].user_id, "u1");
        assert_eq!(received[0].exam_id, "exam-1");
        assert_eq!(received[0].percentage, 70.0);

        assert!(matches!(h.engine.view(), View::Completed { module_id: "m" }));
        assert_eq!(h.store.get("m").unwrap(), Some(ModuleProgress::new(3, 3)));
        assert!(h
            .signals
            .0
            .lock()
            .unwrap()
            .contains(&"m:completed".to_string()));
    }

    #[tokio::test]
    async fn pre_exam_finish_advances_to_next_section() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let ticket = h.engine.begin_load("pre");
        let mut pre = post_exam(0.0, 4);
        pre.kind = SectionKind::PreExam;
        h.engine
            .complete_load(ticket, Ok(vec![pre, Section::content(1.0, "Lesson")]));

        let report = h.engine.finish_module(2).await.unwrap();
        assert!(!report.completed);
        assert_eq!(report.score.percentage, 50.0);
        assert_eq!(report.navigation, NavOutcome::Moved { from: 0, to: 1 });
        assert_eq!(h.store.get("pre").unwrap(), Some(ModuleProgress::new(1, 2)));
    }

    fn empty_exam(order: f64, kind: SectionKind) -> Section {
        let mut section = post_exam(order, 0);
        section.kind = kind;
        section.exams.clear();
        section
    }

    #[tokio::test]
    async fn exam_section_without_exams_still_advances() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let ticket = h.engine.begin_load("bare");
        h.engine.complete_load(
            ticket,
            Ok(vec![
                empty_exam(0.0, SectionKind::PreExam),
                Section::content(1.0, "Lesson"),
            ]),
        );
        assert!(matches!(
            h.engine.view(),
            View::Section { controls, .. } if controls.finish
        ));

        let report = h.engine.finish_module(0).await.unwrap();
        assert!(!report.completed);
        assert_eq!(report.score.total_questions, 0);
        assert_eq!(report.score.percentage, 0.0);
        assert_eq!(report.score.exam_id, None);
        assert_eq!(report.navigation, NavOutcome::Moved { from: 0, to: 1 });
        assert_eq!(report.result, Err(SubmissionError::NoExam));
        assert!(report.submission.is_none());
        assert_eq!(h.engine.navigator().unwrap().cursor(), 1);
        assert!(h.sink.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn last_exam_section_without_exams_completes() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let ticket = h.engine.begin_load("bare");
        h.engine.complete_load(
            ticket,
            Ok(vec![
                Section::content(1.0, "Lesson"),
                empty_exam(2.0, SectionKind::PostExam),
            ]),
        );
        h.engine.next();

        let report = h.engine.finish_module(0).await.unwrap();
        assert!(report.completed);
        assert_eq!(report.result, Err(SubmissionError::NoExam));
        assert!(matches!(h.engine.view(), View::Completed { module_id: "bare" }));
        assert_eq!(h.store.get("bare").unwrap(), Some(ModuleProgress::new(2, 2)));
        assert!(h.sink.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_submission_still_advances() {
        let sink = CollectingSink {
            fail: true,
            ..Default::default()
        };
        let mut h = harness(sink, Some("u1"));
        h.engine.open_module("m").await;
        h.engine.next();
        h.engine.next();

        let report = h.engine.finish_module(3).await.unwrap();
        assert!(report.completed);
        assert!(matches!(report.result, Err(SubmissionError::Network(_))));
        assert!(report.submission.is_some());
        assert!(h.engine.navigator().unwrap().is_completed());
        assert!(h
            .signals
            .0
            .lock()
            .unwrap()
            .contains(&"m:submission_failed".to_string()));
    }

    #[tokio::test]
    async fn missing_identity_skips_submission() {
        let mut h = harness(CollectingSink::default(), None);
        h.engine.open_module("m").await;
        h.engine.next();
        h.engine.next();

        let report = h.engine.finish_module(10).await.unwrap();
        assert_eq!(report.result, Err(SubmissionError::MissingIdentity));
        assert!(report.submission.is_none());
        assert!(h.sink.received.lock().unwrap().is_empty());
        assert!(report.completed);
    }

    #[tokio::test]
    async fn finish_outside_exam_is_a_no_op() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        h.engine.open_module("m").await;
        let writes_before = h.store.writes().len();
        assert!(h.engine.finish_module(5).await.is_none());
        assert_eq!(h.engine.navigator().unwrap().cursor(), 0);
        assert_eq!(h.store.writes().len(), writes_before);
    }

    #[tokio::test]
    async fn actions_interleave_with_pending_submission() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        let ticket = h.engine.begin_load("pre");
        let mut pre = post_exam(0.0, 2);
        pre.kind = SectionKind::PreExam;
        h.engine.complete_load(
            ticket,
            Ok(vec![pre, Section::content(1.0, "A"), Section::content(2.0, "B")]),
        );

        let outcome = h.engine.finish_section(1).unwrap();
        let submission = outcome.submission.unwrap();
        // The learner keeps going before the submission is sent.
        assert!(h.engine.next().moved());
        assert_eq!(h.engine.submit(&submission).await, Ok(()));
        assert_eq!(h.engine.navigator().unwrap().cursor(), 2);
        assert_eq!(h.sink.received.lock().unwrap()[0].percentage, 50.0);
    }

    #[tokio::test]
    async fn resume_after_reopen() {
        let mut h = harness(CollectingSink::default(), Some("u1"));
        h.engine.open_module("plain").await;
        h.engine.next();
        h.engine.next();
        h.engine.close_module();

        let outcome = h.engine.open_module("plain").await;
        assert_eq!(
            outcome,
            LoadOutcome::Ready {
                cursor: 2,
                section_count: 3
            }
        );
    }
}
