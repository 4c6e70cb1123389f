//! The `lessonflow study` command.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use lessonflow_adapters::config::{
    create_content_provider, create_identity, create_sink, load_config_from, open_progress_store,
};
use lessonflow_core::attempt::{AttemptState, Feedback};
use lessonflow_core::engine::{LoadOutcome, ProgressionEngine, ProgressionObserver, View};
use lessonflow_core::error::{ContentError, SubmissionError};
use lessonflow_core::model::Section;
use lessonflow_core::navigator::Controls;

/// Console observer. Signals go to stderr so stdout stays the session transcript.
struct ConsoleObserver;

impl ProgressionObserver for ConsoleObserver {
    fn on_section_changed(&self, module_id: &str, from: usize, to: usize) {
        tracing::debug!(module = module_id, from, to, "section changed");
    }

    fn on_module_completed(&self, module_id: &str) {
        eprintln!("  Module {module_id} completed");
    }

    fn on_content_unavailable(&self, module_id: &str, error: &ContentError) {
        eprintln!("  ERROR: {module_id}: {error}");
    }

    fn on_submission_failed(&self, module_id: &str, error: &SubmissionError) {
        let kind = if error.is_permanent() {
            "permanent"
        } else {
            "transient"
        };
        eprintln!("  Submission failed for {module_id} ({kind}): {error}");
    }
}

/// One line of learner input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StudyCommand {
    Next,
    Back,
    Select(String),
    Unselect(String),
    Reveal,
    Retry,
    Finish(u32),
    Status,
    Help,
    Quit,
}

impl FromStr for StudyCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let command = match (verb.as_str(), arg) {
            ("next" | "n", None) => StudyCommand::Next,
            ("back" | "b", None) => StudyCommand::Back,
            ("select" | "s", Some(key)) => StudyCommand::Select(key.to_string()),
            ("unselect" | "u", Some(key)) => StudyCommand::Unselect(key.to_string()),
            ("reveal" | "show", None) => StudyCommand::Reveal,
            ("retry" | "r", None) => StudyCommand::Retry,
            ("finish" | "f", Some(score)) => StudyCommand::Finish(
                score
                    .parse()
                    .map_err(|_| format!("score must be a non-negative integer, got '{score}'"))?,
            ),
            ("status", None) => StudyCommand::Status,
            ("help" | "?", None) => StudyCommand::Help,
            ("quit" | "q" | "exit", None) => StudyCommand::Quit,
            _ => return Err(format!("unrecognised command '{}', try 'help'", s.trim())),
        };
        if parts.next().is_some() {
            return Err(format!("too many arguments in '{}'", s.trim()));
        }
        Ok(command)
    }
}

const HELP: &str = "Commands:
  next | back          move between sections
  select <key>         choose an option
  unselect <key>       clear an option
  reveal               check your answer
  retry                clear an incorrect answer and try again
  finish <score>       finish the exam with the number of correct answers
  status               show the current section again
  quit                 leave the session";

pub async fn execute(module_id: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let content = Arc::new(create_content_provider(&config));
    let store = Arc::new(open_progress_store(&config)?);
    let sink = create_sink(&config.sink);
    let identity = Arc::new(create_identity(&config));
    tracing::debug!(sink = sink.name(), "study session starting");

    let mut engine = ProgressionEngine::new(content, store, sink, identity)
        .with_observer(Arc::new(ConsoleObserver));

    match engine.open_module(&module_id).await {
        LoadOutcome::Ready { .. } => {}
        LoadOutcome::Unavailable(_) | LoadOutcome::Discarded => {
            render(&engine.view());
            return Ok(());
        }
    }
    render(&engine.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<StudyCommand>() {
            Ok(StudyCommand::Quit) => break,
            Ok(command) => apply(&mut engine, command).await,
            Err(e) => println!("{e}"),
        }
    }

    if let Some(nav) = engine.navigator() {
        let progress = nav.progress();
        println!(
            "Saved progress: section {} of {}",
            (progress.current_section_index + 1).min(progress.section_count),
            progress.section_count
        );
    }
    Ok(())
}

async fn apply(engine: &mut ProgressionEngine, command: StudyCommand) {
    match command {
        StudyCommand::Next | StudyCommand::Back => {
            let forward = command == StudyCommand::Next;
            let outcome = if forward { engine.next() } else { engine.back() };
            if outcome.moved() {
                render(&engine.view());
            } else if on_exam(engine) {
                println!("Finish the exam to continue.");
            } else if forward {
                println!("Already on the last section.");
            } else {
                println!("Already on the first section.");
            }
        }
        StudyCommand::Select(key) => match engine.select(&key) {
            Ok(()) => print_attempt_line(engine),
            Err(e) => println!("{e}"),
        },
        StudyCommand::Unselect(key) => match engine.deselect(&key) {
            Ok(()) => print_attempt_line(engine),
            Err(e) => println!("{e}"),
        },
        StudyCommand::Reveal => match engine.reveal() {
            Ok(evaluation) if evaluation.correct => println!("Correct!"),
            Ok(_) => println!("Incorrect."),
            Err(e) => println!("{e}"),
        },
        StudyCommand::Retry => match engine.retry() {
            Ok(decision) if decision.allowed => println!("Try again."),
            Ok(_) => println!("No retries left, move on to the next section."),
            Err(e) => println!("{e}"),
        },
        StudyCommand::Finish(score) => match engine.finish_module(score).await {
            None => println!("Nothing to finish here."),
            Some(report) => {
                println!(
                    "{}: {} / {} correct ({:.2}%)",
                    report.score.exam_title.as_deref().unwrap_or("Exam"),
                    report.score.score,
                    report.score.total_questions,
                    report.score.percentage
                );
                match &report.result {
                    Ok(()) => println!("Result submitted."),
                    Err(e) => println!("Result not submitted: {e}"),
                }
                render(&engine.view());
            }
        },
        StudyCommand::Status => render(&engine.view()),
        StudyCommand::Help => println!("{HELP}"),
        StudyCommand::Quit => {}
    }
}

fn on_exam(engine: &ProgressionEngine) -> bool {
    engine
        .navigator()
        .and_then(|nav| nav.current_section())
        .is_some_and(Section::is_exam)
}

fn print_attempt_line(engine: &ProgressionEngine) {
    if let Some(nav) = engine.navigator() {
        let selected: Vec<&str> = nav.attempt().selected().iter().map(String::as_str).collect();
        println!("Selected: {}", selected.join(", "));
    }
}

fn render(view: &View<'_>) {
    match view {
        View::ModuleList => println!("No module open."),
        View::Loading { module_id } => println!("Loading {module_id}..."),
        View::NoContent { module_id } => {
            println!("No content available for {module_id}. Back to modules.")
        }
        View::Completed { module_id } => {
            println!("Module {module_id} completed. Back to modules.")
        }
        View::Section {
            section,
            attempt,
            controls,
            page_label,
            progress_ratio,
        } => {
            println!();
            println!(
                "== {page_label} ({:.0}%) == {}",
                progress_ratio * 100.0,
                section.title
            );
            print_section(section, attempt);
            println!("Controls: {}", control_names(controls).join(", "));
        }
    }
}

fn print_section(section: &Section, attempt: &AttemptState) {
    if let Some(subheader) = &section.subheader {
        println!("{subheader}");
    }
    if let Some(body) = &section.body {
        println!("{body}");
    }
    if let Some(image) = &section.image {
        println!("[image: {image}]");
    }
    for (i, column) in section.columns.iter().enumerate() {
        println!("  column {}: {column}", i + 1);
    }
    for item in &section.bullet_list {
        println!("  - {item}");
    }
    for (i, item) in section.numbered_list.iter().enumerate() {
        println!("  {}. {item}", i + 1);
    }

    if let Some(question) = &section.question {
        println!("({})", question.field_type);
        for option in &question.options {
            let mark = if attempt.selected().contains(&option.key) {
                "x"
            } else {
                " "
            };
            println!("  [{mark}] {}) {}", option.key, option.text);
        }
        match attempt.feedback() {
            Feedback::Correct => println!("Correct!"),
            Feedback::Incorrect => println!("Incorrect."),
            Feedback::Pending => {}
        }
    }

    for exam in &section.exams {
        println!("Exam {}: {} ({} questions)", exam.exam_id, exam.title, exam.questions.len());
        for (i, question) in exam.questions.iter().enumerate() {
            if let Some(prompt) = &question.prompt {
                println!("  {}. {prompt}", i + 1);
            }
        }
    }
}

fn control_names(controls: &Controls) -> Vec<&'static str> {
    let mut names = Vec::new();
    if controls.back {
        names.push("back");
    }
    if controls.next {
        names.push("next");
    }
    if controls.show_answer {
        names.push("reveal");
    }
    if controls.retry {
        names.push("retry");
    }
    if controls.finish {
        names.push("finish");
    }
    if names.is_empty() {
        names.push("quit");
    }
    names
}
