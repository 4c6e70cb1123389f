//! Exam scoring.
//!
//! The running score is tallied by the exam-taking flow; this module turns
//! that tally into the percentage that is submitted for an exam section.

use serde::Serialize;

use crate::model::Section;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `score / total * 100`, rounded to two decimals. A zero-question exam scores 0.
pub fn percentage(score: u32, total_questions: u32) -> f64 {
    if total_questions == 0 {
        tracing::debug!("exam has no questions, reporting 0%");
        return 0.0;
    }
    round2(f64::from(score) / f64::from(total_questions) * 100.0)
}

/// Score of one exam section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamScore {
    /// Identifier of the section's first exam, which names the result.
    /// `None` when the section carries no exam.
    pub exam_id: Option<String>,
    pub exam_title: Option<String>,
    /// Questions across every exam in the section.
    pub total_questions: u32,
    pub score: u32,
    pub percentage: f64,
}

/// Score an exam section from the externally tallied number of correct answers.
///
/// Returns `None` for sections that are not exam boundaries. An exam section
/// without any exam scores zero questions at 0%.
/// A tally above the question total is capped at the total.
pub fn score_exam(section: &Section, score: u32) -> Option<ExamScore> {
    if !section.is_exam() {
        return None;
    }
    let first = section.exams.first();
    let total_questions = u32::try_from(section.exam_question_count()).unwrap_or(u32::MAX);

    let score = if total_questions > 0 && score > total_questions {
        tracing::warn!(
            exam = first.map_or("-", |e| e.exam_id.as_str()),
            score,
            total_questions,
            "score exceeds question count, capping"
        );
        total_questions
    } else {
        score
    };

    Some(ExamScore {
        exam_id: first.map(|e| e.exam_id.clone()),
        exam_title: first.map(|e| e.title.clone()),
        total_questions,
        score,
        percentage: percentage(score, total_questions),
    })
}
