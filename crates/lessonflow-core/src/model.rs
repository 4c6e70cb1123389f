//! Core data model types for lessonflow.
//!
//! A module is an ordered sequence of sections. Sections are normalized once
//! at load time (see [`crate::parser`]); after that every decision the engine
//! makes is driven by [`SectionKind`], never by the section title.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved title marking the pre-examination boundary in authored content.
pub const PRE_EXAM_TITLE: &str = "Module Pre-Examination";
/// Reserved title marking the post-examination boundary in authored content.
pub const POST_EXAM_TITLE: &str = "Module Post-Examination";

/// What a section is, decided at normalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    #[default]
    Content,
    KnowledgeCheck,
    PreExam,
    PostExam,
}

impl SectionKind {
    /// Pre- and post-examination boundaries.
    pub fn is_exam(self) -> bool {
        matches!(self, SectionKind::PreExam | SectionKind::PostExam)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Content => write!(f, "content"),
            SectionKind::KnowledgeCheck => write!(f, "knowledge_check"),
            SectionKind::PreExam => write!(f, "pre_exam"),
            SectionKind::PostExam => write!(f, "post_exam"),
        }
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "content" => Ok(SectionKind::Content),
            "knowledge_check" => Ok(SectionKind::KnowledgeCheck),
            "pre_exam" => Ok(SectionKind::PreExam),
            "post_exam" => Ok(SectionKind::PostExam),
            other => Err(format!("unknown section kind: {other}")),
        }
    }
}

/// Column layout of a section. Presentational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "col-1")]
    OneColumn,
    #[serde(rename = "col-2")]
    TwoColumns,
    #[serde(rename = "col-3")]
    ThreeColumns,
}

impl Layout {
    pub fn columns(self) -> usize {
        match self {
            Layout::OneColumn => 1,
            Layout::TwoColumns => 2,
            Layout::ThreeColumns => 3,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col-{}", self.columns())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "col-1" => Ok(Layout::OneColumn),
            "col-2" => Ok(Layout::TwoColumns),
            "col-3" => Ok(Layout::ThreeColumns),
            other => Err(format!("unknown layout: {other}")),
        }
    }
}

/// Whether one or many options may be selected at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    SingleSelect,
    #[default]
    MultiSelect,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::SingleSelect => write!(f, "single_select"),
            FieldType::MultiSelect => write!(f, "multi_select"),
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single_select" => Ok(FieldType::SingleSelect),
            "multi_select" => Ok(FieldType::MultiSelect),
            other => Err(format!("unknown question field type: {other}")),
        }
    }
}

/// One selectable option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Key recorded in selections and answer keys (e.g. "a").
    pub key: String,
    /// Display text.
    pub text: String,
}

/// An inline, immediately gradable question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeCheck {
    pub options: Vec<ChoiceOption>,
    pub field_type: FieldType,
    /// Canonical comma-separated list of correct option keys.
    pub answer_key: String,
}

impl KnowledgeCheck {
    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|o| o.key == key)
    }
}

/// A question inside an exam. Each contributes one point to the exam total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamQuestion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// A full examination attached to an exam boundary section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub exam_id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<ExamQuestion>,
}

/// One navigable page of module content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Sequence position; sections are stably sorted by it at load time.
    pub order: f64,
    pub title: String,
    pub kind: SectionKind,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub subheader: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Column bodies for multi-column layouts, in column order.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub bullet_list: Vec<String>,
    #[serde(default)]
    pub numbered_list: Vec<String>,
    #[serde(default)]
    pub question: Option<KnowledgeCheck>,
    #[serde(default)]
    pub exams: Vec<Exam>,
}

impl Section {
    /// A plain content section with the given order and title.
    pub fn content(order: f64, title: impl Into<String>) -> Self {
        Self {
            order,
            title: title.into(),
            kind: SectionKind::Content,
            layout: Layout::OneColumn,
            subheader: None,
            body: None,
            image: None,
            columns: Vec::new(),
            bullet_list: Vec::new(),
            numbered_list: Vec::new(),
            question: None,
            exams: Vec::new(),
        }
    }

    pub fn is_exam(&self) -> bool {
        self.kind.is_exam()
    }

    /// Total number of exam questions across every exam in this section.
    pub fn exam_question_count(&self) -> usize {
        self.exams.iter().map(|e| e.questions.len()).sum()
    }
}

/// Persisted cursor for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgress {
    /// Zero-based cursor; equal to `section_count` once the module is completed.
    pub current_section_index: usize,
    /// Section total at the time of the last write.
    pub section_count: usize,
}

impl ModuleProgress {
    pub fn new(current_section_index: usize, section_count: usize) -> Self {
        Self {
            current_section_index,
            section_count,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.section_count > 0 && self.current_section_index >= self.section_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_kind_display_and_parse() {
        assert_eq!(SectionKind::KnowledgeCheck.to_string(), "knowledge_check");
        assert_eq!("pre-exam".parse::<SectionKind>().unwrap(), SectionKind::PreExam);
        assert_eq!("POST_EXAM".parse::<SectionKind>().unwrap(), SectionKind::PostExam);
        assert!("quiz".parse::<SectionKind>().is_err());
        assert!(SectionKind::PostExam.is_exam());
        assert!(!SectionKind::KnowledgeCheck.is_exam());
    }

    #[test]
    fn layout_serde_uses_column_names() {
        let json = serde_json::to_string(&Layout::ThreeColumns).unwrap();
        assert_eq!(json, "\"col-3\"");
        let parsed: Layout = serde_json::from_str("\"col-2\"").unwrap();
        assert_eq!(parsed, Layout::TwoColumns);
        assert_eq!(Layout::TwoColumns.to_string(), "col-2");
    }

    #[test]
    fn exam_question_count_sums_all_exams() {
        let mut section = Section::content(9.0, POST_EXAM_TITLE);
        section.kind = SectionKind::PostExam;
        section.exams = vec![
            Exam {
                exam_id: "e1".into(),
                title: "Part 1".into(),
                questions: vec![ExamQuestion { id: None, prompt: None }; 4],
            },
            Exam {
                exam_id: "e2".into(),
                title: "Part 2".into(),
                questions: vec![ExamQuestion { id: None, prompt: None }; 6],
            },
        ];
        assert_eq!(section.exam_question_count(), 10);
    }

    #[test]
    fn progress_completion() {
        assert!(ModuleProgress::new(5, 5).is_completed());
        assert!(!ModuleProgress::new(4, 5).is_completed());
        assert!(!ModuleProgress::new(0, 0).is_completed());
    }
}
