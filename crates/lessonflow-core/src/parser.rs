//! JSON content payload parser.
//!
//! Loads module content files, normalizes raw section records into
//! [`Section`]s (deciding each section's [`SectionKind`] once), and validates
//! them for authoring defects.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ContentError;
use crate::evaluator::parse_answer_key;
use crate::model::{
    ChoiceOption, Exam, ExamQuestion, FieldType, KnowledgeCheck, Layout, Section, SectionKind,
    POST_EXAM_TITLE, PRE_EXAM_TITLE,
};
use crate::navigator::sort_sections;

/// One module's sections as found in a content file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleContent {
    pub module_id: String,
    pub sections: Vec<Section>,
}

/// Intermediate structure for a module record.
#[derive(Debug, Deserialize)]
struct RawModule {
    #[serde(rename = "moduleId", alias = "module_id")]
    module_id: String,
    #[serde(default)]
    sections: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    order: Option<RawOrder>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    layout: Option<String>,
    #[serde(default)]
    subheader: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    col1: Option<String>,
    #[serde(default)]
    col2: Option<String>,
    #[serde(default)]
    col3: Option<String>,
    #[serde(default)]
    list1: Option<String>,
    #[serde(default)]
    numberedlist: Option<String>,
    #[serde(default)]
    q_selection: Option<RawSelection>,
    #[serde(default)]
    q_field_type: Option<String>,
    #[serde(default)]
    q_answer: Option<String>,
    #[serde(default)]
    exams: Vec<RawExam>,
}

/// `order` is authored either as a number or as a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOrder {
    Number(f64),
    Text(String),
}

/// `q_selection` is authored as `[{ "a": "...", ... }]` or as a bare map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSelection {
    List(Vec<Map<String, Value>>),
    Map(Map<String, Value>),
}

#[derive(Debug, Deserialize)]
struct RawExam {
    #[serde(alias = "examId")]
    exam_id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    questions: Vec<Value>,
}

/// Parse every module in a content file.
pub fn parse_modules(content: &str, source: &str) -> Result<Vec<ModuleContent>, ContentError> {
    let raw: Vec<RawModule> = serde_json::from_str(content).map_err(|e| ContentError::Parse {
        module_id: source.to_string(),
        message: e.to_string(),
    })?;

    raw.into_iter()
        .map(|module| {
            let sections = module
                .sections
                .into_iter()
                .map(normalize_section)
                .collect::<Result<Vec<_>, String>>()
                .map_err(|message| ContentError::Parse {
                    module_id: module.module_id.clone(),
                    message,
                })?;
            Ok(ModuleContent {
                module_id: module.module_id,
                sections,
            })
        })
        .collect()
}

/// Parse a content file and return the sorted sections of `module_id`.
pub fn parse_module_payload(module_id: &str, content: &str) -> Result<Vec<Section>, ContentError> {
    let mut module = parse_modules(content, module_id)?
        .into_iter()
        .find(|m| m.module_id == module_id)
        .ok_or_else(|| ContentError::NotFound(module_id.to_string()))?;
    sort_sections(&mut module.sections);
    Ok(module.sections)
}

/// Decide a section's kind. An explicit kind wins over the reserved titles,
/// which win over the presence of a question.
pub fn classify(title: &str, explicit: Option<SectionKind>, has_question: bool) -> SectionKind {
    if let Some(kind) = explicit {
        return kind;
    }
    match title.trim() {
        PRE_EXAM_TITLE => SectionKind::PreExam,
        POST_EXAM_TITLE => SectionKind::PostExam,
        _ if has_question => SectionKind::KnowledgeCheck,
        _ => SectionKind::Content,
    }
}

fn normalize_section(raw: RawSection) -> Result<Section, String> {
    let order = match raw.order {
        Some(RawOrder::Number(n)) => n,
        Some(RawOrder::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("section '{}' has non-numeric order {text:?}", raw.title))?,
        None => return Err(format!("section '{}' has no order", raw.title)),
    };

    let explicit = raw
        .kind
        .as_deref()
        .map(str::parse::<SectionKind>)
        .transpose()?;

    let layout = match raw.layout.as_deref() {
        Some(layout) => layout.parse::<Layout>().unwrap_or_else(|e: String| {
            tracing::debug!(section = %raw.title, "{e}, using col-1");
            Layout::OneColumn
        }),
        None => Layout::OneColumn,
    };

    let options = raw.q_selection.map(selection_options).unwrap_or_default();
    let question = if options.is_empty() {
        None
    } else {
        let field_type = raw
            .q_field_type
            .as_deref()
            .map(str::parse::<FieldType>)
            .transpose()?
            .unwrap_or_default();
        Some(KnowledgeCheck {
            options,
            field_type,
            answer_key: raw.q_answer.unwrap_or_default(),
        })
    };

    let kind = classify(&raw.title, explicit, question.is_some());

    let columns = [raw.col1, raw.col2, raw.col3]
        .into_iter()
        .take(layout.columns())
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>();
    let columns = if layout == Layout::OneColumn {
        Vec::new()
    } else {
        columns
    };

    let exams = raw.exams.into_iter().map(normalize_exam).collect();

    Ok(Section {
        order,
        title: raw.title,
        kind,
        layout,
        subheader: raw.subheader,
        body: raw.body,
        image: raw.image,
        columns,
        bullet_list: split_list(raw.list1.as_deref()),
        numbered_list: split_list(raw.numberedlist.as_deref()),
        question,
        exams,
    })
}

fn selection_options(selection: RawSelection) -> Vec<ChoiceOption> {
    let map = match selection {
        RawSelection::List(list) => list.into_iter().next().unwrap_or_default(),
        RawSelection::Map(map) => map,
    };
    map.into_iter()
        .map(|(key, value)| ChoiceOption {
            key,
            text: value_text(&value),
        })
        .collect()
}

fn normalize_exam(raw: RawExam) -> Exam {
    let questions = raw
        .questions
        .iter()
        .map(|q| ExamQuestion {
            id: first_field(q, &["question_id", "questionId", "id"]),
            prompt: first_field(q, &["question", "text", "prompt"]),
        })
        .collect();
    Exam {
        exam_id: value_text(&raw.exam_id),
        title: raw.title,
        questions,
    }
}

fn first_field(value: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| value.get(name))
        .map(value_text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split a `;`-separated authored list into trimmed, non-empty items.
fn split_list(list: Option<&str>) -> Vec<String> {
    list.map(|l| {
        l.split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// A warning from module validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Title of the offending section (if applicable).
    pub section: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a module's sections for authoring defects.
pub fn validate_module(sections: &[Section]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |section: &Section, message: String| ValidationWarning {
        section: Some(section.title.clone()),
        message,
    };

    if sections.is_empty() {
        warnings.push(ValidationWarning {
            section: None,
            message: "module has no sections".into(),
        });
    }

    // Duplicate order values make the sequence depend on authored position
    let mut seen_orders: Vec<f64> = Vec::new();
    for section in sections {
        if seen_orders.contains(&section.order) {
            warnings.push(warn(
                section,
                format!("duplicate order value {}", section.order),
            ));
        } else {
            seen_orders.push(section.order);
        }
    }

    for section in sections {
        if let Some(question) = &section.question {
            match parse_answer_key(&question.answer_key) {
                Err(e) => warnings.push(warn(section, format!("malformed answer key: {e}"))),
                Ok(keys) => {
                    for key in keys.iter().filter(|k| !question.has_option(k)) {
                        warnings.push(warn(
                            section,
                            format!("answer key '{key}' is not one of the options"),
                        ));
                    }
                    if question.field_type == FieldType::SingleSelect && keys.len() > 1 {
                        warnings.push(warn(
                            section,
                            "single_select question has more than one correct key".into(),
                        ));
                    }
                }
            }
        }

        if section.is_exam() {
            if section.exams.is_empty() {
                warnings.push(warn(section, "exam section has no exams".into()));
            }
            for exam in section.exams.iter().filter(|e| e.questions.is_empty()) {
                warnings.push(warn(
                    section,
                    format!("exam '{}' has no questions", exam.exam_id),
                ));
            }
        }
    }

    warnings
}
