//! The `lessonflow init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_absent(Path::new("lessonflow.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("content")?;
    write_if_absent(Path::new("content/courseList.json"), SAMPLE_CATALOG)?;
    write_if_absent(
        Path::new("content/change_management_intro.json"),
        SAMPLE_MODULE,
    )?;

    println!("\nNext steps:");
    println!("  1. Set user_id in lessonflow.toml and pick a result sink");
    println!("  2. Run: lessonflow validate --path content");
    println!("  3. Run: lessonflow study --module CM_INTRO");

    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# lessonflow configuration

content_dir = "./content"
catalog_file = "courseList.json"
progress_file = "./.lessonflow/progress.json"
user_id = "${USER}"

# Extra module id -> content file entries
# [modules]
# MY_MODULE = "my_module.json"

[sink]
type = "jsonl"
path = "./.lessonflow/results.jsonl"

# [sink]
# type = "http"
# base_url = "https://lms.example.org/api"
# api_key = "${LESSONFLOW_SINK_API_KEY}"
# timeout_secs = 30
"#;

const SAMPLE_CATALOG: &str = r#"{
  "CM": {
    "title": "Change Management",
    "description": "Plan, lead and sustain organisational change.",
    "modules": [
      {
        "moduleId": "CM_INTRO",
        "title": "Introduction to Change Management",
        "description": "Why change efforts fail and what to do about it.",
        "icon": "/images/cm_intro.png"
      }
    ]
  }
}
"#;

const SAMPLE_MODULE: &str = r#"[
  {
    "moduleId": "CM_INTRO",
    "sections": [
      {
        "order": 1,
        "title": "Module Pre-Examination",
        "exams": [
          {
            "exam_id": 11,
            "title": "Change Management Pre-Exam",
            "questions": [
              { "question_id": 1, "question": "What is change management?" },
              { "question_id": 2, "question": "Name one reason change fails." }
            ]
          }
        ]
      },
      {
        "order": 2,
        "title": "Welcome",
        "subheader": "What this module covers",
        "body": "<p>Change is constant. Managing it well is a skill.</p>",
        "list1": "Why change fails; The people side of change; Measuring adoption"
      },
      {
        "order": 3,
        "title": "Two views of change",
        "layout": "col-2",
        "col1": "<p>The organisational view: processes, systems, structure.</p>",
        "col2": "<p>The individual view: one person at a time.</p>"
      },
      {
        "order": 4,
        "title": "Knowledge Check",
        "body": "Which of these describe the individual view of change?",
        "q_selection": [
          {
            "a": "Change happens one person at a time",
            "b": "Only org charts matter",
            "c": "Adoption depends on each employee"
          }
        ],
        "q_field_type": "multi_select",
        "q_answer": "a, c"
      },
      {
        "order": 5,
        "title": "Module Post-Examination",
        "exams": [
          {
            "exam_id": 12,
            "title": "Change Management Post-Exam",
            "questions": [
              { "question_id": 1, "question": "What is change management?" },
              { "question_id": 2, "question": "Name one reason change fails." },
              { "question_id": 3, "question": "What is the individual view?" },
              { "question_id": 4, "question": "How is adoption measured?" }
            ]
          }
        ]
      }
    ]
  }
]
"#;
