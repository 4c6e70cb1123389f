//! Configuration and collaborator factory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lessonflow_core::progress::KeyedProgressStore;
use lessonflow_core::traits::ResultSink;

use crate::content::{default_module_files, FileContentProvider};
use crate::http::{HttpResultSink, DEFAULT_TIMEOUT_SECS};
use crate::identity::StaticIdentity;
use crate::kv::JsonFileStore;
use crate::sink::{DiscardSink, JsonlResultSink};

/// Where exam results go.
///
/// Note: Custom Debug impl masks the API key to keep it out of logs.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Jsonl {
        #[serde(default = "default_results_path")]
        path: PathBuf,
    },
    #[default]
    None,
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            SinkConfig::Jsonl { path } => f.debug_struct("Jsonl").field("path", path).finish(),
            SinkConfig::None => f.write_str("None"),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_results_path() -> PathBuf {
    PathBuf::from("./.lessonflow/results.jsonl")
}

/// Top-level lessonflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonflowConfig {
    /// Directory holding the module content files.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    /// Course catalog, relative to `content_dir` unless absolute.
    #[serde(default = "default_catalog_file")]
    pub catalog_file: PathBuf,
    /// JSON file holding per-module progress.
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
    /// Signed-in learner. Exam results are not submitted without one.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Extra or replacement module id → content file entries.
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
    #[serde(default)]
    pub sink: SinkConfig,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("./content")
}
fn default_catalog_file() -> PathBuf {
    PathBuf::from("courseList.json")
}
fn default_progress_file() -> PathBuf {
    PathBuf::from("./.lessonflow/progress.json")
}

impl Default for LessonflowConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            catalog_file: default_catalog_file(),
            progress_file: default_progress_file(),
            user_id: None,
            modules: BTreeMap::new(),
            sink: SinkConfig::default(),
        }
    }
}

impl LessonflowConfig {
    /// Stock module mapping with the configured entries applied on top.
    pub fn module_files(&self) -> BTreeMap<String, String> {
        let mut mapping = default_module_files();
        mapping.extend(self.modules.clone());
        mapping
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.content_dir.join(&self.catalog_file)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_sink_config(config: &SinkConfig) -> SinkConfig {
    match config {
        SinkConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => SinkConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key.as_deref().map(resolve_env_vars),
            timeout_secs: *timeout_secs,
        },
        SinkConfig::Jsonl { path } => SinkConfig::Jsonl {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
        SinkConfig::None => SinkConfig::None,
    }
}

/// Apply overrides from `lookup` (the process environment in production).
fn apply_overrides(config: &mut LessonflowConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(user_id) = lookup("LESSONFLOW_USER_ID") {
        config.user_id = Some(user_id);
    }
    if let Some(key) = lookup("LESSONFLOW_SINK_API_KEY") {
        match &mut config.sink {
            SinkConfig::Http { api_key, .. } => *api_key = Some(key),
            _ => tracing::debug!("LESSONFLOW_SINK_API_KEY set but the sink is not http, ignoring"),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `lessonflow.toml` in the current directory
/// 2. `~/.config/lessonflow/config.toml`
///
/// Environment variable overrides: `LESSONFLOW_USER_ID`, `LESSONFLOW_SINK_API_KEY`.
pub fn load_config() -> Result<LessonflowConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LessonflowConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("lessonflow.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<LessonflowConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LessonflowConfig::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok());

    config.sink = resolve_sink_config(&config.sink);
    config.user_id = config.user_id.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("lessonflow"))
}

/// Create a result sink from its configuration.
pub fn create_sink(config: &SinkConfig) -> Arc<dyn ResultSink> {
    match config {
        SinkConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => Arc::new(HttpResultSink::new(base_url, api_key.clone(), *timeout_secs)),
        SinkConfig::Jsonl { path } => Arc::new(JsonlResultSink::new(path.clone())),
        SinkConfig::None => Arc::new(DiscardSink),
    }
}

pub fn create_content_provider(config: &LessonflowConfig) -> FileContentProvider {
    FileContentProvider::with_mapping(config.content_dir.clone(), config.module_files())
}

pub fn create_identity(config: &LessonflowConfig) -> StaticIdentity {
    StaticIdentity::new(config.user_id.clone())
}

/// Open the progress file named by the configuration.
pub fn open_progress_store(config: &LessonflowConfig) -> Result<KeyedProgressStore<JsonFileStore>> {
    let store = JsonFileStore::open(&config.progress_file).with_context(|| {
        format!(
            "failed to open progress file: {}",
            config.progress_file.display()
        )
    })?;
    Ok(KeyedProgressStore::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_LESSONFLOW_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_LESSONFLOW_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_LESSONFLOW_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no ${closing"), "no ${closing");
        std::env::remove_var("_LESSONFLOW_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = LessonflowConfig::default();
        assert_eq!(config.content_dir, PathBuf::from("./content"));
        assert_eq!(
            config.catalog_path(),
            PathBuf::from("./content").join("courseList.json")
        );
        assert!(config.user_id.is_none());
        assert!(matches!(config.sink, SinkConfig::None));
        assert_eq!(config.module_files().len(), 12);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
content_dir = "/srv/content"
user_id = "learner-7"

[modules]
CM_INTRO = "intro_v2.json"
EXTRA_MODULE = "extra.json"

[sink]
type = "http"
base_url = "https://results.example.org"
api_key = "sk-test"
"#;
        let config: LessonflowConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.user_id.as_deref(), Some("learner-7"));
        let files = config.module_files();
        assert_eq!(files.len(), 13);
        assert_eq!(files["CM_INTRO"], "intro_v2.json");
        assert!(matches!(
            config.sink,
            SinkConfig::Http {
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                ..
            }
        ));
    }

    #[test]
    fn parse_jsonl_sink() {
        let config: LessonflowConfig =
            toml::from_str("[sink]\ntype = \"jsonl\"\npath = \"out/results.jsonl\"\n").unwrap();
        match config.sink {
            SinkConfig::Jsonl { path } => assert_eq!(path, PathBuf::from("out/results.jsonl")),
            other => panic!("unexpected sink {other:?}"),
        }
    }

    #[test]
    fn debug_masks_api_key() {
        let sink = SinkConfig::Http {
            base_url: "https://results.example.org".into(),
            api_key: Some("sk-very-secret".into()),
            timeout_secs: 5,
        };
        let printed = format!("{sink:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("LESSONFLOW_USER_ID", "from-env"),
            ("LESSONFLOW_SINK_API_KEY", "env-key"),
        ]
        .into_iter()
        .collect();
        let mut config = LessonflowConfig {
            sink: SinkConfig::Http {
                base_url: "http://localhost".into(),
                api_key: None,
                timeout_secs: 5,
            },
            ..LessonflowConfig::default()
        };

        apply_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.user_id.as_deref(), Some("from-env"));
        assert!(matches!(
            &config.sink,
            SinkConfig::Http { api_key: Some(key), .. } if key == "env-key"
        ));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lessonflow.toml");
        std::fs::write(&path, "progress_file = \"p.json\"\n[sink]\ntype = \"none\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.progress_file, PathBuf::from("p.json"));
        assert_eq!(create_sink(&config.sink).name(), "none");
    }

    #[test]
    fn progress_store_opens_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LessonflowConfig {
            progress_file: dir.path().join("progress.json"),
            ..LessonflowConfig::default()
        };
        let store = open_progress_store(&config).unwrap();
        assert_eq!(store.backend().path(), config.progress_file.as_path());
    }
}
