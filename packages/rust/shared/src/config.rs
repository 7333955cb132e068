//! Application configuration for groqspec.
//!
//! Config lives in `groqspec.toml` in the working directory (or the path
//! given with `--config`). Every key has a default, so the file is optional.
//! The content-store token is never stored in the file; only the name of the
//! env var that holds it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GroqSpecError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "groqspec.toml";

// ---------------------------------------------------------------------------
// Config structs (matching groqspec.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content store connection and query settings.
    #[serde(default)]
    pub content: ContentConfig,

    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,

    /// Markdown-to-HTML compiler selection.
    #[serde(default)]
    pub html: HtmlConfig,
}

/// `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Content store project ID.
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Dataset to query.
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// HTTP API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Override for the API host (defaults to `https://<project_id>.api.sanity.io`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// Document type holding specification chapters.
    #[serde(default = "default_document_type")]
    pub document_type: String,

    /// Field chapters are ordered by.
    #[serde(default = "default_sort_field")]
    pub sort_field: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            dataset: default_dataset(),
            api_version: default_api_version(),
            api_host: None,
            document_type: default_document_type(),
            sort_field: default_sort_field(),
            token_env: default_token_env(),
        }
    }
}

impl ContentConfig {
    /// Resolve the API base URL (host only, no version or path).
    pub fn base_url(&self) -> Result<Url> {
        let raw = match &self.api_host {
            Some(host) => host.clone(),
            None => format!("https://{}.api.sanity.io", self.project_id),
        };
        Url::parse(&raw).map_err(|e| GroqSpecError::config(format!("invalid API host '{raw}': {e}")))
    }
}

fn default_project_id() -> String {
    "3do82whm".into()
}
fn default_dataset() -> String {
    "next".into()
}
fn default_api_version() -> String {
    "v1".into()
}
fn default_document_type() -> String {
    "specification".into()
}
fn default_sort_field() -> String {
    "sortOrder".into()
}
fn default_token_env() -> String {
    "SANITY_TOKEN".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the Markdown chapters.
    #[serde(default = "default_spec_dir")]
    pub spec_dir: PathBuf,

    /// Directory receiving the compiled HTML.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// File stem of the root chapter (`<spec_dir>/<root_name>.md`).
    #[serde(default = "default_root_name")]
    pub root_name: String,

    /// File name of the compiled artifact inside `docs_dir`.
    #[serde(default = "default_html_file")]
    pub html_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            spec_dir: default_spec_dir(),
            docs_dir: default_docs_dir(),
            root_name: default_root_name(),
            html_file: default_html_file(),
        }
    }
}

impl OutputConfig {
    /// Path of the root Markdown file.
    pub fn root_path(&self) -> PathBuf {
        self.spec_dir.join(format!("{}.md", self.root_name))
    }

    /// Path of the compiled HTML artifact.
    pub fn html_path(&self) -> PathBuf {
        self.docs_dir.join(&self.html_file)
    }
}

fn default_spec_dir() -> PathBuf {
    PathBuf::from("./spec")
}
fn default_docs_dir() -> PathBuf {
    PathBuf::from("./docs")
}
fn default_root_name() -> String {
    "GROQ".into()
}
fn default_html_file() -> String {
    "index.html".into()
}

/// Which Markdown-to-HTML compiler to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilerKind {
    /// External command (spec-md).
    #[default]
    Command,
    /// In-process CommonMark renderer.
    Builtin,
}

/// `[html]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    #[serde(default)]
    pub compiler: CompilerKind,

    /// Command line of the external compiler; the root file path is appended.
    #[serde(default = "default_compiler_command")]
    pub command: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            compiler: CompilerKind::default(),
            command: default_compiler_command(),
        }
    }
}

fn default_compiler_command() -> Vec<String> {
    vec!["npx".into(), "spec-md".into()]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load `groqspec.toml` from the working directory. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = PathBuf::from(CONFIG_FILE_NAME);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GroqSpecError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        GroqSpecError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file to `path`. Refuses to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(GroqSpecError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GroqSpecError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| GroqSpecError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

/// Read the content-store token from the configured env var.
///
/// Unset and empty are treated the same.
pub fn resolve_token(config: &ContentConfig) -> Result<String> {
    let var_name = &config.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(GroqSpecError::MissingToken {
            env_var: var_name.clone(),
        }),
    }
}
