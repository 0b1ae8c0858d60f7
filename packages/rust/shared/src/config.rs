//! Application configuration for Preprint Alert.
//!
//! User config lives at `~/.preprint-alert/preprint-alert.toml`.
//! CLI flags override environment overrides, which override the config file,
//! which overrides defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PreprintAlertError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "preprint-alert.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".preprint-alert";

/// Environment variable that overrides the configured model.
pub const MODEL_ENV_VAR: &str = "OPENROUTER_MODEL";

// ---------------------------------------------------------------------------
// Config structs (matching preprint-alert.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// `[feed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// RSS feed to discover papers from.
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_secs: default_feed_timeout(),
        }
    }
}

fn default_feed_url() -> String {
    "https://rss.arxiv.org/rss/cs.CL".into()
}
fn default_feed_timeout() -> u64 {
    30
}

/// `[fetcher]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the HTML renderings; the paper id is appended.
    #[serde(default = "default_html_base_url")]
    pub html_base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_fetcher_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            html_base_url: default_html_base_url(),
            timeout_secs: default_fetcher_timeout(),
        }
    }
}

fn default_html_base_url() -> String {
    "https://arxiv.org/html".into()
}
fn default_fetcher_timeout() -> u64 {
    60
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for all three stages.
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model_timeout() -> u64 {
    180
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of papers analyzed at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Free-form interest profile handed to the classifier and the report writer.
    #[serde(default = "default_interests")]
    pub interests: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            interests: default_interests(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_interests() -> String {
    "I'm interested in:\n\
     - Reasoning/thinking\n\
     \n\
     I'm less interested in:\n\
     - Incremental improvements on existing benchmarks\n\
     - Pure dataset papers without methodological novelty\n\
     - Papers focused solely on non-English languages (unless methodology is novel)\n"
        .into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for dated Markdown reports.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,

    /// Directory the static site is written to.
    #[serde(default = "default_site_dir")]
    pub site_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            site_dir: default_site_dir(),
        }
    }
}

fn default_reports_dir() -> String {
    "reports".into()
}
fn default_site_dir() -> String {
    "site".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.preprint-alert/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PreprintAlertError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.preprint-alert/preprint-alert.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PreprintAlertError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PreprintAlertError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate(&config)?;
    Ok(config)
}

/// Apply environment overrides (currently `OPENROUTER_MODEL`).
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(model) = std::env::var(MODEL_ENV_VAR) {
        if !model.trim().is_empty() {
            tracing::debug!(%model, "model overridden from environment");
            config.openrouter.model = model.trim().to_string();
        }
    }
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PreprintAlertError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PreprintAlertError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PreprintAlertError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the OpenRouter API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(PreprintAlertError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.pipeline.concurrency == 0 {
        return Err(PreprintAlertError::validation(
            "pipeline.concurrency must be at least 1",
        ));
    }
    for (field, value) in [
        ("feed.url", &config.feed.url),
        ("fetcher.html_base_url", &config.fetcher.html_base_url),
        ("openrouter.base_url", &config.openrouter.base_url),
    ] {
        url::Url::parse(value).map_err(|e| {
            PreprintAlertError::validation(format!("{field} is not a valid URL ({value}): {e}"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("rss.arxiv.org"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.pipeline.concurrency, 4);
        assert_eq!(parsed.openrouter.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(parsed.fetcher.html_base_url, "https://arxiv.org/html");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[feed]
url = "https://rss.arxiv.org/rss/cs.LG"

[pipeline]
concurrency = 2
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.feed.url, "https://rss.arxiv.org/rss/cs.LG");
        assert_eq!(config.feed.timeout_secs, 30);
        assert_eq!(config.pipeline.concurrency, 2);
        assert!(config.pipeline.interests.contains("Reasoning"));
        assert_eq!(config.output.reports_dir, "reports");
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let dir = std::env::temp_dir().join(format!("pa-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("preprint-alert.toml");
        std::fs::write(&path, "[pipeline]\nconcurrency = 0\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("concurrency"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let mut config = AppConfig::default();
        config.feed.url = "not a url".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn api_key_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openrouter.api_key_env = "PA_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
