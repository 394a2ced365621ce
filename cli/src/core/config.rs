//! # WeCredit Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads, merges and validates the assistant's configuration. Every
//! setting has a built-in default, so the tool runs with no configuration file
//! at all; files only override what they mention.
//!
//! Configuration sources (in order of precedence, highest last):
//! 1. Default values defined in the code
//! 2. User-specific `config.toml` in the platform config dir (e.g. `~/.config/wecredit/`)
//! 3. Project-specific `.wecredit.toml` in the current directory or an ancestor
//! 4. Environment variables and command-line flags (applied by `commands::engine_args`)
//!
//! ## File Format
//!
//! ```toml
//! [delegate]
//! enabled = true
//! model = "gpt-3.5-turbo"
//! api_base = "https://api.openai.com/v1"
//! max_tokens = 150
//! temperature = 0.7
//!
//! [chat]
//! phrase_intents = false
//! knowledge_base = "~/wecredit/knowledge.toml"
//! transcript = "~/wecredit/chat_log.jsonl"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! enable_cors = true
//! ```
//!
//! The API credential is normally supplied through `OPENAI_API_KEY` rather than
//! written into a file, but `delegate.api_key` is accepted for local setups.
//!
use crate::core::error::{Result, WecreditError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub delegate: DelegateConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Settings for the external generative-text fallback.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DelegateConfig {
    /// Whether unmatched queries are forwarded at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Model identifier sent with every completion request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bearer credential. Usually left unset in favour of `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Maximum output length, in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Settings for the matching pipeline and the transcript log.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Enables the canned phrase-list layer ahead of the key scan.
    #[serde(default)]
    pub phrase_intents: bool,
    /// Path to a TOML knowledge base replacing the built-in catalogue (can use ~).
    #[serde(default)]
    pub knowledge_base: Option<String>,
    /// Path of the JSON-lines transcript (can use ~). No transcript when unset.
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Defaults for `wecredit serve`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            api_base: default_api_base(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: true,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_max_tokens() -> u32 {
    150
}
fn default_temperature() -> f32 {
    0.7
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}

const PROJECT_CONFIG_FILENAME: &str = ".wecredit.toml";

/// # Load Configuration (`load_config`)
///
/// Loads the user and project configuration files (both optional), layers them
/// over the defaults, expands `~` in paths and validates the result.
pub fn load_config() -> Result<Config> {
    let user_table = load_user_config()?;
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project_table = match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            Some(load_config_from_path(&path)?)
        }
        None => {
            debug!("No project configuration file (.wecredit.toml) found in current directory or ancestors.");
            None
        }
    };
    let mut merged_config = merge_configs(user_table, project_table)?;
    expand_config_paths(&mut merged_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<toml::Table>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "WeCredit", "wecredit") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

/// Walks from `start` towards the filesystem root looking for `.wecredit.toml`.
/// The search stops at the first directory containing `.git`.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

/// Reads one configuration file as a raw TOML table.
///
/// The table is also checked against [`Config`] here, so a typo is reported
/// against the file that contains it rather than after merging.
fn load_config_from_path(path: &Path) -> Result<toml::Table> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    let table: toml::Table = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))?;
    toml::Value::Table(table.clone())
        .try_into::<Config>()
        .with_context(|| format!("Invalid configuration in file: {}", path.display()))?;
    Ok(table)
}

/// Layers the project table over the user table, key by key, and builds the
/// final [`Config`]. Only keys a file actually sets take part, so a project file
/// can restore a default (e.g. `enabled = true`) that the user file turned off.
fn merge_configs(user: Option<toml::Table>, project: Option<toml::Table>) -> Result<Config> {
    let mut merged = user.unwrap_or_default();
    if let Some(project) = project {
        overlay_table(&mut merged, project);
    }
    toml::Value::Table(merged)
        .try_into::<Config>()
        .context("Failed to build merged configuration")
}

fn overlay_table(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(section) = value {
            if let Some(toml::Value::Table(base_section)) = base.get_mut(&key) {
                overlay_table(base_section, section);
            } else {
                base.insert(key, toml::Value::Table(section));
            }
        } else {
            base.insert(key, value);
        }
    }
}

/// Expands `~` in every path-valued setting.
pub fn expand_config_paths(config: &mut Config) {
    if let Some(path) = config.chat.knowledge_base.as_mut() {
        *path = shellexpand::tilde(path).into_owned();
        debug!("Expanded knowledge base path: {}", path);
    }
    if let Some(path) = config.chat.transcript.as_mut() {
        *path = shellexpand::tilde(path).into_owned();
        debug!("Expanded transcript path: {}", path);
    }
}

/// # Validate Configuration (`validate_config`)
///
/// Rejects settings the fallback client or the server could not work with.
/// A missing knowledge-base file is only warned about here; loading it later
/// reports the real error.
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating final configuration...");
    let delegate = &config.delegate;
    if delegate.model.trim().is_empty() {
        return Err(anyhow!(WecreditError::Config(
            "delegate.model cannot be empty.".to_string()
        )));
    }
    if !(delegate.api_base.starts_with("http://") || delegate.api_base.starts_with("https://")) {
        return Err(anyhow!(WecreditError::Config(format!(
            "Invalid delegate.api_base '{}'. Expected an http:// or https:// URL.",
            delegate.api_base
        ))));
    }
    if delegate.max_tokens == 0 {
        return Err(anyhow!(WecreditError::Config(
            "delegate.max_tokens must be greater than 0.".to_string()
        )));
    }
    if !(0.0..=2.0).contains(&delegate.temperature) {
        return Err(anyhow!(WecreditError::Config(format!(
            "delegate.temperature {} is out of range (0.0 - 2.0).",
            delegate.temperature
        ))));
    }
    if config.server.host.parse::<IpAddr>().is_err() {
        return Err(anyhow!(WecreditError::Config(format!(
            "Invalid server.host '{}'. Expected an IP address.",
            config.server.host
        ))));
    }
    if let Some(kb) = &config.chat.knowledge_base {
        if !Path::new(kb).exists() {
            warn!("Configured knowledge base '{}' does not exist.", kb);
        }
    }
    debug!("Configuration validation successful.");
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [delegate]
            model = "gpt-4o-mini"
            temperature = 0.2

            [chat]
            phrase_intents = true
            transcript = "~/wecredit/log.jsonl"

            [server]
            port = 9100
        "#;

        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");

        assert_eq!(config.delegate.model, "gpt-4o-mini");
        assert_eq!(config.delegate.temperature, 0.2);
        assert_eq!(config.delegate.max_tokens, 150); // Default
        assert!(config.delegate.enabled); // Default
        assert!(config.chat.phrase_intents);
        assert_eq!(
            config.chat.transcript.as_deref(),
            Some("~/wecredit/log.jsonl")
        ); // Not yet expanded
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1"); // Default
    }

    #[test]
    fn test_defaults_match_fallback_parameters() {
        let config = Config::default();
        assert_eq!(config.delegate.max_tokens, 150);
        assert_eq!(config.delegate.temperature, 0.7);
        assert!(config.delegate.api_key.is_none());
        assert!(config.chat.transcript.is_none());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[delegate]\nmodle = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config::default();
        config.chat.transcript = Some("~/logs/chat.jsonl".to_string());
        config.chat.knowledge_base = Some("/absolute/kb.toml".to_string());

        expand_config_paths(&mut config);

        let home = directories::BaseDirs::new().unwrap().home_dir().to_path_buf();
        assert_eq!(
            config.chat.transcript.unwrap(),
            home.join("logs/chat.jsonl").to_string_lossy()
        );
        assert_eq!(config.chat.knowledge_base.unwrap(), "/absolute/kb.toml");
    }

    fn table(content: &str) -> toml::Table {
        toml::from_str(content).expect("Failed to parse test TOML")
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let user = table(
            r#"
            [delegate]
            model = "user-model"
            max_tokens = 300
            [chat]
            transcript = "/user/log.jsonl"
            "#,
        );
        let project = table(
            r#"
            [delegate]
            model = "project-model"
            [server]
            port = 9000
            "#,
        );

        let merged = merge_configs(Some(user), Some(project)).unwrap();
        assert_eq!(merged.delegate.model, "project-model");
        assert_eq!(merged.delegate.max_tokens, 300); // not set by the project
        assert_eq!(merged.chat.transcript.as_deref(), Some("/user/log.jsonl"));
        assert_eq!(merged.server.port, 9000);
    }

    #[test]
    fn test_merge_project_restores_defaults_over_user() {
        let user = table(
            r#"
            [delegate]
            enabled = false
            model = "user-model"
            [chat]
            phrase_intents = true
            [server]
            enable_cors = false
            "#,
        );
        let project = table(
            r#"
            [delegate]
            enabled = true
            model = "gpt-3.5-turbo"
            [chat]
            phrase_intents = false
            [server]
            enable_cors = true
            "#,
        );

        let merged = merge_configs(Some(user), Some(project)).unwrap();
        assert!(merged.delegate.enabled);
        assert_eq!(merged.delegate.model, "gpt-3.5-turbo");
        assert!(!merged.chat.phrase_intents);
        assert!(merged.server.enable_cors);
    }

    #[test]
    fn test_merge_project_turns_flags_off_and_keeps_user_flags() {
        let user = table("[chat]\nphrase_intents = true\n");
        let project = table("[delegate]\nenabled = false\n[server]\nenable_cors = false\n");

        let merged = merge_configs(Some(user), Some(project)).unwrap();
        assert!(!merged.delegate.enabled);
        assert!(!merged.server.enable_cors);
        assert!(merged.chat.phrase_intents); // untouched by the project
    }

    #[test]
    fn test_merge_without_files_is_default() {
        let merged = merge_configs(None, None).unwrap();
        assert!(merged.delegate.enabled);
        assert_eq!(merged.server.port, 8000);
    }

    #[test]
    fn test_load_config_from_path_reports_unknown_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_FILENAME);
        fs::write(&path, "[server]\nprot = 9000\n").unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid configuration in file"));
    }

    #[test]
    fn test_find_project_config_in_ancestor() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();
        let nested = root.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let found = find_project_config_path(&nested).unwrap();
        assert_eq!(found, root.path().join(PROJECT_CONFIG_FILENAME));
    }

    #[test]
    fn test_find_project_config_stops_at_git_root() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();
        let repo = root.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert!(find_project_config_path(&repo).is_none());
    }

    #[test]
    fn test_validate_config_invalid_temperature() {
        let mut config = Config::default();
        config.delegate.temperature = 3.5;
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("out of range"));
    }

    #[test]
    fn test_validate_config_invalid_api_base() {
        let mut config = Config::default();
        config.delegate.api_base = "api.openai.com".into();
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid delegate.api_base"));
    }

    #[test]
    fn test_validate_config_zero_max_tokens() {
        let mut config = Config::default();
        config.delegate.max_tokens = 0;
        assert!(validate_config(&config).is_err());
    }
}
