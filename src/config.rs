//! Configuration management for apictl
//!
//! This module handles loading and saving of the main configuration file,
//! which holds the known API Manager environments and tool-wide settings.
//!
//! ## Configuration Files
//!
//! ### Main Configuration
//! `main_config.yaml` lives in the config directory: `$APICTL_CONFIG_DIR` when
//! set, `~/.config/apictl` otherwise. Exported archives are written below
//! `exported/` in the same directory unless `exportDirectory` says otherwise.
//!
//! ## Environment Variable Expansion
//!
//! The configuration file supports environment variable expansion with the following syntax:
//! - `${VAR}` - Simple substitution
//! - `${VAR:-default}` - Use default if VAR is unset or empty
//! - `${VAR-default}` - Use default if VAR is unset
//! - `${VAR:+alt}` - Use alt if VAR is set and non-empty
//! - `${VAR+alt}` - Use alt if VAR is set

use anyhow::{anyhow, Context};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use std::{env, fs, path::PathBuf};

use crate::constants::{
    CONFIG_DIR_ENV, CONFIG_DIR_NAME, DEFAULT_HTTP_TIMEOUT_MS, DEVPORTAL_PATH, EXPORTED_DIR_NAME,
    IMPORT_EXPORT_PATH, MAIN_CONFIG_FILE, PUBLISHER_PATH, REGISTRATION_PATH, TOKEN_PATH,
};

/// Main configuration loaded from `main_config.yaml`
///
/// # Example
///
/// ```yaml
/// config:
///   exportDirectory: ${APICTL_EXPORT_DIR:-}
///   httpRequestTimeout: 10000
///   defaultEnvironment: dev
/// environments:
///   dev:
///     apimEndpoint: https://dev.example.com:9443
///   prod:
///     apimEndpoint: https://prod.example.com:9443
///     tokenEndpoint: https://prod.example.com:8243/token
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MainConfig {
    /// Tool-wide settings
    #[serde(default)]
    pub config: Settings,
    /// Known environments keyed by name
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Root directory for exported archives; empty means `<config dir>/exported`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_directory: Option<String>,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub http_request_timeout: u64,
    /// Environment used when `--environment` is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            export_directory: None,
            http_request_timeout: DEFAULT_HTTP_TIMEOUT_MS,
            default_environment: None,
        }
    }
}

/// Endpoints of one API Manager deployment
///
/// Only `apimEndpoint` is required; the rest are derived from it unless set.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    /// Base URL of the API Manager
    pub apim_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_export_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devportal_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_endpoint: Option<String>,
}

impl EnvironmentConfig {
    pub fn import_export(&self) -> String {
        self.resolve(&self.import_export_endpoint, IMPORT_EXPORT_PATH)
    }

    pub fn publisher(&self) -> String {
        self.resolve(&self.publisher_endpoint, PUBLISHER_PATH)
    }

    pub fn devportal(&self) -> String {
        self.resolve(&self.devportal_endpoint, DEVPORTAL_PATH)
    }

    pub fn token(&self) -> String {
        self.resolve(&self.token_endpoint, TOKEN_PATH)
    }

    pub fn registration(&self) -> String {
        self.resolve(&self.registration_endpoint, REGISTRATION_PATH)
    }

    fn resolve(&self, explicit: &Option<String>, default_path: &str) -> String {
        match explicit.as_deref().filter(|e| !e.is_empty()) {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => join_url(&self.apim_endpoint, default_path),
        }
    }
}

impl MainConfig {
    /// Look up an environment by name
    pub fn environment(&self, name: &str) -> anyhow::Result<&EnvironmentConfig> {
        self.environments.get(name).ok_or_else(|| {
            anyhow!(
                "environment '{}' is not configured. Add it with 'apictl env add {} --apim <url>'",
                name,
                name
            )
        })
    }

    /// The environment used when none is given on the command line
    ///
    /// An explicit `defaultEnvironment` wins; otherwise a lone environment is
    /// the default.
    pub fn default_environment(&self) -> Option<String> {
        if let Some(env) = &self.config.default_environment {
            if !env.is_empty() {
                return Some(env.clone());
            }
        }
        if self.environments.len() == 1 {
            return self.environments.keys().next().cloned();
        }
        None
    }

    /// Resolve the `--environment` flag against the configured defaults
    pub fn resolve_environment(&self, flag: Option<&str>) -> anyhow::Result<String> {
        let name = match flag {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.default_environment().ok_or_else(|| {
                anyhow!("no environment given and no default environment configured. Use --environment")
            })?,
        };
        self.environment(&name)?;
        Ok(name)
    }

    /// Root directory for exported archives
    pub fn export_directory(&self) -> PathBuf {
        match self.config.export_directory.as_deref().filter(|d| !d.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => config_dir().join(EXPORTED_DIR_NAME),
        }
    }
}

/// Join a base URL and a relative path with exactly one `/` between them
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn config_dir() -> PathBuf {
    env::var(CONFIG_DIR_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push(CONFIG_DIR_NAME);
            p
        })
}

pub fn main_config_path() -> PathBuf {
    config_dir().join(MAIN_CONFIG_FILE)
}

pub fn load_main_config() -> anyhow::Result<MainConfig> {
    load_main_config_from(&main_config_path())
}

/// Load a main config file, treating a missing file as an empty config
pub fn load_main_config_from(path: &Path) -> anyhow::Result<MainConfig> {
    if !path.exists() {
        return Ok(MainConfig::default());
    }
    let data = preprocess_config(path)
        .with_context(|| format!("reading main config {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(MainConfig::default());
    }
    let cfg: MainConfig = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing main config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_main_config(cfg: &MainConfig) -> anyhow::Result<()> {
    save_main_config_to(cfg, &main_config_path())
}

pub fn save_main_config_to(cfg: &MainConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(cfg)?;
    fs::write(path, data).with_context(|| format!("writing main config {}", path.display()))?;
    tracing::debug!("saved main config to {}", path.display());
    Ok(())
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?[-+])([^}]*))?\}")
        .expect("placeholder pattern is valid")
});

pub fn expand_env_placeholders(input: &str) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let op = caps.get(2).map_or("", |m| m.as_str());
            let val = caps.get(3).map_or("", |m| m.as_str());
            let var = env::var(var_name).ok();

            match (var.as_deref(), op) {
                (Some(v), _) if op.is_empty() => v.to_string(), // ${VAR}
                (Some(v), ":-") if !v.is_empty() => v.to_string(), // ${VAR:-default}
                (_, ":-") => val.to_string(),
                (Some(v), "-") => v.to_string(), // ${VAR-default}
                (None, "-") => val.to_string(),
                (Some(v), ":+") if !v.is_empty() => val.to_string(), // ${VAR:+alt}
                (Some(_), "+") => val.to_string(),                   // ${VAR+alt}
                _ => "".to_string(),
            }
        })
        .to_string()
}

pub fn preprocess_config(path: &Path) -> anyhow::Result<String> {
    let raw_data = fs::read_to_string(path)?;
    Ok(expand_env_placeholders(&raw_data))
}
