//! Configuration for `init`

use learncard_core::LearnCardError;
use learncard_plugin::{ComposeOptions, DuplicatePolicy};
use learncard_std::StandardPlugin;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "LEARNCARD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),
}

impl From<ConfigError> for LearnCardError {
    fn from(err: ConfigError) -> Self {
        let subject = match &err {
            ConfigError::UnknownPlugin(name) => Some(name.clone()),
            _ => None,
        };
        let mut e = LearnCardError::config(err.to_string());
        if let Some(subject) = subject {
            e = e.with_subject(subject).with_suggestion(format!(
                "Known plugins: {}",
                StandardPlugin::ALL.map(StandardPlugin::key).join(", ")
            ));
        }
        e
    }
}

fn default_plugins() -> Vec<String> {
    StandardPlugin::ALL.iter().map(|p| p.key().to_string()).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What happens when a plugin name is added twice
    pub duplicate_policy: DuplicatePolicy,

    /// Holder DID for the identity plugin
    pub did: Option<String>,

    /// Standard plugins to install
    pub plugins: Vec<String>,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            did: None,
            plugins: default_plugins(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a `.json` file as JSON and anything else as TOML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_toml(&text),
        }
    }

    /// The file named by `LEARNCARD_CONFIG`, otherwise defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions { duplicate_policy: self.duplicate_policy }
    }

    /// Configured plugins in canonical order, duplicates dropped
    pub fn standard_plugins(&self) -> Result<Vec<StandardPlugin>, ConfigError> {
        let mut selected = Vec::with_capacity(self.plugins.len());
        for key in &self.plugins {
            let plugin = StandardPlugin::from_key(key)
                .ok_or_else(|| ConfigError::UnknownPlugin(key.clone()))?;
            selected.push(plugin);
        }
        Ok(StandardPlugin::ALL
            .into_iter()
            .filter(|p| selected.contains(p))
            .collect())
    }
}
