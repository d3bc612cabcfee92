//! Notifier configuration: destination + credential, loaded on every notify call.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::notifier::{EmptyTokenPolicy, NotifyOptions};

/// Environment variable overriding `[notifier] chat_id`.
pub const CHAT_ID_ENV: &str = "TOKRELAY_CHAT_ID";
/// Environment variable overriding `[notifier] token`.
pub const BOT_TOKEN_ENV: &str = "TOKRELAY_BOT_TOKEN";

/// Where and as whom notifications are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub chat_id: String,
    pub bot_token: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing notifier setting: {0}")]
    Missing(&'static str),
}

/// Supplies a [`NotifierConfig`]. Called at the start of every notify, before
/// any state is touched.
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> Result<NotifierConfig, ConfigError>;
}

impl<T: ConfigProvider + ?Sized> ConfigProvider for &T {
    fn load(&self) -> Result<NotifierConfig, ConfigError> {
        (**self).load()
    }
}

/// Fixed, in-memory configuration.
#[derive(Debug, Clone)]
pub struct StaticConfig(NotifierConfig);

impl StaticConfig {
    pub fn new(chat_id: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self(NotifierConfig {
            chat_id: chat_id.into(),
            bot_token: bot_token.into(),
        })
    }
}

impl ConfigProvider for StaticConfig {
    fn load(&self) -> Result<NotifierConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

// ─── Config file ──────────────────────────────────────────────────

/// On-disk TOML layout.
///
/// ```toml
/// [notifier]
/// chat_id = "-100123"
/// token = "123:abc"
/// api_base = "https://api.telegram.org"
///
/// [notify]
/// empty_tokens = "skip"
/// artifact_dir = "/var/tmp"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub notifier: NotifierSection,
    pub notify: NotifySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifierSection {
    pub chat_id: Option<String>,
    pub token: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    pub empty_tokens: Option<EmptyTokenPolicy>,
    pub artifact_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Read and parse `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Resolve destination and credential; non-empty overrides beat file values.
    pub fn notifier_config(
        &self,
        chat_id_override: Option<String>,
        token_override: Option<String>,
    ) -> Result<NotifierConfig, ConfigError> {
        let chat_id = non_empty(chat_id_override)
            .or_else(|| non_empty(self.notifier.chat_id.clone()))
            .ok_or(ConfigError::Missing("chat_id"))?;
        let bot_token = non_empty(token_override)
            .or_else(|| non_empty(self.notifier.token.clone()))
            .ok_or(ConfigError::Missing("token"))?;
        Ok(NotifierConfig { chat_id, bot_token })
    }

    pub fn notify_options(&self) -> NotifyOptions {
        let mut options = NotifyOptions::default();
        if let Some(policy) = self.notify.empty_tokens {
            options.empty_tokens = policy;
        }
        if let Some(dir) = &self.notify.artifact_dir {
            options.artifact_dir = dir.clone();
        }
        options
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Re-reads the TOML file on every [`load`](ConfigProvider::load), with
/// [`CHAT_ID_ENV`] / [`BOT_TOKEN_ENV`] taking precedence.
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn load(&self) -> Result<NotifierConfig, ConfigError> {
        ConfigFile::load(&self.path)?
            .notifier_config(std::env::var(CHAT_ID_ENV).ok(), std::env::var(BOT_TOKEN_ENV).ok())
    }
}
