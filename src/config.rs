//! Configuration parsing and list file resolution

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::policy::DecisionLogging;

pub const DEFAULT_BLACKLIST: &str = "blacklist";
pub const DEFAULT_WHITELIST: &str = "whitelist";
pub const DEFAULT_USERLIST: &str = "userlist";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Rule and user list files
    #[serde(default)]
    pub lists: ListsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Paths of the list files and the fallback verdict
///
/// An empty path disables that list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListsConfig {
    /// Schedule rules that deny matching hosts
    #[serde(default = "default_blacklist")]
    pub blacklist: String,

    /// Schedule rules that allow matching hosts
    #[serde(default = "default_whitelist")]
    pub whitelist: String,

    /// `user:password` lines for proxy authentication
    #[serde(default = "default_userlist")]
    pub userlist: String,

    /// Verdict when no rule matches and both or neither lists are present
    #[serde(default = "default_true")]
    pub default_allow: bool,
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            blacklist: default_blacklist(),
            whitelist: default_whitelist(),
            userlist: default_userlist(),
            default_allow: true,
        }
    }
}

fn default_blacklist() -> String {
    DEFAULT_BLACKLIST.to_string()
}

fn default_whitelist() -> String {
    DEFAULT_WHITELIST.to_string()
}

fn default_userlist() -> String {
    DEFAULT_USERLIST.to_string()
}

fn default_true() -> bool {
    true
}

/// List files that exist and will be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLists {
    pub blacklist: Option<PathBuf>,
    pub whitelist: Option<PathBuf>,
    pub userlist: Option<PathBuf>,
    pub default_allow: bool,
}

impl ListsConfig {
    /// Decide which list files to load.
    ///
    /// A list left at its default file name is skipped when that file does
    /// not exist. A path that was set explicitly must exist.
    pub fn resolve(&self) -> Result<ResolvedLists> {
        Ok(ResolvedLists {
            blacklist: resolve_list("blacklist", &self.blacklist, DEFAULT_BLACKLIST)?,
            whitelist: resolve_list("whitelist", &self.whitelist, DEFAULT_WHITELIST)?,
            userlist: resolve_list("userlist", &self.userlist, DEFAULT_USERLIST)?,
            default_allow: self.default_allow,
        })
    }
}

fn resolve_list(kind: &str, value: &str, default_name: &str) -> Result<Option<PathBuf>> {
    if value.is_empty() {
        tracing::info!("No {} file specified", kind);
        return Ok(None);
    }

    let path = Path::new(value);
    if path.is_file() {
        return Ok(Some(path.to_path_buf()));
    }

    if value == default_name {
        tracing::info!(path = %value, "Default {} file doesn't exist, not loading", kind);
        Ok(None)
    } else {
        Err(Error::config(format!(
            "{} file '{}' can't be read",
            kind,
            path.display()
        )))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Which access decisions are logged
    #[serde(default)]
    pub log_requests: LogRequests,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_requests: LogRequests::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `log_requests = false`, or `log_requests = { blocked = false }` to pick
/// one verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LogRequests {
    Every(bool),
    ByVerdict {
        #[serde(default = "default_true")]
        allowed: bool,
        #[serde(default = "default_true")]
        blocked: bool,
    },
}

impl Default for LogRequests {
    fn default() -> Self {
        LogRequests::Every(true)
    }
}

impl From<LogRequests> for DecisionLogging {
    fn from(value: LogRequests) -> Self {
        match value {
            LogRequests::Every(all) => DecisionLogging {
                allowed: all,
                blocked: all,
            },
            LogRequests::ByVerdict { allowed, blocked } => DecisionLogging { allowed, blocked },
        }
    }
}

impl LoggingConfig {
    pub fn decisions(&self) -> DecisionLogging {
        self.log_requests.into()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Invalid TOML: {}", e)))
    }
}
