//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::services::SchedulerConfig;
use crate::domain::connection::ConnectionSpeed;
use crate::infrastructure::media::{DEFAULT_CACHE_CAPACITY, HttpProbeConfig};

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, from file and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Loading engine configuration.
    #[serde(default)]
    pub media: MediaConfig,
}

/// `[media]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// URLs remembered by the shared membership cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Visibility margin on normal connections.
    #[serde(default = "default_root_margin")]
    pub root_margin_px: u32,

    /// Visibility margin on `slow-2g` and `2g`.
    #[serde(default = "default_slow_root_margin")]
    pub slow_root_margin_px: u32,

    /// Fixed connection type; unknown when absent.
    #[serde(default)]
    pub connection: Option<ConnectionSpeed>,

    /// Probe request timeout. Zero waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: u64,

    /// User agent for probe requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_root_margin() -> u32 {
    SchedulerConfig::default().root_margin_px
}

fn default_slow_root_margin() -> u32 {
    SchedulerConfig::default().slow_root_margin_px
}

fn default_user_agent() -> String {
    HttpProbeConfig::default().user_agent
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            root_margin_px: default_root_margin(),
            slow_root_margin_px: default_slow_root_margin(),
            connection: None,
            request_timeout_secs: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl MediaConfig {
    /// Scheduler margins.
    #[must_use]
    pub const fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            root_margin_px: self.root_margin_px,
            slow_root_margin_px: self.slow_root_margin_px,
        }
    }

    /// HTTP probe settings.
    #[must_use]
    pub fn probe_config(&self) -> HttpProbeConfig {
        HttpProbeConfig {
            timeout_secs: self.request_timeout_secs,
            user_agent: self.user_agent.clone(),
            completed_capacity: self.cache_capacity,
        }
    }
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(capacity) = args.cache_capacity {
            self.media.cache_capacity = capacity;
        }
        if let Some(margin) = args.root_margin {
            self.media.root_margin_px = margin;
        }
        if let Some(connection) = args.connection {
            self.media.connection = Some(connection);
        }
        if let Some(timeout) = args.request_timeout {
            self.media.request_timeout_secs = timeout;
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            media: MediaConfig::default(),
        }
    }
}
