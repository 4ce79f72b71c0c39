//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{AppConfig, LogLevel, MediaConfig};
pub use args::{CliArgs, Command, RenderState};
pub use storage::{ConfigError, StorageManager};
