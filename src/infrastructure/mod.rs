//! Infrastructure layer with platform adapters and configuration.

/// Application configuration.
pub mod config;
/// Network, viewport and cache adapters for the loading engine.
pub mod media;

pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use media::{HttpImageProbe, MembershipCache, StaticConnectionHint, ViewportObserver};
