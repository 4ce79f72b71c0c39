//! Command-line arguments.

use super::app_config::LogLevel;
use crate::application::dto::ViewContext;
use crate::domain::connection::ConnectionSpeed;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments. Global options override the config file.
#[derive(Debug, Parser)]
#[command(
    name = "progressive-media",
    version,
    about = "Progressive, cache-aware image tier escalation",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Membership cache capacity.
    #[arg(long, value_name = "URLS")]
    pub cache_capacity: Option<usize>,

    /// Visibility root margin in pixels.
    #[arg(long, value_name = "PX")]
    pub root_margin: Option<u32>,

    /// Effective connection type (slow-2g, 2g, 3g, 4g).
    #[arg(long, value_name = "TYPE")]
    pub connection: Option<ConnectionSpeed>,

    /// Probe request timeout in seconds; 0 waits indefinitely.
    #[arg(long, value_name = "SECS")]
    pub request_timeout: Option<u64>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the markup for one image in a given state.
    Render {
        /// Manifest describing the image.
        manifest: PathBuf,

        /// Display context.
        #[arg(long, value_enum)]
        context: Option<ViewContext>,

        /// Load state to render.
        #[arg(long, value_enum, default_value_t = RenderState::Placeholder)]
        state: RenderState,
    },

    /// Mount one image against the network and print each transition.
    Load {
        /// Manifest describing the image.
        manifest: PathBuf,

        /// Escalate at mount instead of on visibility.
        #[arg(long)]
        eager: bool,

        /// Scroll the image into view after this many milliseconds.
        #[arg(long, value_name = "MS")]
        visible_after_ms: Option<u64>,

        /// Give up waiting after this many seconds.
        #[arg(long, value_name = "SECS", default_value_t = 30)]
        deadline: u64,
    },

    /// Mount several images sharing one cache and report its statistics.
    Batch {
        /// Manifests, each holding one image or a list.
        #[arg(required = true)]
        manifests: Vec<PathBuf>,

        /// Give up waiting after this many seconds.
        #[arg(long, value_name = "SECS", default_value_t = 30)]
        deadline: u64,
    },

    /// Write the effective configuration to the config directory.
    InitConfig,
}

/// Load state the `render` command simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderState {
    /// Blurred placeholder before escalation.
    Placeholder,
    /// Target tier shown after a probe.
    Loaded,
    /// Target tier already known when mounted.
    Cached,
    /// Escalation failed.
    Failed,
}
