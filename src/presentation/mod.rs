//! Presentation layer: markup rendering and command-line hosts.

/// Command implementations.
pub mod commands;
/// JSON image manifests.
pub mod manifest;
/// HTML output.
pub mod markup;

pub use commands::{run_batch, run_init_config, run_load, run_render};
pub use markup::render_markup;
