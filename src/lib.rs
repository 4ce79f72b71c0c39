//! Progressive Media - cache-aware, progressive image tier escalation.
//!
//! This crate decides which rendition of an image to show and when to fetch
//! a better one: it seeds from a shared membership cache, escalates from a
//! placeholder tier on visibility, confirms every upgrade with a detached
//! probe, and negotiates modern and universal encodings for the render layer.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the loading engine and its DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing platform adapters and configuration.
pub mod infrastructure;
/// Presentation layer containing markup rendering and CLI commands.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "progressive-media";
