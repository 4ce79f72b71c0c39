//! Media platform adapters.
//!
//! This module provides:
//! - The shared LRU membership cache
//! - An HTTP image probe
//! - A geometric viewport observer
//! - Static connection hints

pub mod http_probe;
pub mod membership_cache;
pub mod network_hint;
pub mod viewport;

pub use http_probe::{HttpImageProbe, HttpProbeConfig, natural_dimensions};
pub use membership_cache::{DEFAULT_CACHE_CAPACITY, MembershipCache, MembershipStats};
pub use network_hint::StaticConnectionHint;
pub use viewport::{Rect, ViewportObserver};
