//! Port definition for network-speed hints.

use crate::domain::connection::ConnectionSpeed;

/// Source of the current effective connection type.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionHintPort: Send + Sync {
    /// Returns the best current guess, `Unknown` when unavailable.
    fn connection_speed(&self) -> ConnectionSpeed;
}
