//! Connection hints that do not come from a live platform signal.

use crate::domain::connection::ConnectionSpeed;
use crate::domain::ports::ConnectionHintPort;

/// Connection hint fixed at construction, fed from configuration or flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticConnectionHint {
    speed: ConnectionSpeed,
}

impl StaticConnectionHint {
    /// Creates a hint that always reports `speed`.
    #[must_use]
    pub const fn new(speed: ConnectionSpeed) -> Self {
        Self { speed }
    }

    /// Creates a hint from an optional configured value.
    #[must_use]
    pub fn from_config(speed: Option<ConnectionSpeed>) -> Self {
        Self::new(speed.unwrap_or_default())
    }
}

impl ConnectionHintPort for StaticConnectionHint {
    fn connection_speed(&self) -> ConnectionSpeed {
        self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_unknown() {
        let hint = StaticConnectionHint::from_config(None);
        assert_eq!(hint.connection_speed(), ConnectionSpeed::Unknown);
    }

    #[test]
    fn test_configured_speed_is_reported() {
        let hint = StaticConnectionHint::from_config(Some(ConnectionSpeed::TwoG));
        assert!(hint.connection_speed().is_slow());
    }
}
