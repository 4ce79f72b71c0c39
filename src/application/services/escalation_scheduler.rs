//! Decides when an instance starts fetching its target tier.

use std::sync::Arc;

use tracing::trace;

use crate::domain::ports::ConnectionHintPort;

/// Root margin used on normal connections.
pub const DEFAULT_ROOT_MARGIN_PX: u32 = 300;

/// Root margin used on `slow-2g`/`2g` connections.
pub const SLOW_ROOT_MARGIN_PX: u32 = 100;

/// Margins the scheduler chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Margin on normal connections.
    pub root_margin_px: u32,
    /// Margin on slow connections.
    pub slow_root_margin_px: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            root_margin_px: DEFAULT_ROOT_MARGIN_PX,
            slow_root_margin_px: SLOW_ROOT_MARGIN_PX,
        }
    }
}

/// When escalation should begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationTrigger {
    /// Start at mount; no observation is created.
    Immediate,
    /// Start when the container comes within `root_margin_px` of the viewport.
    OnVisible {
        /// Distance around the viewport that counts as visible.
        root_margin_px: u32,
    },
}

/// Connection-aware escalation scheduler.
#[derive(Clone)]
pub struct EscalationScheduler {
    config: SchedulerConfig,
    hint: Arc<dyn ConnectionHintPort>,
}

impl EscalationScheduler {
    /// Creates a scheduler reading speed from `hint`.
    #[must_use]
    pub fn new(config: SchedulerConfig, hint: Arc<dyn ConnectionHintPort>) -> Self {
        Self { config, hint }
    }

    /// Root margin for the current connection.
    #[must_use]
    pub fn root_margin(&self) -> u32 {
        let speed = self.hint.connection_speed();
        let margin = if speed.is_slow() {
            self.config.slow_root_margin_px
        } else {
            self.config.root_margin_px
        };
        trace!(speed = %speed, margin, "Chose root margin");
        margin
    }

    /// Plans escalation for an instance with the given priority hint.
    #[must_use]
    pub fn plan(&self, eager: bool) -> EscalationTrigger {
        if eager {
            return EscalationTrigger::Immediate;
        }
        EscalationTrigger::OnVisible {
            root_margin_px: self.root_margin(),
        }
    }
}

impl std::fmt::Debug for EscalationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
