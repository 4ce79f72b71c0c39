//! Port definition for viewport proximity detection.

/// Host handle of a rendered container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Called at most once, on the first intersection.
pub type VisibilityNotifier = Box<dyn FnOnce() + Send>;

/// Live observation. Dropping it disconnects the observation.
pub struct ObservationHandle {
    disconnect: Option<Box<dyn FnOnce() + Send>>,
}

impl ObservationHandle {
    /// Wraps the adapter-specific disconnect action.
    #[must_use]
    pub fn new(disconnect: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disconnect: Some(Box::new(disconnect)),
        }
    }

    /// Stops observing. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for ObservationHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for ObservationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationHandle")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

/// Port for single-shot "is this element near the viewport" notifications.
pub trait VisibilityPort: Send + Sync {
    /// Observes `target`, treating the viewport as grown by `root_margin_px`
    /// on every side. `notify` runs once on first intersection.
    fn observe(
        &self,
        target: ElementId,
        root_margin_px: u32,
        notify: VisibilityNotifier,
    ) -> ObservationHandle;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[derive(Default)]
    struct Registrations {
        next_id: u64,
        live: HashMap<u64, (ElementId, u32, VisibilityNotifier)>,
        observe_calls: usize,
    }

    /// Visibility port driven by explicit `reveal` calls.
    #[derive(Default, Clone)]
    pub struct ManualVisibility {
        inner: Arc<Mutex<Registrations>>,
    }

    impl ManualVisibility {
        /// Creates an empty port.
        pub fn new() -> Self {
            Self::default()
        }

        /// Fires every live registration for `target`. Returns how many fired.
        pub fn reveal(&self, target: ElementId) -> usize {
            let fired: Vec<VisibilityNotifier> = {
                let mut inner = self.inner.lock();
                let ids: Vec<u64> = inner
                    .live
                    .iter()
                    .filter(|(_, (t, _, _))| *t == target)
                    .map(|(id, _)| *id)
                    .collect();
                ids.into_iter()
                    .filter_map(|id| inner.live.remove(&id))
                    .map(|(_, _, notify)| notify)
                    .collect()
            };
            let count = fired.len();
            for notify in fired {
                notify();
            }
            count
        }

        /// Number of observations that are still connected.
        pub fn live_count(&self) -> usize {
            self.inner.lock().live.len()
        }

        /// Total number of `observe` calls.
        pub fn observe_calls(&self) -> usize {
            self.inner.lock().observe_calls
        }

        /// Root margin of the live registration for `target`.
        pub fn margin_for(&self, target: ElementId) -> Option<u32> {
            self.inner
                .lock()
                .live
                .values()
                .find(|(t, _, _)| *t == target)
                .map(|(_, margin, _)| *margin)
        }
    }

    impl VisibilityPort for ManualVisibility {
        fn observe(
            &self,
            target: ElementId,
            root_margin_px: u32,
            notify: VisibilityNotifier,
        ) -> ObservationHandle {
            let id = {
                let mut inner = self.inner.lock();
                inner.observe_calls += 1;
                inner.next_id += 1;
                let id = inner.next_id;
                inner.live.insert(id, (target, root_margin_px, notify));
                id
            };
            let inner = Arc::clone(&self.inner);
            ObservationHandle::new(move || {
                inner.lock().live.remove(&id);
            })
        }
    }
}
