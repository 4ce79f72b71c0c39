//! Geometric viewport observer.
//!
//! The host reports where elements are laid out and which rectangle of the
//! page is currently visible; registrations whose element intersects the
//! viewport grown by their root margin are notified exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::domain::ports::{ElementId, ObservationHandle, VisibilityNotifier, VisibilityPort};

/// Axis-aligned rectangle in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width, zero for collapsed elements.
    pub width: u32,
    /// Height, zero for collapsed elements.
    pub height: u32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    const fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    const fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub const fn expand(&self, margin: u32) -> Self {
        Self {
            x: self.x - margin as i64,
            y: self.y - margin as i64,
            width: self.width.saturating_add(margin.saturating_mul(2)),
            height: self.height.saturating_add(margin.saturating_mul(2)),
        }
    }

    /// True if the rectangles overlap or touch edges.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

struct Registration {
    target: ElementId,
    root_margin_px: u32,
    notify: VisibilityNotifier,
}

#[derive(Default)]
struct ViewportState {
    viewport: Option<Rect>,
    bounds: HashMap<ElementId, Rect>,
    registrations: HashMap<u64, Registration>,
    next_id: u64,
}

impl ViewportState {
    fn take_intersecting(&mut self) -> Vec<VisibilityNotifier> {
        let Some(viewport) = self.viewport else {
            return Vec::new();
        };

        let ready: Vec<u64> = self
            .registrations
            .iter()
            .filter(|(_, reg)| {
                self.bounds
                    .get(&reg.target)
                    .is_some_and(|rect| viewport.expand(reg.root_margin_px).intersects(rect))
            })
            .map(|(id, _)| *id)
            .collect();

        ready
            .into_iter()
            .filter_map(|id| self.registrations.remove(&id))
            .map(|reg| {
                trace!(element = %reg.target, margin = reg.root_margin_px, "Element intersected");
                reg.notify
            })
            .collect()
    }
}

/// Single-shot visibility observer over host-reported geometry.
#[derive(Clone, Default)]
pub struct ViewportObserver {
    state: Arc<Mutex<ViewportState>>,
}

impl ViewportObserver {
    /// Creates an observer with no viewport and no elements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the visible rectangle (scroll, resize).
    pub fn set_viewport(&self, viewport: Rect) {
        let fired = {
            let mut state = self.state.lock();
            state.viewport = Some(viewport);
            state.take_intersecting()
        };
        Self::fire(fired);
    }

    /// Updates where an element is laid out.
    pub fn set_bounds(&self, target: ElementId, bounds: Rect) {
        let fired = {
            let mut state = self.state.lock();
            state.bounds.insert(target, bounds);
            state.take_intersecting()
        };
        Self::fire(fired);
    }

    /// Forgets an element's layout.
    pub fn remove_element(&self, target: ElementId) {
        self.state.lock().bounds.remove(&target);
    }

    /// Number of registrations still waiting for their first intersection.
    #[must_use]
    pub fn pending_registrations(&self) -> usize {
        self.state.lock().registrations.len()
    }

    fn fire(notifiers: Vec<VisibilityNotifier>) {
        for notify in notifiers {
            notify();
        }
    }

    fn disconnect(state: &Weak<Mutex<ViewportState>>, id: u64) {
        if let Some(state) = state.upgrade() {
            if state.lock().registrations.remove(&id).is_some() {
                trace!(registration = id, "Observation disconnected");
            }
        }
    }
}

impl std::fmt::Debug for ViewportObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ViewportObserver")
            .field("viewport", &state.viewport)
            .field("elements", &state.bounds.len())
            .field("registrations", &state.registrations.len())
            .finish()
    }
}

impl VisibilityPort for ViewportObserver {
    fn observe(
        &self,
        target: ElementId,
        root_margin_px: u32,
        notify: VisibilityNotifier,
    ) -> ObservationHandle {
        let (id, fired) = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.registrations.insert(
                id,
                Registration {
                    target,
                    root_margin_px,
                    notify,
                },
            );
            (id, state.take_intersecting())
        };
        Self::fire(fired);

        let weak = Arc::downgrade(&self.state);
        ObservationHandle::new(move || Self::disconnect(&weak, id))
    }
}
