//! Progressive image loading orchestrator.
//!
//! A [`ProgressiveLoader`] holds the shared collaborators (membership cache,
//! probe, visibility and connection ports). Every image-bearing view mounts a
//! [`ProgressiveImage`] from it. Instances are single-threaded: platform
//! callbacks arrive as messages on the instance's own channel and are applied
//! one at a time through the load state transition table.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::escalation_scheduler::{EscalationScheduler, EscalationTrigger};
use super::probe::Probe;
use super::source_negotiator::build_render_plan;
use crate::application::dto::{ImageProps, RenderPlan};
use crate::domain::entities::{ImageId, ImageSourceSet, LoadPhase, LoadState};
use crate::domain::errors::{ProbeError, TransitionError};
use crate::domain::ports::{
    ElementId, ImageProbePort, MembershipCachePort, ObservationHandle, ProbedImage, VisibilityPort,
};

/// An image element that finished loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedElement {
    /// Source that loaded.
    pub src: String,
    /// Decoded width in pixels.
    pub natural_width: u32,
    /// Decoded height in pixels.
    pub natural_height: u32,
}

impl RenderedElement {
    /// Creates an element description.
    #[must_use]
    pub fn new(src: impl Into<String>, natural_width: u32, natural_height: u32) -> Self {
        Self {
            src: src.into(),
            natural_width,
            natural_height,
        }
    }
}

impl From<ProbedImage> for RenderedElement {
    fn from(image: ProbedImage) -> Self {
        Self {
            src: image.url,
            natural_width: image.natural_width,
            natural_height: image.natural_height,
        }
    }
}

/// A failed escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// URL that could not be confirmed.
    pub url: String,
    /// Why.
    pub error: ProbeError,
}

type LoadHandler = Box<dyn FnMut(&RenderedElement)>;
type ErrorHandler = Box<dyn FnMut(&LoadFailure)>;

/// Consumer callbacks of one instance.
#[derive(Default)]
pub struct LoadCallbacks {
    on_load: Option<LoadHandler>,
    on_error: Option<ErrorHandler>,
}

impl LoadCallbacks {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per final-tier render.
    #[must_use]
    pub fn on_load(mut self, handler: impl FnMut(&RenderedElement) + 'static) -> Self {
        self.on_load = Some(Box::new(handler));
        self
    }

    /// Called when an escalation probe fails.
    #[must_use]
    pub fn on_error(mut self, handler: impl FnMut(&LoadFailure) + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }
}

impl std::fmt::Debug for LoadCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadCallbacks")
            .field("on_load", &self.on_load.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Why a probe was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbePurpose {
    /// Visibility or eager escalation; failure is reported.
    Escalation,
    /// Upgrade after the placeholder loaded natively; failure is silent.
    NativeUpgrade,
}

/// Identifies the seed and the probe an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    generation: u64,
    probe_id: u64,
}

#[derive(Debug)]
enum LoaderEvent {
    Visible {
        generation: u64,
    },
    ProbeSettled {
        ticket: Ticket,
        purpose: ProbePurpose,
        url: String,
        outcome: Result<ProbedImage, ProbeError>,
    },
}

struct LoaderShared {
    cache: Arc<dyn MembershipCachePort>,
    probe: Arc<dyn ImageProbePort>,
    visibility: Arc<dyn VisibilityPort>,
    scheduler: EscalationScheduler,
}

/// Factory for progressive image instances sharing one set of collaborators.
#[derive(Clone)]
pub struct ProgressiveLoader {
    shared: Arc<LoaderShared>,
}

impl ProgressiveLoader {
    /// Creates a loader from its collaborators.
    #[must_use]
    pub fn new(
        cache: Arc<dyn MembershipCachePort>,
        probe: Arc<dyn ImageProbePort>,
        visibility: Arc<dyn VisibilityPort>,
        scheduler: EscalationScheduler,
    ) -> Self {
        Self {
            shared: Arc::new(LoaderShared {
                cache,
                probe,
                visibility,
                scheduler,
            }),
        }
    }

    /// Mounts an instance rendering into `target`. Seeding happens here, so
    /// the returned instance already holds its first render state.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn mount(
        &self,
        target: ElementId,
        props: ImageProps,
        callbacks: LoadCallbacks,
    ) -> ProgressiveImage {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut image = ProgressiveImage {
            id: ImageId::from_url(&props.sources.original_url),
            target,
            state: LoadState::seeding(props.sources.placeholder_url()),
            props,
            generation: 0,
            next_probe_id: 0,
            active_probe: None,
            observation: None,
            shown: HashSet::new(),
            load_notified: false,
            callbacks,
            shared: Arc::clone(&self.shared),
            events_tx,
            events_rx,
        };
        image.seed();
        image
    }
}

impl std::fmt::Debug for ProgressiveLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveLoader")
            .field("scheduler", &self.shared.scheduler)
            .field("cached_urls", &self.shared.cache.len())
            .finish_non_exhaustive()
    }
}

/// One mounted progressive image.
///
/// Dropping the instance (or calling [`ProgressiveImage::unmount`]) detaches
/// every callback, cancels the in-flight probe and disconnects the
/// visibility observation.
pub struct ProgressiveImage {
    id: ImageId,
    target: ElementId,
    props: ImageProps,
    state: LoadState,
    generation: u64,
    next_probe_id: u64,
    active_probe: Option<(u64, Probe)>,
    observation: Option<ObservationHandle>,
    shown: HashSet<String>,
    load_notified: bool,
    callbacks: LoadCallbacks,
    shared: Arc<LoaderShared>,
    events_tx: mpsc::UnboundedSender<LoaderEvent>,
    events_rx: mpsc::UnboundedReceiver<LoaderEvent>,
}

impl ProgressiveImage {
    /// Identifier used in log fields.
    #[must_use]
    pub fn id(&self) -> &ImageId {
        &self.id
    }

    /// Container this instance renders into.
    #[must_use]
    pub const fn target(&self) -> ElementId {
        self.target
    }

    /// Current load state.
    #[must_use]
    pub const fn state(&self) -> &LoadState {
        &self.state
    }

    /// Current props.
    #[must_use]
    pub const fn props(&self) -> &ImageProps {
        &self.props
    }

    /// True while a visibility observation is connected.
    #[must_use]
    pub const fn is_observing(&self) -> bool {
        self.observation.is_some()
    }

    /// True while a probe is in flight.
    #[must_use]
    pub fn has_pending_probe(&self) -> bool {
        self.active_probe
            .as_ref()
            .is_some_and(|(_, probe)| probe.is_pending())
    }

    /// What the render layer should draw right now.
    #[must_use]
    pub fn render_plan(&self) -> RenderPlan {
        build_render_plan(&self.props, &self.state)
    }

    /// Replaces the source set. An identical set is ignored; anything else
    /// cancels outstanding work and seeds again.
    pub fn replace_sources(&mut self, sources: ImageSourceSet) {
        if sources == self.props.sources {
            return;
        }
        debug!(id = %self.id, "Source set replaced, re-seeding");
        self.props.sources = sources;
        self.id = ImageId::from_url(&self.props.sources.original_url);
        self.seed();
    }

    /// Waits for the next platform message and applies it.
    ///
    /// Pends forever once nothing is outstanding; hosts select over it.
    pub async fn next_event(&mut self) -> &LoadState {
        if let Some(event) = self.events_rx.recv().await {
            self.dispatch(event);
        }
        &self.state
    }

    /// Applies every message that is already queued. Returns how many.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    /// The rendered element finished loading `element.src`.
    pub fn handle_native_load(&mut self, element: &RenderedElement) {
        if element.src != self.state.current_src() {
            trace!(id = %self.id, src = %element.src, "Ignoring native load of replaced source");
            return;
        }
        self.shown.insert(element.src.clone());

        match self.state.phase() {
            LoadPhase::CachedReady | LoadPhase::Upgraded | LoadPhase::Settled => {
                self.notify_load(element);
            }
            LoadPhase::PlaceholderShown => self.upgrade_after_native_load(element),
            LoadPhase::Probing | LoadPhase::Failed | LoadPhase::Seeding => {
                trace!(id = %self.id, phase = %self.state.phase(), "Native load needs no action");
            }
        }
    }

    /// The rendered element failed to load `src`.
    pub fn handle_native_error(&mut self, src: &str) {
        if src != self.state.current_src() {
            return;
        }
        warn!(id = %self.id, src = %src, "Rendered element failed to load");
        self.state.flag_error();
    }

    /// Tears the instance down. Equivalent to dropping it.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn seed(&mut self) {
        self.cancel_outstanding();
        self.generation += 1;
        self.load_notified = false;

        let sources = &self.props.sources;
        let target_url = sources.target_url().to_string();
        self.state = LoadState::seeding(sources.placeholder_url());

        let known_good = self.shown.contains(&target_url)
            || self.shared.cache.has(&target_url)
            || self.shared.probe.is_complete(&target_url);

        if known_good {
            self.apply(|state| state.seed_cached(target_url.clone()));
            self.shown.insert(target_url);
            debug!(id = %self.id, src = %self.state.current_src(), "Seeded from known-good tier");
            return;
        }

        self.apply(LoadState::show_placeholder);
        debug!(id = %self.id, src = %self.state.current_src(), "Seeded with placeholder");

        match self.shared.scheduler.plan(self.props.eager) {
            EscalationTrigger::Immediate => self.escalate(),
            EscalationTrigger::OnVisible { root_margin_px } => {
                let tx = self.events_tx.clone();
                let generation = self.generation;
                let handle = self.shared.visibility.observe(
                    self.target,
                    root_margin_px,
                    Box::new(move || {
                        let _ = tx.send(LoaderEvent::Visible { generation });
                    }),
                );
                trace!(id = %self.id, element = %self.target, root_margin_px, "Observing visibility");
                self.observation = Some(handle);
            }
        }
    }

    fn escalate(&mut self) {
        if !self.state.phase().awaits_escalation() {
            return;
        }
        self.disconnect_observation();
        if self.apply(LoadState::begin_probe) {
            self.start_probe(ProbePurpose::Escalation);
        }
    }

    fn upgrade_after_native_load(&mut self, element: &RenderedElement) {
        self.disconnect_observation();
        let target_url = self.props.sources.target_url().to_string();

        if self.props.sources.placeholder_is_target() {
            if self.apply(|state| state.upgrade(target_url, false)) {
                self.notify_load(element);
            }
            return;
        }

        if self.shared.cache.has(&target_url) {
            self.shown.insert(target_url.clone());
            self.apply(|state| state.upgrade(target_url, true));
            return;
        }

        if self.apply(LoadState::begin_probe) {
            self.start_probe(ProbePurpose::NativeUpgrade);
        }
    }

    fn start_probe(&mut self, purpose: ProbePurpose) {
        self.cancel_probe();
        self.next_probe_id += 1;

        let ticket = Ticket {
            generation: self.generation,
            probe_id: self.next_probe_id,
        };
        let url = self.props.sources.target_url().to_string();
        let tx = self.events_tx.clone();
        let event_url = url.clone();

        debug!(id = %self.id, url = %url, ?purpose, "Starting probe");
        let probe = Probe::start(
            Arc::clone(&self.shared.probe),
            url,
            Box::new(move |outcome| {
                let _ = tx.send(LoaderEvent::ProbeSettled {
                    ticket,
                    purpose,
                    url: event_url,
                    outcome,
                });
            }),
        );
        self.active_probe = Some((ticket.probe_id, probe));
    }

    fn dispatch(&mut self, event: LoaderEvent) {
        match event {
            LoaderEvent::Visible { generation } => {
                if generation != self.generation {
                    trace!(id = %self.id, "Dropping stale visibility event");
                    return;
                }
                self.escalate();
            }
            LoaderEvent::ProbeSettled {
                ticket,
                purpose,
                url,
                outcome,
            } => {
                let current = self.active_probe.as_ref().map(|(id, _)| *id);
                if ticket.generation != self.generation || current != Some(ticket.probe_id) {
                    trace!(id = %self.id, url = %url, "Dropping stale probe outcome");
                    return;
                }
                self.active_probe = None;
                self.probe_settled(purpose, url, outcome);
            }
        }
    }

    fn probe_settled(
        &mut self,
        purpose: ProbePurpose,
        url: String,
        outcome: Result<ProbedImage, ProbeError>,
    ) {
        match (outcome, purpose) {
            (Ok(image), _) => {
                self.shared.cache.add(&url);
                self.shown.insert(url.clone());
                if self.apply(|state| state.upgrade(url, false)) {
                    debug!(id = %self.id, src = %self.state.current_src(), "Upgraded to target tier");
                    self.notify_load(&RenderedElement::from(image));
                }
            }
            (Err(error), ProbePurpose::Escalation) => {
                warn!(id = %self.id, url = %url, error = %error, "Escalation probe failed");
                if self.apply(LoadState::fail) {
                    if let Some(on_error) = self.callbacks.on_error.as_mut() {
                        on_error(&LoadFailure { url, error });
                    }
                }
            }
            (Err(error), ProbePurpose::NativeUpgrade) => {
                debug!(id = %self.id, url = %url, error = %error, "Background upgrade failed, keeping placeholder");
                if self.apply(LoadState::settle) {
                    let element = RenderedElement::new(self.state.current_src(), 0, 0);
                    self.notify_load(&element);
                }
            }
        }
    }

    fn notify_load(&mut self, element: &RenderedElement) {
        if self.load_notified {
            return;
        }
        self.load_notified = true;
        if let Some(on_load) = self.callbacks.on_load.as_mut() {
            on_load(element);
        }
    }

    fn apply(&mut self, transition: impl FnOnce(&mut LoadState) -> Result<(), TransitionError>) -> bool {
        let from = self.state.phase();
        match transition(&mut self.state) {
            Ok(()) => {
                debug!(id = %self.id, %from, to = %self.state.phase(), "Load transition");
                true
            }
            Err(e) => {
                warn!(id = %self.id, error = %e, "Rejected load transition");
                false
            }
        }
    }

    fn disconnect_observation(&mut self) {
        if let Some(mut handle) = self.observation.take() {
            handle.disconnect();
        }
    }

    fn cancel_probe(&mut self) {
        if let Some((_, mut probe)) = self.active_probe.take() {
            probe.cancel();
        }
    }

    fn cancel_outstanding(&mut self) {
        self.cancel_probe();
        self.disconnect_observation();
    }

    fn teardown(&mut self) {
        self.callbacks = LoadCallbacks::default();
        self.cancel_outstanding();
        self.generation += 1;
    }
}

impl Drop for ProgressiveImage {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for ProgressiveImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveImage")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("state", &self.state)
            .field("observing", &self.observation.is_some())
            .field("probing", &self.active_probe.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::escalation_scheduler::SchedulerConfig;
    use crate::domain::entities::Tier;
    use crate::domain::ports::mocks::{ManualVisibility, MockImageProbe};
    use crate::infrastructure::media::{MembershipCache, StaticConnectionHint};

    fn loader() -> ProgressiveLoader {
        ProgressiveLoader::new(
            Arc::new(MembershipCache::new(8)),
            Arc::new(MockImageProbe::new()),
            Arc::new(ManualVisibility::new()),
            EscalationScheduler::new(
                SchedulerConfig::default(),
                Arc::new(StaticConnectionHint::default()),
            ),
        )
    }

    fn props() -> ImageProps {
        let sources = ImageSourceSet::new("o.jpg")
            .with_tier(Tier::Thumbnail, "a.jpg")
            .with_tier(Tier::Small, "b.jpg");
        ImageProps::new(sources, "x")
    }

    fn settled(ticket: Ticket) -> LoaderEvent {
        LoaderEvent::ProbeSettled {
            ticket,
            purpose: ProbePurpose::Escalation,
            url: "b.jpg".to_string(),
            outcome: Ok(ProbedImage {
                url: "b.jpg".to_string(),
                natural_width: 800,
                natural_height: 600,
            }),
        }
    }

    #[tokio::test]
    async fn test_outcome_from_previous_generation_is_dropped() {
        let mut image = loader().mount(ElementId(1), props().eager(true), LoadCallbacks::new());
        let stale = Ticket {
            generation: image.generation - 1,
            probe_id: image.next_probe_id,
        };

        image.events_tx.send(settled(stale)).unwrap();
        image.drain_pending();

        assert_eq!(image.state().phase(), LoadPhase::Probing);
        assert!(!image.shared.cache.has("b.jpg"));
    }

    #[tokio::test]
    async fn test_outcome_from_superseded_probe_is_dropped() {
        let mut image = loader().mount(ElementId(1), props().eager(true), LoadCallbacks::new());
        let superseded = Ticket {
            generation: image.generation,
            probe_id: image.next_probe_id + 1,
        };

        image.events_tx.send(settled(superseded)).unwrap();
        image.drain_pending();

        assert_eq!(image.state().phase(), LoadPhase::Probing);
        assert!(image.active_probe.is_some());
    }

    #[tokio::test]
    async fn test_visibility_from_previous_generation_is_dropped() {
        let mut image = loader().mount(ElementId(1), props(), LoadCallbacks::new());

        image
            .events_tx
            .send(LoaderEvent::Visible {
                generation: image.generation + 1,
            })
            .unwrap();
        image.drain_pending();

        assert_eq!(image.state().phase(), LoadPhase::PlaceholderShown);
        assert!(image.is_observing());
    }
}
