//! Per-instance load state and its transition table.

use crate::domain::errors::TransitionError;

/// Lifecycle phase of one progressive image instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum LoadPhase {
    /// Initial tier not yet decided.
    #[default]
    Seeding,
    /// Target tier was already known-good at seed time.
    CachedReady,
    /// Placeholder tier rendered, waiting for visibility or native load.
    PlaceholderShown,
    /// A probe for the target tier is in flight.
    Probing,
    /// Target tier confirmed and rendered.
    Upgraded,
    /// Background upgrade failed; the placeholder tier is final.
    Settled,
    /// Escalation probe failed.
    Failed,
}

impl LoadPhase {
    /// Transition table. Anything not listed is illegal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::CachedReady | Self::PlaceholderShown)
                | (Self::PlaceholderShown, Self::Probing | Self::Upgraded)
                | (Self::Probing, Self::Upgraded | Self::Settled | Self::Failed)
        )
    }

    /// True once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::CachedReady | Self::Upgraded | Self::Settled | Self::Failed
        )
    }

    /// True while visibility may still trigger escalation.
    #[must_use]
    pub const fn awaits_escalation(self) -> bool {
        matches!(self, Self::PlaceholderShown)
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Seeding => "seeding",
            Self::CachedReady => "cached-ready",
            Self::PlaceholderShown => "placeholder",
            Self::Probing => "probing",
            Self::Upgraded => "upgraded",
            Self::Settled => "settled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the render layer needs to know about one instance.
///
/// Fields are only changed through the named transitions below, which
/// consult [`LoadPhase::can_transition_to`]. `is_loaded` never goes back to
/// `false`; a new source set gets a new `LoadState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadState {
    current_src: String,
    is_loaded: bool,
    skip_transition: bool,
    is_error: bool,
    phase: LoadPhase,
}

impl LoadState {
    /// Fresh state pointing at the placeholder URL.
    #[must_use]
    pub fn seeding(placeholder_url: impl Into<String>) -> Self {
        Self {
            current_src: placeholder_url.into(),
            is_loaded: false,
            skip_transition: false,
            is_error: false,
            phase: LoadPhase::Seeding,
        }
    }

    /// URL currently assigned to the rendered element.
    #[must_use]
    pub fn current_src(&self) -> &str {
        &self.current_src
    }

    /// Whether the final tier for this source set is on screen.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Render hint: suppress fade/blur.
    #[must_use]
    pub const fn skip_transition(&self) -> bool {
        self.skip_transition
    }

    /// Whether a fetch for this instance has failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    fn advance(&mut self, next: LoadPhase) -> Result<(), TransitionError> {
        if !self.phase.can_transition_to(next) {
            return Err(TransitionError::new(self.phase, next));
        }
        self.phase = next;
        Ok(())
    }

    /// `Seeding -> CachedReady`: render `url` immediately without fade.
    ///
    /// # Errors
    /// Returns `TransitionError` unless the state is still seeding.
    pub fn seed_cached(&mut self, url: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(LoadPhase::CachedReady)?;
        self.current_src = url.into();
        self.is_loaded = true;
        self.skip_transition = true;
        Ok(())
    }

    /// `Seeding -> PlaceholderShown`.
    ///
    /// # Errors
    /// Returns `TransitionError` unless the state is still seeding.
    pub fn show_placeholder(&mut self) -> Result<(), TransitionError> {
        self.advance(LoadPhase::PlaceholderShown)
    }

    /// `PlaceholderShown -> Probing`.
    ///
    /// # Errors
    /// Returns `TransitionError` if escalation already started or finished.
    pub fn begin_probe(&mut self) -> Result<(), TransitionError> {
        self.advance(LoadPhase::Probing)
    }

    /// `PlaceholderShown | Probing -> Upgraded`.
    ///
    /// # Errors
    /// Returns `TransitionError` from any terminal phase.
    pub fn upgrade(
        &mut self,
        url: impl Into<String>,
        skip_transition: bool,
    ) -> Result<(), TransitionError> {
        self.advance(LoadPhase::Upgraded)?;
        self.current_src = url.into();
        self.is_loaded = true;
        self.skip_transition = skip_transition;
        Ok(())
    }

    /// `Probing -> Settled`: keep the placeholder as the final tier.
    ///
    /// # Errors
    /// Returns `TransitionError` unless a probe is in flight.
    pub fn settle(&mut self) -> Result<(), TransitionError> {
        self.advance(LoadPhase::Settled)?;
        self.is_loaded = true;
        Ok(())
    }

    /// `Probing -> Failed`. `current_src` is left untouched.
    ///
    /// # Errors
    /// Returns `TransitionError` unless a probe is in flight.
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.advance(LoadPhase::Failed)?;
        self.is_loaded = true;
        self.is_error = true;
        Ok(())
    }

    /// Flags a broken rendered element without changing phase.
    pub fn flag_error(&mut self) {
        self.is_error = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(LoadPhase::Seeding, LoadPhase::CachedReady, true ; "seed_to_cached")]
    #[test_case(LoadPhase::Seeding, LoadPhase::PlaceholderShown, true ; "seed_to_placeholder")]
    #[test_case(LoadPhase::PlaceholderShown, LoadPhase::Probing, true ; "placeholder_to_probing")]
    #[test_case(LoadPhase::PlaceholderShown, LoadPhase::Upgraded, true ; "native_cached_upgrade")]
    #[test_case(LoadPhase::Probing, LoadPhase::Upgraded, true ; "probe_success")]
    #[test_case(LoadPhase::Probing, LoadPhase::Failed, true ; "probe_failure")]
    #[test_case(LoadPhase::Probing, LoadPhase::Settled, true ; "background_failure")]
    #[test_case(LoadPhase::Probing, LoadPhase::PlaceholderShown, false ; "no_return_to_placeholder")]
    #[test_case(LoadPhase::Upgraded, LoadPhase::Probing, false ; "upgraded_is_terminal")]
    #[test_case(LoadPhase::CachedReady, LoadPhase::Upgraded, false ; "cached_is_terminal")]
    #[test_case(LoadPhase::Failed, LoadPhase::Upgraded, false ; "failed_is_terminal")]
    #[test_case(LoadPhase::PlaceholderShown, LoadPhase::Failed, false ; "fail_requires_probe")]
    #[test_case(LoadPhase::Seeding, LoadPhase::Probing, false ; "probe_requires_placeholder")]
    fn test_transition_table(from: LoadPhase, to: LoadPhase, legal: bool) {
        assert_eq!(from.can_transition_to(to), legal);
    }

    #[test]
    fn test_escalation_flow() {
        let mut state = LoadState::seeding("a.jpg");
        state.show_placeholder().unwrap();
        assert!(!state.is_loaded());
        assert_eq!(state.current_src(), "a.jpg");

        state.begin_probe().unwrap();
        state.upgrade("b.jpg", false).unwrap();

        assert_eq!(state.current_src(), "b.jpg");
        assert!(state.is_loaded());
        assert!(!state.skip_transition());
        assert_eq!(state.phase(), LoadPhase::Upgraded);
    }

    #[test]
    fn test_cached_seed_skips_transition() {
        let mut state = LoadState::seeding("a.jpg");
        state.seed_cached("b.jpg").unwrap();
        assert_eq!(state.current_src(), "b.jpg");
        assert!(state.is_loaded());
        assert!(state.skip_transition());
    }

    #[test]
    fn test_failure_keeps_source() {
        let mut state = LoadState::seeding("a.jpg");
        state.show_placeholder().unwrap();
        state.begin_probe().unwrap();
        state.fail().unwrap();

        assert_eq!(state.current_src(), "a.jpg");
        assert!(state.is_error());
        assert!(state.is_loaded());
    }

    #[test]
    fn test_illegal_transition_leaves_state_untouched() {
        let mut state = LoadState::seeding("a.jpg");
        state.seed_cached("b.jpg").unwrap();
        let before = state.clone();

        let err = state.upgrade("c.jpg", false).unwrap_err();
        assert_eq!(err.from, LoadPhase::CachedReady);
        assert_eq!(err.to, LoadPhase::Upgraded);
        assert_eq!(state, before);
    }

    #[test]
    fn test_loaded_is_monotonic_across_all_paths() {
        let mut state = LoadState::seeding("a.jpg");
        state.show_placeholder().unwrap();
        state.begin_probe().unwrap();
        state.settle().unwrap();
        assert!(state.is_loaded());

        assert!(state.fail().is_err());
        assert!(state.upgrade("b.jpg", true).is_err());
        state.flag_error();
        assert!(state.is_loaded());
    }
}
