pub mod escalation_scheduler;
pub mod probe;
pub mod progressive_loader;
pub mod source_negotiator;


pub use escalation_scheduler::{
    DEFAULT_ROOT_MARGIN_PX, EscalationScheduler, EscalationTrigger, SLOW_ROOT_MARGIN_PX,
    SchedulerConfig,
};
pub use probe::{Probe, ProbeCompletion};
pub use progressive_loader::{
    LoadCallbacks, LoadFailure, ProgressiveImage, ProgressiveLoader, RenderedElement,
};
pub use source_negotiator::{build_render_plan, negotiate, sizes_for, srcset_candidates};
