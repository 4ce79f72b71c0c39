//! Application layer with the loading services and render DTOs.

/// Data transfer objects.
pub mod dto;
/// Scheduling, negotiation and orchestration services.
pub mod services;

pub use dto::{FetchPriority, ImageProps, RenderPlan, ViewContext};
pub use services::{
    EscalationScheduler, LoadCallbacks, LoadFailure, ProgressiveImage, ProgressiveLoader,
    RenderedElement, SchedulerConfig,
};
