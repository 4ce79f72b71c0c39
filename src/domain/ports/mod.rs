mod connection_hint_port;
mod image_probe_port;
mod membership_cache_port;
mod visibility_port;

pub use connection_hint_port::ConnectionHintPort;
pub use image_probe_port::{ImageProbePort, ProbedImage};
pub use membership_cache_port::MembershipCachePort;
pub use visibility_port::{ElementId, ObservationHandle, VisibilityNotifier, VisibilityPort};
