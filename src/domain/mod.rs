//! Domain layer with core entities, port definitions and errors.

/// Network-speed hints.
pub mod connection;
/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use connection::ConnectionSpeed;
pub use entities::{Encoding, ImageId, ImageSourceSet, LoadPhase, LoadState, Tier};
pub use errors::{ProbeError, SourceSetError, TransitionError};
