//! Domain error types.

mod probe_error;
mod state_error;

pub use probe_error::ProbeError;
pub use state_error::{SourceSetError, TransitionError};
