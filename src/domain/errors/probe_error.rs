//! Probe failure types.

use thiserror::Error;

/// Why a probe could not confirm an image.
///
/// Probe failures never leave the loader; they are turned into state
/// transitions and `on_error` notifications.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ProbeError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("decode error: {message}")]
    Decode { message: String },

    #[error("image reports zero natural width")]
    EmptyImage,

    #[error("probe timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl ProbeError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether the bytes arrived but were unusable.
    #[must_use]
    pub const fn is_content_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::EmptyImage)
    }
}
