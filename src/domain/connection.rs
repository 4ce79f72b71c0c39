//! Network-speed hints.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Effective connection type as reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionSpeed {
    /// `slow-2g`.
    #[serde(rename = "slow-2g")]
    Slow2g,
    /// `2g`.
    #[serde(rename = "2g")]
    TwoG,
    /// `3g`.
    #[serde(rename = "3g")]
    ThreeG,
    /// `4g` or better.
    #[serde(rename = "4g")]
    FourG,
    /// No signal available.
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl ConnectionSpeed {
    /// True for links where prefetching far ahead wastes scarce bandwidth.
    #[must_use]
    pub const fn is_slow(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG)
    }
}

impl FromStr for ConnectionSpeed {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Self::Slow2g,
            "2g" => Self::TwoG,
            "3g" => Self::ThreeG,
            "4g" | "5g" | "wifi" | "ethernet" => Self::FourG,
            _ => Self::Unknown,
        })
    }
}

impl std::fmt::Display for ConnectionSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slow2g => write!(f, "slow-2g"),
            Self::TwoG => write!(f, "2g"),
            Self::ThreeG => write!(f, "3g"),
            Self::FourG => write!(f, "4g"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
