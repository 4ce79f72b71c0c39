//! Image tiers and the URL set produced for every uploaded photo.

use serde::{Deserialize, Serialize};

use crate::domain::errors::SourceSetError;

/// One of the pre-rendered resolutions of an image, ordered by quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Tiny blurred preview.
    Thumbnail,
    /// Grid-sized rendition; the escalation target.
    Small,
    /// Detail-view rendition.
    Regular,
    /// Full-size upload.
    Original,
}

impl Tier {
    /// All tiers from lowest to highest quality.
    pub const ALL: [Self; 4] = [Self::Thumbnail, Self::Small, Self::Regular, Self::Original];

    /// Width descriptor advertised for this tier in a srcset.
    #[must_use]
    pub const fn nominal_width(self) -> u32 {
        match self {
            Self::Thumbnail => 200,
            Self::Small => 800,
            Self::Regular => 1080,
            Self::Original => 1920,
        }
    }

    /// The next higher tier, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Thumbnail => Some(Self::Small),
            Self::Small => Some(Self::Regular),
            Self::Regular => Some(Self::Original),
            Self::Original => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::Small => write!(f, "small"),
            Self::Regular => write!(f, "regular"),
            Self::Original => write!(f, "original"),
        }
    }
}

/// Encodings a source set can be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Modern, preferred encoding.
    Avif,
    /// Universally decodable fallback (JPEG/WebP as uploaded).
    Universal,
}

impl Encoding {
    /// Negotiation order: preferred first.
    pub const PREFERENCE: [Self; 2] = [Self::Avif, Self::Universal];

    /// MIME type announced on `<source type=..>`, `None` for the fallback.
    #[must_use]
    pub const fn mime_type(self) -> Option<&'static str> {
        match self {
            Self::Avif => Some("image/avif"),
            Self::Universal => None,
        }
    }
}

/// URLs for every tier and encoding of a single image.
///
/// Any tier except `original` may be missing; lookups fall back to the next
/// higher tier and ultimately to `original_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSourceSet {
    /// Tiny preview URL.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Grid-sized URL.
    #[serde(default)]
    pub small_url: Option<String>,
    /// Detail-sized URL.
    #[serde(default)]
    pub regular_url: Option<String>,
    /// Full-size URL, the ultimate fallback.
    pub original_url: String,
    /// AVIF thumbnail.
    #[serde(default)]
    pub thumbnail_avif_url: Option<String>,
    /// AVIF small.
    #[serde(default)]
    pub small_avif_url: Option<String>,
    /// AVIF regular.
    #[serde(default)]
    pub regular_avif_url: Option<String>,
    /// AVIF original.
    #[serde(default)]
    pub original_avif_url: Option<String>,
    /// Animated GIF; tiers hold GIF renditions and negotiation is bypassed.
    #[serde(default)]
    pub animated: bool,
}

impl ImageSourceSet {
    /// Creates a set that only knows its original URL.
    #[must_use]
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            thumbnail_url: None,
            small_url: None,
            regular_url: None,
            original_url: original_url.into(),
            thumbnail_avif_url: None,
            small_avif_url: None,
            regular_avif_url: None,
            original_avif_url: None,
            animated: false,
        }
    }

    /// Sets the universal URL of a tier.
    #[must_use]
    pub fn with_tier(mut self, tier: Tier, url: impl Into<String>) -> Self {
        let url = Some(url.into());
        match tier {
            Tier::Thumbnail => self.thumbnail_url = url,
            Tier::Small => self.small_url = url,
            Tier::Regular => self.regular_url = url,
            Tier::Original => self.original_url = url.unwrap_or_default(),
        }
        self
    }

    /// Sets the AVIF URL of a tier.
    #[must_use]
    pub fn with_avif(mut self, tier: Tier, url: impl Into<String>) -> Self {
        let url = Some(url.into());
        match tier {
            Tier::Thumbnail => self.thumbnail_avif_url = url,
            Tier::Small => self.small_avif_url = url,
            Tier::Regular => self.regular_avif_url = url,
            Tier::Original => self.original_avif_url = url,
        }
        self
    }

    /// Marks the set as an animated GIF.
    #[must_use]
    pub const fn animated(mut self) -> Self {
        self.animated = true;
        self
    }

    /// Checks that the set can be rendered at all.
    ///
    /// # Errors
    /// Returns `SourceSetError::MissingOriginal` if the fallback URL is blank.
    pub fn validate(&self) -> Result<(), SourceSetError> {
        if self.original_url.trim().is_empty() {
            return Err(SourceSetError::MissingOriginal);
        }
        Ok(())
    }

    /// Direct lookup without fallback. Blank URLs count as absent.
    #[must_use]
    pub fn url(&self, tier: Tier, encoding: Encoding) -> Option<&str> {
        let slot = match (encoding, tier) {
            (Encoding::Universal, Tier::Thumbnail) => self.thumbnail_url.as_deref(),
            (Encoding::Universal, Tier::Small) => self.small_url.as_deref(),
            (Encoding::Universal, Tier::Regular) => self.regular_url.as_deref(),
            (Encoding::Universal, Tier::Original) => Some(self.original_url.as_str()),
            (Encoding::Avif, Tier::Thumbnail) => self.thumbnail_avif_url.as_deref(),
            (Encoding::Avif, Tier::Small) => self.small_avif_url.as_deref(),
            (Encoding::Avif, Tier::Regular) => self.regular_avif_url.as_deref(),
            (Encoding::Avif, Tier::Original) => self.original_avif_url.as_deref(),
        };
        slot.filter(|url| !url.trim().is_empty())
    }

    /// Universal URL for `tier`, walking up to the next available tier.
    #[must_use]
    pub fn resolve(&self, tier: Tier) -> &str {
        let mut current = Some(tier);
        while let Some(t) = current {
            if let Some(url) = self.url(t, Encoding::Universal) {
                return url;
            }
            current = t.next();
        }
        &self.original_url
    }

    /// URL rendered before escalation.
    #[must_use]
    pub fn placeholder_url(&self) -> &str {
        self.resolve(Tier::Thumbnail)
    }

    /// URL escalation aims for.
    #[must_use]
    pub fn target_url(&self) -> &str {
        self.resolve(Tier::Small)
    }

    /// True when there is nothing to escalate to.
    #[must_use]
    pub fn placeholder_is_target(&self) -> bool {
        self.placeholder_url() == self.target_url()
    }
}
