//! Render-layer description of a progressive image.

use serde::{Deserialize, Serialize};

use crate::domain::entities::ImageSourceSet;

/// Where the image is displayed; drives the `sizes` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewContext {
    /// Masonry or feed grid.
    #[default]
    Grid,
    /// Small thumbnail strip.
    Thumbnail,
    /// Photo detail page.
    Detail,
    /// Lightbox modal.
    Modal,
    /// Full-bleed view.
    Full,
}

impl ViewContext {
    /// True for contexts that span most of the viewport.
    #[must_use]
    pub const fn is_wide(self) -> bool {
        matches!(self, Self::Detail | Self::Modal | Self::Full)
    }
}

/// Native `fetchpriority` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPriority {
    /// `high`.
    High,
    /// `low`.
    Low,
    /// `auto`.
    Auto,
}

impl FetchPriority {
    /// Attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
            Self::Auto => "auto",
        }
    }
}

/// Native `loading` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
    /// `eager`.
    Eager,
    /// `lazy`.
    Lazy,
}

impl Loading {
    /// Attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::Lazy => "lazy",
        }
    }
}

/// Per-instance input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProps {
    /// URL set for every tier and encoding.
    pub sources: ImageSourceSet,
    /// Start escalation at mount instead of on visibility.
    pub eager: bool,
    /// Optional native fetch priority.
    pub fetch_priority: Option<FetchPriority>,
    /// Alternative text.
    pub alt: String,
    /// Display context.
    pub context: ViewContext,
}

impl ImageProps {
    /// Props with lazy loading in a grid.
    #[must_use]
    pub fn new(sources: ImageSourceSet, alt: impl Into<String>) -> Self {
        Self {
            sources,
            eager: false,
            fetch_priority: None,
            alt: alt.into(),
            context: ViewContext::default(),
        }
    }

    /// Sets the eager flag.
    #[must_use]
    pub const fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    /// Sets the fetch priority.
    #[must_use]
    pub const fn with_fetch_priority(mut self, priority: FetchPriority) -> Self {
        self.fetch_priority = Some(priority);
        self
    }

    /// Sets the view context.
    #[must_use]
    pub const fn with_context(mut self, context: ViewContext) -> Self {
        self.context = context;
        self
    }
}

/// One `url width` pair of a srcset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate {
    /// Candidate URL.
    pub url: String,
    /// Width descriptor.
    pub width: u32,
}

/// One `<source>` alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureSource {
    /// `type` attribute; `None` for the universal encoding.
    pub mime_type: Option<&'static str>,
    /// Candidates ordered by width.
    pub srcset: Vec<SrcsetCandidate>,
    /// `sizes` attribute.
    pub sizes: &'static str,
}

impl PictureSource {
    /// Formats the `srcset` attribute value.
    #[must_use]
    pub fn srcset_attr(&self) -> String {
        self.srcset
            .iter()
            .map(|c| format!("{} {}w", c.url, c.width))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Attributes of the fallback `<img>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgAttributes {
    /// Currently assigned source.
    pub src: String,
    /// Alternative text.
    pub alt: String,
    /// Loading hint.
    pub loading: Loading,
    /// Fetch priority hint.
    pub fetch_priority: Option<FetchPriority>,
}

/// Visual treatment for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStyle {
    /// Placeholder blur is applied.
    pub blurred: bool,
    /// Fade-in transition plays.
    pub fade_in: bool,
    /// Broken-image indicator is shown.
    pub broken: bool,
}

/// Everything needed to render one instance.
///
/// An empty `sources` list means a plain `<img>`; otherwise a `<picture>`
/// wraps the sources followed by the fallback image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    /// Alternative sources, preferred encoding first.
    pub sources: Vec<PictureSource>,
    /// Fallback image.
    pub img: ImgAttributes,
    /// Visual treatment.
    pub style: RenderStyle,
}

impl RenderPlan {
    /// True when a `<picture>` wrapper is needed.
    #[must_use]
    pub fn is_picture(&self) -> bool {
        !self.sources.is_empty()
    }
}
