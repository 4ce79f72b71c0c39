//! Data transfer objects for the application layer.

mod render_plan;

pub use render_plan::{
    FetchPriority, ImageProps, ImgAttributes, Loading, PictureSource, RenderPlan, RenderStyle,
    SrcsetCandidate, ViewContext,
};
