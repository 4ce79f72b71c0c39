//! Domain entity definitions.

mod image_id;
mod load_state;
mod source_set;

pub use image_id::ImageId;
pub use load_state::{LoadPhase, LoadState};
pub use source_set::{Encoding, ImageSourceSet, Tier};
