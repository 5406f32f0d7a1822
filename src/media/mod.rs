//! Files on disk under the media root.
mod media;
mod names;

pub use media::*;
pub use names::*;
