//! Coordinates and the geolocation files they are read from.
mod format;
mod point;
mod points;

pub use format::*;
pub use point::*;
pub use points::*;
