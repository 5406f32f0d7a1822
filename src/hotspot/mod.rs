//! Training over uploaded files and rendering the result.
mod predictor;
mod summary;
mod viewer;

pub use predictor::*;
pub use summary::*;
pub use viewer::*;
