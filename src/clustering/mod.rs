//! K-means over coordinates: k-means++ seeding, Elkan-accelerated
//! Lloyd iterations, and the persisted model used for lookups.
mod bounds;
mod centroid;
mod elkan;
mod kmeans;
mod model;

pub use bounds::*;
pub use centroid::*;
pub use elkan::*;
pub use kmeans::*;
pub use model::*;
