#![cfg(feature = "server")]

mod memory;
mod postgres;
mod store;
mod upload;

pub use memory::*;
pub use postgres::*;
pub use store::*;
pub use upload::*;

pub const UPLOADS: &str = "uploads";
pub const CLUSTERS: &str = "clusters";
