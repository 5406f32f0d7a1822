use crate::Degrees;
use std::path::PathBuf;

/// Everything that can go wrong between an uploaded file and a lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "server")]
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[cfg(feature = "server")]
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("invalid coordinate ({0}, {1})")]
    Coordinate(Degrees, Degrees),
    #[error("unsupported file format: {0}")]
    Format(String),
    #[error("missing {0} column")]
    Column(&'static str),
    #[error("no valid points in {0}")]
    Empty(PathBuf),
    #[error("no points to cluster")]
    NoPoints,
    #[error("cluster count must be between 1 and {}, got {0}", crate::KMEANS_MAX_CLUSTERS)]
    Clusters(usize),
    #[error("{0} clusters requested but only {1} distinct points")]
    Insufficient(usize, usize),
    #[error("path escapes media root: {0}")]
    Traversal(String),
}

impl Error {
    /// Whether the error means "this artifact has not been produced yet".
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
