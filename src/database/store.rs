use super::*;
use crate::Cluster;
use crate::Result;
use crate::hotspot::Summary;

/// Store defines the persistence interface for upload records and the
/// precomputed cluster summaries. Implemented by PostgreSQL and by an
/// in-process map.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn create(&self, upload: NewUpload) -> Result<Upload>;
    /// All uploads ordered by id.
    async fn uploads(&self) -> Result<Vec<Upload>>;
    /// Uploads with the given ids, ordered by id. Unknown ids are ignored.
    async fn select(&self, ids: &[i64]) -> Result<Vec<Upload>>;
    /// Removes and returns the uploads with the given ids.
    async fn delete(&self, ids: &[i64]) -> Result<Vec<Upload>>;
    /// Swaps every stored summary for `summaries` in one step.
    async fn replace(&self, summaries: &[Summary]) -> Result<()>;
    /// First stored summary for this cluster.
    async fn cluster(&self, cluster: Cluster) -> Result<Option<serde_json::Value>>;
    async fn clusters(&self) -> Result<Vec<serde_json::Value>>;
    async fn ping(&self) -> Result<()>;
}
