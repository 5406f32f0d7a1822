use super::*;
use crate::Cluster;
use crate::Result;
use crate::hotspot::Summary;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    serial: i64,
    uploads: BTreeMap<i64, Upload>,
    clusters: Vec<(Cluster, serde_json::Value)>,
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct Memory(RwLock<Tables>);

#[async_trait::async_trait]
impl Store for Memory {
    async fn create(&self, upload: NewUpload) -> Result<Upload> {
        let mut tables = self.0.write().await;
        tables.serial += 1;
        let upload = Upload {
            id: tables.serial,
            name: upload.name,
            path: upload.path,
            size: upload.size,
            created: crate::now(),
        };
        tables.uploads.insert(upload.id, upload.clone());
        Ok(upload)
    }
    async fn uploads(&self) -> Result<Vec<Upload>> {
        Ok(self.0.read().await.uploads.values().cloned().collect())
    }
    async fn select(&self, ids: &[i64]) -> Result<Vec<Upload>> {
        let tables = self.0.read().await;
        Ok(tables
            .uploads
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
    async fn delete(&self, ids: &[i64]) -> Result<Vec<Upload>> {
        let mut tables = self.0.write().await;
        let mut gone = ids
            .iter()
            .filter_map(|id| tables.uploads.remove(id))
            .collect::<Vec<Upload>>();
        gone.sort_by_key(|u| u.id);
        Ok(gone)
    }
    async fn replace(&self, summaries: &[Summary]) -> Result<()> {
        let rows = summaries
            .iter()
            .map(|s| Ok((s.cluster, serde_json::to_value(s)?)))
            .collect::<Result<Vec<_>>>()?;
        self.0.write().await.clusters = rows;
        Ok(())
    }
    async fn cluster(&self, cluster: Cluster) -> Result<Option<serde_json::Value>> {
        Ok(self
            .0
            .read()
            .await
            .clusters
            .iter()
            .find(|(k, _)| *k == cluster)
            .map(|(_, data)| data.clone()))
    }
    async fn clusters(&self) -> Result<Vec<serde_json::Value>> {
        let tables = self.0.read().await;
        let mut rows = tables.clusters.iter().collect::<Vec<_>>();
        rows.sort_by_key(|(k, _)| *k);
        Ok(rows.into_iter().map(|(_, data)| data.clone()).collect())
    }
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
