use super::*;
use crate::Cluster;
use crate::Result;
use crate::hotspot::Summary;
use const_format::concatcp;
use std::sync::Arc;
use tokio_postgres::Client;

const COLUMNS: &str = "id, name, path, size, created";

/// Connect, run migrations, and return the client.
pub async fn db(url: &str) -> Result<Arc<Client>> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(url, tls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed: {}", e);
        }
    });
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await?;
    migrate(&client).await?;
    Ok(Arc::new(client))
}

/// Creates both tables if they do not exist yet.
pub async fn migrate(client: &Client) -> Result<()> {
    #[rustfmt::skip]
    const SQL: &str = concatcp!(
        "CREATE TABLE IF NOT EXISTS ", UPLOADS, " (
            id         BIGSERIAL PRIMARY KEY,
            name       TEXT      NOT NULL,
            path       TEXT      NOT NULL,
            size       BIGINT    NOT NULL,
            created    BIGINT    NOT NULL DEFAULT EXTRACT(EPOCH FROM now())::BIGINT
        );
        CREATE TABLE IF NOT EXISTS ", CLUSTERS, " (
            id         BIGSERIAL PRIMARY KEY,
            cluster    INTEGER   NOT NULL,
            data       JSONB     NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_clusters_cluster ON ", CLUSTERS, " (cluster);"
    );
    log::info!("migrating {} and {}", UPLOADS, CLUSTERS);
    Ok(client.batch_execute(SQL).await?)
}

#[rustfmt::skip]
#[async_trait::async_trait]
impl Store for Client {
    async fn create(&self, upload: NewUpload) -> Result<Upload> {
        const SQL: &str = concatcp!(
            "INSERT INTO ", UPLOADS, " (name, path, size) ",
            "VALUES                    ($1,   $2,   $3) ",
            "RETURNING ", COLUMNS
        );
        let ref row = self
            .query_one(SQL, &[&upload.name, &upload.path, &upload.size])
            .await?;
        Ok(Upload::from(row))
    }
    async fn uploads(&self) -> Result<Vec<Upload>> {
        const SQL: &str = concatcp!(
            "SELECT ", COLUMNS, " ",
            "FROM   ", UPLOADS, " ",
            "ORDER  BY id"
        );
        Ok(self.query(SQL, &[]).await?.iter().map(Upload::from).collect())
    }
    async fn select(&self, ids: &[i64]) -> Result<Vec<Upload>> {
        const SQL: &str = concatcp!(
            "SELECT ", COLUMNS, " ",
            "FROM   ", UPLOADS, " ",
            "WHERE  id = ANY($1) ",
            "ORDER  BY id"
        );
        Ok(self.query(SQL, &[&ids]).await?.iter().map(Upload::from).collect())
    }
    async fn delete(&self, ids: &[i64]) -> Result<Vec<Upload>> {
        const SQL: &str = concatcp!(
            "DELETE FROM ", UPLOADS, " ",
            "WHERE  id = ANY($1) ",
            "RETURNING ", COLUMNS
        );
        let mut gone = self
            .query(SQL, &[&ids])
            .await?
            .iter()
            .map(Upload::from)
            .collect::<Vec<Upload>>();
        gone.sort_by_key(|u| u.id);
        Ok(gone)
    }
    async fn replace(&self, summaries: &[Summary]) -> Result<()> {
        const SQL: &str = concatcp!(
            "WITH gone AS (DELETE FROM ", CLUSTERS, ") ",
            "INSERT INTO ", CLUSTERS, " (cluster, data) ",
            "SELECT (e->>'cluster')::INTEGER, e ",
            "FROM   jsonb_array_elements($1::JSONB) AS e"
        );
        let ref data = serde_json::to_value(summaries)?;
        let n = self.execute(SQL, &[data]).await?;
        log::info!("replaced clusters with {} rows", n);
        Ok(())
    }
    async fn cluster(&self, cluster: Cluster) -> Result<Option<serde_json::Value>> {
        const SQL: &str = concatcp!(
            "SELECT data ",
            "FROM   ", CLUSTERS, " ",
            "WHERE  cluster = $1 ",
            "ORDER  BY id ",
            "LIMIT  1"
        );
        Ok(self
            .query_opt(SQL, &[&(cluster as i32)])
            .await?
            .map(|row| row.get::<_, serde_json::Value>(0)))
    }
    async fn clusters(&self) -> Result<Vec<serde_json::Value>> {
        const SQL: &str = concatcp!(
            "SELECT data ",
            "FROM   ", CLUSTERS, " ",
            "ORDER  BY cluster, id"
        );
        Ok(self
            .query(SQL, &[])
            .await?
            .iter()
            .map(|row| row.get::<_, serde_json::Value>(0))
            .collect())
    }
    async fn ping(&self) -> Result<()> {
        self.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}
