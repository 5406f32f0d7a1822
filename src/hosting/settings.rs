use crate::Result;
use crate::database::Memory;
use crate::database::Store;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Server configuration. Every flag falls back to an environment variable.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Serve the hotspot clustering site", long_about = None)]
pub struct Settings {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: String,
    /// PostgreSQL connection string.
    #[arg(long, env = "DB_URL", required_unless_present = "memory")]
    pub db_url: Option<String>,
    /// Directory for uploaded files and trained artifacts.
    #[arg(long, env = "MEDIA_ROOT", default_value = "media")]
    pub media_root: PathBuf,
    #[arg(long, env = "WORKERS", default_value_t = 4)]
    pub workers: usize,
    /// Largest accepted upload, in bytes.
    #[arg(long, env = "UPLOAD_LIMIT", default_value_t = 16 * 1024 * 1024)]
    pub upload_limit: usize,
    /// Keep records in process memory instead of PostgreSQL.
    #[arg(long)]
    pub memory: bool,
}

impl Settings {
    pub async fn store(&self) -> Result<Arc<dyn Store>> {
        let store: Arc<dyn Store> = match (self.memory, self.db_url.as_deref()) {
            (false, Some(url)) => crate::database::db(url).await?,
            _ => {
                log::warn!("using in-memory store, records will not persist");
                Arc::new(Memory::default())
            }
        };
        Ok(store)
    }
}
