use crate::database::Store;
use crate::media::Media;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Shared state behind every handler.
pub struct Hub {
    store: Arc<dyn Store>,
    media: Media,
    training: Arc<Mutex<()>>,
    limit: usize,
}

impl Hub {
    pub fn new(store: Arc<dyn Store>, media: Media, limit: usize) -> Self {
        Self {
            store,
            media,
            training: Arc::new(Mutex::new(())),
            limit,
        }
    }
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
    /// Owned handle to the store, for work that outlives the request.
    pub fn shared(&self) -> Arc<dyn Store> {
        self.store.clone()
    }
    pub fn media(&self) -> &Media {
        &self.media
    }
    /// Largest accepted upload in bytes.
    pub fn limit(&self) -> usize {
        self.limit
    }
    /// Claims the trainer, or `None` while another run holds it. The guard
    /// is owned so a detached run can keep it past the request.
    pub fn trainer(&self) -> Option<OwnedMutexGuard<()>> {
        self.training.clone().try_lock_owned().ok()
    }
}
