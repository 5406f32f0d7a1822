use super::*;
use crate::Result;
use crate::clustering::KMeans;
use crate::database::Store;
use crate::hotspot::Predictor;
use crate::hotspot::Summary;
use crate::hotspot::Viewer;
use crate::media::Media;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;

/// A claimed training run over resolved upload files. Holds the trainer
/// until the model, the cluster rows and the map have all been written.
pub struct Training {
    store: Arc<dyn Store>,
    media: Media,
    paths: Vec<PathBuf>,
    kmeans: KMeans,
    trainer: OwnedMutexGuard<()>,
}

/// How a run ended when the server itself did not fail.
#[derive(Debug)]
pub enum Outcome {
    Trained,
    /// The files could not be read or fitted with the requested clusters.
    Rejected(crate::Error),
}

impl Training {
    pub fn new(hub: &Hub, paths: Vec<PathBuf>, kmeans: KMeans, trainer: OwnedMutexGuard<()>) -> Self {
        Self {
            store: hub.shared(),
            media: hub.media().clone(),
            paths,
            kmeans,
            trainer,
        }
    }

    /// Runs on its own task. Dropping the handle leaves the run going, and
    /// the trainer stays claimed until it finishes.
    pub fn spawn(self) -> JoinHandle<Result<Outcome>> {
        tokio::spawn(self.run())
    }

    async fn run(self) -> Result<Outcome> {
        let Self {
            store,
            media,
            paths,
            kmeans,
            trainer,
        } = self;
        let ref path = media.kmeans();
        let model = path.clone();
        let fitted = tokio::task::spawn_blocking(move || -> Result<Vec<Summary>> {
            let predictor = Predictor::train(&paths[..], kmeans)?;
            predictor.save_kmeans_to(&model)?;
            Ok(predictor.results())
        })
        .await?;
        let summaries = match fitted {
            Ok(summaries) => summaries,
            Err(e) => return Ok(Outcome::Rejected(e)),
        };
        store.replace(&summaries).await?;
        let k = summaries.len();
        let map = media.map();
        tokio::task::spawn_blocking(move || Viewer::new(summaries).save_map_to(&map)).await??;
        log::info!("trained {} clusters into {}", k, path.display());
        drop(trainer);
        Ok(Outcome::Trained)
    }
}
