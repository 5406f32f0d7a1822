use super::*;
use crate::Result;
use crate::clustering::KMeans;
use crate::clustering::Model;
use crate::geo::Point;
use crate::geo::Points;
use std::path::Path;

/// Trains k-means over the coordinates of a set of files and derives
/// the per-cluster summaries.
pub struct Predictor {
    points: Vec<Point>,
    model: Model,
}

impl Predictor {
    /// Reads every file (in order) and fits `kmeans` over their union.
    pub fn train<P: AsRef<Path>>(paths: &[P], kmeans: KMeans) -> Result<Self> {
        log::info!("training over {} files", paths.len());
        let points = Points::read_all(paths)?;
        if points.skipped() > 0 {
            log::warn!("skipped {} unusable records", points.skipped());
        }
        Self::fit(points.into(), kmeans)
    }

    pub fn fit(points: Vec<Point>, kmeans: KMeans) -> Result<Self> {
        let model = kmeans.fit(&points)?;
        Ok(Self { points, model })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn save_kmeans_to(&self, path: &Path) -> Result<()> {
        self.model.save(path)
    }

    /// One summary per cluster, ordered by label.
    pub fn results(&self) -> Vec<Summary> {
        let labels = self.model.assign(&self.points);
        let mut members = vec![Vec::new(); self.model.k()];
        labels
            .iter()
            .zip(self.points.iter())
            .for_each(|(&k, p)| members[k].push(p));
        self.model
            .centroids()
            .iter()
            .zip(members.iter())
            .enumerate()
            .map(|(k, (c, m))| Summary::new(k, *c, m, self.points.len()))
            .collect()
    }
}
