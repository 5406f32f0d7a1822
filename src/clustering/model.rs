use super::*;
use crate::Cluster;
use crate::Degrees;
use crate::Result;
use crate::geo::Point;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// A fitted k-means model. Cluster labels are centroid indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    centroids: Vec<Point>,
    inertia: Degrees,
    iterations: usize,
}

impl Model {
    pub fn new(centroids: Vec<Point>, inertia: Degrees, iterations: usize) -> Self {
        Self {
            centroids,
            inertia,
            iterations,
        }
    }
    pub fn k(&self) -> usize {
        self.centroids.len()
    }
    pub fn centroids(&self) -> &[Point] {
        &self.centroids
    }
    pub fn inertia(&self) -> Degrees {
        self.inertia
    }
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Nearest centroid. Ties go to the lowest label.
    pub fn predict(&self, point: &Point) -> Cluster {
        Layer::new(&[], self.k())
            .with(&self.centroids)
            .neighbor(point)
            .0
    }

    pub fn assign(&self, points: &[Point]) -> Vec<Cluster> {
        Layer::new(points, self.k()).with(&self.centroids).assignment()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        log::info!("saving kmeans to {}", path.display());
        crate::media::write_atomic(path, &serde_json::to_vec_pretty(self)?)
    }
}

impl<'a> Layer<'a> {
    fn with(mut self, centroids: &[Point]) -> Self {
        self.kmeans = centroids.to_vec();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        Model::new(
            vec![Point::new(0., 0.), Point::new(10., 10.), Point::new(-10., 10.)],
            0.,
            1,
        )
    }

    #[test]
    fn predicts_nearest_centroid() {
        let model = model();
        assert_eq!(model.predict(&Point::new(1., 1.)), 0);
        assert_eq!(model.predict(&Point::new(9., 12.)), 1);
        assert_eq!(model.predict(&Point::new(-8., 7.)), 2);
        assert_eq!(
            model.assign(&[Point::new(11., 11.), Point::new(0., -3.)]),
            vec![1, 0]
        );
    }

    #[test]
    fn persists_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(crate::KMEANS_FILE);
        let model = model();
        model.save(&path).unwrap();
        assert_eq!(Model::load(&path).unwrap(), model);
    }

    #[test]
    fn missing_model_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(crate::KMEANS_FILE);
        assert!(Model::load(&path).unwrap_err().is_missing());
    }
}
