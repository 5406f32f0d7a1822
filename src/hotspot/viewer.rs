use super::*;
use crate::Degrees;
use crate::MAP_MIN_RADIUS_METRES;
use crate::Result;
use askama::Template;
use std::path::Path;

/// Standalone Leaflet page with one circle per cluster.
#[derive(Template)]
#[template(path = "map.html")]
struct Map<'a> {
    clusters: &'a str,
    latitude: Degrees,
    longitude: Degrees,
    minimum: f64,
}

/// Renders cluster summaries onto a map.
pub struct Viewer {
    clusters: Vec<Summary>,
}

impl Viewer {
    pub fn new(clusters: Vec<Summary>) -> Self {
        Self { clusters }
    }

    /// Mean centroid, or (0, 0) with nothing to show. The page fits
    /// itself to the clusters once loaded; this is only the initial view.
    fn center(&self) -> (Degrees, Degrees) {
        match self.clusters.len() {
            0 => (0., 0.),
            n => {
                let (lat, lon) = self
                    .clusters
                    .iter()
                    .fold((0., 0.), |(y, x), s| (y + s.latitude, x + s.longitude));
                (lat / n as Degrees, lon / n as Degrees)
            }
        }
    }

    pub fn render(&self) -> Result<String> {
        let ref clusters = serde_json::to_string(&self.clusters)?;
        let (latitude, longitude) = self.center();
        let map = Map {
            clusters,
            latitude,
            longitude,
            minimum: MAP_MIN_RADIUS_METRES,
        };
        Ok(map.render()?)
    }

    pub fn save_map_to(&self, path: &Path) -> Result<()> {
        log::info!("saving map to {}", path.display());
        crate::media::write_atomic(path, self.render()?.as_bytes())
    }
}
