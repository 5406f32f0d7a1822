use crate::Cluster;
use crate::Degrees;
use crate::Kilometers;
use crate::geo::Point;
use serde::Deserialize;
use serde::Serialize;

/// Precomputed per-cluster data served by the lookup API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub cluster: Cluster,
    /// centroid
    pub latitude: Degrees,
    pub longitude: Degrees,
    /// points assigned to this cluster
    pub population: usize,
    /// population over all points
    pub share: f64,
    /// farthest member from the centroid
    pub radius: Kilometers,
    /// mean member distance from the centroid
    pub spread: Kilometers,
    pub north: Degrees,
    pub south: Degrees,
    pub east: Degrees,
    pub west: Degrees,
}

impl Summary {
    /// Summarizes the members of one cluster. An empty cluster collapses
    /// onto its centroid.
    pub fn new(cluster: Cluster, centroid: Point, members: &[&Point], total: usize) -> Self {
        let distances = members
            .iter()
            .map(|p| centroid.haversine(p))
            .collect::<Vec<Kilometers>>();
        let population = members.len();
        let extent = |f: fn(&Point) -> Degrees, pick: fn(Degrees, Degrees) -> Degrees| {
            members.iter().map(|p| f(p)).fold(f(&centroid), pick)
        };
        Self {
            cluster,
            latitude: centroid.latitude,
            longitude: centroid.longitude,
            population,
            share: match total {
                0 => 0.,
                n => population as f64 / n as f64,
            },
            radius: distances.iter().copied().fold(0., Kilometers::max),
            spread: match population {
                0 => 0.,
                n => distances.iter().sum::<Kilometers>() / n as f64,
            },
            north: extent(|p| p.latitude, Degrees::max),
            south: extent(|p| p.latitude, Degrees::min),
            east: extent(|p| p.longitude, Degrees::max),
            west: extent(|p| p.longitude, Degrees::min),
        }
    }

    pub fn centroid(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}
