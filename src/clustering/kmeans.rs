use super::*;
use crate::Degrees;
use crate::Error;
use crate::KMEANS_MAX_ITERATIONS;
use crate::KMEANS_SEED;
use crate::KMEANS_TOLERANCE;
use crate::Result;
use crate::geo::Point;
use std::collections::HashSet;

/// Hyperparameters for a k-means fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    k: usize,
    iterations: usize,
    tolerance: Degrees,
    seed: u64,
}

impl From<usize> for KMeans {
    fn from(k: usize) -> Self {
        Self {
            k,
            iterations: KMEANS_MAX_ITERATIONS,
            tolerance: KMEANS_TOLERANCE,
            seed: KMEANS_SEED,
        }
    }
}

impl KMeans {
    pub fn k(&self) -> usize {
        self.k
    }
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
    pub fn tolerance(mut self, tolerance: Degrees) -> Self {
        self.tolerance = tolerance;
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the request against the data before any work happens.
    fn check(&self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Err(Error::NoPoints);
        }
        if self.k == 0 || self.k > crate::KMEANS_MAX_CLUSTERS {
            return Err(Error::Clusters(self.k));
        }
        let distinct = distinct(points);
        if self.k > distinct {
            return Err(Error::Insufficient(self.k, distinct));
        }
        Ok(())
    }

    /// Seeds with k-means++ then runs Elkan iterations until no centroid
    /// drifts further than the tolerance or the iteration budget runs out.
    pub fn fit(&self, points: &[Point]) -> Result<Model> {
        self.check(points)?;
        log::info!("{:<32}{:<32}", "kmeans initializing", format!("k={} n={}", self.k, points.len()));
        let mut layer = Layer::new(points, self.k).seeded(self.seed)?;
        let mut bounds = layer.init_bounds();
        let mut iterations = 0;
        while iterations < self.iterations {
            iterations += 1;
            let kmeans = layer.step_elkan(&mut bounds);
            let drift = layer.shift(kmeans);
            log::debug!("{:<32}{:<32}", format!("kmeans iteration {:>3}", iterations), drift);
            if drift <= self.tolerance {
                break;
            }
        }
        let inertia = layer.inertia();
        log::info!("{:<32}{:<32}", "kmeans finished", format!("t={} inertia={:.6}", iterations, inertia));
        Ok(Model::new(layer.kmeans, inertia, iterations))
    }
}

/// Number of distinct coordinates; -0.0 and 0.0 count once.
fn distinct(points: &[Point]) -> usize {
    points
        .iter()
        .map(|p| ((p.latitude + 0.).to_bits(), (p.longitude + 0.).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

/// Working state of one fit: borrowed points, owned centroids.
#[derive(Debug, Clone)]
pub struct Layer<'a> {
    k: usize,
    points: &'a [Point],
    pub(crate) kmeans: Vec<Point>,
}

impl<'a> Layer<'a> {
    pub fn new(points: &'a [Point], k: usize) -> Self {
        Self {
            k,
            points,
            kmeans: Vec::with_capacity(k),
        }
    }

    pub fn seeded(mut self, seed: u64) -> Result<Self> {
        self.kmeans = self.init_kmeans(seed)?;
        Ok(self)
    }

    /// Moves to the next centroids and returns the largest drift.
    pub fn shift(&mut self, kmeans: Vec<Point>) -> Degrees {
        let drift = self.drift(&kmeans).into_iter().fold(0., Degrees::max);
        self.kmeans = kmeans;
        drift
    }

    /// Deterministic k-means++ seeding: each next centroid is drawn with
    /// probability proportional to the squared distance to the nearest
    /// centroid chosen so far.
    pub fn init_kmeans(&self, seed: u64) -> Result<Vec<Point>> {
        use rand::SeedableRng;
        use rand::distr::Distribution;
        use rand::distr::weighted::WeightedIndex;
        use rand::rngs::SmallRng;
        use rayon::iter::IntoParallelRefIterator;
        use rayon::iter::ParallelIterator;
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let mut potentials = vec![1.; self.points.len()];
        let mut kmeans = Vec::with_capacity(self.k);
        while kmeans.len() < self.k {
            let i = WeightedIndex::new(potentials.iter())
                .map_err(|_| Error::Insufficient(self.k, kmeans.len()))?
                .sample(rng);
            let x = self.points[i];
            kmeans.push(x);
            potentials = self
                .points
                .par_iter()
                .map(|p| self.distance(&x, p))
                .map(|d| d * d)
                .collect::<Vec<Degrees>>()
                .iter()
                .zip(potentials.iter())
                .map(|(d0, d1)| Degrees::min(*d0, *d1))
                .collect::<Vec<Degrees>>();
        }
        Ok(kmeans)
    }
}

impl Elkan for Layer<'_> {
    fn points(&self) -> &[Point] {
        self.points
    }
    fn kmeans(&self) -> &[Point] {
        &self.kmeans
    }
    fn k(&self) -> usize {
        self.k
    }
}
