use super::*;
use crate::Degrees;
use crate::geo::Point;
use rayon::prelude::*;

/// Elkan's k-means. This exploits the triangle inequality to avoid
/// recalculating distances between points and centroids that are already
/// known to be far apart, on top of a naive O(n * k * t) Lloyd iteration.
///
/// The optimization is exact: every Elkan step lands on the same
/// assignments, and therefore the same centroids, as a naive step.
pub trait Elkan: Sync {
    fn points(&self) -> &[Point];
    fn kmeans(&self) -> &[Point];

    fn k(&self) -> usize {
        self.kmeans().len()
    }
    fn n(&self) -> usize {
        self.points().len()
    }
    fn point(&self, i: usize) -> &Point {
        &self.points()[i]
    }
    fn kmean(&self, j: usize) -> &Point {
        &self.kmeans()[j]
    }

    fn distance(&self, a: &Point, b: &Point) -> Degrees {
        a.euclidean(b)
    }

    /// Exact bounds for every point against the current centroids.
    fn init_bounds(&self) -> Vec<Bounds> {
        self.points()
            .par_iter()
            .map(|x| self.kmeans().iter().map(|c| self.distance(x, c)).collect::<Vec<Degrees>>())
            .map(Bounds::from)
            .collect()
    }

    /// Nearest centroid in O(k). Ties go to the lowest index.
    fn neighbor(&self, x: &Point) -> (usize, Degrees) {
        self.kmeans()
            .iter()
            .enumerate()
            .map(|(j, c)| (j, self.distance(c, x)))
            .fold((0, Degrees::INFINITY), |(j, min), (i, d)| {
                if d < min { (i, d) } else { (j, min) }
            })
    }

    /// d(c, c') for all centers c and c'
    fn pairwises(&self) -> Vec<Vec<Degrees>> {
        (0..self.k())
            .into_par_iter()
            .map(|i| (0..self.k()).map(|j| self.pairwise(i, j)).collect())
            .collect()
    }

    fn pairwise(&self, i: usize, j: usize) -> Degrees {
        if i == j {
            0.
        } else {
            self.distance(self.kmean(i), self.kmean(j))
        }
    }

    /// s(c) = (1/2) min_{c'!=c} d(c, c')
    fn midpoints(&self, pairwise: &[Vec<Degrees>]) -> Vec<Degrees> {
        pairwise
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, d)| d * 0.5)
                    .fold(Degrees::INFINITY, Degrees::min)
            })
            .collect()
    }

    fn drift(&self, news: &[Point]) -> Vec<Degrees> {
        news.iter()
            .zip(self.kmeans())
            .map(|(new, old)| self.distance(new, old))
            .collect()
    }

    /// Refresh stale upper bound before checking triangle inequality
    fn refresh(&self, b: &mut Bounds, x: &Point) {
        if b.stale() {
            b.refresh(self.distance(x, self.kmean(b.j())));
        }
    }

    /// Check triangle inequality and maybe reassign
    fn rebound(&self, b: &mut Bounds, j: usize, pairwise: &[Vec<Degrees>], x: &Point) {
        if b.has_shifted(pairwise, j) {
            b.witness(self.distance(x, self.kmean(j)), j);
        }
    }

    /// Mean of the points assigned to each centroid.
    /// A centroid left without points stays where it was.
    fn centroids(&self, assignment: &[usize]) -> Vec<Point> {
        let mut masses = vec![Centroid::default(); self.k()];
        assignment
            .iter()
            .zip(self.points())
            .for_each(|(&j, x)| masses[j].absorb(x));
        masses
            .into_iter()
            .enumerate()
            .map(|(j, mass)| mass.mean().unwrap_or(*self.kmean(j)))
            .collect()
    }

    /// Step 1: Update bounds and reassign points (against OLD centroids)
    /// Step 2: Compute NEW centroids based on UPDATED assignments
    /// Step 3: Compute drift between old and new centroids
    /// Step 4: Shift bounds for next iteration
    fn step_elkan(&self, bounds: &mut [Bounds]) -> Vec<Point> {
        let ref pairwise = self.pairwises();
        let ref midpoints = self.midpoints(pairwise);
        bounds
            .par_iter_mut()
            .enumerate()
            .filter(|(_, b)| !b.can_exclude(midpoints))
            .for_each(|(i, b)| {
                let x = self.point(i);
                self.refresh(b, x);
                (0..self.k()).for_each(|j| self.rebound(b, j, pairwise, x))
            });
        let assignment = bounds.iter().map(Bounds::j).collect::<Vec<_>>();
        let kmeans = self.centroids(&assignment);
        let ref drifts = self.drift(&kmeans);
        bounds.par_iter_mut().for_each(|b| b.update(drifts));
        kmeans
    }

    /// without optimization
    fn step_naive(&self) -> Vec<Point> {
        self.centroids(&self.assignment())
    }

    fn assignment(&self) -> Vec<usize> {
        self.points()
            .par_iter()
            .map(|x| self.neighbor(x).0)
            .collect()
    }

    /// Sum of squared distances to the nearest centroid.
    /// Summed in order so repeated fits agree to the last bit.
    fn inertia(&self) -> Degrees {
        self.points()
            .par_iter()
            .map(|x| self.neighbor(x).1)
            .map(|d| d * d)
            .collect::<Vec<Degrees>>()
            .into_iter()
            .sum()
    }

    fn rms(&self) -> Degrees {
        (self.inertia() / self.n().max(1) as Degrees).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KMEANS_SEED;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// Jittered blobs around a handful of city centers.
    fn blobs(n: usize) -> Vec<Point> {
        let centers = [(-23.55, -46.63), (40.71, -74.0), (51.5, -0.12), (35.68, 139.69)];
        let ref mut rng = SmallRng::seed_from_u64(7);
        (0..n)
            .map(|i| centers[i % centers.len()])
            .map(|(lat, lon)| {
                Point::new(
                    lat + rng.random_range(-0.5..0.5),
                    lon + rng.random_range(-0.5..0.5),
                )
            })
            .collect()
    }

    #[test]
    fn elkan_naive_equivalence() {
        let ref points = blobs(512);
        let mut elkan = Layer::new(points, 6);
        elkan.kmeans = elkan.init_kmeans(KMEANS_SEED).unwrap();
        let mut naive = elkan.clone();
        let mut bounds = elkan.init_bounds();
        for _ in 0..16 {
            elkan.kmeans = elkan.step_elkan(&mut bounds);
            naive.kmeans = naive.step_naive();
            assert_eq!(elkan.kmeans, naive.kmeans);
            assert_eq!(elkan.rms(), naive.rms());
        }
    }

    #[test]
    fn initial_bounds_are_exact() {
        let ref points = blobs(64);
        let mut layer = Layer::new(points, 4);
        layer.kmeans = layer.init_kmeans(KMEANS_SEED).unwrap();
        for (x, bounds) in points.iter().zip(layer.init_bounds()) {
            let (j, d) = layer.neighbor(x);
            assert_eq!(bounds.j(), j);
            assert_eq!(bounds.u(), d);
            assert!(!bounds.stale());
        }
    }

    #[test]
    fn rms_never_increases() {
        let ref points = blobs(400);
        let mut layer = Layer::new(points, 4);
        layer.kmeans = layer.init_kmeans(KMEANS_SEED).unwrap();
        let mut bounds = layer.init_bounds();
        let mut rms = vec![layer.rms()];
        for _ in 0..8 {
            layer.kmeans = layer.step_elkan(&mut bounds);
            rms.push(layer.rms());
        }
        for window in rms.windows(2) {
            assert!(
                window[0] >= window[1] - 1e-12,
                "RMS increasing: {} -> {}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn empty_centroid_stays_put() {
        let ref points = vec![Point::new(0., 0.), Point::new(0., 1.)];
        let mut layer = Layer::new(points, 3);
        layer.kmeans = vec![Point::new(0., 0.), Point::new(0., 1.), Point::new(50., 50.)];
        let next = layer.step_naive();
        assert_eq!(next[2], Point::new(50., 50.));
        assert_eq!(next[0], Point::new(0., 0.));
    }

    #[test]
    fn neighbor_ties_go_low() {
        let ref points = vec![Point::new(0., 0.)];
        let mut layer = Layer::new(points, 2);
        layer.kmeans = vec![Point::new(1., 0.), Point::new(-1., 0.)];
        assert_eq!(layer.neighbor(&Point::new(0., 0.)).0, 0);
    }
}
