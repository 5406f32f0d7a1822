use crate::Degrees;

/// Per-point metadata for Elkan's accelerated k-means algorithm.
///
/// Stores distance bounds that enable triangle inequality pruning.
/// Each point maintains lower bounds to all K centroids plus an upper bound
/// to its current assignment.
///
/// # Algorithm (Elkan 2003)
///
/// If we know d(x, c) ≤ u and d(c, c') ≥ 2u, then d(x, c') cannot be less
/// than d(x, c), so we skip computing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    /// Currently assigned centroid index.
    j: usize,
    /// Lower bounds on distance to each centroid.
    lower: Vec<Degrees>,
    /// Upper bound on distance to assigned centroid.
    error: Degrees,
    /// Whether the upper bound is potentially stale.
    stale: bool,
}

impl Bounds {
    /// Currently assigned centroid index.
    pub fn j(&self) -> usize {
        self.j
    }
    /// Upper bound on distance to assigned centroid.
    pub fn u(&self) -> Degrees {
        self.error
    }
    /// Whether the upper bound may be outdated.
    pub fn stale(&self) -> bool {
        self.stale
    }
    fn lower(&self, j: usize) -> Degrees {
        self.lower[j]
    }
    /// Checks if centroid j could be closer than current assignment.
    ///
    /// Returns true (needs checking) if all triangle inequality filters fail:
    /// 1. j ≠ c(x)
    /// 2. u(x) > l(x,j)
    /// 3. u(x) > d(c(x),j)/2
    pub fn has_shifted(&self, pairs: &[Vec<Degrees>], j: usize) -> bool {
        self.j() != j && self.u() > self.lower(j) && self.u() > 0.5 * pairs[self.j()][j]
    }
    /// True when u(x) ≤ s(c(x)) where s(c) = min_{c'≠c} d(c,c')/2.
    pub fn can_exclude(&self, midpoints: &[Degrees]) -> bool {
        self.u() <= midpoints[self.j()]
    }
    /// Lowers are decreased by movement; upper is increased.
    pub fn update(&mut self, movements: &[Degrees]) {
        self.lower
            .iter_mut()
            .zip(movements.iter())
            .for_each(|(lower, movement)| *lower = (*lower - movement).max(0.));
        self.error += movements[self.j()];
        self.stale = true;
    }
    /// Tightens upper bound to the actual distance.
    pub fn refresh(&mut self, distance: Degrees) {
        self.lower[self.j] = distance;
        self.error = distance;
        self.stale = false;
    }
    /// Records distance to centroid j, reassigning if strictly closer.
    pub fn witness(&mut self, distance: Degrees, j: usize) {
        self.lower[j] = distance;
        if distance < self.u() {
            self.j = j;
            self.error = distance;
        }
    }
}

/// Exact bounds from the distances to every centroid.
/// Ties go to the lowest index.
impl From<Vec<Degrees>> for Bounds {
    fn from(lower: Vec<Degrees>) -> Self {
        let (j, error) = lower
            .iter()
            .copied()
            .enumerate()
            .fold((0, Degrees::INFINITY), |(j, min), (i, d)| {
                if d < min { (i, d) } else { (j, min) }
            });
        Self {
            j,
            lower,
            error,
            stale: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_bounds_pick_nearest() {
        let b = Bounds::from(vec![3., 1., 1., 2.]);
        assert_eq!(b.j(), 1);
        assert_eq!(b.u(), 1.);
        assert!(!b.stale());
    }

    #[test]
    fn update_loosens_bounds() {
        let mut b = Bounds::from(vec![1., 4.]);
        b.update(&[0.5, 5.]);
        assert_eq!(b.u(), 1.5);
        assert_eq!(b.lower(1), 0.);
        assert!(b.stale());
        b.refresh(1.2);
        assert_eq!(b.u(), 1.2);
        assert!(!b.stale());
    }

    #[test]
    fn witness_reassigns_only_when_closer() {
        let mut b = Bounds::from(vec![1., 4., 9.]);
        b.witness(1., 2);
        assert_eq!(b.j(), 0);
        b.witness(0.5, 1);
        assert_eq!(b.j(), 1);
        assert_eq!(b.u(), 0.5);
    }

    #[test]
    fn triangle_filters() {
        let b = Bounds::from(vec![1., 3.]);
        let pairs = vec![vec![0., 4.], vec![4., 0.]];
        assert!(!b.has_shifted(&pairs, 0));
        assert!(!b.has_shifted(&pairs, 1));
        assert!(b.can_exclude(&[2., 2.]));
        let b = Bounds::from(vec![1., 0.9]);
        assert_eq!(b.j(), 1);
        assert!(!b.can_exclude(&[0.5, 0.5]));
    }
}
