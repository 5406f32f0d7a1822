use crate::Degrees;
use crate::geo::Point;

/// Running sum of coordinates, absorbed one point at a time.
/// After absorbing N points, `mean` is their centroid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Centroid {
    latitude: Degrees,
    longitude: Degrees,
    count: usize,
}

impl Centroid {
    pub fn absorb(&mut self, point: &Point) {
        self.latitude += point.latitude;
        self.longitude += point.longitude;
        self.count += 1;
    }
    pub fn count(&self) -> usize {
        self.count
    }
    pub fn mean(&self) -> Option<Point> {
        match self.count {
            0 => None,
            n => Some(Point::new(
                self.latitude / n as Degrees,
                self.longitude / n as Degrees,
            )),
        }
    }
}

impl<'a> FromIterator<&'a Point> for Centroid {
    fn from_iter<I: IntoIterator<Item = &'a Point>>(iter: I) -> Self {
        let mut this = Self::default();
        iter.into_iter().for_each(|p| this.absorb(p));
        this
    }
}
