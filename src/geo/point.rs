use crate::Degrees;
use crate::EARTH_RADIUS;
use crate::Error;
use crate::Kilometers;
use serde::Deserialize;
use serde::Serialize;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: Degrees,
    pub longitude: Degrees,
}

impl Point {
    pub fn new(latitude: Degrees, longitude: Degrees) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90. ..=90.).contains(&self.latitude)
            && (-180. ..=180.).contains(&self.longitude)
    }

    /// Squared distance in degree space. This is what k-means minimizes.
    pub fn squared(&self, other: &Self) -> Degrees {
        let dy = self.latitude - other.latitude;
        let dx = self.longitude - other.longitude;
        dy * dy + dx * dx
    }

    pub fn euclidean(&self, other: &Self) -> Degrees {
        self.squared(other).sqrt()
    }

    /// Great-circle distance.
    pub fn haversine(&self, other: &Self) -> Kilometers {
        let (phi1, phi2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dphi = (other.latitude - self.latitude).to_radians();
        let dlam = (other.longitude - self.longitude).to_radians();
        let a = (dphi / 2.).sin().powi(2) + phi1.cos() * phi2.cos() * (dlam / 2.).sin().powi(2);
        2. * EARTH_RADIUS * a.sqrt().min(1.).asin()
    }
}

impl TryFrom<(Degrees, Degrees)> for Point {
    type Error = Error;
    fn try_from((latitude, longitude): (Degrees, Degrees)) -> Result<Self, Self::Error> {
        Some(Self::new(latitude, longitude))
            .filter(Self::is_valid)
            .ok_or(Error::Coordinate(latitude, longitude))
    }
}

impl TryFrom<(&str, &str)> for Point {
    type Error = Error;
    fn try_from((latitude, longitude): (&str, &str)) -> Result<Self, Self::Error> {
        match (
            latitude.trim().parse::<Degrees>(),
            longitude.trim().parse::<Degrees>(),
        ) {
            (Ok(lat), Ok(lon)) => Self::try_from((lat, lon)),
            _ => Err(Error::Coordinate(Degrees::NAN, Degrees::NAN)),
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}
