use super::*;
use crate::Error;
use crate::Result;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Coordinates read from one or more geolocation files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Points {
    points: Vec<Point>,
    skipped: usize,
}

impl Points {
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    pub fn skipped(&self) -> usize {
        self.skipped
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reads one file, dispatching on its extension.
    /// A file without a single valid coordinate is an error.
    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let points = match Format::try_from(path)? {
            Format::Csv => Self::from_csv(file)?,
            Format::Json => Self::from_json(serde_json::from_reader(file)?)?,
        };
        if points.is_empty() {
            Err(Error::Empty(path.to_path_buf()))
        } else {
            log::debug!(
                "read {} points from {} ({} skipped)",
                points.len(),
                path.display(),
                points.skipped()
            );
            Ok(points)
        }
    }

    /// Reads every file in order and concatenates their points.
    pub fn read_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        paths
            .iter()
            .map(|p| Self::read(p.as_ref()))
            .try_fold(Self::default(), |acc, next| next.map(|next| acc.absorb(next)))
    }

    /// Header row required; rows with bad coordinates are skipped.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.iter().map(String::from).collect::<Vec<_>>();
        let names = headers.iter().map(String::as_str);
        let lat = column(names.clone(), &LATITUDES).ok_or(Error::Column("latitude"))?;
        let lon = column(names.clone(), &LONGITUDES).ok_or(Error::Column("longitude"))?;
        let mut this = Self::default();
        for record in reader.records() {
            match record
                .ok()
                .and_then(|r| Some((r.get(lat)?.to_owned(), r.get(lon)?.to_owned())))
                .and_then(|(y, x)| Point::try_from((y.as_str(), x.as_str())).ok())
            {
                Some(point) => this.points.push(point),
                None => this.skipped += 1,
            }
        }
        Ok(this)
    }

    /// Accepts GeoJSON (FeatureCollection, Feature, GeometryCollection,
    /// Point, MultiPoint) or a plain array of objects with coordinate keys.
    pub fn from_json(value: Value) -> Result<Self> {
        let mut this = Self::default();
        match value {
            Value::Array(records) => records.iter().for_each(|r| this.record(r)),
            Value::Object(_) if value.get("type").is_some() => this.geometry(&value),
            _ => return Err(Error::Format(String::from("json"))),
        }
        Ok(this)
    }

    fn geometry(&mut self, value: &Value) {
        match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => Self::each(value, "features")
                .iter()
                .for_each(|f| self.geometry(f)),
            Some("GeometryCollection") => Self::each(value, "geometries")
                .iter()
                .for_each(|g| self.geometry(g)),
            Some("Feature") => match value.get("geometry") {
                Some(geometry) if !geometry.is_null() => self.geometry(geometry),
                _ => self.skipped += 1,
            },
            Some("Point") => self.position(value.get("coordinates")),
            Some("MultiPoint") => Self::each(value, "coordinates")
                .iter()
                .for_each(|c| self.position(Some(c))),
            _ => self.skipped += 1,
        }
    }

    /// GeoJSON positions are `[longitude, latitude, ...]`.
    fn position(&mut self, coordinates: Option<&Value>) {
        match coordinates
            .and_then(Value::as_array)
            .filter(|c| c.len() >= 2)
            .and_then(|c| Some((c[1].as_f64()?, c[0].as_f64()?)))
            .and_then(|pair| Point::try_from(pair).ok())
        {
            Some(point) => self.points.push(point),
            None => self.skipped += 1,
        }
    }

    fn record(&mut self, value: &Value) {
        let lookup = |aliases: &[&str]| {
            value.as_object().and_then(|o| {
                aliases.iter().find_map(|alias| {
                    o.iter()
                        .find(|(k, _)| k.trim().eq_ignore_ascii_case(alias))
                        .map(|(_, v)| v)
                })
            })
        };
        let degrees = |v: &Value| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok());
        match lookup(&LATITUDES[..])
            .and_then(degrees)
            .zip(lookup(&LONGITUDES[..]).and_then(degrees))
            .and_then(|pair| Point::try_from(pair).ok())
        {
            Some(point) => self.points.push(point),
            None => self.skipped += 1,
        }
    }

    fn each<'v>(value: &'v Value, key: &str) -> &'v [Value] {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn absorb(mut self, other: Self) -> Self {
        self.points.extend(other.points);
        self.skipped += other.skipped;
        self
    }
}

impl From<Vec<Point>> for Points {
    fn from(points: Vec<Point>) -> Self {
        Self { points, skipped: 0 }
    }
}

impl From<Points> for Vec<Point> {
    fn from(points: Points) -> Self {
        points.points
    }
}
