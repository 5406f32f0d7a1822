use crate::Error;
use std::path::Path;

/// Column names accepted for latitude, in priority order.
pub const LATITUDES: [&str; 2] = ["latitude", "lat"];
/// Column names accepted for longitude, in priority order.
pub const LONGITUDES: [&str; 4] = ["longitude", "lon", "lng", "long"];

/// Supported geolocation file formats, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    pub fn extensions() -> &'static [&'static str] {
        &["csv", "txt", "json", "geojson"]
    }
}

impl TryFrom<&str> for Format {
    type Error = Error;
    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::try_from(Path::new(name))
    }
}

impl TryFrom<&Path> for Format {
    type Error = Error;
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") | Some("txt") => Ok(Self::Csv),
            Some("json") | Some("geojson") => Ok(Self::Json),
            _ => Err(Error::Format(path.display().to_string())),
        }
    }
}

/// Index of the first header matching any alias, aliases tried in order.
pub fn column<'a>(headers: impl IntoIterator<Item = &'a str> + Clone, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .clone()
            .into_iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}
