use crate::database::Upload;
use serde::Deserialize;

/// Files picked on the index page, plus the cluster count once configured.
/// Both the repeated `pk` fields and `n_clusters` come from an
/// url-encoded body.
#[derive(Debug, Default, PartialEq)]
pub struct Selection {
    pub pks: Vec<i64>,
    /// `None` when absent, unparsable, or outside `1..=KMEANS_MAX_CLUSTERS`.
    pub n_clusters: Option<usize>,
}

impl From<&[u8]> for Selection {
    fn from(body: &[u8]) -> Self {
        let mut selection = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "pk" => match value.trim().parse::<i64>() {
                    Ok(pk) if !selection.pks.contains(&pk) => selection.pks.push(pk),
                    Ok(_) => continue,
                    Err(_) => log::debug!("ignoring pk {:?}", value),
                },
                "n_clusters" => {
                    selection.n_clusters = value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|n| (1..=crate::KMEANS_MAX_CLUSTERS).contains(n))
                }
                _ => continue,
            }
        }
        selection
    }
}

impl Selection {
    /// Puts selected uploads back in the order their pks were submitted.
    /// Points are concatenated in this order before seeding.
    pub fn order(&self, mut uploads: Vec<Upload>) -> Vec<Upload> {
        uploads.sort_by_key(|u| self.pks.iter().position(|pk| *pk == u.id));
        uploads
    }
}

/// Query string of the lookup API. Empty values count as missing.
#[derive(Debug, Default, Deserialize)]
pub struct Lookup {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl Lookup {
    pub fn coordinates(&self) -> Option<(&str, &str)> {
        Some((present(&self.latitude)?, present(&self.longitude)?))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
