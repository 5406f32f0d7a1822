use super::*;
use crate::database::Upload;
use crate::geo::Format;
use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct Index {
    pub flash: Option<Flash>,
    pub uploads: Vec<Upload>,
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct Uploader {
    pub error: Option<String>,
    pub accept: String,
    pub limit: usize,
}

impl Uploader {
    pub fn new(limit: usize, error: Option<String>) -> Self {
        Self {
            error,
            accept: Format::extensions()
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(","),
            limit,
        }
    }
}

#[derive(Template)]
#[template(path = "configure.html")]
pub struct Configure {
    pub uploads: Vec<Upload>,
    pub n_clusters: usize,
    pub max: usize,
}

#[derive(Template)]
#[template(path = "view.html")]
pub struct View {
    pub map: String,
}
