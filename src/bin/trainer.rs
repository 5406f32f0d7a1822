//! Offline Trainer Binary
//!
//! Fits k-means over local coordinate files without the web server, and
//! queries the persisted model.

use anyhow::Context;
use clap::Parser;
use hotspots::clustering::KMeans;
use hotspots::clustering::Model;
use hotspots::geo::Point;
use hotspots::hotspot::Predictor;
use hotspots::hotspot::Viewer;
use hotspots::media::Media;
use hotspots::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
enum Command {
    #[command(about = "Fit k-means over coordinate files and render the map")]
    Train {
        #[arg(long, default_value_t = KMEANS_DEFAULT_CLUSTERS)]
        clusters: usize,
        #[arg(long, env = "MEDIA_ROOT", default_value = "media")]
        media_root: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    #[command(about = "Predict the cluster of a coordinate with the persisted model")]
    Predict {
        #[arg(long, allow_hyphen_values = true)]
        latitude: Degrees,
        #[arg(long, allow_hyphen_values = true)]
        longitude: Degrees,
        #[arg(long, env = "MEDIA_ROOT", default_value = "media")]
        media_root: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    log();
    match Command::parse() {
        Command::Train {
            clusters,
            media_root,
            files,
        } => {
            let media = Media::new(media_root)?;
            let predictor = Predictor::train(&files[..], KMeans::from(clusters))?;
            predictor.save_kmeans_to(&media.kmeans())?;
            let summaries = predictor.results();
            Viewer::new(summaries.clone()).save_map_to(&media.map())?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            Ok(())
        }
        Command::Predict {
            latitude,
            longitude,
            media_root,
        } => {
            let ref path = Media::new(media_root)?.kmeans();
            let model = Model::load(path)
                .with_context(|| format!("loading model from {}", path.display()))?;
            let point = Point::try_from((latitude, longitude))?;
            println!("{}", model.predict(&point));
            Ok(())
        }
    }
}
