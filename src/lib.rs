//! Geolocation hotspot clustering.
//!
//! Upload coordinate files, train k-means over a selection of them, and
//! look up the precomputed summary of the cluster any coordinate falls into.
pub mod clustering;
pub mod error;
pub mod geo;
pub mod hotspot;
pub mod media;

#[cfg(feature = "server")]
pub mod database;
#[cfg(feature = "server")]
pub mod hosting;

pub use error::Error;
pub use error::Result;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Latitudes and longitudes.
pub type Degrees = f64;
/// Great-circle distances.
pub type Kilometers = f64;
/// Cluster label assigned by k-means.
pub type Cluster = usize;

// ============================================================================
// GEODESY
// ============================================================================
/// Mean earth radius (IUGG).
pub const EARTH_RADIUS: Kilometers = 6371.0088;

// ============================================================================
// K-MEANS CLUSTERING
// ============================================================================
/// Lloyd iterations before giving up on convergence.
pub const KMEANS_MAX_ITERATIONS: usize = 300;
/// Stop once no centroid drifts further than this (degrees).
pub const KMEANS_TOLERANCE: Degrees = 1e-6;
/// Seed for deterministic k-means++ initialization.
pub const KMEANS_SEED: u64 = 0x5EED_0F_C0FFEE;
/// Cluster count offered by the configure form.
pub const KMEANS_DEFAULT_CLUSTERS: usize = 8;
/// Largest cluster count accepted from a form or the command line.
pub const KMEANS_MAX_CLUSTERS: usize = 1024;

// ============================================================================
// MEDIA ROOT LAYOUT
// ============================================================================
/// Persisted k-means model.
pub const KMEANS_FILE: &str = "kmeans.json";
/// Rendered cluster map.
pub const MAP_FILE: &str = "hotspots.html";
/// Subdirectory holding uploaded files.
pub const UPLOADS_DIR: &str = "uploads";

// ============================================================================
// MAP RENDERING
// ============================================================================
/// Smallest circle drawn for a cluster, so singletons stay visible.
pub const MAP_MIN_RADIUS_METRES: f64 = 50.;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        println!();
        log::warn!("interrupt received, exiting immediately");
        std::process::exit(0);
    });
}

/// Seconds since the unix epoch.
pub fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
