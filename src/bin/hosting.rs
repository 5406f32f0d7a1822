//! Hosting Server Binary
//!
//! Serves the upload, training, lookup and map pages under `/ml`.

use clap::Parser;
use hotspots::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log();
    kys();
    hosting::Server::run(hosting::Settings::parse()).await?;
    Ok(())
}
