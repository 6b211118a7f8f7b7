//! Memory Duel: a runnable Pairgrid demo server.
//!
//! Players connect over WebSocket, create or join a session, and take
//! turns flipping cards. Configuration comes from the environment:
//!
//! - `MEMORY_DUEL_ADDR` — bind address (default `0.0.0.0:8080`)
//! - `MEMORY_DUEL_ASSETS` — optional directory of card images; when set,
//!   the images are copied into the upload store and registered as the
//!   `default` card set, so clients can create sessions with
//!   `"card_set": "default"` instead of uploading.

use pairgrid::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const UPLOAD_DIR: &str = "uploads";
const CARD_SET_FILE: &str = "card_sets.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(assets) = std::env::var("MEMORY_DUEL_ASSETS") {
        seed_default_card_set(&assets).await?;
    }

    let addr = std::env::var("MEMORY_DUEL_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    tracing::info!(%addr, "starting memory-duel server");

    let server = PairgridServerBuilder::new()
        .bind(&addr)
        .card_set_path(CARD_SET_FILE)
        .build()
        .await?;

    server.run().await?;
    Ok(())
}

/// Copies every file in `assets` into the upload store and registers the
/// resulting references as the `default` card set.
async fn seed_default_card_set(
    assets: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut images = Vec::new();
    let mut entries = tokio::fs::read_dir(assets).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        images.push(UploadedImage {
            file_name: entry.file_name().to_string_lossy().into_owned(),
            bytes: tokio::fs::read(entry.path()).await?,
        });
    }

    let count = images.len();
    let refs = FsImageStore::new(UPLOAD_DIR).store_batch(images).await?;
    CardSetStore::new(CARD_SET_FILE)
        .save("default", refs)
        .await?;
    tracing::info!(images = count, "seeded default card set");
    Ok(())
}
