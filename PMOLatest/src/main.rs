use anyhow::{Context, Result};
use indexmap::IndexMap;
use pmoconfig::{Config, get_config};
use pmolatest::{
    BuildPlaylistRequest, LatestAdditionsService, MemoryPlaylistHistory, MemoryPlaylistWriter,
    MemorySourceReader, TrackCandidate,
};
use serde::Deserialize;
use std::{env, fs, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: PMOLatest <snapshot.json> [--dry-run]";

/// Instantané des sources et requête de construction
#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default = "default_user")]
    user_id: String,
    /// Historique complet de chaque source, dans l'ordre d'ajout
    sources: IndexMap<String, Vec<TrackCandidate>>,
    #[serde(default)]
    request: BuildPlaylistRequest,
}

fn default_user() -> String {
    "local".to_string()
}

fn init_logging(config: &Config) -> Result<()> {
    if !config.get_log_enable_console()? {
        return Ok(());
    }
    let level = config.get_log_min_level()?.to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = get_config();
    init_logging(&config)?;

    let mut args = env::args().skip(1);
    let path = args.next().context(USAGE)?;
    let dry_run = args.any(|a| a == "--dry-run");

    let data = fs::read_to_string(&path).with_context(|| format!("Cannot read {}", path))?;
    let snapshot: Snapshot =
        serde_json::from_str(&data).with_context(|| format!("Invalid snapshot {}", path))?;

    let mut reader = MemorySourceReader::new();
    for (id, items) in snapshot.sources {
        reader.insert_source(id, items);
    }

    // Sans indices explicites, chaque source annonce sa taille réelle
    let mut request = snapshot.request;
    if request.playlist_uris.is_empty() {
        request.playlist_uris = reader
            .source_ids()
            .map(|id| (id.to_string(), reader.source_len(id)))
            .collect();
    }
    let reader = Arc::new(reader);

    info!("🎵 Building latest additions for {}", snapshot.user_id);
    let service = LatestAdditionsService::from_config(
        &config,
        reader.clone(),
        Arc::new(MemoryPlaylistWriter::new()),
        Arc::new(MemoryPlaylistHistory::new()),
    )?;

    if dry_run {
        let outcome = service.preview(&request).await?;
        for source in &outcome.sources {
            info!(
                "  - {} : {} emitted, {} fetch(es){}",
                source.source_id,
                source.emitted,
                source.fetches,
                if source.exhausted { ", exhausted" } else { "" }
            );
        }
        let output = serde_json::json!({
            "tracks": outcome.tracks,
            "sources": outcome.sources,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let response = service.build(&snapshot.user_id, &request).await?;
    if response.track_count == 0 {
        warn!("⚠️ No eligible track found in the given sources");
    }
    info!(
        "✅ {} track(s) written to {} ({} page read(s))",
        response.track_count,
        response.playlist_uri,
        reader.calls().len()
    );
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
