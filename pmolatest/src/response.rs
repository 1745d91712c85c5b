//! Réponse renvoyée après construction d'une playlist

use crate::candidate::TrackCandidate;
use crate::uri::PlaylistUri;
use serde::Serialize;

/// Nombre de morceaux affichés par défaut dans l'aperçu
pub const DEFAULT_PREVIEW_SIZE: usize = 10;

/// Lien vers la playlist écrite et aperçu de ses premiers morceaux
#[derive(Debug, Clone, Serialize)]
pub struct LatestPlaylistResponse {
    pub playlist_uri: PlaylistUri,
    pub playlist_url: String,
    /// Nombre total de morceaux écrits
    pub track_count: usize,
    pub tracklist_preview: Vec<TrackCandidate>,
}

impl LatestPlaylistResponse {
    /// Assemble la réponse ; l'aperçu est tronqué à `preview_size` morceaux
    pub fn assemble(playlist: PlaylistUri, tracks: &[TrackCandidate], preview_size: usize) -> Self {
        let preview = tracks.iter().take(preview_size).cloned().collect();
        Self {
            playlist_url: playlist.web_url(),
            playlist_uri: playlist,
            track_count: tracks.len(),
            tracklist_preview: preview,
        }
    }
}
