//! Service de construction des playlists "latest additions"
//!
//! Enchaîne validation, fusion des sources, écriture de la playlist de
//! destination (création ou remplacement) et assemblage de la réponse.

use crate::config_ext::{DEFAULT_TRACK_COUNT, LatestConfigExt};
use crate::engine::{LatestAdditionsMerger, MergeOptions, MergeOutcome};
use crate::error::{LatestError, Result};
use crate::history::PlaylistHistory;
use crate::reader::SourceReader;
use crate::request::BuildPlaylistRequest;
use crate::response::{DEFAULT_PREVIEW_SIZE, LatestPlaylistResponse};
use crate::uri::PlaylistUri;
use crate::writer::{PlaylistDetails, PlaylistWriter};
use pmoconfig::Config;
use std::sync::Arc;
use tracing::{info, warn};

/// Construit et écrit les playlists "latest additions"
pub struct LatestAdditionsService {
    merger: LatestAdditionsMerger,
    writer: Arc<dyn PlaylistWriter>,
    history: Arc<dyn PlaylistHistory>,
    default_track_count: usize,
    preview_size: usize,
}

impl LatestAdditionsService {
    /// Crée un service avec les réglages par défaut
    pub fn new(
        reader: Arc<dyn SourceReader>,
        writer: Arc<dyn PlaylistWriter>,
        history: Arc<dyn PlaylistHistory>,
    ) -> Self {
        Self {
            merger: LatestAdditionsMerger::with_options(reader, MergeOptions::default()),
            writer,
            history,
            default_track_count: DEFAULT_TRACK_COUNT,
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }

    /// Crée un service réglé depuis la configuration
    pub fn from_config(
        config: &Config,
        reader: Arc<dyn SourceReader>,
        writer: Arc<dyn PlaylistWriter>,
        history: Arc<dyn PlaylistHistory>,
    ) -> Result<Self> {
        Ok(Self {
            merger: LatestAdditionsMerger::with_options(reader, config.latest_merge_options()?),
            writer,
            history,
            default_track_count: config.get_latest_default_track_count()?,
            preview_size: config.get_latest_preview_size()?,
        })
    }

    /// Fusionne les sources d'une requête sans rien écrire
    pub async fn preview(&self, request: &BuildPlaylistRequest) -> Result<MergeOutcome> {
        request.validate()?;
        let requested = request.track_count(self.default_track_count);
        self.merger.merge(&request.playlist_uris, requested).await
    }

    /// Construit la playlist décrite par la requête pour l'utilisateur
    ///
    /// En mode remplacement, le contenu de la playlist cible est écrasé ;
    /// sinon une nouvelle playlist est créée, remplie, puis enregistrée dans
    /// l'historique de l'utilisateur.
    pub async fn build(
        &self,
        user_id: &str,
        request: &BuildPlaylistRequest,
    ) -> Result<LatestPlaylistResponse> {
        let target = request.overwrite_target()?;
        let requested = request.track_count(self.default_track_count);
        let outcome = self.preview(request).await?;
        if outcome.is_short(requested) {
            warn!(
                requested,
                produced = outcome.tracks.len(),
                "Not enough eligible tracks across sources"
            );
        }
        let track_uris = outcome.track_uris();

        let playlist = match target {
            Some(target) => {
                self.writer
                    .replace_tracks(&target, &track_uris)
                    .await
                    .map_err(|e| writer_error("replace tracks of", &target, &e))?;
                target
            }
            None => self.create(user_id, request, &track_uris).await?,
        };

        info!(
            user_id,
            playlist = %playlist,
            tracks = track_uris.len(),
            overwrite = request.overwrite_existing,
            "Latest additions playlist written"
        );

        Ok(LatestPlaylistResponse::assemble(
            playlist,
            &outcome.tracks,
            self.preview_size,
        ))
    }

    /// Playlists déjà générées pour l'utilisateur
    pub async fn previous_playlists(&self, user_id: &str) -> Result<Vec<PlaylistUri>> {
        self.history
            .playlists_for_user(user_id)
            .await
            .map_err(|e| LatestError::Writer(format!("{e:#}")))
    }

    async fn create(
        &self,
        user_id: &str,
        request: &BuildPlaylistRequest,
        track_uris: &[String],
    ) -> Result<PlaylistUri> {
        let details = PlaylistDetails {
            name: request.playlist_name.clone(),
            description: request.description().to_string(),
            collaborative: request.collaborative,
            public: request.public,
        };

        let playlist = self
            .writer
            .create_playlist(user_id, &details)
            .await
            .map_err(|e| LatestError::Writer(format!("create playlist {}: {e:#}", details.name)))?;

        self.writer
            .add_tracks(&playlist, track_uris)
            .await
            .map_err(|e| writer_error("add tracks to", &playlist, &e))?;

        self.history
            .save_user_playlist(user_id, &playlist)
            .await
            .map_err(|e| writer_error("record", &playlist, &e))?;

        Ok(playlist)
    }
}

fn writer_error(action: &str, playlist: &PlaylistUri, err: &anyhow::Error) -> LatestError {
    LatestError::Writer(format!("{action} playlist {playlist}: {err:#}"))
}
