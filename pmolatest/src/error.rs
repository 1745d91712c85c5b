//! Types d'erreurs pour pmolatest

use thiserror::Error;

/// Type Result spécialisé pour pmolatest
pub type Result<T> = std::result::Result<T, LatestError>;

/// Erreurs de construction d'une playlist "latest additions"
#[derive(Error, Debug)]
pub enum LatestError {
    /// Le lecteur de source a échoué (page initiale ou backfill).
    ///
    /// Toujours fatal : aucun résultat partiel n'est retourné.
    #[error("Source {source_id} unavailable (limit {limit}, offset {offset}): {reason}")]
    SourceUnavailable {
        source_id: String,
        offset: usize,
        limit: usize,
        reason: String,
    },

    /// Requête rejetée avant toute lecture
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// URI de playlist mal formée
    #[error("Invalid playlist URI: {0}")]
    InvalidPlaylistUri(String),

    /// Échec de l'écriture de la playlist de destination ou de l'historique
    #[error("Playlist write failed: {0}")]
    Writer(String),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl LatestError {
    /// Construit une erreur de source depuis l'erreur remontée par le lecteur
    pub fn source_unavailable(
        source_id: &str,
        limit: usize,
        offset: usize,
        err: &anyhow::Error,
    ) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.to_string(),
            offset,
            limit,
            reason: format!("{err:#}"),
        }
    }

    /// Vérifie si l'erreur provient d'un lecteur de source
    pub fn is_source_error(&self) -> bool {
        matches!(self, LatestError::SourceUnavailable { .. })
    }

    /// Vérifie si la requête a été rejetée avant toute lecture
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            LatestError::InvalidRequest(_) | LatestError::InvalidPlaylistUri(_)
        )
    }
}
