//! Requête de construction d'une playlist "latest additions"

use crate::error::{LatestError, Result};
use crate::uri::PlaylistUri;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const DEFAULT_PLAYLIST_NAME: &str = "Latest Additions";
const DEFAULT_DESCRIPTION: &str = "Autogenerated playlist";

fn default_playlist_name() -> String {
    DEFAULT_PLAYLIST_NAME.to_string()
}

/// Paramètres d'une construction de playlist
///
/// `playlist_uris` associe chaque source à son nombre d'éléments supposé.
/// L'ordre des entrées est conservé et sert à départager les égalités.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPlaylistRequest {
    #[serde(default)]
    pub playlist_uris: IndexMap<String, Option<usize>>,
    /// Nombre de morceaux voulus ; la valeur configurée est utilisée si absent
    #[serde(default)]
    pub num_tracks: Option<usize>,
    #[serde(default = "default_playlist_name")]
    pub playlist_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub overwrite_existing: bool,
    #[serde(default)]
    pub playlist_to_overwrite: Option<String>,
}

impl Default for BuildPlaylistRequest {
    fn default() -> Self {
        Self::new(std::iter::empty::<(String, usize)>())
    }
}

impl BuildPlaylistRequest {
    /// Crée une requête de création de playlist sur les sources données
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            playlist_uris: sources
                .into_iter()
                .map(|(id, size)| (id.into(), Some(size)))
                .collect(),
            num_tracks: None,
            playlist_name: default_playlist_name(),
            description: None,
            collaborative: false,
            public: false,
            overwrite_existing: false,
            playlist_to_overwrite: None,
        }
    }

    /// Décode une requête JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LatestError::InvalidRequest(e.to_string()))
    }

    pub fn with_num_tracks(mut self, num_tracks: usize) -> Self {
        self.num_tracks = Some(num_tracks);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.playlist_name = name.into();
        self
    }

    /// Remplace le contenu d'une playlist existante au lieu d'en créer une
    pub fn overwrite(mut self, playlist_uri: impl Into<String>) -> Self {
        self.overwrite_existing = true;
        self.playlist_to_overwrite = Some(playlist_uri.into());
        self
    }

    /// Nombre de morceaux à produire
    pub fn track_count(&self, default: usize) -> usize {
        self.num_tracks.unwrap_or(default)
    }

    /// Description effective de la playlist créée
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION)
    }

    /// Playlist cible d'un remplacement
    ///
    /// Retourne `None` pour une création, une erreur si le remplacement est
    /// demandé sans cible valide.
    pub fn overwrite_target(&self) -> Result<Option<PlaylistUri>> {
        if !self.overwrite_existing {
            return Ok(None);
        }
        match self.playlist_to_overwrite.as_deref() {
            Some(uri) => Ok(Some(uri.parse()?)),
            None => Err(LatestError::InvalidRequest(
                "overwrite requested without a target playlist".to_string(),
            )),
        }
    }

    /// Contrôles préalables à toute lecture
    ///
    /// Les règles portant sur les sources elles-mêmes (indice de taille
    /// manquant, ensemble vide) sont vérifiées par le moteur de fusion.
    pub fn validate(&self) -> Result<()> {
        if self.num_tracks == Some(0) {
            return Err(LatestError::InvalidRequest(
                "num_tracks must be positive".to_string(),
            ));
        }
        if !self.overwrite_existing && self.playlist_name.trim().is_empty() {
            return Err(LatestError::InvalidRequest(
                "playlist name must not be empty".to_string(),
            ));
        }
        self.overwrite_target()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_with_defaults() {
        let json = r#"{
            "playlist_uris": {
                "spotify:user:u:playlist:b": 12,
                "spotify:user:u:playlist:a": 3
            },
            "num_tracks": 20
        }"#;
        let request = BuildPlaylistRequest::from_json(json).unwrap();

        let ids: Vec<_> = request.playlist_uris.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec!["spotify:user:u:playlist:b", "spotify:user:u:playlist:a"]
        );
        assert_eq!(request.track_count(50), 20);
        assert_eq!(request.playlist_name, "Latest Additions");
        assert_eq!(request.description(), "Autogenerated playlist");
        assert!(!request.overwrite_existing);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_null_size_hint_is_kept_as_missing() {
        let json = r#"{"playlist_uris": {"a": null}}"#;
        let request = BuildPlaylistRequest::from_json(json).unwrap();
        assert_eq!(request.playlist_uris.get("a"), Some(&None));
        assert_eq!(request.track_count(50), 50);
    }

    #[test]
    fn test_validate_rejects_zero_tracks() {
        let request = BuildPlaylistRequest::new([("a", 3)]).with_num_tracks(0);
        assert!(request.validate().unwrap_err().is_invalid_request());
    }

    #[test]
    fn test_overwrite_target() {
        let request = BuildPlaylistRequest::new([("a", 3)]);
        assert!(request.overwrite_target().unwrap().is_none());

        let request = request.overwrite("spotify:user:me:playlist:latest");
        let target = request.overwrite_target().unwrap().unwrap();
        assert_eq!(target.playlist_id(), "latest");

        let mut missing = BuildPlaylistRequest::new([("a", 3)]);
        missing.overwrite_existing = true;
        assert!(missing.validate().is_err());

        let bad = BuildPlaylistRequest::new([("a", 3)]).overwrite("not-a-uri");
        assert!(matches!(
            bad.validate(),
            Err(LatestError::InvalidPlaylistUri(_))
        ));
    }
}
