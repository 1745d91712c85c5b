//! Écriture de la playlist de destination
//!
//! Le client réel (création/remplacement via l'API distante) est un
//! collaborateur externe ; [`MemoryPlaylistWriter`] en fournit une version
//! en mémoire.

use crate::uri::PlaylistUri;
use anyhow::anyhow;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Caractéristiques d'une playlist à créer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistDetails {
    pub name: String,
    pub description: String,
    pub collaborative: bool,
    pub public: bool,
}

/// Création et mise à jour de playlists
#[async_trait]
pub trait PlaylistWriter: Send + Sync {
    /// Crée une playlist vide pour l'utilisateur
    async fn create_playlist(
        &self,
        user_id: &str,
        details: &PlaylistDetails,
    ) -> anyhow::Result<PlaylistUri>;

    /// Ajoute des morceaux à la fin d'une playlist
    async fn add_tracks(&self, playlist: &PlaylistUri, track_uris: &[String]) -> anyhow::Result<()>;

    /// Remplace tout le contenu d'une playlist
    async fn replace_tracks(
        &self,
        playlist: &PlaylistUri,
        track_uris: &[String],
    ) -> anyhow::Result<()>;
}

/// Playlist stockée par [`MemoryPlaylistWriter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredPlaylist {
    pub details: PlaylistDetails,
    pub tracks: Vec<String>,
}

/// Implémentation en mémoire de [`PlaylistWriter`]
#[derive(Debug, Default)]
pub struct MemoryPlaylistWriter {
    playlists: RwLock<IndexMap<PlaylistUri, StoredPlaylist>>,
    next_id: AtomicU64,
}

impl MemoryPlaylistWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre une playlist préexistante (cible d'un remplacement)
    pub async fn insert(&self, uri: PlaylistUri, playlist: StoredPlaylist) {
        self.playlists.write().await.insert(uri, playlist);
    }

    pub async fn get(&self, uri: &PlaylistUri) -> Option<StoredPlaylist> {
        self.playlists.read().await.get(uri).cloned()
    }

    pub async fn tracks(&self, uri: &PlaylistUri) -> Option<Vec<String>> {
        self.get(uri).await.map(|p| p.tracks)
    }

    pub async fn len(&self) -> usize {
        self.playlists.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.playlists.read().await.is_empty()
    }
}

#[async_trait]
impl PlaylistWriter for MemoryPlaylistWriter {
    async fn create_playlist(
        &self,
        user_id: &str,
        details: &PlaylistDetails,
    ) -> anyhow::Result<PlaylistUri> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let uri = PlaylistUri::new(user_id, format!("latest{id}"));
        debug!(playlist = %uri, name = %details.name, "Creating playlist");

        self.playlists.write().await.insert(
            uri.clone(),
            StoredPlaylist {
                details: details.clone(),
                tracks: Vec::new(),
            },
        );
        Ok(uri)
    }

    async fn add_tracks(&self, playlist: &PlaylistUri, track_uris: &[String]) -> anyhow::Result<()> {
        let mut playlists = self.playlists.write().await;
        let stored = playlists
            .get_mut(playlist)
            .ok_or_else(|| anyhow!("Playlist {} not found", playlist))?;
        stored.tracks.extend_from_slice(track_uris);
        Ok(())
    }

    async fn replace_tracks(
        &self,
        playlist: &PlaylistUri,
        track_uris: &[String],
    ) -> anyhow::Result<()> {
        let mut playlists = self.playlists.write().await;
        let stored = playlists
            .get_mut(playlist)
            .ok_or_else(|| anyhow!("Playlist {} not found", playlist))?;
        stored.tracks = track_uris.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str) -> PlaylistDetails {
        PlaylistDetails {
            name: name.to_string(),
            description: String::new(),
            collaborative: false,
            public: false,
        }
    }

    #[tokio::test]
    async fn test_create_then_add_tracks() {
        let writer = MemoryPlaylistWriter::new();
        let first = writer.create_playlist("me", &details("One")).await.unwrap();
        let second = writer.create_playlist("me", &details("Two")).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(first.user_id(), "me");

        writer
            .add_tracks(&first, &["t1".to_string(), "t2".to_string()])
            .await
            .unwrap();
        writer.add_tracks(&first, &["t3".to_string()]).await.unwrap();

        assert_eq!(
            writer.tracks(&first).await.unwrap(),
            vec!["t1".to_string(), "t2".to_string(), "t3".to_string()]
        );
        assert_eq!(writer.tracks(&second).await.unwrap(), Vec::<String>::new());
        assert_eq!(writer.len().await, 2);
    }

    #[tokio::test]
    async fn test_replace_unknown_playlist_fails() {
        let writer = MemoryPlaylistWriter::new();
        let uri = PlaylistUri::new("me", "missing");
        assert!(writer.replace_tracks(&uri, &["t1".to_string()]).await.is_err());
        assert!(writer.is_empty().await);
    }
}
