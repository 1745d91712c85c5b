//! Historique des playlists générées par utilisateur

use crate::uri::PlaylistUri;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Mémorise les playlists créées pour chaque utilisateur
///
/// Permet de proposer plus tard ces playlists comme cibles de remplacement.
#[async_trait]
pub trait PlaylistHistory: Send + Sync {
    async fn save_user_playlist(&self, user_id: &str, playlist: &PlaylistUri) -> anyhow::Result<()>;

    /// Playlists enregistrées pour l'utilisateur, de la plus ancienne à la plus récente
    async fn playlists_for_user(&self, user_id: &str) -> anyhow::Result<Vec<PlaylistUri>>;
}

/// Historique en mémoire
#[derive(Debug, Default)]
pub struct MemoryPlaylistHistory {
    entries: RwLock<HashMap<String, Vec<PlaylistUri>>>,
}

impl MemoryPlaylistHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaylistHistory for MemoryPlaylistHistory {
    async fn save_user_playlist(&self, user_id: &str, playlist: &PlaylistUri) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        let playlists = entries.entry(user_id.to_string()).or_default();
        if !playlists.contains(playlist) {
            playlists.push(playlist.clone());
        }
        Ok(())
    }

    async fn playlists_for_user(&self, user_id: &str) -> anyhow::Result<Vec<PlaylistUri>> {
        Ok(self
            .entries
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_playlists_for_user() {
        let history = MemoryPlaylistHistory::new();
        let uri: PlaylistUri = "spotify:user:123:playlist:456".parse().unwrap();

        history.save_user_playlist("123", &uri).await.unwrap();
        history.save_user_playlist("123", &uri).await.unwrap();

        let playlists = history.playlists_for_user("123").await.unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].to_string(), "spotify:user:123:playlist:456");

        assert!(history.playlists_for_user("other").await.unwrap().is_empty());
    }
}
