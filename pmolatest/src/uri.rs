//! URI de playlist (`spotify:user:{user}:playlist:{id}`)

use crate::error::LatestError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const URI_SCHEME: &str = "spotify";
const WEB_BASE_URL: &str = "https://open.spotify.com";

/// Identifie une playlist par son propriétaire et son identifiant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistUri {
    user_id: String,
    playlist_id: String,
}

impl PlaylistUri {
    pub fn new(user_id: impl Into<String>, playlist_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            playlist_id: playlist_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }

    /// Lien web vers la playlist
    pub fn web_url(&self) -> String {
        format!(
            "{}/user/{}/playlist/{}",
            WEB_BASE_URL, self.user_id, self.playlist_id
        )
    }
}

impl fmt::Display for PlaylistUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:user:{}:playlist:{}",
            URI_SCHEME, self.user_id, self.playlist_id
        )
    }
}

impl FromStr for PlaylistUri {
    type Err = LatestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [scheme, "user", user, "playlist", playlist]
                if *scheme == URI_SCHEME && !user.is_empty() && !playlist.is_empty() =>
            {
                Ok(Self::new(*user, *playlist))
            }
            _ => Err(LatestError::InvalidPlaylistUri(s.to_string())),
        }
    }
}

impl Serialize for PlaylistUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlaylistUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        PlaylistUri::from_str(&value).map_err(serde::de::Error::custom)
    }
}
