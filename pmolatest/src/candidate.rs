//! TrackCandidate : un morceau horodaté lu depuis une source

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Un morceau candidat à l'insertion dans la playlist fusionnée
///
/// L'égalité (et le hachage) portent uniquement sur l'URI : deux entrées de
/// sources différentes pointant vers le même morceau sont des doublons, quelle
/// que soit leur date d'ajout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCandidate {
    /// Identifiant unique du morceau (URI)
    pub uri: String,
    /// Date d'ajout dans la source, telle que rapportée par celle-ci
    pub added_at: DateTime<Utc>,
    /// Fichier local : jamais éligible
    #[serde(default)]
    pub is_local: bool,
}

impl TrackCandidate {
    /// Crée un candidat jouable
    pub fn new(uri: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        Self {
            uri: uri.into(),
            added_at,
            is_local: false,
        }
    }

    /// Crée un candidat marqué comme fichier local
    pub fn local(uri: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        Self {
            uri: uri.into(),
            added_at,
            is_local: true,
        }
    }

    /// Retourne l'URI du morceau
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Vrai si le candidat est plus récent que `other` (strictement)
    pub fn is_newer_than(&self, other: &TrackCandidate) -> bool {
        self.added_at > other.added_at
    }
}

impl PartialEq for TrackCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for TrackCandidate {}

impl Hash for TrackCandidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}
