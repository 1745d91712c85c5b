//! Lecteur de sources paginées
//!
//! Le [`SourceReader`] est la seule frontière de la fusion : il renvoie une
//! page d'éléments d'une source pour un couple (`limit`, `offset`). Le client
//! réseau réel vit hors de cette crate ; [`MemorySourceReader`] sert de
//! lecteur en mémoire pour les tests et l'outil en ligne de commande.

use crate::candidate::TrackCandidate;
use anyhow::anyhow;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Mutex;
use tracing::debug;

/// Lecture paginée d'une source
///
/// # Contrat
///
/// - les éléments sont retournés dans l'ordre croissant de position
///   (le plus ancien de la page en premier) ;
/// - la page peut contenir moins de `limit` éléments (fin de la source) ;
/// - la page est vide quand `offset` est au-delà de la fin ;
/// - `offset = 0` est toujours accepté.
///
/// Les éventuelles relances sur erreur transitoire sont de la responsabilité
/// de l'implémentation : une erreur retournée ici interrompt la fusion.
#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn fetch(
        &self,
        source_id: &str,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<Vec<TrackCandidate>>;
}

/// Trace d'un appel à [`MemorySourceReader::fetch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub source_id: String,
    pub limit: usize,
    pub offset: usize,
}

/// Lecteur en mémoire sur un instantané complet des sources
///
/// Chaque source est stockée dans son ordre d'ajout. Tous les appels sont
/// enregistrés et consultables via [`calls`](Self::calls).
#[derive(Debug, Default)]
pub struct MemorySourceReader {
    sources: IndexMap<String, Vec<TrackCandidate>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl MemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute (ou remplace) l'historique complet d'une source
    pub fn with_source(mut self, source_id: impl Into<String>, items: Vec<TrackCandidate>) -> Self {
        self.insert_source(source_id, items);
        self
    }

    pub fn insert_source(&mut self, source_id: impl Into<String>, items: Vec<TrackCandidate>) {
        self.sources.insert(source_id.into(), items);
    }

    /// Nombre réel d'éléments d'une source
    pub fn source_len(&self, source_id: &str) -> Option<usize> {
        self.sources.get(source_id).map(Vec::len)
    }

    /// Identifiants des sources, dans leur ordre d'insertion
    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Appels reçus depuis la création du lecteur
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Appels reçus pour une source donnée
    pub fn calls_for(&self, source_id: &str) -> Vec<FetchCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.source_id == source_id)
            .collect()
    }
}

#[async_trait]
impl SourceReader for MemorySourceReader {
    async fn fetch(
        &self,
        source_id: &str,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<Vec<TrackCandidate>> {
        self.calls.lock().unwrap().push(FetchCall {
            source_id: source_id.to_string(),
            limit,
            offset,
        });

        let items = self
            .sources
            .get(source_id)
            .ok_or_else(|| anyhow!("Unknown source {}", source_id))?;

        if offset >= items.len() {
            debug!(source_id, offset, "Offset past source end");
            return Ok(Vec::new());
        }

        let end = offset.saturating_add(limit).min(items.len());
        Ok(items[offset..end].to_vec())
    }
}
