//! SourceCursor : état de pagination d'une source pendant une fusion
//!
//! Un curseur lit sa source à reculons : la première page couvre la fin de
//! l'historique, puis chaque backfill recule l'offset pour lire des éléments
//! plus anciens. Le buffer est ordonné du plus ancien au plus récent et se
//! consomme par la fin.

use crate::candidate::TrackCandidate;
use crate::error::{LatestError, Result};
use crate::reader::SourceReader;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Plancher par défaut de la taille d'un backfill
pub const DEFAULT_BACKFILL_FLOOR: usize = 10;

/// État de lecture d'une source
#[derive(Debug)]
pub struct SourceCursor {
    id: String,
    size_hint: usize,
    requested: usize,
    offset: usize,
    skip_count: usize,
    /// Largeur de la dernière fenêtre demandée au lecteur
    window_len: usize,
    buffer: Vec<TrackCandidate>,
    exhausted: bool,
    fetches: usize,
}

impl SourceCursor {
    /// Crée un curseur positionné sur la fin supposée de la source
    ///
    /// L'offset initial vaut `max(size_hint - requested, 0)`.
    pub fn new(id: impl Into<String>, size_hint: usize, requested: usize) -> Self {
        Self {
            id: id.into(),
            size_hint,
            requested,
            offset: size_hint.saturating_sub(requested),
            skip_count: 0,
            window_len: 0,
            buffer: Vec::new(),
            exhausted: false,
            fetches: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Candidats écartés depuis le dernier remplissage du buffer
    pub fn skip_count(&self) -> usize {
        self.skip_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Nombre de candidats encore en attente dans le buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Nombre d'appels au lecteur effectués par ce curseur
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Taille du prochain backfill : `max(skip_count, floor)`
    pub fn backfill_limit(&self, floor: usize) -> usize {
        self.skip_count.max(floor)
    }

    /// Lit la page initiale (`limit = requested`, offset courant)
    pub async fn load<R>(&mut self, reader: &R) -> Result<()>
    where
        R: SourceReader + ?Sized,
    {
        let items = self.fetch(reader, self.requested, self.offset).await?;
        self.window_len = self.requested;
        debug!(
            source_id = %self.id,
            offset = self.offset,
            count = items.len(),
            "Initial page loaded"
        );
        if items.is_empty() && self.size_hint > 0 {
            warn!(
                source_id = %self.id,
                size_hint = self.size_hint,
                offset = self.offset,
                "Initial page is empty, size hint is probably stale"
            );
        }
        self.buffer = items;
        Ok(())
    }

    /// Retourne le prochain candidat éligible, du plus récent au plus ancien
    ///
    /// Les fichiers locaux et les URIs présentes dans `excluded` sont écartés
    /// (et comptés dans `skip_count`). Quand le buffer est vide, un backfill
    /// est tenté si des candidats ont été écartés depuis le dernier
    /// remplissage ; sinon, ou si le backfill ne ramène rien, le curseur
    /// devient épuisé et ne lira plus jamais la source.
    pub async fn next_candidate<R>(
        &mut self,
        reader: &R,
        excluded: &HashSet<String>,
        backfill_floor: usize,
    ) -> Result<Option<TrackCandidate>>
    where
        R: SourceReader + ?Sized,
    {
        loop {
            if self.exhausted {
                return Ok(None);
            }

            if let Some(candidate) = self.buffer.pop() {
                if candidate.is_local || excluded.contains(&candidate.uri) {
                    self.skip_count += 1;
                    continue;
                }
                return Ok(Some(candidate));
            }

            if !self.backfill(reader, backfill_floor).await? {
                self.exhausted = true;
                debug!(source_id = %self.id, fetches = self.fetches, "Source exhausted");
                return Ok(None);
            }
        }
    }

    /// Recharge le buffer avec des éléments plus anciens
    ///
    /// Retourne `false` quand aucun backfill n'est possible : aucun candidat
    /// écarté, page vide, ou relecture du début de la source qui ne
    /// couvrirait rien de plus que la dernière fenêtre.
    ///
    /// À l'offset 0, la fenêtre `[0, limit)` n'est relue que si elle est plus
    /// large que la précédente : un indice de taille trop petit peut cacher
    /// des éléments que la première page n'a pas ramenés.
    async fn backfill<R>(&mut self, reader: &R, floor: usize) -> Result<bool>
    where
        R: SourceReader + ?Sized,
    {
        if self.skip_count == 0 {
            return Ok(false);
        }

        let limit = self.backfill_limit(floor);
        if self.offset == 0 && limit <= self.window_len {
            return Ok(false);
        }
        let offset = self.offset.saturating_sub(limit);
        debug!(
            source_id = %self.id,
            skips = self.skip_count,
            limit,
            offset,
            "Backfilling source"
        );

        let items = self.fetch(reader, limit, offset).await?;
        if items.is_empty() {
            return Ok(false);
        }

        self.buffer = items;
        self.offset = offset;
        self.window_len = limit;
        self.skip_count = 0;
        Ok(true)
    }

    async fn fetch<R>(&mut self, reader: &R, limit: usize, offset: usize) -> Result<Vec<TrackCandidate>>
    where
        R: SourceReader + ?Sized,
    {
        self.fetches += 1;
        reader
            .fetch(&self.id, limit, offset)
            .await
            .map_err(|e| LatestError::source_unavailable(&self.id, limit, offset, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{FetchCall, MemorySourceReader};
    use chrono::{TimeZone, Utc};

    fn track(uri: &str, secs: i64) -> TrackCandidate {
        TrackCandidate::new(uri, Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn local(uri: &str, secs: i64) -> TrackCandidate {
        TrackCandidate::local(uri, Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn test_initial_offset() {
        assert_eq!(SourceCursor::new("a", 100, 30).offset(), 70);
        assert_eq!(SourceCursor::new("a", 10, 30).offset(), 0);
        assert_eq!(SourceCursor::new("a", 0, 30).offset(), 0);
    }

    #[test]
    fn test_backfill_limit_has_a_floor() {
        let mut cursor = SourceCursor::new("a", 50, 5);
        cursor.skip_count = 3;
        assert_eq!(cursor.backfill_limit(DEFAULT_BACKFILL_FLOOR), 10);

        cursor.skip_count = 17;
        assert_eq!(cursor.backfill_limit(DEFAULT_BACKFILL_FLOOR), 17);
    }

    #[tokio::test]
    async fn test_pops_newest_first() {
        let reader = MemorySourceReader::new()
            .with_source("a", vec![track("a1", 10), track("a2", 20), track("a3", 30)]);
        let mut cursor = SourceCursor::new("a", 3, 3);
        cursor.load(&reader).await.unwrap();

        let none = HashSet::new();
        let mut uris = Vec::new();
        while let Some(c) = cursor.next_candidate(&reader, &none, 10).await.unwrap() {
            uris.push(c.uri);
        }

        assert_eq!(uris, vec!["a3", "a2", "a1"]);
        assert!(cursor.is_exhausted());
        // Aucun élément écarté : pas de backfill
        assert_eq!(cursor.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_local_tail_triggers_backfill() {
        let reader = MemorySourceReader::new()
            .with_source("a", vec![track("a1", 80), local("a2", 90)]);
        let mut cursor = SourceCursor::new("a", 2, 1);
        cursor.load(&reader).await.unwrap();
        assert_eq!(cursor.offset(), 1);

        let next = cursor
            .next_candidate(&reader, &HashSet::new(), DEFAULT_BACKFILL_FLOOR)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(next.uri, "a1");
        // Le local relu après le backfill est compté, le pop réussi ne remet pas à zéro
        assert_eq!(cursor.skip_count(), 1);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(
            reader.calls(),
            vec![
                FetchCall {
                    source_id: "a".into(),
                    limit: 1,
                    offset: 1
                },
                FetchCall {
                    source_id: "a".into(),
                    limit: 10,
                    offset: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_excluded_uris_are_skipped_without_fetching() {
        let reader = MemorySourceReader::new()
            .with_source("a", vec![track("a1", 1), track("a2", 2), track("a3", 3)]);
        let mut cursor = SourceCursor::new("a", 3, 3);
        cursor.load(&reader).await.unwrap();

        let excluded: HashSet<String> = ["a3".to_string(), "a2".to_string()].into();
        let next = cursor.next_candidate(&reader, &excluded, 10).await.unwrap();

        assert_eq!(next.map(|c| c.uri), Some("a1".to_string()));
        assert_eq!(cursor.skip_count(), 2);
        assert_eq!(cursor.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_cursor_never_fetches_again() {
        let reader = MemorySourceReader::new().with_source("a", vec![local("a1", 1)]);
        let mut cursor = SourceCursor::new("a", 1, 5);
        cursor.load(&reader).await.unwrap();

        let none = HashSet::new();
        assert!(cursor.next_candidate(&reader, &none, 10).await.unwrap().is_none());
        assert!(cursor.is_exhausted());

        let fetches = cursor.fetch_count();
        assert!(cursor.next_candidate(&reader, &none, 10).await.unwrap().is_none());
        assert_eq!(cursor.fetch_count(), fetches);
    }

    #[tokio::test]
    async fn test_empty_backfill_exhausts_cursor() {
        // Indice de taille trop grand : l'historique réel est plus court
        let reader = MemorySourceReader::new()
            .with_source("a", vec![local("a1", 1), local("a2", 2)]);
        let mut cursor = SourceCursor::new("a", 40, 2);
        assert_eq!(cursor.offset(), 38);
        cursor.load(&reader).await.unwrap();
        assert_eq!(cursor.buffered(), 0);

        let none = HashSet::new();
        assert!(cursor.next_candidate(&reader, &none, 10).await.unwrap().is_none());
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_small_hint_rereads_a_wider_head_window() {
        // Indice de taille nul : la première page ne couvre que les locaux du début
        let mut items: Vec<TrackCandidate> =
            (0..5).map(|i| local(&format!("t{i}"), i)).collect();
        items.extend((5..20).map(|i| track(&format!("t{i}"), i)));
        let reader = MemorySourceReader::new().with_source("a", items);
        let mut cursor = SourceCursor::new("a", 0, 5);
        cursor.load(&reader).await.unwrap();

        let none = HashSet::new();
        let mut uris = Vec::new();
        while let Some(c) = cursor
            .next_candidate(&reader, &none, DEFAULT_BACKFILL_FLOOR)
            .await
            .unwrap()
        {
            uris.push(c.uri);
        }

        assert_eq!(uris, vec!["t9", "t8", "t7", "t6", "t5"]);
        assert!(cursor.is_exhausted());
        // La fenêtre [0, 10) n'est relue qu'une fois
        assert_eq!(
            reader.calls(),
            vec![
                FetchCall {
                    source_id: "a".into(),
                    limit: 5,
                    offset: 0
                },
                FetchCall {
                    source_id: "a".into(),
                    limit: 10,
                    offset: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_head_window_is_not_reread_when_not_wider() {
        let reader = MemorySourceReader::new()
            .with_source("a", vec![local("a1", 1), track("a2", 2)]);
        let mut cursor = SourceCursor::new("a", 2, 12);
        cursor.load(&reader).await.unwrap();

        let none = HashSet::new();
        let first = cursor.next_candidate(&reader, &none, 10).await.unwrap();
        assert_eq!(first.map(|c| c.uri), Some("a2".to_string()));
        assert!(cursor.next_candidate(&reader, &none, 10).await.unwrap().is_none());
        assert_eq!(cursor.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_reader_failure_is_reported_with_position() {
        let reader = MemorySourceReader::new();
        let mut cursor = SourceCursor::new("ghost", 20, 5);

        let err = cursor.load(&reader).await.unwrap_err();
        match err {
            LatestError::SourceUnavailable {
                source_id,
                offset,
                limit,
                ..
            } => {
                assert_eq!(source_id, "ghost");
                assert_eq!(offset, 15);
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
