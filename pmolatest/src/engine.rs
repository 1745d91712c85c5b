//! Moteur de fusion des ajouts récents
//!
//! Produit les K morceaux les plus récemment ajoutés sur l'ensemble des
//! sources, sans doublon ni fichier local. Chaque source est lue via un
//! [`SourceCursor`] ; à chaque tour, le curseur qui détient le candidat le
//! plus récent gagne, son candidat est émis et il avance d'un cran.
//!
//! En cas d'égalité de date d'ajout, la source la plus tôt dans l'ordre de la
//! requête l'emporte.

use crate::candidate::TrackCandidate;
use crate::cursor::{DEFAULT_BACKFILL_FLOOR, SourceCursor};
use crate::error::{LatestError, Result};
use crate::reader::SourceReader;
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Réglages de la fusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Taille minimale d'un backfill
    pub backfill_floor: usize,
    /// Lit les pages initiales de toutes les sources en parallèle
    pub concurrent_fetch: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            backfill_floor: DEFAULT_BACKFILL_FLOOR,
            concurrent_fetch: true,
        }
    }
}

/// Bilan d'une source à l'issue de la fusion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    pub fetches: usize,
    pub emitted: usize,
    pub exhausted: bool,
}

/// Résultat d'une fusion
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Morceaux retenus, du plus récent au plus ancien
    pub tracks: Vec<TrackCandidate>,
    /// Bilan par source, dans l'ordre de la requête
    pub sources: Vec<SourceReport>,
}

impl MergeOutcome {
    pub fn track_uris(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.uri.clone()).collect()
    }

    /// Vrai si moins de morceaux que demandé ont pu être trouvés
    pub fn is_short(&self, requested: usize) -> bool {
        self.tracks.len() < requested
    }
}

/// Fusionne plusieurs sources paginées en une liste ordonnée par date d'ajout
#[derive(Clone)]
pub struct LatestAdditionsMerger {
    reader: Arc<dyn SourceReader>,
    options: MergeOptions,
}

impl LatestAdditionsMerger {
    pub fn new(reader: Arc<dyn SourceReader>) -> Self {
        Self::with_options(reader, MergeOptions::default())
    }

    pub fn with_options(reader: Arc<dyn SourceReader>, options: MergeOptions) -> Self {
        Self { reader, options }
    }

    /// Fusionne les sources et retourne au plus `requested` morceaux
    ///
    /// # Arguments
    ///
    /// * `sources` - identifiant de source → indice de taille. L'ordre de la
    ///   map fixe l'ordre de départage des égalités.
    /// * `requested` - nombre de morceaux voulus (K)
    ///
    /// # Errors
    ///
    /// - [`LatestError::InvalidRequest`] si `requested` vaut 0, si aucune
    ///   source n'est donnée, ou si une source n'a pas d'indice de taille ;
    /// - [`LatestError::SourceUnavailable`] si une lecture échoue, sans
    ///   résultat partiel.
    pub async fn merge(
        &self,
        sources: &IndexMap<String, Option<usize>>,
        requested: usize,
    ) -> Result<MergeOutcome> {
        let mut cursors = Self::build_cursors(sources, requested)?;
        let reader = self.reader.as_ref();
        let floor = self.options.backfill_floor;

        if self.options.concurrent_fetch {
            try_join_all(cursors.iter_mut().map(|cursor| cursor.load(reader))).await?;
        } else {
            for cursor in cursors.iter_mut() {
                cursor.load(reader).await?;
            }
        }

        // Amorçage : un candidat par curseur, sans doublon entre sources
        let mut held: Vec<Option<TrackCandidate>> = Vec::with_capacity(cursors.len());
        let mut primed: HashSet<String> = HashSet::new();
        for cursor in cursors.iter_mut() {
            let candidate = cursor.next_candidate(reader, &primed, floor).await?;
            if let Some(c) = &candidate {
                primed.insert(c.uri.clone());
            }
            held.push(candidate);
        }

        let mut tracks: Vec<TrackCandidate> = Vec::with_capacity(requested);
        let mut emitted: Vec<usize> = vec![0; cursors.len()];
        let mut emitted_uris: HashSet<String> = HashSet::with_capacity(requested);

        while tracks.len() < requested {
            let Some(winner) = select_latest(&held) else {
                debug!(produced = tracks.len(), requested, "All sources exhausted");
                break;
            };
            let Some(track) = held[winner].take() else {
                break;
            };

            emitted_uris.insert(track.uri.clone());
            emitted[winner] += 1;
            tracks.push(track);

            if tracks.len() == requested {
                break;
            }

            let mut excluded = emitted_uris.clone();
            excluded.extend(held.iter().flatten().map(|c| c.uri.clone()));
            held[winner] = cursors[winner]
                .next_candidate(reader, &excluded, floor)
                .await?;
        }

        let reports: Vec<SourceReport> = cursors
            .iter()
            .zip(emitted)
            .map(|(cursor, emitted)| SourceReport {
                source_id: cursor.id().to_string(),
                fetches: cursor.fetch_count(),
                emitted,
                exhausted: cursor.is_exhausted(),
            })
            .collect();

        info!(
            sources = reports.len(),
            requested,
            produced = tracks.len(),
            fetches = reports.iter().map(|r| r.fetches).sum::<usize>(),
            "Latest additions merged"
        );

        Ok(MergeOutcome {
            tracks,
            sources: reports,
        })
    }

    fn build_cursors(
        sources: &IndexMap<String, Option<usize>>,
        requested: usize,
    ) -> Result<Vec<SourceCursor>> {
        if requested == 0 {
            return Err(LatestError::InvalidRequest(
                "requested track count must be positive".to_string(),
            ));
        }
        if sources.is_empty() {
            return Err(LatestError::InvalidRequest("no source given".to_string()));
        }

        sources
            .iter()
            .map(|(id, size_hint)| {
                if id.trim().is_empty() {
                    return Err(LatestError::InvalidRequest("empty source id".to_string()));
                }
                let size_hint = size_hint.ok_or_else(|| {
                    LatestError::InvalidRequest(format!("source {} has no size hint", id))
                })?;
                Ok(SourceCursor::new(id.clone(), size_hint, requested))
            })
            .collect()
    }
}

/// Index du candidat le plus récent ; le premier rencontré gagne les égalités
fn select_latest(held: &[Option<TrackCandidate>]) -> Option<usize> {
    let mut best: Option<(usize, &TrackCandidate)> = None;
    for (index, candidate) in held.iter().enumerate() {
        let Some(candidate) = candidate else {
            continue;
        };
        match best {
            Some((_, current)) if !candidate.is_newer_than(current) => {}
            _ => best = Some((index, candidate)),
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn track(uri: &str, secs: i64) -> TrackCandidate {
        TrackCandidate::new(uri, Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn test_select_latest_prefers_first_on_ties() {
        let held = vec![
            None,
            Some(track("b", 50)),
            Some(track("c", 70)),
            Some(track("d", 70)),
        ];
        assert_eq!(select_latest(&held), Some(2));
    }

    #[test]
    fn test_select_latest_on_empty_slots() {
        assert_eq!(select_latest(&[None, None]), None);
        assert_eq!(select_latest(&[]), None);
    }

    #[test]
    fn test_build_cursors_rejects_missing_hint() {
        let mut sources = IndexMap::new();
        sources.insert("a".to_string(), Some(3));
        sources.insert("b".to_string(), None);

        let err = LatestAdditionsMerger::build_cursors(&sources, 5).unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_build_cursors_keeps_request_order() {
        let mut sources = IndexMap::new();
        sources.insert("z".to_string(), Some(30));
        sources.insert("a".to_string(), Some(0));

        let cursors = LatestAdditionsMerger::build_cursors(&sources, 10).unwrap();
        let ids: Vec<_> = cursors.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(cursors[0].offset(), 20);
        assert_eq!(cursors[1].offset(), 0);
    }
}
