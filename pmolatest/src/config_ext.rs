//! Extension de pmoconfig pour la construction des playlists "latest additions"
//!
//! Les réglages vivent sous la clé `latest_additions` :
//!
//! ```yaml
//! latest_additions:
//!   default_track_count: 50
//!   backfill_floor: 10
//!   preview_size: 10
//!   concurrent_fetch: true
//! ```
//!
//! Comme pour les autres extensions, les getters persistent la valeur par
//! défaut quand la clé est absente ou invalide.

use crate::cursor::DEFAULT_BACKFILL_FLOOR;
use crate::engine::MergeOptions;
use crate::response::DEFAULT_PREVIEW_SIZE;
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::{Number, Value};

/// Nombre de morceaux produit quand la requête ne le précise pas
pub const DEFAULT_TRACK_COUNT: usize = 50;

const SECTION: &str = "latest_additions";

/// Trait d'extension pour pmoconfig::Config
pub trait LatestConfigExt {
    /// Nombre de morceaux par défaut (toujours > 0)
    fn get_latest_default_track_count(&self) -> Result<usize>;
    fn set_latest_default_track_count(&self, count: usize) -> Result<()>;

    /// Plancher de la taille d'un backfill (toujours > 0)
    fn get_latest_backfill_floor(&self) -> Result<usize>;
    fn set_latest_backfill_floor(&self, floor: usize) -> Result<()>;

    /// Taille de l'aperçu renvoyé après construction
    fn get_latest_preview_size(&self) -> Result<usize>;
    fn set_latest_preview_size(&self, size: usize) -> Result<()>;

    /// Lecture parallèle des pages initiales
    fn get_latest_concurrent_fetch(&self) -> Result<bool>;
    fn set_latest_concurrent_fetch(&self, enabled: bool) -> Result<()>;

    /// Options du moteur de fusion issues de la configuration
    fn latest_merge_options(&self) -> Result<MergeOptions>;
}

/// Lit un entier positif, ou persiste et retourne la valeur par défaut
fn positive_or_default(config: &Config, key: &str, default: usize) -> Result<usize> {
    match config.get_usize(&[SECTION, key]) {
        Some(value) if value > 0 => Ok(value),
        _ => {
            set_usize(config, key, default)?;
            Ok(default)
        }
    }
}

fn set_usize(config: &Config, key: &str, value: usize) -> Result<()> {
    config.set_value(&[SECTION, key], Value::Number(Number::from(value)))
}

impl LatestConfigExt for Config {
    fn get_latest_default_track_count(&self) -> Result<usize> {
        positive_or_default(self, "default_track_count", DEFAULT_TRACK_COUNT)
    }

    fn set_latest_default_track_count(&self, count: usize) -> Result<()> {
        set_usize(self, "default_track_count", count)
    }

    fn get_latest_backfill_floor(&self) -> Result<usize> {
        positive_or_default(self, "backfill_floor", DEFAULT_BACKFILL_FLOOR)
    }

    fn set_latest_backfill_floor(&self, floor: usize) -> Result<()> {
        set_usize(self, "backfill_floor", floor)
    }

    fn get_latest_preview_size(&self) -> Result<usize> {
        match self.get_usize(&[SECTION, "preview_size"]) {
            Some(size) => Ok(size),
            None => {
                self.set_latest_preview_size(DEFAULT_PREVIEW_SIZE)?;
                Ok(DEFAULT_PREVIEW_SIZE)
            }
        }
    }

    fn set_latest_preview_size(&self, size: usize) -> Result<()> {
        set_usize(self, "preview_size", size)
    }

    fn get_latest_concurrent_fetch(&self) -> Result<bool> {
        match self.get_value(&[SECTION, "concurrent_fetch"]) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => {
                self.set_latest_concurrent_fetch(true)?;
                Ok(true)
            }
        }
    }

    fn set_latest_concurrent_fetch(&self, enabled: bool) -> Result<()> {
        self.set_value(&[SECTION, "concurrent_fetch"], Value::Bool(enabled))
    }

    fn latest_merge_options(&self) -> Result<MergeOptions> {
        Ok(MergeOptions {
            backfill_floor: self.get_latest_backfill_floor()?,
            concurrent_fetch: self.get_latest_concurrent_fetch()?,
        })
    }
}
