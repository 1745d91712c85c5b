//! # pmoconfig - Configuration YAML de PMOLatest
//!
//! La configuration effective est construite à partir de trois couches :
//! 1. les valeurs par défaut embarquées (`pmolatest.yaml`) ;
//! 2. le fichier `config.yaml` du répertoire de configuration ;
//! 3. les variables d'environnement `PMOLATEST_CONFIG__SECTION__CLE=valeur`.
//!
//! Toutes les clés sont ramenées en minuscules avant la fusion, si bien que
//! `Latest_Additions:` et `latest_additions:` désignent la même section.
//! Le résultat fusionné est réécrit dans `config.yaml`.
//!
//! Les crates métier ajoutent leurs accesseurs typés par des traits
//! d'extension (voir `pmolatest::LatestConfigExt`).
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let level = config.get_log_min_level()?;
//! config.set_log_min_level("DEBUG".to_string())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{debug, info, warn};

const DEFAULT_CONFIG: &str = include_str!("pmolatest.yaml");
const CONFIG_FILE: &str = "config.yaml";

const ENV_CONFIG_DIR: &str = "PMOLATEST_CONFIG";
const ENV_PREFIX: &str = "PMOLATEST_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmolatest";

const LOG_MIN_LEVEL: [&str; 3] = ["host", "logger", "min_level"];
const LOG_ENABLE_CONSOLE: [&str; 3] = ["host", "logger", "enable_console"];
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMOLatest configuration"));
}

/// Configuration chargée et son fichier de persistance
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: PathBuf,
    data: Mutex<Value>,
}

impl Config {
    /// Répertoire de configuration retenu, créé si besoin
    ///
    /// Ordre de recherche : `directory` s'il est non vide, la variable
    /// `PMOLATEST_CONFIG`, `./.pmolatest`, puis `~/.pmolatest`. Le répertoire
    /// doit être accessible en écriture.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = locate_config_dir(directory);
        ensure_writable_dir(Path::new(&dir))?;
        Ok(dir)
    }

    /// Charge la configuration depuis `directory` (vide : recherche par défaut)
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        let path = Path::new(&config_dir).join(CONFIG_FILE);
        info!(config_file = %path.display(), "Loading configuration");

        let mut data = lower_keys(serde_yaml::from_str(DEFAULT_CONFIG)?);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let external: Value = serde_yaml::from_str(&text)?;
                merge_yaml(&mut data, &lower_keys(external));
            }
            Err(_) => debug!(config_file = %path.display(), "No config file, using embedded defaults"),
        }
        apply_env_overrides(&mut data);

        let config = Self {
            config_dir,
            path,
            data: Mutex::new(data),
        };
        config.save()?;
        Ok(config)
    }

    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    /// Réécrit `config.yaml` avec l'état courant
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock()?)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Écrit une valeur au chemin donné puis sauvegarde
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        insert_at(&mut *self.lock()?, path, value)?;
        self.save()
    }

    /// Lit la valeur au chemin donné ; erreur si le chemin n'existe pas
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        lookup(&*self.lock()?, path).cloned()
    }

    /// Lit un entier positif ou nul (nombre ou chaîne numérique)
    pub fn get_usize(&self, path: &[&str]) -> Option<usize> {
        match self.get_value(path).ok()? {
            Value::Number(n) => n.as_u64().and_then(|v| usize::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => {
                warn!(path = %path.join("."), "Configuration value is not a number");
                None
            }
        }
    }

    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&LOG_MIN_LEVEL) {
            Ok(Value::String(level)) => Ok(level),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&LOG_MIN_LEVEL, Value::String(level))
    }

    /// Sortie console des logs (activée par défaut)
    pub fn get_log_enable_console(&self) -> Result<bool> {
        match self.get_value(&LOG_ENABLE_CONSOLE) {
            Ok(Value::Bool(enabled)) => Ok(enabled),
            _ => Ok(true),
        }
    }

    pub fn set_log_enable_console(&self, enabled: bool) -> Result<()> {
        self.set_value(&LOG_ENABLE_CONSOLE, Value::Bool(enabled))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }
}

/// Configuration globale, chargée au premier accès
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn locate_config_dir(directory: &str) -> String {
    if !directory.is_empty() {
        return directory.to_string();
    }
    if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
        info!(env_var = ENV_CONFIG_DIR, path = %dir, "Config directory taken from env");
        return dir;
    }
    if Path::new(CONFIG_DIR_NAME).exists() {
        return CONFIG_DIR_NAME.to_string();
    }
    home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .filter(|dir| dir.exists())
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_else(|| CONFIG_DIR_NAME.to_string())
}

fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    if !path.is_dir() {
        return Err(anyhow!("{} n'est pas un répertoire", path.display()));
    }
    let test_file = path.join(".write_test");
    fs::write(&test_file, b"test")?;
    fs::remove_file(&test_file)?;
    Ok(())
}

fn lookup<'a>(data: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = data;
    for (depth, key) in path.iter().enumerate() {
        let Value::Mapping(map) = current else {
            return Err(anyhow!("Path {} is not a mapping", path[..depth].join(".")));
        };
        current = map
            .get(&Value::String(key.to_lowercase()))
            .ok_or_else(|| anyhow!("Path {} does not exist", path[..=depth].join(".")))?;
    }
    Ok(current)
}

fn insert_at(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((key, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };
    let Value::Mapping(map) = data else {
        return Err(anyhow!("Cannot set {}: parent is not a mapping", key));
    };
    let key = Value::String(key.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
        Ok(())
    } else {
        let child = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
        insert_at(child, rest, value)
    }
}

fn apply_env_overrides(data: &mut Value) {
    for (name, raw) in env::vars() {
        let Some(key) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = key.split("__").collect();
        let value = serde_yaml::from_str(&raw).unwrap_or(Value::String(raw.clone()));
        if let Err(e) = insert_at(data, &path, value) {
            warn!(env_var = %name, "Ignoring config override: {e}");
        }
    }
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        other => other,
    }
}

/// Fusionne `external` dans `default` : les mappings sont fusionnés clé par
/// clé, les scalaires et séquences sont remplacés
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
