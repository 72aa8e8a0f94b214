//! Configuration loader and validator for the recipe finder.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_MEALDB_BASE: &str = "https://www.themealdb.com/api/json/v1/1/";
pub const DEFAULT_FAVORITES_TABLE: &str = "favorites";

pub const ENV_STORE_URL: &str = "RECIPE_FINDER_STORE_URL";
pub const ENV_STORE_ANON_KEY: &str = "RECIPE_FINDER_STORE_ANON_KEY";

// Values shipped in example files; a store still carrying them is treated as absent.
const PLACEHOLDER_URLS: &[&str] = &["https://YOUR_PROJECT.supabase.co", "https://placeholder.supabase.co"];
const PLACEHOLDER_KEYS: &[&str] = &["YOUR_SUPABASE_ANON_KEY", "placeholder_key"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub mealdb: MealDb,
    #[serde(default)]
    pub store: Option<Store>,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
        }
    }
}

/// Recipe source settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MealDb {
    pub base_url: String,
}

impl Default for MealDb {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MEALDB_BASE.into(),
        }
    }
}

/// Hosted favorites backend (auth + favorites table).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_favorites_table")]
    pub favorites_table: String,
}

fn default_favorites_table() -> String {
    DEFAULT_FAVORITES_TABLE.into()
}

impl Store {
    /// True when both endpoint and key are set to something other than a placeholder.
    pub fn is_configured(&self) -> bool {
        let url = self.url.trim();
        let key = self.anon_key.trim();
        !url.is_empty()
            && !key.is_empty()
            && !PLACEHOLDER_URLS.contains(&url)
            && !PLACEHOLDER_KEYS.contains(&key)
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// The store section, only when it is actually usable.
    pub fn store_settings(&self) -> Option<&Store> {
        self.store.as_ref().filter(|s| s.is_configured())
    }

    /// Overlay store endpoint/key from the environment-like `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_STORE_URL).filter(|v| !v.trim().is_empty());
        let key = lookup(ENV_STORE_ANON_KEY).filter(|v| !v.trim().is_empty());
        if url.is_none() && key.is_none() {
            return;
        }
        let store = self.store.get_or_insert_with(|| Store {
            url: String::new(),
            anon_key: String::new(),
            favorites_table: default_favorites_table(),
        });
        if let Some(url) = url {
            store.url = url;
        }
        if let Some(key) = key {
            store.anon_key = key;
        }
    }
}

/// Load configuration from a YAML file, overlay the process environment and validate.
/// - If `path` is None, uses `config.yaml` in the current working directory and
///   falls back to built-in defaults when that file does not exist.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut cfg = match path {
        Some(path) => read(path)?,
        None => {
            let default_path = Path::new("config.yaml");
            if default_path.exists() {
                read(default_path)?
            } else {
                Config::default()
            }
        }
    };
    cfg.apply_env(|key| std::env::var(key).ok());
    validate(&cfg)?;
    Ok(cfg)
}

fn read(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if Url::parse(cfg.mealdb.base_url.trim()).is_err() {
        return Err(ConfigError::Invalid("mealdb.base_url must be an absolute URL"));
    }

    // An unconfigured store is allowed; a configured one must be well formed.
    if let Some(store) = cfg.store_settings() {
        if Url::parse(store.url.trim()).is_err() {
            return Err(ConfigError::Invalid("store.url must be an absolute URL"));
        }
        if store.favorites_table.trim().is_empty() {
            return Err(ConfigError::Invalid("store.favorites_table must be non-empty"));
        }
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

mealdb:
  base_url: "https://www.themealdb.com/api/json/v1/1/"

store:
  url: "https://YOUR_PROJECT.supabase.co"
  anon_key: "YOUR_SUPABASE_ANON_KEY"
  favorites_table: "favorites"
"#
}
