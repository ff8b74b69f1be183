//! File-backed vocabulary cache with an optional remote source.
//!
//! The on-disk format is a flat JSON object `{label: id}`. Identifiers may be stored as
//! numbers or strings; both load as strings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::vocabulary::VocabularyIndex;

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote vocabulary returned status {status}")]
    Status { status: u16 },

    #[error("City list not found in script content")]
    MissingCityList,
}

/// Where to fetch a vocabulary from when the local cache is unusable.
#[derive(Debug, Clone)]
pub enum RemoteVocabulary {
    /// JSON array of `{"en": label, "id": id}` objects.
    JsonCityList(String),
    /// JavaScript bundle declaring `citiesTH = [ ... ];` with unquoted object keys.
    ScriptCityList(String),
}

#[derive(Debug, Deserialize)]
struct City {
    en: String,
    id: Value,
}

#[derive(Debug, Clone)]
pub struct VocabularyStore {
    path: PathBuf,
    remote: Option<(RemoteVocabulary, Client)>,
}

impl VocabularyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: RemoteVocabulary, client: Client) -> Self {
        self.remote = Some((remote, client));
        self
    }

    /// Reads the cached vocabulary. A missing or unparsable cache falls back to
    /// [`refresh`](Self::refresh) when a remote is configured, otherwise to an empty index.
    pub async fn load(&self) -> Result<VocabularyIndex, VocabularyError> {
        match read_index(&self.path).await {
            Ok(index) => return Ok(index),
            Err(e) => info!(
                "Failed to load vocabulary from {}: {e}",
                self.path.display()
            ),
        }

        if self.remote.is_some() {
            info!("Fetching vocabulary for {} from remote...", self.path.display());
            self.refresh().await
        } else {
            Ok(VocabularyIndex::default())
        }
    }

    /// Fetches the remote vocabulary and rewrites the cache file.
    /// Without a remote this re-reads the cache.
    pub async fn refresh(&self) -> Result<VocabularyIndex, VocabularyError> {
        let Some((remote, client)) = &self.remote else {
            return read_index(&self.path).await;
        };

        let index = match remote {
            RemoteVocabulary::JsonCityList(url) => {
                let body = fetch_text(client, url).await?;
                cities_to_index(serde_json::from_str(&body)?)
            }
            RemoteVocabulary::ScriptCityList(url) => {
                let body = fetch_text(client, url).await?;
                parse_script_city_list(&body)?
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serde_json::to_string_pretty(&index)?).await?;
        info!(
            "Vocabulary fetched and saved to {} ({} entries)",
            self.path.display(),
            index.len()
        );

        Ok(index)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SalaryBracketsFile {
    #[serde(rename = "SALARY_FROM_OPTIONS", default)]
    from: BTreeMap<String, Value>,
    #[serde(rename = "SALARY_TO_OPTIONS", default)]
    to: BTreeMap<String, Value>,
}

/// Loads the `(salary_from, salary_to)` bracket vocabularies from the two-section file.
/// A missing or invalid file yields two empty indexes.
pub async fn load_salary_brackets(path: &Path) -> (VocabularyIndex, VocabularyIndex) {
    let parsed = match tokio::fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str::<SalaryBracketsFile>(&raw).map_err(VocabularyError::from),
        Err(e) => Err(VocabularyError::from(e)),
    };

    match parsed {
        Ok(file) => (values_to_index(file.from), values_to_index(file.to)),
        Err(e) => {
            info!("Failed to load salary options from {}: {e}", path.display());
            (VocabularyIndex::default(), VocabularyIndex::default())
        }
    }
}

async fn read_index(path: &Path) -> Result<VocabularyIndex, VocabularyError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let values: BTreeMap<String, Value> = serde_json::from_str(&raw)?;
    Ok(values_to_index(values))
}

async fn fetch_text(client: &Client, url: &str) -> Result<String, VocabularyError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(VocabularyError::Status {
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

fn parse_script_city_list(script: &str) -> Result<VocabularyIndex, VocabularyError> {
    static CITY_LIST: OnceLock<Regex> = OnceLock::new();
    static BARE_KEY: OnceLock<Regex> = OnceLock::new();

    let city_list = CITY_LIST.get_or_init(|| {
        Regex::new(r"(?s)citiesTH\s*=\s*\[(.*?)\];").expect("valid city list regex")
    });
    let bare_key = BARE_KEY.get_or_init(|| Regex::new(r"(\w+):").expect("valid key regex"));

    let raw = city_list
        .captures(script)
        .and_then(|c| c.get(1))
        .ok_or(VocabularyError::MissingCityList)?
        .as_str();
    let quoted = bare_key.replace_all(raw, "\"$1\":");
    let cities: Vec<City> = serde_json::from_str(&format!("[{quoted}]"))?;

    Ok(cities_to_index(cities))
}

fn cities_to_index(cities: Vec<City>) -> VocabularyIndex {
    cities
        .into_iter()
        .filter_map(|city| id_to_string(&city.id).map(|id| (city.en, id)))
        .collect()
}

fn values_to_index(values: BTreeMap<String, Value>) -> VocabularyIndex {
    values
        .into_iter()
        .filter_map(|(label, id)| id_to_string(&id).map(|id| (label, id)))
        .collect()
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
