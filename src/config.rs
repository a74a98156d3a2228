use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "./data";
const DATA_DIR_ENV: &str = "ACTOR_STORE_DATA_DIR";

/// A language + country pair identifying one regional set of collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    lang: String,
    country: String,
}

impl Locale {
    /// Trims and lower-cases both codes, then requires two ASCII letters each.
    pub fn new(lang: &str, country: &str) -> Result<Self, StoreError> {
        let lang = lang.trim().to_lowercase();
        let country = country.trim().to_lowercase();

        if !is_valid_code(&lang) {
            return Err(StoreError::Validation(format!("language is invalid: {}", lang)));
        }
        if !is_valid_code(&country) {
            return Err(StoreError::Validation(format!("country is invalid: {}", country)));
        }

        Ok(Self { lang, country })
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lang, self.country)
    }
}

fn is_valid_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase())
}

/// Where each collection of a locale lives on disk
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_dir: PathBuf,
    pub locale: Locale,
}

impl StoreConfig {
    pub fn new(base_dir: impl Into<PathBuf>, locale: Locale) -> Self {
        Self { base_dir: base_dir.into(), locale }
    }

    /// Base directory from `ACTOR_STORE_DATA_DIR`, falling back to `./data`
    pub fn from_env(locale: Locale) -> Self {
        let base_dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::new(base_dir, locale)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(self.locale.to_string())
    }

    pub fn concepts_file(&self) -> PathBuf {
        self.data_dir().join("concepts.json")
    }

    pub fn wiki_entities_file(&self) -> PathBuf {
        self.data_dir().join("wiki-entities.json")
    }

    pub fn wiki_search_names_file(&self) -> PathBuf {
        self.data_dir().join("wiki-search-names.json")
    }

    /// Titles are shared by every country of a language.
    pub fn wiki_titles_file(&self) -> PathBuf {
        self.base_dir.join(format!("{}-wiki-titles.json", self.locale.lang()))
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.data_dir().join("articles")
    }

    pub fn actors_file(&self) -> PathBuf {
        self.data_dir().join("actors.json")
    }

    pub fn concept_actors_file(&self) -> PathBuf {
        self.data_dir().join("concept-actors.json")
    }
}

pub fn ensure_dir_exists(dir: &Path) -> Result<(), StoreError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(StoreError::Io)?;
    }
    Ok(())
}
