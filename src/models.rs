use crate::config::Locale;
use crate::hashing::{count_words, name_hash};
use crate::record::{Record, Weighted};
use crate::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NAME_HASH: &str = "nameHash";
pub const ROOT_NAME_HASH: &str = "rootNameHash";
pub const NAMES_HASHES: &str = "namesHashes";
pub const PARTIAL_NAMES_HASHES: &str = "partialNamesHashes";

/// A candidate named-entity mention with its occurrence count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: String,
    pub lang: String,
    pub country: String,
    pub name: String,
    pub name_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_name: Option<String>,
    pub root_name_hash: String,
    pub count_words: u32,
    #[serde(default)]
    pub is_abbr: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_names: Option<Vec<String>>,
    /// Zero means "not set"; creation turns it into 1.
    #[serde(default)]
    pub popularity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Concept {
    /// Build a concept for `name`, keyed by its normalized hash.
    ///
    /// The root name groups inflected variants; it defaults to the name itself.
    pub fn new(locale: &Locale, name: &str, root_name: Option<&str>) -> Self {
        let hash = name_hash(name, locale);
        let root_name_hash = root_name.map(|root| name_hash(root, locale)).unwrap_or_else(|| hash.clone());

        Self {
            id: hash.clone(),
            lang: locale.lang().to_string(),
            country: locale.country().to_string(),
            name: name.trim().to_string(),
            name_hash: hash,
            root_name: root_name.map(|root| root.trim().to_string()),
            root_name_hash,
            count_words: count_words(name).max(1),
            is_abbr: false,
            abbr: None,
            context_names: None,
            popularity: 1,
            created_at: None,
        }
    }

    pub fn abbreviation(mut self) -> Self {
        self.is_abbr = true;
        self
    }

    pub fn with_abbr(mut self, abbr: &str) -> Self {
        self.abbr = Some(abbr.to_string());
        self
    }

    pub fn with_context_names(mut self, names: Vec<String>) -> Self {
        self.context_names = Some(names);
        self
    }
}

impl Record for Concept {
    const KIND: &'static str = "concepts";
    const INDEXED_FIELDS: &'static [&'static str] = &[NAME_HASH, ROOT_NAME_HASH];

    fn id(&self) -> &str {
        &self.id
    }

    fn hash_values(&self, field: &str) -> Vec<&str> {
        match field {
            NAME_HASH => vec![self.name_hash.as_str()],
            ROOT_NAME_HASH => vec![self.root_name_hash.as_str()],
            _ => Vec::new(),
        }
    }

    fn fill_defaults(&mut self, now: DateTime<Utc>) {
        if self.popularity == 0 {
            self.popularity = 1;
        }
        self.created_at.get_or_insert(now);
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.popularity == 0 {
            return Err(StoreError::Validation(format!("concept {} must have popularity of at least 1", self.id)));
        }
        Ok(())
    }
}

impl Weighted for Concept {
    fn popularity(&self) -> u32 {
        self.popularity
    }
}

/// Partial concept update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_name_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_words: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_abbr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An external wiki entity, looked up by any of its name hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiEntity {
    pub id: String,
    pub name: String,
    pub lang: String,
    pub names_hashes: Vec<String>,
    #[serde(default)]
    pub partial_names_hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_data_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_page_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl WikiEntity {
    pub fn new(id: &str, name: &str, lang: &str, names_hashes: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            lang: lang.to_string(),
            names_hashes,
            partial_names_hashes: Vec::new(),
            lastname: None,
            entity_type: None,
            description: None,
            wiki_data_id: None,
            wiki_page_title: None,
            country_codes: None,
            rank: None,
            created_at: None,
        }
    }
}

impl Record for WikiEntity {
    const KIND: &'static str = "wikientities";
    const INDEXED_FIELDS: &'static [&'static str] = &[NAMES_HASHES, PARTIAL_NAMES_HASHES];

    fn id(&self) -> &str {
        &self.id
    }

    fn hash_values(&self, field: &str) -> Vec<&str> {
        match field {
            NAMES_HASHES => self.names_hashes.iter().map(String::as_str).collect(),
            PARTIAL_NAMES_HASHES => self.partial_names_hashes.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn fill_defaults(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.names_hashes.is_empty() {
            return Err(StoreError::Validation(format!("wiki entity {} has no names hashes", self.id)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiEntityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names_hashes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_names_hashes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

/// A name already searched for on the wiki
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiSearchName {
    pub id: String,
    pub name: String,
    pub lang: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_search_at: Option<DateTime<Utc>>,
}

impl WikiSearchName {
    pub fn new(locale: &Locale, name: &str) -> Self {
        Self {
            id: name_hash(name, locale),
            name: name.trim().to_string(),
            lang: locale.lang().to_string(),
            country: locale.country().to_string(),
            created_at: None,
            last_search_at: None,
        }
    }
}

impl Record for WikiSearchName {
    const KIND: &'static str = "names";

    fn id(&self) -> &str {
        &self.id
    }

    fn fill_defaults(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.last_search_at.get_or_insert(now);
    }
}

/// A wiki page title already fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiTitle {
    pub id: String,
    pub title: String,
    pub lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_search_at: Option<DateTime<Utc>>,
}

impl WikiTitle {
    pub fn new(lang: &str, title: &str) -> Self {
        Self {
            id: format!("{}:{}", lang, title.trim()),
            title: title.trim().to_string(),
            lang: lang.to_string(),
            created_at: None,
            last_search_at: None,
        }
    }
}

impl Record for WikiTitle {
    const KIND: &'static str = "titles";

    fn id(&self) -> &str {
        &self.id
    }

    fn fill_defaults(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.last_search_at.get_or_insert(now);
    }
}

/// Update for the search-tracking records (search names and titles)
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_search_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SearchPatch {
    pub fn searched_at(at: DateTime<Utc>) -> Self {
        Self { last_search_at: Some(at), created_at: None }
    }
}
