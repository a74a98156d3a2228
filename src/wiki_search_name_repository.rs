use crate::config::StoreConfig;
use crate::merge::Update;
use crate::models::{SearchPatch, WikiSearchName};
use crate::store::Collection;
use crate::StoreError;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

/// Names already searched on the wiki, so a search is not repeated
pub struct WikiSearchNameRepository {
    items: Collection<WikiSearchName>,
}

impl WikiSearchNameRepository {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open_path(config.wiki_search_names_file())
    }

    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self { items: Collection::open(path)? })
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.items.close()
    }

    pub fn count(&self) -> usize {
        self.items.count()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&WikiSearchName> {
        self.items.get(id)
    }

    pub fn get_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&WikiSearchName> {
        self.items.get_many(ids)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.items.exists(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        self.items.delete(id)
    }

    pub fn create(&mut self, name: WikiSearchName) -> Result<WikiSearchName, StoreError> {
        self.items.create(name)
    }

    pub fn update<P: Serialize>(&mut self, update: &Update<P>) -> Result<Option<WikiSearchName>, StoreError> {
        self.items.update(update)
    }

    pub fn create_or_update(&mut self, name: WikiSearchName) -> Result<WikiSearchName, StoreError> {
        if !self.items.exists(&name.id) {
            return self.items.create(name);
        }

        let id = name.id.clone();
        self.items
            .update(&Update::set(id.clone(), name))?
            .ok_or_else(|| StoreError::Other(format!("search name {} vanished during update", id)))
    }

    /// Mark a name as searched now.
    pub fn touch(&mut self, id: &str) -> Result<Option<WikiSearchName>, StoreError> {
        self.items.update(&Update::set(id, SearchPatch::searched_at(Utc::now())))
    }
}
