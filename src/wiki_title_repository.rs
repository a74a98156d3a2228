use crate::config::StoreConfig;
use crate::merge::Update;
use crate::models::{SearchPatch, WikiTitle};
use crate::store::Collection;
use crate::StoreError;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Wiki page titles already fetched, shared by all countries of a language
pub struct WikiTitleRepository {
    items: Collection<WikiTitle>,
}

impl WikiTitleRepository {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open_path(config.wiki_titles_file())
    }

    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self { items: Collection::open(path)? })
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.items.close()
    }

    /// Make sure the backing file exists, writing the current (possibly empty) contents.
    pub fn create_storage(&mut self) -> Result<(), StoreError> {
        self.items.flush()
    }

    /// Drop every title and remove the backing file.
    pub fn delete_storage(&mut self) -> Result<(), StoreError> {
        let removed = self.items.count();
        self.items.batch(|items| items.clear())?;

        let path = self.items.path();
        if path.exists() {
            fs::remove_file(path).map_err(StoreError::Io)?;
        }
        info!(path = %path.display(), removed, "wiki title storage deleted");

        Ok(())
    }

    pub fn count(&self) -> usize {
        self.items.count()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&WikiTitle> {
        self.items.get(id)
    }

    pub fn get_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&WikiTitle> {
        self.items.get_many(ids)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.items.exists(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        self.items.delete(id)
    }

    pub fn create(&mut self, title: WikiTitle) -> Result<WikiTitle, StoreError> {
        self.items.create(title)
    }

    pub fn update<P: Serialize>(&mut self, update: &Update<P>) -> Result<Option<WikiTitle>, StoreError> {
        self.items.update(update)
    }

    pub fn create_or_update(&mut self, title: WikiTitle) -> Result<WikiTitle, StoreError> {
        if !self.items.exists(&title.id) {
            return self.items.create(title);
        }

        let id = title.id.clone();
        self.items
            .update(&Update::set(id.clone(), title))?
            .ok_or_else(|| StoreError::Other(format!("wiki title {} vanished during update", id)))
    }

    /// Mark a title as searched now.
    pub fn touch(&mut self, id: &str) -> Result<Option<WikiTitle>, StoreError> {
        self.items.update(&Update::set(id, SearchPatch::searched_at(Utc::now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("titles").join("en-wiki-titles.json");
        let mut repo = WikiTitleRepository::open_path(&path).unwrap();

        repo.create_storage().unwrap();
        assert!(path.is_file());

        repo.create(WikiTitle::new("en", "Moldova")).unwrap();
        repo.delete_storage().unwrap();
        assert!(!path.exists());
        assert_eq!(repo.count(), 0);
    }

    #[test]
    fn test_dates_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("en-wiki-titles.json");

        let mut repo = WikiTitleRepository::open_path(&path).unwrap();
        let created = repo.create(WikiTitle::new("en", "Chisinau")).unwrap();
        repo.close().unwrap();

        let reopened = WikiTitleRepository::open_path(&path).unwrap();
        let loaded = reopened.get_by_id(&created.id).unwrap();
        assert_eq!(loaded, &created);
        assert!(loaded.created_at.is_some());
        assert!(loaded.last_search_at.is_some());
    }

    #[test]
    fn test_delete_missing_title() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = WikiTitleRepository::open_path(temp_dir.path().join("t.json")).unwrap();
        assert!(!repo.delete("en:Nothing").unwrap());
        assert!(repo.touch("en:Nothing").unwrap().is_none());
    }
}
