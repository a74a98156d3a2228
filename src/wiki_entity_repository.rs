use crate::config::StoreConfig;
use crate::merge::Update;
use crate::models::{WikiEntity, NAMES_HASHES, PARTIAL_NAMES_HASHES};
use crate::store::Collection;
use crate::StoreError;
use serde::Serialize;
use std::path::PathBuf;

fn items(repo: &mut WikiEntityRepository) -> &mut Collection<WikiEntity> {
    &mut repo.items
}

/// Persisted wiki entities of one locale
pub struct WikiEntityRepository {
    items: Collection<WikiEntity>,
}

impl WikiEntityRepository {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open_path(config.wiki_entities_file())
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

    pub fn create(&mut self, entity: WikiEntity) -> Result<WikiEntity, StoreError> {
        self.items.create(entity)
    }

    pub fn update<P: Serialize>(&mut self, update: &Update<P>) -> Result<Option<WikiEntity>, StoreError> {
        self.items.update(update)
    }

    /// Insert, or merge into the stored entity with the same id.
    pub fn create_or_update(&mut self, entity: WikiEntity) -> Result<WikiEntity, StoreError> {
        if !self.items.exists(&entity.id) {
            return self.items.create(entity);
        }

        let id = entity.id.clone();
        self.items
            .update(&Update::set(id.clone(), entity))?
            .ok_or_else(|| StoreError::Other(format!("wiki entity {} vanished during update", id)))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&WikiEntity> {
        self.items.get(id)
    }

    pub fn get_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&WikiEntity> {
        self.items.get_many(ids)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.items.exists(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        self.items.delete(id)
    }

    pub fn delete_all(&mut self) -> Result<usize, StoreError> {
        self.items.clear()
    }

    /// Entities listing `hash` among their full-name hashes
    pub fn get_by_name_hash(&self, hash: &str) -> Vec<&WikiEntity> {
        self.items.get_by_hash(NAMES_HASHES, hash)
    }

    /// Entities listing `hash` among their partial-name hashes
    pub fn get_by_partial_name_hash(&self, hash: &str) -> Vec<&WikiEntity> {
        self.items.get_by_hash(PARTIAL_NAMES_HASHES, hash)
    }

    /// Partial names known to be ambiguous. This store keeps no such list.
    pub fn get_invalid_partial_names(&self, _lang: &str) -> Vec<String> {
        Vec::new()
    }

    pub fn all(&self) -> Vec<&WikiEntity> {
        self.items.all()
    }

    pub fn batch<T>(&mut self, work: impl FnOnce(&mut Self) -> Result<T, StoreError>) -> Result<T, StoreError> {
        Collection::batch_with(self, items, work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WikiEntityPatch;

    fn entity(id: &str, names: &[&str], partials: &[&str]) -> WikiEntity {
        let mut entity = WikiEntity::new(id, id, "en", names.iter().map(|n| n.to_string()).collect());
        entity.partial_names_hashes = partials.iter().map(|n| n.to_string()).collect();
        entity
    }

    #[test]
    fn test_multi_hash_lookup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = WikiEntityRepository::open_path(temp_dir.path().join("wiki-entities.json")).unwrap();

        repo.create(entity("Q1", &["h1", "h2"], &["p1"])).unwrap();
        repo.create(entity("Q2", &["h2"], &[])).unwrap();

        let by_h2: Vec<&str> = repo.get_by_name_hash("h2").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(by_h2, vec!["Q1", "Q2"]);
        assert_eq!(repo.get_by_name_hash("h1").len(), 1);
        assert_eq!(repo.get_by_partial_name_hash("p1").len(), 1);
        assert!(repo.get_by_partial_name_hash("h1").is_empty());
        assert!(repo.get_invalid_partial_names("en").is_empty());
    }

    #[test]
    fn test_create_or_update_merges_and_reindexes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = WikiEntityRepository::open_path(temp_dir.path().join("wiki-entities.json")).unwrap();

        let mut first = entity("Q1", &["h1"], &[]);
        first.description = Some("capital".to_string());
        let created = repo.create_or_update(first).unwrap();

        let second = entity("Q1", &["h9"], &["p9"]);
        let merged = repo.create_or_update(second).unwrap();

        assert_eq!(repo.count(), 1);
        assert_eq!(merged.created_at, created.created_at);
        assert_eq!(merged.description.as_deref(), Some("capital"));
        assert!(repo.get_by_name_hash("h1").is_empty());
        assert_eq!(repo.get_by_name_hash("h9").len(), 1);
        assert_eq!(repo.get_by_partial_name_hash("p9").len(), 1);
    }

    #[test]
    fn test_patch_and_delete_fields() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = WikiEntityRepository::open_path(temp_dir.path().join("wiki-entities.json")).unwrap();

        let mut e = entity("Q1", &["h1"], &[]);
        e.lastname = Some("Stefan".to_string());
        repo.create(e).unwrap();

        let patch = WikiEntityPatch { rank: Some(0), ..Default::default() };
        let updated = repo
            .update(&Update::set("Q1", patch).with_delete(["lastname"]))
            .unwrap()
            .unwrap();

        assert_eq!(updated.rank, Some(0));
        assert_eq!(updated.lastname, None);
        assert_eq!(updated.names_hashes, vec!["h1".to_string()]);
    }

    #[test]
    fn test_names_hashes_must_not_be_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut repo = WikiEntityRepository::open_path(temp_dir.path().join("wiki-entities.json")).unwrap();

        let err = repo.create(entity("Q0", &[], &[])).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(repo.count(), 0);

        repo.create(entity("Q1", &["h1"], &[])).unwrap();
        let patch = WikiEntityPatch { names_hashes: Some(Vec::new()), ..Default::default() };
        let err = repo.update(&Update::set("Q1", patch)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(repo.get_by_name_hash("h1").len(), 1);
    }
}
