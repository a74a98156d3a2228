use crate::config::StoreConfig;
use crate::merge::Update;
use crate::models::{Concept, ConceptPatch, NAME_HASH, ROOT_NAME_HASH};
use crate::popularity::{rank_groups, PopularHash};
use crate::prune::PrunePolicy;
use crate::store::Collection;
use crate::StoreError;
use std::path::PathBuf;

fn is_abbreviation(concept: &Concept) -> bool {
    concept.is_abbr
}

fn is_one_word_name(concept: &Concept) -> bool {
    !concept.is_abbr && concept.count_words == 1
}

pub const ABBREVIATIONS: PrunePolicy<Concept> = PrunePolicy { name: "abbreviations", includes: is_abbreviation };
pub const ONE_WORD_NAMES: PrunePolicy<Concept> = PrunePolicy { name: "one-word names", includes: is_one_word_name };

fn items(repo: &mut ConceptRepository) -> &mut Collection<Concept> {
    &mut repo.items
}

/// Persisted concepts of one locale.
pub struct ConceptRepository {
    items: Collection<Concept>,
}

impl ConceptRepository {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open_path(config.concepts_file())
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

    pub fn create(&mut self, concept: Concept) -> Result<Concept, StoreError> {
        self.items.create(concept)
    }

    pub fn update<P: serde::Serialize>(&mut self, update: &Update<P>) -> Result<Option<Concept>, StoreError> {
        self.items.update(update)
    }

    /// Record one more observation of `concept`.
    ///
    /// A new concept is stored with popularity 1 whatever the caller passed; a
    /// known one gets popularity + 1 and the caller's other fields merged in.
    pub fn create_or_update(&mut self, mut concept: Concept) -> Result<Concept, StoreError> {
        match self.items.get(&concept.id).map(|existing| existing.popularity) {
            None => {
                concept.popularity = 1;
                self.items.create(concept)
            }
            Some(popularity) => {
                concept.popularity = popularity.saturating_add(1);
                let id = concept.id.clone();
                self.items
                    .update(&Update::set(id.clone(), concept))?
                    .ok_or_else(|| StoreError::Other(format!("concept {} vanished during update", id)))
            }
        }
    }

    /// Returns the new popularity, or `None` if the id is unknown.
    pub fn increment_popularity(&mut self, id: &str) -> Result<Option<u32>, StoreError> {
        self.items.modify(id, |concept| {
            concept.popularity = concept.popularity.saturating_add(1);
            concept.popularity
        })
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Concept> {
        self.items.get(id)
    }

    pub fn get_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Concept> {
        self.items.get_many(ids)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.items.exists(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        self.items.delete(id)
    }

    pub fn delete_ids<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize, StoreError> {
        self.items.delete_ids(ids)
    }

    pub fn delete_all(&mut self) -> Result<usize, StoreError> {
        self.items.clear()
    }

    pub fn list(&self, limit: usize, skip: usize) -> Vec<&Concept> {
        self.items.list(limit, skip)
    }

    pub fn all(&self) -> Vec<&Concept> {
        self.items.all()
    }

    pub fn get_by_name_hash(&self, hash: &str) -> Vec<&Concept> {
        self.items.get_by_hash(NAME_HASH, hash)
    }

    pub fn get_by_root_name_hash(&self, hash: &str) -> Vec<&Concept> {
        self.items.get_by_hash(ROOT_NAME_HASH, hash)
    }

    pub fn delete_by_name_hash<S: AsRef<str>>(&mut self, hashes: &[S]) -> Result<usize, StoreError> {
        self.items.delete_by_hash_set(NAME_HASH, hashes)
    }

    pub fn delete_by_root_name_hash<S: AsRef<str>>(&mut self, hashes: &[S]) -> Result<usize, StoreError> {
        self.items.delete_by_hash_set(ROOT_NAME_HASH, hashes)
    }

    /// Abbreviations seen together with a full name
    pub fn get_abbr_concepts_with_context_name(&self) -> Vec<&Concept> {
        self.items.iter().filter(|c| c.is_abbr && c.context_names.is_some()).collect()
    }

    /// Full names that carry a known abbreviation
    pub fn get_concepts_with_abbr(&self) -> Vec<&Concept> {
        self.items.iter().filter(|c| !c.is_abbr && c.abbr.is_some()).collect()
    }

    /// Root name hashes ranked by the summed popularity of their concepts.
    ///
    /// Concepts with fewer than `min_count_words` words are ignored; 0 counts as 1.
    pub fn get_popular_root_name_hashes(&self, limit: usize, skip: usize, min_count_words: u32) -> Vec<PopularHash> {
        let min_count_words = min_count_words.max(1);
        let entries = self
            .items
            .iter()
            .filter(|c| c.count_words >= min_count_words)
            .map(|c| (c.root_name_hash.as_str(), c.id.as_str(), c.popularity));

        rank_groups(entries, limit, skip)
    }

    pub fn delete_unpopular(&mut self, threshold: u32) -> Result<usize, StoreError> {
        PrunePolicy::all().prune(&mut self.items, threshold)
    }

    pub fn delete_unpopular_abbreviations(&mut self, threshold: u32) -> Result<usize, StoreError> {
        ABBREVIATIONS.prune(&mut self.items, threshold)
    }

    pub fn delete_unpopular_one_words(&mut self, threshold: u32) -> Result<usize, StoreError> {
        ONE_WORD_NAMES.prune(&mut self.items, threshold)
    }

    /// Run several mutations with one flush at the end.
    pub fn batch<T>(&mut self, work: impl FnOnce(&mut Self) -> Result<T, StoreError>) -> Result<T, StoreError> {
        Collection::batch_with(self, items, work)
    }

    /// Partial update with the typed concept patch.
    pub fn patch(&mut self, id: &str, patch: ConceptPatch, delete: &[&str]) -> Result<Option<Concept>, StoreError> {
        self.items.update(&Update::set(id, patch).with_delete(delete.iter().copied()))
    }
}
