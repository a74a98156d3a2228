use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Secondary lookup from a hash value to the slots of the records carrying it.
///
/// Slots are the collection's insertion sequence numbers, so every lookup
/// yields records in collection order. Kept in step with the records on each
/// insert, update and delete.
#[derive(Debug, Default, Clone)]
pub struct HashIndex {
    buckets: FxHashMap<String, BTreeSet<u64>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: &str, slot: u64) {
        self.buckets.entry(hash.to_string()).or_default().insert(slot);
    }

    pub fn remove(&mut self, hash: &str, slot: u64) {
        if let Some(slots) = self.buckets.get_mut(hash) {
            slots.remove(&slot);
            if slots.is_empty() {
                self.buckets.remove(hash);
            }
        }
    }

    pub fn get(&self, hash: &str) -> impl Iterator<Item = u64> + '_ {
        self.buckets.get(hash).into_iter().flat_map(|slots| slots.iter().copied())
    }

    /// Union of the slots of every hash in `hashes`, ordered.
    pub fn get_many<S: AsRef<str>>(&self, hashes: &[S]) -> BTreeSet<u64> {
        hashes
            .iter()
            .filter_map(|hash| self.buckets.get(hash.as_ref()))
            .flat_map(|slots| slots.iter().copied())
            .collect()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.buckets.contains_key(hash)
    }

    /// Number of distinct hash values
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
