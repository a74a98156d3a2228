use crate::index::HashIndex;
use crate::merge::{self, Update};
use crate::record::Record;
use crate::StoreError;
use chrono::Utc;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An id-keyed collection of records persisted as one JSON array file.
///
/// Records keep their insertion order, including across updates and reopen.
/// Every mutation is written to disk before it returns, unless it runs inside
/// [`Collection::batch`].
pub struct Collection<R: Record> {
    path: PathBuf,
    records: BTreeMap<u64, R>,
    slots: FxHashMap<String, u64>,
    indexes: FxHashMap<&'static str, HashIndex>,
    next_slot: u64,
    deferred: bool,
    dirty: bool,
}

impl<R: Record> Collection<R> {
    /// Load the backing file, or start empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let mut collection = Self {
            path,
            records: BTreeMap::new(),
            slots: FxHashMap::default(),
            indexes: R::INDEXED_FIELDS.iter().map(|field| (*field, HashIndex::new())).collect(),
            next_slot: 0,
            deferred: false,
            dirty: false,
        };

        if collection.path.is_file() {
            let file = File::open(&collection.path).map_err(StoreError::Io)?;
            let loaded: Vec<R> = serde_json::from_reader(BufReader::new(file))?;

            for record in loaded {
                if collection.slots.contains_key(record.id()) {
                    return Err(StoreError::Validation(format!(
                        "{} contains id {} more than once",
                        collection.path.display(),
                        record.id()
                    )));
                }
                collection.insert_slot(record);
            }
        }

        debug!(kind = R::KIND, path = %collection.path.display(), count = collection.count(), "collection loaded");

        Ok(collection)
    }

    /// Flush and release the backing file.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.write_to_disk()?;
        debug!(kind = R::KIND, path = %self.path.display(), "collection closed");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.slots.get(id).and_then(|slot| self.records.get(slot))
    }

    /// Records for the known ids, in collection order; unknown ids are skipped.
    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&R> {
        let slots: BTreeSet<u64> = ids.iter().filter_map(|id| self.slots.get(id.as_ref()).copied()).collect();
        self.resolve(slots)
    }

    pub fn all(&self) -> Vec<&R> {
        self.records.values().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    /// Page through records in collection order.
    pub fn list(&self, limit: usize, skip: usize) -> Vec<&R> {
        self.records.values().skip(skip).take(limit).collect()
    }

    /// Records whose indexed `field` equals (or, for list fields, contains) `hash`.
    pub fn get_by_hash(&self, field: &str, hash: &str) -> Vec<&R> {
        match self.indexes.get(field) {
            Some(index) => index.get(hash).filter_map(|slot| self.records.get(&slot)).collect(),
            None => Vec::new(),
        }
    }

    /// Records whose indexed `field` matches any of `hashes`.
    pub fn get_by_hash_set<S: AsRef<str>>(&self, field: &str, hashes: &[S]) -> Vec<&R> {
        match self.indexes.get(field) {
            Some(index) => self.resolve(index.get_many(hashes)),
            None => Vec::new(),
        }
    }

    /// Insert a new record after filling its defaults.
    pub fn create(&mut self, mut record: R) -> Result<R, StoreError> {
        if self.exists(record.id()) {
            return Err(StoreError::DuplicateKey { kind: R::KIND, id: record.id().to_string() });
        }

        record.fill_defaults(Utc::now());
        record.validate()?;
        let slot = self.insert_slot(record.clone());
        self.persist_or_undo(|c| {
            c.remove_slot(slot);
        })?;

        Ok(record)
    }

    /// Merge a partial update into an existing record.
    ///
    /// A missing id is not an error: the call returns `Ok(None)` and logs a warning.
    pub fn update<P: Serialize>(&mut self, update: &Update<P>) -> Result<Option<R>, StoreError> {
        let Some(&slot) = self.slots.get(&update.id) else {
            warn!(kind = R::KIND, id = %update.id, "update skipped: record not found");
            return Ok(None);
        };

        let Some(existing) = self.records.get(&slot).cloned() else {
            return Ok(None);
        };
        let merged = merge::apply(&existing, update.set.as_ref(), &update.delete)?;

        self.replace_slot(slot, merged.clone());
        self.persist_or_undo(|c| c.replace_slot(slot, existing))?;

        Ok(Some(merged))
    }

    /// Apply `mutate` to a record in place and persist it.
    ///
    /// Used for targeted changes such as popularity increments; the id and the
    /// indexed fields are re-read afterwards so the indexes stay consistent.
    pub fn modify<T>(&mut self, id: &str, mutate: impl FnOnce(&mut R) -> T) -> Result<Option<T>, StoreError> {
        let Some(&slot) = self.slots.get(id) else {
            warn!(kind = R::KIND, id, "modify skipped: record not found");
            return Ok(None);
        };

        let Some(previous) = self.records.get(&slot).cloned() else {
            return Ok(None);
        };
        let mut record = previous.clone();
        let out = mutate(&mut record);

        if record.id() != id {
            return Err(StoreError::Validation(format!("{} id {} cannot be changed", R::KIND, id)));
        }
        record.validate()?;

        self.replace_slot(slot, record);
        self.persist_or_undo(|c| c.replace_slot(slot, previous))?;

        Ok(Some(out))
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let Some(slot) = self.slots.get(id).copied() else {
            return Ok(false);
        };

        self.remove_slots(BTreeSet::from([slot]))?;

        Ok(true)
    }

    /// Delete the given ids, returning how many were actually present.
    pub fn delete_ids<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize, StoreError> {
        let slots: BTreeSet<u64> = ids.iter().filter_map(|id| self.slots.get(id.as_ref()).copied()).collect();
        self.remove_slots(slots)
    }

    /// Delete every record whose indexed `field` matches any of `hashes`.
    pub fn delete_by_hash_set<S: AsRef<str>>(&mut self, field: &str, hashes: &[S]) -> Result<usize, StoreError> {
        let slots = match self.indexes.get(field) {
            Some(index) => index.get_many(hashes),
            None => BTreeSet::new(),
        };
        self.remove_slots(slots)
    }

    /// Delete every record matching `predicate` in one scan.
    pub fn delete_where(&mut self, predicate: impl Fn(&R) -> bool) -> Result<usize, StoreError> {
        let slots: BTreeSet<u64> = self
            .records
            .iter()
            .filter(|(_, record)| predicate(record))
            .map(|(slot, _)| *slot)
            .collect();
        self.remove_slots(slots)
    }

    /// Remove every record, returning the prior count.
    pub fn clear(&mut self) -> Result<usize, StoreError> {
        let count = self.records.len();

        let removed = std::mem::take(&mut self.records);
        self.slots.clear();
        for index in self.indexes.values_mut() {
            index.clear();
        }
        self.persist_or_undo(|c| {
            for (slot, record) in removed {
                c.restore_slot(slot, record);
            }
        })?;

        Ok(count)
    }

    /// Run several mutations with a single flush at the end.
    ///
    /// The flush happens even when `work` fails, so everything applied before
    /// the failure is on disk; the error from `work` is then returned.
    pub fn batch<T>(&mut self, work: impl FnOnce(&mut Self) -> Result<T, StoreError>) -> Result<T, StoreError> {
        Self::batch_with(self, identity, work)
    }

    /// Same as [`Collection::batch`] for a type that owns the collection,
    /// reached through `collection`.
    pub fn batch_with<S, T>(
        owner: &mut S,
        collection: fn(&mut S) -> &mut Self,
        work: impl FnOnce(&mut S) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let outer = std::mem::replace(&mut collection(owner).deferred, true);
        let result = work(owner);

        let items = collection(owner);
        items.deferred = outer;
        if !outer && items.dirty {
            items.write_to_disk()?;
        }

        result
    }

    /// Write the collection to its backing file now.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.write_to_disk()
    }

    fn resolve(&self, slots: BTreeSet<u64>) -> Vec<&R> {
        slots.into_iter().filter_map(|slot| self.records.get(&slot)).collect()
    }

    fn remove_slots(&mut self, slots: BTreeSet<u64>) -> Result<usize, StoreError> {
        if slots.is_empty() {
            return Ok(0);
        }

        let removed: Vec<(u64, R)> = slots
            .into_iter()
            .filter_map(|slot| self.remove_slot(slot).map(|record| (slot, record)))
            .collect();
        let count = removed.len();
        self.persist_or_undo(|c| {
            for (slot, record) in removed {
                c.restore_slot(slot, record);
            }
        })?;

        Ok(count)
    }

    fn insert_slot(&mut self, record: R) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;

        self.restore_slot(slot, record);
        slot
    }

    /// Put `record` back at `slot`, keeping its original position.
    fn restore_slot(&mut self, slot: u64, record: R) {
        self.index_record(&record, slot);
        self.slots.insert(record.id().to_string(), slot);
        self.records.insert(slot, record);
    }

    fn replace_slot(&mut self, slot: u64, record: R) {
        if let Some(previous) = self.records.remove(&slot) {
            self.unindex_record(&previous, slot);
        }
        self.index_record(&record, slot);
        self.records.insert(slot, record);
    }

    fn remove_slot(&mut self, slot: u64) -> Option<R> {
        let record = self.records.remove(&slot)?;
        self.unindex_record(&record, slot);
        self.slots.remove(record.id());
        Some(record)
    }

    fn index_record(&mut self, record: &R, slot: u64) {
        for (field, index) in self.indexes.iter_mut() {
            for hash in record.hash_values(field) {
                index.insert(hash, slot);
            }
        }
    }

    fn unindex_record(&mut self, record: &R, slot: u64) {
        for (field, index) in self.indexes.iter_mut() {
            for hash in record.hash_values(field) {
                index.remove(hash, slot);
            }
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        if self.deferred {
            self.dirty = true;
            return Ok(());
        }
        self.write_to_disk()
    }

    /// Persist a single mutation; if the write fails, `undo` puts memory back
    /// the way it was so a failed call leaves nothing behind.
    fn persist_or_undo(&mut self, undo: impl FnOnce(&mut Self)) -> Result<(), StoreError> {
        let result = self.persist();
        if let Err(err) = &result {
            warn!(kind = R::KIND, path = %self.path.display(), error = %err, "flush failed, mutation rolled back");
            undo(self);
        }
        result
    }

    fn write_to_disk(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StoreError::Io)?;
            }
        }

        // Write to a sibling temp file, then rename over the real one
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let file = File::create(&temp_path).map_err(StoreError::Io)?;
        let mut writer = BufWriter::new(file);
        let records: Vec<&R> = self.records.values().collect();
        serde_json::to_writer(&mut writer, &records)?;
        writer.flush().map_err(StoreError::Io)?;
        writer.get_ref().sync_all().map_err(StoreError::Io)?;
        drop(writer);

        fs::rename(&temp_path, &self.path).map_err(StoreError::Io)?;
        self.dirty = false;

        debug!(kind = R::KIND, path = %self.path.display(), count = self.records.len(), "collection flushed");

        Ok(())
    }
}

fn identity<R: Record>(collection: &mut Collection<R>) -> &mut Collection<R> {
    collection
}
