use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::StoreError;

/// A record kind that can live in a [`Collection`](crate::store::Collection).
///
/// Field names used by `INDEXED_FIELDS`, `PROTECTED_FIELDS` and update delete
/// lists are the serialized (camelCase) names.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Collection name, used in errors and logs
    const KIND: &'static str;

    /// Hash-valued fields kept in a secondary index.
    const INDEXED_FIELDS: &'static [&'static str] = &[];

    /// Fields an update can never change or remove.
    const PROTECTED_FIELDS: &'static [&'static str] = &["id", "createdAt"];

    fn id(&self) -> &str;

    /// Values of an indexed field. Single-valued fields yield one element,
    /// list fields yield one per entry.
    fn hash_values(&self, _field: &str) -> Vec<&str> {
        Vec::new()
    }

    /// Fill fields the caller left absent before first insertion.
    fn fill_defaults(&mut self, now: DateTime<Utc>);

    /// Check invariants a stored record must hold. Runs after defaults are
    /// filled on create and after every update.
    fn validate(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A record carrying an occurrence-weighted popularity
pub trait Weighted {
    fn popularity(&self) -> u32;
}
