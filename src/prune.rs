use crate::record::{Record, Weighted};
use crate::store::Collection;
use crate::StoreError;
use tracing::info;

/// Which records a threshold prune is allowed to look at.
pub struct PrunePolicy<R> {
    pub name: &'static str,
    pub includes: fn(&R) -> bool,
}

impl<R> Clone for PrunePolicy<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for PrunePolicy<R> {}

impl<R: Record + Weighted> PrunePolicy<R> {
    pub fn new(name: &'static str, includes: fn(&R) -> bool) -> Self {
        Self { name, includes }
    }

    /// Every record is a candidate.
    pub fn all() -> Self {
        Self::new("all", |_| true)
    }

    /// Whether `record` would be removed at `threshold`. The threshold is inclusive.
    pub fn matches(&self, record: &R, threshold: u32) -> bool {
        (self.includes)(record) && record.popularity() <= threshold
    }

    /// Remove every included record with popularity at or below `threshold`.
    pub fn prune(&self, collection: &mut Collection<R>, threshold: u32) -> Result<usize, StoreError> {
        let removed = collection.delete_where(|record| self.matches(record, threshold))?;

        info!(kind = R::KIND, policy = self.name, threshold, removed, remaining = collection.count(), "pruned unpopular records");

        Ok(removed)
    }
}
