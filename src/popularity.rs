use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One group of records sharing a hash, with their summed popularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularHash {
    pub hash: String,
    pub popularity: u64,
    pub ids: Vec<String>,
}

/// Group `(hash, id, popularity)` entries by hash and rank the groups.
///
/// Groups are ordered by descending popularity; equal groups keep the order in
/// which their hash first appeared. `skip` past the end yields an empty page.
pub fn rank_groups<'a, I>(entries: I, limit: usize, skip: usize) -> Vec<PopularHash>
where
    I: IntoIterator<Item = (&'a str, &'a str, u32)>,
{
    let mut positions: FxHashMap<&'a str, usize> = FxHashMap::default();
    let mut groups: Vec<PopularHash> = Vec::new();

    for (hash, id, popularity) in entries {
        let position = *positions.entry(hash).or_insert_with(|| {
            groups.push(PopularHash { hash: hash.to_string(), popularity: 0, ids: Vec::new() });
            groups.len() - 1
        });

        let group = &mut groups[position];
        group.popularity += u64::from(popularity);
        group.ids.push(id.to_string());
    }

    // sort_by is stable, so ties stay in first-appearance order
    groups.sort_by(|a, b| b.popularity.cmp(&a.popularity));

    groups.into_iter().skip(skip).take(limit).collect()
}
