//! Projects committed create/update/delete results into cached lists
use super::cache::{CacheStore, QueryKey};
use super::catalog::{Record, RecordKind};
use std::collections::HashMap;
use tracing::debug;

/// Knows which cached lists hold "all entities of a kind" for the session and
/// keeps them in step with mutations the server has already accepted.
///
/// Every projection is best effort: a list that is not cached is skipped and
/// picked up by its next fetch.
#[derive(Debug, Clone, Default)]
pub struct MutationSynchronizer {
    keys: HashMap<RecordKind, Vec<QueryKey>>,
}

impl MutationSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` as a list of every entity of `kind`.
    pub fn track(mut self, kind: RecordKind, key: QueryKey) -> Self {
        let keys = self.keys.entry(kind).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
        self
    }
    pub fn keys_for(&self, kind: RecordKind) -> &[QueryKey] {
        self.keys.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends `record` to every tracked list of its kind that does not already
    /// hold its id. Returns how many cached lists were touched.
    pub fn apply_created(&self, cache: &mut CacheStore, record: &Record) -> usize {
        let mut touched = 0;
        for key in self.keys_for(record.kind()) {
            let applied = cache.mutate(key, |mut items| {
                if !items.iter().any(|item| item.id() == record.id()) {
                    items.push(record.clone());
                }
                items
            });
            if applied {
                touched += 1;
            }
        }
        debug!(kind = ?record.kind(), id = record.id(), touched, "projected create");
        touched
    }

    /// Swaps the cached snapshot carrying the same id, keeping its position.
    pub fn apply_updated(&self, cache: &mut CacheStore, record: &Record) -> usize {
        let mut touched = 0;
        for key in self.keys_for(record.kind()) {
            let applied = cache.mutate(key, |items| {
                items
                    .into_iter()
                    .map(|item| {
                        if item.id() == record.id() {
                            record.clone()
                        } else {
                            item
                        }
                    })
                    .collect()
            });
            if applied {
                touched += 1;
            }
        }
        debug!(kind = ?record.kind(), id = record.id(), touched, "projected update");
        touched
    }

    /// Removes `id` from every tracked list of `kind`, preserving the order of
    /// what remains.
    pub fn apply_deleted(&self, cache: &mut CacheStore, kind: RecordKind, id: &str) -> usize {
        let mut touched = 0;
        for key in self.keys_for(kind) {
            let applied = cache.mutate(key, |items| {
                items.into_iter().filter(|item| item.id() != id).collect()
            });
            if applied {
                touched += 1;
            }
        }
        debug!(?kind, id, touched, "projected delete");
        touched
    }
}
