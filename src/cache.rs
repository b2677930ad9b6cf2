//! Keyed store of previously fetched list results
use super::catalog::Record;
use super::notify::{Subscribers, SubscriptionId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Canonical identity of a list query: operation name plus its arguments.
/// Arguments are kept sorted, so insertion order never changes the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    operation: String,
    args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheEntry {
    items: Vec<Record>,
}

type CacheCallback = dyn FnMut(&QueryKey, &CacheEntry);

/// Entries are only ever replaced whole. Subscribers hear about replaced
/// entries from [`CacheStore::publish`], never in between.
#[derive(Default)]
pub struct CacheStore {
    entries: HashMap<QueryKey, CacheEntry>,
    changed: Vec<QueryKey>,
    subscribers: Subscribers<CacheCallback>,
}

impl QueryKey {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: BTreeMap::new(),
        }
    }
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }
    pub fn operation(&self) -> &str {
        &self.operation
    }
    pub fn args(&self) -> &BTreeMap<String, String> {
        &self.args
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        if self.args.is_empty() {
            return Ok(());
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        write!(f, "({})", args.join(","))
    }
}

impl CacheEntry {
    /// Builds an entry, keeping the first item for any repeated id.
    pub fn new(items: Vec<Record>) -> Self {
        let mut unique: Vec<Record> = Vec::with_capacity(items.len());
        for item in items {
            if unique.iter().any(|kept| kept.id() == item.id()) {
                warn!(id = item.id(), "dropping duplicate id from cache entry");
                continue;
            }
            unique.push(item);
        }
        Self { items: unique }
    }
    pub fn items(&self) -> &[Record] {
        &self.items
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(Record::id).collect()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }
    pub fn has_unpublished(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Replaces the entry wholesale, creating it if needed.
    pub fn write(&mut self, key: &QueryKey, items: Vec<Record>) {
        let entry = CacheEntry::new(items);
        debug!(key = %key, items = entry.len(), "cache write");
        self.entries.insert(key.clone(), entry);
        self.mark_changed(key);
    }

    /// Reads the entry, applies `transform` and writes the result back in one
    /// step. A missing entry stays missing: returns false and `transform` is
    /// never called.
    pub fn mutate<F>(&mut self, key: &QueryKey, transform: F) -> bool
    where
        F: FnOnce(Vec<Record>) -> Vec<Record>,
    {
        let Some(current) = self.entries.get(key) else {
            debug!(key = %key, "cache miss on mutate, left for the next fetch");
            return false;
        };

        let next = CacheEntry::new(transform(current.items.clone()));
        debug!(key = %key, before = current.len(), after = next.len(), "cache mutate");
        self.entries.insert(key.clone(), next);
        self.mark_changed(key);
        true
    }

    /// Drops an entry so the next read is a miss.
    pub fn evict(&mut self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&QueryKey, &CacheEntry) + 'static,
    ) -> SubscriptionId {
        self.subscribers.add(Box::new(callback))
    }
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Tells subscribers about every entry replaced since the last publish,
    /// once per key with its latest contents. The cell is not borrowed while
    /// they run, so a subscriber may read or write the cache again.
    pub fn publish(cache: &RefCell<CacheStore>) {
        let (changed, subscribers) = {
            let mut store = cache.borrow_mut();
            let keys = std::mem::take(&mut store.changed);
            let changed: Vec<(QueryKey, CacheEntry)> = keys
                .into_iter()
                .filter_map(|key| {
                    let entry = store.entries.get(&key)?.clone();
                    Some((key, entry))
                })
                .collect();
            (changed, store.subscribers.snapshot())
        };

        for (key, entry) in &changed {
            subscribers.each(|callback| callback(key, entry));
        }
    }

    fn mark_changed(&mut self, key: &QueryKey) {
        if !self.changed.contains(key) {
            self.changed.push(key.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn product(id: &str) -> Record {
        Record::Product(Product {
            id: id.into(),
            name: id.into(),
            stock: 1,
            price: 1,
        })
    }

    #[test]
    fn argument_order_does_not_change_the_key() {
        let a = QueryKey::new("ordersForSeller")
            .with_arg("seller", "u1")
            .with_arg("page", "2");
        let b = QueryKey::new("ordersForSeller")
            .with_arg("page", "2")
            .with_arg("seller", "u1");

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "ordersForSeller(page=2,seller=u1)");
        assert_eq!(QueryKey::new("productCatalog").to_string(), "productCatalog");
    }

    #[test]
    fn mutate_on_miss_is_a_noop() {
        let mut cache = CacheStore::new();
        let key = QueryKey::new("productCatalog");

        let mut called = false;
        let applied = cache.mutate(&key, |items| {
            called = true;
            items
        });

        assert!(!applied);
        assert!(!called);
        assert!(cache.read(&key).is_none());
    }

    #[test]
    fn write_keeps_first_of_duplicate_ids() {
        let mut cache = CacheStore::new();
        let key = QueryKey::new("productCatalog");
        cache.write(&key, vec![product("a"), product("b"), product("a")]);

        assert_eq!(cache.read(&key).map(CacheEntry::ids), Some(vec!["a", "b"]));
    }

    #[test]
    fn subscribers_only_see_finished_entries() {
        let seen = Rc::new(RefCell::new(vec![]));
        let cache = RefCell::new(CacheStore::new());
        let key = QueryKey::new("productCatalog");

        let sink = seen.clone();
        cache.borrow_mut().subscribe(move |k, entry| {
            sink.borrow_mut()
                .push((k.to_string(), entry.ids().join(",")))
        });

        cache.borrow_mut().write(&key, vec![product("a")]);
        CacheStore::publish(&cache);
        {
            let mut store = cache.borrow_mut();
            store.mutate(&key, |mut items| {
                items.push(product("b"));
                items
            });
            store.mutate(&key, |mut items| {
                items.push(product("c"));
                items
            });
            store.mutate(&QueryKey::new("ordersForSeller"), |items| items);
        }
        CacheStore::publish(&cache);
        CacheStore::publish(&cache);

        assert_eq!(
            *seen.borrow(),
            vec![
                ("productCatalog".to_string(), "a".to_string()),
                ("productCatalog".to_string(), "a,b,c".to_string()),
            ]
        );
    }

    #[test]
    fn subscribers_may_read_the_shared_cache() {
        let cache = Rc::new(RefCell::new(CacheStore::new()));
        let key = QueryKey::new("productCatalog");
        let seen = Rc::new(RefCell::new(vec![]));

        let handle = Rc::downgrade(&cache);
        let sink = seen.clone();
        let watched = key.clone();
        cache.borrow_mut().subscribe(move |_, _| {
            if let Some(cache) = handle.upgrade() {
                let len = cache.borrow().read(&watched).map(CacheEntry::len);
                sink.borrow_mut().push(len);
            }
        });

        cache.borrow_mut().write(&key, vec![product("a"), product("b")]);
        assert!(cache.borrow().has_unpublished());
        CacheStore::publish(&cache);

        assert!(!cache.borrow().has_unpublished());
        assert_eq!(*seen.borrow(), vec![Some(2)]);
    }
}
