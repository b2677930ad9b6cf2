//! Observer lists used by the draft and cache stores
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Slot<F> = Rc<RefCell<Box<F>>>;

/// Ordered list of callbacks. `F` is the callback's trait object type, e.g.
/// `dyn FnMut(&DraftStore)`.
pub struct Subscribers<F: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Slot<F>)>,
}

/// The callbacks registered at one moment. Calling through a snapshot needs
/// no borrow of the store that owns the list, so callbacks may read that
/// store, subscribe or unsubscribe.
pub struct Snapshot<F: ?Sized> {
    callbacks: Vec<Slot<F>>,
}

impl<F: ?Sized> Subscribers<F> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: vec![],
        }
    }
    pub fn add(&mut self, callback: Box<F>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Rc::new(RefCell::new(callback))));
        id
    }
    /// Returns false when the id was never registered or already removed.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn snapshot(&self) -> Snapshot<F> {
        Snapshot {
            callbacks: self.entries.iter().map(|(_, slot)| slot.clone()).collect(),
        }
    }
}

impl<F: ?Sized> Snapshot<F> {
    /// Runs `call` on each callback in registration order. A callback that is
    /// already running further up the stack is skipped.
    pub fn each(&self, mut call: impl FnMut(&mut F)) {
        for slot in &self.callbacks {
            match slot.try_borrow_mut() {
                Ok(mut callback) => call(&mut **callback),
                Err(_) => debug!("skipping re-entrant subscriber"),
            }
        }
    }
}

impl<F: ?Sized> Default for Subscribers<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_run_in_registration_order() {
        let mut seen = vec![];
        let mut subs: Subscribers<dyn FnMut(&mut Vec<u8>)> = Subscribers::new();
        subs.add(Box::new(|v: &mut Vec<u8>| v.push(1)));
        let second = subs.add(Box::new(|v: &mut Vec<u8>| v.push(2)));
        subs.add(Box::new(|v: &mut Vec<u8>| v.push(3)));

        assert!(subs.remove(second));
        assert!(!subs.remove(second));

        subs.snapshot().each(|callback| callback(&mut seen));
        assert_eq!(seen, vec![1, 3]);
    }

    #[test]
    fn snapshot_outlives_later_removal() {
        let mut seen = vec![];
        let mut subs: Subscribers<dyn FnMut(&mut Vec<u8>)> = Subscribers::new();
        let only = subs.add(Box::new(|v: &mut Vec<u8>| v.push(7)));

        let snapshot = subs.snapshot();
        subs.remove(only);

        snapshot.each(|callback| callback(&mut seen));
        subs.snapshot().each(|callback| callback(&mut seen));
        assert_eq!(seen, vec![7]);
    }
}
