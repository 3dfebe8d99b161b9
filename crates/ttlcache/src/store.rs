//! Index + recency list, kept in 1:1 correspondence.
//!
//! Not synchronized; [`crate::Cache`] wraps it in a single `RwLock`.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use ahash::RandomState;

use crate::entry::{Deadline, Entry};
use crate::recency::{Handle, RecencyList};

/// Result of [`Store::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insert {
    /// Key was already present; nothing changed
    Present,
    /// Key was inserted at the head
    Inserted {
        /// An unrelated entry was evicted from the tail to make room
        evicted: bool,
    },
}

pub(crate) struct Store<K, V> {
    index: HashMap<K, Handle, RandomState>,
    list: RecencyList<Entry<K, V>>,
    max_size: usize,
}

impl<K, V> Store<K, V>
where
    K: Hash + Eq + Clone,
{
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            index: HashMap::with_capacity_and_hasher(max_size, RandomState::new()),
            list: RecencyList::with_capacity(max_size),
            max_size,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Insert at the head unless the key exists. Evicts the tail when full.
    pub(crate) fn insert(&mut self, key: K, value: Arc<V>, expires_at: Deadline) -> Insert {
        if self.index.contains_key(&key) {
            return Insert::Present;
        }

        let evicted = self.index.len() >= self.max_size && self.evict_tail();

        let handle = self
            .list
            .push_front(Entry::new(key.clone(), value, expires_at));
        self.index.insert(key, handle);
        debug_assert_eq!(self.index.len(), self.list.len());

        Insert::Inserted { evicted }
    }

    /// Live entry for `key`; expired entries are hidden but left in place
    pub(crate) fn lookup<Q>(&self, key: &Q, now: Instant) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        self.list.get(handle).filter(|entry| !entry.is_expired(now))
    }

    /// Move `key` to the head and reset its hit counter.
    ///
    /// Returns `false` if the key is gone (evicted or swept since the
    /// request was queued).
    pub(crate) fn promote<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&handle) = self.index.get(key) else {
            return false;
        };
        if !self.list.move_to_front(handle) {
            return false;
        }
        if let Some(entry) = self.list.get(handle) {
            entry.reset_hits();
        }
        true
    }

    /// Remove expired entries starting at the tail, stopping at the first
    /// live one. Expired entries further up the list are not visited.
    pub(crate) fn sweep_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some((handle, entry)) = self.list.back() {
            if !entry.is_expired(now) {
                break;
            }
            if let Some(entry) = self.list.remove(handle) {
                self.index.remove(&entry.key);
                removed += 1;
            }
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
    }

    fn evict_tail(&mut self) -> bool {
        match self.list.pop_back() {
            Some(entry) => {
                self.index.remove(&entry.key);
                true
            }
            None => false,
        }
    }

    /// Keys from head to tail
    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<K> {
        self.list.iter().map(|entry| entry.key.clone()).collect()
    }

    #[cfg(test)]
    pub(crate) fn hits<Q>(&self, key: &Q) -> Option<u32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        self.list.get(handle).map(Entry::hits)
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.list.assert_consistent();
        assert_eq!(self.index.len(), self.list.len());
        assert!(self.index.len() <= self.max_size);
        for (key, handle) in &self.index {
            let entry = self.list.get(*handle).expect("dangling handle in index");
            assert!(entry.key == *key, "handle resolves to a different key");
        }
    }
}
