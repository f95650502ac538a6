/*
 * script/cache.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Insertion-ordered cache with a fixed capacity.
 */

use std::borrow::Borrow;
use std::hash::Hash;

use hashlink::LinkedHashMap;

/// A map that holds at most `capacity` entries.
///
/// When full, inserting a new key evicts the oldest *inserted* entry.
/// Reads do not refresh an entry's position, and replacing the value of an
/// existing key keeps its original position.
#[derive(Debug, Clone)]
pub struct BoundedCache<K: Hash + Eq, V> {
    entries: LinkedHashMap<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq, V> BoundedCache<K, V> {
    /// Create a cache; a capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LinkedHashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Insert or replace an entry, returning the evicted entry if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.entries.replace(key, value);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}
