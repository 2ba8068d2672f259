//! Separate-chaining hash table keyed by message id
//!
//! `bucket = key % bucket_count`. Entries sit in an arena and each bucket
//! holds the index of its chain head; new entries go to the head of their
//! chain. Duplicate keys are not detected here.

use std::collections::TryReserveError;

use crate::lru::NodeHandle;
use crate::CacheKey;

/// Table entry: key, payload and the handle of its recency node
#[derive(Debug)]
pub struct Entry<V> {
    key: CacheKey,
    value: V,
    node: NodeHandle,
    next: Option<usize>,
}

impl<V> Entry<V> {
    /// Entry key
    pub fn key(&self) -> CacheKey {
        self.key
    }

    /// Stored payload
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Mutable payload
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Handle of the matching recency node
    pub fn node(&self) -> NodeHandle {
        self.node
    }
}

/// Fixed bucket-count hash table with chained buckets
#[derive(Debug)]
pub struct HashTable<V> {
    buckets: Vec<Option<usize>>,
    entries: Vec<Option<Entry<V>>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<V> HashTable<V> {
    /// Create a table with `bucket_count` buckets
    ///
    /// # Panics
    /// Panics if `bucket_count` is zero.
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "Bucket count must be greater than 0");

        Self {
            buckets: vec![None; bucket_count],
            entries: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Bucket a key hashes to
    pub fn bucket_index(&self, key: CacheKey) -> usize {
        (key % self.buckets.len() as u64) as usize
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Make sure the next `additional` inserts will not allocate
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let needed = additional.saturating_sub(self.free_list.len());
        self.entries.try_reserve(needed)
    }

    /// Find the entry for `key`
    pub fn find(&self, key: CacheKey) -> Option<&Entry<V>> {
        self.chain(self.bucket_index(key))
            .find(|entry| entry.key == key)
    }

    /// Find the entry for `key`, mutably
    pub fn find_mut(&mut self, key: CacheKey) -> Option<&mut Entry<V>> {
        let idx = self.position(key)?;
        self.entries[idx].as_mut()
    }

    /// Insert at the head of the key's chain
    ///
    /// The caller must ensure `key` is not already present.
    pub fn insert(&mut self, key: CacheKey, value: V, node: NodeHandle) {
        let bucket = self.bucket_index(key);
        let idx = self.alloc_entry();

        self.entries[idx] = Some(Entry {
            key,
            value,
            node,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = Some(idx);
        self.len += 1;
    }

    /// Unlink and return the entry for `key`; `None` if absent
    pub fn remove(&mut self, key: CacheKey) -> Option<Entry<V>> {
        let bucket = self.bucket_index(key);
        let mut prev: Option<usize> = None;
        let mut cursor = self.buckets[bucket];

        while let Some(idx) = cursor {
            let (entry_key, next) = match &self.entries[idx] {
                Some(entry) => (entry.key, entry.next),
                None => return None,
            };

            if entry_key == key {
                match prev {
                    Some(prev_idx) => {
                        if let Some(prev_entry) = &mut self.entries[prev_idx] {
                            prev_entry.next = next;
                        }
                    }
                    None => self.buckets[bucket] = next,
                }

                let mut entry = self.entries[idx].take()?;
                entry.next = None;
                self.free_list.push(idx);
                self.len -= 1;
                return Some(entry);
            }

            prev = cursor;
            cursor = next;
        }

        None
    }

    /// Entries of one bucket, chain order (most recently inserted first)
    pub fn chain(&self, bucket: usize) -> impl Iterator<Item = &Entry<V>> + '_ {
        let mut cursor = self.buckets.get(bucket).copied().flatten();
        std::iter::from_fn(move || {
            let entry = self.entries.get(cursor?)?.as_ref()?;
            cursor = entry.next;
            Some(entry)
        })
    }

    /// All entries, bucket by bucket
    pub fn iter(&self) -> impl Iterator<Item = &Entry<V>> + '_ {
        (0..self.buckets.len()).flat_map(move |bucket| self.chain(bucket))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|head| *head = None);
        self.entries.clear();
        self.free_list.clear();
        self.len = 0;
    }

    fn position(&self, key: CacheKey) -> Option<usize> {
        let mut cursor = self.buckets[self.bucket_index(key)];
        while let Some(idx) = cursor {
            let entry = self.entries[idx].as_ref()?;
            if entry.key == key {
                return Some(idx);
            }
            cursor = entry.next;
        }
        None
    }

    fn alloc_entry(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.entries.len();
            self.entries.push(None);
            idx
        }
    }
}
