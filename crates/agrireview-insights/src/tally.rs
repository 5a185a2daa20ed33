//! Occurrence counting with stable, first-seen tie breaking.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

use serde::{Serialize, Serializer};

/// Counts keys while remembering the order each key was first seen.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, u64)>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by descending count; equal counts keep first-seen order.
    /// `limit` keeps only the first `n` entries.
    pub fn into_ranked(self, limit: Option<usize>) -> Ranked<K> {
        let mut entries = self.entries;
        // Stable sort: ties stay in first-seen order.
        entries.sort_by_key(|(_, count)| Reverse(*count));
        if let Some(n) = limit {
            entries.truncate(n);
        }
        Ranked(entries)
    }
}

impl<K: Eq + Hash + Clone> Default for Tally<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for Tally<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tally = Self::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

/// Ranked `(key, count)` pairs. Serializes as a JSON object in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked<K>(pub Vec<(K, u64)>);

impl<K> Ranked<K> {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, u64)> {
        self.0.iter()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

impl<K: PartialEq> Ranked<K> {
    pub fn get(&self, key: &K) -> Option<u64> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }
}

impl<K> Default for Ranked<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Serialize> Serialize for Ranked<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, c)| (k, c)))
    }
}
