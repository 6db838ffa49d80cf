// SPDX-License-Identifier: MIT

//! Frequency table used to find lines that occur exactly once on each side.

use std::collections::HashMap;

use crate::normalize::{normalize_new, normalize_old, NormalizeFn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub count_old: usize,
    pub count_new: usize,
    /// Caller-defined position of the first occurrence on each side.
    pub first_old: usize,
    pub first_new: usize,
}
impl FrequencyEntry {
    pub fn is_unique(&self) -> bool {
        self.count_old == 1 && self.count_new == 1
    }
}

/// Counts normalized line texts on both sides of a slice.
///
/// Entries are kept in the order in which their text was first seen, so that
/// iterating the unique entries is deterministic.
pub struct UniquenessCounter<'a> {
    normalize: &'a NormalizeFn<'a>,
    index: HashMap<String, usize>,
    entries: Vec<FrequencyEntry>,
}
impl<'a> UniquenessCounter<'a> {
    pub fn new(normalize: &'a NormalizeFn<'a>) -> Self {
        Self {
            normalize,
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: String) -> &mut FrequencyEntry {
        let entries = &mut self.entries;
        let idx = *self.index.entry(key).or_insert_with(|| {
            entries.push(FrequencyEntry {
                count_old: 0,
                count_new: 0,
                first_old: 0,
                first_new: 0,
            });
            entries.len() - 1
        });
        &mut self.entries[idx]
    }

    pub fn add_old(&mut self, text: &str, pos: usize) {
        let key = normalize_old(self.normalize, text);
        let entry = self.entry(key);
        if entry.count_old == 0 {
            entry.first_old = pos;
        }
        entry.count_old += 1;
    }

    pub fn add_new(&mut self, text: &str, pos: usize) {
        let key = normalize_new(self.normalize, text);
        let entry = self.entry(key);
        if entry.count_new == 0 {
            entry.first_new = pos;
        }
        entry.count_new += 1;
    }

    /// Positions `(old, new)` of all texts that are unique on both sides, in
    /// first-seen order.
    pub fn unique(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter()
            .filter(|entry| entry.is_unique())
            .map(|entry| (entry.first_old, entry.first_new))
    }
}
