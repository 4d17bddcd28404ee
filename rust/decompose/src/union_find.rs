// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disjoint-set forest keyed by arbitrary hashable values.
//!
//! Union by size with path compression. Items get a singleton set the first
//! time they are looked up.

use std::hash::Hash;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct UnionFind<T> {
    index: FxHashMap<T, usize>,
    parent: Vec<usize>,
    size: Vec<usize>,
    sets: usize,
}

impl<T: Hash + Eq + Clone> UnionFind<T> {
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            parent: Vec::new(),
            size: Vec::new(),
            sets: 0,
        }
    }

    /// Number of items seen so far
    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint sets
    #[inline]
    pub fn set_count(&self) -> usize {
        self.sets
    }

    /// Identifier of the set containing `item`, allocating a singleton set on
    /// first use. Two items are in the same set iff their identifiers match.
    pub fn find(&mut self, item: &T) -> usize {
        let slot = self.slot(item);
        self.root(slot)
    }

    /// Merge the sets of `a` and `b`, smaller into larger.
    ///
    /// Returns `false` when they were already in the same set.
    pub fn union(&mut self, a: &T, b: &T) -> bool {
        let mut ra = self.find(a);
        let mut rb = self.find(b);
        if ra == rb {
            return false;
        }

        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        self.sets -= 1;
        true
    }

    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Size of the set containing `item`
    pub fn set_size(&mut self, item: &T) -> usize {
        let root = self.find(item);
        self.size[root]
    }

    fn slot(&mut self, item: &T) -> usize {
        if let Some(&slot) = self.index.get(item) {
            return slot;
        }
        let slot = self.parent.len();
        self.index.insert(item.clone(), slot);
        self.parent.push(slot);
        self.size.push(1);
        self.sets += 1;
        slot
    }

    fn root(&mut self, slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut current = slot;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }
}

impl<T: Hash + Eq + Clone> Default for UnionFind<T> {
    fn default() -> Self {
        Self::new()
    }
}
