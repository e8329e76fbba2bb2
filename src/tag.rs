// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The global tag interner and the per-parent-block local tag table.
//!
//! Grounded on `TagTable.cpp`/`.h` (global string -> id table) and
//! `ParentBlock::getLocalID` (per-block global -> local remap) in
//! `examples/original_source/BlockCompression/`.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;

/// A tag identifier, one byte, interned globally. Bounded to 256 distinct
/// values for the whole run, as `spec.md` §4.4 specifies.
pub type TagId = u8;

/// Maps tag strings to small integer ids and back.
///
/// Owned by the driver and passed by reference, never a singleton, per the
/// Design Notes' re-architecting guidance for the original's "global mutable
/// tag table".
#[derive(Debug, Default)]
pub struct TagInterner {
    ids: FxHashMap<String, TagId>,
    names: Vec<String>,
}

impl TagInterner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            names: Vec::with_capacity(256),
        }
    }

    /// Returns the id for `name`, interning it on first sight.
    pub fn get_id(&mut self, name: &str) -> Result<TagId> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let next = self.names.len();
        let id: TagId = next.try_into().map_err(|_| Error::TagAlphabetExhausted)?;
        self.ids.insert(name.to_owned(), id);
        self.names.push(name.to_owned());
        Ok(id)
    }

    /// Inverts `getId`: returns the tag name for a previously assigned id.
    #[must_use]
    pub fn get_tag(&self, id: TagId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    #[must_use]
    pub fn total_tags(&self) -> usize {
        self.names.len()
    }

    /// All interned names in id order, for taking a point-in-time snapshot
    /// (see `plane::NameSnapshot`).
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Per-parent-block map from global tag id to a dense local tag id, keeping
/// the per-block alphabet tight so slice tallies stay compact.
///
/// Grounded on `ParentBlock::getLocalID`/`localIDTable`/`tagNames` in
/// `ParentBlock.cpp`.
#[derive(Debug, Default)]
pub struct LocalTagTable {
    local_ids: FxHashMap<TagId, TagId>,
    /// local id -> global id, in assignment order.
    global_ids: Vec<TagId>,
}

impl LocalTagTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            local_ids: FxHashMap::default(),
            global_ids: Vec::new(),
        }
    }

    /// Converts a global id to a local id, assigning a fresh local id on
    /// first sight. `getLocalID(g)` is a function: two calls with the same
    /// global id return the same local id (the Local-ID injectivity
    /// invariant from `spec.md` §8).
    pub fn local_id(&mut self, global_id: TagId) -> TagId {
        if let Some(&local) = self.local_ids.get(&global_id) {
            return local;
        }
        let local = self.global_ids.len() as TagId;
        self.local_ids.insert(global_id, local);
        self.global_ids.push(global_id);
        local
    }

    #[must_use]
    pub fn global_of(&self, local_id: TagId) -> Option<TagId> {
        self.global_ids.get(local_id as usize).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.global_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global_ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.local_ids.clear();
        self.global_ids.clear();
    }
}
