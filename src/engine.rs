// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The capability traits both parent-block engines implement.
//!
//! Grounded on `src/compaction/mod.rs`'s `CompactionStrategy` trait: a small
//! abstraction over interchangeable algorithms that the driver selects
//! between at startup, per `spec.md` §9's re-architecting guidance ("expose
//! the engine as a polymorphic abstraction over the capability set
//! `{ insertLine | insertVoxel, compressPrint, reset }`").

use crate::error::Result;
use crate::geometry::Vec3;
use crate::sink::BlockSink;
use crate::tag::TagId;

/// Common lifecycle every parent-block engine supports, regardless of which
/// insertion form it takes.
pub trait ParentBlockEngine {
    /// Compresses the accumulated voxels and writes the resulting blocks to
    /// `sink`. Idempotent only via `reset` (calling twice without a reset in
    /// between re-emits over already-reset-cleared state).
    fn compress_print(&mut self, sink: &mut dyn BlockSink, tag_names: &dyn TagNames);

    /// Clears block state and advances the world-space origin by
    /// `pblock_dim.z * num_planes` along Z, so the instance can be reused
    /// for the next Z-slab.
    fn reset(&mut self, num_planes: u16);
}

/// Resolves a local tag id (as stored inside a parent block) back to its
/// display name, without the engine needing to own the global interner.
pub trait TagNames {
    fn name_of(&self, global_id: TagId) -> &str;
}

/// Input form for the line-merge variant: pre-formed (origin, length, tag)
/// runs along X.
pub trait LineMergeInput {
    /// Appends an X-aligned run.
    ///
    /// # Errors
    /// Returns an error if `origin.x + length` exceeds the parent-block's X
    /// dimension.
    fn insert_block_line(&mut self, origin: Vec3, length: u16, id: TagId) -> Result<()>;
}

/// Input form for the kd-tree variant: one voxel at a time, row-major over
/// `(z, y, x)`.
pub trait VoxelInput {
    fn insert_voxel(&mut self, global_id: TagId);
}
