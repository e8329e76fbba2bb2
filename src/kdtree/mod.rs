// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The kd-tree parent-block engine: recursive information-gain splitting.
//!
//! Grounded directly on `ParentBlock.cpp`/`.h` in
//! `examples/original_source/BlockCompression/` — the only variant whose
//! original implementation survived source retrieval, so this module is a
//! close transliteration rather than a re-derivation.

mod gain;

use crate::config::VolumeConfig;
use crate::engine::{ParentBlockEngine, TagNames, VoxelInput};
use crate::geometry::{Axis, Strides, SubVolume, Vec3};
use crate::sink::{BlockSink, EmittedBlock};
use crate::tag::{LocalTagTable, TagId};

/// An axis and the voxel coordinate along it separating two sub-volumes. A
/// split point of `p` means "between index `p-1` and `p`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Split {
    pub axis: Axis,
    pub point: u16,
}

/// The chosen split plus whether either resulting half is already
/// homogeneous and can be emitted immediately without further recursion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitResult {
    pub split: Split,
    pub print_left: bool,
    pub print_right: bool,
}

/// Per-parent-block state for the kd-tree variant.
pub struct ParentBlockKdTree {
    config: VolumeConfig,
    strides: Strides,
    origin_ws: Vec3,
    /// Local tag ids, one per voxel, in `(x fastest, then y, then z)` order.
    voxels: Vec<TagId>,
    array_index: usize,
    local_tags: LocalTagTable,
    job_stack: Vec<SubVolume>,
}

impl ParentBlockKdTree {
    #[must_use]
    pub fn new(config: VolumeConfig, origin_ws: Vec3) -> Self {
        let strides = config.strides();
        let len = config.pblock_volume() as usize;
        Self {
            config,
            strides,
            origin_ws,
            voxels: vec![0; len],
            array_index: 0,
            local_tags: LocalTagTable::new(),
            job_stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn origin_ws(&self) -> Vec3 {
        self.origin_ws
    }

    fn emit_single(
        &self,
        sink: &mut dyn BlockSink,
        tag_names: &dyn TagNames,
        origin: Vec3,
        size: Vec3,
        local_id: TagId,
    ) {
        let global_id = self
            .local_tags
            .global_of(local_id)
            .expect("every local id stored in voxels was assigned by insert_voxel");
        sink.emit(
            EmittedBlock {
                origin: self.origin_ws + origin,
                size,
                tag: global_id,
            },
            tag_names.name_of(global_id),
        );
    }

    fn voxel_at(&self, p: Vec3) -> TagId {
        self.voxels[self.strides.linearize(p) as usize]
    }

    fn choose_split(&self, origin: Vec3, size: Vec3) -> SplitResult {
        let num_tags = self.local_tags.len().max(1);
        let (slices_x, slices_y, slices_z) = gain::build_slice_tallies(self, origin, size, num_tags);

        let whole: Vec<u32> = gain::sum_slices(&slices_x, num_tags);
        let total_info = gain::information_content(&whole);

        let mut best_gain = -1.0f32;
        let mut best_split = Split { axis: Axis::X, point: 1 };
        let mut left_same = false;
        let mut right_same = false;

        for (axis, slices) in [(Axis::X, &slices_x), (Axis::Y, &slices_y), (Axis::Z, &slices_z)] {
            if let Some(result) = gain::scan_axis(
                axis,
                slices,
                num_tags,
                total_info,
                &mut best_gain,
                &mut best_split,
                &mut left_same,
                &mut right_same,
            ) {
                return result;
            }
        }

        SplitResult {
            split: best_split,
            print_left: left_same,
            print_right: right_same,
        }
    }

    fn kd_tree_print(&mut self, sink: &mut dyn BlockSink, tag_names: &dyn TagNames) {
        while let Some(sub_volume) = self.job_stack.pop() {
            let origin = sub_volume.origin;
            let size = sub_volume.size;

            let split_result = self.choose_split(origin, size);
            let split = split_result.split;

            let mut origin2 = origin;
            let mut new_size1 = size;
            let mut new_size2 = size;
            match split.axis {
                Axis::X => {
                    origin2.x += split.point;
                    new_size1.x = split.point;
                    new_size2.x = size.x - split.point;
                }
                Axis::Y => {
                    origin2.y += split.point;
                    new_size1.y = split.point;
                    new_size2.y = size.y - split.point;
                }
                Axis::Z => {
                    origin2.z += split.point;
                    new_size1.z = split.point;
                    new_size2.z = size.z - split.point;
                }
            }

            if split_result.print_right {
                let local = self.voxel_at(origin2);
                self.emit_single(sink, tag_names, origin2, new_size2, local);
            } else if new_size2 == Vec3::new(1, 1, 1) {
                let local = self.voxel_at(origin2);
                self.emit_single(sink, tag_names, origin2, new_size2, local);
            } else {
                self.job_stack.push(SubVolume::new(origin2, new_size2));
            }

            if split_result.print_left {
                let local = self.voxel_at(origin);
                self.emit_single(sink, tag_names, origin, new_size1, local);
            } else if new_size1 == Vec3::new(1, 1, 1) {
                let local = self.voxel_at(origin);
                self.emit_single(sink, tag_names, origin, new_size1, local);
            } else {
                self.job_stack.push(SubVolume::new(origin, new_size1));
            }
        }
    }

    /// Emits every voxel as its own 1x1x1 block, bypassing compression.
    /// Wired to the CLI's `--debug-raw` flag (`spec.md`'s supplemented §4.6).
    pub fn print_raw(&self, sink: &mut dyn BlockSink, tag_names: &dyn TagNames) {
        let dim = self.config.pblock_dim;
        for z in 0..dim.z {
            for y in 0..dim.y {
                for x in 0..dim.x {
                    let p = Vec3::new(x, y, z);
                    let local = self.voxel_at(p);
                    self.emit_single(sink, tag_names, p, Vec3::new(1, 1, 1), local);
                }
            }
        }
    }
}

impl VoxelInput for ParentBlockKdTree {
    fn insert_voxel(&mut self, global_id: TagId) {
        let local = self.local_tags.local_id(global_id);
        self.voxels[self.array_index] = local;
        self.array_index += 1;
    }
}

impl ParentBlockEngine for ParentBlockKdTree {
    fn compress_print(&mut self, sink: &mut dyn BlockSink, tag_names: &dyn TagNames) {
        if self.local_tags.len() == 1 {
            log::trace!("parent block at {} is homogeneous, skipping split", self.origin_ws);
            let global_id = self.local_tags.global_of(0).expect("len() == 1");
            sink.emit(
                EmittedBlock {
                    origin: self.origin_ws,
                    size: self.config.pblock_dim,
                    tag: global_id,
                },
                tag_names.name_of(global_id),
            );
            return;
        }

        self.job_stack.push(SubVolume::new(Vec3::ZERO, self.config.pblock_dim));
        self.kd_tree_print(sink, tag_names);
        log::debug!(
            "parent block at {}: {} distinct tags, split to completion",
            self.origin_ws,
            self.local_tags.len()
        );
    }

    fn reset(&mut self, num_planes: u16) {
        self.origin_ws.z += self.config.pblock_dim.z * num_planes;
        self.array_index = 0;
        self.local_tags.clear();
    }
}
