// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Ties the tokenizer and the two parent-block engines together into the
//! full double-buffered read/compress pipeline.
//!
//! Grounded on `BlockPlane.cpp`/`.h` and `BlockCompression.cpp`'s `main()` in
//! `examples/original_source/BlockCompression/` — those files show the
//! reader/writer double-buffering loop that `spec.md` only describes at the
//! model level (`spec.md` §5).

use crate::config::{EngineVariant, VolumeConfig};
use crate::engine::{LineMergeInput, ParentBlockEngine, TagNames, VoxelInput};
use crate::error::{Error, Result};
use crate::geometry::Vec3;
use crate::kdtree::ParentBlockKdTree;
use crate::line_merge::ParentBlockLineMerge;
use crate::sink::BlockSink;
use crate::tag::{TagId, TagInterner};
use crate::tokenizer::VoxelCsvReader;
use std::io::BufRead;

/// Number of alternating plane buffers, matching the original's two
/// `BlockPlane` instances.
const NUM_INSTANCES: u16 = 2;

/// One parent block, whichever engine variant the run was configured for.
enum EngineInstance {
    LineMerge(ParentBlockLineMerge),
    KdTree(ParentBlockKdTree),
}

impl EngineInstance {
    fn new(variant: EngineVariant, config: VolumeConfig, origin_ws: Vec3) -> Self {
        match variant {
            EngineVariant::LineMerge => Self::LineMerge(ParentBlockLineMerge::new(config, origin_ws)),
            EngineVariant::KdTree => Self::KdTree(ParentBlockKdTree::new(config, origin_ws)),
        }
    }
}

impl ParentBlockEngine for EngineInstance {
    fn compress_print(&mut self, sink: &mut dyn BlockSink, tag_names: &dyn TagNames) {
        match self {
            Self::LineMerge(p) => p.compress_print(sink, tag_names),
            Self::KdTree(p) => p.compress_print(sink, tag_names),
        }
    }

    fn reset(&mut self, num_planes: u16) {
        match self {
            Self::LineMerge(p) => p.reset(num_planes),
            Self::KdTree(p) => p.reset(num_planes),
        }
    }
}

impl EngineInstance {
    /// Dumps every voxel as its own 1x1x1 block, bypassing compression.
    /// A no-op for the line-merge variant, which never materializes a raw
    /// per-voxel array.
    fn debug_raw(&self, sink: &mut dyn BlockSink, tag_names: &dyn TagNames) {
        if let Self::KdTree(p) = self {
            p.print_raw(sink, tag_names);
        }
    }
}

/// A point-in-time, read-only clone of the tag interner's names, used so the
/// printing side of a plane boundary never needs to share the live interner
/// with the concurrently-reading side.
///
/// Safe because every tag a printing parent block can reference was
/// necessarily interned during *that block's own* previous read phase, which
/// completed strictly before this snapshot is taken — the concurrent reader
/// can only ever be adding names for the *other* buffer's plane.
pub(crate) struct NameSnapshot(Vec<String>);

impl TagNames for NameSnapshot {
    fn name_of(&self, global_id: TagId) -> &str {
        self.0.get(global_id as usize).map(String::as_str).unwrap_or("?")
    }
}

/// Drives the full pipeline: parses the header, builds the parent-block
/// grid, and alternates reading/compressing plane by plane.
pub struct PlaneOrchestrator<R> {
    config: VolumeConfig,
    tokenizer: VoxelCsvReader<R>,
    interner: TagInterner,
    num_pblocks: Vec3,
    current_plane: u16,
    buffer_a: Vec<EngineInstance>,
    buffer_b: Vec<EngineInstance>,
}

impl<R: BufRead> PlaneOrchestrator<R> {
    /// Reads the header and allocates both plane buffers' parent-block
    /// grids.
    ///
    /// # Errors
    /// Returns an error if the header is malformed or declares a
    /// parent-block size that does not divide the volume size.
    pub fn new(reader: R, variant: EngineVariant) -> Result<Self> {
        let mut tokenizer = VoxelCsvReader::new(reader);
        let (volume_dim, pblock_dim) = tokenizer.read_header()?;
        let config = VolumeConfig::new(volume_dim, pblock_dim)
            .map_err(Error::MalformedHeader)?
            .with_variant(variant);
        let num_pblocks = config.num_pblocks();

        let make_grid = |instance: u16| -> Vec<EngineInstance> {
            let mut grid = Vec::with_capacity(usize::from(num_pblocks.x) * usize::from(num_pblocks.y));
            for y in 0..num_pblocks.y {
                for x in 0..num_pblocks.x {
                    let origin_ws = Vec3::new(x, y, instance) * pblock_dim;
                    grid.push(EngineInstance::new(variant, config, origin_ws));
                }
            }
            grid
        };

        Ok(Self {
            config,
            tokenizer,
            interner: TagInterner::new(),
            num_pblocks,
            current_plane: 0,
            buffer_a: make_grid(0),
            buffer_b: make_grid(1),
        })
    }

    /// Whether a single plane of parent blocks already spans the whole
    /// volume's Z extent.
    #[must_use]
    pub fn single_plane_covers_volume(&self) -> bool {
        self.num_pblocks.z == 1
    }

    /// Whether there is another plane left to read.
    ///
    /// # Errors
    /// Returns [`Error::InvariantViolation`] if called after every declared
    /// plane has already been read — mirrors the original's
    /// `"BIG ERROR, read too many block planes"; exit(2)`.
    pub fn can_read(&self) -> Result<bool> {
        if self.current_plane > self.num_pblocks.z {
            return Err(Error::InvariantViolation(
                "read too many block planes".to_owned(),
            ));
        }
        Ok(self.current_plane < self.num_pblocks.z)
    }

    /// Runs the full pipeline to completion, writing every compressed block
    /// to `sink`.
    ///
    /// # Errors
    /// Propagates tokenizer/interner errors encountered while reading, and
    /// the over-read invariant violation from [`Self::can_read`].
    pub fn run(&mut self, sink: &mut dyn BlockSink) -> Result<()> {
        log::debug!("reading plane 0 of {}", self.num_pblocks.z);
        read_one_plane(
            &mut self.buffer_a,
            &mut self.tokenizer,
            &mut self.interner,
            self.num_pblocks,
            self.config.pblock_dim,
        )?;
        self.current_plane += 1;

        let mut buffer_a_is_current = true;

        while self.can_read()? {
            let snapshot = NameSnapshot(self.interner.names().to_vec());
            let num_pblocks = self.num_pblocks;
            let pblock_dim = self.config.pblock_dim;

            let (printing, reading) = if buffer_a_is_current {
                (&mut self.buffer_a, &mut self.buffer_b)
            } else {
                (&mut self.buffer_b, &mut self.buffer_a)
            };
            let tokenizer = &mut self.tokenizer;
            let interner = &mut self.interner;

            log::debug!(
                "compressing plane {} while reading plane {}",
                self.current_plane - 1,
                self.current_plane
            );
            let mut read_result: Result<()> = Ok(());
            std::thread::scope(|scope| {
                let handle = scope.spawn(|| {
                    read_one_plane(reading, tokenizer, interner, num_pblocks, pblock_dim)
                });

                for block in printing.iter_mut() {
                    block.compress_print(sink, &snapshot);
                    block.reset(NUM_INSTANCES);
                }

                read_result = handle.join().expect("reader thread panicked");
            });
            read_result?;

            self.current_plane += 1;
            buffer_a_is_current = !buffer_a_is_current;
        }

        let snapshot = NameSnapshot(self.interner.names().to_vec());
        let last = if buffer_a_is_current {
            &mut self.buffer_a
        } else {
            &mut self.buffer_b
        };
        for block in last.iter_mut() {
            block.compress_print(sink, &snapshot);
            block.reset(NUM_INSTANCES);
        }

        Ok(())
    }

    /// Single-threaded variant of [`Self::run`] that dumps every voxel
    /// individually instead of compressing, for differential-testing the
    /// compressed output against ground truth. Only meaningful for the
    /// kd-tree engine, which is the only variant that keeps a raw per-voxel
    /// array around to dump.
    ///
    /// # Errors
    /// Returns [`Error::InvariantViolation`] if the configured engine is not
    /// [`EngineVariant::KdTree`], and propagates any read error.
    pub fn run_debug_raw(&mut self, sink: &mut dyn BlockSink) -> Result<()> {
        if self.config.variant != EngineVariant::KdTree {
            return Err(Error::InvariantViolation(
                "--debug-raw is only supported for the kd-tree engine".to_owned(),
            ));
        }

        let snapshot_names = |interner: &TagInterner| NameSnapshot(interner.names().to_vec());

        while self.can_read()? {
            read_one_plane(
                &mut self.buffer_a,
                &mut self.tokenizer,
                &mut self.interner,
                self.num_pblocks,
                self.config.pblock_dim,
            )?;
            let snapshot = snapshot_names(&self.interner);
            for block in &mut self.buffer_a {
                block.debug_raw(sink, &snapshot);
                block.reset(1);
            }
            self.current_plane += 1;
        }

        Ok(())
    }
}

/// Reads one full plane of voxels into `buffer`, walking `(z, pBlock-y,
/// local-y, pBlock-x, local-x)` exactly as the original's five nested loops
/// over `(a, b, c, d, e)` do. For the line-merge variant, consecutive
/// same-tag voxels along local x are coalesced into runs before calling
/// `insert_block_line`, since the wire format is one voxel per line but the
/// engine wants pre-formed runs.
fn read_one_plane<R: BufRead>(
    buffer: &mut [EngineInstance],
    tokenizer: &mut VoxelCsvReader<R>,
    interner: &mut TagInterner,
    num_pblocks: Vec3,
    pblock_dim: Vec3,
) -> Result<()> {
    for a in 0..pblock_dim.z {
        for b in 0..num_pblocks.y {
            for c in 0..pblock_dim.y {
                for d in 0..num_pblocks.x {
                    let block_index = usize::from(b) * usize::from(num_pblocks.x) + usize::from(d);
                    match &mut buffer[block_index] {
                        EngineInstance::KdTree(p) => {
                            for _e in 0..pblock_dim.x {
                                let tag_name = tokenizer.next_tag_name()?;
                                let id = interner.get_id(&tag_name)?;
                                p.insert_voxel(id);
                            }
                        }
                        EngineInstance::LineMerge(p) => {
                            let mut run_start: u16 = 0;
                            let mut run_id: Option<TagId> = None;
                            for e in 0..pblock_dim.x {
                                let tag_name = tokenizer.next_tag_name()?;
                                let id = interner.get_id(&tag_name)?;
                                match run_id {
                                    None => {
                                        run_id = Some(id);
                                        run_start = e;
                                    }
                                    Some(cur) if cur == id => {}
                                    Some(cur) => {
                                        p.insert_block_line(Vec3::new(run_start, c, a), e - run_start, cur)?;
                                        run_id = Some(id);
                                        run_start = e;
                                    }
                                }
                            }
                            if let Some(cur) = run_id {
                                p.insert_block_line(
                                    Vec3::new(run_start, c, a),
                                    pblock_dim.x - run_start,
                                    cur,
                                )?;
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
