// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Compresses a tagged voxel volume into a minimal set of axis-aligned
//! boxes.
//!
//! ##### About
//!
//! A volume is a dense 3D grid of voxels, each carrying a string tag (a
//! material name, a region label, whatever the caller's domain calls it).
//! Storing or transmitting one tag per voxel is wasteful when large runs of
//! voxels share a tag, so this crate re-expresses the volume as a set of
//! non-overlapping, axis-aligned boxes, each homogeneous in its tag, that
//! together cover every voxel exactly once.
//!
//! The volume is read plane by plane and tiled into parent blocks — fixed-
//! size sub-volumes that are compressed and emitted independently, so
//! arbitrarily large volumes can stream through in bounded memory. Two
//! compression engines are available per parent block:
//!
//! - [`EngineVariant::LineMerge`]: a greedy same-tag run merge along Y then
//!   Z, followed by a shelf-compression pass that folds partially-aligned
//!   neighbors into fewer, larger boxes.
//! - [`EngineVariant::KdTree`]: recursive information-gain splitting, which
//!   repeatedly finds the axis-aligned cut that best separates two
//!   sub-volumes by tag until every resulting sub-volume is homogeneous.
//!
//! Neither engine guarantees a minimal box count; both are heuristics that
//! trade search depth for speed.
//!
//! # Example usage
//!
//! ```
//! use blockvol::{EngineVariant, PlaneOrchestrator, VecSink};
//! use std::io::Cursor;
//!
//! let csv = "V,2,2,1,2,2,1\n\
//!            0,0,0,'Granite'\n1,0,0,'Granite'\n\
//!            0,1,0,'Granite'\n1,1,0,'Granite'\n";
//!
//! let mut orchestrator =
//!     PlaneOrchestrator::new(Cursor::new(csv.as_bytes()), EngineVariant::LineMerge)?;
//! let mut sink = VecSink::default();
//! orchestrator.run(&mut sink)?;
//!
//! assert_eq!(sink.blocks.len(), 1);
//! # Ok::<(), blockvol::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod kdtree;
pub mod line_merge;
pub mod plane;
pub mod sink;
pub mod tag;
pub mod tokenizer;

pub use config::{EngineVariant, VolumeConfig};
pub use engine::{LineMergeInput, ParentBlockEngine, TagNames, VoxelInput};
pub use error::{Error, Result};
pub use geometry::{Axis, Strides, SubVolume, Vec3};
pub use kdtree::ParentBlockKdTree;
pub use line_merge::ParentBlockLineMerge;
pub use plane::PlaneOrchestrator;
pub use sink::{BlockSink, CsvSink, EmittedBlock, VecSink};
pub use tag::{LocalTagTable, TagId, TagInterner};
pub use tokenizer::VoxelCsvReader;
