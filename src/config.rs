// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::geometry::{Strides, Vec3};

/// Which compression engine a parent block runs.
///
/// Chosen once by the driver at startup, per the Design Notes: "expose the
/// engine as a polymorphic abstraction ... the driver selects one variant at
/// startup based on which input form the tokeniser provides."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineVariant {
    /// Greedy run-length merge along Y then Z, followed by shelf compression.
    LineMerge,

    /// Recursive information-gain splitting.
    KdTree,
}

impl std::fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::LineMerge => "line-merge",
            Self::KdTree => "kd-tree",
        })
    }
}

impl std::str::FromStr for EngineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line-merge" | "line_merge" | "linemerge" => Ok(Self::LineMerge),
            "kd-tree" | "kdtree" | "kd_tree" => Ok(Self::KdTree),
            other => Err(format!("unknown engine variant: {other}")),
        }
    }
}

/// Immutable configuration shared by every `ParentBlock` instance in a run.
///
/// Replaces the original's process-wide static members
/// (`ParentBlock::pBlockDim`, `::translations`, `::tt`) with an explicit
/// value passed into each parent block on construction, per the Design
/// Notes' re-architecting guidance: "pass an immutable configuration value
/// into each ParentBlock on construction ... makes the engine unit-testable
/// with multiple configurations in one process."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeConfig {
    /// Total volume dimensions, in voxels.
    pub volume_dim: Vec3,

    /// Parent-block dimensions, in voxels. Must divide `volume_dim` exactly.
    pub pblock_dim: Vec3,

    /// Which compression engine to run per parent block.
    pub variant: EngineVariant,
}

impl VolumeConfig {
    /// Builds a config, checking that parent-block dims divide volume dims.
    ///
    /// The original implementation does not validate this (see `spec.md`
    /// §9: "Header parsing ... does not validate that
    /// `volumeDim % pBlockDim == 0`; callers must ensure it"). This
    /// constructor performs the check so that malformed configuration is
    /// caught at the boundary instead of producing silently wrong tiling.
    pub fn new(volume_dim: Vec3, pblock_dim: Vec3) -> Result<Self, String> {
        if pblock_dim.x == 0 || pblock_dim.y == 0 || pblock_dim.z == 0 {
            return Err("parent-block dimensions must be non-zero".to_owned());
        }
        if volume_dim.x % pblock_dim.x != 0
            || volume_dim.y % pblock_dim.y != 0
            || volume_dim.z % pblock_dim.z != 0
        {
            return Err(format!(
                "parent-block dim {pblock_dim} does not divide volume dim {volume_dim}"
            ));
        }
        Ok(Self {
            volume_dim,
            pblock_dim,
            variant: EngineVariant::LineMerge,
        })
    }

    #[must_use]
    pub const fn with_variant(mut self, variant: EngineVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Number of parent blocks along each axis.
    #[must_use]
    pub fn num_pblocks(self) -> Vec3 {
        self.volume_dim / self.pblock_dim
    }

    /// Linear strides for one parent block's local voxel index array.
    #[must_use]
    pub fn strides(self) -> Strides {
        Strides::for_dim(self.pblock_dim)
    }

    /// Total voxels in one parent block.
    #[must_use]
    pub fn pblock_volume(self) -> u64 {
        self.pblock_dim.volume()
    }
}
