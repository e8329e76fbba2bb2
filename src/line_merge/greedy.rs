// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Greedy same-tag merge of adjacent blocks along one axis.
//!
//! Grounded on `spec.md` §4.1.1. Y-merging runs before Z-merging so Y can
//! assume every input block still has `size.y == 1` (fresh from
//! line-insertion), and Z-merging can assume Y has already collapsed.

use super::{ParentBlockLineMerge, NULL_INDEX};
use crate::geometry::Axis;

/// Merges adjacent same-tag blocks along `axis` in block-creation order.
///
/// For each live block `b`, the block directly "below" it along `axis` is
/// found via `index_array[b.index - strides[axis]]`. Because that lookup
/// only succeeds when the position is exactly some other block's recorded
/// origin, the two blocks' origin on the merge axis's leading edge is
/// already guaranteed equal by construction — only the extents on the other
/// axes need checking.
pub(crate) fn merge_axis(pb: &mut ParentBlockLineMerge, axis: Axis) {
    let stride = pb.strides.get(axis);
    let len = pb.blocks.len();

    for i in 0..len {
        if !pb.blocks[i].valid {
            continue;
        }
        let b = pb.blocks[i];
        if u64::from(b.sub_volume.origin.get(axis)) == 0 {
            continue;
        }
        let below_lin = u64::from(b.index) - stride;
        let below_idx = pb.index_array[below_lin as usize];
        if below_idx == NULL_INDEX {
            continue;
        }
        let below_idx = below_idx as usize;
        let below = pb.blocks[below_idx];
        if !below.valid || below.id != b.id {
            continue;
        }

        let x_matches = below.sub_volume.origin.x == b.sub_volume.origin.x
            && below.sub_volume.size.x == b.sub_volume.size.x;
        let matches = match axis {
            Axis::Y => x_matches,
            Axis::Z => {
                x_matches
                    && below.sub_volume.origin.y == b.sub_volume.origin.y
                    && below.sub_volume.size.y == b.sub_volume.size.y
            }
            Axis::X => false,
        };
        if !matches {
            continue;
        }

        let grown = below.sub_volume.size.get(axis) + b.sub_volume.size.get(axis);
        pb.blocks[below_idx].sub_volume.size =
            pb.blocks[below_idx].sub_volume.size.with(axis, grown);
        pb.blocks[i].valid = false;
        pb.index_array[u64::from(b.index) as usize] = below_idx as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VolumeConfig;
    use crate::engine::LineMergeInput;
    use crate::geometry::Vec3;

    #[test]
    fn merges_two_stacked_rows_along_y() {
        let dim = Vec3::new(2, 2, 1);
        let cfg = VolumeConfig::new(dim, dim).unwrap();
        let mut pb = ParentBlockLineMerge::new(cfg, Vec3::ZERO);
        pb.insert_block_line(Vec3::new(0, 0, 0), 2, 5).unwrap();
        pb.insert_block_line(Vec3::new(0, 1, 0), 2, 5).unwrap();

        merge_axis(&mut pb, Axis::Y);

        let live: Vec<_> = pb.blocks.iter().filter(|b| b.valid).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].sub_volume.size, Vec3::new(2, 2, 1));
    }

    #[test]
    fn does_not_merge_mismatched_x_extent() {
        let dim = Vec3::new(4, 2, 1);
        let cfg = VolumeConfig::new(dim, dim).unwrap();
        let mut pb = ParentBlockLineMerge::new(cfg, Vec3::ZERO);
        pb.insert_block_line(Vec3::new(0, 0, 0), 4, 1).unwrap();
        pb.insert_block_line(Vec3::new(0, 1, 0), 2, 1).unwrap();
        pb.insert_block_line(Vec3::new(2, 1, 0), 2, 1).unwrap();

        merge_axis(&mut pb, Axis::Y);

        let live: Vec<_> = pb.blocks.iter().filter(|b| b.valid).collect();
        assert_eq!(live.len(), 3);
    }

    #[test]
    fn does_not_merge_different_tags() {
        let dim = Vec3::new(2, 2, 1);
        let cfg = VolumeConfig::new(dim, dim).unwrap();
        let mut pb = ParentBlockLineMerge::new(cfg, Vec3::ZERO);
        pb.insert_block_line(Vec3::new(0, 0, 0), 2, 1).unwrap();
        pb.insert_block_line(Vec3::new(0, 1, 0), 2, 2).unwrap();

        merge_axis(&mut pb, Axis::Y);

        let live: Vec<_> = pb.blocks.iter().filter(|b| b.valid).collect();
        assert_eq!(live.len(), 2);
    }
}
