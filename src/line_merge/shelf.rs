// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Shelf compression: a second pass that catches same-tag neighbours the
//! greedy merge missed because one side's footprint protrudes past the
//! other's by a single "shelf".
//!
//! Grounded on `spec.md` §4.1.2. No `original_source` file for this variant
//! survived retrieval, so this is re-derived from the Coverage and Fidelity
//! invariants rather than transliterated, per the spec's own Open Question
//! guidance. Two sub-strategies are tried in order, per `spec.md` §4.1.2 step
//! 4:
//!
//! 1. **Continue then shelf out** (`try_continue_then_shelf_out`): look one
//!    block further down the stack; if it already spans exactly the
//!    non-shelf part of `below`'s footprint, grow it through both `below`'s
//!    matching portion and `top` in one step, leaving the protruding sliver
//!    of `below` behind as its own (now-shrunk) block.
//! 2. **Dissolve the shelf** (the rest of `try_shelf_merge`): carve the
//!    protruding part of `below` out into its own block and recurse on it,
//!    along whichever of the two non-merge axes doesn't re-examine the edge
//!    that produced the shelf in the first place (`dissolve_recurse_axis`).
//!
//! If neither succeeds the merge is rejected and `top`/`below` are left as
//! separate blocks. Both sub-strategies are still heuristics — `spec.md` §4's
//! Non-goal that "global optimality ... is not attempted" means the box count
//! they settle on isn't claimed to be minimal, not that either step is
//! skippable.

use super::{Block, ParentBlockLineMerge, NULL_INDEX};
use crate::geometry::{Axis, SubVolume};

/// Recursion is bounded by roughly the number of stacked shelves along the
/// merge axis; this is far above anything a real parent block would produce
/// and exists only to guarantee termination.
const MAX_SHELF_DEPTH: u32 = 64;

pub(crate) fn compress(pb: &mut ParentBlockLineMerge) {
    let snapshot_len = pb.blocks.len();
    for i in 0..snapshot_len {
        if !pb.blocks[i].valid {
            continue;
        }
        if try_shelf_merge(pb, i, Axis::Y, 0) {
            continue;
        }
        try_shelf_merge(pb, i, Axis::Z, 0);
    }
}

/// Edge identifier: one of the four edges compared when checking alignment
/// between `top` and the block directly beneath it — `(axis, is_max)` where
/// `axis` ranges over `merge_axis.others()` and `is_max` selects the leading
/// (`false`) or trailing (`true`) face.
type Edge = (Axis, bool);

fn block_below_face(pb: &ParentBlockLineMerge, sv: SubVolume, axis: Axis) -> Option<u32> {
    let coord = sv.origin.get(axis);
    if coord == 0 {
        return None;
    }
    let probe = sv.origin.with(axis, coord - 1);
    let lin = pb.strides.linearize(probe) as usize;
    let idx = pb.index_array[lin];
    if idx == NULL_INDEX {
        None
    } else {
        Some(idx)
    }
}

/// Returns `(count_of_matching_edges, last_mismatched_edge)` over the four
/// edges on `axis.others()`.
fn edge_match(top: SubVolume, below: SubVolume, axis: Axis) -> (u8, Option<Edge>) {
    let [a, b] = axis.others();
    let checks = [(a, false), (a, true), (b, false), (b, true)];
    let mut count = 0u8;
    let mut mismatch = None;
    for (ax, is_max) in checks {
        let t = if is_max { top.end().get(ax) } else { top.origin.get(ax) };
        let v = if is_max { below.end().get(ax) } else { below.origin.get(ax) };
        if t == v {
            count += 1;
        } else {
            mismatch = Some((ax, is_max));
        }
    }
    (count, mismatch)
}

/// Splits `below` into the part that aligns with `top` (`kept`) and the
/// protruding remainder (`shelf`), along the single mismatched edge.
/// Returns `None` if the mismatch runs the "wrong way" (below is smaller
/// than top on that edge, which is not a shelf but a gap some other block
/// must own — not this pass's concern).
fn split_shelf(below: SubVolume, top: SubVolume, edge: Edge) -> Option<(SubVolume, SubVolume)> {
    let (ax, is_max) = edge;
    let mut kept = below;
    let mut shelf = below;
    if is_max {
        if below.end().get(ax) <= top.end().get(ax) {
            return None;
        }
        let split = top.end().get(ax);
        kept.size = kept.size.with(ax, split - below.origin.get(ax));
        shelf.origin = shelf.origin.with(ax, split);
        shelf.size = shelf.size.with(ax, below.end().get(ax) - split);
    } else {
        if below.origin.get(ax) >= top.origin.get(ax) {
            return None;
        }
        let split = top.origin.get(ax);
        shelf.size = shelf.size.with(ax, split - below.origin.get(ax));
        kept.origin = kept.origin.with(ax, split);
        kept.size = kept.size.with(ax, below.end().get(ax) - split);
    }
    Some((kept, shelf))
}

fn merge_up(pb: &mut ParentBlockLineMerge, below_idx: usize, top_idx: usize, axis: Axis) {
    let top_sv = pb.blocks[top_idx].sub_volume;
    pb.repaint_region(top_sv, below_idx as u32);
    let grown = pb.blocks[below_idx].sub_volume.size.get(axis) + top_sv.size.get(axis);
    pb.blocks[below_idx].sub_volume.size =
        pb.blocks[below_idx].sub_volume.size.with(axis, grown);
    pb.blocks[top_idx].valid = false;
}

/// Shelf-merge recursion only ever continues along Y or Z (X is the
/// line-merge run direction, never a shelf axis), and only into the axis
/// that is *not* `merge_axis`: recursing back into the axis that just ran
/// would re-examine the same boundary and back-track into the caller. A
/// second restriction narrows it further: if the edge that produced the
/// shelf already runs along that other axis, the shelf has nothing left to
/// offer there either, so no further recursion is attempted at all.
fn dissolve_recurse_axis(merge_axis: Axis, shelf_edge_axis: Axis) -> Option<Axis> {
    let other = match merge_axis {
        Axis::Y => Axis::Z,
        Axis::Z => Axis::Y,
        Axis::X => unreachable!("shelf merges only ever run along Y or Z"),
    };
    if shelf_edge_axis == other {
        None
    } else {
        Some(other)
    }
}

/// Sub-strategy 1: look one block further down the stack from `below`. If
/// that block (`below2`) already spans exactly `below`'s non-shelf footprint,
/// grow it through `below`'s matching portion and through `top` in a single
/// step, and shrink `below` itself down to just the protruding shelf.
///
/// Returns `false` (no mutation) if `below2` doesn't exist, isn't the same
/// tag, or doesn't already match the non-shelf footprint exactly — in which
/// case the caller falls back to dissolving the shelf instead.
fn try_continue_then_shelf_out(
    pb: &mut ParentBlockLineMerge,
    top_idx: usize,
    below_idx: usize,
    axis: Axis,
    edge: Edge,
) -> bool {
    let top = pb.blocks[top_idx];
    let below = pb.blocks[below_idx];

    let Some((kept, shelf_sv)) = split_shelf(below.sub_volume, top.sub_volume, edge) else {
        return false;
    };

    let Some(below2_idx) = block_below_face(pb, below.sub_volume, axis) else {
        return false;
    };
    let below2_idx = below2_idx as usize;
    if below2_idx == below_idx || below2_idx == top_idx {
        return false;
    }
    let below2 = pb.blocks[below2_idx];
    if !below2.valid || below2.id != top.id {
        return false;
    }

    let (count, _) = edge_match(kept, below2.sub_volume, axis);
    if count != 4 {
        return false;
    }

    let grown = top.sub_volume.end().get(axis) - below2.sub_volume.origin.get(axis);
    pb.repaint_region(top.sub_volume, below2_idx as u32);
    pb.repaint_region(kept, below2_idx as u32);
    pb.blocks[below2_idx].sub_volume.size =
        pb.blocks[below2_idx].sub_volume.size.with(axis, grown);

    pb.blocks[top_idx].valid = false;

    pb.blocks[below_idx].sub_volume = shelf_sv;
    pb.blocks[below_idx].index = pb.strides.linearize(shelf_sv.origin) as u32;
    pb.repaint_region(shelf_sv, below_idx as u32);

    true
}

fn try_shelf_merge(pb: &mut ParentBlockLineMerge, top_idx: usize, axis: Axis, depth: u32) -> bool {
    if depth > MAX_SHELF_DEPTH {
        return false;
    }
    let top = pb.blocks[top_idx];
    if !top.valid {
        return false;
    }

    let Some(below_idx) = block_below_face(pb, top.sub_volume, axis) else {
        return false;
    };
    let below_idx = below_idx as usize;
    if below_idx == top_idx {
        return false;
    }
    let below = pb.blocks[below_idx];
    if !below.valid || below.id != top.id {
        return false;
    }

    let (count, mismatch) = edge_match(top.sub_volume, below.sub_volume, axis);
    if count == 4 {
        merge_up(pb, below_idx, top_idx, axis);
        return true;
    }
    if count < 3 {
        return false;
    }
    if below.sub_volume.origin.get(axis) == 0 {
        return false;
    }
    let Some(edge) = mismatch else {
        return false;
    };

    // Sub-strategy 1: continue then shelf out, tried first per the spec's
    // "tried in order".
    if depth < MAX_SHELF_DEPTH
        && try_continue_then_shelf_out(pb, top_idx, below_idx, axis, edge)
    {
        return true;
    }

    // Sub-strategy 2: dissolve the shelf.
    let Some((kept, shelf_sv)) = split_shelf(below.sub_volume, top.sub_volume, edge) else {
        return false;
    };

    pb.blocks[below_idx].sub_volume = kept;
    pb.blocks[below_idx].index = pb.strides.linearize(kept.origin) as u32;

    let shelf_idx = pb.blocks.len();
    pb.blocks.push(Block {
        valid: true,
        sub_volume: shelf_sv,
        id: below.id,
        index: pb.strides.linearize(shelf_sv.origin) as u32,
    });

    pb.repaint_region(kept, below_idx as u32);
    pb.repaint_region(shelf_sv, shelf_idx as u32);

    merge_up(pb, below_idx, top_idx, axis);

    if depth < MAX_SHELF_DEPTH {
        if let Some(recurse_axis) = dissolve_recurse_axis(axis, edge.0) {
            try_shelf_merge(pb, shelf_idx, recurse_axis, depth + 1);
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VolumeConfig;
    use crate::engine::LineMergeInput;
    use crate::geometry::Vec3;
    use crate::line_merge::greedy;

    #[test]
    fn merges_fully_aligned_blocks_missed_by_greedy_order() {
        // Two identical-footprint blocks stacked along Z, inserted so greedy
        // Y/Z merging alone (operating only on size-1 rows) wouldn't already
        // have produced one box before refresh+shelf runs.
        let dim = Vec3::new(2, 1, 2);
        let cfg = VolumeConfig::new(dim, dim).unwrap();
        let mut pb = ParentBlockLineMerge::new(cfg, Vec3::ZERO);
        pb.insert_block_line(Vec3::new(0, 0, 0), 2, 3).unwrap();
        pb.insert_block_line(Vec3::new(0, 0, 1), 2, 3).unwrap();

        greedy::merge_axis(&mut pb, Axis::Y);
        greedy::merge_axis(&mut pb, Axis::Z);
        pb.refresh_block_indices();
        compress(&mut pb);

        let live: Vec<_> = pb.blocks.iter().filter(|b| b.valid).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].sub_volume, SubVolume::new(Vec3::ZERO, dim));
    }

    #[test]
    fn dissolves_single_shelf_and_preserves_volume() {
        let dim = Vec3::new(4, 2, 1);
        let cfg = VolumeConfig::new(dim, dim).unwrap();
        let mut pb = ParentBlockLineMerge::new(cfg, Vec3::ZERO);
        // Row y=0: one tag spanning the full row, full width.
        pb.insert_block_line(Vec3::new(0, 0, 0), 4, 9).unwrap();
        // Row y=1: same tag, but narrower (x in [0,3)) -- a shelf at x=3.
        pb.insert_block_line(Vec3::new(0, 1, 0), 3, 9).unwrap();
        pb.insert_block_line(Vec3::new(3, 1, 0), 1, 7).unwrap();

        greedy::merge_axis(&mut pb, Axis::Y);
        greedy::merge_axis(&mut pb, Axis::Z);
        pb.refresh_block_indices();
        compress(&mut pb);

        let live: Vec<_> = pb.blocks.iter().filter(|b| b.valid).collect();
        let total: u64 = live.iter().map(|b| b.sub_volume.size.volume()).sum();
        assert_eq!(total, dim.volume());

        // No two live blocks may overlap.
        let mut seen = vec![false; dim.volume() as usize];
        let strides = cfg.strides();
        for b in &live {
            let end = b.sub_volume.end();
            for z in b.sub_volume.origin.z..end.z {
                for y in b.sub_volume.origin.y..end.y {
                    for x in b.sub_volume.origin.x..end.x {
                        let lin = strides.linearize(Vec3::new(x, y, z)) as usize;
                        assert!(!seen[lin], "overlap at {:?}", (x, y, z));
                        seen[lin] = true;
                    }
                }
            }
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn dissolve_recursion_axis_avoids_backtracking() {
        // Recursing back into the merge axis itself is never allowed.
        assert_eq!(dissolve_recurse_axis(Axis::Y, Axis::X), Some(Axis::Z));
        assert_eq!(dissolve_recurse_axis(Axis::Z, Axis::X), Some(Axis::Y));
        // Nor is recursing into the axis the shelf's own edge already lies
        // along -- that axis has nothing left for the shelf to offer.
        assert_eq!(dissolve_recurse_axis(Axis::Y, Axis::Z), None);
        assert_eq!(dissolve_recurse_axis(Axis::Z, Axis::Y), None);
    }

    #[test]
    fn continue_then_shelf_out_grows_through_an_aligned_lower_block() {
        // Three stacked rows along Y, x in [0,3), z in [0,1):
        //   y=2 (top):    x in [0,2)            id 5   | x in [2,3) id 9 (filler)
        //   y=1 (below):  x in [0,3)            id 5   (wider -- protrudes past top)
        //   y=0 (below2): x in [0,2)            id 5   | x in [2,3) id 9 (filler)
        //
        // `below` protrudes past `top` on the x-max edge by exactly the
        // width of the shelf at x in [2,3). `below2` already matches `top`'s
        // narrower footprint exactly, so continue-then-shelf-out should grow
        // `below2` straight through `below`'s matching portion and `top`,
        // leaving `below` shrunk down to just the shelf sliver at y=1,
        // x in [2,3).
        let dim = Vec3::new(3, 3, 1);
        let cfg = VolumeConfig::new(dim, dim).unwrap();
        let mut pb = ParentBlockLineMerge::new(cfg, Vec3::ZERO);
        pb.insert_block_line(Vec3::new(0, 0, 0), 2, 5).unwrap();
        pb.insert_block_line(Vec3::new(2, 0, 0), 1, 9).unwrap();
        pb.insert_block_line(Vec3::new(0, 1, 0), 3, 5).unwrap();
        pb.insert_block_line(Vec3::new(0, 2, 0), 2, 5).unwrap();
        pb.insert_block_line(Vec3::new(2, 2, 0), 1, 9).unwrap();

        greedy::merge_axis(&mut pb, Axis::Y);
        greedy::merge_axis(&mut pb, Axis::Z);
        pb.refresh_block_indices();
        compress(&mut pb);

        let live: Vec<_> = pb.blocks.iter().filter(|b| b.valid).collect();
        let total: u64 = live.iter().map(|b| b.sub_volume.size.volume()).sum();
        assert_eq!(total, dim.volume());

        let grown = live
            .iter()
            .find(|b| b.id == 5 && b.sub_volume.size.volume() == 6)
            .expect("expected the y=0 block to have grown through the shelf and top");
        assert_eq!(
            grown.sub_volume,
            SubVolume::new(Vec3::new(0, 0, 0), Vec3::new(2, 3, 1))
        );

        let shelf = live
            .iter()
            .find(|b| b.id == 5 && b.sub_volume.size.volume() == 1)
            .expect("expected the shelf sliver to remain as its own block");
        assert_eq!(
            shelf.sub_volume,
            SubVolume::new(Vec3::new(2, 1, 0), Vec3::new(1, 1, 1))
        );
    }
}
