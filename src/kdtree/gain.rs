// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Shannon information-gain search used to pick the best axis-aligned split
//! of a sub-volume.
//!
//! Grounded on `ParentBlock::buildSliceTallys`, `::ChooseSplit` and
//! `::findGain` in `examples/original_source/BlockCompression/ParentBlock.cpp`.

use super::{ParentBlockKdTree, Split, SplitResult};
use crate::geometry::{Axis, Vec3};

/// Per-slice tag-count tallies along each of the three axes for one
/// sub-volume: `slices_x[i][t]` is how many voxels at local x-coordinate `i`
/// (within the sub-volume) carry local tag `t`, and likewise for y/z.
pub(super) fn build_slice_tallies(
    pb: &ParentBlockKdTree,
    origin: Vec3,
    size: Vec3,
    num_tags: usize,
) -> (Vec<Vec<u32>>, Vec<Vec<u32>>, Vec<Vec<u32>>) {
    let mut slices_x = vec![vec![0u32; num_tags]; size.x as usize];
    let mut slices_y = vec![vec![0u32; num_tags]; size.y as usize];
    let mut slices_z = vec![vec![0u32; num_tags]; size.z as usize];

    let mut start_index = pb.strides.linearize(origin);
    for z in 0..size.z {
        let mut lookup_index = start_index;
        for y in 0..size.y {
            for x in 0..size.x {
                let tag = pb.voxels[(lookup_index + u64::from(x)) as usize] as usize;
                slices_x[x as usize][tag] += 1;
                slices_y[y as usize][tag] += 1;
                slices_z[z as usize][tag] += 1;
            }
            lookup_index += pb.strides.y;
        }
        start_index += pb.strides.z;
    }

    (slices_x, slices_y, slices_z)
}

/// Sums a set of per-slice tallies into a single tally covering the whole
/// sub-volume. All three axes' tallies sum to the same total, so callers
/// only need to do this once (on `slices_x`).
pub(super) fn sum_slices(slices: &[Vec<u32>], num_tags: usize) -> Vec<u32> {
    let mut total = vec![0u32; num_tags];
    for slice in slices {
        for (t, &c) in slice.iter().enumerate() {
            total[t] += c;
        }
    }
    total
}

fn vector_total(v: &[u32]) -> u32 {
    v.iter().sum()
}

/// How homogeneous a tally is: 0.0 when every voxel shares one tag, up to
/// 1.0 at an even 50:50 split between two tags.
pub(super) fn information_content(counters: &[u32]) -> f32 {
    let total = vector_total(counters);
    let inv_total = 1.0f32 / total as f32;
    let mut info = 0.0f32;

    for &count in counters {
        if count == 0 {
            continue;
        }
        if count == total {
            return 0.0;
        }
        let proportion = count as f32 * inv_total;
        info -= proportion * proportion.log2();
    }

    info
}

/// Information gain from splitting `total_info`'s sub-volume into `left` and
/// `right`, plus whether either half is already homogeneous.
fn find_gain(left: &[u32], right: &[u32], total_info: f32) -> (f32, bool, bool) {
    let volume_left = vector_total(left);
    let volume_right = vector_total(right);
    let inv_total_volume = 1.0f32 / (volume_left + volume_right) as f32;

    let p_lower = volume_left as f32 * inv_total_volume;
    let p_higher = volume_right as f32 * inv_total_volume;

    let info_lower = information_content(left);
    let info_higher = information_content(right);

    let combined_info = p_lower * info_lower + p_higher * info_higher;
    let gain = total_info - combined_info;

    (gain, info_lower == 0.0, info_higher == 0.0)
}

/// Scans every split point along `axis`, updating the running best-gain
/// split in place. Returns `Some` the moment a homogeneous half is found (a
/// short-circuit: once we can print part of the volume outright, nothing
/// further along this axis can beat that), `None` to let the caller move on
/// to the next axis.
#[allow(clippy::too_many_arguments)]
pub(super) fn scan_axis(
    axis: Axis,
    slices: &[Vec<u32>],
    num_tags: usize,
    total_info: f32,
    best_gain: &mut f32,
    best_split: &mut Split,
    best_left_same: &mut bool,
    best_right_same: &mut bool,
) -> Option<SplitResult> {
    let n = slices.len();
    if n <= 1 {
        return None;
    }

    let mut left = vec![0u32; num_tags];
    let mut right = sum_slices(slices, num_tags);

    let mut pending_homogeneous: Option<(bool, bool)> = None;
    let mut found = false;

    for i in 0..n - 1 {
        for t in 0..num_tags {
            left[t] += slices[i][t];
            right[t] -= slices[i][t];
        }

        let (gain, left_same, right_same) = find_gain(&left, &right, total_info);

        if left_same {
            pending_homogeneous = Some((left_same, right_same));
            found = true;
        } else if found {
            let (pl, pr) = pending_homogeneous.expect("found implies pending_homogeneous is set");
            return Some(SplitResult {
                split: Split { axis, point: i as u16 },
                print_left: pl,
                print_right: pr,
            });
        }

        if right_same {
            return Some(SplitResult {
                split: Split { axis, point: (i + 1) as u16 },
                print_left: left_same,
                print_right: right_same,
            });
        }

        if gain > *best_gain {
            *best_gain = gain;
            *best_split = Split { axis, point: (i + 1) as u16 };
            *best_left_same = left_same;
            *best_right_same = right_same;
        }
    }

    if found {
        return Some(SplitResult {
            split: Split { axis, point: (n - 1) as u16 },
            print_left: true,
            print_right: false,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn information_content_of_homogeneous_tally_is_zero() {
        assert_eq!(information_content(&[5, 0, 0]), 0.0);
    }

    #[test]
    fn information_content_of_even_split_is_one() {
        let info = information_content(&[4, 4]);
        assert!((info - 1.0).abs() < 1e-6);
    }

    #[test]
    fn find_gain_is_zero_when_split_mirrors_whole() {
        let total_info = information_content(&[2, 2]);
        let (gain, _, _) = find_gain(&[1, 1], &[1, 1], total_info);
        assert!(gain.abs() < 1e-6);
    }

    #[test]
    fn find_gain_is_positive_when_split_separates_tags() {
        let total_info = information_content(&[2, 2]);
        let (gain, left_same, right_same) = find_gain(&[2, 0], &[0, 2], total_info);
        assert!(gain > 0.0);
        assert!(left_same);
        assert!(right_same);
    }
}
