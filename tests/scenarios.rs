//! End-to-end scenarios driving the full CSV-in, CSV-out pipeline
//! (`tokenizer` -> `plane` -> engine -> `sink`) for both engine variants,
//! matching the concrete scenarios in `spec.md` §8.

use blockvol::{EngineVariant, PlaneOrchestrator, VecSink};
use std::io::Cursor;

fn run(csv: &str, variant: EngineVariant) -> Vec<(u16, u16, u16, u16, u16, u16, String)> {
    let mut orchestrator =
        PlaneOrchestrator::new(Cursor::new(csv.as_bytes().to_vec()), variant).unwrap();
    let mut sink = VecSink::default();
    orchestrator.run(&mut sink).unwrap();
    sink.blocks
        .into_iter()
        .map(|(b, tag)| {
            (
                b.origin.x, b.origin.y, b.origin.z, b.size.x, b.size.y, b.size.z, tag,
            )
        })
        .collect()
}

/// Checks Coverage, Bounds, and Fidelity against a `(x, y, z) -> tag` oracle,
/// without assuming any particular box layout.
fn assert_covers(
    blocks: &[(u16, u16, u16, u16, u16, u16, String)],
    dim: (u16, u16, u16),
    tag_of: impl Fn(u16, u16, u16) -> &'static str,
) {
    let mut covered = vec![false; usize::from(dim.0) * usize::from(dim.1) * usize::from(dim.2)];
    for &(ox, oy, oz, sx, sy, sz, ref tag) in blocks {
        assert!(ox + sx <= dim.0 && oy + sy <= dim.1 && oz + sz <= dim.2, "block out of bounds");
        for z in oz..oz + sz {
            for y in oy..oy + sy {
                for x in ox..ox + sx {
                    let idx = usize::from(z) * usize::from(dim.1) * usize::from(dim.0)
                        + usize::from(y) * usize::from(dim.0)
                        + usize::from(x);
                    assert!(!covered[idx], "voxel ({x},{y},{z}) covered twice");
                    covered[idx] = true;
                    assert_eq!(tag_of(x, y, z), tag, "wrong tag at ({x},{y},{z})");
                }
            }
        }
    }
    assert!(covered.iter().all(|&c| c), "not every voxel was covered");
}

fn csv_from(dim: (u16, u16, u16), pblock: (u16, u16, u16), tag_of: impl Fn(u16, u16, u16) -> &'static str) -> String {
    let mut out = format!(
        "V,{},{},{},{},{},{}\n",
        dim.0, dim.1, dim.2, pblock.0, pblock.1, pblock.2
    );
    for z in 0..dim.2 {
        for y in 0..dim.1 {
            for x in 0..dim.0 {
                out += &format!("{x},{y},{z},'{}'\n", tag_of(x, y, z));
            }
        }
    }
    out
}

#[test]
fn scenario_1_homogeneous_volume_collapses_to_one_box() {
    let csv = csv_from((2, 2, 2), (2, 2, 2), |_, _, _| "A");
    for variant in [EngineVariant::LineMerge, EngineVariant::KdTree] {
        let blocks = run(&csv, variant);
        assert_eq!(blocks, vec![(0, 0, 0, 2, 2, 2, "A".to_owned())], "{variant}");
    }
}

#[test]
fn scenario_2_two_z_slabs() {
    let csv = csv_from((2, 2, 2), (2, 2, 2), |_, _, z| if z == 0 { "A" } else { "B" });
    for variant in [EngineVariant::LineMerge, EngineVariant::KdTree] {
        let mut blocks = run(&csv, variant);
        blocks.sort();
        let mut expected = vec![
            (0, 0, 0, 2, 2, 1, "A".to_owned()),
            (0, 0, 1, 2, 2, 1, "B".to_owned()),
        ];
        expected.sort();
        assert_eq!(blocks, expected, "{variant}");
    }
}

#[test]
fn scenario_3_line_merge_along_x() {
    let csv = csv_from((4, 1, 1), (4, 1, 1), |x, _, _| if x < 2 { "A" } else { "B" });
    let mut blocks = run(&csv, EngineVariant::LineMerge);
    blocks.sort();
    let mut expected = vec![
        (0, 0, 0, 2, 1, 1, "A".to_owned()),
        (2, 0, 0, 2, 1, 1, "B".to_owned()),
    ];
    expected.sort();
    assert_eq!(blocks, expected);
}

#[test]
fn scenario_4_vertical_stripes() {
    let tag_of = |x: u16, _: u16, _: u16| -> &'static str {
        if x == 1 {
            "B"
        } else {
            "A"
        }
    };
    let csv = csv_from((3, 3, 1), (3, 3, 1), tag_of);
    for variant in [EngineVariant::LineMerge, EngineVariant::KdTree] {
        let blocks = run(&csv, variant);
        assert_covers(&blocks, (3, 3, 1), tag_of);
    }
}

#[test]
fn scenario_5_shelf_in_the_middle_row() {
    let tag_of = |x: u16, y: u16, _: u16| -> &'static str {
        if y == 1 && (x == 1 || x == 2) {
            "B"
        } else {
            "A"
        }
    };
    let csv = csv_from((4, 3, 1), (4, 3, 1), tag_of);
    for variant in [EngineVariant::LineMerge, EngineVariant::KdTree] {
        let blocks = run(&csv, variant);
        assert_covers(&blocks, (4, 3, 1), tag_of);
    }
}

#[test]
fn scenario_6_patch_in_top_slab() {
    let tag_of = |x: u16, y: u16, z: u16| -> &'static str {
        if z == 1 && x < 2 && y < 2 {
            "B"
        } else {
            "A"
        }
    };
    let csv = csv_from((4, 4, 2), (4, 4, 2), tag_of);
    for variant in [EngineVariant::LineMerge, EngineVariant::KdTree] {
        let blocks = run(&csv, variant);
        assert_covers(&blocks, (4, 4, 2), tag_of);
    }
}

#[test]
fn single_voxel_volume() {
    let csv = csv_from((1, 1, 1), (1, 1, 1), |_, _, _| "Granite");
    for variant in [EngineVariant::LineMerge, EngineVariant::KdTree] {
        let blocks = run(&csv, variant);
        assert_eq!(blocks, vec![(0, 0, 0, 1, 1, 1, "Granite".to_owned())], "{variant}");
    }
}

#[test]
fn no_more_planes_after_a_full_run() {
    let csv = csv_from((2, 2, 1), (2, 2, 1), |_, _, _| "A");
    let mut orchestrator =
        PlaneOrchestrator::new(Cursor::new(csv.as_bytes().to_vec()), EngineVariant::LineMerge)
            .unwrap();
    orchestrator.run(&mut VecSink::default()).unwrap();
    assert!(matches!(orchestrator.can_read(), Ok(false)));
}
