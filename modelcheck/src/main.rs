//! Generates random tagged volumes and checks both compression engines
//! against the Coverage, Fidelity, and Bounds invariants: every emitted box
//! stays within the volume, no two boxes overlap, every voxel is covered by
//! exactly one box, and that box's tag matches the voxel's original tag.
//!
//! Grounded on `model/src/main.rs`'s random-operation-vs-reference-model
//! shape, adapted from "random KV ops vs a `BTreeMap`" to "random tagged
//! volume vs a brute-force voxel grid".
//!
//! Local-id injectivity and gain monotonicity are covered by the unit tests
//! colocated with `tag::LocalTagTable` and `kdtree::gain` instead of here,
//! since both are properties of a single function call rather than of a
//! whole compression run.

use blockvol::{EngineVariant, PlaneOrchestrator, VecSink};
use clap::Parser;
use rand::Rng;
use std::io::Cursor;

#[derive(Parser)]
struct Args {
    /// Number of random volumes to check. Runs forever if omitted.
    #[arg(long)]
    iterations: Option<usize>,

    /// Print each generated volume's dimensions as it's checked.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

const TAG_ALPHABET: [&str; 4] = ["A", "B", "C", "D"];

/// A randomly generated tagged volume, kept around so a failing check can
/// print the exact input that broke an invariant.
struct Volume {
    dim: (u16, u16, u16),
    pblock: (u16, u16, u16),
    tags: Vec<u8>,
}

impl Volume {
    fn tag_at(&self, x: u16, y: u16, z: u16) -> &'static str {
        let idx = (u64::from(z) * u64::from(self.dim.1) * u64::from(self.dim.0)
            + u64::from(y) * u64::from(self.dim.0)
            + u64::from(x)) as usize;
        TAG_ALPHABET[self.tags[idx] as usize]
    }

    fn to_csv(&self) -> Vec<u8> {
        let mut out = format!(
            "V,{},{},{},{},{},{}\n",
            self.dim.0, self.dim.1, self.dim.2, self.pblock.0, self.pblock.1, self.pblock.2
        );
        for z in 0..self.dim.2 {
            for y in 0..self.dim.1 {
                for x in 0..self.dim.0 {
                    out += &format!("{x},{y},{z},'{}'\n", self.tag_at(x, y, z));
                }
            }
        }
        out.into_bytes()
    }
}

fn random_volume(rng: &mut impl Rng) -> Volume {
    let pblock = (
        rng.random_range(1..=3u16),
        rng.random_range(1..=3u16),
        rng.random_range(1..=3u16),
    );
    let num_pblocks = (
        rng.random_range(1..=3u16),
        rng.random_range(1..=3u16),
        rng.random_range(1..=2u16),
    );
    let dim = (
        pblock.0 * num_pblocks.0,
        pblock.1 * num_pblocks.1,
        pblock.2 * num_pblocks.2,
    );
    let num_tags = rng.random_range(1..=TAG_ALPHABET.len());
    let voxel_count = usize::from(dim.0) * usize::from(dim.1) * usize::from(dim.2);
    let tags = (0..voxel_count)
        .map(|_| rng.random_range(0..num_tags) as u8)
        .collect();

    Volume { dim, pblock, tags }
}

/// Checks Coverage (every voxel covered exactly once), Bounds (every box
/// within the volume), and Fidelity (every box's tag matches every voxel it
/// covers) for one compressed run.
fn check_invariants(volume: &Volume, sink: &VecSink, variant: EngineVariant) {
    let voxel_count = usize::from(volume.dim.0) * usize::from(volume.dim.1) * usize::from(volume.dim.2);
    let mut covered = vec![false; voxel_count];

    for (block, tag_name) in &sink.blocks {
        let end = block.origin + block.size;
        assert!(
            end.x <= volume.dim.0 && end.y <= volume.dim.1 && end.z <= volume.dim.2,
            "{variant}: block {block:?} exceeds volume bounds {:?}",
            volume.dim
        );

        for z in block.origin.z..end.z {
            for y in block.origin.y..end.y {
                for x in block.origin.x..end.x {
                    let idx = (u64::from(z) * u64::from(volume.dim.1) * u64::from(volume.dim.0)
                        + u64::from(y) * u64::from(volume.dim.0)
                        + u64::from(x)) as usize;
                    assert!(
                        !covered[idx],
                        "{variant}: voxel ({x},{y},{z}) covered by more than one block"
                    );
                    covered[idx] = true;

                    let expected = volume.tag_at(x, y, z);
                    assert_eq!(
                        expected, tag_name,
                        "{variant}: voxel ({x},{y},{z}) tagged '{tag_name}' but volume has '{expected}'"
                    );
                }
            }
        }
    }

    assert!(
        covered.iter().all(|&c| c),
        "{variant}: not every voxel was covered by some block"
    );
}

fn check_volume(volume: &Volume) {
    for variant in [EngineVariant::LineMerge, EngineVariant::KdTree] {
        let csv = volume.to_csv();
        let mut orchestrator = PlaneOrchestrator::new(Cursor::new(csv), variant)
            .unwrap_or_else(|e| panic!("{variant}: failed to build orchestrator: {e}"));
        let mut sink = VecSink::default();
        orchestrator
            .run(&mut sink)
            .unwrap_or_else(|e| panic!("{variant}: run failed: {e}"));
        check_invariants(volume, &sink, variant);
    }
}

fn main() {
    let args = Args::parse();
    let mut rng = rand::rng();

    let mut i = 0usize;
    loop {
        if let Some(limit) = args.iterations {
            if i >= limit {
                break;
            }
        }

        let volume = random_volume(&mut rng);
        if args.verbose {
            eprintln!(
                "[{i}] volume {:?} pblock {:?}",
                volume.dim, volume.pblock
            );
        }
        check_volume(&volume);

        i += 1;
    }

    eprintln!("checked {i} random volumes, no invariant violations");
}
