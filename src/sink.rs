// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Output sinks for emitted blocks.

use crate::geometry::Vec3;
use crate::tag::TagId;
use std::io::Write;

/// One compressed, homogeneous, axis-aligned box in world-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedBlock {
    pub origin: Vec3,
    pub size: Vec3,
    pub tag: TagId,
}

/// Where a `ParentBlock` sends the boxes it emits.
///
/// Separating emission from compression (rather than having the engine
/// `println!` directly, as the original does) lets tests collect blocks into
/// a `Vec` and lets the CLI route them to a buffered stdout writer.
pub trait BlockSink {
    fn emit(&mut self, block: EmittedBlock, tag_name: &str);
}

/// Collects emitted blocks in memory, for tests and `modelcheck`.
#[derive(Debug, Default)]
pub struct VecSink {
    pub blocks: Vec<(EmittedBlock, String)>,
}

impl BlockSink for VecSink {
    fn emit(&mut self, block: EmittedBlock, tag_name: &str) {
        self.blocks.push((block, tag_name.to_owned()));
    }
}

/// Writes blocks as CSV lines: `ox,oy,oz,sx,sy,sz,'tag'`.
pub struct CsvSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> BlockSink for CsvSink<W> {
    fn emit(&mut self, block: EmittedBlock, tag_name: &str) {
        // A write failure here (e.g. a closed stdout pipe) is not
        // recoverable mid-stream; matches the original's unconditional
        // `cout <<` which has the same failure mode.
        let _ = writeln!(
            self.writer,
            "{},{},{},{},{},{},'{}'",
            block.origin.x,
            block.origin.y,
            block.origin.z,
            block.size.x,
            block.size.y,
            block.size.z,
            tag_name
        );
    }
}
