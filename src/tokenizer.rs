// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Parses the header line and per-voxel tag text out of the CSV input
//! stream.
//!
//! Grounded on `TagReader.cpp`/`.h` in
//! `examples/original_source/BlockCompression/`, with the fixed
//! `MAX_LINE_LENGTH` static char buffer and boundary-straddling cache
//! re-architected onto `std::io::BufRead`: the contract (never exposing a
//! buffer boundary to callers, scanning for the next `'...'` pair regardless
//! of anything else on the line) is preserved; the mechanism is not.

use crate::error::{Error, Result};
use crate::geometry::Vec3;
use std::io::BufRead;

/// Reads the header line and then a stream of single-quoted tag names from
/// an underlying reader.
pub struct VoxelCsvReader<R> {
    reader: R,
}

impl<R: BufRead> VoxelCsvReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the first line (`volumeX,volumeY,volumeZ,pBlockX,pBlockY,pBlockZ`,
    /// with an arbitrary leading marker field) and returns
    /// `(volume_dim, pblock_dim)`.
    ///
    /// # Errors
    /// Returns [`Error::MalformedHeader`] if the line is missing fields or
    /// any of the six dimension fields does not parse as an integer.
    pub fn read_header(&mut self) -> Result<(Vec3, Vec3)> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .map_err(Error::Io)?;
        if n == 0 {
            return Err(Error::MalformedHeader("empty input, no header line".to_owned()));
        }

        let replaced = line.replace(',', " ");
        let parts: Vec<&str> = replaced.split_whitespace().collect();
        // parts[0] is an arbitrary leading marker field, discarded, matching
        // the original's `ss >> ignore >> volumeDim.x >> ...`.
        if parts.len() < 7 {
            return Err(Error::MalformedHeader(format!(
                "expected a marker field plus 6 dimensions, got {} fields",
                parts.len()
            )));
        }

        let parse = |s: &str| -> Result<u16> {
            s.parse::<u16>()
                .map_err(|_| Error::MalformedHeader(format!("invalid integer '{s}' in header")))
        };

        let volume_dim = Vec3::new(parse(parts[1])?, parse(parts[2])?, parse(parts[3])?);
        let pblock_dim = Vec3::new(parse(parts[4])?, parse(parts[5])?, parse(parts[6])?);
        Ok((volume_dim, pblock_dim))
    }

    /// Scans forward to the next `'...'`-delimited tag name and returns its
    /// contents, ignoring everything else in the stream (commas, newlines,
    /// leading coordinate fields).
    ///
    /// # Errors
    /// Returns [`Error::TruncatedInput`] if the stream ends before a
    /// complete quoted tag is found.
    pub fn next_tag_name(&mut self) -> Result<String> {
        let mut discard = Vec::new();
        let found_open = self.reader.read_until(b'\'', &mut discard).map_err(Error::Io)?;
        if found_open == 0 || discard.last() != Some(&b'\'') {
            return Err(Error::TruncatedInput);
        }

        let mut tag_bytes = Vec::new();
        let found_close = self
            .reader
            .read_until(b'\'', &mut tag_bytes)
            .map_err(Error::Io)?;
        if found_close == 0 || tag_bytes.last() != Some(&b'\'') {
            return Err(Error::TruncatedInput);
        }
        tag_bytes.pop();

        String::from_utf8(tag_bytes)
            .map_err(|_| Error::MalformedHeader("tag name is not valid UTF-8".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_header_with_comma_separators() {
        let mut r = VoxelCsvReader::new(Cursor::new(b"V,10,20,30,5,5,5\n".to_vec()));
        let (volume, pblock) = r.read_header().unwrap();
        assert_eq!(volume, Vec3::new(10, 20, 30));
        assert_eq!(pblock, Vec3::new(5, 5, 5));
    }

    #[test]
    fn rejects_short_header() {
        let mut r = VoxelCsvReader::new(Cursor::new(b"V,10,20,30\n".to_vec()));
        assert!(r.read_header().is_err());
    }

    #[test]
    fn extracts_consecutive_tags_ignoring_surrounding_text() {
        let mut r = VoxelCsvReader::new(Cursor::new(
            b"0,0,0,'Granite'\n0,0,1,'Shale'\n".to_vec(),
        ));
        assert_eq!(r.next_tag_name().unwrap(), "Granite");
        assert_eq!(r.next_tag_name().unwrap(), "Shale");
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut r = VoxelCsvReader::new(Cursor::new(b"0,0,0,'Gran".to_vec()));
        assert!(r.next_tag_name().is_err());
    }
}
