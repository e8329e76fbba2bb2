// Copyright (c) 2024-present, the blockvol authors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Represents errors that can occur while parsing input or compressing a volume.
#[derive(Debug)]
pub enum Error {
    /// The header line could not be parsed into six dimension integers.
    MalformedHeader(String),

    /// The input stream ended before all declared voxels were read.
    TruncatedInput,

    /// More than 256 distinct tags were seen (global alphabet is one byte).
    TagAlphabetExhausted,

    /// A parent-block plane was read more times than the volume has planes.
    InvariantViolation(String),

    /// Underlying I/O failure.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedHeader(line) => write!(f, "malformed header line: {line:?}"),
            Self::TruncatedInput => write!(f, "input ended before all voxels were read"),
            Self::TagAlphabetExhausted => write!(f, "more than 256 distinct tags in one run"),
            Self::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
