use std::{fmt, path::PathBuf};

use thiserror::Error;

/// File formats read by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Cohpcar,
    Doscar,
    Poscar,
    ScanParam,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Cohpcar => "COHPCAR",
            Format::Doscar => "DOSCAR",
            Format::Poscar => "POSCAR",
            Format::ScanParam => "param.txt",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The one unrecoverable header failure: a declaration line matching
    /// neither the orbitalwise nor the total interaction pattern.
    #[error("Cannot parse line: {line}")]
    MalformedInteraction { line: String },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("column {column} is out of range for a matrix with {width} columns")]
    ColumnOutOfRange { column: usize, width: usize },

    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("species '{0}' is not in the structure")]
    UnknownSpecies(String),

    #[error("atom {index} is out of range for a file with {available} atoms")]
    AtomOutOfRange { index: usize, available: usize },

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("plotting failed: {0}")]
    Plot(String),
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
