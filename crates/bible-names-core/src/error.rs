//! Error types for bible-names-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while merging settings files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by name-system loading and expansion.
///
/// Only caller bugs and missing data are errors. Lookup misses, ambiguous
/// abbreviations and data-quality problems are reported as values.
#[derive(Error, Debug)]
pub enum NamesError {
    /// No bundled or on-disk data exists for the requested system.
    #[error("no {name:?} book names system (available: {available})")]
    SystemNotFound {
        /// The system name that was requested.
        name: String,
        /// Comma-separated list of known system names.
        available: String,
    },

    /// A publication book list contained codes the registry does not know.
    #[error("invalid book code(s) in book list: {}", codes.join(", "))]
    InvalidBookList {
        /// The offending codes, in the order they were supplied.
        codes: Vec<String>,
    },

    /// The system has no name record for the requested book.
    #[error("book {code} has no names in the {system} system")]
    UnknownBookCode {
        /// The book code that was requested.
        code: String,
        /// The name system that was queried.
        system: String,
    },

    /// Text that should have been a three-character book code was not one.
    #[error("{text:?} is not a book code (expected three characters A-Z or 0-9)")]
    InvalidBookCode {
        /// The text that failed to parse.
        text: String,
    },

    /// A name-system data file could not be parsed.
    #[error("failed to read {system} name system: {source}")]
    DataFile {
        /// The system whose data failed to load.
        system: String,
        /// The underlying figment error.
        #[source]
        source: Box<figment::Error>,
    },

    /// A data directory could not be listed.
    #[error("failed to read data directory {path}: {source}")]
    Io {
        /// The directory that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`NamesError`].
pub type NamesResult<T> = Result<T, NamesError>;

/// Errors that can occur when parsing verse references.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReferenceError {
    /// The text does not look like a verse reference at all.
    #[error("unable to parse {0:?} as a verse reference")]
    Unparseable(String),

    /// The reference names a book the registry does not know.
    #[error("unknown book {0:?} in verse reference")]
    UnknownBook(String),

    /// A range whose end comes before its start.
    #[error("verse range {0:?} ends before it starts")]
    BackwardsRange(String),
}

/// Result type alias using [`ReferenceError`].
pub type ReferenceResult<T> = Result<T, ReferenceError>;
