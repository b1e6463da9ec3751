//! Core library for bible-names.
//!
//! Resolves what people type for Bible book and division names ("1 Cor",
//! "Gen", "St John", "1. Mose") to canonical three-character book codes,
//! using per-language name systems and an abbreviation expander that only
//! accepts unambiguous forms for the books actually in a publication.
//!
//! # Modules
//!
//! - [`codes`] - Book code registry (valid codes, canon, reference order)
//! - [`records`] - Name-system file format and typed records
//! - [`store`] - Validated per-system record stores and the system library
//! - [`expander`] - Abbreviation expansion and disambiguation
//! - [`names`] - The [`NamesSystem`] facade used by applications
//! - [`reference`] - Verse keys and verse ranges
//! - [`validation`] - Data-quality diagnostics
//! - [`config`] - Layered names settings
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use bible_names_core::{NameSystemLibrary, NamesSystem, parse_book_list};
//!
//! let library = NameSystemLibrary::bundled();
//! let books = parse_book_list(library.registry(), &["GEN", "EXO", "MAT"])
//!     .expect("valid book codes");
//! let names = NamesSystem::for_system(&library, "eng_traditional", Some(&books))
//!     .expect("bundled system");
//!
//! assert_eq!(names.resolve_book_code("Matt").map(|c| c.to_string()), Some("MAT".into()));
//! ```
#![deny(unsafe_code)]

pub mod codes;
pub mod config;
pub mod error;
pub mod expander;
pub mod names;
pub mod records;
pub mod reference;
pub mod store;
pub mod validation;

pub use codes::{BookCode, BookCodeEntry, BookCodeRegistry, BookScope, Canon};
pub use config::{Config, ConfigLoader, ConfigSources, LogLevel, SourceFile, SourceKind};
pub use error::{
    ConfigError, ConfigResult, NamesError, NamesResult, ReferenceError, ReferenceResult,
};
pub use expander::{
    AmbiguitySet, EntryOrigin, Expansion, ExpansionStats, LookupEntry, LookupTable, expand,
    parse_book_list, seed_tables,
};
pub use names::{LookupStats, NamesSystem};
pub use records::{BookNameRecord, DivisionRecord, LeaderRecord, NameSystemFile};
pub use reference::{VerseKey, VerseRange, VerseSuffix};
pub use store::{NameRecordStore, NameSystemLibrary, SystemSource};
pub use validation::{IssueKind, Severity, ValidationIssue, ValidationMode};
