//! The names-system facade.
//!
//! [`NamesSystem`] is what application code holds: the records of one
//! system, optionally scoped to one publication, plus the lookup tables
//! built from them.
//!
//! ```no_run
//! use bible_names_core::{BookCode, NameSystemLibrary, NamesSystem};
//!
//! let library = NameSystemLibrary::bundled();
//! let books: Vec<BookCode> = ["GEN", "EXO"].iter().map(|c| c.parse().unwrap()).collect();
//! let names = NamesSystem::for_system(&library, "eng_traditional", Some(&books)).unwrap();
//! assert_eq!(names.resolve_book_code("ex").map(|c| c.to_string()), Some("EXO".to_string()));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::codes::BookCode;
use crate::error::{NamesError, NamesResult};
use crate::expander::{self, EntryOrigin, ExpansionStats, LookupTable};
use crate::store::{NameRecordStore, NameSystemLibrary};

/// Sizes of a system's lookup tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LookupStats {
    /// Entries in the division table.
    pub division_entries: usize,
    /// Entries in the book table.
    pub book_entries: usize,
    /// Generated (non-seed) entries across both tables.
    pub generated_entries: usize,
    /// Expansion details, if a book list was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expansion: Option<ExpansionStats>,
}

/// Book and division names for one system and, optionally, one publication.
#[derive(Debug, Clone)]
pub struct NamesSystem {
    store: Arc<NameRecordStore>,
    book_list: Option<Vec<BookCode>>,
    divisions: LookupTable<String>,
    books: LookupTable<BookCode>,
    expansion: Option<ExpansionStats>,
}

impl NamesSystem {
    /// Load a system from `library`.
    ///
    /// With a `book_list`, the records are scoped to those books and the
    /// abbreviation tables are expanded for them. Without one, only exact
    /// curated inputs resolve.
    ///
    /// # Errors
    ///
    /// [`NamesError::SystemNotFound`] for an unknown system and
    /// [`NamesError::InvalidBookList`] for a book list with unregistered codes.
    #[tracing::instrument(skip(library, book_list), fields(books = book_list.map(<[BookCode]>::len)))]
    pub fn for_system(
        library: &NameSystemLibrary,
        system_name: &str,
        book_list: Option<&[BookCode]>,
    ) -> NamesResult<Self> {
        let store = library.load(system_name)?;
        let Some(book_list) = book_list else {
            let (divisions, books) = expander::seed_tables(&store);
            return Ok(Self {
                store,
                book_list: None,
                divisions,
                books,
                expansion: None,
            });
        };

        let registry = library.registry();
        let unknown: Vec<String> = book_list
            .iter()
            .filter(|&&code| !registry.contains(code))
            .map(ToString::to_string)
            .collect();
        if !unknown.is_empty() {
            tracing::error!(system = system_name, codes = ?unknown, "invalid book list");
            return Err(NamesError::InvalidBookList { codes: unknown });
        }

        let scoped = store.scoped(book_list);
        let expansion = expander::expand(&scoped, book_list)?;
        Ok(Self {
            store: Arc::new(scoped),
            book_list: Some(book_list.to_vec()),
            divisions: expansion.divisions,
            books: expansion.books,
            expansion: Some(expansion.stats),
        })
    }

    /// The system name.
    pub fn system_name(&self) -> &str {
        self.store.system_name()
    }

    /// The system's language code.
    pub fn language_code(&self) -> &str {
        self.store.language_code()
    }

    /// The publication book list, if one was given.
    pub fn book_list(&self) -> Option<&[BookCode]> {
        self.book_list.as_deref()
    }

    /// Codes of every book this system has names for (after scoping).
    pub fn book_codes(&self) -> Vec<BookCode> {
        self.store.book_name_records().iter().map(|b| b.code).collect()
    }

    /// Standard abbreviations of the divisions in scope.
    pub fn division_keys(&self) -> Vec<&str> {
        self.store
            .division_records()
            .iter()
            .map(|d| d.key.as_str())
            .collect()
    }

    /// Returns `true` if the tables include generated abbreviations.
    pub const fn is_expanded(&self) -> bool {
        self.expansion.is_some()
    }

    /// The underlying records.
    pub fn store(&self) -> &NameRecordStore {
        &self.store
    }

    /// The division lookup table.
    pub const fn division_lookup(&self) -> &LookupTable<String> {
        &self.divisions
    }

    /// The book lookup table.
    pub const fn book_lookup(&self) -> &LookupTable<BookCode> {
        &self.books
    }

    /// Table sizes.
    pub fn lookup_stats(&self) -> LookupStats {
        LookupStats {
            division_entries: self.divisions.len(),
            book_entries: self.books.len(),
            generated_entries: self.divisions.count(EntryOrigin::Generated)
                + self.books.count(EntryOrigin::Generated),
            expansion: self.expansion,
        }
    }

    fn record(&self, code: BookCode) -> NamesResult<&crate::records::BookNameRecord> {
        self.store
            .book_record(code)
            .ok_or_else(|| NamesError::UnknownBookCode {
                code: code.to_string(),
                system: self.system_name().to_string(),
            })
    }

    /// Default vernacular name of a book.
    pub fn book_name(&self, code: BookCode) -> NamesResult<&str> {
        self.record(code).map(|r| r.default_name.as_str())
    }

    /// Default vernacular abbreviation of a book.
    pub fn book_abbreviation(&self, code: BookCode) -> NamesResult<&str> {
        self.record(code).map(|r| r.default_abbreviation.as_str())
    }

    /// Resolve a typed book name or abbreviation. Case-insensitive.
    pub fn resolve_book_code(&self, text: &str) -> Option<BookCode> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let found = self.books.get(text).copied();
        if found.is_none() {
            tracing::trace!(text, "no book matches");
        }
        found
    }

    /// Resolve the book named at the start of free text.
    ///
    /// Returns the code and the number of bytes consumed, e.g.
    /// `"1 Kings 3:5"` gives `(KI1, 7)`.
    pub fn resolve_book_code_prefix(&self, text: &str) -> Option<(BookCode, usize)> {
        self.books
            .longest_prefix_match(text)
            .map(|(&code, consumed)| (code, consumed))
    }

    /// Resolve a typed division name or abbreviation. Case-insensitive.
    pub fn resolve_division(&self, text: &str) -> Option<&str> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.divisions.get(text).map(String::as_str)
    }

    /// The books of a division, given its key or anything that resolves to it.
    pub fn division_book_list(&self, key_or_text: &str) -> Option<&[BookCode]> {
        if let Some(division) = self.store.division(key_or_text) {
            return Some(&division.included_books);
        }
        let key = self.resolve_division(key_or_text)?;
        self.store
            .division(key)
            .map(|d| d.included_books.as_slice())
    }
}

impl fmt::Display for NamesSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} divisions, {} leaders, {} books, {} division lookups, {} book lookups",
            self.system_name(),
            self.language_code(),
            self.store.division_records().len(),
            self.store.leader_records().len(),
            self.store.book_name_records().len(),
            self.divisions.len(),
            self.books.len()
        )?;
        if self.is_expanded() {
            f.write_str(" (expanded)")?;
        }
        Ok(())
    }
}
