//! Name-system storage and the per-process system cache.
//!
//! A [`NameRecordStore`] holds the typed records of one system. A
//! [`NameSystemLibrary`] knows which systems exist (bundled ones plus any
//! `<system>.<ext>` files in configured data directories), parses them on
//! first use and caches the result.
//!
//! # Data file discovery
//!
//! Each data directory is scanned (not recursively) for files matching
//! `*.{toml,yaml,yml,json}`. The file stem is the system name. A file
//! overrides a bundled system of the same name, and a later directory
//! overrides an earlier one.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Toml};
use globset::{Glob, GlobMatcher};

use crate::codes::{BookCode, BookCodeRegistry, Canon};
use crate::config;
use crate::error::{NamesError, NamesResult};
use crate::records::{
    BookNameRecord, DivisionRecord, LeaderRecord, NameSystemFile, SystemHeader,
};
use crate::validation::{self, IssueKind, ValidationIssue, ValidationMode};

/// Systems compiled into the crate.
const BUNDLED_SYSTEMS: &[(&str, &str)] = &[
    (
        "deu_traditional",
        include_str!("../data/names/deu_traditional.toml"),
    ),
    (
        "eng_traditional",
        include_str!("../data/names/eng_traditional.toml"),
    ),
];

/// Glob for name-system data files.
const DATA_FILE_GLOB: &str = "*.{toml,yaml,yml,json}";

/// The typed records of one name system.
#[derive(Debug, Clone)]
pub struct NameRecordStore {
    system_name: String,
    language_code: String,
    header: SystemHeader,
    divisions: Vec<DivisionRecord>,
    books: Vec<BookNameRecord>,
    leaders: Vec<LeaderRecord>,
    issues: Vec<ValidationIssue>,
    registry: &'static BookCodeRegistry,
}

impl NameRecordStore {
    /// Build a store from a parsed data file.
    ///
    /// Unusable rows are dropped and every problem is recorded; see
    /// [`NameRecordStore::validate`].
    pub fn from_file(
        system_name: &str,
        file: &NameSystemFile,
        registry: &'static BookCodeRegistry,
    ) -> Self {
        let mut issues = Vec::new();

        let language_code = file
            .header
            .language
            .clone()
            .unwrap_or_else(|| system_name.split('_').next().unwrap_or(system_name).to_string());
        issues.extend(validation::check_language_code(system_name, &language_code));

        let mut divisions: Vec<DivisionRecord> = Vec::with_capacity(file.divisions.len());
        for (index, entry) in file.divisions.iter().enumerate() {
            let Some(record) = DivisionRecord::from_entry(entry, index, registry, &mut issues) else {
                continue;
            };
            if divisions.iter().any(|d| d.key == record.key) {
                issues.push(ValidationIssue::error(
                    IssueKind::DuplicateRecord,
                    format!("division {}", record.key),
                    "division defined more than once; keeping the first",
                ));
            } else {
                divisions.push(record);
            }
        }

        let mut leaders: Vec<LeaderRecord> = Vec::with_capacity(file.leaders.len());
        for (index, entry) in file.leaders.iter().enumerate() {
            let Some(record) = LeaderRecord::from_entry(entry, index, &mut issues) else {
                continue;
            };
            if leaders.iter().any(|l| l.leader == record.leader) {
                issues.push(ValidationIssue::error(
                    IssueKind::DuplicateRecord,
                    format!("leader {:?}", record.leader.trim_end()),
                    "leader defined more than once; keeping the first",
                ));
            } else {
                leaders.push(record);
            }
        }

        let mut books: Vec<BookNameRecord> = Vec::with_capacity(file.books.len());
        for (index, entry) in file.books.iter().enumerate() {
            let Some(record) = BookNameRecord::from_entry(entry, index, registry, &mut issues) else {
                continue;
            };
            if books.iter().any(|b| b.code == record.code) {
                issues.push(ValidationIssue::error(
                    IssueKind::DuplicateRecord,
                    format!("book {}", record.code),
                    "book defined more than once; keeping the first",
                ));
            } else {
                books.push(record);
            }
        }

        Self {
            system_name: system_name.to_string(),
            language_code,
            header: file.header.clone(),
            divisions,
            books,
            leaders,
            issues,
            registry,
        }
    }

    /// The system name, e.g. `eng_traditional`.
    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    /// The ISO 639-3 language code of the system.
    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// File metadata.
    pub const fn header(&self) -> &SystemHeader {
        &self.header
    }

    /// The registry the records were checked against.
    pub const fn registry(&self) -> &'static BookCodeRegistry {
        self.registry
    }

    /// Division records in file order.
    pub fn division_records(&self) -> &[DivisionRecord] {
        &self.divisions
    }

    /// Look up a division by its standard abbreviation.
    pub fn division(&self, key: &str) -> Option<&DivisionRecord> {
        self.divisions.iter().find(|d| d.key == key)
    }

    /// Book-name records in file order.
    pub fn book_name_records(&self) -> &[BookNameRecord] {
        &self.books
    }

    /// Look up the names of one book.
    pub fn book_record(&self, code: BookCode) -> Option<&BookNameRecord> {
        self.books.iter().find(|b| b.code == code)
    }

    /// Leader records in file order.
    pub fn leader_records(&self) -> &[LeaderRecord] {
        &self.leaders
    }

    /// Collect the diagnostics for this system.
    ///
    /// Lenient mode returns the problems found while building the records.
    /// Strict mode adds blank optional inputs, values shared between records
    /// and protocanonical books with no names.
    pub fn validate(&self, mode: ValidationMode) -> Vec<ValidationIssue> {
        let mut issues: Vec<ValidationIssue> = self
            .issues
            .iter()
            .filter(|i| i.applies_in(mode))
            .cloned()
            .collect();
        if mode == ValidationMode::Strict {
            issues.extend(self.strict_issues());
        }
        issues
    }

    fn strict_issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let book_owner = |b: &BookNameRecord| format!("book {}", b.code);
        let division_owner = |d: &DivisionRecord| format!("division {}", d.key);

        issues.extend(validation::repeated_values(
            "default name",
            self.books.iter().map(|b| (book_owner(b), b.default_name.as_str())),
        ));
        issues.extend(validation::repeated_values(
            "default abbreviation",
            self.books
                .iter()
                .map(|b| (book_owner(b), b.default_abbreviation.as_str())),
        ));
        issues.extend(validation::repeated_values(
            "book input",
            self.books.iter().flat_map(|b| {
                b.input_fields
                    .iter()
                    .map(move |f| (book_owner(b), f.as_str()))
            }),
        ));
        issues.extend(validation::repeated_values(
            "division input",
            self.divisions.iter().flat_map(|d| {
                d.input_fields
                    .iter()
                    .map(move |f| (division_owner(d), f.as_str()))
            }),
        ));

        for canon in [Canon::OldTestament, Canon::NewTestament] {
            for code in self.registry.codes_in_canon(canon) {
                if self.book_record(code).is_none() {
                    issues.push(ValidationIssue::warning(
                        IssueKind::MissingBookNames,
                        format!("book {code}"),
                        format!("no names for {code} in {}", self.system_name),
                    ));
                }
            }
        }
        issues
    }

    /// Derive the store for one publication.
    ///
    /// Keeps the divisions that include at least one listed book and the book
    /// records of listed books only, in list order. A listed book the system
    /// has no names for gets a placeholder record named after its code.
    pub fn scoped(&self, book_list: &[BookCode]) -> Self {
        let divisions = self
            .divisions
            .iter()
            .filter(|d| d.included_books.iter().any(|b| book_list.contains(b)))
            .cloned()
            .collect();

        let mut issues = self.issues.clone();
        let mut books: Vec<BookNameRecord> = Vec::with_capacity(book_list.len());
        for &code in book_list {
            if books.iter().any(|b| b.code == code) {
                continue;
            }
            match self.book_record(code) {
                Some(record) => books.push(record.clone()),
                None => {
                    tracing::error!(
                        system = %self.system_name,
                        book = %code,
                        "book has no information in this names system"
                    );
                    issues.push(ValidationIssue::error(
                        IssueKind::MissingBookNames,
                        format!("book {code}"),
                        format!("no names for {code} in {}; using the code itself", self.system_name),
                    ));
                    books.push(BookNameRecord::placeholder(code));
                }
            }
        }

        Self {
            system_name: self.system_name.clone(),
            language_code: self.language_code.clone(),
            header: self.header.clone(),
            divisions,
            books,
            leaders: self.leaders.clone(),
            issues,
            registry: self.registry,
        }
    }

    /// Returns `true` if both stores hold the same records.
    pub fn same_records_as(&self, other: &Self) -> bool {
        self.divisions == other.divisions && self.books == other.books && self.leaders == other.leaders
    }
}

impl fmt::Display for NameRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} divisions, {} leaders, {} books",
            self.system_name,
            self.language_code,
            self.divisions.len(),
            self.leaders.len(),
            self.books.len()
        )
    }
}

/// Where a system's data comes from.
#[derive(Debug, Clone)]
pub enum SystemSource {
    /// Compiled into the crate.
    Bundled(&'static str),
    /// A file in a data directory.
    File(Utf8PathBuf),
}

impl SystemSource {
    /// The file path, for file-backed systems.
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Bundled(_) => None,
            Self::File(path) => Some(path),
        }
    }

    fn figment(&self) -> Figment {
        match self {
            Self::Bundled(text) => Figment::from(Toml::string(text)),
            Self::File(path) => config::file_figment(path),
        }
    }
}

type StoreSlot = Arc<Mutex<Option<Arc<NameRecordStore>>>>;

/// The set of known name systems with a load-once cache.
///
/// Pass one library to whatever needs names; there is no hidden global.
/// Loading is safe from several threads: each system name has its own
/// slot, so a system is parsed at most once.
pub struct NameSystemLibrary {
    registry: &'static BookCodeRegistry,
    mode: ValidationMode,
    sources: BTreeMap<String, SystemSource>,
    cache: Mutex<HashMap<String, StoreSlot>>,
}

impl fmt::Debug for NameSystemLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameSystemLibrary")
            .field("mode", &self.mode)
            .field("systems", &self.sources.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl NameSystemLibrary {
    /// A lenient library of the bundled systems only.
    pub fn bundled() -> Self {
        let sources = BUNDLED_SYSTEMS
            .iter()
            .map(|&(name, text)| (name.to_string(), SystemSource::Bundled(text)))
            .collect();
        Self {
            registry: BookCodeRegistry::standard(),
            mode: ValidationMode::Lenient,
            sources,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A library of the bundled systems plus any data files in `data_dirs`.
    ///
    /// Directories that do not exist are skipped with a warning.
    #[tracing::instrument(skip(data_dirs), fields(dirs = data_dirs.len()))]
    pub fn new(mode: ValidationMode, data_dirs: &[Utf8PathBuf]) -> NamesResult<Self> {
        let mut library = Self::bundled();
        library.mode = mode;

        let matcher = data_file_matcher();
        for dir in data_dirs {
            if !dir.is_dir() {
                tracing::warn!(dir = %dir, "names data directory not found; skipping");
                continue;
            }
            for (name, path) in scan_data_dir(dir, matcher.as_ref())? {
                tracing::debug!(system = %name, path = %path, "found names data file");
                library.sources.insert(name, SystemSource::File(path));
            }
        }
        Ok(library)
    }

    /// Use a different code registry. Clears the cache.
    #[must_use]
    pub fn with_registry(mut self, registry: &'static BookCodeRegistry) -> Self {
        self.registry = registry;
        self.reset();
        self
    }

    /// The validation mode used when loading.
    pub const fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// The code registry records are checked against.
    pub const fn registry(&self) -> &'static BookCodeRegistry {
        self.registry
    }

    /// Number of known systems.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if no systems are known.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns `true` if `name` is a known system.
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Where a system's data comes from.
    pub fn source(&self, name: &str) -> Option<&SystemSource> {
        self.sources.get(name)
    }

    /// Known system names, sorted.
    ///
    /// With a language code, returns the part after `<lang>_` for each
    /// matching system, and an empty string for a system named exactly
    /// `<lang>`.
    pub fn available_system_names(&self, language: Option<&str>) -> Vec<String> {
        let Some(language) = language else {
            return self.sources.keys().cloned().collect();
        };
        let prefix = format!("{language}_");
        self.sources
            .keys()
            .filter_map(|name| {
                if name == language {
                    Some(String::new())
                } else {
                    name.strip_prefix(&prefix).map(str::to_string)
                }
            })
            .collect()
    }

    /// The distinct language prefixes of the known systems.
    pub fn available_language_codes(&self) -> BTreeSet<String> {
        self.sources
            .keys()
            .map(|name| name.split('_').next().unwrap_or(name).to_string())
            .collect()
    }

    /// Load a system, parsing it on first use.
    ///
    /// Repeated calls return the same cached store.
    #[tracing::instrument(skip(self))]
    pub fn load(&self, name: &str) -> NamesResult<Arc<NameRecordStore>> {
        let Some(source) = self.sources.get(name) else {
            return Err(NamesError::SystemNotFound {
                name: name.to_string(),
                available: self.available_system_names(None).join(", "),
            });
        };

        let slot = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(name.to_string()).or_default())
        };
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = guard.as_ref() {
            tracing::trace!("using cached names system");
            return Ok(Arc::clone(store));
        }

        let file: NameSystemFile = source.figment().extract().map_err(|e| NamesError::DataFile {
            system: name.to_string(),
            source: Box::new(e),
        })?;
        let store = NameRecordStore::from_file(name, &file, self.registry);
        validation::report(name, &store.validate(self.mode), self.mode);
        tracing::debug!(
            divisions = store.division_records().len(),
            leaders = store.leader_records().len(),
            books = store.book_name_records().len(),
            "names system loaded"
        );

        let store = Arc::new(store);
        *guard = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Drop every cached store.
    pub fn reset(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Validate every known system.
    ///
    /// A system whose data file cannot be parsed gets a single error issue
    /// and the rest are still checked. In strict mode this also reports
    /// systems whose records are identical to an earlier system's.
    #[tracing::instrument(skip(self), fields(mode = %self.mode))]
    pub fn validate_all(&self) -> Vec<(String, Vec<ValidationIssue>)> {
        let mut results = Vec::with_capacity(self.sources.len());
        let mut loaded: Vec<Arc<NameRecordStore>> = Vec::with_capacity(self.sources.len());
        for name in self.sources.keys() {
            let store = match self.load(name) {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!(system = %name, error = %e, "cannot load names system");
                    let issue = ValidationIssue::error(
                        IssueKind::UnreadableData,
                        format!("system {name}"),
                        e.to_string(),
                    );
                    results.push((name.clone(), vec![issue]));
                    continue;
                }
            };
            let mut issues = store.validate(self.mode);
            if self.mode == ValidationMode::Strict
                && let Some(twin) = loaded.iter().find(|other| other.same_records_as(&store))
            {
                issues.push(ValidationIssue::warning(
                    IssueKind::IdenticalSystem,
                    format!("system {name}"),
                    format!("records are identical to {}", twin.system_name()),
                ));
            }
            loaded.push(store);
            results.push((name.clone(), issues));
        }
        results
    }

    /// Best-effort book code for `text` across every system.
    ///
    /// Systems are tried in name order. Within a system an exact input match
    /// wins, otherwise the text must be a prefix of inputs of exactly one
    /// book. Falls back to [`BookCodeRegistry::code_from_text`].
    pub fn book_code_from_text(&self, text: &str) -> Option<BookCode> {
        let upper = text.trim().to_uppercase();
        if upper.is_empty() {
            return None;
        }
        for name in self.sources.keys() {
            let store = match self.load(name) {
                Ok(store) => store,
                Err(e) => {
                    tracing::warn!(system = %name, error = %e, "skipping names system");
                    continue;
                }
            };
            if let Some(code) = seed_prefix_match(&store, &upper) {
                return Some(code);
            }
        }
        self.registry.code_from_text(text)
    }
}

/// Exact or unique-prefix match of an upper-cased text against a store's inputs.
fn seed_prefix_match(store: &NameRecordStore, upper: &str) -> Option<BookCode> {
    let mut candidates = BTreeSet::new();
    for book in store.book_name_records() {
        for field in &book.input_fields {
            let field = field.to_uppercase();
            if field == upper {
                return Some(book.code);
            }
            if field.starts_with(upper) {
                candidates.insert(book.code);
            }
        }
    }
    match candidates.iter().next() {
        Some(&code) if candidates.len() == 1 => Some(code),
        _ => None,
    }
}

fn data_file_matcher() -> Option<GlobMatcher> {
    match Glob::new(DATA_FILE_GLOB) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            tracing::warn!(pattern = DATA_FILE_GLOB, error = %e, "invalid data file glob");
            None
        }
    }
}

/// List `(system name, path)` for every data file directly inside `dir`.
fn scan_data_dir(
    dir: &Utf8Path,
    matcher: Option<&GlobMatcher>,
) -> NamesResult<Vec<(String, Utf8PathBuf)>> {
    let io_error = |source| NamesError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut found = Vec::new();
    for entry in dir.read_dir_utf8().map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if !path.is_file() || !matcher.is_some_and(|m| m.is_match(entry.file_name())) {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            found.push((stem.to_string(), path.to_path_buf()));
        }
    }
    // Deterministic precedence when the same stem exists with two extensions.
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn code(s: &str) -> BookCode {
        BookCode::parse(s).unwrap()
    }

    fn tiny_file() -> NameSystemFile {
        Figment::from(Toml::string(
            r#"
[[divisions]]
standard_abbreviation = "OT"
default_name = "Old Testament"
default_abbreviation = "OT"
included_books = ["GEN", "EXO"]

[[divisions]]
standard_abbreviation = "NT"
default_name = "New Testament"
default_abbreviation = "NT"
included_books = ["MAT"]

[[leaders]]
standard = "1"
alternates = ["I", "First"]

[[books]]
code = "GEN"
default_name = "Genesis"
default_abbreviation = "Gen"

[[books]]
code = "EXO"
default_name = "Exodus"
default_abbreviation = "Exo"
inputs = ["Exodus"]

[[books]]
code = "MAT"
default_name = "Matthew"
default_abbreviation = "Mat"

[[books]]
code = "GEN"
default_name = "Genesis again"
default_abbreviation = "Gen"
"#,
        ))
        .extract()
        .unwrap()
    }

    fn tiny_store() -> NameRecordStore {
        NameRecordStore::from_file("tst_tiny", &tiny_file(), BookCodeRegistry::standard())
    }

    #[test]
    fn builds_typed_records() {
        let store = tiny_store();
        assert_eq!(store.language_code(), "tst");
        assert_eq!(store.division_records().len(), 2);
        assert_eq!(store.book_name_records().len(), 3);
        assert_eq!(store.leader_records()[0].alternates, vec!["I ", "First "]);
        assert_eq!(store.book_record(code("GEN")).unwrap().default_name, "Genesis");
        assert_eq!(store.division("NT").unwrap().included_books, vec![code("MAT")]);
        assert!(store.division("PEN").is_none());
    }

    #[test]
    fn lenient_validation_reports_duplicates_and_superfluous_inputs() {
        let issues = tiny_store().validate(ValidationMode::Lenient);
        let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::SuperfluousInput));
        assert!(kinds.contains(&IssueKind::DuplicateRecord));
        assert!(!kinds.contains(&IssueKind::MissingBookNames));
    }

    #[test]
    fn strict_validation_adds_missing_books() {
        let issues = tiny_store().validate(ValidationMode::Strict);
        let missing = issues
            .iter()
            .filter(|i| i.kind == IssueKind::MissingBookNames)
            .count();
        assert_eq!(missing, 66 - 3);
    }

    #[test]
    fn scoped_store_keeps_overlapping_divisions_and_adds_placeholders() {
        let scoped = tiny_store().scoped(&[code("GEN"), code("REV")]);
        let keys: Vec<_> = scoped.division_records().iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["OT"]);
        let books: Vec<_> = scoped.book_name_records().iter().map(|b| b.code).collect();
        assert_eq!(books, vec![code("GEN"), code("REV")]);
        assert_eq!(scoped.book_record(code("REV")).unwrap().default_name, "REV");
        assert!(
            scoped
                .validate(ValidationMode::Lenient)
                .iter()
                .any(|i| i.kind == IssueKind::MissingBookNames)
        );
    }

    #[test]
    fn bundled_systems_are_available() {
        let library = NameSystemLibrary::bundled();
        assert!(library.contains("eng_traditional"));
        assert!(library.contains("deu_traditional"));
        assert_eq!(library.len(), 2);
        assert_eq!(
            library.available_system_names(Some("eng")),
            vec!["traditional".to_string()]
        );
        assert!(library.available_system_names(Some("fra")).is_empty());
        let langs: Vec<_> = library.available_language_codes().into_iter().collect();
        assert_eq!(langs, vec!["deu".to_string(), "eng".to_string()]);
    }

    #[test]
    fn load_is_cached_until_reset() {
        let library = NameSystemLibrary::bundled();
        let first = library.load("eng_traditional").unwrap();
        let second = library.load("eng_traditional").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        library.reset();
        let third = library.load("eng_traditional").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn concurrent_loads_share_one_store() {
        let library = NameSystemLibrary::bundled();
        let stores: Vec<Arc<NameRecordStore>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| library.load("deu_traditional").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(stores.len(), 8);
        assert!(stores.iter().all(|s| Arc::ptr_eq(s, &stores[0])));
        assert!(Arc::ptr_eq(&stores[0], &library.load("deu_traditional").unwrap()));
    }

    #[test]
    fn unknown_system_is_an_error() {
        let library = NameSystemLibrary::bundled();
        let err = library.load("nonexistent_lang").unwrap_err();
        assert!(matches!(err, NamesError::SystemNotFound { ref name, .. } if name == "nonexistent_lang"));
        assert!(err.to_string().contains("eng_traditional"));
    }

    #[test]
    fn bundled_data_is_clean_in_lenient_mode() {
        let library = NameSystemLibrary::bundled();
        for (name, issues) in library.validate_all() {
            let errors: Vec<_> = issues
                .iter()
                .filter(|i| i.severity == validation::Severity::Error)
                .collect();
            assert!(errors.is_empty(), "{name}: {errors:?}");
        }
    }

    #[test]
    fn eng_traditional_covers_the_protocanon() {
        let library = NameSystemLibrary::bundled();
        let store = library.load("eng_traditional").unwrap();
        assert!(
            !store
                .validate(ValidationMode::Strict)
                .iter()
                .any(|i| i.kind == IssueKind::MissingBookNames)
        );
        assert_eq!(store.division("OT").unwrap().included_books.len(), 39);
    }

    #[test]
    fn data_dir_files_override_bundled_systems() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("eng_traditional.yaml"),
            "books:\n  - code: GEN\n    default_name: Beginning\n    default_abbreviation: Beg\n",
        )
        .unwrap();
        fs::write(tmp.path().join("fra_test.json"), r#"{"books": []}"#).unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let library = NameSystemLibrary::new(ValidationMode::Lenient, &[dir]).unwrap();
        assert_eq!(library.len(), 3);
        assert!(library.source("eng_traditional").unwrap().path().is_some());
        let store = library.load("eng_traditional").unwrap();
        assert_eq!(store.book_record(code("GEN")).unwrap().default_name, "Beginning");
        assert!(library.load("fra_test").unwrap().book_name_records().is_empty());
    }

    #[test]
    fn missing_data_dir_is_skipped() {
        let library =
            NameSystemLibrary::new(ValidationMode::Lenient, &[Utf8PathBuf::from("/no/such/dir")]).unwrap();
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn broken_data_file_is_a_load_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad_sys.toml"), "books = 7\n").unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let library = NameSystemLibrary::new(ValidationMode::Lenient, &[dir]).unwrap();
        assert!(matches!(
            library.load("bad_sys"),
            Err(NamesError::DataFile { .. })
        ));

        let results = library.validate_all();
        assert_eq!(results.len(), 3);
        let (_, bad) = results.iter().find(|(n, _)| n == "bad_sys").unwrap();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].kind, IssueKind::UnreadableData);
        assert_eq!(bad[0].severity, validation::Severity::Error);
        let (_, eng) = results.iter().find(|(n, _)| n == "eng_traditional").unwrap();
        assert!(eng.iter().all(|i| i.severity != validation::Severity::Error));
    }

    #[test]
    fn identical_systems_flagged_in_strict_mode() {
        let tmp = TempDir::new().unwrap();
        let data = "books:\n  - code: GEN\n    default_name: Genesis\n    default_abbreviation: Gen\n";
        fs::write(tmp.path().join("aaa_one.yaml"), data).unwrap();
        fs::write(tmp.path().join("aaa_two.yaml"), data).unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let library = NameSystemLibrary::new(ValidationMode::Strict, &[dir]).unwrap();
        let results = library.validate_all();
        let (_, two) = results.iter().find(|(n, _)| n == "aaa_two").unwrap();
        assert!(two.iter().any(|i| i.kind == IssueKind::IdenticalSystem));
        let (_, one) = results.iter().find(|(n, _)| n == "aaa_one").unwrap();
        assert!(!one.iter().any(|i| i.kind == IssueKind::IdenticalSystem));
    }

    #[test]
    fn book_code_from_text_across_systems() {
        let library = NameSystemLibrary::bundled();
        assert_eq!(library.book_code_from_text("Genesis"), Some(code("GEN")));
        assert_eq!(library.book_code_from_text("1. Mose"), Some(code("GEN")));
        assert_eq!(library.book_code_from_text("Offenbarung"), Some(code("REV")));
        assert_eq!(library.book_code_from_text("Philem"), Some(code("PHM")));
        assert_eq!(library.book_code_from_text("1Cor"), Some(code("CO1")));
        assert_eq!(library.book_code_from_text("zzzz"), None);
    }
}
