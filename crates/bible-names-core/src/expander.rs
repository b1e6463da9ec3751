//! Abbreviation expansion and disambiguation.
//!
//! Given the records of one name system and the books present in one
//! publication, [`expand`] builds two lookup tables: division names and book
//! names. Each maps an upper-cased string a user might type to its target.
//!
//! Every curated input field is a *seed*. From each seed the expander
//! generates shorter candidates by dropping trailing characters, by removing
//! internal spaces one at a time, and by swapping a leading leader word
//! ("1 ", "Saint ") for each of its alternates. A generated candidate is kept
//! only if nothing else in scope produced it for a different target.
//!
//! ```text
//! seed "1 KINGS" -> "1 KINGS" "1KINGS" "1 KING" "1KING" ... "1 K" "1K"
//! leader "1 " -> "I ": "I KINGS" "IKINGS" ... "I K" "IK" "I"
//! ```
//!
//! Ambiguity depends on scope: "G" is ambiguous in a whole Bible (Genesis,
//! Galatians) but resolves to Genesis in a Genesis-only booklet.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::codes::{BookCode, BookCodeRegistry};
use crate::error::{NamesError, NamesResult};
use crate::records::LeaderRecord;
use crate::store::NameRecordStore;

/// Whether a table entry was curated or produced by expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    /// An input field from the data.
    Seed,
    /// A truncation, compaction or leader substitution of a seed.
    Generated,
}

/// One row of a [`LookupTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupEntry<V> {
    /// Upper-cased lookup key.
    pub key: String,
    /// Target of the key.
    pub value: V,
    /// How the key got into the table.
    pub origin: EntryOrigin,
}

/// An upper-cased string to target map ordered longest key first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable<V> {
    entries: Vec<LookupEntry<V>>,
    index: HashMap<String, usize>,
}

impl<V> Default for LookupTable<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> LookupTable<V> {
    /// Build a table, sorting by descending key length (in characters).
    ///
    /// Keys must be unique; a repeated key keeps its first entry.
    fn from_entries(mut entries: Vec<LookupEntry<V>>) -> Self {
        entries.sort_by_key(|e| std::cmp::Reverse(e.key.chars().count()));
        let mut index = HashMap::with_capacity(entries.len());
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if index.contains_key(&entry.key) {
                continue;
            }
            index.insert(entry.key.clone(), kept.len());
            kept.push(entry);
        }
        Self {
            entries: kept,
            index,
        }
    }

    /// Exact lookup. `text` is upper-cased before comparing.
    pub fn get(&self, text: &str) -> Option<&V> {
        self.entry(&text.to_uppercase()).map(|e| &e.value)
    }

    /// Exact lookup of an already upper-cased key.
    pub fn entry(&self, key: &str) -> Option<&LookupEntry<V>> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Whether the key was curated or generated.
    pub fn origin(&self, key: &str) -> Option<EntryOrigin> {
        self.entry(key).map(|e| e.origin)
    }

    /// Greedy match at the start of free text.
    ///
    /// Returns the target of the longest key that `text` starts with
    /// (case-insensitively) and the number of bytes of `text` it consumed,
    /// counting any leading whitespace. A match must end the text or be
    /// followed by a non-letter, so "Gen" matches in "Gen 1:1" but not in
    /// "General".
    pub fn longest_prefix_match(&self, text: &str) -> Option<(&V, usize)> {
        let trimmed = text.trim_start();
        let skipped = text.len() - trimmed.len();
        let text = trimmed;
        let longest = self.entries.first().map_or(0, |e| e.key.chars().count());
        let mut ends: Vec<usize> = text
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .take(longest)
            .collect();
        ends.reverse();
        ends.into_iter().find_map(|end| {
            let at_boundary = text[end..].chars().next().is_none_or(|c| !c.is_alphabetic());
            if !at_boundary {
                return None;
            }
            self.entry(&text[..end].to_uppercase())
                .map(|e| (&e.value, skipped + end))
        })
    }

    /// Entries in longest-first order.
    pub fn iter(&self) -> impl Iterator<Item = &LookupEntry<V>> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given origin.
    pub fn count(&self, origin: EntryOrigin) -> usize {
        self.entries.iter().filter(|e| e.origin == origin).count()
    }
}

/// Candidate strings that must never be promoted as generated entries.
///
/// Shared by the division and book tables of one [`expand`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbiguitySet(HashSet<String>);

impl AmbiguitySet {
    /// Returns `true` if `key` was found ambiguous or superfluous.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Number of excluded keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was excluded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The excluded keys, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn insert(&mut self, key: &str) {
        if !self.0.contains(key) {
            self.0.insert(key.to_string());
        }
    }
}

/// What happened to one proposed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    /// Empty, all digits, or ending in a space.
    Skipped,
    /// Already a seed with the same target; excluded from generation.
    Superfluous,
    /// Already a seed with a different target.
    Collision,
    /// Already generated for a different target.
    Ambiguous,
    /// Already generated for the same target.
    Repeated,
    /// Newly recorded.
    Recorded,
}

/// Seeds of one table: upper-cased input field to target.
pub type SeedMap<V> = HashMap<String, V>;

/// Working state for expanding one table.
///
/// [`ExpansionBuilder::propose_candidate`] is the only place a candidate can
/// enter the generated set.
#[derive(Debug)]
pub struct ExpansionBuilder<'a, V> {
    seeds: &'a SeedMap<V>,
    leaders: &'a [(String, Vec<String>)],
    ambiguous: &'a mut AmbiguitySet,
    generated: HashMap<String, V>,
    discovery: Vec<String>,
    superfluous: usize,
}

impl<'a, V: Clone + Eq> ExpansionBuilder<'a, V> {
    /// Start a builder over one table's seeds.
    pub fn new(
        seeds: &'a SeedMap<V>,
        leaders: &'a [(String, Vec<String>)],
        ambiguous: &'a mut AmbiguitySet,
    ) -> Self {
        Self {
            seeds,
            leaders,
            ambiguous,
            generated: HashMap::new(),
            discovery: Vec::new(),
            superfluous: 0,
        }
    }

    /// Offer one candidate for `value`.
    pub fn propose_candidate(&mut self, key: &str, value: &V) -> Proposal {
        if key.is_empty() || key.ends_with(' ') || key.chars().all(|c| c.is_ascii_digit()) {
            return Proposal::Skipped;
        }
        if let Some(seed) = self.seeds.get(key) {
            self.ambiguous.insert(key);
            return if seed == value {
                self.superfluous += 1;
                Proposal::Superfluous
            } else {
                Proposal::Collision
            };
        }
        match self.generated.get(key) {
            Some(existing) if existing == value => Proposal::Repeated,
            Some(_) => {
                self.ambiguous.insert(key);
                Proposal::Ambiguous
            }
            None => {
                self.generated.insert(key.to_string(), value.clone());
                self.discovery.push(key.to_string());
                Proposal::Recorded
            }
        }
    }

    /// Propose every truncation of `text`, each with its spaces removed one
    /// at a time.
    pub fn propose_truncations(&mut self, text: &str, value: &V) {
        let mut current = text.to_string();
        while !current.is_empty() {
            self.propose_candidate(&current, value);
            let mut compact = current.clone();
            while let Some(space) = compact.find(' ') {
                compact.remove(space);
                self.propose_candidate(&compact, value);
            }
            current.pop();
        }
    }

    /// Propose the truncations of a seed and of its leader substitutions.
    pub fn expand_seed(&mut self, seed: &str, value: &V) {
        self.propose_truncations(seed, value);
        let leaders = self.leaders;
        for (leader, alternates) in leaders {
            if let Some(rest) = seed.strip_prefix(leader.as_str()) {
                for alternate in alternates {
                    self.propose_truncations(&format!("{alternate}{rest}"), value);
                }
            }
        }
    }

    /// Generated candidates in discovery order, plus the superfluous count.
    fn finish(self) -> (Vec<(String, V)>, usize) {
        let Self {
            mut generated,
            discovery,
            superfluous,
            ..
        } = self;
        let candidates = discovery
            .into_iter()
            .filter_map(|key| generated.remove(&key).map(|v| (key, v)))
            .collect();
        (candidates, superfluous)
    }
}

/// Counts describing one expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionStats {
    /// Division seeds kept.
    pub division_seeds: usize,
    /// Generated division entries promoted.
    pub division_generated: usize,
    /// Book seeds kept.
    pub book_seeds: usize,
    /// Generated book entries promoted.
    pub book_generated: usize,
    /// Size of the ambiguity set.
    pub ambiguous: usize,
    /// Candidates that duplicated a seed of the same target.
    pub superfluous: usize,
    /// Seeds dropped because two records in one table claimed them.
    pub seed_conflicts: usize,
}

impl fmt::Display for ExpansionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "divisions {}+{}, books {}+{}, {} ambiguous",
            self.division_seeds,
            self.division_generated,
            self.book_seeds,
            self.book_generated,
            self.ambiguous
        )
    }
}

/// The result of [`expand`].
#[derive(Debug, Clone)]
pub struct Expansion {
    /// Division names to division keys.
    pub divisions: LookupTable<String>,
    /// Book names to book codes.
    pub books: LookupTable<BookCode>,
    /// Candidates excluded from both tables.
    pub ambiguous: AmbiguitySet,
    /// Summary counts.
    pub stats: ExpansionStats,
}

/// Parse and check a publication book list against a registry.
///
/// Every malformed or unregistered code is reported in one
/// [`NamesError::InvalidBookList`].
pub fn parse_book_list<S: AsRef<str>>(
    registry: &BookCodeRegistry,
    codes: &[S],
) -> NamesResult<Vec<BookCode>> {
    let mut books = Vec::with_capacity(codes.len());
    let mut invalid = Vec::new();
    for text in codes {
        let text = text.as_ref().trim();
        match BookCode::parse(text) {
            Ok(code) if registry.contains(code) => books.push(code),
            _ => invalid.push(text.to_string()),
        }
    }
    if invalid.is_empty() {
        Ok(books)
    } else {
        Err(NamesError::InvalidBookList { codes: invalid })
    }
}

/// Build the seed map for one table, dropping strings claimed by two targets.
fn seed_map<'r, V, I>(
    records: I,
    table: &str,
    ambiguous: &mut AmbiguitySet,
) -> (SeedMap<V>, usize)
where
    V: Clone + Eq + fmt::Display + 'r,
    I: IntoIterator<Item = (V, &'r [String])>,
{
    let mut seeds: SeedMap<V> = HashMap::new();
    let mut conflicted: HashSet<String> = HashSet::new();
    for (value, fields) in records {
        for field in fields {
            let key = field.to_uppercase();
            match seeds.get(&key) {
                None => {
                    seeds.insert(key, value.clone());
                }
                Some(existing) if *existing == value => {}
                Some(existing) => {
                    tracing::warn!(
                        table,
                        key = %key,
                        first = %existing,
                        second = %value,
                        "input claimed by two records; dropping it"
                    );
                    ambiguous.insert(&key);
                    conflicted.insert(key);
                }
            }
        }
    }
    for key in &conflicted {
        seeds.remove(key);
    }
    (seeds, conflicted.len())
}

/// Expand one table's seeds and promote the unambiguous candidates.
fn promote<V: Clone + Eq>(
    seeds: SeedMap<V>,
    candidates: Vec<(String, V)>,
    ambiguous: &AmbiguitySet,
) -> LookupTable<V> {
    let mut entries: Vec<LookupEntry<V>> = seeds
        .iter()
        .map(|(key, value)| LookupEntry {
            key: key.clone(),
            value: value.clone(),
            origin: EntryOrigin::Seed,
        })
        .collect();
    // Seed order out of a HashMap is arbitrary; make ties reproducible.
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries.extend(
        candidates
            .into_iter()
            .filter(|(key, _)| !ambiguous.contains(key) && !seeds.contains_key(key))
            .map(|(key, value)| LookupEntry {
                key,
                value,
                origin: EntryOrigin::Generated,
            }),
    );
    LookupTable::from_entries(entries)
}

fn expand_table<V: Clone + Eq>(
    seeds: &SeedMap<V>,
    seed_order: &[(String, V)],
    leaders: &[(String, Vec<String>)],
    ambiguous: &mut AmbiguitySet,
) -> (Vec<(String, V)>, usize) {
    let mut builder = ExpansionBuilder::new(seeds, leaders, ambiguous);
    for (seed, value) in seed_order {
        builder.expand_seed(seed, value);
    }
    builder.finish()
}

/// Seeds in record order, for deterministic candidate discovery.
fn ordered_seeds<V: Clone>(seeds: &SeedMap<V>, keys: impl IntoIterator<Item = String>) -> Vec<(String, V)> {
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter_map(|key| {
            let value = seeds.get(&key)?.clone();
            seen.insert(key.clone()).then_some((key, value))
        })
        .collect()
}

/// Upper-case the leaders, keeping their trailing spaces.
fn leader_map(leaders: &[LeaderRecord]) -> Vec<(String, Vec<String>)> {
    leaders
        .iter()
        .map(|l| {
            (
                l.leader.to_uppercase(),
                l.alternates.iter().map(|a| a.to_uppercase()).collect(),
            )
        })
        .collect()
}

/// Build the division and book lookup tables for one publication.
///
/// Only books in `book_list` are seeded, and only divisions that include at
/// least one of them. Fails only if `book_list` holds a code the store's
/// registry does not know.
#[tracing::instrument(skip_all, fields(system = store.system_name(), books = book_list.len()))]
pub fn expand(store: &NameRecordStore, book_list: &[BookCode]) -> NamesResult<Expansion> {
    let unknown: Vec<String> = book_list
        .iter()
        .filter(|&&code| !store.registry().contains(code))
        .map(ToString::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(NamesError::InvalidBookList { codes: unknown });
    }

    let mut ambiguous = AmbiguitySet::default();
    let leaders = leader_map(store.leader_records());

    let divisions: Vec<_> = store
        .division_records()
        .iter()
        .filter(|d| d.included_books.iter().any(|b| book_list.contains(b)))
        .collect();
    let books: Vec<_> = store
        .book_name_records()
        .iter()
        .filter(|b| book_list.contains(&b.code))
        .collect();

    let (division_seeds, division_conflicts) = seed_map(
        divisions
            .iter()
            .map(|d| (d.key.clone(), d.input_fields.as_slice())),
        "divisions",
        &mut ambiguous,
    );
    let (book_seeds, book_conflicts) = seed_map(
        books.iter().map(|b| (b.code, b.input_fields.as_slice())),
        "books",
        &mut ambiguous,
    );

    for key in division_seeds.keys() {
        if let Some(code) = book_seeds.get(key) {
            tracing::warn!(key = %key, division = %division_seeds[key], book = %code, "input names both a division and a book");
            ambiguous.insert(key);
        }
    }

    let division_order = ordered_seeds(
        &division_seeds,
        divisions
            .iter()
            .flat_map(|d| d.input_fields.iter().map(|f| f.to_uppercase())),
    );
    let book_order = ordered_seeds(
        &book_seeds,
        books
            .iter()
            .flat_map(|b| b.input_fields.iter().map(|f| f.to_uppercase())),
    );

    let (division_candidates, division_superfluous) =
        expand_table(&division_seeds, &division_order, &leaders, &mut ambiguous);
    let (book_candidates, book_superfluous) =
        expand_table(&book_seeds, &book_order, &leaders, &mut ambiguous);

    // A string generated for a division and also present in the book table
    // (or the other way round) is as ambiguous as a clash within one table.
    let division_generated: HashSet<&str> =
        division_candidates.iter().map(|(k, _)| k.as_str()).collect();
    for (key, _) in &book_candidates {
        if division_generated.contains(key.as_str()) || division_seeds.contains_key(key) {
            ambiguous.insert(key);
        }
    }
    for (key, _) in &division_candidates {
        if book_seeds.contains_key(key) {
            ambiguous.insert(key);
        }
    }

    let divisions = promote(division_seeds, division_candidates, &ambiguous);
    let books = promote(book_seeds, book_candidates, &ambiguous);

    let stats = ExpansionStats {
        division_seeds: divisions.count(EntryOrigin::Seed),
        division_generated: divisions.count(EntryOrigin::Generated),
        book_seeds: books.count(EntryOrigin::Seed),
        book_generated: books.count(EntryOrigin::Generated),
        ambiguous: ambiguous.len(),
        superfluous: division_superfluous + book_superfluous,
        seed_conflicts: division_conflicts + book_conflicts,
    };
    tracing::debug!(%stats, "expanded names system");

    Ok(Expansion {
        divisions,
        books,
        ambiguous,
        stats,
    })
}

/// Seed-only tables for every division and book in the store.
///
/// Used when no publication book list is known: exact curated inputs
/// resolve, nothing is generated.
pub fn seed_tables(store: &NameRecordStore) -> (LookupTable<String>, LookupTable<BookCode>) {
    let mut ambiguous = AmbiguitySet::default();
    let (division_seeds, _) = seed_map(
        store
            .division_records()
            .iter()
            .map(|d| (d.key.clone(), d.input_fields.as_slice())),
        "divisions",
        &mut ambiguous,
    );
    let (book_seeds, _) = seed_map(
        store
            .book_name_records()
            .iter()
            .map(|b| (b.code, b.input_fields.as_slice())),
        "books",
        &mut ambiguous,
    );
    (
        promote(division_seeds, Vec::new(), &ambiguous),
        promote(book_seeds, Vec::new(), &ambiguous),
    )
}
