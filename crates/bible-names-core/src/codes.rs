//! Canonical three-character book codes.
//!
//! Every other module keys off [`BookCode`]. The [`BookCodeRegistry`] answers
//! whether a code is known, where it sits in the reference order, and which
//! canon it belongs to. It never does fuzzy matching of vernacular names; that
//! is the job of [`crate::expander`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};

use crate::error::NamesError;

/// A three-character book identifier such as `GEN`, `SA1` or `MAT`.
///
/// Parsing only checks the shape (three ASCII uppercase letters or digits).
/// Whether the code is actually known is a question for [`BookCodeRegistry`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookCode([u8; 3]);

impl BookCode {
    /// Parse a book code, checking only its shape.
    pub fn parse(text: &str) -> Result<Self, NamesError> {
        match text.as_bytes() {
            [a, b, c] if [a, b, c].iter().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()) => {
                Ok(Self([*a, *b, *c]))
            }
            _ => Err(NamesError::InvalidBookCode {
                text: text.to_string(),
            }),
        }
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII bytes.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for BookCode {
    type Err = NamesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BookCode {
    type Error = NamesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookCode> for String {
    fn from(code: BookCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookCode({})", self.as_str())
    }
}

/// Which part of the canon a book belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Canon {
    /// The 39 books of the Hebrew Bible / Protestant Old Testament.
    OldTestament,
    /// The 27 books of the New Testament.
    NewTestament,
    /// Deuterocanonical books and additions.
    Deuterocanon,
    /// Other apocryphal or liturgical books.
    Other,
}

impl Canon {
    /// Returns the canon as a short lowercase tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OldTestament => "ot",
            Self::NewTestament => "nt",
            Self::Deuterocanon => "dc",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Canon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCodeEntry {
    /// The reference code.
    pub code: BookCode,
    /// 1-based position in the reference order.
    pub reference_number: u16,
    /// Canon classification.
    pub canon: Canon,
    /// English book name (informational only).
    pub english_name: String,
    /// USFM book identifier.
    pub usfm: String,
    /// OSIS book abbreviation.
    pub osis: String,
}

/// Bundled registry rows: code, canon, English name, USFM id, OSIS abbreviation.
const STANDARD_BOOKS: &[(&str, Canon, &str, &str, &str)] = &[
    ("GEN", Canon::OldTestament, "Genesis", "GEN", "Gen"),
    ("EXO", Canon::OldTestament, "Exodus", "EXO", "Exod"),
    ("LEV", Canon::OldTestament, "Leviticus", "LEV", "Lev"),
    ("NUM", Canon::OldTestament, "Numbers", "NUM", "Num"),
    ("DEU", Canon::OldTestament, "Deuteronomy", "DEU", "Deut"),
    ("JOS", Canon::OldTestament, "Joshua", "JOS", "Josh"),
    ("JDG", Canon::OldTestament, "Judges", "JDG", "Judg"),
    ("RUT", Canon::OldTestament, "Ruth", "RUT", "Ruth"),
    ("SA1", Canon::OldTestament, "1 Samuel", "1SA", "1Sam"),
    ("SA2", Canon::OldTestament, "2 Samuel", "2SA", "2Sam"),
    ("KI1", Canon::OldTestament, "1 Kings", "1KI", "1Kgs"),
    ("KI2", Canon::OldTestament, "2 Kings", "2KI", "2Kgs"),
    ("CH1", Canon::OldTestament, "1 Chronicles", "1CH", "1Chr"),
    ("CH2", Canon::OldTestament, "2 Chronicles", "2CH", "2Chr"),
    ("EZR", Canon::OldTestament, "Ezra", "EZR", "Ezra"),
    ("NEH", Canon::OldTestament, "Nehemiah", "NEH", "Neh"),
    ("EST", Canon::OldTestament, "Esther", "EST", "Esth"),
    ("JOB", Canon::OldTestament, "Job", "JOB", "Job"),
    ("PSA", Canon::OldTestament, "Psalms", "PSA", "Ps"),
    ("PRO", Canon::OldTestament, "Proverbs", "PRO", "Prov"),
    ("ECC", Canon::OldTestament, "Ecclesiastes", "ECC", "Eccl"),
    ("SNG", Canon::OldTestament, "Song of Songs", "SNG", "Song"),
    ("ISA", Canon::OldTestament, "Isaiah", "ISA", "Isa"),
    ("JER", Canon::OldTestament, "Jeremiah", "JER", "Jer"),
    ("LAM", Canon::OldTestament, "Lamentations", "LAM", "Lam"),
    ("EZE", Canon::OldTestament, "Ezekiel", "EZK", "Ezek"),
    ("DAN", Canon::OldTestament, "Daniel", "DAN", "Dan"),
    ("HOS", Canon::OldTestament, "Hosea", "HOS", "Hos"),
    ("JOL", Canon::OldTestament, "Joel", "JOL", "Joel"),
    ("AMO", Canon::OldTestament, "Amos", "AMO", "Amos"),
    ("OBA", Canon::OldTestament, "Obadiah", "OBA", "Obad"),
    ("JNA", Canon::OldTestament, "Jonah", "JON", "Jonah"),
    ("MIC", Canon::OldTestament, "Micah", "MIC", "Mic"),
    ("NAH", Canon::OldTestament, "Nahum", "NAM", "Nah"),
    ("HAB", Canon::OldTestament, "Habakkuk", "HAB", "Hab"),
    ("ZEP", Canon::OldTestament, "Zephaniah", "ZEP", "Zeph"),
    ("HAG", Canon::OldTestament, "Haggai", "HAG", "Hag"),
    ("ZEC", Canon::OldTestament, "Zechariah", "ZEC", "Zech"),
    ("MAL", Canon::OldTestament, "Malachi", "MAL", "Mal"),
    ("MAT", Canon::NewTestament, "Matthew", "MAT", "Matt"),
    ("MRK", Canon::NewTestament, "Mark", "MRK", "Mark"),
    ("LUK", Canon::NewTestament, "Luke", "LUK", "Luke"),
    ("JHN", Canon::NewTestament, "John", "JHN", "John"),
    ("ACT", Canon::NewTestament, "Acts", "ACT", "Acts"),
    ("ROM", Canon::NewTestament, "Romans", "ROM", "Rom"),
    ("CO1", Canon::NewTestament, "1 Corinthians", "1CO", "1Cor"),
    ("CO2", Canon::NewTestament, "2 Corinthians", "2CO", "2Cor"),
    ("GAL", Canon::NewTestament, "Galatians", "GAL", "Gal"),
    ("EPH", Canon::NewTestament, "Ephesians", "EPH", "Eph"),
    ("PHP", Canon::NewTestament, "Philippians", "PHP", "Phil"),
    ("COL", Canon::NewTestament, "Colossians", "COL", "Col"),
    ("TH1", Canon::NewTestament, "1 Thessalonians", "1TH", "1Thess"),
    ("TH2", Canon::NewTestament, "2 Thessalonians", "2TH", "2Thess"),
    ("TI1", Canon::NewTestament, "1 Timothy", "1TI", "1Tim"),
    ("TI2", Canon::NewTestament, "2 Timothy", "2TI", "2Tim"),
    ("TIT", Canon::NewTestament, "Titus", "TIT", "Titus"),
    ("PHM", Canon::NewTestament, "Philemon", "PHM", "Phlm"),
    ("HEB", Canon::NewTestament, "Hebrews", "HEB", "Heb"),
    ("JAM", Canon::NewTestament, "James", "JAS", "Jas"),
    ("PE1", Canon::NewTestament, "1 Peter", "1PE", "1Pet"),
    ("PE2", Canon::NewTestament, "2 Peter", "2PE", "2Pet"),
    ("JN1", Canon::NewTestament, "1 John", "1JN", "1John"),
    ("JN2", Canon::NewTestament, "2 John", "2JN", "2John"),
    ("JN3", Canon::NewTestament, "3 John", "3JN", "3John"),
    ("JDE", Canon::NewTestament, "Jude", "JUD", "Jude"),
    ("REV", Canon::NewTestament, "Revelation", "REV", "Rev"),
    ("TOB", Canon::Deuterocanon, "Tobit", "TOB", "Tob"),
    ("JDT", Canon::Deuterocanon, "Judith", "JDT", "Jdt"),
    ("ESG", Canon::Deuterocanon, "Esther (Greek)", "ESG", "AddEsth"),
    ("WIS", Canon::Deuterocanon, "Wisdom of Solomon", "WIS", "Wis"),
    ("SIR", Canon::Deuterocanon, "Sirach", "SIR", "Sir"),
    ("BAR", Canon::Deuterocanon, "Baruch", "BAR", "Bar"),
    ("LJE", Canon::Deuterocanon, "Letter of Jeremiah", "LJE", "EpJer"),
    ("PAZ", Canon::Deuterocanon, "Prayer of Azariah", "S3Y", "PrAzar"),
    ("SUS", Canon::Deuterocanon, "Susanna", "SUS", "Sus"),
    ("BEL", Canon::Deuterocanon, "Bel and the Dragon", "BEL", "Bel"),
    ("MA1", Canon::Deuterocanon, "1 Maccabees", "1MA", "1Macc"),
    ("MA2", Canon::Deuterocanon, "2 Maccabees", "2MA", "2Macc"),
    ("MA3", Canon::Deuterocanon, "3 Maccabees", "3MA", "3Macc"),
    ("MA4", Canon::Deuterocanon, "4 Maccabees", "4MA", "4Macc"),
    ("ES1", Canon::Deuterocanon, "1 Esdras", "1ES", "1Esd"),
    ("ES2", Canon::Deuterocanon, "2 Esdras", "2ES", "2Esd"),
    ("MAN", Canon::Deuterocanon, "Prayer of Manasseh", "MAN", "PrMan"),
    ("PS2", Canon::Deuterocanon, "Psalm 151", "PS2", "AddPs"),
    ("ODE", Canon::Other, "Odes", "ODA", "Odes"),
    ("PSS", Canon::Other, "Psalms of Solomon", "PSS", "PssSol"),
    ("LAO", Canon::Other, "Laodiceans", "LAO", "EpLao"),
];

static STANDARD: LazyLock<BookCodeRegistry> = LazyLock::new(|| {
    let entries = STANDARD_BOOKS
        .iter()
        .zip(1u16..)
        .filter_map(|(&(code, canon, name, usfm, osis), number)| {
            let code = BookCode::parse(code).ok()?;
            Some(BookCodeEntry {
                code,
                reference_number: number,
                canon,
                english_name: name.to_string(),
                usfm: usfm.to_string(),
                osis: osis.to_string(),
            })
        })
        .collect();
    BookCodeRegistry::from_entries(entries)
});

/// The set of valid book codes with their ordering and classification.
///
/// Immutable once built. Use [`BookCodeRegistry::standard`] for the bundled
/// table or [`BookCodeRegistry::from_entries`] to supply another source.
#[derive(Debug)]
pub struct BookCodeRegistry {
    entries: Vec<BookCodeEntry>,
    by_code: HashMap<BookCode, usize>,
    /// Upper-cased USFM/OSIS abbreviations and English names.
    abbreviations: HashMap<String, BookCode>,
    /// Multi-pattern matcher over the raw codes, for guessing codes in text.
    code_matcher: Option<AhoCorasick>,
}

impl BookCodeRegistry {
    /// The bundled registry (protocanonical books first, then the rest).
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Build a registry from externally supplied rows.
    ///
    /// Entries are sorted by reference number. A repeated code keeps its
    /// first row.
    pub fn from_entries(mut entries: Vec<BookCodeEntry>) -> Self {
        entries.sort_by_key(|e| e.reference_number);
        let mut by_code = HashMap::with_capacity(entries.len());
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if by_code.contains_key(&entry.code) {
                tracing::warn!(code = %entry.code, "duplicate book code in registry data");
                continue;
            }
            by_code.insert(entry.code, kept.len());
            kept.push(entry);
        }

        let mut abbreviations = HashMap::new();
        for entry in &kept {
            for key in [&entry.usfm, &entry.osis, &entry.english_name] {
                abbreviations
                    .entry(key.to_uppercase())
                    .or_insert(entry.code);
            }
        }

        let code_matcher = AhoCorasick::new(kept.iter().map(|e| e.code.as_str()))
            .map_err(|e| tracing::warn!(error = %e, "book code matcher unavailable"))
            .ok();

        Self {
            entries: kept,
            by_code,
            abbreviations,
            code_matcher,
        }
    }

    /// Number of known codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the registry has no codes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-sensitive exact check of a code string.
    pub fn is_valid_code(&self, code: &str) -> bool {
        BookCode::parse(code).is_ok_and(|c| self.contains(c))
    }

    /// Returns `true` if the parsed code is registered.
    pub fn contains(&self, code: BookCode) -> bool {
        self.by_code.contains_key(&code)
    }

    /// All codes in reference order.
    pub fn all_codes_in_canonical_order(&self) -> Vec<BookCode> {
        self.entries.iter().map(|e| e.code).collect()
    }

    /// All codes of one canon, in reference order.
    pub fn codes_in_canon(&self, canon: Canon) -> Vec<BookCode> {
        self.entries
            .iter()
            .filter(|e| e.canon == canon)
            .map(|e| e.code)
            .collect()
    }

    /// Full registry row for a code.
    pub fn entry(&self, code: BookCode) -> Option<&BookCodeEntry> {
        self.by_code.get(&code).map(|&i| &self.entries[i])
    }

    /// 1-based reference number for a code.
    pub fn reference_number(&self, code: BookCode) -> Option<u16> {
        self.entry(code).map(|e| e.reference_number)
    }

    /// Canon classification for a code.
    pub fn canon(&self, code: BookCode) -> Option<Canon> {
        self.entry(code).map(|e| e.canon)
    }

    /// Returns `true` if the code is an Old Testament book.
    pub fn is_old_testament(&self, code: BookCode) -> bool {
        self.canon(code) == Some(Canon::OldTestament)
    }

    /// Returns `true` if the code is a New Testament book.
    pub fn is_new_testament(&self, code: BookCode) -> bool {
        self.canon(code) == Some(Canon::NewTestament)
    }

    /// Returns `true` if the code is deuterocanonical.
    pub fn is_deuterocanon(&self, code: BookCode) -> bool {
        self.canon(code) == Some(Canon::Deuterocanon)
    }

    /// Look up a code from its OSIS abbreviation (case-insensitive).
    pub fn code_from_osis(&self, osis: &str) -> Option<BookCode> {
        self.entries
            .iter()
            .find(|e| e.osis.eq_ignore_ascii_case(osis))
            .map(|e| e.code)
    }

    /// Look up a code from its USFM identifier (case-insensitive).
    pub fn code_from_usfm(&self, usfm: &str) -> Option<BookCode> {
        self.entries
            .iter()
            .find(|e| e.usfm.eq_ignore_ascii_case(usfm))
            .map(|e| e.code)
    }

    /// Best-effort conversion of arbitrary text to a code.
    ///
    /// Tries, in order: the text is itself a code; it is a known USFM/OSIS
    /// abbreviation or English name; exactly one registered code occurs
    /// somewhere inside it. English only. Vernacular names belong to
    /// [`crate::names::NamesSystem`].
    pub fn code_from_text(&self, text: &str) -> Option<BookCode> {
        let upper = text.trim().to_uppercase();
        if upper.is_empty() {
            return None;
        }
        if let Ok(code) = BookCode::parse(&upper)
            && self.contains(code)
        {
            return Some(code);
        }
        if let Some(&code) = self.abbreviations.get(&upper) {
            return Some(code);
        }

        let matcher = self.code_matcher.as_ref()?;
        let found: BTreeSet<usize> = matcher
            .find_overlapping_iter(&upper)
            .map(|m| m.pattern().as_usize())
            .collect();
        match found.iter().next() {
            Some(&index) if found.len() == 1 => Some(self.entries[index].code),
            _ => None,
        }
    }

    /// Reorder `books` into reference order, dropping unknown codes.
    pub fn sequence(&self, books: &[BookCode]) -> Vec<BookCode> {
        let mut known: Vec<BookCode> = books.iter().copied().filter(|&c| self.contains(c)).collect();
        known.sort_by_key(|&c| self.reference_number(c));
        known.dedup();
        known
    }

    /// Return the codes in `books` that the registry does not know.
    pub fn unknown_codes<'a, I>(&self, books: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        books
            .into_iter()
            .filter(|code| !self.is_valid_code(code))
            .map(str::to_string)
            .collect()
    }
}

/// A predefined publication book list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BookScope {
    /// Every registered book code.
    All,
    /// Old and New Testament.
    Bible,
    /// Old Testament only.
    Ot,
    /// New Testament only.
    Nt,
    /// Deuterocanonical books only.
    Dc,
}

impl BookScope {
    /// Returns the scope as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Bible => "bible",
            Self::Ot => "ot",
            Self::Nt => "nt",
            Self::Dc => "dc",
        }
    }

    /// The book codes this scope stands for, in reference order.
    pub fn books(self, registry: &BookCodeRegistry) -> Vec<BookCode> {
        match self {
            Self::All => registry.all_codes_in_canonical_order(),
            Self::Bible => {
                let mut books = registry.codes_in_canon(Canon::OldTestament);
                books.extend(registry.codes_in_canon(Canon::NewTestament));
                books
            }
            Self::Ot => registry.codes_in_canon(Canon::OldTestament),
            Self::Nt => registry.codes_in_canon(Canon::NewTestament),
            Self::Dc => registry.codes_in_canon(Canon::Deuterocanon),
        }
    }
}

impl fmt::Display for BookScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
