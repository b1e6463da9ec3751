//! Verse reference keys.
//!
//! The internal form is `BBB_C:V`, optionally followed by `!` and either a
//! suffix letter (`SA2_12:9!b`) or an index into the verse (`GEN_1:1!12`).
//! OSIS references (`Gen.1.1`, `2Sam.12.9b`) are accepted on input.
//!
//! Chapter 0 and verse 0 are allowed for introductions and titles; no other
//! versification checking happens here.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codes::{BookCode, BookCodeRegistry};
use crate::error::{ReferenceError, ReferenceResult};

static VERSE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z0-9]{3})_([0-9]{1,3}):([0-9]{1,3})(?:!([a-f]|[0-9]{1,3}))?$").expect("valid regex")
});

static OSIS_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([1-5]?[A-Za-z]{2,8})\.([0-9]{1,3})\.([0-9]{1,3})([a-f])?$").expect("valid regex")
});

static VERSE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z0-9]{3})_([0-9]{1,3}):([0-9]{1,3})-([0-9]{1,3})$").expect("valid regex")
});

/// What follows the `!` in a verse key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerseSuffix {
    /// A part of the verse, `a` to `f`.
    Letter(char),
    /// A character index into the verse text.
    Index(u16),
}

impl fmt::Display for VerseSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter(c) => write!(f, "{c}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// One verse (or part of one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerseKey {
    book: BookCode,
    chapter: u16,
    verse: u16,
    suffix: Option<VerseSuffix>,
}

fn number(text: &str, reference: &str) -> ReferenceResult<u16> {
    text.parse()
        .map_err(|_| ReferenceError::Unparseable(reference.to_string()))
}

fn registered(code: &str, registry: &BookCodeRegistry) -> ReferenceResult<BookCode> {
    BookCode::parse(code)
        .ok()
        .filter(|&c| registry.contains(c))
        .ok_or_else(|| ReferenceError::UnknownBook(code.to_string()))
}

impl VerseKey {
    /// A key with no suffix.
    pub const fn new(book: BookCode, chapter: u16, verse: u16) -> Self {
        Self {
            book,
            chapter,
            verse,
            suffix: None,
        }
    }

    /// The same key with `suffix` attached.
    #[must_use]
    pub const fn with_suffix(mut self, suffix: VerseSuffix) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Parse `BBB_C:V[!s|!n]` against the standard registry.
    pub fn parse(text: &str) -> ReferenceResult<Self> {
        Self::parse_with(text, BookCodeRegistry::standard())
    }

    /// Parse `BBB_C:V[!s|!n]`, checking the book against `registry`.
    pub fn parse_with(text: &str, registry: &BookCodeRegistry) -> ReferenceResult<Self> {
        let caps = VERSE_KEY
            .captures(text.trim())
            .ok_or_else(|| ReferenceError::Unparseable(text.to_string()))?;
        let book = registered(&caps[1], registry)?;
        let chapter = number(&caps[2], text)?;
        let verse = number(&caps[3], text)?;
        let suffix = match caps.get(4).map(|m| m.as_str()) {
            None => None,
            Some(s) => match s.parse::<u16>() {
                Ok(index) => Some(VerseSuffix::Index(index)),
                Err(_) => s.chars().next().map(VerseSuffix::Letter),
            },
        };
        Ok(Self {
            book,
            chapter,
            verse,
            suffix,
        })
    }

    /// Parse an OSIS reference such as `Gen.1.1` or `2Sam.12.9b`.
    pub fn parse_osis(text: &str, registry: &BookCodeRegistry) -> ReferenceResult<Self> {
        let caps = OSIS_KEY
            .captures(text.trim())
            .ok_or_else(|| ReferenceError::Unparseable(text.to_string()))?;
        let book = registry
            .code_from_osis(&caps[1])
            .ok_or_else(|| ReferenceError::UnknownBook(caps[1].to_string()))?;
        let mut key = Self::new(book, number(&caps[2], text)?, number(&caps[3], text)?);
        if let Some(letter) = caps.get(4).and_then(|m| m.as_str().chars().next()) {
            key.suffix = Some(VerseSuffix::Letter(letter));
        }
        Ok(key)
    }

    /// Book code.
    pub const fn book(&self) -> BookCode {
        self.book
    }

    /// Chapter number.
    pub const fn chapter(&self) -> u16 {
        self.chapter
    }

    /// Verse number.
    pub const fn verse(&self) -> u16 {
        self.verse
    }

    /// Suffix letter or index, if any.
    pub const fn suffix(&self) -> Option<VerseSuffix> {
        self.suffix
    }

    /// Render as OSIS. Indexes have no OSIS form and are dropped.
    pub fn to_osis(&self, registry: &BookCodeRegistry) -> Option<String> {
        let osis = &registry.entry(self.book)?.osis;
        let letter = match self.suffix {
            Some(VerseSuffix::Letter(c)) => c.to_string(),
            _ => String::new(),
        };
        Some(format!("{osis}.{}.{}{letter}", self.chapter, self.verse))
    }

    /// Compare in reading order according to `registry`.
    ///
    /// Books the registry doesn't know sort after all known books.
    pub fn cmp_in(&self, other: &Self, registry: &BookCodeRegistry) -> Ordering {
        let rank = |code| registry.reference_number(code).unwrap_or(u16::MAX);
        rank(self.book)
            .cmp(&rank(other.book))
            .then_with(|| self.book.cmp(&other.book))
            .then_with(|| self.chapter.cmp(&other.chapter))
            .then_with(|| self.verse.cmp(&other.verse))
            .then_with(|| self.suffix.cmp(&other.suffix))
    }
}

impl Ord for VerseKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_in(other, BookCodeRegistry::standard())
    }
}

impl PartialOrd for VerseKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}:{}", self.book, self.chapter, self.verse)?;
        if let Some(suffix) = self.suffix {
            write!(f, "!{suffix}")?;
        }
        Ok(())
    }
}

impl FromStr for VerseKey {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VerseKey {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VerseKey> for String {
    fn from(key: VerseKey) -> Self {
        key.to_string()
    }
}

/// A run of verses within one chapter, `BBB_C:V-V2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerseRange {
    start: VerseKey,
    end_verse: u16,
}

impl VerseRange {
    /// Build a range, rejecting one that ends before it starts.
    pub fn new(start: VerseKey, end_verse: u16) -> ReferenceResult<Self> {
        if end_verse < start.verse {
            return Err(ReferenceError::BackwardsRange(format!("{start}-{end_verse}")));
        }
        Ok(Self {
            start: VerseKey { suffix: None, ..start },
            end_verse,
        })
    }

    /// Parse `BBB_C:V-V2` against the standard registry.
    pub fn parse(text: &str) -> ReferenceResult<Self> {
        Self::parse_with(text, BookCodeRegistry::standard())
    }

    /// Parse `BBB_C:V-V2`, checking the book against `registry`.
    pub fn parse_with(text: &str, registry: &BookCodeRegistry) -> ReferenceResult<Self> {
        let caps = VERSE_RANGE
            .captures(text.trim())
            .ok_or_else(|| ReferenceError::Unparseable(text.to_string()))?;
        let book = registered(&caps[1], registry)?;
        let start = VerseKey::new(book, number(&caps[2], text)?, number(&caps[3], text)?);
        let end_verse = number(&caps[4], text)?;
        Self::new(start, end_verse).map_err(|_| ReferenceError::BackwardsRange(text.to_string()))
    }

    /// First verse.
    pub const fn start(&self) -> VerseKey {
        self.start
    }

    /// Last verse.
    pub const fn end(&self) -> VerseKey {
        VerseKey::new(self.start.book, self.start.chapter, self.end_verse)
    }

    /// Number of verses covered.
    pub const fn len(&self) -> usize {
        (self.end_verse - self.start.verse) as usize + 1
    }

    /// Always `false`; a range covers at least one verse.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `key` falls inside the range, whatever its suffix.
    pub fn contains(&self, key: &VerseKey) -> bool {
        key.book == self.start.book
            && key.chapter == self.start.chapter
            && (self.start.verse..=self.end_verse).contains(&key.verse)
    }

    /// Every verse in the range, in order.
    pub fn verses(&self) -> impl Iterator<Item = VerseKey> + '_ {
        (self.start.verse..=self.end_verse)
            .map(|v| VerseKey::new(self.start.book, self.start.chapter, v))
    }
}

impl fmt::Display for VerseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end_verse)
    }
}

impl FromStr for VerseRange {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
