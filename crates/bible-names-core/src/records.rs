//! Name-system records.
//!
//! A name system (e.g. `eng_traditional`) is stored as a [`NameSystemFile`]
//! with `divisions`, `leaders` and `books` arrays. Files are parsed leniently:
//! compulsory fields are optional at the serde level so that a missing value
//! becomes a [`ValidationIssue`] rather than a failed load. The raw rows are
//! then turned into the typed [`DivisionRecord`], [`BookNameRecord`] and
//! [`LeaderRecord`] that the expander consumes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::codes::{BookCode, BookCodeRegistry};
use crate::validation::{IssueKind, ValidationIssue};

/// Optional metadata at the top of a name-system file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct SystemHeader {
    /// Human-readable title of the system.
    pub title: Option<String>,
    /// Data version string.
    pub version: Option<String>,
    /// Date the data was last revised.
    pub date: Option<String>,
    /// ISO 639-3 language code, if it differs from the system-name prefix.
    pub language: Option<String>,
}

/// A division row as written in a data file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct DivisionEntry {
    /// Unique key of the division within the system (e.g. `OT`).
    pub standard_abbreviation: Option<String>,
    /// Full name, e.g. "Old Testament".
    pub default_name: Option<String>,
    /// Usual short form, e.g. "OT".
    pub default_abbreviation: Option<String>,
    /// Book codes that belong to the division, in order.
    pub included_books: Vec<String>,
    /// Additional curated spellings a user might type.
    pub inputs: Vec<String>,
}

/// A book-name leader row as written in a data file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct LeaderEntry {
    /// The leader word as it appears in default names (e.g. `1` or `Saint`).
    pub standard: Option<String>,
    /// Alternate renderings of the leader (e.g. `I`, `First`).
    pub alternates: Vec<String>,
}

/// A book-name row as written in a data file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct BookNameEntry {
    /// The reference book code (e.g. `GEN`).
    pub code: Option<String>,
    /// Full vernacular name.
    pub default_name: Option<String>,
    /// Usual vernacular abbreviation.
    pub default_abbreviation: Option<String>,
    /// Additional curated spellings a user might type.
    pub inputs: Vec<String>,
}

/// The on-disk shape of one name system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct NameSystemFile {
    /// File metadata.
    pub header: SystemHeader,
    /// Division rows.
    pub divisions: Vec<DivisionEntry>,
    /// Leader rows.
    pub leaders: Vec<LeaderEntry>,
    /// Book-name rows.
    pub books: Vec<BookNameEntry>,
}

/// JSON schema for name-system data files.
pub fn name_system_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(NameSystemFile)).unwrap_or_default()
}

/// A named grouping of books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionRecord {
    /// Unique key within the system.
    pub key: String,
    /// Full name.
    pub default_name: String,
    /// Usual short form.
    pub default_abbreviation: String,
    /// Member books, in order, without duplicates.
    pub included_books: Vec<BookCode>,
    /// Everything a user might type for this division, starting with the
    /// default name.
    pub input_fields: Vec<String>,
}

/// Vernacular names for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookNameRecord {
    /// The book.
    pub code: BookCode,
    /// Full name.
    pub default_name: String,
    /// Usual abbreviation.
    pub default_abbreviation: String,
    /// Everything a user might type for this book, starting with the
    /// default name.
    pub input_fields: Vec<String>,
}

impl BookNameRecord {
    /// Stand-in record for a book the system has no names for.
    pub fn placeholder(code: BookCode) -> Self {
        Self {
            code,
            default_name: code.to_string(),
            default_abbreviation: code.to_string(),
            input_fields: vec![code.to_string()],
        }
    }
}

/// A leader word and its alternate renderings.
///
/// Both the leader and its alternates carry one trailing space so that a
/// leader never matches a whole name on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderRecord {
    /// The standard leader, e.g. `"1 "`.
    pub leader: String,
    /// Alternates, e.g. `["I ", "First "]`.
    pub alternates: Vec<String>,
}

/// Returns the trimmed value if it is present and non-blank.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Append curated extras to `fields`, flagging duplicates and blanks.
fn push_extras(
    fields: &mut Vec<String>,
    extras: &[String],
    subject: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for extra in extras {
        let extra = extra.trim();
        if extra.is_empty() {
            issues.push(ValidationIssue::warning(
                IssueKind::BlankField,
                subject,
                "blank input field ignored",
            ));
        } else if fields.iter().any(|f| f == extra) {
            issues.push(ValidationIssue::warning(
                IssueKind::SuperfluousInput,
                subject,
                format!("superfluous input field {extra:?}"),
            ));
        } else {
            fields.push(extra.to_string());
        }
    }
}

/// Parse a book code from data, reporting malformed and unregistered codes.
fn checked_code(
    text: &str,
    subject: &str,
    registry: &BookCodeRegistry,
    issues: &mut Vec<ValidationIssue>,
) -> Option<BookCode> {
    let Ok(code) = BookCode::parse(text) else {
        issues.push(ValidationIssue::error(
            IssueKind::MalformedBookCode,
            subject,
            format!("{text:?} is not a three-character book code"),
        ));
        return None;
    };
    if !registry.contains(code) {
        issues.push(ValidationIssue::error(
            IssueKind::UnknownBookCode,
            subject,
            format!("unrecognised book code {code}"),
        ));
        return None;
    }
    Some(code)
}

impl DivisionRecord {
    /// Build a division from a data row, or `None` if it is unusable.
    pub fn from_entry(
        entry: &DivisionEntry,
        index: usize,
        registry: &BookCodeRegistry,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Self> {
        let Some(key) = present(entry.standard_abbreviation.as_ref()) else {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                format!("division #{}", index + 1),
                "missing standard_abbreviation",
            ));
            return None;
        };
        let subject = format!("division {key}");
        let Some(default_name) = present(entry.default_name.as_ref()) else {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                &subject,
                "missing default_name",
            ));
            return None;
        };
        let default_abbreviation = present(entry.default_abbreviation.as_ref()).unwrap_or_else(|| {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                &subject,
                "missing default_abbreviation",
            ));
            default_name
        });

        let mut included_books = Vec::with_capacity(entry.included_books.len());
        for text in &entry.included_books {
            let Some(code) = checked_code(text.trim(), &subject, registry, issues) else {
                continue;
            };
            if included_books.contains(&code) {
                issues.push(ValidationIssue::error(
                    IssueKind::DuplicateIncludedBook,
                    &subject,
                    format!("{code} is listed more than once"),
                ));
            } else {
                included_books.push(code);
            }
        }
        if entry.included_books.is_empty() {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                &subject,
                "missing included_books",
            ));
        }

        let mut input_fields = vec![default_name.to_string()];
        if !default_name.starts_with(default_abbreviation) {
            input_fields.push(default_abbreviation.to_string());
        }
        push_extras(&mut input_fields, &entry.inputs, &subject, issues);

        Some(Self {
            key: key.to_string(),
            default_name: default_name.to_string(),
            default_abbreviation: default_abbreviation.to_string(),
            included_books,
            input_fields,
        })
    }
}

impl BookNameRecord {
    /// Build a book record from a data row, or `None` if it is unusable.
    pub fn from_entry(
        entry: &BookNameEntry,
        index: usize,
        registry: &BookCodeRegistry,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Self> {
        let Some(text) = present(entry.code.as_ref()) else {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                format!("book #{}", index + 1),
                "missing code",
            ));
            return None;
        };
        let code = checked_code(text, &format!("book #{}", index + 1), registry, issues)?;
        let subject = format!("book {code}");
        let Some(default_name) = present(entry.default_name.as_ref()) else {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                &subject,
                "missing default_name",
            ));
            return None;
        };
        let default_abbreviation = present(entry.default_abbreviation.as_ref()).unwrap_or_else(|| {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                &subject,
                "missing default_abbreviation",
            ));
            default_name
        });

        let mut input_fields = vec![default_name.to_string()];
        if default_abbreviation != default_name {
            input_fields.push(default_abbreviation.to_string());
        }
        push_extras(&mut input_fields, &entry.inputs, &subject, issues);

        Some(Self {
            code,
            default_name: default_name.to_string(),
            default_abbreviation: default_abbreviation.to_string(),
            input_fields,
        })
    }
}

impl LeaderRecord {
    /// Build a leader from a data row, or `None` if it has no standard form.
    pub fn from_entry(
        entry: &LeaderEntry,
        index: usize,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Self> {
        let Some(standard) = present(entry.standard.as_ref()) else {
            issues.push(ValidationIssue::error(
                IssueKind::MissingField,
                format!("leader #{}", index + 1),
                "missing standard leader",
            ));
            return None;
        };
        let leader = format!("{standard} ");
        let subject = format!("leader {standard:?}");

        let mut alternates: Vec<String> = Vec::with_capacity(entry.alternates.len());
        for alternate in &entry.alternates {
            let alternate = alternate.trim();
            if alternate.is_empty() {
                issues.push(ValidationIssue::warning(
                    IssueKind::BlankField,
                    &subject,
                    "blank alternate ignored",
                ));
                continue;
            }
            let alternate = format!("{alternate} ");
            if alternate == leader || alternates.contains(&alternate) {
                issues.push(ValidationIssue::warning(
                    IssueKind::DuplicateLeaderForm,
                    &subject,
                    format!("duplicate alternate {:?}", alternate.trim_end()),
                ));
            } else {
                alternates.push(alternate);
            }
        }

        Some(Self { leader, alternates })
    }
}
