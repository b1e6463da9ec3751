//! Data-quality diagnostics for name systems.
//!
//! Nothing here ever fails a load. Problems are collected as
//! [`ValidationIssue`] values and emitted as tracing events so whatever
//! subscriber the caller installed sees them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How thorough validation should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ValidationMode {
    /// Only checks that affect lookups; warnings are logged at debug level.
    #[default]
    Lenient,
    /// Adds cross-record and cross-system checks; warnings are logged as warnings.
    Strict,
}

impl ValidationMode {
    /// Returns the mode as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or informational.
    Warning,
    /// The data almost certainly yields a wrong or missing lookup entry.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// What kind of problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// A book code that is well-formed but not registered.
    UnknownBookCode,
    /// Text where a book code was expected that is not shaped like one.
    MalformedBookCode,
    /// A compulsory field is absent or blank.
    MissingField,
    /// An optional input field is blank.
    BlankField,
    /// Two records share the same key.
    DuplicateRecord,
    /// A division lists the same book twice.
    DuplicateIncludedBook,
    /// An input field repeats one already implied for the record.
    SuperfluousInput,
    /// A leader lists the same alternate twice.
    DuplicateLeaderForm,
    /// The same value is used by two different records.
    RepeatedValue,
    /// The system's language code looks wrong.
    LanguageCode,
    /// Two systems carry identical data.
    IdenticalSystem,
    /// A book has no names in this system.
    MissingBookNames,
    /// The system's data file could not be parsed.
    UnreadableData,
}

impl IssueKind {
    /// Kinds only reported in [`ValidationMode::Strict`].
    pub const fn is_strict_only(&self) -> bool {
        matches!(self, Self::BlankField | Self::RepeatedValue | Self::IdenticalSystem)
    }
}

/// One diagnostic about a name system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Error or warning.
    pub severity: Severity,
    /// Category.
    pub kind: IssueKind,
    /// The record the issue is about, e.g. `book GEN` or `division OT`.
    pub subject: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Create an error-severity issue.
    pub fn error(kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create a warning-severity issue.
    pub fn warning(kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the issue should be reported in `mode`.
    pub const fn applies_in(&self, mode: ValidationMode) -> bool {
        matches!(mode, ValidationMode::Strict) || !self.kind.is_strict_only()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.subject, self.message)
    }
}

/// Emit issues as tracing events.
///
/// Errors are always `error!`. Warnings are `warn!` in strict mode and
/// `debug!` in lenient mode.
pub fn report(system: &str, issues: &[ValidationIssue], mode: ValidationMode) {
    for issue in issues {
        match (issue.severity, mode) {
            (Severity::Error, _) => tracing::error!(
                system,
                kind = ?issue.kind,
                subject = %issue.subject,
                "{}",
                issue.message
            ),
            (Severity::Warning, ValidationMode::Strict) => tracing::warn!(
                system,
                kind = ?issue.kind,
                subject = %issue.subject,
                "{}",
                issue.message
            ),
            (Severity::Warning, ValidationMode::Lenient) => tracing::debug!(
                system,
                kind = ?issue.kind,
                subject = %issue.subject,
                "{}",
                issue.message
            ),
        }
    }
}

/// Count issues by severity: `(errors, warnings)`.
pub fn tally(issues: &[ValidationIssue]) -> (usize, usize) {
    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    (errors, issues.len() - errors)
}

/// Check a language code's shape: three lowercase ASCII letters.
///
/// Only the format is checked; there is no ISO 639-3 table lookup.
pub fn check_language_code(system: &str, code: &str) -> Option<ValidationIssue> {
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    Some(ValidationIssue::warning(
        IssueKind::LanguageCode,
        format!("system {system}"),
        format!("{code:?} is not a three-letter ISO 639-3 language code"),
    ))
}

/// Flag values shared by more than one owner.
///
/// `values` yields `(owner, value)` pairs; comparison is case-insensitive.
/// `what` names the field in the message (e.g. "default name").
pub fn repeated_values<'a, I>(what: &str, values: I) -> Vec<ValidationIssue>
where
    I: IntoIterator<Item = (String, &'a str)>,
{
    let mut owners: HashMap<String, Vec<String>> = HashMap::new();
    let mut order = Vec::new();
    for (owner, value) in values {
        let key = value.to_uppercase();
        let entry = owners.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if !entry.contains(&owner) {
            entry.push(owner);
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let list = owners.get(&key)?;
            (list.len() > 1).then(|| {
                ValidationIssue::warning(
                    IssueKind::RepeatedValue,
                    list.join(", "),
                    format!("{what} {key:?} is shared by {} records", list.len()),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_only_kinds_hidden_in_lenient_mode() {
        let blank = ValidationIssue::warning(IssueKind::BlankField, "book GEN", "blank");
        let superfluous = ValidationIssue::warning(IssueKind::SuperfluousInput, "book GEN", "dup");
        assert!(!blank.applies_in(ValidationMode::Lenient));
        assert!(blank.applies_in(ValidationMode::Strict));
        assert!(superfluous.applies_in(ValidationMode::Lenient));
    }

    #[test]
    fn language_code_format() {
        assert!(check_language_code("eng_traditional", "eng").is_none());
        assert!(check_language_code("x", "en").is_some());
        assert!(check_language_code("x", "ENG").is_some());
        assert!(check_language_code("x", "e1g").is_some());
    }

    #[test]
    fn repeated_values_are_case_insensitive() {
        let issues = repeated_values(
            "abbreviation",
            [
                ("book JDG".to_string(), "Jdg"),
                ("book JDE".to_string(), "JDG"),
                ("book GEN".to_string(), "Gen"),
            ],
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::RepeatedValue);
        assert_eq!(issues[0].subject, "book JDG, book JDE");
    }

    #[test]
    fn same_owner_twice_is_not_repeated() {
        let issues = repeated_values(
            "input",
            [("book GEN".to_string(), "Gen"), ("book GEN".to_string(), "gen")],
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn tally_counts_by_severity() {
        let issues = vec![
            ValidationIssue::error(IssueKind::MissingField, "a", "x"),
            ValidationIssue::warning(IssueKind::SuperfluousInput, "b", "y"),
            ValidationIssue::warning(IssueKind::SuperfluousInput, "c", "z"),
        ];
        assert_eq!(tally(&issues), (1, 2));
    }

    #[test]
    fn display_includes_severity_and_subject() {
        let issue = ValidationIssue::error(IssueKind::UnknownBookCode, "division OT", "unrecognised book code XXX");
        assert_eq!(issue.to_string(), "error: division OT: unrecognised book code XXX");
    }

    #[test]
    fn mode_deserializes_lowercase() {
        let mode: ValidationMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode, ValidationMode::Strict);
        assert_eq!(ValidationMode::default(), ValidationMode::Lenient);
    }
}
