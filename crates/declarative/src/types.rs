//! Core types for desired state reconciliation

use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::schema::FieldKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a resource instance should exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ensure {
    /// The remote object exists
    #[default]
    Present,
    /// The remote object does not exist
    Absent,
}

impl Ensure {
    /// The DSC spelling of this value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }

    /// Parse a DSC `Ensure` value (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("present") {
            Some(Self::Present)
        } else if value.eq_ignore_ascii_case("absent") {
            Some(Self::Absent)
        } else {
            None
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive text equality used for natural keys and drift
pub fn same_text(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// A single field value as seen by the comparator and formatters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Not supplied / not set remotely
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    StringList(Vec<String>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Kind of this value, `None` for [`FieldValue::Null`]
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(FieldKind::Boolean),
            Self::Integer(_) => Some(FieldKind::Integer),
            Self::String(_) => Some(FieldKind::String),
            Self::StringList(_) => Some(FieldKind::StringList),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Drift equality.
    ///
    /// Strings compare case-insensitively and string lists compare as sets,
    /// matching how DSC configurations have always been evaluated.
    pub fn matches(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => same_text(a, b),
            (Self::StringList(a), Self::StringList(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut left: Vec<String> = a.iter().map(|s| s.to_lowercase()).collect();
                let mut right: Vec<String> = b.iter().map(|s| s.to_lowercase()).collect();
                left.sort();
                right.sort();
                left == right
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("(not set)"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::StringList(items) => {
                let quoted: Vec<String> = items.iter().map(|s| format!("\"{s}\"")).collect();
                write!(f, "[{}]", quoted.join(", "))
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// The state a caller wants a resource instance to be in.
///
/// Only constructible through [`DesiredState::new`], so every value reaching
/// the engine has already passed schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredState<R> {
    ensure: Ensure,
    settings: R,
}

impl<R: Resource> DesiredState<R> {
    /// Validate `settings` against the resource schema and build the state
    pub fn new(ensure: Ensure, settings: R) -> Result<Self> {
        let descriptor = R::descriptor();
        descriptor.validate(&settings.field_values())?;
        settings.validate()?;
        Ok(Self { ensure, settings })
    }

    pub fn present(settings: R) -> Result<Self> {
        Self::new(Ensure::Present, settings)
    }

    pub fn absent(settings: R) -> Result<Self> {
        Self::new(Ensure::Absent, settings)
    }

    /// Synthetic state carrying only the natural key, used by the exporter
    pub fn present_with_key(key: &str) -> Result<Self> {
        Self::present(R::with_natural_key(key))
    }

    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    pub fn settings(&self) -> &R {
        &self.settings
    }

    pub fn key(&self) -> &str {
        self.settings.natural_key()
    }

    /// Record fields followed by `Ensure`
    pub fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        with_ensure(self.settings.field_values(), self.ensure)
    }
}

/// The state the remote service is in, as reported by the reader
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentState<R> {
    pub ensure: Ensure,
    pub settings: R,
}

impl<R: Resource> CurrentState<R> {
    /// A remote object was found and mapped
    pub fn present(settings: R) -> Self {
        Self {
            ensure: Ensure::Present,
            settings,
        }
    }

    /// Nothing was found; the caller's input is echoed back
    pub fn absent_echo(desired: &DesiredState<R>) -> Self {
        Self {
            ensure: Ensure::Absent,
            settings: desired.settings().clone(),
        }
    }

    pub fn key(&self) -> &str {
        self.settings.natural_key()
    }

    /// Record fields followed by `Ensure`
    pub fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
        with_ensure(self.settings.field_values(), self.ensure)
    }
}

fn with_ensure(
    mut fields: Vec<(&'static str, FieldValue)>,
    ensure: Ensure,
) -> Vec<(&'static str, FieldValue)> {
    fields.push(("Ensure", FieldValue::String(ensure.as_str().to_string())));
    fields
}

/// Outcome of a read, before it is collapsed for the engine-facing `get`
#[derive(Debug)]
pub enum ReadOutcome<R> {
    /// Exactly one (or the first of several) matching objects
    Found { id: String, settings: R },
    /// No matching object
    Absent,
    /// The read itself failed; absence is unknown
    ReadFailed { error: Error },
}

impl<R: Resource> ReadOutcome<R> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::ReadFailed { .. })
    }

    /// Collapse into the engine-facing current state.
    ///
    /// A failed read is indistinguishable from absence after this call.
    pub fn into_current(self, desired: &DesiredState<R>) -> CurrentState<R> {
        match self {
            Self::Found { settings, .. } => CurrentState::present(settings),
            Self::Absent | Self::ReadFailed { .. } => CurrentState::absent_echo(desired),
        }
    }
}

/// Result of a set operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOutcome {
    /// Already in the desired state
    NoChange,
    /// Remote object was created
    Created,
    /// Remote object was updated
    Updated,
    /// Remote object was deleted
    Removed,
    /// The gateway call failed; reported to the event sink
    Failed { error: String },
}

impl SetOutcome {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Removed)
    }
}

/// Summary of several set operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ApplySummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.removed
    }

    /// Check if every operation succeeded
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.failed + self.no_change
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ApplySummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.removed += other.removed;
        self.failed += other.failed;
        self.no_change += other.no_change;
    }

    /// Add an outcome to the summary
    pub fn add(&mut self, outcome: &SetOutcome) {
        match outcome {
            SetOutcome::NoChange => self.no_change += 1,
            SetOutcome::Created => self.created += 1,
            SetOutcome::Updated => self.updated += 1,
            SetOutcome::Removed => self.removed += 1,
            SetOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_parse() {
        assert_eq!(Ensure::parse("Present"), Some(Ensure::Present));
        assert_eq!(Ensure::parse("absent"), Some(Ensure::Absent));
        assert_eq!(Ensure::parse("gone"), None);
        assert_eq!(Ensure::default(), Ensure::Present);
    }

    #[test]
    fn test_string_matches_ignore_case() {
        let a = FieldValue::from("Contoso Limit");
        let b = FieldValue::from("contoso limit");
        assert!(a.matches(&b));
        assert!(!a.matches(&FieldValue::from("other")));
    }

    #[test]
    fn test_string_list_matches_as_set() {
        let a = FieldValue::from(vec!["b".to_string(), "A".to_string()]);
        let b = FieldValue::from(vec!["a".to_string(), "B".to_string()]);
        assert!(a.matches(&b));

        let shorter = FieldValue::from(vec!["a".to_string()]);
        assert!(!a.matches(&shorter));
    }

    #[test]
    fn test_kinds_do_not_cross_match() {
        assert!(!FieldValue::Integer(1).matches(&FieldValue::Bool(true)));
        assert!(!FieldValue::from("5").matches(&FieldValue::Integer(5)));
        assert!(FieldValue::Null.matches(&FieldValue::Null));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(FieldValue::from(None::<u32>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(5u32)), FieldValue::Integer(5));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::from("Demo").to_string(), "\"Demo\"");
        assert_eq!(FieldValue::Integer(5).to_string(), "5");
        assert_eq!(FieldValue::Null.to_string(), "(not set)");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ApplySummary::default();
        summary.add(&SetOutcome::Created);
        summary.add(&SetOutcome::NoChange);
        summary.add(&SetOutcome::Failed {
            error: "boom".into(),
        });

        assert_eq!(summary.total_changes(), 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_success());

        let mut other = ApplySummary::default();
        other.add(&SetOutcome::Removed);
        summary.merge(&other);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.total_changes(), 2);
    }

    #[test]
    fn test_set_outcome_flags() {
        assert!(SetOutcome::Updated.is_change());
        assert!(!SetOutcome::NoChange.is_change());
        assert!(
            !SetOutcome::Failed {
                error: String::new()
            }
            .is_success()
        );
    }
}
