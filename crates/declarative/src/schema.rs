//! Resource schema: field declarations, constraints and comparison roles
//!
//! Descriptors are plain `const` data so that each resource type can declare
//! its schema next to its record type:
//!
//! ```
//! use declarative::schema::{Discriminator, FieldSpec, ResourceDescriptor};
//!
//! const FIELDS: &[FieldSpec] = &[
//!     FieldSpec::key("DisplayName"),
//!     FieldSpec::integer("Limit").range(1, 15),
//! ];
//!
//! const DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
//!     type_name: "IntuneDeviceEnrollmentLimitRestriction",
//!     collection: "deviceManagement/deviceEnrollmentConfigurations",
//!     key_property: "displayName",
//!     discriminator: Some(Discriminator::odata_type(
//!         "#microsoft.graph.deviceEnrollmentLimitConfiguration",
//!     )),
//!     fields: FIELDS,
//! };
//!
//! assert!(DESCRIPTOR.check().is_ok());
//! ```

use crate::error::{Error, Result};
use crate::types::FieldValue;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

/// Connection and authentication parameters.
///
/// These never take part in drift comparison and never reach a payload.
pub const CONNECTION_FIELDS: &[&str] = &[
    "Credential",
    "ApplicationId",
    "TenantId",
    "ApplicationSecret",
    "CertificateThumbprint",
    "CertificatePath",
    "CertificatePassword",
    "ManagedIdentity",
    "AccessTokens",
];

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    StringList,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::StringList => "string[]",
        };
        f.write_str(name)
    }
}

/// How a field takes part in reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Natural key; identifies the remote object
    Key,
    /// Ordinary setting, compared and sent in payloads
    Setting,
    /// Reported by reads only
    ReadOnly,
}

/// Constraint on a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Inclusive integer range
    Range { min: i64, max: i64 },
    /// One of a fixed set of strings (case-insensitive)
    OneOf(&'static [&'static str]),
    /// Regular expression the whole string must match
    Pattern(&'static str),
    /// String must not be blank
    NonEmpty,
}

impl Constraint {
    fn applies_to(&self, kind: FieldKind) -> bool {
        match self {
            Self::Range { .. } => kind == FieldKind::Integer,
            Self::OneOf(_) | Self::Pattern(_) | Self::NonEmpty => kind == FieldKind::String,
        }
    }
}

/// Declaration of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub role: FieldRole,
    pub constraint: Option<Constraint>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            role: FieldRole::Setting,
            constraint: None,
        }
    }

    /// The natural key: a non-empty string
    pub const fn key(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            role: FieldRole::Key,
            constraint: Some(Constraint::NonEmpty),
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub const fn string_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.constraint = Some(Constraint::Range { min, max });
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.constraint = Some(Constraint::OneOf(values));
        self
    }

    pub const fn pattern(mut self, pattern: &'static str) -> Self {
        self.constraint = Some(Constraint::Pattern(pattern));
        self
    }

    pub const fn read_only(mut self) -> Self {
        self.role = FieldRole::ReadOnly;
        self
    }

    pub fn is_comparable(&self) -> bool {
        matches!(self.role, FieldRole::Key | FieldRole::Setting)
    }
}

/// Type tag separating resource kinds that share one remote collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discriminator {
    pub field: &'static str,
    pub value: &'static str,
}

impl Discriminator {
    /// Graph's `@odata.type` discriminator
    pub const fn odata_type(value: &'static str) -> Self {
        Self {
            field: "@odata.type",
            value,
        }
    }
}

/// Everything the engine needs to know about a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// DSC resource name, e.g. `IntuneDeviceEnrollmentLimitRestriction`
    pub type_name: &'static str,
    /// Remote collection path relative to the API root
    pub collection: &'static str,
    /// Remote property holding the natural key, used for server-side filtering
    pub key_property: &'static str,
    /// Set when the collection is shared with other resource types
    pub discriminator: Option<Discriminator>,
    pub fields: &'static [FieldSpec],
}

impl ResourceDescriptor {
    /// Look up a field declaration by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The natural key declaration
    pub fn key_field(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.role == FieldRole::Key)
    }

    /// Names of fields that take part in drift comparison
    pub fn comparable_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.is_comparable())
            .map(|f| f.name)
    }

    /// Whether a field is left out of comparison and payloads
    pub fn is_excluded(&self, name: &str) -> bool {
        if CONNECTION_FIELDS.contains(&name) {
            return true;
        }
        self.field(name)
            .is_some_and(|f| f.role == FieldRole::ReadOnly)
    }

    /// Check the descriptor is internally consistent
    pub fn check(&self) -> Result<()> {
        let keys: Vec<&FieldSpec> = self
            .fields
            .iter()
            .filter(|f| f.role == FieldRole::Key)
            .collect();
        match keys.as_slice() {
            [key] if key.kind == FieldKind::String => {}
            [_] => return Err(self.broken("natural key must be a string field")),
            [] => return Err(self.broken("no natural key declared")),
            _ => return Err(self.broken("more than one natural key declared")),
        }

        let mut seen = HashSet::new();
        for field in self.fields {
            if !seen.insert(field.name) {
                return Err(self.broken(format!("field {} declared twice", field.name)));
            }
            if field.name == "Ensure" || CONNECTION_FIELDS.contains(&field.name) {
                return Err(self.broken(format!("field name {} is reserved", field.name)));
            }
            let Some(constraint) = field.constraint else {
                continue;
            };
            if !constraint.applies_to(field.kind) {
                return Err(self.broken(format!(
                    "constraint on {} does not apply to {} fields",
                    field.name, field.kind
                )));
            }
            match constraint {
                Constraint::Range { min, max } if min > max => {
                    return Err(self.broken(format!("empty range on {}", field.name)));
                }
                Constraint::Pattern(pattern) => {
                    Regex::new(pattern).map_err(|e| {
                        self.broken(format!("bad pattern on {}: {e}", field.name))
                    })?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Validate supplied values against the declared kinds and constraints.
    ///
    /// Null values mean "not supplied" and are accepted for everything but the
    /// natural key.
    pub fn validate(&self, values: &[(&str, FieldValue)]) -> Result<()> {
        let key = self
            .key_field()
            .ok_or_else(|| self.broken("no natural key declared"))?;
        if !values.iter().any(|(name, _)| *name == key.name) {
            return Err(Error::validation(self.type_name, key.name, "is required"));
        }

        for (name, value) in values {
            let spec = self.field(name).ok_or_else(|| {
                Error::validation(self.type_name, *name, "is not a field of this resource")
            })?;
            self.validate_value(spec, value)?;
        }

        Ok(())
    }

    fn validate_value(&self, spec: &FieldSpec, value: &FieldValue) -> Result<()> {
        let reject = |reason: String| Error::validation(self.type_name, spec.name, reason);

        let Some(kind) = value.kind() else {
            if spec.role == FieldRole::Key {
                return Err(reject("is required".to_string()));
            }
            return Ok(());
        };
        if kind != spec.kind {
            return Err(reject(format!("expected {}, got {kind}", spec.kind)));
        }

        match (spec.constraint, value) {
            (Some(Constraint::Range { min, max }), FieldValue::Integer(i)) => {
                if *i < min || *i > max {
                    return Err(reject(format!("{i} is outside {min}..={max}")));
                }
            }
            (Some(Constraint::OneOf(allowed)), FieldValue::String(s)) => {
                if !allowed.iter().any(|a| a.eq_ignore_ascii_case(s)) {
                    return Err(reject(format!(
                        "\"{s}\" must be one of: {}",
                        allowed.join(", ")
                    )));
                }
            }
            (Some(Constraint::Pattern(pattern)), FieldValue::String(s)) => {
                let re = Regex::new(pattern)
                    .map_err(|e| self.broken(format!("bad pattern on {}: {e}", spec.name)))?;
                if !re.is_match(s) {
                    return Err(reject(format!("\"{s}\" does not match {pattern}")));
                }
            }
            (Some(Constraint::NonEmpty), FieldValue::String(s)) => {
                if s.trim().is_empty() {
                    return Err(reject("must not be empty".to_string()));
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn broken(&self, message: impl Into<String>) -> Error {
        Error::descriptor(self.type_name, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::key("DisplayName"),
        FieldSpec::string("Description"),
        FieldSpec::integer("Limit").range(1, 15),
        FieldSpec::string("State").one_of(&["enabled", "disabled"]),
        FieldSpec::string("Url").pattern(r"^https?://\S+$"),
        FieldSpec::string("Id").read_only(),
    ];

    const DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
        type_name: "TestResource",
        collection: "tests",
        key_property: "displayName",
        discriminator: None,
        fields: FIELDS,
    };

    fn values(limit: i64) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("Limit", FieldValue::Integer(limit)),
        ]
    }

    #[test]
    fn test_descriptor_check_ok() {
        assert!(DESCRIPTOR.check().is_ok());
    }

    #[test]
    fn test_range_boundaries() {
        assert!(DESCRIPTOR.validate(&values(1)).is_ok());
        assert!(DESCRIPTOR.validate(&values(15)).is_ok());

        let err = DESCRIPTOR.validate(&values(0)).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "Limit"));
        assert!(DESCRIPTOR.validate(&values(16)).is_err());
    }

    #[test]
    fn test_key_required_and_non_empty() {
        let missing = vec![("Limit", FieldValue::Integer(3))];
        assert!(DESCRIPTOR.validate(&missing).is_err());

        let blank = vec![("DisplayName", FieldValue::from("  "))];
        assert!(DESCRIPTOR.validate(&blank).is_err());

        let null = vec![("DisplayName", FieldValue::Null)];
        assert!(DESCRIPTOR.validate(&null).is_err());
    }

    #[test]
    fn test_null_settings_are_skipped() {
        let v = vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("Limit", FieldValue::Null),
        ];
        assert!(DESCRIPTOR.validate(&v).is_ok());
    }

    #[test]
    fn test_kind_mismatch() {
        let v = vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("Limit", FieldValue::from("five")),
        ];
        let err = DESCRIPTOR.validate(&v).unwrap_err();
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_one_of_ignores_case() {
        let ok = vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("State", FieldValue::from("Enabled")),
        ];
        assert!(DESCRIPTOR.validate(&ok).is_ok());

        let bad = vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("State", FieldValue::from("maybe")),
        ];
        assert!(DESCRIPTOR.validate(&bad).is_err());
    }

    #[test]
    fn test_pattern() {
        let ok = vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("Url", FieldValue::from("https://contoso.com/law")),
        ];
        assert!(DESCRIPTOR.validate(&ok).is_ok());

        let bad = vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("Url", FieldValue::from("contoso dot com")),
        ];
        assert!(DESCRIPTOR.validate(&bad).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let v = vec![
            ("DisplayName", FieldValue::from("Demo")),
            ("Colour", FieldValue::from("blue")),
        ];
        assert!(DESCRIPTOR.validate(&v).is_err());
    }

    #[test]
    fn test_exclusions() {
        assert!(DESCRIPTOR.is_excluded("TenantId"));
        assert!(DESCRIPTOR.is_excluded("CertificateThumbprint"));
        assert!(DESCRIPTOR.is_excluded("Id"));
        assert!(!DESCRIPTOR.is_excluded("Limit"));

        let comparable: Vec<_> = DESCRIPTOR.comparable_fields().collect();
        assert!(comparable.contains(&"DisplayName"));
        assert!(!comparable.contains(&"Id"));
    }

    #[test]
    fn test_check_rejects_broken_descriptors() {
        const NO_KEY: ResourceDescriptor = ResourceDescriptor {
            fields: &[FieldSpec::string("Description")],
            ..DESCRIPTOR
        };
        assert!(NO_KEY.check().is_err());

        const RESERVED: ResourceDescriptor = ResourceDescriptor {
            fields: &[FieldSpec::key("DisplayName"), FieldSpec::string("TenantId")],
            ..DESCRIPTOR
        };
        assert!(RESERVED.check().is_err());

        const DUPLICATE: ResourceDescriptor = ResourceDescriptor {
            fields: &[FieldSpec::key("DisplayName"), FieldSpec::string("DisplayName")],
            ..DESCRIPTOR
        };
        assert!(DUPLICATE.check().is_err());

        const WRONG_CONSTRAINT: ResourceDescriptor = ResourceDescriptor {
            fields: &[
                FieldSpec::key("DisplayName"),
                FieldSpec::boolean("Flag").range(0, 1),
            ],
            ..DESCRIPTOR
        };
        assert!(WRONG_CONSTRAINT.check().is_err());
    }
}
