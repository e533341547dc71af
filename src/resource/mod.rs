//! Resource types managed by m365dsc
//!
//! Each resource is a typed record plus its const descriptor; the engine does
//! the rest. [`ResourceKind`] is the registry the CLI works through:
//! - Name lookup for desired-state documents and `--resource` flags
//! - Visitor dispatch so commands stay generic over `R: Resource`

use declarative::{Error, Payload, RemoteObject, Resource, ResourceDescriptor};
use serde_json::Value;
use std::fmt;

pub mod enrollment_limit;
pub mod file_plan_citation;
pub mod windows_hello;

pub use enrollment_limit::EnrollmentLimitRestriction;
pub use file_plan_citation::FilePlanPropertyCitation;
pub use windows_hello::WindowsHelloForBusiness;

/// Every supported resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    EnrollmentLimit,
    WindowsHello,
    FilePlanCitation,
}

/// Operation run for one resource type, with the type as a parameter
pub trait ResourceVisitor {
    type Output;

    fn visit<R: Resource>(self) -> Self::Output;
}

impl ResourceKind {
    pub const ALL: &'static [ResourceKind] = &[
        Self::EnrollmentLimit,
        Self::WindowsHello,
        Self::FilePlanCitation,
    ];

    pub fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            Self::EnrollmentLimit => EnrollmentLimitRestriction::descriptor(),
            Self::WindowsHello => WindowsHelloForBusiness::descriptor(),
            Self::FilePlanCitation => FilePlanPropertyCitation::descriptor(),
        }
    }

    /// DSC resource name
    pub fn type_name(self) -> &'static str {
        self.descriptor().type_name
    }

    /// Look up a kind by DSC resource name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.type_name().eq_ignore_ascii_case(name))
    }

    /// Run `visitor` with this kind's record type
    pub fn accept<V: ResourceVisitor>(self, visitor: V) -> V::Output {
        match self {
            Self::EnrollmentLimit => visitor.visit::<EnrollmentLimitRestriction>(),
            Self::WindowsHello => visitor.visit::<WindowsHelloForBusiness>(),
            Self::FilePlanCitation => visitor.visit::<FilePlanPropertyCitation>(),
        }
    }

    /// Check every descriptor is internally consistent
    pub fn check_all() -> declarative::Result<()> {
        for kind in Self::ALL {
            kind.descriptor().check()?;
        }
        Ok(())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// ============================================================================
// Mapping helpers shared by the resource types
// ============================================================================

/// An optional remote property, rejecting values of the wrong JSON type
fn optional<T>(
    object: &RemoteObject,
    descriptor: &ResourceDescriptor,
    property: &str,
    extract: impl Fn(&Value) -> Option<T>,
) -> declarative::Result<Option<T>> {
    match object.properties.get(property) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => extract(value).map(Some).ok_or_else(|| {
            Error::mapping(
                descriptor.type_name,
                format!("object {} has malformed {property}: {value}", object.id),
            )
        }),
    }
}

fn optional_str(
    object: &RemoteObject,
    descriptor: &ResourceDescriptor,
    property: &str,
) -> declarative::Result<Option<String>> {
    optional(object, descriptor, property, |v| v.as_str().map(String::from))
}

fn optional_i64(
    object: &RemoteObject,
    descriptor: &ResourceDescriptor,
    property: &str,
) -> declarative::Result<Option<i64>> {
    optional(object, descriptor, property, Value::as_i64)
}

fn optional_bool(
    object: &RemoteObject,
    descriptor: &ResourceDescriptor,
    property: &str,
) -> declarative::Result<Option<bool>> {
    optional(object, descriptor, property, Value::as_bool)
}

/// Insert a property when the record sets it
fn put<T: Into<Value>>(payload: &mut Payload, property: &str, value: Option<T>) {
    if let Some(value) = value {
        payload.insert(property.to_string(), value.into());
    }
}
