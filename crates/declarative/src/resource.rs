//! Resource trait: the per-type configuration of the generic engine
//!
//! A resource type is a typed record plus the mapping between that record
//! and the remote service's JSON. Everything else (reading, comparing,
//! writing, exporting) is done once by the engine for every type.

use crate::error::Result;
use crate::gateway::{Payload, RemoteObject};
use crate::schema::ResourceDescriptor;
use crate::types::FieldValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// Core trait for reconcilable resource types
///
/// # Example
///
/// ```ignore
/// use declarative::{FieldSpec, FieldValue, Payload, RemoteObject, Resource, ResourceDescriptor};
///
/// #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct Citation {
///     name: String,
///     citation_url: Option<String>,
/// }
///
/// impl Resource for Citation {
///     fn descriptor() -> &'static ResourceDescriptor { &CITATION }
///     fn natural_key(&self) -> &str { &self.name }
///     fn with_natural_key(key: &str) -> Self {
///         Self { name: key.to_string(), citation_url: None }
///     }
///     fn field_values(&self) -> Vec<(&'static str, FieldValue)> {
///         vec![
///             ("Name", self.name.as_str().into()),
///             ("CitationUrl", self.citation_url.clone().into()),
///         ]
///     }
///     fn from_remote(object: &RemoteObject) -> declarative::Result<Self> {
///         Ok(Self {
///             name: object.required_str(Self::descriptor(), "displayName")?.to_string(),
///             citation_url: object.str_field("citationUrl").map(String::from),
///         })
///     }
///     fn to_payload(&self) -> Payload {
///         let mut payload = Payload::new();
///         payload.insert("displayName".into(), self.name.clone().into());
///         payload
///     }
/// }
/// ```
pub trait Resource:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Schema of this resource type
    fn descriptor() -> &'static ResourceDescriptor;

    /// Value of the natural key field
    fn natural_key(&self) -> &str;

    /// A record carrying only the natural key, every other field unset
    fn with_natural_key(key: &str) -> Self;

    /// Every declared field with its value, `FieldValue::Null` when unset
    fn field_values(&self) -> Vec<(&'static str, FieldValue)>;

    /// Map a remote object into the record
    fn from_remote(object: &RemoteObject) -> Result<Self>;

    /// Remote JSON body for create/update.
    ///
    /// Unset fields are left out so that an update only touches what the
    /// caller asked for. The discriminator is added by the writer.
    fn to_payload(&self) -> Payload;

    /// Cross-field validation beyond per-field constraints
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
