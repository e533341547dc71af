//! Desired-state documents
//!
//! A document is a TOML file of `[[resource]]` tables:
//!
//! ```toml
//! [[resource]]
//! type = "IntuneDeviceEnrollmentLimitRestriction"
//! Ensure = "Present"
//! DisplayName = "Demo"
//! Limit = 5
//! ```
//!
//! Connection parameters (`TenantId`, `ApplicationId`, ...) are accepted and
//! ignored so that documents written for PowerShell DSC still load; the
//! connection always comes from the config file and command line.

use declarative::{CONNECTION_FIELDS, DesiredState, Ensure, Resource, same_text};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resource::ResourceKind;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{origin} is not valid TOML: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("resource #{index}: missing `type`")]
    MissingType { index: usize },

    #[error("resource #{index}: unknown resource type '{name}'")]
    UnknownType { index: usize, name: String },

    #[error("resource #{index}: Ensure must be Present or Absent, got '{value}'")]
    InvalidEnsure { index: usize, value: String },

    #[error("resource #{index} ({resource}): {source}")]
    Fields {
        index: usize,
        resource: &'static str,
        source: toml::de::Error,
    },

    #[error("resource #{index}: {source}")]
    Invalid {
        index: usize,
        source: declarative::Error,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    resource: Vec<toml::Table>,
}

/// A parsed desired-state document
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub entries: Vec<Entry>,
}

/// One `[[resource]]` table, its type resolved
#[derive(Debug, Clone)]
pub struct Entry {
    /// 1-based position in the document
    pub index: usize,
    pub kind: ResourceKind,
    pub ensure: Ensure,
    fields: toml::Table,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse document text; `origin` names it in errors
    pub fn parse(content: &str, origin: &str) -> Result<Self, DocumentError> {
        let raw: RawDocument = toml::from_str(content).map_err(|source| DocumentError::Parse {
            origin: origin.to_string(),
            source,
        })?;

        let entries = raw
            .resource
            .into_iter()
            .enumerate()
            .map(|(i, table)| Entry::from_table(i + 1, table))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    /// Entries matching an optional type and natural key
    pub fn select(&self, kind: Option<ResourceKind>, key: Option<&str>) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .filter(|e| key.is_none_or(|k| e.key().is_some_and(|ek| same_text(ek, k))))
            .collect()
    }
}

impl Entry {
    fn from_table(index: usize, mut table: toml::Table) -> Result<Self, DocumentError> {
        let name = match table.remove("type") {
            Some(toml::Value::String(name)) => name,
            _ => return Err(DocumentError::MissingType { index }),
        };
        let kind = ResourceKind::from_name(&name)
            .ok_or(DocumentError::UnknownType { index, name })?;

        let ensure = match table.remove("Ensure") {
            None => Ensure::Present,
            Some(value) => value
                .as_str()
                .and_then(Ensure::parse)
                .ok_or_else(|| DocumentError::InvalidEnsure {
                    index,
                    value: value.to_string(),
                })?,
        };

        for field in CONNECTION_FIELDS {
            if table.remove(*field).is_some() {
                log::debug!("resource #{index}: ignoring connection parameter {field}");
            }
        }

        Ok(Self {
            index,
            kind,
            ensure,
            fields: table,
        })
    }

    /// Natural key as written in the document
    pub fn key(&self) -> Option<&str> {
        let key = self.kind.descriptor().key_field()?;
        self.fields.get(key.name).and_then(toml::Value::as_str)
    }

    /// Build the validated desired state for this entry's record type
    pub fn desired<R: Resource>(&self) -> Result<DesiredState<R>, DocumentError> {
        let settings: R = toml::Value::Table(self.fields.clone())
            .try_into()
            .map_err(|source| DocumentError::Fields {
                index: self.index,
                resource: R::descriptor().type_name,
                source,
            })?;
        DesiredState::new(self.ensure, settings).map_err(|source| DocumentError::Invalid {
            index: self.index,
            source,
        })
    }
}
