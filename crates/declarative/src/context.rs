//! Connection context and collaborator traits
//!
//! These traits allow the engine to be used without depending on a
//! particular logging backend, output format or progress UI. The connection
//! context is passed into every operation; the engine never reaches for
//! ambient connection state.

use crate::types::FieldValue;
use std::fmt;
use std::sync::Mutex;

/// How the caller authenticated to the tenant.
///
/// The engine never authenticates itself; this only tells gateways and
/// formatters which connection parameters are in play.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthMethod {
    /// Service principal with a certificate from the local store
    CertificateThumbprint {
        application_id: String,
        thumbprint: String,
    },
    /// Service principal with a client secret
    ApplicationSecret { application_id: String },
    /// Managed identity of the host
    ManagedIdentity,
    /// Interactive or stored user credentials
    Credentials { user: String },
    /// A bearer token obtained elsewhere
    #[default]
    AccessToken,
}

impl AuthMethod {
    /// Connection parameter names an exported block must carry for this method
    pub fn connection_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::CertificateThumbprint { .. } => {
                &["ApplicationId", "TenantId", "CertificateThumbprint"]
            }
            Self::ApplicationSecret { .. } => &["ApplicationId", "TenantId", "ApplicationSecret"],
            Self::ManagedIdentity => &["ManagedIdentity", "TenantId"],
            Self::Credentials { .. } => &["Credential"],
            Self::AccessToken => &["TenantId", "AccessTokens"],
        }
    }
}

/// Read-only connection information supplied by the caller
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionContext {
    /// Tenant domain or id, e.g. `contoso.onmicrosoft.com`
    pub tenant_id: String,
    pub auth: AuthMethod,
    access_token: Option<String>,
}

impl ConnectionContext {
    pub fn new(tenant_id: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            auth,
            access_token: None,
        }
    }

    /// Attach the bearer token gateways should present
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("tenant_id", &self.tenant_id)
            .field("auth", &self.auth)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Engine operation an event originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Test,
    Set,
    Export,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Test => "test",
            Self::Set => "set",
            Self::Export => "export",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A failure the engine absorbed instead of returning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub operation: Operation,
    pub resource_type: String,
    /// Natural key of the instance, when there is one
    pub key: Option<String>,
    pub message: String,
}

impl Event {
    pub fn new(
        severity: Severity,
        operation: Operation,
        resource_type: &str,
        key: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            operation,
            resource_type: resource_type.to_string(),
            key: key.map(String::from),
            message: message.into(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(
                f,
                "{} {} '{}': {}",
                self.operation, self.resource_type, key, self.message
            ),
            None => write!(f, "{} {}: {}", self.operation, self.resource_type, self.message),
        }
    }
}

/// Fire-and-forget receiver of absorbed failures
///
/// Implementations must not fail and must not influence control flow.
pub trait EventSink: Send + Sync {
    fn report(&self, event: &Event);
}

/// Sink forwarding events to the `log` facade
pub struct LogEvents;

impl EventSink for LogEvents {
    fn report(&self, event: &Event) {
        match event.severity {
            Severity::Warning => log::warn!("{event}"),
            Severity::Error => log::error!("{event}"),
        }
    }
}

/// Sink discarding every event
pub struct NoEvents;

impl EventSink for NoEvents {
    fn report(&self, _event: &Event) {}
}

/// Sink keeping events in memory
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<Event>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event reported so far
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingEvents {
    fn report(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Serializes a current state into declarative configuration text
pub trait Formatter {
    /// Format one resource instance.
    ///
    /// `fields` holds every record field plus `Ensure`, unset ones as
    /// [`FieldValue::Null`].
    fn format_block(
        &self,
        resource_type: &str,
        key: &str,
        fields: &[(&'static str, FieldValue)],
        ctx: &ConnectionContext,
    ) -> String;
}

/// Progress callback for export operations
pub trait ExportProgress {
    /// Called once the objects to export are known
    fn on_start(&mut self, resource_type: &str, total: usize);

    /// Called before each object is re-read (`index` is 1-based)
    fn on_object(&mut self, index: usize, key: &str);

    /// Called when the export finishes
    fn on_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ExportProgress for NoProgress {
    fn on_start(&mut self, _resource_type: &str, _total: usize) {}
    fn on_object(&mut self, _index: usize, _key: &str) {}
    fn on_complete(&mut self) {}
}
