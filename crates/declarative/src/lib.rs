//! # Declarative
//!
//! A desired state reconciliation engine for remote management APIs.
//!
//! Every resource type is driven through the same four operations: read the
//! current state, test it for drift, converge it with a single mutation and
//! export every existing instance as configuration text.
//!
//! ## Core Concepts
//!
//! - **Resource**: a typed record plus a const [`ResourceDescriptor`]
//! - **DesiredState**: a validated record and its `Ensure` value
//! - **Gateway**: the list/create/update/delete surface of the remote service
//! - **Engine**: Get/Test/Set/Export over one gateway
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ConnectionContext, DesiredState, Engine, LogEvents, MockGateway};
//!
//! let gateway = MockGateway::new();
//! let engine = Engine::new(&gateway, &LogEvents);
//! let ctx = ConnectionContext::default();
//!
//! let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5))?;
//! if !engine.test(&desired, &ctx) {
//!     engine.set(&desired, &ctx);
//! }
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`Gateway`]: talks to the remote service
//! - [`EventSink`]: receives failures the engine absorbs
//! - [`Formatter`]: renders exported state as configuration text
//! - [`ExportProgress`]: receives export progress updates
//!
//! This allows the crate to be used without hard dependencies on a
//! particular HTTP client, logging backend or output format.

pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod export;
pub mod gateway;
pub mod planner;
pub mod reader;
pub mod resource;
pub mod schema;
pub mod types;
pub mod writer;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{
    AuthMethod, ConnectionContext, Event, EventSink, ExportProgress, Formatter, LogEvents,
    NoEvents, NoProgress, Operation, RecordingEvents, Severity,
};
pub use diff::{DriftReport, FieldDrift};
pub use engine::Engine;
pub use error::{Error, ErrorCategory, Result};
pub use export::ExportOutcome;
pub use gateway::{Filter, Gateway, GatewayCall, MockGateway, Payload, Query, RemoteObject};
pub use planner::Transition;
pub use resource::Resource;
pub use schema::{
    CONNECTION_FIELDS, Constraint, Discriminator, FieldKind, FieldRole, FieldSpec,
    ResourceDescriptor,
};
pub use types::{
    ApplySummary, CurrentState, DesiredState, Ensure, FieldValue, ReadOutcome, SetOutcome,
    same_text,
};
