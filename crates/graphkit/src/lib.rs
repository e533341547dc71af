//! # graphkit
//!
//! Blocking Microsoft Graph gateway for the `declarative` engine.
//!
//! This crate provides:
//! - [`GraphGateway`], a [`declarative::Gateway`] over Graph's REST API
//! - National cloud and API version selection
//! - Translation of Graph error envelopes into the engine's error taxonomy
//!
//! Authentication is out of scope: callers attach a bearer token to the
//! [`declarative::ConnectionContext`] they pass into every call.
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{AuthMethod, ConnectionContext, Engine, LogEvents};
//! use graphkit::{ApiVersion, Cloud, GraphGateway};
//!
//! let gateway = GraphGateway::new(Cloud::Global, ApiVersion::Beta);
//! let engine = Engine::new(&gateway, &LogEvents);
//! let ctx = ConnectionContext::new("contoso.onmicrosoft.com", AuthMethod::AccessToken)
//!     .with_access_token(std::env::var("M365DSC_ACCESS_TOKEN").unwrap());
//! # let _ = (engine, ctx);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod cloud;
pub mod error;

pub use client::{GraphGateway, filter_expression};
pub use cloud::{ApiVersion, Cloud};
pub use error::{Error, ErrorCategory, Result};
