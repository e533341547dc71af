//! Graph REST gateway.
//!
//! This module provides [`GraphGateway`], the [`Gateway`] implementation
//! that talks to Microsoft Graph over blocking HTTP.
//!
//! # Paging
//!
//! List calls follow `@odata.nextLink` until Graph stops returning one, so
//! callers always see the whole collection.

use crate::cloud::{ApiVersion, Cloud};
use crate::error::{Error, Result};
use declarative::{ConnectionContext, Filter, Gateway, Payload, Query, RemoteObject};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("m365dsc-rs/", env!("CARGO_PKG_VERSION"));

/// Upper bound on pages followed for one list call.
const MAX_PAGES: usize = 1000;

/// Microsoft Graph gateway.
///
/// # Example
///
/// ```no_run
/// use declarative::{AuthMethod, ConnectionContext, Gateway, Query};
/// use graphkit::{ApiVersion, Cloud, GraphGateway};
///
/// let gateway = GraphGateway::new(Cloud::Global, ApiVersion::Beta);
/// let ctx = ConnectionContext::new("contoso.onmicrosoft.com", AuthMethod::AccessToken)
///     .with_access_token("eyJ0eXAi...");
/// let citations = gateway
///     .list(&ctx, "security/labels/citations", &Query::all())
///     .unwrap();
/// println!("Found {} citations", citations.len());
/// ```
pub struct GraphGateway {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Graph root including the version segment.
    base_url: String,
}

impl GraphGateway {
    /// Create a gateway for a cloud and API version.
    #[must_use]
    pub fn new(cloud: Cloud, version: ApiVersion) -> Self {
        Self::with_base_url(format!("{}/{}", cloud.graph_host(), version.segment()))
    }

    /// Create a gateway with a custom API root (for testing).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(100)))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the API root URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL of a collection.
    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection.trim_matches('/'))
    }

    /// Build the URL of one object.
    fn object_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn bearer(ctx: &ConnectionContext) -> Result<String> {
        ctx.access_token()
            .map(|token| format!("Bearer {token}"))
            .ok_or_else(|| Error::MissingToken {
                tenant: ctx.tenant_id.clone(),
            })
    }

    fn list_pages(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<RemoteObject>> {
        let bearer = Self::bearer(ctx)?;
        let mut objects = Vec::new();

        let mut request = self
            .agent
            .get(&self.collection_url(collection))
            .header("Authorization", &bearer)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);
        if let Some(filter) = &query.filter {
            request = request.query("$filter", filter_expression(filter));
        }
        let mut page: ListPage = read_json(request.call()?)?;

        for _ in 0..MAX_PAGES {
            for value in page.value {
                objects.push(to_remote(value)?);
            }
            let Some(next) = page.next_link else {
                log::debug!("listed {} objects from {collection}", objects.len());
                return Ok(objects);
            };
            log::trace!("following {next}");
            let response = self
                .agent
                .get(&next)
                .header("Authorization", &bearer)
                .header("Accept", "application/json")
                .header("User-Agent", USER_AGENT)
                .call()?;
            page = read_json(response)?;
        }

        Err(Error::InvalidResponse(format!(
            "{collection} returned more than {MAX_PAGES} pages"
        )))
    }

    fn post(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        payload: &Payload,
    ) -> Result<RemoteObject> {
        let response = self
            .agent
            .post(&self.collection_url(collection))
            .header("Authorization", &Self::bearer(ctx)?)
            .header("User-Agent", USER_AGENT)
            .send_json(payload)?;
        to_remote(read_json(response)?)
    }

    fn patch(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        id: &str,
        payload: &Payload,
    ) -> Result<()> {
        let response = self
            .agent
            .patch(&self.object_url(collection, id))
            .header("Authorization", &Self::bearer(ctx)?)
            .header("User-Agent", USER_AGENT)
            .send_json(payload)?;
        expect_success(response)
    }

    fn remove(&self, ctx: &ConnectionContext, collection: &str, id: &str) -> Result<()> {
        let response = self
            .agent
            .delete(&self.object_url(collection, id))
            .header("Authorization", &Self::bearer(ctx)?)
            .header("User-Agent", USER_AGENT)
            .call()?;
        expect_success(response)
    }
}

impl Gateway for GraphGateway {
    fn list(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        query: &Query,
    ) -> declarative::Result<Vec<RemoteObject>> {
        Ok(self.list_pages(ctx, collection, query)?)
    }

    fn create(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        payload: &Payload,
    ) -> declarative::Result<RemoteObject> {
        Ok(self.post(ctx, collection, payload)?)
    }

    fn update(
        &self,
        ctx: &ConnectionContext,
        collection: &str,
        id: &str,
        payload: &Payload,
    ) -> declarative::Result<()> {
        Ok(self.patch(ctx, collection, id, payload)?)
    }

    fn delete(&self, ctx: &ConnectionContext, collection: &str, id: &str) -> declarative::Result<()> {
        Ok(self.remove(ctx, collection, id)?)
    }
}

/// Render a filter as an OData `$filter` expression.
///
/// Single quotes inside the value are doubled, as OData string literals
/// require.
pub fn filter_expression(filter: &Filter) -> String {
    match filter {
        Filter::Eq { field, value } => format!("{field} eq '{}'", value.replace('\'', "''")),
    }
}

// =============================================================================
// Response handling
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

fn check_status(response: &mut ureq::http::Response<ureq::Body>) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Err(Error::from_response(status.as_u16(), &body))
}

fn read_json<T: serde::de::DeserializeOwned>(
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<T> {
    check_status(&mut response)?;
    let text = response.body_mut().read_to_string()?;
    Ok(serde_json::from_str(&text)?)
}

fn expect_success(mut response: ureq::http::Response<ureq::Body>) -> Result<()> {
    check_status(&mut response)
}

fn to_remote(value: Value) -> Result<RemoteObject> {
    RemoteObject::from_json(value).map_err(|e| Error::InvalidResponse(e.to_string()))
}
