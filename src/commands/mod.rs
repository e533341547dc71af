// Get / Test / Set against a desired-state document
pub mod dsc;

// Export existing tenant objects
pub mod export;

// Local commands
pub mod config;
pub mod resources;

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{ConnectionContext, Engine, LogEvents};
use graphkit::GraphGateway;

use crate::Context;
use crate::config::Config;
use crate::resource::ResourceKind;

/// A configured gateway plus the connection every call carries
pub struct Session {
    gateway: GraphGateway,
    pub ctx: ConnectionContext,
}

impl Session {
    pub fn connect(app: &Context) -> Result<Self> {
        let (config, path) = Config::load(app.config.as_deref())?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;

        let ctx = config.connection_context(app.tenant.as_deref(), app.access_token.as_deref())?;
        if ctx.access_token().is_none() {
            bail!("No access token (pass --access-token or set M365DSC_ACCESS_TOKEN)");
        }

        let gateway = GraphGateway::new(config.graph.cloud, config.graph.api_version);
        log::info!(
            "Connecting to {} via {} as {}",
            ctx.tenant_id,
            gateway.base_url(),
            config.connection.auth.name()
        );

        Ok(Self { gateway, ctx })
    }

    pub fn engine(&self) -> Engine<'_> {
        Engine::new(&self.gateway, &LogEvents)
    }
}

/// Resolve a `--resource` value
pub fn parse_kind(name: &str) -> Result<ResourceKind> {
    match ResourceKind::from_name(name) {
        Some(kind) => Ok(kind),
        None => {
            let known: Vec<&str> = ResourceKind::ALL.iter().map(|k| k.type_name()).collect();
            bail!(
                "Unknown resource type '{name}'. Supported: {}",
                known.join(", ")
            )
        }
    }
}

/// Advice for the first engine error in an error chain
pub fn advice(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<declarative::Error>())
        .map(|e| e.category().advice())
}
