use anyhow::{Context as AnyhowContext, Result};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let (config, path) = Config::load(ctx.config.as_deref())?;

    ui::header("Configuration");
    println!();
    let origin = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    ui::kv("File", &origin);

    ui::section("Connection");
    let tenant = ctx
        .tenant
        .as_deref()
        .or(config.connection.tenant_id.as_deref())
        .unwrap_or("(not set)");
    ui::kv("Tenant", tenant);
    ui::kv("Auth", config.connection.auth.name());
    if let Some(app) = &config.connection.application_id {
        ui::kv("Application", app);
    }
    if config.connection.certificate_thumbprint.is_some() {
        ui::kv("Certificate", "(thumbprint set)");
    }
    if let Some(user) = &config.connection.user {
        ui::kv("User", user);
    }
    let token = if ctx.access_token.is_some() {
        "provided"
    } else {
        "missing"
    };
    ui::kv("Access token", token);

    ui::section("Graph");
    ui::kv("Cloud", config.graph.cloud.name());
    ui::kv("Endpoint", config.graph.cloud.graph_host());
    ui::kv("API version", config.graph.api_version.segment());

    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    let (config, path) = Config::load(ctx.config.as_deref())?;
    config
        .validate()
        .with_context(|| format!("{} is invalid", path.display()))?;

    if path.exists() {
        ui::success(&format!("{} is valid", path.display()));
    } else {
        ui::info(&format!("{} not found; defaults are valid", path.display()));
    }
    if config.connection.tenant_id.is_none() && ctx.tenant.is_none() {
        ui::warn("No tenant configured; pass --tenant to connect");
    }
    Ok(())
}
