mod cli;
mod commands;
mod config;
mod document;
mod format;
mod progress;
mod resource;
mod ui;

use anyhow::{Context as AnyhowContext, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use resource::ResourceKind;
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// `--config` override
    pub config: Option<String>,
    /// `--tenant` override
    pub tenant: Option<String>,
    pub access_token: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    ResourceKind::check_all().context("Built-in resource schema is inconsistent")?;

    let ctx = Context {
        quiet: cli.quiet,
        config: cli.config,
        tenant: cli.tenant,
        access_token: cli.access_token,
    };

    let result = match cli.command {
        Command::Get(args) => commands::dsc::get(&ctx, args),
        Command::Test(args) => commands::dsc::test(&ctx, args),
        Command::Set(args) => commands::dsc::set(&ctx, args),
        Command::Export(args) => commands::export::run(&ctx, args),
        Command::Resources => commands::resources::run(&ctx),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "m365dsc", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(err) = &result
        && let Some(advice) = commands::advice(err)
    {
        ui::info(advice);
    }
    result
}
