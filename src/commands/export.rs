//! `export` - turn existing tenant objects into configuration

use anyhow::{Context as AnyhowContext, Result};
use chrono::Utc;
use declarative::{ConnectionContext, Engine, ExportOutcome, Formatter, Resource};
use std::fs;

use super::{Session, parse_kind};
use crate::Context;
use crate::cli::{ExportArgs, ExportFormat};
use crate::format::{DscFormatter, TomlFormatter, wrap_configuration};
use crate::progress::ExportSpinner;
use crate::resource::{ResourceKind, ResourceVisitor};
use crate::ui;

/// Text and counts for a multi-type export
#[derive(Debug, Default)]
pub struct ExportRun {
    pub text: String,
    pub count: usize,
    pub warnings: Vec<String>,
}

struct ExportKind<'a> {
    engine: Engine<'a>,
    ctx: &'a ConnectionContext,
    formatter: &'a dyn Formatter,
    quiet: bool,
}

impl ResourceVisitor for ExportKind<'_> {
    type Output = ExportOutcome;

    fn visit<R: Resource>(self) -> Self::Output {
        let type_name = R::descriptor().type_name;
        let mut progress = ExportSpinner::new(type_name, self.quiet);
        self.engine
            .export::<R>(self.ctx, self.formatter, &mut progress)
    }
}

/// Export `kinds` in order; text is blocks only, never wrapped
pub fn export_kinds(
    engine: Engine<'_>,
    ctx: &ConnectionContext,
    kinds: &[ResourceKind],
    format: ExportFormat,
    quiet: bool,
) -> ExportRun {
    let formatter: &dyn Formatter = match format {
        ExportFormat::Dsc => &DscFormatter,
        ExportFormat::Toml => &TomlFormatter,
    };

    let mut run = ExportRun::default();
    for kind in kinds {
        let outcome = kind.accept(ExportKind {
            engine,
            ctx,
            formatter,
            quiet,
        });
        log::info!("Exported {} instance(s) of {kind}", outcome.count);
        run.text.push_str(&outcome.text);
        run.count += outcome.count;
        run.warnings.extend(outcome.warning);
    }
    run
}

pub fn run(app: &Context, args: ExportArgs) -> Result<()> {
    let kinds = if args.resources.is_empty() {
        ResourceKind::ALL.to_vec()
    } else {
        args.resources
            .iter()
            .map(|name| parse_kind(name))
            .collect::<Result<Vec<_>>>()?
    };

    let session = Session::connect(app)?;
    let run = export_kinds(session.engine(), &session.ctx, &kinds, args.format, app.quiet);

    for warning in &run.warnings {
        ui::warn(warning);
    }

    let text = match args.format {
        ExportFormat::Dsc => wrap_configuration(&args.name, &session.ctx, &run.text, Utc::now()),
        ExportFormat::Toml => format!(
            "# Exported by m365dsc from {} on {}\n\n{}",
            session.ctx.tenant_id,
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            run.text
        ),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Could not write {}", path.display()))?;
            if !app.quiet {
                ui::success(&format!(
                    "Exported {} to {}",
                    ui::plural(run.count, "resource"),
                    path.display()
                ));
            }
        }
        None => print!("{text}"),
    }
    Ok(())
}
