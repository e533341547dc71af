//! `resources` - list supported resource types and their schemas

use anyhow::Result;
use colored::Colorize;
use declarative::{Constraint, FieldRole, FieldSpec};

use crate::Context;
use crate::resource::ResourceKind;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("Supported Resources");

    for kind in ResourceKind::ALL {
        let descriptor = kind.descriptor();
        ui::section(descriptor.type_name);
        ui::kv("Collection", descriptor.collection);
        if let Some(discriminator) = &descriptor.discriminator {
            ui::kv(discriminator.field, discriminator.value);
        }

        if ctx.quiet {
            continue;
        }
        for field in descriptor.fields {
            println!("    {:<30} {}", field.name, describe(field).dimmed());
        }
    }
    Ok(())
}

/// One-line summary of a field: kind, role and constraint
fn describe(field: &FieldSpec) -> String {
    let mut parts = vec![field.kind.to_string()];
    match field.role {
        FieldRole::Key => parts.push("key".to_string()),
        FieldRole::ReadOnly => parts.push("read-only".to_string()),
        FieldRole::Setting => {}
    }
    match field.constraint {
        Some(Constraint::Range { min, max }) => parts.push(format!("{min}..={max}")),
        Some(Constraint::OneOf(values)) => parts.push(values.join("|")),
        Some(Constraint::Pattern(pattern)) => parts.push(format!("/{pattern}/")),
        Some(Constraint::NonEmpty) | None => {}
    }
    parts.join(", ")
}
