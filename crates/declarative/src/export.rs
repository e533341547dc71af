//! Exporter - turns every remote instance of a type into configuration text

use crate::context::{
    ConnectionContext, Event, EventSink, ExportProgress, Formatter, Operation, Severity,
};
use crate::error::Result;
use crate::gateway::{Gateway, Query, RemoteObject};
use crate::reader::read;
use crate::resource::Resource;
use crate::types::{CurrentState, DesiredState, ReadOutcome};

/// Result of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Concatenated configuration blocks, empty when enumeration failed
    pub text: String,
    /// Number of blocks in `text`
    pub count: usize,
    /// User-facing warning when enumeration was refused by the tenant
    pub warning: Option<String>,
}

/// Every object in the collection that carries this type's discriminator
fn enumerate<R: Resource>(
    gateway: &dyn Gateway,
    ctx: &ConnectionContext,
) -> Result<Vec<RemoteObject>> {
    let descriptor = R::descriptor();
    let objects = gateway.list(ctx, descriptor.collection, &Query::all())?;
    Ok(objects
        .into_iter()
        .filter(|o| descriptor.discriminator.is_none_or(|d| o.matches(&d)))
        .collect())
}

/// Enumerate the type and re-read each instance by its natural key.
///
/// Instances that cannot be re-read are reported and skipped. An
/// enumeration failure is returned as-is.
pub fn export_states<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    progress: &mut dyn ExportProgress,
) -> Result<Vec<CurrentState<R>>> {
    let descriptor = R::descriptor();
    let objects = enumerate::<R>(gateway, ctx)?;
    log::debug!("found {} {} instances", objects.len(), descriptor.type_name);

    progress.on_start(descriptor.type_name, objects.len());
    let mut states = Vec::with_capacity(objects.len());

    for (index, object) in objects.iter().enumerate() {
        let Some(key) = object.str_field(descriptor.key_property) else {
            events.report(&Event::new(
                Severity::Warning,
                Operation::Export,
                descriptor.type_name,
                None,
                format!("object {} has no {}, skipped", object.id, descriptor.key_property),
            ));
            continue;
        };
        progress.on_object(index + 1, key);

        if let Err(error) = DesiredState::<R>::present_with_key(key) {
            events.report(&Event::new(
                Severity::Warning,
                Operation::Export,
                descriptor.type_name,
                Some(key),
                format!("skipped: {error}"),
            ));
            continue;
        }

        match read::<R>(gateway, events, ctx, key, Operation::Export) {
            ReadOutcome::Found { id, settings } if id == object.id => {
                states.push(CurrentState::present(settings));
            }
            // the name resolves to another object; export this one as enumerated
            ReadOutcome::Found { id, .. } => match R::from_remote(object) {
                Ok(settings) => {
                    events.report(&Event::new(
                        Severity::Warning,
                        Operation::Export,
                        descriptor.type_name,
                        Some(key),
                        format!(
                            "object {} shares its name with {id}; the exported block is ambiguous",
                            object.id
                        ),
                    ));
                    states.push(CurrentState::present(settings));
                }
                Err(error) => events.report(&Event::new(
                    Severity::Error,
                    Operation::Export,
                    descriptor.type_name,
                    Some(key),
                    error.to_string(),
                )),
            },
            ReadOutcome::Absent => events.report(&Event::new(
                Severity::Warning,
                Operation::Export,
                descriptor.type_name,
                Some(key),
                "removed while exporting, skipped",
            )),
            // already reported by the reader
            ReadOutcome::ReadFailed { .. } => {}
        }
    }

    progress.on_complete();
    Ok(states)
}

/// Export every instance of the type as configuration text.
///
/// Enumeration failures never propagate: an authorization refusal becomes
/// a warning, anything else an error event, and in both cases the text is
/// empty rather than partial.
pub fn export<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    formatter: &dyn Formatter,
    progress: &mut dyn ExportProgress,
) -> ExportOutcome {
    let descriptor = R::descriptor();

    let states = match export_states::<R>(gateway, events, ctx, progress) {
        Ok(states) => states,
        Err(error) if error.is_authorization() => {
            let warning = format!("tenant is not licensed for {}", descriptor.type_name);
            events.report(&Event::new(
                Severity::Warning,
                Operation::Export,
                descriptor.type_name,
                None,
                format!("{warning}: {error}"),
            ));
            return ExportOutcome {
                warning: Some(warning),
                ..ExportOutcome::default()
            };
        }
        Err(error) => {
            events.report(&Event::new(
                Severity::Error,
                Operation::Export,
                descriptor.type_name,
                None,
                format!("enumeration failed: {error}"),
            ));
            return ExportOutcome::default();
        }
    };

    let text: String = states
        .iter()
        .map(|state| {
            formatter.format_block(descriptor.type_name, state.key(), &state.field_values(), ctx)
        })
        .collect();

    ExportOutcome {
        text,
        count: states.len(),
        warning: None,
    }
}
