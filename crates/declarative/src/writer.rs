//! State writer - converges the remote service with one mutation

use crate::context::{ConnectionContext, Event, EventSink, Operation, Severity};
use crate::gateway::{Gateway, Payload};
use crate::planner::{Transition, plan};
use crate::reader::read;
use crate::resource::Resource;
use crate::types::{DesiredState, SetOutcome};
use serde_json::Value;

/// Build the wire payload, tagged with the type discriminator when the
/// collection is shared
pub fn payload<R: Resource>(settings: &R) -> Payload {
    let mut payload = settings.to_payload();
    if let Some(discriminator) = R::descriptor().discriminator {
        payload.insert(
            discriminator.field.to_string(),
            Value::from(discriminator.value),
        );
    }
    payload
}

/// Perform a planned transition.
///
/// Gateway errors are reported to `events` and returned as
/// [`SetOutcome::Failed`]; they never propagate.
pub fn apply<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    desired: &DesiredState<R>,
    transition: &Transition,
) -> SetOutcome {
    let descriptor = R::descriptor();
    let key = desired.key();

    let result = match transition {
        Transition::NoOp => {
            log::debug!("{} '{}' already in desired state", descriptor.type_name, key);
            return SetOutcome::NoChange;
        }
        Transition::Create => gateway
            .create(ctx, descriptor.collection, &payload(desired.settings()))
            .map(|created| {
                log::info!("created {} '{}' ({})", descriptor.type_name, key, created.id);
                SetOutcome::Created
            }),
        Transition::Update { id, .. } => gateway
            .update(ctx, descriptor.collection, id, &payload(desired.settings()))
            .map(|()| {
                log::info!("updated {} '{}' ({id})", descriptor.type_name, key);
                SetOutcome::Updated
            }),
        Transition::Delete { id } => gateway
            .delete(ctx, descriptor.collection, id)
            .map(|()| {
                log::info!("removed {} '{}' ({id})", descriptor.type_name, key);
                SetOutcome::Removed
            }),
    };

    result.unwrap_or_else(|error| {
        events.report(&Event::new(
            Severity::Error,
            Operation::Set,
            descriptor.type_name,
            Some(key),
            format!("{transition} failed: {error}"),
        ));
        SetOutcome::Failed {
            error: error.to_string(),
        }
    })
}

/// Read, plan and apply.
///
/// When the read fails nothing is mutated; the failure has already been
/// reported by the reader.
pub fn set<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    desired: &DesiredState<R>,
) -> SetOutcome {
    let outcome = read::<R>(gateway, events, ctx, desired.key(), Operation::Set);
    match plan(desired, outcome) {
        Ok(transition) => apply(gateway, events, ctx, desired, &transition),
        Err(error) => SetOutcome::Failed {
            error: format!("current state unknown: {error}"),
        },
    }
}
