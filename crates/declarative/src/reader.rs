//! State reader - looks up the remote object behind a natural key

use crate::context::{ConnectionContext, Event, EventSink, Operation, Severity};
use crate::gateway::{Gateway, Query};
use crate::resource::Resource;
use crate::types::{CurrentState, DesiredState, ReadOutcome, same_text};

/// Read the remote object matching `key`.
///
/// The collection is filtered server-side by the key property, then
/// client-side by discriminator and key. A failed query is reported and
/// returned as [`ReadOutcome::ReadFailed`].
pub fn read<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    key: &str,
    operation: Operation,
) -> ReadOutcome<R> {
    let descriptor = R::descriptor();
    let query = Query::eq(descriptor.key_property, key);

    log::debug!(
        "reading {} '{}' from {}",
        descriptor.type_name,
        key,
        descriptor.collection
    );

    let objects = match gateway.list(ctx, descriptor.collection, &query) {
        Ok(objects) => objects,
        Err(error) => {
            events.report(&Event::new(
                Severity::Error,
                operation,
                descriptor.type_name,
                Some(key),
                format!("read failed: {error}"),
            ));
            return ReadOutcome::ReadFailed { error };
        }
    };

    let mut matching = objects.into_iter().filter(|o| {
        descriptor.discriminator.is_none_or(|d| o.matches(&d))
            && o.str_field(descriptor.key_property)
                .is_some_and(|v| same_text(v, key))
    });

    let Some(object) = matching.next() else {
        log::debug!("{} '{}' not found", descriptor.type_name, key);
        return ReadOutcome::Absent;
    };

    let duplicates = matching.count();
    if duplicates > 0 {
        events.report(&Event::new(
            Severity::Warning,
            operation,
            descriptor.type_name,
            Some(key),
            format!(
                "{} objects share this name, using {}",
                duplicates + 1,
                object.id
            ),
        ));
    }

    match R::from_remote(&object) {
        Ok(settings) => ReadOutcome::Found {
            id: object.id,
            settings,
        },
        Err(error) => {
            events.report(&Event::new(
                Severity::Error,
                operation,
                descriptor.type_name,
                Some(key),
                error.to_string(),
            ));
            ReadOutcome::ReadFailed { error }
        }
    }
}

/// Engine-facing read: failures and absence both yield the Absent echo
pub fn get<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    desired: &DesiredState<R>,
) -> CurrentState<R> {
    read(gateway, events, ctx, desired.key(), Operation::Get).into_current(desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{NoEvents, RecordingEvents};
    use crate::error::Error;
    use crate::gateway::MockGateway;
    use crate::testing::{COLLECTION, EnrollmentLimit, seed_limit, seed_other};
    use crate::types::Ensure;
    use serde_json::json;

    fn ctx() -> ConnectionContext {
        ConnectionContext::default()
    }

    #[test]
    fn test_absent_echoes_input() {
        let gateway = MockGateway::new();
        let mut settings = EnrollmentLimit::new("Demo", 5);
        settings.description = Some("five devices".into());
        let desired = DesiredState::present(settings.clone()).unwrap();

        let current = get(&gateway, &NoEvents, &ctx(), &desired);
        assert_eq!(current.ensure, Ensure::Absent);
        assert_eq!(current.settings, settings);
    }

    #[test]
    fn test_found_maps_fields() {
        let gateway = MockGateway::new();
        seed_limit(&gateway, "Demo", 7);
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();

        let current = get(&gateway, &NoEvents, &ctx(), &desired);
        assert_eq!(current.ensure, Ensure::Present);
        assert_eq!(current.settings.limit, Some(7));
    }

    #[test]
    fn test_discriminator_filters_shared_collection() {
        let gateway = MockGateway::new();
        seed_other(&gateway, "Demo");

        let outcome: ReadOutcome<EnrollmentLimit> =
            read(&gateway, &NoEvents, &ctx(), "Demo", Operation::Get);
        assert!(matches!(outcome, ReadOutcome::Absent));

        let seeded = seed_limit(&gateway, "Demo", 3);
        let outcome: ReadOutcome<EnrollmentLimit> =
            read(&gateway, &NoEvents, &ctx(), "Demo", Operation::Get);
        match outcome {
            ReadOutcome::Found { id, .. } => assert_eq!(id, seeded.id),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_read_failure_is_distinct_then_collapsed() {
        let gateway = MockGateway::new();
        seed_limit(&gateway, "Demo", 5);
        gateway.fail_list_with(|| Error::Transport {
            message: "connection reset".into(),
        });
        let events = RecordingEvents::new();

        let outcome: ReadOutcome<EnrollmentLimit> =
            read(&gateway, &events, &ctx(), "Demo", Operation::Get);
        assert!(outcome.is_failed());
        assert_eq!(events.events().len(), 1);

        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();
        let current = get(&gateway, &events, &ctx(), &desired);
        assert_eq!(current.ensure, Ensure::Absent);
    }

    #[test]
    fn test_key_match_folds_non_ascii_case() {
        let gateway = MockGateway::new();
        let seeded = seed_limit(&gateway, "Ärzte", 3);

        let outcome: ReadOutcome<EnrollmentLimit> =
            read(&gateway, &NoEvents, &ctx(), "ärzte", Operation::Get);
        match outcome {
            ReadOutcome::Found { id, .. } => assert_eq!(id, seeded.id),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_warn_and_use_first() {
        let gateway = MockGateway::new();
        let first = seed_limit(&gateway, "Demo", 1);
        seed_limit(&gateway, "Demo", 2);
        let events = RecordingEvents::new();

        let outcome: ReadOutcome<EnrollmentLimit> =
            read(&gateway, &events, &ctx(), "Demo", Operation::Get);
        match outcome {
            ReadOutcome::Found { id, settings } => {
                assert_eq!(id, first.id);
                assert_eq!(settings.limit, Some(1));
            }
            other => panic!("expected Found, got {other:?}"),
        }
        assert_eq!(events.events().len(), 1);
        assert_eq!(events.events()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unmappable_object_is_read_failure() {
        let gateway = MockGateway::new();
        gateway.seed(
            COLLECTION,
            json!({
                "@odata.type": crate::testing::LIMIT_TYPE,
                "displayName": "Demo",
                "limit": "five",
            }),
        );
        let events = RecordingEvents::new();

        let outcome: ReadOutcome<EnrollmentLimit> =
            read(&gateway, &events, &ctx(), "Demo", Operation::Get);
        assert!(outcome.is_failed());
        assert_eq!(events.events()[0].severity, Severity::Error);
    }

    #[test]
    fn test_query_uses_key_property() {
        let gateway = MockGateway::new();
        let _: ReadOutcome<EnrollmentLimit> =
            read(&gateway, &NoEvents, &ctx(), "Demo", Operation::Get);
        let calls = gateway.calls();
        assert_eq!(
            calls[0],
            crate::gateway::GatewayCall::List {
                collection: COLLECTION.to_string(),
                filter: Some(crate::gateway::Filter::Eq {
                    field: "displayName".into(),
                    value: "Demo".into(),
                }),
            }
        );
    }
}
