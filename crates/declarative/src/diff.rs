//! Drift comparison between desired and current state

use crate::context::{ConnectionContext, EventSink, Operation};
use crate::gateway::Gateway;
use crate::reader::read;
use crate::resource::Resource;
use crate::types::{CurrentState, DesiredState, Ensure, FieldValue};
use serde::Serialize;

/// A compared field whose current value differs from the desired one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDrift {
    pub field: &'static str,
    pub desired: FieldValue,
    pub current: FieldValue,
}

/// Result of testing one resource instance
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    /// Type of the resource
    pub resource_type: String,
    /// Natural key of the instance
    pub key: String,
    pub desired: Ensure,
    pub current: Ensure,
    /// Compared fields that differ, `Ensure` included
    pub drifted: Vec<FieldDrift>,
    /// The current state could not be read
    pub read_failed: bool,
}

impl DriftReport {
    /// True iff every compared field matches and the read succeeded
    pub fn in_desired_state(&self) -> bool {
        !self.read_failed && self.drifted.is_empty()
    }

    /// Check if this drift represents a missing object
    pub fn is_addition(&self) -> bool {
        self.desired == Ensure::Present && self.current == Ensure::Absent
    }

    /// Check if this drift represents an object that should not exist
    pub fn is_removal(&self) -> bool {
        self.desired == Ensure::Absent && self.current == Ensure::Present
    }

    /// Check if this drift represents differing settings
    pub fn is_modification(&self) -> bool {
        self.desired == Ensure::Present
            && self.current == Ensure::Present
            && !self.drifted.is_empty()
    }
}

/// Compare the desired fields against the current state.
///
/// The compared set is `Ensure` plus every field the caller supplied
/// (non-null) that the descriptor does not exclude. All compared fields are
/// evaluated; nothing short-circuits.
pub fn compare<R: Resource>(
    desired: &DesiredState<R>,
    current: &CurrentState<R>,
) -> Vec<FieldDrift> {
    let descriptor = R::descriptor();
    let current_values = current.field_values();

    desired
        .field_values()
        .into_iter()
        .filter(|(name, value)| !value.is_null() && !descriptor.is_excluded(name))
        .filter_map(|(name, wanted)| {
            let actual = current_values
                .iter()
                .find(|(n, _)| *n == name)
                .map_or(FieldValue::Null, |(_, v)| v.clone());
            if wanted.matches(&actual) {
                None
            } else {
                Some(FieldDrift {
                    field: name,
                    desired: wanted,
                    current: actual,
                })
            }
        })
        .collect()
}

/// Read the current state and report every drifted field
pub fn drift<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    desired: &DesiredState<R>,
) -> DriftReport {
    let descriptor = R::descriptor();
    let outcome = read::<R>(gateway, events, ctx, desired.key(), Operation::Test);
    let read_failed = outcome.is_failed();
    let current = outcome.into_current(desired);
    let drifted = compare(desired, &current);

    for d in &drifted {
        log::info!(
            "{} '{}' drifted on {}: desired {}, current {}",
            descriptor.type_name,
            desired.key(),
            d.field,
            d.desired,
            d.current
        );
    }

    DriftReport {
        resource_type: descriptor.type_name.to_string(),
        key: desired.key().to_string(),
        desired: desired.ensure(),
        current: current.ensure,
        drifted,
        read_failed,
    }
}

/// Engine-facing test: is the resource in its desired state?
pub fn test<R: Resource>(
    gateway: &dyn Gateway,
    events: &dyn EventSink,
    ctx: &ConnectionContext,
    desired: &DesiredState<R>,
) -> bool {
    drift(gateway, events, ctx, desired).in_desired_state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoEvents;
    use crate::error::Error;
    use crate::gateway::MockGateway;
    use crate::testing::{EnrollmentLimit, seed_limit};

    fn ctx() -> ConnectionContext {
        ConnectionContext::default()
    }

    #[test]
    fn test_absent_and_absent_is_in_state() {
        let gateway = MockGateway::new();
        let desired = DesiredState::absent(EnrollmentLimit::new("Demo", 5)).unwrap();
        assert!(test(&gateway, &NoEvents, &ctx(), &desired));
    }

    #[test]
    fn test_missing_object_drifts_on_ensure() {
        let gateway = MockGateway::new();
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();

        let report = drift(&gateway, &NoEvents, &ctx(), &desired);
        assert!(!report.in_desired_state());
        assert!(report.is_addition());
        assert_eq!(report.drifted.len(), 1);
        assert_eq!(report.drifted[0].field, "Ensure");
    }

    #[test]
    fn test_matching_fields_are_in_state() {
        let gateway = MockGateway::new();
        seed_limit(&gateway, "Demo", 5);
        let desired = DesiredState::present(EnrollmentLimit::new("demo", 5)).unwrap();
        assert!(test(&gateway, &NoEvents, &ctx(), &desired));
    }

    #[test]
    fn test_changed_setting_is_reported() {
        let gateway = MockGateway::new();
        seed_limit(&gateway, "Demo", 3);
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();

        let report = drift(&gateway, &NoEvents, &ctx(), &desired);
        assert!(report.is_modification());
        assert_eq!(
            report.drifted,
            vec![FieldDrift {
                field: "Limit",
                desired: FieldValue::Integer(5),
                current: FieldValue::Integer(3),
            }]
        );
    }

    #[test]
    fn test_unsupplied_fields_are_not_compared() {
        let gateway = MockGateway::new();
        gateway.seed(
            crate::testing::COLLECTION,
            serde_json::json!({
                "@odata.type": crate::testing::LIMIT_TYPE,
                "displayName": "Demo",
                "description": "set in the portal",
                "limit": 5,
            }),
        );
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();
        assert!(test(&gateway, &NoEvents, &ctx(), &desired));
    }

    #[test]
    fn test_should_be_absent_but_exists() {
        let gateway = MockGateway::new();
        seed_limit(&gateway, "Demo", 5);
        let desired = DesiredState::absent(EnrollmentLimit::new("Demo", 5)).unwrap();

        let report = drift(&gateway, &NoEvents, &ctx(), &desired);
        assert!(report.is_removal());
        assert!(!report.in_desired_state());
    }

    #[test]
    fn test_read_failure_is_never_in_state() {
        let gateway = MockGateway::new();
        gateway.fail_list_with(|| Error::Transport {
            message: "timeout".into(),
        });
        let desired = DesiredState::absent(EnrollmentLimit::new("Demo", 5)).unwrap();

        let report = drift(&gateway, &NoEvents, &ctx(), &desired);
        assert!(report.read_failed);
        assert!(report.drifted.is_empty());
        assert!(!report.in_desired_state());
    }

    #[test]
    fn test_compare_pure() {
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();
        let current = CurrentState::present(EnrollmentLimit::new("DEMO", 5));
        assert!(compare(&desired, &current).is_empty());

        let current = CurrentState::present(EnrollmentLimit::with_natural_key("Demo"));
        let drifted = compare(&desired, &current);
        assert_eq!(drifted.len(), 1);
        assert_eq!(drifted[0].current, FieldValue::Null);
    }
}
