//! The four-operation contract every resource type is driven through

use crate::context::{ConnectionContext, EventSink, ExportProgress, Formatter, Operation};
use crate::diff::{self, DriftReport};
use crate::error::Result;
use crate::export::{self, ExportOutcome};
use crate::gateway::Gateway;
use crate::planner::{self, Transition};
use crate::reader;
use crate::resource::Resource;
use crate::types::{CurrentState, DesiredState, ReadOutcome, SetOutcome};
use crate::writer;

/// Get/Test/Set/Export over one gateway.
///
/// The engine holds no state between calls; the connection context is
/// passed into every operation.
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    gateway: &'a dyn Gateway,
    events: &'a dyn EventSink,
}

impl<'a> Engine<'a> {
    pub fn new(gateway: &'a dyn Gateway, events: &'a dyn EventSink) -> Self {
        Self { gateway, events }
    }

    /// Current state of the instance named by `desired`'s key.
    ///
    /// Read failures are reported and look like absence.
    pub fn get<R: Resource>(
        &self,
        desired: &DesiredState<R>,
        ctx: &ConnectionContext,
    ) -> CurrentState<R> {
        reader::get(self.gateway, self.events, ctx, desired)
    }

    /// Current state by natural key alone
    pub fn get_by_key<R: Resource>(
        &self,
        key: &str,
        ctx: &ConnectionContext,
    ) -> Result<CurrentState<R>> {
        let desired = DesiredState::<R>::present_with_key(key)?;
        Ok(self.get(&desired, ctx))
    }

    /// Uncollapsed read, distinguishing failure from absence
    pub fn read<R: Resource>(&self, key: &str, ctx: &ConnectionContext) -> ReadOutcome<R> {
        reader::read(self.gateway, self.events, ctx, key, Operation::Get)
    }

    pub fn test<R: Resource>(&self, desired: &DesiredState<R>, ctx: &ConnectionContext) -> bool {
        diff::test(self.gateway, self.events, ctx, desired)
    }

    /// Like [`Engine::test`], with the drifted fields
    pub fn drift<R: Resource>(
        &self,
        desired: &DesiredState<R>,
        ctx: &ConnectionContext,
    ) -> DriftReport {
        diff::drift(self.gateway, self.events, ctx, desired)
    }

    /// The mutation `set` would perform, without performing it
    pub fn plan<R: Resource>(
        &self,
        desired: &DesiredState<R>,
        ctx: &ConnectionContext,
    ) -> Result<Transition> {
        let outcome = reader::read(self.gateway, self.events, ctx, desired.key(), Operation::Set);
        planner::plan(desired, outcome)
    }

    /// Perform a transition obtained from [`Engine::plan`]
    pub fn apply<R: Resource>(
        &self,
        desired: &DesiredState<R>,
        transition: &Transition,
        ctx: &ConnectionContext,
    ) -> SetOutcome {
        writer::apply(self.gateway, self.events, ctx, desired, transition)
    }

    pub fn set<R: Resource>(&self, desired: &DesiredState<R>, ctx: &ConnectionContext) -> SetOutcome {
        writer::set(self.gateway, self.events, ctx, desired)
    }

    pub fn export<R: Resource>(
        &self,
        ctx: &ConnectionContext,
        formatter: &dyn Formatter,
        progress: &mut dyn ExportProgress,
    ) -> ExportOutcome {
        export::export::<R>(self.gateway, self.events, ctx, formatter, progress)
    }

    /// Exported instances as states instead of text
    pub fn export_states<R: Resource>(
        &self,
        ctx: &ConnectionContext,
        progress: &mut dyn ExportProgress,
    ) -> Result<Vec<CurrentState<R>>> {
        export::export_states::<R>(self.gateway, self.events, ctx, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{NoEvents, NoProgress};
    use crate::error::Error;
    use crate::gateway::MockGateway;
    use crate::testing::EnrollmentLimit;
    use crate::types::Ensure;
    use serde_json::json;

    #[test]
    fn test_demo_scenario() {
        let gateway = MockGateway::new();
        let engine = Engine::new(&gateway, &NoEvents);
        let ctx = ConnectionContext::default();
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();

        assert!(!engine.test(&desired, &ctx));
        assert_eq!(engine.set(&desired, &ctx), SetOutcome::Created);
        assert_eq!(gateway.mutation_count(), 1);

        let created = &gateway.objects(crate::testing::COLLECTION)[0];
        assert_eq!(created.properties["limit"], json!(5));

        let current = engine.get(&desired, &ctx);
        assert_eq!(current.ensure, Ensure::Present);
        assert_eq!(current.settings, EnrollmentLimit::new("Demo", 5));
        assert!(engine.test(&desired, &ctx));
    }

    #[test]
    fn test_set_is_idempotent() {
        let gateway = MockGateway::new();
        let engine = Engine::new(&gateway, &NoEvents);
        let ctx = ConnectionContext::default();
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();

        engine.set(&desired, &ctx);
        let before = gateway.objects(crate::testing::COLLECTION);
        gateway.clear_calls();

        assert_eq!(engine.set(&desired, &ctx), SetOutcome::NoChange);
        assert_eq!(gateway.mutation_count(), 0);
        assert_eq!(gateway.objects(crate::testing::COLLECTION), before);
    }

    #[test]
    fn test_validation_precedes_gateway() {
        let gateway = MockGateway::new();
        for limit in [0, 16] {
            let result = DesiredState::present(EnrollmentLimit::new("Demo", limit));
            assert!(matches!(result, Err(Error::Validation { .. })));
        }
        for limit in [1, 15] {
            assert!(DesiredState::present(EnrollmentLimit::new("Demo", limit)).is_ok());
        }
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_plan_then_apply() {
        let gateway = MockGateway::new();
        let engine = Engine::new(&gateway, &NoEvents);
        let ctx = ConnectionContext::default();
        let desired = DesiredState::present(EnrollmentLimit::new("Demo", 5)).unwrap();

        let transition = engine.plan(&desired, &ctx).unwrap();
        assert_eq!(transition, Transition::Create);
        assert_eq!(gateway.mutation_count(), 0);

        assert_eq!(engine.apply(&desired, &transition, &ctx), SetOutcome::Created);
        assert_eq!(engine.plan(&desired, &ctx).unwrap(), Transition::NoOp);
    }

    #[test]
    fn test_get_by_key() {
        let gateway = MockGateway::new();
        crate::testing::seed_limit(&gateway, "Demo", 9);
        let engine = Engine::new(&gateway, &NoEvents);
        let ctx = ConnectionContext::default();

        let current = engine.get_by_key::<EnrollmentLimit>("demo", &ctx).unwrap();
        assert_eq!(current.settings.limit, Some(9));
        assert!(engine.get_by_key::<EnrollmentLimit>("", &ctx).is_err());

        let states = engine
            .export_states::<EnrollmentLimit>(&ctx, &mut NoProgress)
            .unwrap();
        assert_eq!(states, vec![current]);
    }
}
