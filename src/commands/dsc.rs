//! Document-driven commands
//!
//! - `get` - Show the current state of every resource in a document
//! - `test` - Report drift, failing when any resource is out of state
//! - `set` - Plan, confirm and apply the one mutation each resource needs

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    ApplySummary, ConnectionContext, DesiredState, DriftReport, Engine, Ensure, FieldValue,
    Resource, SetOutcome, Transition,
};
use serde_json::{Map, Value};

use super::{Session, parse_kind};
use crate::Context;
use crate::cli::{SetArgs, StateArgs};
use crate::document::{Document, Entry};
use crate::resource::ResourceVisitor;
use crate::ui;

// ============================================================================
// Entry Selection
// ============================================================================

fn load_entries(args: &StateArgs) -> Result<Document> {
    let doc = Document::load(&args.file)?;
    log::debug!(
        "Loaded {} from {}",
        ui::plural(doc.entries.len(), "resource"),
        args.file.display()
    );
    Ok(doc)
}

fn select<'d>(doc: &'d Document, args: &StateArgs) -> Result<Vec<&'d Entry>> {
    let kind = args.resource.as_deref().map(parse_kind).transpose()?;
    let entries = doc.select(kind, args.key.as_deref());
    if entries.is_empty() {
        bail!("No matching resources in {}", args.file.display());
    }
    Ok(entries)
}

/// Every entry must be valid before anything is read
fn validate_all(entries: &[&Entry]) -> Result<()> {
    for entry in entries {
        entry.kind.accept(Validate { entry })?;
    }
    Ok(())
}

struct Validate<'a> {
    entry: &'a Entry,
}

impl ResourceVisitor for Validate<'_> {
    type Output = Result<()>;

    fn visit<R: Resource>(self) -> Self::Output {
        self.entry.desired::<R>()?;
        Ok(())
    }
}

// ============================================================================
// Get
// ============================================================================

/// Current state of one entry, with the record type erased
#[derive(Debug, Clone)]
pub struct StateView {
    pub resource_type: &'static str,
    pub key: String,
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl StateView {
    fn to_json(&self) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(self.resource_type.into()));
        for (name, value) in &self.fields {
            map.insert((*name).into(), serde_json::to_value(value)?);
        }
        Ok(Value::Object(map))
    }

    fn ensure(&self) -> Ensure {
        self.fields
            .iter()
            .find(|(name, _)| *name == "Ensure")
            .and_then(|(_, value)| value.as_str())
            .and_then(Ensure::parse)
            .unwrap_or_default()
    }
}

struct GetEntry<'a> {
    engine: Engine<'a>,
    ctx: &'a ConnectionContext,
    entry: &'a Entry,
}

impl ResourceVisitor for GetEntry<'_> {
    type Output = Result<StateView>;

    fn visit<R: Resource>(self) -> Self::Output {
        let desired = self.entry.desired::<R>()?;
        let current = self.engine.get(&desired, self.ctx);
        Ok(StateView {
            resource_type: R::descriptor().type_name,
            key: current.key().to_string(),
            fields: current.field_values(),
        })
    }
}

pub fn get_states(
    engine: Engine<'_>,
    ctx: &ConnectionContext,
    entries: &[&Entry],
) -> Result<Vec<StateView>> {
    validate_all(entries)?;
    entries
        .iter()
        .map(|entry| entry.kind.accept(GetEntry { engine, ctx, entry }))
        .collect()
}

pub fn get(app: &Context, args: StateArgs) -> Result<()> {
    let doc = load_entries(&args)?;
    let entries = select(&doc, &args)?;
    let session = Session::connect(app)?;

    let states = get_states(session.engine(), &session.ctx, &entries)?;

    if args.json {
        let values = states
            .iter()
            .map(StateView::to_json)
            .collect::<Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    for state in &states {
        let ensure = state.ensure();
        let marker = if ensure.is_present() {
            "●".green()
        } else {
            "○".dimmed()
        };
        println!();
        println!(
            "{} {} {}",
            marker,
            state.resource_type.bold(),
            format!("'{}'", state.key).cyan()
        );
        for (name, value) in &state.fields {
            if value.is_null() || *name == "Ensure" {
                continue;
            }
            ui::kv(name, &ui::truncate(&value.to_string(), 80));
        }
        ui::kv("Ensure", ensure.as_str());
    }
    Ok(())
}

// ============================================================================
// Test
// ============================================================================

struct TestEntry<'a> {
    engine: Engine<'a>,
    ctx: &'a ConnectionContext,
    entry: &'a Entry,
}

impl ResourceVisitor for TestEntry<'_> {
    type Output = Result<DriftReport>;

    fn visit<R: Resource>(self) -> Self::Output {
        let desired = self.entry.desired::<R>()?;
        Ok(self.engine.drift(&desired, self.ctx))
    }
}

pub fn drift_reports(
    engine: Engine<'_>,
    ctx: &ConnectionContext,
    entries: &[&Entry],
) -> Result<Vec<DriftReport>> {
    validate_all(entries)?;
    entries
        .iter()
        .map(|entry| entry.kind.accept(TestEntry { engine, ctx, entry }))
        .collect()
}

pub fn test(app: &Context, args: StateArgs) -> Result<()> {
    let doc = load_entries(&args)?;
    let entries = select(&doc, &args)?;
    let session = Session::connect(app)?;

    let reports = drift_reports(session.engine(), &session.ctx, &entries)?;
    let drifted = reports.iter().filter(|r| !r.in_desired_state()).count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        ui::header("Drift Report");
        for report in &reports {
            print_report(report);
        }
        println!();
        if drifted == 0 {
            ui::success(&format!(
                "All {} in desired state",
                ui::plural(reports.len(), "resource")
            ));
        }
    }

    if drifted > 0 {
        bail!(
            "{} of {} not in desired state",
            drifted,
            ui::plural(reports.len(), "resource")
        );
    }
    Ok(())
}

fn print_report(report: &DriftReport) {
    let label = format!("{} '{}'", report.resource_type, report.key);
    if report.read_failed {
        println!("  {} {} {}", "✗".red(), label, "(could not read)".red());
    } else if report.in_desired_state() {
        println!("  {} {}", "✓".green(), label);
    } else if report.is_addition() {
        println!("  {} {} {}", "+".green(), label, "(missing)".dimmed());
    } else if report.is_removal() {
        println!("  {} {} {}", "-".red(), label, "(should not exist)".dimmed());
    } else {
        println!("  {} {}", "~".yellow(), label);
        for drift in &report.drifted {
            println!(
                "      {}: {} → {}",
                drift.field,
                drift.current.to_string().red(),
                drift.desired.to_string().green()
            );
        }
    }
}

// ============================================================================
// Set
// ============================================================================

/// A planned transition, type-erased so plans for every resource type can
/// be shown and applied together
pub trait Pending {
    fn label(&self) -> String;

    /// The planned transition, or why none could be chosen
    fn transition(&self) -> std::result::Result<&Transition, &declarative::Error>;

    fn apply(&self, engine: Engine<'_>, ctx: &ConnectionContext) -> SetOutcome;

    /// Whether applying will mutate or fail
    fn needs_action(&self) -> bool {
        self.transition().map_or(true, Transition::is_mutation)
    }
}

struct Planned<R: Resource> {
    desired: DesiredState<R>,
    transition: declarative::Result<Transition>,
}

impl<R: Resource> Pending for Planned<R> {
    fn label(&self) -> String {
        format!("{} '{}'", R::descriptor().type_name, self.desired.key())
    }

    fn transition(&self) -> std::result::Result<&Transition, &declarative::Error> {
        self.transition.as_ref()
    }

    fn apply(&self, engine: Engine<'_>, ctx: &ConnectionContext) -> SetOutcome {
        match &self.transition {
            Ok(transition) => engine.apply(&self.desired, transition, ctx),
            Err(error) => SetOutcome::Failed {
                error: format!("current state unknown: {error}"),
            },
        }
    }
}

struct PlanEntry<'a> {
    engine: Engine<'a>,
    ctx: &'a ConnectionContext,
    entry: &'a Entry,
}

impl ResourceVisitor for PlanEntry<'_> {
    type Output = Result<Box<dyn Pending>>;

    fn visit<R: Resource>(self) -> Self::Output {
        let desired = self.entry.desired::<R>()?;
        let transition = self.engine.plan(&desired, self.ctx);
        Ok(Box::new(Planned {
            desired,
            transition,
        }))
    }
}

/// Plan every entry; document errors abort before anything is read
pub fn plan_entries(
    engine: Engine<'_>,
    ctx: &ConnectionContext,
    entries: &[&Entry],
) -> Result<Vec<Box<dyn Pending>>> {
    validate_all(entries)?;
    entries
        .iter()
        .map(|entry| entry.kind.accept(PlanEntry { engine, ctx, entry }))
        .collect()
}

/// Apply every plan, counting outcomes
pub fn apply_planned(
    engine: Engine<'_>,
    ctx: &ConnectionContext,
    planned: &[Box<dyn Pending>],
) -> ApplySummary {
    let mut summary = ApplySummary::default();
    for pending in planned {
        let outcome = if pending.needs_action() {
            pending.apply(engine, ctx)
        } else {
            SetOutcome::NoChange
        };

        match &outcome {
            SetOutcome::Failed { error } => {
                ui::error(&format!("{} ({error})", pending.label()));
            }
            SetOutcome::NoChange => {}
            outcome => {
                log::info!("{}: {:?}", pending.label(), outcome);
                println!("    {} {}", "✓".green(), pending.label());
            }
        }
        summary.add(&outcome);
    }
    summary
}

pub fn set(app: &Context, args: SetArgs) -> Result<()> {
    let doc = load_entries(&args.state)?;
    let entries = select(&doc, &args.state)?;
    let session = Session::connect(app)?;
    let engine = session.engine();

    let planned = plan_entries(engine, &session.ctx, &entries)?;
    display_plan(&planned);

    let actionable = planned.iter().filter(|p| p.needs_action()).count();
    if actionable == 0 {
        return Ok(());
    }

    if args.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }

    if !args.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    println!();
    println!(
        "  {} Applying {}...",
        "→".cyan(),
        ui::plural(actionable, "change")
    );
    let summary = apply_planned(engine, &session.ctx, &planned);
    print_summary(&summary);

    if !summary.is_success() {
        bail!("{} failed", ui::plural(summary.failed, "resource"));
    }
    Ok(())
}

/// Show what set would change
fn display_plan(planned: &[Box<dyn Pending>]) {
    let actionable: Vec<&dyn Pending> = planned
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| p.needs_action())
        .collect();
    if actionable.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Diff".bold()
    );
    println!("│");

    for pending in actionable.iter().copied() {
        match pending.transition() {
            Ok(transition @ Transition::Update { changes, .. }) => {
                println!("│   {} {}", transition.symbol().yellow(), pending.label());
                for change in changes {
                    println!(
                        "│       {}: {} → {}",
                        change.field,
                        change.current.to_string().red(),
                        change.desired.to_string().green()
                    );
                }
            }
            Ok(transition @ Transition::Create) => {
                println!("│   {} {}", transition.symbol().green(), pending.label());
            }
            Ok(transition) => {
                println!("│   {} {}", transition.symbol().red(), pending.label());
            }
            Err(error) => {
                println!(
                    "│   {} {} {}",
                    "?".dimmed(),
                    pending.label(),
                    format!("(cannot read current state: {error})").red()
                );
                println!("│       {}", error.category().advice().dimmed());
            }
        }
    }

    println!("│");
    let unchanged = planned.len() - actionable.len();
    println!(
        "└─ {} to apply, {} unchanged ─────────────────────┘",
        ui::plural(actionable.len(), "change"),
        unchanged
    );
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(summary: &ApplySummary) {
    println!();
    if summary.is_success() {
        println!(
            "  {} Configuration applied successfully!",
            "✓".green().bold()
        );
    } else {
        println!(
            "  {} Configuration applied with errors",
            "⚠".yellow().bold()
        );
    }

    if summary.created > 0 {
        println!("    • {} created", ui::plural(summary.created, "resource"));
    }
    if summary.updated > 0 {
        println!("    • {} updated", ui::plural(summary.updated, "resource"));
    }
    if summary.removed > 0 {
        println!("    • {} removed", ui::plural(summary.removed, "resource"));
    }
    if summary.no_change > 0 {
        println!("    • {} unchanged", ui::plural(summary.no_change, "resource"));
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::enrollment_limit::{COLLECTION, ODATA_TYPE};
    use declarative::{AuthMethod, Error, MockGateway, NoEvents};
    use serde_json::json;

    const DOC: &str = r#"
[[resource]]
type = "IntuneDeviceEnrollmentLimitRestriction"
DisplayName = "Demo"
Limit = 5

[[resource]]
type = "IntuneDeviceEnrollmentLimitRestriction"
DisplayName = "Contractors"
Limit = 2

[[resource]]
type = "IntuneDeviceEnrollmentWindowsHelloForBusiness"
Ensure = "Absent"
DisplayName = "Legacy Hello"
"#;

    fn ctx() -> ConnectionContext {
        ConnectionContext::new("contoso.onmicrosoft.com", AuthMethod::AccessToken)
            .with_access_token("token")
    }

    fn seed_limit(gateway: &MockGateway, name: &str, limit: i64) {
        gateway.seed(
            COLLECTION,
            json!({"@odata.type": ODATA_TYPE, "displayName": name, "limit": limit}),
        );
    }

    fn seeded() -> MockGateway {
        let gateway = MockGateway::new();
        seed_limit(&gateway, "Demo", 3);
        gateway.seed(
            COLLECTION,
            json!({
                "@odata.type": crate::resource::windows_hello::ODATA_TYPE,
                "displayName": "Legacy Hello",
            }),
        );
        gateway
    }

    fn entries(doc: &Document) -> Vec<&Entry> {
        doc.select(None, None)
    }

    #[test]
    fn test_get_states() {
        let gateway = seeded();
        let engine = Engine::new(&gateway, &NoEvents);
        let doc = Document::parse(DOC, "test").unwrap();

        let states = get_states(engine, &ctx(), &entries(&doc)).unwrap();
        assert_eq!(states.len(), 3);

        assert_eq!(states[0].ensure(), Ensure::Present);
        assert!(states[0].fields.contains(&("Limit", FieldValue::Integer(3))));

        // Absent echoes the document
        assert_eq!(states[1].ensure(), Ensure::Absent);
        assert!(states[1].fields.contains(&("Limit", FieldValue::Integer(2))));

        let json = states[0].to_json().unwrap();
        assert_eq!(json["type"], "IntuneDeviceEnrollmentLimitRestriction");
        assert_eq!(json["Limit"], 3);
        assert_eq!(json["Description"], Value::Null);
    }

    #[test]
    fn test_drift_reports() {
        let gateway = seeded();
        let engine = Engine::new(&gateway, &NoEvents);
        let doc = Document::parse(DOC, "test").unwrap();

        let reports = drift_reports(engine, &ctx(), &entries(&doc)).unwrap();
        assert!(reports[0].is_modification());
        assert_eq!(reports[0].drifted[0].field, "Limit");
        assert!(reports[1].is_addition());
        assert!(reports[2].is_removal());
        assert_eq!(gateway.mutation_count(), 0);
    }

    #[test]
    fn test_plan_then_apply_converges() {
        let gateway = seeded();
        let engine = Engine::new(&gateway, &NoEvents);
        let doc = Document::parse(DOC, "test").unwrap();
        let entries = entries(&doc);

        let planned = plan_entries(engine, &ctx(), &entries).unwrap();
        assert!(matches!(
            planned[0].transition(),
            Ok(Transition::Update { .. })
        ));
        assert!(matches!(planned[1].transition(), Ok(Transition::Create)));
        assert!(matches!(
            planned[2].transition(),
            Ok(Transition::Delete { .. })
        ));
        assert_eq!(gateway.mutation_count(), 0);

        let summary = apply_planned(engine, &ctx(), &planned);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.removed, 1);
        assert!(summary.is_success());

        let reports = drift_reports(engine, &ctx(), &entries).unwrap();
        assert!(reports.iter().all(DriftReport::in_desired_state));

        // A second run has nothing to do
        gateway.clear_calls();
        let planned = plan_entries(engine, &ctx(), &entries).unwrap();
        assert!(planned.iter().all(|p| !p.needs_action()));
        let summary = apply_planned(engine, &ctx(), &planned);
        assert_eq!(summary.no_change, 3);
        assert_eq!(gateway.mutation_count(), 0);
    }

    #[test]
    fn test_failed_read_is_not_applied() {
        let gateway = seeded();
        let engine = Engine::new(&gateway, &NoEvents);
        let doc = Document::parse(DOC, "test").unwrap();

        gateway.fail_list_with(|| Error::Transport {
            message: "connection reset".into(),
        });
        let planned = plan_entries(engine, &ctx(), &entries(&doc)).unwrap();
        assert!(planned.iter().all(|p| p.transition().is_err()));
        assert!(planned.iter().all(|p| p.needs_action()));

        gateway.recover();
        let summary = apply_planned(engine, &ctx(), &planned);
        assert_eq!(summary.failed, 3);
        assert_eq!(gateway.mutation_count(), 0);
    }

    #[test]
    fn test_invalid_entry_aborts_before_reads() {
        let gateway = seeded();
        let engine = Engine::new(&gateway, &NoEvents);
        let doc = Document::parse(
            &format!(
                "{DOC}\n[[resource]]\ntype = \"IntuneDeviceEnrollmentLimitRestriction\"\nDisplayName = \"Bad\"\nLimit = 99\n"
            ),
            "test",
        )
        .unwrap();

        assert!(plan_entries(engine, &ctx(), &entries(&doc)).is_err());
        assert!(get_states(engine, &ctx(), &entries(&doc)).is_err());
        assert!(drift_reports(engine, &ctx(), &entries(&doc)).is_err());
        assert!(gateway.calls().is_empty());
    }
}
