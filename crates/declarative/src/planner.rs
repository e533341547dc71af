//! Transition planner - decides which single mutation converges a resource

use crate::diff::{FieldDrift, compare};
use crate::error::Result;
use crate::resource::Resource;
use crate::types::{CurrentState, DesiredState, Ensure, ReadOutcome};
use std::fmt;

/// The one gateway mutation `set` will perform
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// No matching object exists and one should
    Create,
    /// An object exists with drifted fields
    Update {
        id: String,
        changes: Vec<FieldDrift>,
    },
    /// An object exists and should not
    Delete { id: String },
    /// Already in the desired state
    NoOp,
}

impl Transition {
    /// Check if this transition mutates the remote service
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::NoOp)
    }

    /// Get a symbol for display
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update { .. } => "~",
            Self::Delete { .. } => "-",
            Self::NoOp => "=",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update { changes, .. } => {
                let fields: Vec<&str> = changes.iter().map(|c| c.field).collect();
                write!(f, "update {}", fields.join(", "))
            }
            Self::Delete { .. } => f.write_str("delete"),
            Self::NoOp => f.write_str("no change"),
        }
    }
}

/// Decide the transition from a read outcome.
///
/// A failed read returns its error: absence is unknown, so no mutation
/// can be chosen safely.
pub fn plan<R: Resource>(desired: &DesiredState<R>, outcome: ReadOutcome<R>) -> Result<Transition> {
    let (id, current) = match outcome {
        ReadOutcome::ReadFailed { error } => return Err(error),
        ReadOutcome::Absent => {
            return Ok(match desired.ensure() {
                Ensure::Present => Transition::Create,
                Ensure::Absent => Transition::NoOp,
            });
        }
        ReadOutcome::Found { id, settings } => (id, CurrentState::present(settings)),
    };

    if desired.ensure() == Ensure::Absent {
        return Ok(Transition::Delete { id });
    }

    let changes = compare(desired, &current);
    if changes.is_empty() {
        Ok(Transition::NoOp)
    } else {
        Ok(Transition::Update { id, changes })
    }
}
