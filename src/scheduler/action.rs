use serde::Serialize;

use crate::clock::time_of_day::TimeOfDay;
use crate::scheduling::types::ActionKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded {
        detail: String,
        points: Option<usize>,
    },
    Failed {
        error: String,
    },
}

/// Result of one executed action, returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub action: ActionKind,
    pub time: TimeOfDay,
    pub description: &'static str,
    pub outcome: ActionOutcome,
}

impl ActionReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ActionOutcome::Succeeded { .. })
    }
}
