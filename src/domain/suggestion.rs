use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SchedulePlanId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionPriority {
    Low,
    Medium,
    High,
}

/// `{type, original_value, suggested_value, delta, reason,
/// justification_json, priority}` (spec §4.J). Opened with `is_accepted =
/// null`; accepting/rejecting is persisted but never mutates the plan —
/// applying a suggestion is an explicit downstream action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplanSuggestion {
    pub schedule_plan_id: SchedulePlanId,
    pub target_date: NaiveDate,
    pub suggestion_type: String,
    pub original_value: Option<f64>,
    pub suggested_value: Option<f64>,
    pub delta: Option<f64>,
    pub reason: String,
    pub justification: serde_json::Value,
    pub priority: SuggestionPriority,
    pub is_accepted: Option<bool>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionType {
    ReinforceTeam,
    ReduceHours,
    AnticipateShift,
    PostponeShift,
    PreventiveSubstitution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionImpactCategory {
    Financial,
    Operational,
    Legal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionStatus {
    Open,
    Applied,
    Ignored,
}

impl SuggestionStatus {
    /// `OPEN -> APPLIED | IGNORED` is monotonic (spec §4.J): once applied
    /// or ignored, a suggestion never returns to `OPEN`.
    pub fn can_transition_to(self, next: SuggestionStatus) -> bool {
        matches!((self, next), (SuggestionStatus::Open, SuggestionStatus::Applied) | (SuggestionStatus::Open, SuggestionStatus::Ignored))
    }
}

/// User-level recommendation emitted alongside [`ReplanSuggestion`]s (spec
/// §4.J).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySuggestion {
    pub schedule_plan_id: SchedulePlanId,
    pub target_date: NaiveDate,
    pub suggestion_type: SuggestionType,
    pub category: SuggestionImpactCategory,
    pub status: SuggestionStatus,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_are_monotonic() {
        assert!(SuggestionStatus::Open.can_transition_to(SuggestionStatus::Applied));
        assert!(SuggestionStatus::Open.can_transition_to(SuggestionStatus::Ignored));
        assert!(!SuggestionStatus::Applied.can_transition_to(SuggestionStatus::Open));
        assert!(!SuggestionStatus::Ignored.can_transition_to(SuggestionStatus::Applied));
    }
}
