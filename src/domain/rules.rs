use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::SectorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    Labor,
    System,
    Operational,
    Calculation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rigidity {
    /// Ordered so `Mandatory < Desirable < Flexible` reads naturally when
    /// sorted; severity checks still match on the variant, not the ordinal.
    Mandatory,
    Desirable,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl Rigidity {
    /// MANDATORY violations always fail; DESIRABLE/FLEXIBLE only warn
    /// (spec §4.C, §7).
    pub fn violation_severity(self) -> Severity {
        match self {
            Rigidity::Mandatory => Severity::Error,
            Rigidity::Desirable | Rigidity::Flexible => Severity::Warning,
        }
    }
}

/// Owner scope for a rule row: global rules apply to every sector, sector
/// rules are owned by exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOwner {
    Global,
    Sector(SectorId),
}

/// The unified rule row (spec §3, Design Notes §9: "unify into one `Rule`
/// entity discriminated by `kind`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub owner: RuleOwner,
    pub kind: RuleKind,
    pub rigidity: Rigidity,
    /// 1 = highest priority.
    pub priority: i32,
    pub active: bool,
    pub validity_start: Option<NaiveDate>,
    pub validity_end: Option<NaiveDate>,
    pub title: String,
    pub question: String,
    pub answer: String,
    /// Typed constraint map parsed from `answer` at ingest time (Design
    /// Notes §9); the runtime only ever reads this, never the raw text.
    pub metadata: serde_json::Value,
    /// Deterministic hash-slug of `(title, kind, owner)`, unique within
    /// `(owner, kind)` (spec §4.C).
    pub code: String,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Rule {
    pub fn is_active_on(&self, as_of_date: NaiveDate) -> bool {
        if !self.active || self.deleted_at.is_some() {
            return false;
        }
        let after_start = self.validity_start.map(|s| as_of_date >= s).unwrap_or(true);
        let before_end = self.validity_end.map(|e| as_of_date <= e).unwrap_or(true);
        after_start && before_end
    }
}

/// Deterministic rule code generation: hash-slug of title + kind + owner
/// scope, ensuring uniqueness within `(owner, kind)` (spec §4.C).
pub fn generate_rule_code(title: &str, kind: RuleKind, owner: RuleOwner) -> String {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    title.to_lowercase().hash(&mut hasher);
    kind.hash(&mut hasher);
    match owner {
        RuleOwner::Global => "global".hash(&mut hasher),
        RuleOwner::Sector(id) => format!("{:?}", id).hash(&mut hasher),
    }
    let digest = hasher.finish();
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .chars()
        .take(24)
        .collect();
    format!("{:?}_{}_{:x}", kind, slug.trim_matches('_'), digest & 0xffff)
}

/// The flat map of effective numeric/boolean constraints produced by
/// `get_constraints` (spec §4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConstraints {
    pub max_weekly_hours: f64,
    pub max_daily_hours: f64,
    pub min_rest_between_shifts_hours: f64,
    pub advance_notice_hours: i64,
    pub max_consecutive_days: u32,
    pub buffer_pct: f64,
    pub utilization_target_pct: f64,
    /// Overrides to per-shift-template factors, keyed by template name.
    pub shift_factor_overrides: std::collections::HashMap<String, f64>,
    /// MANDATORY SYSTEM rule gating the intermittent-mode restrictions
    /// (Design Notes §9): blocks fixed schedules, blocks continuous
    /// patterns, requires formal convocations.
    pub intermittent_mode: bool,
}

impl Default for RuleConstraints {
    fn default() -> Self {
        Self {
            max_weekly_hours: 44.0,
            max_daily_hours: 8.0,
            min_rest_between_shifts_hours: 11.0,
            advance_notice_hours: crate::config::DEFAULT_ADVANCE_NOTICE_HOURS,
            max_consecutive_days: 6,
            buffer_pct: crate::config::DEFAULT_BUFFER_PCT,
            utilization_target_pct: crate::config::DEFAULT_UTILIZATION_TARGET_PCT,
            shift_factor_overrides: std::collections::HashMap::new(),
            intermittent_mode: true,
        }
    }
}

/// One entry of a `validate(...)` response (spec §4.C, §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule_code: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorCalcScope {
    Demand,
    Programming,
    Adjustments,
}

/// Condition/action rule scoped to demand/programming/adjustments
/// calculations; kept as a distinct shape from [`Rule`] because its payload
/// (condition + action expressions) genuinely differs (Design Notes §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorCalculationRule {
    pub sector_id: SectorId,
    pub scope: SectorCalcScope,
    pub priority: i32,
    pub condition_expression: String,
    pub action_expression: String,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_code_is_deterministic() {
        let a = generate_rule_code("Minimum rest between shifts", RuleKind::Labor, RuleOwner::Global);
        let b = generate_rule_code("Minimum rest between shifts", RuleKind::Labor, RuleOwner::Global);
        assert_eq!(a, b);
    }

    #[test]
    fn mandatory_violations_are_errors() {
        assert_eq!(Rigidity::Mandatory.violation_severity(), Severity::Error);
        assert_eq!(Rigidity::Desirable.violation_severity(), Severity::Warning);
        assert_eq!(Rigidity::Flexible.violation_severity(), Severity::Warning);
    }
}
