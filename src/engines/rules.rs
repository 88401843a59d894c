//! Rule Engine (spec §4.C): loads, orders, validates rules; exposes
//! effective constraints for a sector.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::rules::{Rigidity, Rule, RuleConstraints, RuleKind, RuleOwner, RuleViolation, Severity};
use crate::error::{CoreError, Result};
use crate::ids::{RuleId, SectorId};
use crate::store::Store;

/// `fetch_rules(sector, as_of_date, active_only)` (spec §4.C): rules
/// grouped by `(kind, rigidity)`, ordered by priority ascending. Filters to
/// `active = true` rules valid on `as_of_date` when `active_only`.
pub async fn fetch_rules(store: &Store, sector_id: SectorId, as_of_date: NaiveDate, active_only: bool) -> HashMap<(RuleKind, Rigidity), Vec<Rule>> {
    let rows = store.list_rules_for_sector(sector_id).await;
    let mut grouped: HashMap<(RuleKind, Rigidity), Vec<Rule>> = HashMap::new();
    for (_, rule) in rows {
        if active_only && !rule.is_active_on(as_of_date) {
            continue;
        }
        grouped.entry((rule.kind, rule.rigidity)).or_default().push(rule);
    }
    for block in grouped.values_mut() {
        block.sort_by_key(|r| r.priority);
    }
    grouped
}

fn apply_metadata_overrides(constraints: &mut RuleConstraints, metadata: &serde_json::Value) {
    let Some(map) = metadata.as_object() else { return };
    if let Some(v) = map.get("max_weekly_hours").and_then(|v| v.as_f64()) {
        constraints.max_weekly_hours = v;
    }
    if let Some(v) = map.get("max_daily_hours").and_then(|v| v.as_f64()) {
        constraints.max_daily_hours = v;
    }
    if let Some(v) = map.get("min_rest_between_shifts_hours").and_then(|v| v.as_f64()) {
        constraints.min_rest_between_shifts_hours = v;
    }
    if let Some(v) = map.get("advance_notice_hours").and_then(|v| v.as_i64()) {
        constraints.advance_notice_hours = v;
    }
    if let Some(v) = map.get("max_consecutive_days").and_then(|v| v.as_u64()) {
        constraints.max_consecutive_days = v as u32;
    }
    if let Some(v) = map.get("buffer_pct").and_then(|v| v.as_f64()) {
        constraints.buffer_pct = v;
    }
    if let Some(v) = map.get("utilization_target_pct").and_then(|v| v.as_f64()) {
        constraints.utilization_target_pct = v;
    }
    if let Some(v) = map.get("intermittent_mode").and_then(|v| v.as_bool()) {
        constraints.intermittent_mode = v;
    }
    if let Some(overrides) = map.get("shift_factor_overrides").and_then(|v| v.as_object()) {
        for (template_name, factor) in overrides {
            if let Some(f) = factor.as_f64() {
                constraints.shift_factor_overrides.insert(template_name.clone(), f);
            }
        }
    }
}

/// `get_constraints(sector)` (spec §4.C): reduces the active rule set into
/// a flat map of effective constraints. Global LABOR applies first (in
/// ascending priority order), sector OPERATIONAL overrides matching keys
/// afterward (also ascending priority, so within a scope the highest
/// priority rule is applied last and therefore wins ties on shared keys).
pub async fn get_constraints(store: &Store, sector_id: SectorId, as_of_date: NaiveDate) -> RuleConstraints {
    let mut constraints = RuleConstraints::default();
    let grouped = fetch_rules(store, sector_id, as_of_date, true).await;

    let mut global_labor: Vec<&Rule> = Vec::new();
    let mut global_system: Vec<&Rule> = Vec::new();
    let mut sector_operational: Vec<&Rule> = Vec::new();
    for ((kind, _rigidity), rules) in &grouped {
        for rule in rules {
            match (kind, rule.owner) {
                (RuleKind::Labor, RuleOwner::Global) => global_labor.push(rule),
                (RuleKind::System, RuleOwner::Global) => global_system.push(rule),
                (RuleKind::Operational, RuleOwner::Sector(_)) => sector_operational.push(rule),
                _ => {}
            }
        }
    }
    global_labor.sort_by_key(|r| r.priority);
    global_system.sort_by_key(|r| r.priority);
    sector_operational.sort_by_key(|r| r.priority);

    for rule in global_labor.iter().chain(global_system.iter()).chain(sector_operational.iter()) {
        apply_metadata_overrides(&mut constraints, &rule.metadata);
    }
    constraints
}

/// Minimal candidate shape both the Schedule Generator's legal validation
/// and the Convocation Engine's creation check validate against (spec
/// §4.F "Legal validation", §4.I "Legal constraints come from §4.C
/// get_constraints").
#[derive(Debug, Clone, Default)]
pub struct RuleCandidate {
    pub weekly_hours: Option<f64>,
    pub daily_hours: Option<f64>,
    pub rest_since_last_shift_hours: Option<f64>,
    pub consecutive_worked_days: Option<u32>,
    pub advance_notice_hours: Option<f64>,
}

/// `validate(sector, candidate_values)` (spec §4.C): MANDATORY violations
/// are errors and block; DESIRABLE/FLEXIBLE violations are warnings.
pub fn validate(constraints: &RuleConstraints, candidate: &RuleCandidate) -> Vec<RuleViolation> {
    let mut violations = Vec::new();

    if let Some(hours) = candidate.weekly_hours {
        if hours > constraints.max_weekly_hours {
            violations.push(RuleViolation { rule_code: "max_weekly_hours".into(), severity: Severity::Error, message: format!("{hours:.1}h exceeds the weekly cap of {:.1}h", constraints.max_weekly_hours) });
        }
    }
    if let Some(hours) = candidate.daily_hours {
        if hours > constraints.max_daily_hours {
            violations.push(RuleViolation { rule_code: "max_daily_hours".into(), severity: Severity::Error, message: format!("{hours:.1}h exceeds the daily cap of {:.1}h", constraints.max_daily_hours) });
        }
    }
    if let Some(rest) = candidate.rest_since_last_shift_hours {
        if rest < constraints.min_rest_between_shifts_hours {
            violations.push(RuleViolation {
                rule_code: "min_rest_between_shifts_hours".into(),
                severity: Severity::Error,
                message: format!("{rest:.1}h rest is below the minimum of {:.1}h", constraints.min_rest_between_shifts_hours),
            });
        }
    }
    if let Some(days) = candidate.consecutive_worked_days {
        if days > constraints.max_consecutive_days {
            violations.push(RuleViolation { rule_code: "max_consecutive_days".into(), severity: Severity::Warning, message: format!("{days} consecutive days exceeds the recommended {}", constraints.max_consecutive_days) });
        }
    }
    if let Some(notice) = candidate.advance_notice_hours {
        if notice < constraints.advance_notice_hours as f64 {
            violations.push(RuleViolation {
                rule_code: "advance_notice_hours".into(),
                severity: Severity::Warning,
                message: format!("{notice:.1}h advance notice is under the expected {}h", constraints.advance_notice_hours),
            });
        }
    }
    violations
}

/// `reorder(sector, kind, rigidity, rule_ids[])` (spec §4.C): atomic
/// renumbering of priorities 1..n within the single `(kind, rigidity)`
/// block. Rejects if the provided id set doesn't match the existing block.
pub async fn reorder(store: &Store, sector_id: SectorId, kind: RuleKind, rigidity: Rigidity, rule_ids: &[RuleId]) -> Result<()> {
    let existing_ids: std::collections::HashSet<RuleId> = {
        let rows = store.list_rules_for_sector(sector_id).await;
        rows.into_iter().filter(|(_, r)| r.kind == kind && r.rigidity == rigidity).map(|(id, _)| id).collect()
    };
    let requested_ids: std::collections::HashSet<RuleId> = rule_ids.iter().copied().collect();
    if existing_ids != requested_ids {
        return Err(CoreError::Conflict("reorder id set does not match the existing rule block".into()));
    }

    for (index, rule_id) in rule_ids.iter().enumerate() {
        let new_priority = (index + 1) as i32;
        store.update_rule(*rule_id, |r| r.priority = new_priority).await?;
    }
    Ok(())
}
