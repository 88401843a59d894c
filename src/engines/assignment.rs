//! Assignment Engine (spec §4.G): scores and binds employees to slots.

use crate::domain::rules::{RuleViolation, Severity};
use crate::domain::sector::Employee;
use crate::engines::rules::{validate, RuleCandidate};
use crate::error::Result;
use crate::ids::{EmployeeId, SchedulePlanId, SectorId};
use crate::pipeline::PipelineContext;
use crate::store::Store;

/// One scored candidate for a slot, kept only for the winning decision's
/// trace step.
struct ScoredCandidate {
    employee_id: EmployeeId,
    score: f64,
}

/// Score combines (spec §4.G): lowest accumulated weekly hours (primary),
/// longest time since last assignment (fairness), specialization match,
/// and a declining penalty for repeating the same (weekday, template)
/// pattern. Higher is better.
fn score_candidate(employee: &Employee, slot_weekday: crate::domain::weekday::Weekday, template_name: &str, as_of: chrono::NaiveDate) -> f64 {
    let hours_component = -employee.history.accumulated_week_hours;
    let fairness_component = employee
        .history
        .last_assigned_date
        .map(|last| (as_of - last).num_days() as f64)
        .unwrap_or(365.0);
    let specialization_component = if employee.specializations.contains(template_name) { 10.0 } else { 0.0 };
    let pattern_key = format!("{slot_weekday:?}:{template_name}");
    let repeat_count = employee.history.recent_template_pattern_counts.get(&pattern_key).copied().unwrap_or(0);
    let repetition_penalty = -(repeat_count as f64) * 2.0;

    hours_component + fairness_component + specialization_component + repetition_penalty
}

/// `assign(sector, week_start, schedule_plan_id)` (spec §4.G): binds
/// eligible employees to unassigned slots, one decision per slot.
#[tracing::instrument(skip(store, ctx))]
pub async fn assign(store: &Store, ctx: &mut PipelineContext<'_>, sector_id: SectorId, schedule_plan_id: SchedulePlanId) -> Result<Vec<RuleViolation>> {
    let mut violations = Vec::new();
    let slots = store.list_shift_slots(schedule_plan_id).await;
    let employees = store.list_employees_for_sector(sector_id).await;

    for (slot_id, slot) in &slots {
        if slot.is_assigned {
            continue;
        }

        let mut candidates: Vec<(EmployeeId, Employee)> = Vec::new();
        for (employee_id, employee) in &employees {
            if !employee.active || employee.is_unavailable_on(slot.target_date) {
                continue;
            }
            let projected_weekly_hours = employee.history.accumulated_week_hours + slot.hours_worked;
            let candidate_violations = validate(&ctx.rule_snapshot, &RuleCandidate { weekly_hours: Some(projected_weekly_hours), ..Default::default() });
            if candidate_violations.iter().any(|v| v.severity == Severity::Error) {
                continue;
            }
            violations.extend(candidate_violations);
            candidates.push((*employee_id, employee.clone()));
        }

        if candidates.is_empty() {
            ctx.trace.step("assignment.slot", &format!("no eligible candidate for slot on {}", slot.target_date)).constraints_violated = serde_json::json!(["no_eligible_candidate"]);
            continue;
        }

        let mut scored: Vec<ScoredCandidate> = candidates.iter().map(|(id, e)| ScoredCandidate { employee_id: *id, score: score_candidate(e, slot.weekday, &slot.template_name, slot.target_date) }).collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.employee_id.cmp(&b.employee_id)));

        let winner = &scored[0];
        store.update_shift_slot(*slot_id, |s| {
            s.employee_id = Some(winner.employee_id);
            s.is_assigned = true;
        }).await?;
        store
            .update_employee(winner.employee_id, |e| {
                e.history.accumulated_week_hours += slot.hours_worked;
                e.history.last_assigned_date = Some(slot.target_date);
                let key = format!("{:?}:{}", slot.weekday, slot.template_name);
                *e.history.recent_template_pattern_counts.entry(key).or_insert(0) += 1;
            })
            .await?;

        ctx.trace.step("assignment.slot", &format!("assigned {:?} to slot on {}", winner.employee_id, slot.target_date)).calculations = serde_json::json!({ "score": winner.score, "candidate_count": candidates.len() });
    }

    let all_slots = store.list_shift_slots(schedule_plan_id).await;
    let slot_values: Vec<_> = all_slots.into_iter().map(|(_, s)| s).collect();
    let slot_refs: Vec<&crate::domain::schedule::ShiftSlot> = slot_values.iter().collect();
    store.update_schedule_plan(schedule_plan_id, |p| p.recompute_totals(&slot_refs)).await?;

    Ok(violations)
}
