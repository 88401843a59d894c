//! Schedule Generator (spec §4.F): turns demand into shift slots per
//! template with lunch windows, hourly coverage, and legal validation.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::domain::rules::RuleConstraints;
use crate::domain::schedule::{ConvocationPreviewEntry, HousekeepingSchedulePlan, LunchRules, PreviewLabel, ScheduleDelta, SchedulePlanKind, SchedulePlanStatus, ShiftSlot, ShiftTemplate, ValidationEntry, WorkShiftDayRule};
use crate::domain::weekday::Weekday;
use crate::engines::rules::{validate, RuleCandidate};
use crate::error::Result;
use crate::ids::{ForecastRunId, SchedulePlanId};
use crate::pipeline::PipelineContext;
use crate::store::Store;

/// Default two-template day (spec §4.F step 2): morning 07:00-15:00 and
/// afternoon 14:00-22:00, ~8h each.
pub fn default_templates() -> [ShiftTemplate; 2] {
    [
        ShiftTemplate { name: "morning".into(), start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(), end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(), hours: 8.0 },
        ShiftTemplate { name: "afternoon".into(), start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(), end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(), hours: 8.0 },
    ]
}

pub fn default_lunch_rules() -> LunchRules {
    LunchRules { duration_minutes: 60, window_start: NaiveTime::from_hms_opt(11, 0, 0).unwrap(), window_end: NaiveTime::from_hms_opt(15, 0, 0).unwrap(), min_hours_before: 3.0, max_hours_before: 5.0 }
}

fn sum_pct_range(stats: &[crate::domain::datalake::HourlyDistributionStats], hours: std::ops::Range<u8>) -> f64 {
    stats.iter().filter(|s| hours.contains(&s.hour_timeline)).map(|s| s.pct_share).sum()
}

/// Workload weights and the clamped morning ratio (spec §4.F step 3).
async fn morning_ratio(store: &Store, sector_id: crate::ids::SectorId, weekday: Weekday) -> f64 {
    let checkout = store.list_hourly_distribution(sector_id, "checkout", weekday).await;
    let checkin = store.list_hourly_distribution(sector_id, "checkin", weekday).await;

    let morning_w = sum_pct_range(&checkout, 8..12) + 0.7 * sum_pct_range(&checkout, 12..14);
    let afternoon_w = 0.3 * sum_pct_range(&checkout, 12..14) + sum_pct_range(&checkin, 14..19) + sum_pct_range(&checkin, 19..23);

    if morning_w + afternoon_w <= 0.0 {
        return 0.55;
    }
    (morning_w / (morning_w + afternoon_w)).clamp(0.35, 0.65)
}

/// Splits `headcount` into `(morning_count, afternoon_count)` (spec §4.F
/// step 4), rebalancing so both are nonzero when `headcount >= 2`.
fn split_headcount(headcount: i64, ratio: f64) -> (i64, i64) {
    if headcount <= 0 {
        return (0, 0);
    }
    let mut morning = (headcount as f64 * ratio).round().max(1.0) as i64;
    if morning > headcount {
        morning = headcount;
    }
    let mut afternoon = headcount - morning;
    if headcount >= 2 {
        if morning == 0 {
            morning = 1;
            afternoon = headcount - 1;
        }
        if afternoon == 0 {
            afternoon = 1;
            morning = headcount - 1;
        }
    }
    (morning, afternoon)
}

/// Lunch window for a slot starting at `template.start_time` (spec §4.F
/// step 5): earliest start = `template_start + min_hours_before`, clipped
/// into `[window_start, window_end]`; `None` if infeasible.
fn compute_lunch_window(template: &ShiftTemplate, rules: &LunchRules) -> Option<(NaiveTime, NaiveTime)> {
    let earliest = template.start_time + Duration::minutes((rules.min_hours_before * 60.0) as i64);
    let latest = template.start_time + Duration::minutes((rules.max_hours_before * 60.0) as i64);
    let start = earliest.clamp(rules.window_start, rules.window_end);
    if start > latest {
        return None;
    }
    Some((start, start + Duration::minutes(rules.duration_minutes)))
}

fn build_slot(plan_id: SchedulePlanId, target_date: NaiveDate, weekday: Weekday, template: &ShiftTemplate, lunch_rules: &LunchRules) -> ShiftSlot {
    let lunch = compute_lunch_window(template, lunch_rules);
    let lunch_hours = lunch.map(|_| lunch_rules.duration_minutes as f64 / 60.0).unwrap_or(0.0);
    ShiftSlot {
        schedule_plan_id: plan_id,
        target_date,
        weekday,
        template_name: template.name.clone(),
        start_time: template.start_time,
        end_time: template.end_time,
        lunch_start: lunch.map(|(s, _)| s),
        lunch_end: lunch.map(|(_, e)| e),
        hours_worked: template.hours - lunch_hours,
        employee_id: None,
        is_assigned: false,
    }
}

/// Applies weekday-specific MANDATORY `WorkShiftDayRule`s in place
/// (spec §4.F, "WorkShift day rules"); FLEXIBLE rules do not override.
fn apply_workshift_day_rules(slot: &mut ShiftSlot, day_rules: &[WorkShiftDayRule]) {
    for rule in day_rules {
        if rule.weekday == slot.weekday && rule.template_name == slot.template_name && rule.mandatory {
            slot.start_time = rule.start_time;
            slot.end_time = rule.end_time;
        }
    }
}

async fn coverage_by_hour(slots: &[ShiftSlot]) -> BTreeMap<u8, i64> {
    let mut coverage = BTreeMap::new();
    for hour in 6..=23u8 {
        let count = slots.iter().filter(|s| s.contains_hour(hour)).count() as i64;
        coverage.insert(hour, count);
    }
    coverage
}

/// Generates a `HousekeepingSchedulePlan` with `ShiftSlot` children for the
/// 7 days of `week_start` (spec §4.F).
#[tracing::instrument(skip(store, ctx, day_rules))]
pub async fn generate_plan(store: &Store, ctx: &mut PipelineContext<'_>, forecast_run_id: ForecastRunId, week_start: NaiveDate, plan_kind: SchedulePlanKind, baseline_plan_id: Option<SchedulePlanId>, day_rules: &[WorkShiftDayRule]) -> Result<SchedulePlanId> {
    let templates = default_templates();
    let lunch_rules = default_lunch_rules();
    let week_end = week_start + Duration::days(6);

    let plan = HousekeepingSchedulePlan {
        sector_id: ctx.sector_id,
        forecast_run_id,
        week_start,
        week_end,
        plan_kind,
        baseline_plan_id,
        status: SchedulePlanStatus::Draft,
        total_headcount_planned: 0,
        total_hours_planned: 0.0,
        coverage_by_hour: BTreeMap::new(),
        validations: Vec::new(),
        delta_vs_baseline: None,
    };
    let plan_id = store.insert_schedule_plan(plan).await;

    let demand_rows = store.list_demand_daily(forecast_run_id).await;
    let mut all_slots = Vec::new();

    for demand in &demand_rows {
        let headcount = demand.headcount_rounded;
        let ratio = morning_ratio(store, ctx.sector_id, demand.weekday).await;
        let (morning_count, afternoon_count) = split_headcount(headcount, ratio);

        for _ in 0..morning_count {
            let mut slot = build_slot(plan_id, demand.target_date, demand.weekday, &templates[0], &lunch_rules);
            apply_workshift_day_rules(&mut slot, day_rules);
            all_slots.push(slot);
        }
        for _ in 0..afternoon_count {
            let mut slot = build_slot(plan_id, demand.target_date, demand.weekday, &templates[1], &lunch_rules);
            apply_workshift_day_rules(&mut slot, day_rules);
            all_slots.push(slot);
        }

        ctx.trace.step("schedule.day", &format!("{}: headcount={headcount} morning={morning_count} afternoon={afternoon_count}", demand.target_date));
    }

    let coverage = coverage_by_hour(&all_slots).await;
    let slot_refs: Vec<&ShiftSlot> = all_slots.iter().collect();

    for slot in all_slots {
        store.insert_shift_slot(slot).await;
    }

    store
        .update_schedule_plan(plan_id, |p| {
            p.recompute_totals(&slot_refs);
            p.coverage_by_hour = coverage;
        })
        .await?;

    if let Some(baseline_id) = baseline_plan_id {
        if let Some(baseline) = store.get_schedule_plan(baseline_id).await {
            let updated = store.get_schedule_plan(plan_id).await.expect("just inserted");
            let delta = ScheduleDelta { headcount_delta: updated.total_headcount_planned - baseline.total_headcount_planned, hours_delta: updated.total_hours_planned - baseline.total_hours_planned };
            store.update_schedule_plan(plan_id, |p| p.delta_vs_baseline = Some(delta)).await?;
        }
    }

    Ok(plan_id)
}

/// `validate_legal(plan)` (spec §4.F): advance-notice per slot, weekly/daily
/// hour caps and consecutive-days per employee. Persists the ordered
/// validation list on the plan.
pub async fn validate_legal(store: &Store, plan_id: SchedulePlanId, constraints: &RuleConstraints, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<ValidationEntry>> {
    let slots = store.list_shift_slots(plan_id).await;
    let mut entries = Vec::new();

    for (_, slot) in &slots {
        let shift_start = slot.target_date.and_time(slot.start_time).and_utc();
        let hours_until_start = (shift_start - now).num_minutes() as f64 / 60.0;
        let violations = validate(constraints, &RuleCandidate { advance_notice_hours: Some(hours_until_start), ..Default::default() });
        for v in violations {
            entries.push(ValidationEntry { severity: v.severity, rule_code: v.rule_code, subject: format!("slot on {}", slot.target_date), message: v.message });
        }
    }

    let mut by_employee: std::collections::HashMap<crate::ids::EmployeeId, Vec<&ShiftSlot>> = std::collections::HashMap::new();
    for (_, slot) in &slots {
        if let Some(employee_id) = slot.employee_id {
            by_employee.entry(employee_id).or_default().push(slot);
        }
    }
    for (employee_id, employee_slots) in by_employee {
        let weekly_hours: f64 = employee_slots.iter().map(|s| s.hours_worked).sum();
        let mut by_day: std::collections::HashMap<NaiveDate, f64> = std::collections::HashMap::new();
        let mut worked_dates: Vec<NaiveDate> = Vec::new();
        for slot in &employee_slots {
            *by_day.entry(slot.target_date).or_insert(0.0) += slot.hours_worked;
            worked_dates.push(slot.target_date);
        }
        worked_dates.sort();
        worked_dates.dedup();
        let consecutive_days = longest_consecutive_run(&worked_dates);

        let daily_max = by_day.values().cloned().fold(0.0_f64, f64::max);
        let violations = validate(
            constraints,
            &RuleCandidate { weekly_hours: Some(weekly_hours), daily_hours: Some(daily_max), consecutive_worked_days: Some(consecutive_days), ..Default::default() },
        );
        for v in violations {
            entries.push(ValidationEntry { severity: v.severity, rule_code: v.rule_code, subject: format!("employee {:?}", employee_id), message: v.message });
        }
    }

    store.update_schedule_plan(plan_id, |p| p.validations = entries.clone()).await?;
    Ok(entries)
}

fn longest_consecutive_run(sorted_dates: &[NaiveDate]) -> u32 {
    if sorted_dates.is_empty() {
        return 0;
    }
    let mut longest = 1u32;
    let mut current = 1u32;
    for window in sorted_dates.windows(2) {
        if (window[1] - window[0]).num_days() == 1 {
            current += 1;
        } else {
            current = 1;
        }
        longest = longest.max(current);
    }
    longest
}

/// Convocation preview (spec §4.F): group assigned slots by employee,
/// aggregate totals, merge validations, label `ok | warning | error`.
pub async fn convocation_preview(store: &Store, plan_id: SchedulePlanId) -> Vec<ConvocationPreviewEntry> {
    let slots = store.list_shift_slots(plan_id).await;
    let validations = store.get_schedule_plan(plan_id).await.map(|p| p.validations).unwrap_or_default();

    let mut by_employee: std::collections::HashMap<crate::ids::EmployeeId, (f64, i64)> = std::collections::HashMap::new();
    for (_, slot) in &slots {
        if let Some(employee_id) = slot.employee_id {
            let entry = by_employee.entry(employee_id).or_insert((0.0, 0));
            entry.0 += slot.hours_worked;
            entry.1 += 1;
        }
    }

    by_employee
        .into_iter()
        .map(|(employee_id, (total_hours, slot_count))| {
            let employee_validations: Vec<ValidationEntry> = validations.iter().filter(|v| v.subject == format!("employee {:?}", employee_id)).cloned().collect();
            let label = if employee_validations.iter().any(|v| v.severity == crate::domain::rules::Severity::Error) {
                PreviewLabel::Error
            } else if !employee_validations.is_empty() {
                PreviewLabel::Warning
            } else {
                PreviewLabel::Ok
            };
            ConvocationPreviewEntry { employee_id, total_hours, slot_count, label, validations: employee_validations }
        })
        .collect()
}

/// Headcount override for `target_date` (Scenario S5): removes unassigned
/// slots first, writes a `ScheduleOverrideLog` row, and recomputes totals
/// atomically from the caller's point of view (both the slot removal and
/// the log insert happen before this function returns).
pub async fn override_headcount(store: &Store, plan_id: SchedulePlanId, target_date: NaiveDate, new_headcount: i64, reason: Option<String>) -> Result<()> {
    let mut day_slots = store.list_shift_slots_for_date(plan_id, target_date).await;
    let original_count = day_slots.len() as i64;
    let to_remove = (original_count - new_headcount).max(0);

    day_slots.sort_by_key(|(_, s)| s.is_assigned);
    let mut removed = 0;
    for (slot_id, slot) in &day_slots {
        if removed >= to_remove {
            break;
        }
        if slot.is_assigned {
            continue;
        }
        store.remove_shift_slot(*slot_id).await?;
        removed += 1;
    }

    store
        .push_override_log(crate::domain::schedule::ScheduleOverrideLog {
            schedule_plan_id: plan_id,
            override_type: "headcount".into(),
            target_date: Some(target_date),
            original_value: serde_json::json!(original_count),
            new_value: serde_json::json!(original_count - removed),
            reason,
        })
        .await;

    let all_slots = store.list_shift_slots(plan_id).await;
    let slot_values: Vec<ShiftSlot> = all_slots.into_iter().map(|(_, s)| s).collect();
    let slot_refs: Vec<&ShiftSlot> = slot_values.iter().collect();
    store.update_schedule_plan(plan_id, |p| p.recompute_totals(&slot_refs)).await
}
