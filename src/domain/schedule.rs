use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::rules::Severity;
use crate::domain::weekday::Weekday;
use crate::ids::{EmployeeId, ForecastRunId, SchedulePlanId, SectorId, ShiftSlotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulePlanStatus {
    Draft,
    Final,
    Adjusted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulePlanKind {
    Baseline,
    Adjustment,
}

/// One entry of a legal-validation result (spec §4.F, §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationEntry {
    pub severity: Severity,
    pub rule_code: String,
    pub subject: String,
    pub message: String,
}

/// `(sector, forecast_run, week_start, week_end, plan_kind, baseline_plan_id?,
/// status, totals, coverage_by_hour, validations)` (spec §3). Invariant 3
/// (spec §8): `total_hours_planned = Σ shift_slot.hours_worked` and
/// `total_headcount_planned = |shift_slots|`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingSchedulePlan {
    pub sector_id: SectorId,
    pub forecast_run_id: ForecastRunId,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub plan_kind: SchedulePlanKind,
    /// An ADJUSTMENT plan always references a baseline plan (spec §3).
    pub baseline_plan_id: Option<SchedulePlanId>,
    pub status: SchedulePlanStatus,
    pub total_headcount_planned: i64,
    pub total_hours_planned: f64,
    /// Hour-of-day (0..23) -> count of slots covering that hour.
    pub coverage_by_hour: BTreeMap<u8, i64>,
    pub validations: Vec<ValidationEntry>,
    pub delta_vs_baseline: Option<ScheduleDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDelta {
    pub headcount_delta: i64,
    pub hours_delta: f64,
}

impl HousekeepingSchedulePlan {
    /// Recomputes the plan's totals from its *own* slots (caller must have
    /// already filtered by plan id). Enforces invariant 3 (spec §8) in one
    /// place rather than at every call site.
    pub fn recompute_totals(&mut self, own_slots: &[&ShiftSlot]) {
        self.total_headcount_planned = own_slots.len() as i64;
        self.total_hours_planned = own_slots.iter().map(|s| s.hours_worked).sum();
    }
}

/// One worker-sized presence unit (spec §3, GLOSSARY: "Shift slot").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftSlot {
    pub schedule_plan_id: SchedulePlanId,
    pub target_date: NaiveDate,
    pub weekday: Weekday,
    pub template_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub hours_worked: f64,
    pub employee_id: Option<EmployeeId>,
    pub is_assigned: bool,
}

impl ShiftSlot {
    pub fn contains_hour(&self, hour: u8) -> bool {
        let hour_time = NaiveTime::from_hms_opt(hour as u32 % 24, 0, 0).unwrap();
        let in_shift = if self.start_time <= self.end_time {
            self.start_time <= hour_time && hour_time < self.end_time
        } else {
            hour_time >= self.start_time || hour_time < self.end_time
        };
        if !in_shift {
            return false;
        }
        match (self.lunch_start, self.lunch_end) {
            (Some(ls), Some(le)) => !(ls <= hour_time && hour_time < le),
            _ => true,
        }
    }
}

/// A shift template the Schedule Generator draws slots from (spec §4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub hours: f64,
}

/// Lunch-window configuration (spec §4.F step 5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LunchRules {
    pub duration_minutes: i64,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub min_hours_before: f64,
    pub max_hours_before: f64,
}

/// A weekday-specific MANDATORY/FLEXIBLE work-shift override (spec §4.F,
/// "WorkShift day rules").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkShiftDayRule {
    pub weekday: Weekday,
    pub template_name: String,
    pub mandatory: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Audit row for manual headcount overrides (SPEC_FULL §3 supplement,
/// Scenario S5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOverrideLog {
    pub schedule_plan_id: SchedulePlanId,
    pub override_type: String,
    pub target_date: Option<NaiveDate>,
    pub original_value: serde_json::Value,
    pub new_value: serde_json::Value,
    pub reason: Option<String>,
}

/// Convocation preview row: one employee's aggregated slots plus their
/// validation status (spec §4.F "Convocation preview").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvocationPreviewEntry {
    pub employee_id: EmployeeId,
    pub total_hours: f64,
    pub slot_count: i64,
    pub label: PreviewLabel,
    pub validations: Vec<ValidationEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewLabel {
    Ok,
    Warning,
    Error,
}
