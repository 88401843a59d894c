//! The Data-Lake Store plus every other entity collection the pipeline
//! writes to, generalizing the teacher's `ReservationStore`
//! (`slotmap::SlotMap` behind an `Arc<RwLock<..>>`, see
//! `domain/vrm_system_model/reservation/reservation_store.rs` in the
//! teacher repo) from a single entity type to the whole data model.
//!
//! Suspension points: every method that touches `inner` takes the
//! `tokio::sync::RwLock` guard, matching spec §5 ("every call into the
//! Data-Lake Store or rule engine may block on the underlying storage").
//! No process-wide mutable cache lives here — each call re-reads the
//! locked state (spec §5, "Shared-resource policy").

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use slotmap::SlotMap;
use tokio::sync::{Mutex, RwLock};

use crate::domain::activity::{ActivityPeriodicity, GovernanceActivity};
use crate::domain::activity_program::{ActivityProgramItem, ActivityProgramWeek};
use crate::domain::agenda::EmployeeDailyAgenda;
use crate::domain::calendar::OperationalCalendarEvent;
use crate::domain::convocation::Convocation;
use crate::domain::datalake::{
    EventType, FrontdeskEvent, FrontdeskEventsHourlyAgg, HourlyDistributionStats, OccupancyLatest, OccupancySnapshot, TurnoverRateStats, WeekdayBiasStats,
};
use crate::domain::demand::HousekeepingDemandDaily;
use crate::domain::forecast::{ForecastDaily, ForecastRun, ForecastRunSectorSnapshot};
use crate::domain::rules::{Rule, RuleOwner, SectorCalculationRule};
use crate::domain::schedule::{HousekeepingSchedulePlan, ScheduleOverrideLog, ShiftSlot};
use crate::domain::sector::{Employee, Sector, SectorOperationalParameters};
use crate::domain::suggestion::{DailySuggestion, ReplanSuggestion};
use crate::domain::trace::AgentRun;
use crate::domain::weekday::Weekday;
use crate::error::{CoreError, Result};
use crate::ids::*;

#[derive(Default)]
struct StoreInner {
    sectors: SlotMap<SectorId, Sector>,
    sector_params: HashMap<SectorId, SectorOperationalParameters>,

    employees: SlotMap<EmployeeId, Employee>,
    activities: SlotMap<ActivityId, GovernanceActivity>,
    periodicities: SlotMap<PeriodicityId, ActivityPeriodicity>,

    program_weeks: HashMap<(SectorId, NaiveDate), ActivityProgramWeek>,
    program_items: Vec<((SectorId, NaiveDate), ActivityProgramItem)>,

    occupancy_snapshots: SlotMap<SnapshotId, OccupancySnapshot>,
    ingested_uploads: HashMap<(String, NaiveDate, DateTime<Utc>), SnapshotId>,
    occupancy_latest: HashMap<(SectorId, NaiveDate), OccupancyLatest>,

    frontdesk_events: Vec<FrontdeskEvent>,
    hourly_agg: Vec<FrontdeskEventsHourlyAgg>,

    weekday_bias: HashMap<(SectorId, String, Weekday), WeekdayBiasStats>,
    hourly_distribution: HashMap<(SectorId, String, Weekday, u8), HourlyDistributionStats>,
    turnover_stats: HashMap<(SectorId, Weekday, EventType), TurnoverRateStats>,

    rules: SlotMap<RuleId, Rule>,
    sector_calc_rules: SlotMap<SectorCalcRuleId, SectorCalculationRule>,
    rule_codes: HashSet<String>,

    calendar_events: Vec<OperationalCalendarEvent>,

    forecast_runs: SlotMap<ForecastRunId, ForecastRun>,
    forecast_daily: SlotMap<ForecastDailyId, ForecastDaily>,
    forecast_snapshots: SlotMap<ForecastRunSnapshotId, ForecastRunSectorSnapshot>,

    demand_daily: SlotMap<DemandDailyId, HousekeepingDemandDaily>,

    schedule_plans: SlotMap<SchedulePlanId, HousekeepingSchedulePlan>,
    shift_slots: SlotMap<ShiftSlotId, ShiftSlot>,
    override_logs: Vec<ScheduleOverrideLog>,

    agendas: SlotMap<AgendaId, EmployeeDailyAgenda>,

    convocations: SlotMap<ConvocationId, Convocation>,

    replan_suggestions: SlotMap<ReplanSuggestionId, ReplanSuggestion>,
    daily_suggestions: SlotMap<DailySuggestionId, DailySuggestion>,

    agent_runs: SlotMap<AgentRunId, AgentRun>,
}

/// The append-only core plus every derived/downstream collection.
///
/// Cloning a `Store` clones the `Arc`, so every clone shares the same
/// underlying state — analogous to how the teacher's `ReservationStore`
/// is handed around by value across scheduler components.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
    /// Per-`schedule_plan_id` advisory locks (spec §5: "concurrent
    /// regenerations on the same plan must be serialized"). Keyed locks
    /// live independently of `inner` so holding one never blocks reads of
    /// unrelated plans.
    agenda_locks: Arc<RwLock<HashMap<SchedulePlanId, Arc<Mutex<()>>>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Sectors / employees / activities -------------------------------

    pub async fn insert_sector(&self, sector: Sector) -> SectorId {
        self.inner.write().await.sectors.insert(sector)
    }

    pub async fn get_sector(&self, id: SectorId) -> Option<Sector> {
        self.inner.read().await.sectors.get(id).cloned()
    }

    pub async fn set_sector_params(&self, params: SectorOperationalParameters) {
        self.inner.write().await.sector_params.insert(params.sector_id, params);
    }

    pub async fn get_sector_params(&self, sector_id: SectorId) -> Option<SectorOperationalParameters> {
        self.inner.read().await.sector_params.get(&sector_id).cloned()
    }

    pub async fn insert_employee(&self, employee: Employee) -> EmployeeId {
        self.inner.write().await.employees.insert(employee)
    }

    pub async fn get_employee(&self, id: EmployeeId) -> Option<Employee> {
        self.inner.read().await.employees.get(id).cloned()
    }

    pub async fn update_employee(&self, id: EmployeeId, f: impl FnOnce(&mut Employee)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let employee = guard.employees.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("employee {:?}", id)))?;
        f(employee);
        Ok(())
    }

    pub async fn list_employees_for_sector(&self, sector_id: SectorId) -> Vec<(EmployeeId, Employee)> {
        self.inner.read().await.employees.iter().filter(|(_, e)| e.sector_id == sector_id).map(|(id, e)| (id, e.clone())).collect()
    }

    pub async fn insert_activity(&self, activity: GovernanceActivity) -> ActivityId {
        self.inner.write().await.activities.insert(activity)
    }

    pub async fn get_activity(&self, id: ActivityId) -> Option<GovernanceActivity> {
        self.inner.read().await.activities.get(id).cloned()
    }

    pub async fn list_activities_for_sector(&self, sector_id: SectorId) -> Vec<(ActivityId, GovernanceActivity)> {
        self.inner.read().await.activities.iter().filter(|(_, a)| a.sector_id == sector_id && a.active).map(|(id, a)| (id, a.clone())).collect()
    }

    pub async fn insert_periodicity(&self, periodicity: ActivityPeriodicity) -> PeriodicityId {
        self.inner.write().await.periodicities.insert(periodicity)
    }

    pub async fn get_periodicity(&self, id: PeriodicityId) -> Option<ActivityPeriodicity> {
        self.inner.read().await.periodicities.get(id).cloned()
    }

    // ---- Activity program -------------------------------------------------

    pub async fn set_program_week(&self, week: ActivityProgramWeek) -> Result<()> {
        let mut guard = self.inner.write().await;
        let key = (week.sector_id, week.week_start);
        if let Some(existing) = guard.program_weeks.get(&key) {
            if !existing.can_mutate() {
                return Err(CoreError::Conflict(format!("activity program for {:?}/{} is locked", week.sector_id, week.week_start)));
            }
        }
        guard.program_weeks.insert(key, week);
        Ok(())
    }

    pub async fn add_program_item(&self, sector_id: SectorId, week_start: NaiveDate, item: ActivityProgramItem) -> Result<()> {
        let mut guard = self.inner.write().await;
        let key = (sector_id, week_start);
        if let Some(week) = guard.program_weeks.get(&key) {
            if !week.can_mutate() {
                return Err(CoreError::Conflict(format!("activity program for {:?}/{} is locked", sector_id, week_start)));
            }
        }
        guard.program_items.push((key, item));
        Ok(())
    }

    pub async fn list_program_items(&self, sector_id: SectorId, target_date: NaiveDate) -> Vec<ActivityProgramItem> {
        let guard = self.inner.read().await;
        let week_start = target_date - chrono::Duration::days(target_date.weekday().num_days_from_monday() as i64);
        guard
            .program_items
            .iter()
            .filter(|(key, item)| *key == (sector_id, week_start) && item.target_date == target_date)
            .map(|(_, item)| item.clone())
            .collect()
    }

    // ---- Occupancy / events ------------------------------------------------

    /// Idempotent ingestion (spec §4.A): re-ingesting the same
    /// `(source_upload_id, target_date, generated_at)` returns the prior id
    /// rather than inserting a duplicate, and updates
    /// [`OccupancyLatest`] per the spec's update rule.
    pub async fn ingest_occupancy_snapshot(&self, snapshot: OccupancySnapshot) -> SnapshotId {
        let mut guard = self.inner.write().await;
        let key = snapshot.idempotency_key();
        if let Some(existing_id) = guard.ingested_uploads.get(&key) {
            return *existing_id;
        }
        let sector_id = snapshot.sector_id;
        let target_date = snapshot.target_date;
        let id = guard.occupancy_snapshots.insert(snapshot.clone());
        guard.ingested_uploads.insert(key, id);
        guard.occupancy_latest.entry((sector_id, target_date)).or_default().apply_snapshot(&snapshot);
        id
    }

    pub async fn get_occupancy_snapshot(&self, id: SnapshotId) -> Option<OccupancySnapshot> {
        self.inner.read().await.occupancy_snapshots.get(id).cloned()
    }

    pub async fn list_snapshots_for_date(&self, sector_id: SectorId, target_date: NaiveDate) -> Vec<(SnapshotId, OccupancySnapshot)> {
        self.inner
            .read()
            .await
            .occupancy_snapshots
            .iter()
            .filter(|(_, s)| s.sector_id == sector_id && s.target_date == target_date)
            .map(|(id, s)| (id, s.clone()))
            .collect()
    }

    pub async fn has_any_occupancy_snapshot(&self, sector_id: SectorId) -> bool {
        self.inner.read().await.occupancy_snapshots.values().any(|s| s.sector_id == sector_id)
    }

    pub async fn get_occupancy_latest(&self, sector_id: SectorId, target_date: NaiveDate) -> OccupancyLatest {
        self.inner.read().await.occupancy_latest.get(&(sector_id, target_date)).cloned().unwrap_or_default()
    }

    pub async fn ingest_frontdesk_event(&self, event: FrontdeskEvent) {
        self.inner.write().await.frontdesk_events.push(event);
    }

    pub async fn upsert_hourly_agg(&self, agg: FrontdeskEventsHourlyAgg) {
        let mut guard = self.inner.write().await;
        if let Some(existing) = guard
            .hourly_agg
            .iter_mut()
            .find(|a| a.sector_id == agg.sector_id && a.operational_date == agg.operational_date && a.hour_timeline == agg.hour_timeline && a.event_type == agg.event_type)
        {
            existing.count_events += agg.count_events;
        } else {
            guard.hourly_agg.push(agg);
        }
    }

    pub async fn list_hourly_agg_for_sector(&self, sector_id: SectorId) -> Vec<FrontdeskEventsHourlyAgg> {
        self.inner.read().await.hourly_agg.iter().filter(|a| a.sector_id == sector_id).cloned().collect()
    }

    pub async fn list_hourly_agg_for_date(&self, sector_id: SectorId, target_date: NaiveDate, event_type: EventType) -> Vec<FrontdeskEventsHourlyAgg> {
        self.inner
            .read()
            .await
            .hourly_agg
            .iter()
            .filter(|a| a.sector_id == sector_id && a.operational_date == target_date && a.event_type == event_type)
            .cloned()
            .collect()
    }

    // ---- Statistics ---------------------------------------------------------

    pub async fn set_weekday_bias(&self, stats: WeekdayBiasStats) {
        let mut guard = self.inner.write().await;
        guard.weekday_bias.insert((stats.sector_id, stats.metric_name.clone(), stats.weekday), stats);
    }

    pub async fn get_weekday_bias(&self, sector_id: SectorId, metric_name: &str, weekday: Weekday) -> Option<WeekdayBiasStats> {
        self.inner.read().await.weekday_bias.get(&(sector_id, metric_name.to_string(), weekday)).cloned()
    }

    pub async fn set_hourly_distribution(&self, stats: HourlyDistributionStats) {
        let mut guard = self.inner.write().await;
        guard.hourly_distribution.insert((stats.sector_id, stats.metric_name.clone(), stats.weekday, stats.hour_timeline), stats);
    }

    pub async fn list_hourly_distribution(&self, sector_id: SectorId, metric_name: &str, weekday: Weekday) -> Vec<HourlyDistributionStats> {
        self.inner
            .read()
            .await
            .hourly_distribution
            .values()
            .filter(|s| s.sector_id == sector_id && s.metric_name == metric_name && s.weekday == weekday)
            .cloned()
            .collect()
    }

    pub async fn set_turnover_stats(&self, stats: TurnoverRateStats) {
        let mut guard = self.inner.write().await;
        guard.turnover_stats.insert((stats.sector_id, stats.weekday, stats.event_type), stats);
    }

    pub async fn get_turnover_stats(&self, sector_id: SectorId, weekday: Weekday, event_type: EventType) -> Option<TurnoverRateStats> {
        self.inner.read().await.turnover_stats.get(&(sector_id, weekday, event_type)).cloned()
    }

    // ---- Rules ---------------------------------------------------------------

    pub async fn insert_rule(&self, rule: Rule) -> Result<RuleId> {
        let mut guard = self.inner.write().await;
        if guard.rule_codes.contains(&rule.code) {
            return Err(CoreError::Conflict(format!("rule code '{}' already exists", rule.code)));
        }
        guard.rule_codes.insert(rule.code.clone());
        Ok(guard.rules.insert(rule))
    }

    pub async fn get_rule(&self, id: RuleId) -> Option<Rule> {
        self.inner.read().await.rules.get(id).cloned()
    }

    pub async fn update_rule(&self, id: RuleId, f: impl FnOnce(&mut Rule)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let rule = guard.rules.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("rule {:?}", id)))?;
        f(rule);
        Ok(())
    }

    /// Rules applicable to `sector_id`: every global rule, plus every rule
    /// owned by that sector (spec §4.C).
    pub async fn list_rules_for_sector(&self, sector_id: SectorId) -> Vec<(RuleId, Rule)> {
        self.inner
            .read()
            .await
            .rules
            .iter()
            .filter(|(_, r)| matches!(r.owner, RuleOwner::Global) || r.owner == RuleOwner::Sector(sector_id))
            .map(|(id, r)| (id, r.clone()))
            .collect()
    }

    pub async fn insert_sector_calc_rule(&self, rule: SectorCalculationRule) -> SectorCalcRuleId {
        self.inner.write().await.sector_calc_rules.insert(rule)
    }

    pub async fn list_sector_calc_rules(&self, sector_id: SectorId, scope: crate::domain::rules::SectorCalcScope) -> Vec<SectorCalculationRule> {
        self.inner.read().await.sector_calc_rules.values().filter(|r| r.sector_id == sector_id && r.scope == scope && r.active).cloned().collect()
    }

    // ---- Calendar --------------------------------------------------------------

    pub async fn insert_calendar_event(&self, event: OperationalCalendarEvent) {
        self.inner.write().await.calendar_events.push(event);
    }

    pub async fn list_calendar_events(&self) -> Vec<OperationalCalendarEvent> {
        self.inner.read().await.calendar_events.clone()
    }

    // ---- Forecasts -----------------------------------------------------------

    pub async fn insert_forecast_run(&self, run: ForecastRun) -> ForecastRunId {
        self.inner.write().await.forecast_runs.insert(run)
    }

    pub async fn get_forecast_run(&self, id: ForecastRunId) -> Option<ForecastRun> {
        self.inner.read().await.forecast_runs.get(id).cloned()
    }

    pub async fn update_forecast_run(&self, id: ForecastRunId, f: impl FnOnce(&mut ForecastRun)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let run = guard.forecast_runs.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("forecast run {:?}", id)))?;
        f(run);
        Ok(())
    }

    /// Every BASELINE run for `(sector, horizon_start)`, used by `lock` to
    /// find prior locked/non-superseded runs to supersede (spec §4.D).
    pub async fn list_baseline_runs(&self, sector_id: SectorId, horizon_start: NaiveDate) -> Vec<(ForecastRunId, ForecastRun)> {
        self.inner
            .read()
            .await
            .forecast_runs
            .iter()
            .filter(|(_, r)| r.sector_id == sector_id && r.horizon_start == horizon_start && r.run_type == crate::domain::forecast::ForecastRunType::Baseline)
            .map(|(id, r)| (id, r.clone()))
            .collect()
    }

    pub async fn insert_forecast_daily(&self, row: ForecastDaily) -> ForecastDailyId {
        self.inner.write().await.forecast_daily.insert(row)
    }

    /// Rows ordered ascending by `target_date` (spec §5, "Ordering
    /// guarantees").
    pub async fn list_forecast_daily(&self, run_id: ForecastRunId) -> Vec<ForecastDaily> {
        let mut rows: Vec<ForecastDaily> = self.inner.read().await.forecast_daily.values().filter(|d| d.forecast_run_id == run_id).cloned().collect();
        rows.sort_by_key(|d| d.target_date);
        rows
    }

    pub async fn insert_forecast_run_snapshot(&self, snapshot: ForecastRunSectorSnapshot) -> ForecastRunSnapshotId {
        self.inner.write().await.forecast_snapshots.insert(snapshot)
    }

    // ---- Demand ----------------------------------------------------------------

    pub async fn insert_demand_daily(&self, row: HousekeepingDemandDaily) -> DemandDailyId {
        self.inner.write().await.demand_daily.insert(row)
    }

    pub async fn list_demand_daily(&self, run_id: ForecastRunId) -> Vec<HousekeepingDemandDaily> {
        let mut rows: Vec<HousekeepingDemandDaily> = self.inner.read().await.demand_daily.values().filter(|d| d.forecast_run_id == run_id).cloned().collect();
        rows.sort_by_key(|d| d.target_date);
        rows
    }

    // ---- Schedule ----------------------------------------------------------------

    pub async fn insert_schedule_plan(&self, plan: HousekeepingSchedulePlan) -> SchedulePlanId {
        self.inner.write().await.schedule_plans.insert(plan)
    }

    pub async fn get_schedule_plan(&self, id: SchedulePlanId) -> Option<HousekeepingSchedulePlan> {
        self.inner.read().await.schedule_plans.get(id).cloned()
    }

    pub async fn update_schedule_plan(&self, id: SchedulePlanId, f: impl FnOnce(&mut HousekeepingSchedulePlan)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let plan = guard.schedule_plans.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("schedule plan {:?}", id)))?;
        f(plan);
        Ok(())
    }

    pub async fn insert_shift_slot(&self, slot: ShiftSlot) -> ShiftSlotId {
        self.inner.write().await.shift_slots.insert(slot)
    }

    pub async fn get_shift_slot(&self, id: ShiftSlotId) -> Option<ShiftSlot> {
        self.inner.read().await.shift_slots.get(id).cloned()
    }

    pub async fn update_shift_slot(&self, id: ShiftSlotId, f: impl FnOnce(&mut ShiftSlot)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let slot = guard.shift_slots.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("shift slot {:?}", id)))?;
        f(slot);
        Ok(())
    }

    pub async fn remove_shift_slot(&self, id: ShiftSlotId) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.shift_slots.remove(id).ok_or_else(|| CoreError::NotFound(format!("shift slot {:?}", id)))?;
        Ok(())
    }

    /// Slots ordered by `(target_date, start_time)` for presentation (spec
    /// §5).
    pub async fn list_shift_slots(&self, plan_id: SchedulePlanId) -> Vec<(ShiftSlotId, ShiftSlot)> {
        let mut rows: Vec<(ShiftSlotId, ShiftSlot)> = self.inner.read().await.shift_slots.iter().filter(|(_, s)| s.schedule_plan_id == plan_id).map(|(id, s)| (id, s.clone())).collect();
        rows.sort_by_key(|(_, s)| (s.target_date, s.start_time));
        rows
    }

    pub async fn list_shift_slots_for_date(&self, plan_id: SchedulePlanId, target_date: NaiveDate) -> Vec<(ShiftSlotId, ShiftSlot)> {
        self.list_shift_slots(plan_id).await.into_iter().filter(|(_, s)| s.target_date == target_date).collect()
    }

    pub async fn push_override_log(&self, log: ScheduleOverrideLog) {
        self.inner.write().await.override_logs.push(log);
    }

    pub async fn list_override_logs(&self, plan_id: SchedulePlanId) -> Vec<ScheduleOverrideLog> {
        self.inner.read().await.override_logs.iter().filter(|l| l.schedule_plan_id == plan_id).cloned().collect()
    }

    // ---- Agendas --------------------------------------------------------------

    /// Acquires the advisory lock for `plan_id`, required before any
    /// agenda-regeneration delete+recreate transaction (spec §5).
    pub async fn lock_agenda_regeneration(&self, plan_id: SchedulePlanId) -> tokio::sync::OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.agenda_locks.write().await;
            locks.entry(plan_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        mutex.lock_owned().await
    }

    /// Deletes every prior agenda for `plan_id` (spec §3: "regenerated from
    /// scratch on each agenda run — prior agendas for the plan are deleted
    /// first").
    pub async fn delete_agendas_for_plan(&self, plan_id: SchedulePlanId) {
        let mut guard = self.inner.write().await;
        let stale: Vec<AgendaId> = guard.agendas.iter().filter(|(_, a)| a.schedule_plan_id == plan_id).map(|(id, _)| id).collect();
        for id in stale {
            guard.agendas.remove(id);
        }
    }

    pub async fn insert_agenda(&self, agenda: EmployeeDailyAgenda) -> AgendaId {
        self.inner.write().await.agendas.insert(agenda)
    }

    pub async fn list_agendas_for_plan(&self, plan_id: SchedulePlanId) -> Vec<(AgendaId, EmployeeDailyAgenda)> {
        self.inner.read().await.agendas.iter().filter(|(_, a)| a.schedule_plan_id == plan_id).map(|(id, a)| (id, a.clone())).collect()
    }

    // ---- Convocations ----------------------------------------------------------

    pub async fn insert_convocation(&self, convocation: Convocation) -> ConvocationId {
        self.inner.write().await.convocations.insert(convocation)
    }

    pub async fn get_convocation(&self, id: ConvocationId) -> Option<Convocation> {
        self.inner.read().await.convocations.get(id).cloned()
    }

    pub async fn update_convocation(&self, id: ConvocationId, f: impl FnOnce(&mut Convocation)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let convocation = guard.convocations.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("convocation {:?}", id)))?;
        f(convocation);
        Ok(())
    }

    pub async fn list_convocations_for_employee(&self, employee_id: EmployeeId) -> Vec<(ConvocationId, Convocation)> {
        self.inner.read().await.convocations.iter().filter(|(_, c)| c.employee_id == employee_id).map(|(id, c)| (id, c.clone())).collect()
    }

    pub async fn list_pending_convocations(&self) -> Vec<(ConvocationId, Convocation)> {
        self.inner
            .read()
            .await
            .convocations
            .iter()
            .filter(|(_, c)| c.status == crate::domain::convocation::ConvocationStatus::Pending)
            .map(|(id, c)| (id, c.clone()))
            .collect()
    }

    // ---- Suggestions -----------------------------------------------------------

    pub async fn insert_replan_suggestion(&self, suggestion: ReplanSuggestion) -> ReplanSuggestionId {
        self.inner.write().await.replan_suggestions.insert(suggestion)
    }

    pub async fn get_replan_suggestion(&self, id: ReplanSuggestionId) -> Option<ReplanSuggestion> {
        self.inner.read().await.replan_suggestions.get(id).cloned()
    }

    pub async fn update_replan_suggestion(&self, id: ReplanSuggestionId, f: impl FnOnce(&mut ReplanSuggestion)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let suggestion = guard.replan_suggestions.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("replan suggestion {:?}", id)))?;
        f(suggestion);
        Ok(())
    }

    pub async fn list_replan_suggestions(&self, plan_id: SchedulePlanId) -> Vec<(ReplanSuggestionId, ReplanSuggestion)> {
        self.inner.read().await.replan_suggestions.iter().filter(|(_, s)| s.schedule_plan_id == plan_id).map(|(id, s)| (id, s.clone())).collect()
    }

    pub async fn insert_daily_suggestion(&self, suggestion: DailySuggestion) -> DailySuggestionId {
        self.inner.write().await.daily_suggestions.insert(suggestion)
    }

    pub async fn get_daily_suggestion(&self, id: DailySuggestionId) -> Option<DailySuggestion> {
        self.inner.read().await.daily_suggestions.get(id).cloned()
    }

    pub async fn update_daily_suggestion(&self, id: DailySuggestionId, f: impl FnOnce(&mut DailySuggestion)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let suggestion = guard.daily_suggestions.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("daily suggestion {:?}", id)))?;
        f(suggestion);
        Ok(())
    }

    pub async fn list_daily_suggestions(&self, plan_id: SchedulePlanId) -> Vec<(DailySuggestionId, DailySuggestion)> {
        self.inner.read().await.daily_suggestions.iter().filter(|(_, s)| s.schedule_plan_id == plan_id).map(|(id, s)| (id, s.clone())).collect()
    }

    // ---- Agent runs -------------------------------------------------------------

    pub async fn insert_agent_run(&self, run: AgentRun) -> AgentRunId {
        self.inner.write().await.agent_runs.insert(run)
    }

    pub async fn get_agent_run(&self, id: AgentRunId) -> Option<AgentRun> {
        self.inner.read().await.agent_runs.get(id).cloned()
    }

    pub async fn update_agent_run(&self, id: AgentRunId, f: impl FnOnce(&mut AgentRun)) -> Result<()> {
        let mut guard = self.inner.write().await;
        let run = guard.agent_runs.get_mut(id).ok_or_else(|| CoreError::NotFound(format!("agent run {:?}", id)))?;
        f(run);
        Ok(())
    }
}
