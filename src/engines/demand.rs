//! Demand Engine (spec §4.E): translates occupancy + events + activity
//! catalog into per-day minutes and headcount.

use chrono::NaiveDate;

use crate::config;
use crate::domain::calendar::compose_calendar_factors;
use crate::domain::datalake::EventType;
use crate::domain::demand::{DepartureSource, HousekeepingDemandDaily};
use crate::domain::rules::SectorCalcScope;
use crate::domain::weekday::Weekday;
use crate::ids::ForecastRunId;
use crate::pipeline::PipelineContext;
use crate::store::Store;

/// best-of departures/arrivals fallback chain (spec §4.E step 2): real
/// events, then turnover-rate stats, then the default-by-weekday table.
async fn best_of_turnover_count(store: &Store, ctx: &PipelineContext<'_>, target_date: NaiveDate, weekday: Weekday, event_type: EventType, occupied_rooms: i64, default_table: &[f64; 7]) -> (i64, DepartureSource) {
    let real_rows = store.list_hourly_agg_for_date(ctx.sector_id, target_date, event_type).await;
    if !real_rows.is_empty() {
        let count: u32 = real_rows.iter().map(|r| r.count_events).sum();
        return (count as i64, DepartureSource::Real);
    }

    if let Some(stats) = store.get_turnover_stats(ctx.sector_id, weekday, event_type).await {
        if !stats.fallback_used {
            let count = (occupied_rooms as f64 * stats.rate).round() as i64;
            return (count, DepartureSource::TurnoverStats);
        }
    }

    let rate = default_table[weekday.ordinal()];
    let count = (occupied_rooms as f64 * rate).round() as i64;
    (count, DepartureSource::DefaultFallback)
}

/// Sums constant-workload-driver program items for `target_date` (spec
/// §4.E: `minutes_constant = sum programmed items for d where
/// workload_driver = CONSTANT`).
async fn sum_constant_minutes(store: &Store, ctx: &PipelineContext<'_>, target_date: NaiveDate) -> f64 {
    let items = store.list_program_items(ctx.sector_id, target_date).await;
    let mut total = 0.0;
    for item in items {
        if let Some(activity) = store.get_activity(item.activity_id).await {
            if activity.workload_driver == crate::domain::activity::WorkloadDriver::Constant {
                total += item.minutes;
            }
        }
    }
    total
}

/// Applies `SectorCalculationRule`s of the given scope, in priority
/// ascending order, evaluating each rule's condition/action expression
/// (spec §4.E: "apply rules of scope DEMAND, then scope ADJUSTMENTS, in
/// priority order"). Condition/action expressions are opaque strings at
/// this layer (spec leaves the expression language unspecified); only the
/// well-known `multiply:<factor>` and `add_minutes:<n>` forms are
/// interpreted, matching the handful of concrete operations `calculation_breakdown`
/// needs to explain.
fn apply_calc_rules(minutes: f64, rules: &[crate::domain::rules::SectorCalculationRule], applied: &mut Vec<String>) -> f64 {
    let mut current = minutes;
    let mut sorted: Vec<&crate::domain::rules::SectorCalculationRule> = rules.iter().collect();
    sorted.sort_by_key(|r| r.priority);
    for rule in sorted {
        if let Some(factor_str) = rule.action_expression.strip_prefix("multiply:") {
            if let Ok(factor) = factor_str.parse::<f64>() {
                current *= factor;
                applied.push(format!("{}::{}", rule.condition_expression, rule.action_expression));
            }
        } else if let Some(amount_str) = rule.action_expression.strip_prefix("add_minutes:") {
            if let Ok(amount) = amount_str.parse::<f64>() {
                current += amount;
                applied.push(format!("{}::{}", rule.condition_expression, rule.action_expression));
            }
        }
    }
    current
}

/// Computes one day's `HousekeepingDemandDaily` row (spec §4.E formula).
#[tracing::instrument(skip(store, ctx, calendar_events))]
pub async fn compute_day(store: &Store, ctx: &mut PipelineContext<'_>, forecast_run_id: ForecastRunId, target_date: NaiveDate, occ_adj: Option<f64>, calendar_events: &[crate::domain::calendar::OperationalCalendarEvent]) -> HousekeepingDemandDaily {
    let weekday = Weekday::from_chrono(target_date.weekday());
    let total_rooms = ctx.params.total_rooms;

    let occupied_rooms = occ_adj.map(|pct| (total_rooms as f64 * pct / 100.0).round() as i64).unwrap_or(0);

    let (departures_count, departures_source) = best_of_turnover_count(store, ctx, target_date, weekday, EventType::CheckOut, occupied_rooms, &config::DEFAULT_DEPARTURE_TURNOVER_BY_WEEKDAY).await;
    let (arrivals_count, arrivals_source) = best_of_turnover_count(store, ctx, target_date, weekday, EventType::CheckIn, occupied_rooms, &config::DEFAULT_ARRIVAL_TURNOVER_BY_WEEKDAY).await;
    let stayovers_estimated = (occupied_rooms - departures_count).max(0);

    let minutes_variable = departures_count as f64 * ctx.params.cleaning_time_vacant_dirty_min + stayovers_estimated as f64 * ctx.params.cleaning_time_stayover_min;
    let minutes_constant = sum_constant_minutes(store, ctx, target_date).await;
    let minutes_raw = minutes_variable + minutes_constant;
    let minutes_buffered = minutes_raw * (1.0 + ctx.params.buffer_pct / 100.0);

    let calendar_factors = compose_calendar_factors(target_date, ctx.sector_id, calendar_events);
    let minutes_cal_adj = minutes_buffered * calendar_factors.demand_factor;

    let demand_rules = store.list_sector_calc_rules(ctx.sector_id, SectorCalcScope::Demand).await;
    let adjustment_rules = store.list_sector_calc_rules(ctx.sector_id, SectorCalcScope::Adjustments).await;
    let mut applied_rules = Vec::new();
    let minutes_after_demand = apply_calc_rules(minutes_cal_adj, &demand_rules, &mut applied_rules);
    let minutes_rule_adj = apply_calc_rules(minutes_after_demand, &adjustment_rules, &mut applied_rules);

    let hours_productive = minutes_rule_adj / 60.0;
    let adjusted_utilization = ctx.params.target_utilization_pct * calendar_factors.productivity_factor;
    let hours_total = hours_productive / (adjusted_utilization / 100.0);
    let headcount_required = hours_total / ctx.params.avg_shift_hours;
    let headcount_rounded = HousekeepingDemandDaily::round_headcount(headcount_required);

    ctx.trace.step("demand.compute_day", &format!("{target_date}: headcount_rounded={headcount_rounded}")).calculations = serde_json::json!({
        "occupied_rooms": occupied_rooms,
        "departures_count": departures_count,
        "arrivals_count": arrivals_count,
        "minutes_raw": minutes_raw,
        "minutes_buffered": minutes_buffered,
        "minutes_cal_adj": minutes_cal_adj,
        "minutes_rule_adj": minutes_rule_adj,
        "hours_total": hours_total,
        "headcount_required": headcount_required,
    });

    let calculation_breakdown = serde_json::json!({
        "formula": "housekeeping_demand_v1",
        "method_version": 1,
        "inputs": {
            "occ_adj": occ_adj,
            "total_rooms": total_rooms,
            "buffer_pct": ctx.params.buffer_pct,
            "utilization_target_pct": ctx.params.target_utilization_pct,
        },
        "calendar_factors": {
            "productivity_factor": calendar_factors.productivity_factor,
            "demand_factor": calendar_factors.demand_factor,
            "block_convocations": calendar_factors.block_convocations,
            "applied_events": calendar_factors.applied_events,
        },
        "constant_activities": minutes_constant,
        "regras_aplicadas": applied_rules,
        "calculations": {
            "minutes_variable": minutes_variable,
            "minutes_raw": minutes_raw,
            "minutes_buffered": minutes_buffered,
            "minutes_cal_adj": minutes_cal_adj,
            "minutes_rule_adj": minutes_rule_adj,
            "hours_productive": hours_productive,
            "hours_total": hours_total,
            "headcount_required": headcount_required,
        },
    });

    HousekeepingDemandDaily {
        forecast_run_id,
        sector_id: ctx.sector_id,
        target_date,
        weekday,
        occupied_rooms,
        departures_count,
        departures_source,
        arrivals_count,
        arrivals_source,
        stayovers_estimated,
        minutes_variable,
        minutes_constant,
        minutes_raw,
        minutes_buffered,
        minutes_cal_adj,
        minutes_rule_adj,
        hours_productive,
        hours_total,
        headcount_required,
        headcount_rounded,
        block_convocations: calendar_factors.block_convocations,
        calculation_breakdown,
    }
}

/// Computes and persists demand for every `ForecastDaily` row in a run
/// (spec §4.E, applied across the whole horizon).
pub async fn compute_and_persist_for_run(store: &Store, ctx: &mut PipelineContext<'_>, forecast_run_id: ForecastRunId) -> Vec<crate::ids::DemandDailyId> {
    let forecast_rows = store.list_forecast_daily(forecast_run_id).await;
    let calendar_events = store.list_calendar_events().await;
    let mut ids = Vec::with_capacity(forecast_rows.len());
    for row in forecast_rows {
        let demand = compute_day(store, ctx, forecast_run_id, row.target_date, row.occ_adj, &calendar_events).await;
        ids.push(store.insert_demand_daily(demand).await);
    }
    ids
}
