use chrono::{NaiveDate, Utc};

use housekeeping_planning_core::domain::demand::{DepartureSource, HousekeepingDemandDaily};
use housekeeping_planning_core::domain::forecast::{ForecastRun, ForecastRunStatus, ForecastRunType};
use housekeeping_planning_core::domain::rules::RuleConstraints;
use housekeeping_planning_core::domain::schedule::{HousekeepingSchedulePlan, SchedulePlanKind, SchedulePlanStatus};
use housekeeping_planning_core::domain::sector::SectorOperationalParameters;
use housekeeping_planning_core::domain::suggestion::{SuggestionStatus, SuggestionType};
use housekeeping_planning_core::domain::trace::{AgentRun, RunType, TraceSink};
use housekeeping_planning_core::domain::weekday::Weekday;
use housekeeping_planning_core::engines::suggestion;
use housekeeping_planning_core::ids::ForecastRunId;
use housekeeping_planning_core::pipeline::PipelineContext;
use housekeeping_planning_core::store::Store;

fn demand_row(forecast_run_id: ForecastRunId, sector_id: housekeeping_planning_core::ids::SectorId, target_date: NaiveDate, occ_adj: f64, headcount_rounded: i64, headcount_required: f64) -> HousekeepingDemandDaily {
    HousekeepingDemandDaily {
        forecast_run_id,
        sector_id,
        target_date,
        weekday: Weekday::from_chrono(target_date.weekday()),
        occupied_rooms: 80,
        departures_count: 20,
        departures_source: DepartureSource::DefaultFallback,
        arrivals_count: 20,
        arrivals_source: DepartureSource::DefaultFallback,
        stayovers_estimated: 60,
        minutes_variable: 1000.0,
        minutes_constant: 0.0,
        minutes_raw: 1000.0,
        minutes_buffered: 1100.0,
        minutes_cal_adj: 1100.0,
        minutes_rule_adj: 1100.0,
        hours_productive: 18.0,
        hours_total: 21.0,
        headcount_required,
        headcount_rounded,
        block_convocations: false,
        calculation_breakdown: serde_json::json!({ "inputs": { "occ_adj": occ_adj } }),
    }
}

async fn fake_run(store: &Store, sector_id: housekeeping_planning_core::ids::SectorId, horizon_start: NaiveDate, now: chrono::DateTime<Utc>) -> ForecastRunId {
    store
        .insert_forecast_run(ForecastRun {
            sector_id,
            run_type: ForecastRunType::Baseline,
            status: ForecastRunStatus::Completed,
            horizon_start,
            horizon_end: horizon_start + chrono::Duration::days(6),
            as_of_datetime: now,
            is_locked: true,
            locked_at: Some(now),
            superseded_by: None,
            bias_method: "none".into(),
            bias_params: serde_json::Value::Null,
            params: serde_json::Value::Null,
            created_at: now,
            error_message: None,
        })
        .await
}

#[tokio::test]
async fn a_headcount_increase_emits_a_reinforce_team_suggestion() {
    let store = Store::new();
    let sector_id = store.insert_sector(housekeeping_planning_core::domain::sector::Sector::new("Tower A", 100)).await;
    let now = Utc::now();
    let horizon_start = now.date_naive();

    let baseline_run = fake_run(&store, sector_id, horizon_start, now).await;
    let live_run = fake_run(&store, sector_id, horizon_start, now).await;

    store.insert_demand_daily(demand_row(baseline_run, sector_id, horizon_start, 60.0, 3, 2.6)).await;
    store.insert_demand_daily(demand_row(live_run, sector_id, horizon_start, 78.0, 5, 4.4)).await;

    let plan_id = store
        .insert_schedule_plan(HousekeepingSchedulePlan {
            sector_id,
            forecast_run_id: baseline_run,
            week_start: horizon_start,
            week_end: horizon_start + chrono::Duration::days(6),
            plan_kind: SchedulePlanKind::Baseline,
            baseline_plan_id: None,
            status: SchedulePlanStatus::Final,
            total_headcount_planned: 3,
            total_hours_planned: 24.0,
            coverage_by_hour: Default::default(),
            validations: Vec::new(),
            delta_vs_baseline: None,
        })
        .await;

    let mut agent_run = AgentRun::start(sector_id, horizon_start, RunType::Suggestion, now);
    let params = SectorOperationalParameters::default_for(sector_id, 100);
    let ctx = PipelineContext::new(sector_id, now, RuleConstraints::default(), params, TraceSink::new(&mut agent_run));

    let ids = suggestion::compare_and_persist(&store, &ctx, plan_id, baseline_run, live_run).await;
    assert_eq!(ids.len(), 1);

    let replan = store.get_replan_suggestion(ids[0]).await.unwrap();
    assert_eq!(replan.delta, Some(2.0));
    assert_eq!(replan.target_date, horizon_start);

    let daily_rows = store.list_daily_suggestions(plan_id).await;
    assert_eq!(daily_rows.len(), 1);
    let (daily_id, daily) = &daily_rows[0];
    assert_eq!(daily.suggestion_type, SuggestionType::ReinforceTeam);
    assert_eq!(daily.status, SuggestionStatus::Open);

    suggestion::transition_daily_suggestion(&store, *daily_id, SuggestionStatus::Applied).await.unwrap();
    let updated = store.get_daily_suggestion(*daily_id).await.unwrap();
    assert_eq!(updated.status, SuggestionStatus::Applied);

    let rejected = suggestion::transition_daily_suggestion(&store, *daily_id, SuggestionStatus::Ignored).await;
    assert!(rejected.is_err(), "APPLIED must not transition back to IGNORED");
}

#[tokio::test]
async fn unchanged_demand_emits_no_suggestion() {
    let store = Store::new();
    let sector_id = store.insert_sector(housekeeping_planning_core::domain::sector::Sector::new("Tower A", 100)).await;
    let now = Utc::now();
    let horizon_start = now.date_naive();

    let baseline_run = fake_run(&store, sector_id, horizon_start, now).await;
    let live_run = fake_run(&store, sector_id, horizon_start, now).await;

    store.insert_demand_daily(demand_row(baseline_run, sector_id, horizon_start, 60.0, 3, 2.6)).await;
    store.insert_demand_daily(demand_row(live_run, sector_id, horizon_start, 60.2, 3, 2.61)).await;

    let plan_id = store
        .insert_schedule_plan(HousekeepingSchedulePlan {
            sector_id,
            forecast_run_id: baseline_run,
            week_start: horizon_start,
            week_end: horizon_start + chrono::Duration::days(6),
            plan_kind: SchedulePlanKind::Baseline,
            baseline_plan_id: None,
            status: SchedulePlanStatus::Final,
            total_headcount_planned: 3,
            total_hours_planned: 24.0,
            coverage_by_hour: Default::default(),
            validations: Vec::new(),
            delta_vs_baseline: None,
        })
        .await;

    let mut agent_run = AgentRun::start(sector_id, horizon_start, RunType::Suggestion, now);
    let params = SectorOperationalParameters::default_for(sector_id, 100);
    let ctx = PipelineContext::new(sector_id, now, RuleConstraints::default(), params, TraceSink::new(&mut agent_run));

    let ids = suggestion::compare_and_persist(&store, &ctx, plan_id, baseline_run, live_run).await;
    assert!(ids.is_empty(), "a 0.2pp occupancy wobble under the 5pp threshold must not trigger a replan suggestion");
}
