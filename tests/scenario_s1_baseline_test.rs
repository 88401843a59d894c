//! Scenario S1 (SPEC_FULL §8): a clean week, no bias, no safety margin.
//! Exercises the full forecast -> demand -> schedule chain end to end and
//! checks exact numbers at every stage, not just shape.

use chrono::{Duration, NaiveDate, Utc};

use housekeeping_planning_core::domain::datalake::OccupancySnapshot;
use housekeeping_planning_core::domain::sector::{Sector, SectorOperationalParameters};
use housekeeping_planning_core::domain::schedule::SchedulePlanKind;
use housekeeping_planning_core::domain::trace::{AgentRun, RunType, TraceSink};
use housekeeping_planning_core::engines::{demand, forecast, rules as rule_engine, schedule};
use housekeeping_planning_core::pipeline::PipelineContext;
use housekeeping_planning_core::store::Store;

// (weekday ordinal Mon=0..Sun=6) -> (departures_count, stayovers_estimated,
// headcount_rounded), worked out from the default turnover-by-weekday table
// at occ_adj = 60.0 against a 100-room sector with no constant activities.
const EXPECTED: [(i64, i64, i64); 7] = [
    (18, 42, 3), // Monday, rate 0.30
    (17, 43, 3), // Tuesday, rate 0.28
    (18, 42, 3), // Wednesday, rate 0.30
    (19, 41, 3), // Thursday, rate 0.32
    (27, 33, 3), // Friday, rate 0.45
    (33, 27, 3), // Saturday, rate 0.55
    (15, 45, 3), // Sunday, rate 0.25
];

#[tokio::test]
async fn clean_week_produces_exact_demand_and_schedule_numbers() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 100)).await;

    // No safety margin for this scenario: override the weekday-default
    // Fri/Sat/Sun safety points the sector otherwise ships with.
    let mut params = SectorOperationalParameters::default_for(sector_id, 100);
    params.safety_pp_by_weekday = [0.0; 7];
    store.set_sector_params(params).await;

    let week_start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(); // a Monday
    let as_of = Utc::now();

    for offset in 0..7 {
        let target_date = week_start + Duration::days(offset);
        store
            .ingest_occupancy_snapshot(OccupancySnapshot {
                sector_id,
                target_date,
                generated_at: as_of - Duration::hours(1),
                period_start: target_date,
                period_end: target_date,
                occupancy_pct: 60.0,
                is_real: false,
                is_forecast: true,
                source_upload_id: format!("upload-{offset}"),
            })
            .await;
    }

    let mut agent_run = AgentRun::start(sector_id, week_start, RunType::FullPipeline, as_of);
    let rule_snapshot = rule_engine::get_constraints(&store, sector_id, week_start).await;
    let params = store.get_sector_params(sector_id).await.unwrap();
    let mut ctx = PipelineContext::new(sector_id, as_of, rule_snapshot, params, TraceSink::new(&mut agent_run));

    let run_id = forecast::create_baseline(&store, sector_id, week_start, as_of, &mut ctx).await.unwrap();

    let forecast_rows = store.list_forecast_daily(run_id).await;
    assert_eq!(forecast_rows.len(), 7);
    for row in &forecast_rows {
        assert_eq!(row.occ_adj, Some(60.0), "no bias and no safety means occ_adj should equal occ_raw exactly");
        assert_eq!(row.bias_pp_used, 0.0);
        assert_eq!(row.safety_pp_used, 0.0);
    }

    let demand_ids = demand::compute_and_persist_for_run(&store, &mut ctx, run_id).await;
    assert_eq!(demand_ids.len(), 7);

    let demand_rows = store.list_demand_daily(run_id).await;
    for row in &demand_rows {
        let (expected_departures, expected_stayovers, expected_headcount) = EXPECTED[row.weekday.ordinal()];
        assert_eq!(row.occupied_rooms, 60, "{:?}", row.weekday);
        assert_eq!(row.departures_count, expected_departures, "{:?}", row.weekday);
        assert_eq!(row.stayovers_estimated, expected_stayovers, "{:?}", row.weekday);

        let expected_minutes_variable = expected_departures as f64 * 25.0 + expected_stayovers as f64 * 10.0;
        assert!((row.minutes_variable - expected_minutes_variable).abs() < 1e-9, "{:?}", row.weekday);
        assert_eq!(row.minutes_constant, 0.0);

        let expected_buffered = expected_minutes_variable * 1.10;
        assert!((row.minutes_buffered - expected_buffered).abs() < 1e-6, "{:?}", row.weekday);
        assert!((row.minutes_rule_adj - expected_buffered).abs() < 1e-6, "no calendar events or calc rules in this scenario");

        let expected_hours_total = (expected_buffered / 60.0) / 0.85;
        assert!((row.hours_total - expected_hours_total).abs() < 1e-6, "{:?}", row.weekday);
        assert_eq!(row.headcount_rounded, expected_headcount, "{:?}", row.weekday);
    }

    let plan_id = schedule::generate_plan(&store, &mut ctx, run_id, week_start, SchedulePlanKind::Baseline, None, &[]).await.unwrap();
    let plan = store.get_schedule_plan(plan_id).await.unwrap();

    // No hourly-distribution stats seeded -> morning_ratio falls back to its
    // default 0.55, so each day of headcount 3 splits into 2 morning + 1
    // afternoon slot.
    assert_eq!(plan.total_headcount_planned, 21, "3 slots/day over 7 days");
    assert!((plan.total_hours_planned - 147.0).abs() < 1e-6, "21 slots x 7h net of lunch");
    assert!(plan.coverage_by_hour.get(&9).copied().unwrap_or(0) >= 14, "2 morning slots/day x 7 days should cover hour 9");
}
