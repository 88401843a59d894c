//! Scenario S3 (SPEC_FULL §8): locking a second baseline for the same
//! `(sector, horizon_start)` supersedes the first; only the newer run stays
//! the active baseline.

use chrono::{Duration, NaiveDate, Utc};

use housekeeping_planning_core::domain::activity::{ActivityClassification, GovernanceActivity, WorkloadDriver};
use housekeeping_planning_core::domain::datalake::OccupancySnapshot;
use housekeeping_planning_core::domain::sector::{Sector, SectorOperationalParameters};
use housekeeping_planning_core::domain::trace::{AgentRun, RunType, TraceSink};
use housekeeping_planning_core::engines::{forecast, rules as rule_engine};
use housekeeping_planning_core::pipeline::PipelineContext;
use housekeeping_planning_core::store::Store;

async fn seed(store: &Store, sector_id: housekeeping_planning_core::ids::SectorId, total_rooms: i32, week_start: NaiveDate, as_of: chrono::DateTime<Utc>) {
    store.set_sector_params(SectorOperationalParameters::default_for(sector_id, total_rooms)).await;
    store
        .insert_activity(GovernanceActivity::new(sector_id, "Vacant-dirty clean", "VD_CLEAN", 25.0, WorkloadDriver::Variable, ActivityClassification::CalculatedByAgent, 2))
        .await;
    for offset in 0..7 {
        let target_date = week_start + Duration::days(offset);
        store
            .ingest_occupancy_snapshot(OccupancySnapshot {
                sector_id,
                target_date,
                generated_at: as_of - Duration::hours(1),
                period_start: target_date,
                period_end: target_date,
                occupancy_pct: 55.0,
                is_real: false,
                is_forecast: true,
                source_upload_id: format!("upload-{offset}"),
            })
            .await;
    }
}

#[tokio::test]
async fn locking_a_newer_baseline_supersedes_the_prior_one() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 100)).await;
    let week_start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let now = Utc::now();
    seed(&store, sector_id, 100, week_start, now).await;

    let mut agent_run = AgentRun::start(sector_id, week_start, RunType::Forecast, now);
    let rule_snapshot = rule_engine::get_constraints(&store, sector_id, week_start).await;
    let params = store.get_sector_params(sector_id).await.unwrap();
    let mut ctx = PipelineContext::new(sector_id, now, rule_snapshot, params, TraceSink::new(&mut agent_run));

    let run_a = forecast::create_baseline(&store, sector_id, week_start, now, &mut ctx).await.unwrap();
    forecast::lock(&store, run_a, now).await.unwrap();

    let locked_a = store.get_forecast_run(run_a).await.unwrap();
    assert!(locked_a.is_locked);
    assert!(locked_a.is_active_baseline(), "the only locked baseline so far should be active");

    let later = now + Duration::hours(2);
    let mut agent_run_b = AgentRun::start(sector_id, week_start, RunType::Forecast, later);
    let rule_snapshot_b = rule_engine::get_constraints(&store, sector_id, week_start).await;
    let params_b = store.get_sector_params(sector_id).await.unwrap();
    let mut ctx_b = PipelineContext::new(sector_id, later, rule_snapshot_b, params_b, TraceSink::new(&mut agent_run_b));

    let run_b = forecast::create_baseline(&store, sector_id, week_start, later, &mut ctx_b).await.unwrap();
    forecast::lock(&store, run_b, later).await.unwrap();

    let run_a_after = store.get_forecast_run(run_a).await.unwrap();
    assert_eq!(run_a_after.superseded_by, Some(run_b), "locking B should mark A as superseded by B");
    assert!(run_a_after.is_locked, "A stays locked, it is just no longer active");
    assert!(!run_a_after.is_active_baseline());

    let run_b_after = store.get_forecast_run(run_b).await.unwrap();
    assert!(run_b_after.is_active_baseline());

    let baselines = store.list_baseline_runs(sector_id, week_start).await;
    let active: Vec<_> = baselines.iter().filter(|(_, r)| r.is_active_baseline()).map(|(id, _)| *id).collect();
    assert_eq!(active, vec![run_b], "exactly one active baseline should remain, and it is the newer run");
}

#[tokio::test]
async fn locking_an_already_locked_run_is_rejected() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 100)).await;
    let week_start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let now = Utc::now();
    seed(&store, sector_id, 100, week_start, now).await;

    let mut agent_run = AgentRun::start(sector_id, week_start, RunType::Forecast, now);
    let rule_snapshot = rule_engine::get_constraints(&store, sector_id, week_start).await;
    let params = store.get_sector_params(sector_id).await.unwrap();
    let mut ctx = PipelineContext::new(sector_id, now, rule_snapshot, params, TraceSink::new(&mut agent_run));

    let run_id = forecast::create_baseline(&store, sector_id, week_start, now, &mut ctx).await.unwrap();
    forecast::lock(&store, run_id, now).await.unwrap();
    assert!(forecast::lock(&store, run_id, now).await.is_err(), "re-locking an already-locked baseline must be rejected");
}
