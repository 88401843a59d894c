//! Scenario S2 (SPEC_FULL §8): a single EWMA bias update from a cold start,
//! then an occ_adj computation that consumes the resulting bias alongside a
//! nonzero safety margin.

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;

use housekeeping_planning_core::domain::forecast::{ForecastDataSource, ForecastDaily};
use housekeeping_planning_core::domain::sector::{Sector, SectorOperationalParameters};
use housekeeping_planning_core::domain::trace::{AgentRun, RunType, TraceSink};
use housekeeping_planning_core::domain::weekday::Weekday;
use housekeeping_planning_core::engines::{rules as rule_engine, stats};
use housekeeping_planning_core::pipeline::PipelineContext;
use housekeeping_planning_core::store::Store;

#[tokio::test]
async fn ewma_bias_from_cold_start_then_applied_occ_adj() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 100)).await;
    store.set_sector_params(SectorOperationalParameters::default_for(sector_id, 100)).await;

    let week_start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
    let now = Utc::now();
    let mut agent_run = AgentRun::start(sector_id, week_start, RunType::Forecast, now);
    let rule_snapshot = rule_engine::get_constraints(&store, sector_id, week_start).await;
    let params = store.get_sector_params(sector_id).await.unwrap();
    let mut ctx = PipelineContext::new(sector_id, now, rule_snapshot, params, TraceSink::new(&mut agent_run));

    assert!(store.get_weekday_bias(sector_id, "occupancy", Weekday::Friday).await.is_none(), "no bias should exist before the first update");

    let mut errors_by_weekday = HashMap::new();
    errors_by_weekday.insert(Weekday::Friday, vec![5.0]);
    stats::update_weekday_bias(&store, sector_id, "occupancy", errors_by_weekday, 0.2, &mut ctx).await;

    let bias = store.get_weekday_bias(sector_id, "occupancy", Weekday::Friday).await.unwrap();
    assert_eq!(bias.bias_pp, 1.0, "(1 - 0.2) * 0.0 + 0.2 * 5.0 = 1.0");
    assert_eq!(bias.n, 1);
    assert_eq!(bias.mae_pp, 5.0);
    assert_eq!(bias.std_pp, 0.0, "a single-sample batch has zero population variance");

    let run_id = {
        let mut map: slotmap::SlotMap<housekeeping_planning_core::ids::ForecastRunId, ()> = slotmap::SlotMap::with_key();
        map.insert(())
    };
    let friday = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
    let row = ForecastDaily::compute(run_id, friday, Some(70.0), bias.bias_pp, 2.0, ForecastDataSource::OccupancyLatest, None, None);
    assert_eq!(row.occ_adj, Some(73.0), "occ_raw 70.0 + bias 1.0 + safety 2.0 = 73.0");
}
