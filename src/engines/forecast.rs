//! Forecast-Run Engine (spec §4.D): versioned weekly forecasts with
//! lock/supersede semantics and as-of snapshot capture.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::forecast::{ExecutiveSummaryFlag, ForecastComparison, ForecastComparisonRow, ForecastDaily, ForecastDataSource, ForecastRun, ForecastRunSectorSnapshot, ForecastRunStatus, ForecastRunType, PrerequisitesVerdict};
use crate::domain::weekday::Weekday;
use crate::engines::stats;
use crate::error::{CoreError, Result};
use crate::ids::{ForecastRunId, SectorId};
use crate::pipeline::PipelineContext;
use crate::store::Store;

/// Prerequisites check for generating a baseline (spec §4.D): a structured
/// verdict across four axes, used to decide block vs. warn rather than
/// raising directly.
pub async fn check_prerequisites(store: &Store, sector_id: SectorId) -> PrerequisitesVerdict {
    let sector_exists = store.get_sector(sector_id).await.is_some();
    let operational_parameters_present = store.get_sector_params(sector_id).await.is_some();
    let has_active_activity = !store.list_activities_for_sector(sector_id).await.is_empty();
    let has_historical_occupancy = store.has_any_occupancy_snapshot(sector_id).await;
    PrerequisitesVerdict {
        sector_exists,
        operational_parameters_present,
        has_active_activity,
        has_historical_occupancy,
        // Week-specific data presence is evaluated per target week by the
        // caller (it depends on `horizon_start`, unknown at this point);
        // default true here and let `create_baseline` downgrade per day.
        week_specific_data_present: true,
    }
}

/// Picks `occ_raw` for `(sector, target_date)` using as-of semantics (spec
/// §4.D step 2): prefer the most recent non-real `OccupancySnapshot` with
/// `generated_at <= as_of`; fall back to `OccupancyLatest`.
async fn pick_occ_raw(store: &Store, sector_id: SectorId, target_date: NaiveDate, as_of: DateTime<Utc>) -> (Option<f64>, ForecastDataSource, Option<crate::ids::SnapshotId>, Option<DateTime<Utc>>) {
    let snapshots = store.list_snapshots_for_date(sector_id, target_date).await;
    let best = snapshots.into_iter().filter(|(_, s)| !s.is_real && s.generated_at <= as_of).max_by_key(|(_, s)| s.generated_at);

    if let Some((id, snapshot)) = best {
        return (Some(snapshot.occupancy_pct), ForecastDataSource::OccupancySnapshot, Some(id), Some(snapshot.generated_at));
    }

    let latest = store.get_occupancy_latest(sector_id, target_date).await;
    let occ_raw = latest.latest_forecast_occupancy_pct.or(latest.occupancy_pct);
    (occ_raw, ForecastDataSource::OccupancyLatest, None, latest.latest_forecast_generated_at)
}

async fn generate_forecast_daily_rows(store: &Store, run_id: ForecastRunId, sector_id: SectorId, horizon_start: NaiveDate, as_of: DateTime<Utc>, ctx: &mut PipelineContext<'_>) -> Vec<ForecastDaily> {
    let mut rows = Vec::with_capacity(7);
    for offset in 0..7 {
        let target_date = horizon_start + chrono::Duration::days(offset);
        let weekday = Weekday::from_chrono(target_date.weekday());
        let (occ_raw, source, source_snapshot_id, source_generated_at) = pick_occ_raw(store, sector_id, target_date, as_of).await;
        let (bias_pp, _has_bias) = stats::weekday_bias_or_default(store, sector_id, "occupancy", weekday).await;
        let safety_pp = ctx.params.safety_pp(weekday);

        let row = ForecastDaily::compute(run_id, target_date, occ_raw, bias_pp, safety_pp, source, source_snapshot_id, source_generated_at);
        ctx.trace.step("forecast.daily", &format!("{target_date}: occ_raw={occ_raw:?} bias={bias_pp:.2} safety={safety_pp:.2}"));
        rows.push(row);
    }
    rows
}

/// Baseline creation for `(sector, week_start)` (spec §4.D).
pub async fn create_baseline(store: &Store, sector_id: SectorId, horizon_start: NaiveDate, as_of: DateTime<Utc>, ctx: &mut PipelineContext<'_>) -> Result<ForecastRunId> {
    let verdict = check_prerequisites(store, sector_id).await;
    if verdict.blocks_baseline() {
        return Err(CoreError::Validation(vec![crate::domain::rules::RuleViolation {
            rule_code: "forecast_prerequisites".into(),
            severity: crate::domain::rules::Severity::Error,
            message: format!("baseline prerequisites not met: {verdict:?}"),
        }]));
    }

    let horizon_end = horizon_start + chrono::Duration::days(6);
    let run = ForecastRun {
        sector_id,
        run_type: ForecastRunType::Baseline,
        status: ForecastRunStatus::Running,
        horizon_start,
        horizon_end,
        as_of_datetime: as_of,
        is_locked: false,
        locked_at: None,
        superseded_by: None,
        bias_method: "ewma".into(),
        bias_params: serde_json::json!({ "alpha": crate::config::DEFAULT_EWMA_ALPHA }),
        params: serde_json::to_value(&ctx.rule_snapshot).unwrap_or(serde_json::Value::Null),
        created_at: as_of,
        error_message: None,
    };
    let run_id = store.insert_forecast_run(run).await;

    store
        .insert_forecast_run_snapshot(ForecastRunSectorSnapshot {
            forecast_run_id: run_id,
            sector_id,
            occ_projection_by_day: serde_json::Value::Null,
            labor_rules_snapshot: serde_json::to_value(&ctx.rule_snapshot).unwrap_or(serde_json::Value::Null),
            operational_rules_snapshot: serde_json::Value::Null,
            weekly_params_snapshot: serde_json::to_value(&ctx.params).unwrap_or(serde_json::Value::Null),
            sector_config: serde_json::Value::Null,
        })
        .await;

    let rows = generate_forecast_daily_rows(store, run_id, sector_id, horizon_start, as_of, ctx).await;
    for row in rows {
        store.insert_forecast_daily(row).await;
    }

    store.update_forecast_run(run_id, |r| r.status = ForecastRunStatus::Completed).await?;
    Ok(run_id)
}

/// Daily update (spec §4.D): same computation as baseline, `run_type =
/// DAILY_UPDATE`, never locked.
pub async fn create_daily_update(store: &Store, sector_id: SectorId, horizon_start: NaiveDate, as_of: DateTime<Utc>, ctx: &mut PipelineContext<'_>) -> Result<ForecastRunId> {
    let horizon_end = horizon_start + chrono::Duration::days(6);
    let run = ForecastRun {
        sector_id,
        run_type: ForecastRunType::DailyUpdate,
        status: ForecastRunStatus::Running,
        horizon_start,
        horizon_end,
        as_of_datetime: as_of,
        is_locked: false,
        locked_at: None,
        superseded_by: None,
        bias_method: "ewma".into(),
        bias_params: serde_json::json!({ "alpha": crate::config::DEFAULT_EWMA_ALPHA }),
        params: serde_json::to_value(&ctx.rule_snapshot).unwrap_or(serde_json::Value::Null),
        created_at: as_of,
        error_message: None,
    };
    let run_id = store.insert_forecast_run(run).await;
    let rows = generate_forecast_daily_rows(store, run_id, sector_id, horizon_start, as_of, ctx).await;
    for row in rows {
        store.insert_forecast_daily(row).await;
    }
    store.update_forecast_run(run_id, |r| r.status = ForecastRunStatus::Completed).await?;
    Ok(run_id)
}

/// `lock(run_id)` (spec §4.D): requires `run_type = BASELINE` and
/// `is_locked = false`. Supersedes any previously locked non-superseded
/// BASELINE in the same `(sector, horizon_start)`.
pub async fn lock(store: &Store, run_id: ForecastRunId, now: DateTime<Utc>) -> Result<()> {
    let run = store.get_forecast_run(run_id).await.ok_or_else(|| CoreError::NotFound(format!("forecast run {:?}", run_id)))?;
    if run.run_type != ForecastRunType::Baseline {
        return Err(CoreError::Conflict("only BASELINE runs can be locked".into()));
    }
    if run.is_locked {
        return Err(CoreError::Conflict("forecast run is already locked".into()));
    }

    let prior_baselines = store.list_baseline_runs(run.sector_id, run.horizon_start).await;
    for (other_id, other) in prior_baselines {
        if other_id != run_id && other.is_active_baseline() {
            store.update_forecast_run(other_id, |r| r.superseded_by = Some(run_id)).await?;
        }
    }

    store
        .update_forecast_run(run_id, |r| {
            r.is_locked = true;
            r.locked_at = Some(now);
        })
        .await
}

/// `compare(A, B)` (spec §4.D): per-date deltas `occ_adj_B - occ_adj_A`.
/// Dates absent on either side are null in the diff row.
pub async fn compare(store: &Store, run_a: ForecastRunId, run_b: ForecastRunId) -> ForecastComparison {
    let rows_a = store.list_forecast_daily(run_a).await;
    let rows_b = store.list_forecast_daily(run_b).await;

    let mut by_date: std::collections::BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = std::collections::BTreeMap::new();
    for row in rows_a {
        by_date.entry(row.target_date).or_insert((None, None)).0 = row.occ_adj;
    }
    for row in rows_b {
        by_date.entry(row.target_date).or_insert((None, None)).1 = row.occ_adj;
    }

    let mut deltas = Vec::new();
    let mut rows = Vec::new();
    for (target_date, (a, b)) in by_date {
        let delta = match (a, b) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        };
        if let Some(d) = delta {
            deltas.push(d.abs());
        }
        rows.push(ForecastComparisonRow { target_date, occ_adj_a: a, occ_adj_b: b, delta });
    }

    let mean_absolute_delta = if deltas.is_empty() { None } else { Some(deltas.iter().sum::<f64>() / deltas.len() as f64) };
    ForecastComparison { rows, mean_absolute_delta }
}

/// Forecast error (spec §4.D): for each `ForecastDaily` with `target_date <
/// today`, compare against `OccupancyLatest.latest_real_occupancy_pct`;
/// returns the mean error over days with real data (`None` if none).
pub async fn forecast_error(store: &Store, run_id: ForecastRunId, sector_id: SectorId, today: NaiveDate) -> Option<f64> {
    let rows = store.list_forecast_daily(run_id).await;
    let mut errors = Vec::new();
    for row in rows {
        if row.target_date >= today {
            continue;
        }
        let Some(occ_adj) = row.occ_adj else { continue };
        let latest = store.get_occupancy_latest(sector_id, row.target_date).await;
        if let Some(real) = latest.latest_real_occupancy_pct {
            errors.push(real - occ_adj);
        }
    }
    if errors.is_empty() {
        None
    } else {
        Some(errors.iter().sum::<f64>() / errors.len() as f64)
    }
}

/// Executive summary (spec §4.D): flags any day whose `|baseline_adj -
/// latest_daily_adj| > threshold` (default 2 pp).
pub async fn executive_summary(store: &Store, baseline_run_id: ForecastRunId, latest_daily_run_id: ForecastRunId, threshold_pp: f64) -> Vec<ExecutiveSummaryFlag> {
    let comparison = compare(store, baseline_run_id, latest_daily_run_id).await;
    comparison
        .rows
        .into_iter()
        .filter_map(|row| {
            let (Some(a), Some(b)) = (row.occ_adj_a, row.occ_adj_b) else { return None };
            let absolute_delta = (b - a).abs();
            if absolute_delta <= threshold_pp {
                return None;
            }
            let recommendation = if b > a {
                format!("occupancy on {} rose {absolute_delta:.1}pp above baseline; consider reinforcing the team", row.target_date)
            } else {
                format!("occupancy on {} fell {absolute_delta:.1}pp below baseline; consider reducing scheduled hours", row.target_date)
            };
            Some(ExecutiveSummaryFlag { target_date: row.target_date, baseline_adj: a, latest_daily_adj: b, absolute_delta, recommendation })
        })
        .collect()
}
