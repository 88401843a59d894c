use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::weekday::Weekday;
use crate::ids::{ForecastDailyId, ForecastRunId, SectorId, SnapshotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastRunType {
    Baseline,
    DailyUpdate,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastRunStatus {
    Running,
    Completed,
    Failed,
}

/// `(sector, run_type, horizon_start, horizon_end, as_of_datetime,
/// is_locked, locked_at, superseded_by, bias_method, bias_params, params)`
/// (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRun {
    pub sector_id: SectorId,
    pub run_type: ForecastRunType,
    pub status: ForecastRunStatus,
    pub horizon_start: NaiveDate,
    pub horizon_end: NaiveDate,
    pub as_of_datetime: DateTime<Utc>,
    pub is_locked: bool,
    pub locked_at: Option<DateTime<Utc>>,
    pub superseded_by: Option<ForecastRunId>,
    pub bias_method: String,
    pub bias_params: serde_json::Value,
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl ForecastRun {
    /// A baseline is the "active" one for `(sector, horizon_start)` when
    /// it is locked and not superseded (Design Notes §9: "stop at the
    /// first row where `is_locked` and `superseded_by` is null").
    pub fn is_active_baseline(&self) -> bool {
        self.run_type == ForecastRunType::Baseline && self.is_locked && self.superseded_by.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastDataSource {
    OccupancySnapshot,
    OccupancyLatest,
}

/// Per-target-date row inside a run (spec §3). `occ_adj = clamp(occ_raw +
/// bias_pp + safety_pp, 0, 100)` whenever `occ_raw` is present, else `None`
/// (invariant 1, spec §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDaily {
    pub forecast_run_id: ForecastRunId,
    pub target_date: NaiveDate,
    pub weekday: Weekday,
    pub occ_raw: Option<f64>,
    pub bias_pp_used: f64,
    pub safety_pp_used: f64,
    pub occ_adj: Option<f64>,
    pub source: ForecastDataSource,
    pub source_snapshot_id: Option<SnapshotId>,
    pub source_generated_at: Option<DateTime<Utc>>,
}

impl ForecastDaily {
    pub fn compute(forecast_run_id: ForecastRunId, target_date: NaiveDate, occ_raw: Option<f64>, bias_pp_used: f64, safety_pp_used: f64, source: ForecastDataSource, source_snapshot_id: Option<SnapshotId>, source_generated_at: Option<DateTime<Utc>>) -> Self {
        let occ_adj = occ_raw.map(|raw| (raw + bias_pp_used + safety_pp_used).clamp(0.0, 100.0));
        Self {
            forecast_run_id,
            target_date,
            weekday: Weekday::from_chrono(target_date.weekday()),
            occ_raw,
            bias_pp_used,
            safety_pp_used,
            occ_adj,
            source,
            source_snapshot_id,
            source_generated_at,
        }
    }
}

/// Frozen copy of rules/params captured at run-creation time (spec §3),
/// supporting faithful baseline-vs-adjustment comparisons later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRunSectorSnapshot {
    pub forecast_run_id: ForecastRunId,
    pub sector_id: SectorId,
    pub occ_projection_by_day: serde_json::Value,
    pub labor_rules_snapshot: serde_json::Value,
    pub operational_rules_snapshot: serde_json::Value,
    pub weekly_params_snapshot: serde_json::Value,
    pub sector_config: serde_json::Value,
}

/// Output of the forecast prerequisites check (spec §4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrerequisitesVerdict {
    pub sector_exists: bool,
    pub operational_parameters_present: bool,
    pub has_active_activity: bool,
    pub has_historical_occupancy: bool,
    pub week_specific_data_present: bool,
}

impl PrerequisitesVerdict {
    /// Block if any of the four axes fails.
    pub fn blocks_baseline(&self) -> bool {
        !(self.sector_exists && self.operational_parameters_present && self.has_active_activity && self.has_historical_occupancy)
    }

    /// Warn (but don't block) if week-specific data is missing.
    pub fn warns(&self) -> bool {
        !self.week_specific_data_present
    }
}

/// One row of a `compare(A, B)` result (spec §4.D): per-date deltas, absent
/// on either side is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastComparisonRow {
    pub target_date: NaiveDate,
    pub occ_adj_a: Option<f64>,
    pub occ_adj_b: Option<f64>,
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastComparison {
    pub rows: Vec<ForecastComparisonRow>,
    pub mean_absolute_delta: Option<f64>,
}

/// One flagged day in the executive summary (spec §4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummaryFlag {
    pub target_date: NaiveDate,
    pub baseline_adj: f64,
    pub latest_daily_adj: f64,
    pub absolute_delta: f64,
    pub recommendation: String,
}
