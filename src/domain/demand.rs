use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::weekday::Weekday;
use crate::ids::{ForecastRunId, SectorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepartureSource {
    Real,
    TurnoverStats,
    DefaultFallback,
}

/// Per-(run, target_date) demand row (spec §3). `headcount_rounded =
/// ceil(max(0, headcount_required))` (invariant 2, spec §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingDemandDaily {
    pub forecast_run_id: ForecastRunId,
    pub sector_id: SectorId,
    pub target_date: NaiveDate,
    pub weekday: Weekday,

    pub occupied_rooms: i64,
    pub departures_count: i64,
    pub departures_source: DepartureSource,
    pub arrivals_count: i64,
    pub arrivals_source: DepartureSource,
    pub stayovers_estimated: i64,

    pub minutes_variable: f64,
    pub minutes_constant: f64,
    pub minutes_raw: f64,
    pub minutes_buffered: f64,
    pub minutes_cal_adj: f64,
    pub minutes_rule_adj: f64,

    pub hours_productive: f64,
    pub hours_total: f64,
    pub headcount_required: f64,
    pub headcount_rounded: i64,

    pub block_convocations: bool,

    /// `{formula, method_version, inputs, calendar_factors,
    /// constant_activities, regras_aplicadas, calculations}` (spec §6):
    /// the "calculation memory" surfaced via the explanation interface.
    pub calculation_breakdown: serde_json::Value,
}

impl HousekeepingDemandDaily {
    /// `headcount_rounded = ceil(max(0, headcount_required))`; `0` when
    /// `headcount_required <= 0` (spec §4.E, invariant 2, boundary: exactly
    /// `1.0` rounds to `1`, not `2`).
    pub fn round_headcount(headcount_required: f64) -> i64 {
        headcount_required.max(0.0).ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headcount_rounding_is_ceiling_with_zero_floor() {
        assert_eq!(HousekeepingDemandDaily::round_headcount(-3.2), 0);
        assert_eq!(HousekeepingDemandDaily::round_headcount(0.0), 0);
        assert_eq!(HousekeepingDemandDaily::round_headcount(1.0), 1);
        assert_eq!(HousekeepingDemandDaily::round_headcount(1.0001), 2);
        assert_eq!(HousekeepingDemandDaily::round_headcount(3.2), 4);
    }
}
