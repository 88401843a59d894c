//! Environment / configuration defaults recognized by the core (spec §6).
//!
//! These are the hard-coded fallbacks; `PipelineConfig` lets a caller
//! override any of them per run without introducing a file-based config
//! format (none is named by the spec).

/// Default EWMA smoothing factor for weekday bias updates.
pub const DEFAULT_EWMA_ALPHA: f64 = 0.2;

/// Default convocation response window, in hours.
pub const DEFAULT_RESPONSE_DEADLINE_HOURS: i64 = 24;

/// Default minimum advance notice for a convocation, in hours.
pub const DEFAULT_ADVANCE_NOTICE_HOURS: i64 = 72;

/// Default minutes buffer applied on top of raw demand minutes.
pub const DEFAULT_BUFFER_PCT: f64 = 10.0;

/// Default productive-hours utilization target.
pub const DEFAULT_UTILIZATION_TARGET_PCT: f64 = 85.0;

/// Default replan threshold, in occupancy percentage points.
pub const DEFAULT_REPLAN_THRESHOLD_PP: f64 = 5.0;

/// Default executive-summary forecast-deviation flag threshold, in pp.
pub const DEFAULT_FORECAST_DEVIATION_THRESHOLD_PP: f64 = 2.0;

/// Default per-slot shift length used to derive headcount from hours.
pub const DEFAULT_AVG_SHIFT_HOURS: f64 = 8.0;

/// Default per-activity agenda item cap, in minutes (§4.H).
pub const DEFAULT_AGENDA_ITEM_CAP_MINUTES: i64 = 60;

/// `default_turnover_by_weekday` fallback table (spec §4.E, range 0.25..0.55),
/// indexed by `Weekday` ordinal (Mon=0..Sun=6).
pub const DEFAULT_DEPARTURE_TURNOVER_BY_WEEKDAY: [f64; 7] = [0.30, 0.28, 0.30, 0.32, 0.45, 0.55, 0.25];

/// Fallback arrivals-rate table, same shape as the departures table, used
/// when neither real events nor arrival-rate stats are available.
pub const DEFAULT_ARRIVAL_TURNOVER_BY_WEEKDAY: [f64; 7] = [0.25, 0.25, 0.28, 0.30, 0.50, 0.45, 0.20];

/// The storage reference time zone (spec §4.A / §6): all persisted
/// timestamps are UTC; conversion from local-time source artifacts happens
/// at ingest, outside this crate's scope.
pub const STORAGE_TIME_ZONE: &str = "UTC";

/// Per-run overrides of the defaults above. Every field defaults to the
/// corresponding `DEFAULT_*` constant so a caller only has to set what it
/// actually wants to change.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ewma_alpha: f64,
    pub response_deadline_hours: i64,
    pub advance_notice_hours: i64,
    pub buffer_pct: f64,
    pub utilization_target_pct: f64,
    pub replan_threshold_pp: f64,
    pub forecast_deviation_threshold_pp: f64,
    pub avg_shift_hours: f64,
    pub agenda_item_cap_minutes: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ewma_alpha: DEFAULT_EWMA_ALPHA,
            response_deadline_hours: DEFAULT_RESPONSE_DEADLINE_HOURS,
            advance_notice_hours: DEFAULT_ADVANCE_NOTICE_HOURS,
            buffer_pct: DEFAULT_BUFFER_PCT,
            utilization_target_pct: DEFAULT_UTILIZATION_TARGET_PCT,
            replan_threshold_pp: DEFAULT_REPLAN_THRESHOLD_PP,
            forecast_deviation_threshold_pp: DEFAULT_FORECAST_DEVIATION_THRESHOLD_PP,
            avg_shift_hours: DEFAULT_AVG_SHIFT_HOURS,
            agenda_item_cap_minutes: DEFAULT_AGENDA_ITEM_CAP_MINUTES,
        }
    }
}
