use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::weekday::Weekday;
use crate::ids::SectorId;

/// An immutable occupancy record (spec §3, §4.A). Append-only: once
/// ingested a snapshot is never mutated, only superseded by `OccupancyLatest`
/// bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub sector_id: SectorId,
    pub target_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub occupancy_pct: f64,
    pub is_real: bool,
    pub is_forecast: bool,
    /// Idempotency key component: `(source_upload_id, target_date, generated_at)`.
    pub source_upload_id: String,
}

impl OccupancySnapshot {
    /// Idempotency key per spec §4.A / §6.
    pub fn idempotency_key(&self) -> (String, NaiveDate, DateTime<Utc>) {
        (self.source_upload_id.clone(), self.target_date, self.generated_at)
    }
}

/// Per-date projection holding the most recent real and most recent
/// forecast snapshot separately, plus the resolved value real preferred.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OccupancyLatest {
    pub latest_real_occupancy_pct: Option<f64>,
    pub latest_real_generated_at: Option<DateTime<Utc>>,
    pub latest_forecast_occupancy_pct: Option<f64>,
    pub latest_forecast_generated_at: Option<DateTime<Utc>>,
    pub occupancy_pct: Option<f64>,
    pub is_real: bool,
}

impl OccupancyLatest {
    /// Applies the update rule from spec §4.A on receipt of snapshot `s`.
    pub fn apply_snapshot(&mut self, snapshot: &OccupancySnapshot) {
        if snapshot.is_real {
            let is_newer = self.latest_real_generated_at.map(|g| snapshot.generated_at > g).unwrap_or(true);
            if is_newer {
                self.latest_real_occupancy_pct = Some(snapshot.occupancy_pct);
                self.latest_real_generated_at = Some(snapshot.generated_at);
            }
        } else {
            let is_newer = self.latest_forecast_generated_at.map(|g| snapshot.generated_at > g).unwrap_or(true);
            if is_newer {
                self.latest_forecast_occupancy_pct = Some(snapshot.occupancy_pct);
                self.latest_forecast_generated_at = Some(snapshot.generated_at);
            }
        }
        self.resolve();
    }

    fn resolve(&mut self) {
        if let Some(real) = self.latest_real_occupancy_pct {
            self.occupancy_pct = Some(real);
            self.is_real = true;
        } else if let Some(forecast) = self.latest_forecast_occupancy_pct {
            self.occupancy_pct = Some(forecast);
            self.is_real = false;
        } else {
            self.occupancy_pct = None;
            self.is_real = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    CheckIn,
    CheckOut,
}

/// A raw check-in/check-out event anchored to an operational date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontdeskEvent {
    pub sector_id: SectorId,
    pub event_type: EventType,
    /// The operational date this event belongs to (see GLOSSARY:
    /// "Operational date"), which may differ from the event's calendar date.
    pub operational_date: NaiveDate,
    pub event_time: Option<DateTime<Utc>>,
    pub source_upload_id: String,
}

/// Aggregate counts keyed by `(operational_date, weekday, hour_timeline,
/// event_type)`.
///
/// `hour_timeline` preserves the source encoding verbatim (Design Notes §9,
/// Open Question): `0..23` for check-out, `14..23` for same-day check-in,
/// `24..35` for hours `00..11` of the following calendar day that still
/// belong to the prior operational night.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontdeskEventsHourlyAgg {
    pub sector_id: SectorId,
    pub operational_date: NaiveDate,
    pub weekday: Weekday,
    pub hour_timeline: u8,
    pub event_type: EventType,
    pub count_events: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiasMethod {
    MeanIncremental,
    Ewma,
    BootstrapManual,
}

/// `(metric_name, weekday) -> bias_pp, n, std_pp, mae_pp, method`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdayBiasStats {
    pub sector_id: SectorId,
    pub metric_name: String,
    pub weekday: Weekday,
    pub bias_pp: f64,
    pub n: u32,
    pub std_pp: f64,
    pub mae_pp: f64,
    pub method: BiasMethod,
    pub method_params: serde_json::Value,
}

/// `(metric_name, weekday, hour_timeline) -> percentage share of events, n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyDistributionStats {
    pub sector_id: SectorId,
    pub metric_name: String,
    pub weekday: Weekday,
    pub hour_timeline: u8,
    pub pct_share: f64,
    pub n: u32,
}

/// Per-(sector, weekday) turnover rate with EWMA bookkeeping (SPEC_FULL §3
/// supplement), the concrete source §4.E step 2 reads from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnoverRateStats {
    pub sector_id: SectorId,
    pub weekday: Weekday,
    pub event_type: EventType,
    pub rate: f64,
    pub n: u32,
    pub std: Option<f64>,
    pub method: BiasMethod,
    pub alpha: f64,
    pub fallback_used: bool,
    pub fallback_reason: Option<String>,
}
