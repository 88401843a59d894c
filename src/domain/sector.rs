use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ActivityId, SectorId};

/// Organizational unit; owns rules, activities, employees, parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub total_rooms: i32,
}

impl Sector {
    pub fn new(name: impl Into<String>, total_rooms: i32) -> Self {
        Self { name: name.into(), total_rooms }
    }
}

/// Employment variant under which an [`Employee`] works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractVariant {
    Intermittent,
    Permanent,
}

/// Per-worker cleaning-speed overrides, used by the Demand/Agenda engines
/// when distributing minutes to a specific employee instead of the
/// sector-wide average (spec §3: "per-worker cleaning-speed overrides").
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CleaningSpeedOverride {
    pub vacant_dirty_minutes: Option<f64>,
    pub stayover_minutes: Option<f64>,
}

/// A history snapshot capturing prior shifts/hours, consulted by the
/// Assignment Engine's fairness scoring (spec §4.G).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeHistorySnapshot {
    pub accumulated_week_hours: f64,
    pub last_assigned_date: Option<NaiveDate>,
    pub last_assigned_difficulty: Option<u8>,
    pub recent_template_pattern_counts: std::collections::HashMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub sector_id: SectorId,
    pub name: String,
    pub role: String,
    pub contract_variant: ContractVariant,
    pub max_weekly_hours: f64,
    pub cleaning_speed_override: CleaningSpeedOverride,
    pub unavailable_dates: HashSet<NaiveDate>,
    pub history: EmployeeHistorySnapshot,
    pub active: bool,
    /// Shift-template tags this employee specializes in (spec §4.G
    /// "specialization match if the shift template is tagged").
    pub specializations: HashSet<String>,
}

impl Employee {
    pub fn new(sector_id: SectorId, name: impl Into<String>, role: impl Into<String>, contract_variant: ContractVariant, max_weekly_hours: f64) -> Self {
        Self {
            sector_id,
            name: name.into(),
            role: role.into(),
            contract_variant,
            max_weekly_hours,
            cleaning_speed_override: CleaningSpeedOverride::default(),
            unavailable_dates: HashSet::new(),
            history: EmployeeHistorySnapshot::default(),
            active: true,
            specializations: HashSet::new(),
        }
    }

    pub fn is_unavailable_on(&self, date: NaiveDate) -> bool {
        self.unavailable_dates.contains(&date)
    }
}

/// Per-sector, per-week-versionable parameter row (SPEC_FULL §3 supplement),
/// the concrete row §4.D/§4.E/§4.F read "sector parameters" from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorOperationalParameters {
    pub sector_id: SectorId,
    pub target_utilization_pct: f64,
    pub buffer_pct: f64,
    pub cleaning_time_vacant_dirty_min: f64,
    pub cleaning_time_stayover_min: f64,
    /// Safety percentage-points added per weekday on top of bias.
    pub safety_pp_by_weekday: [f64; 7],
    pub total_rooms: i32,
    pub replan_threshold_pp: f64,
    pub avg_shift_hours: f64,
    pub week_start: Option<NaiveDate>,
    pub is_current: bool,
}

impl SectorOperationalParameters {
    pub fn default_for(sector_id: SectorId, total_rooms: i32) -> Self {
        Self {
            sector_id,
            target_utilization_pct: crate::config::DEFAULT_UTILIZATION_TARGET_PCT,
            buffer_pct: crate::config::DEFAULT_BUFFER_PCT,
            cleaning_time_vacant_dirty_min: 25.0,
            cleaning_time_stayover_min: 10.0,
            safety_pp_by_weekday: [0.0, 0.0, 0.0, 0.0, 2.0, 3.0, 2.0],
            total_rooms,
            replan_threshold_pp: crate::config::DEFAULT_REPLAN_THRESHOLD_PP,
            avg_shift_hours: crate::config::DEFAULT_AVG_SHIFT_HOURS,
            week_start: None,
            is_current: true,
        }
    }

    pub fn safety_pp(&self, weekday: super::weekday::Weekday) -> f64 {
        self.safety_pp_by_weekday[weekday.ordinal()]
    }
}

/// Stub reference used only so `Sector`-owned entities can name the
/// activities they act on without pulling the whole activity module in;
/// re-exported from [`super::activity`].
pub type SectorActivityRef = ActivityId;
