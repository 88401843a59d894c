use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ActivityId, PeriodicityId, SectorId};

/// What drives an activity's minute cost: a fixed amount per day, or an
/// amount proportional to the day's variable workload (departures/stayovers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadDriver {
    Variable,
    Constant,
}

/// Who decides *when* an activity happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityClassification {
    /// The Demand Engine computes the minutes; the Agenda Engine scales
    /// them proportionally across the assigned workforce.
    CalculatedByAgent,
    /// Driven by an [`ActivityPeriodicity`].
    Recurring,
    /// Scheduled manually; the Agenda Engine only marks it pending.
    Eventual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodicityType {
    Daily,
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodicityUnit {
    Days,
    Months,
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorPolicy {
    SameDay,
    LastDayIfMissing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPeriodicity {
    pub name: String,
    pub periodicity_type: PeriodicityType,
    pub unit: PeriodicityUnit,
    pub value: i64,
    pub anchor_policy: AnchorPolicy,
    /// Cached approximate interval, in days, used by the "due on d" check in
    /// §4.H so daily activities (which are always due) short-circuit and
    /// everything else amortizes the unit/value -> days conversion.
    pub approximate_days: i64,
}

impl ActivityPeriodicity {
    pub fn new(name: impl Into<String>, periodicity_type: PeriodicityType, unit: PeriodicityUnit, value: i64, anchor_policy: AnchorPolicy) -> Self {
        let approximate_days = match unit {
            PeriodicityUnit::Days => value,
            PeriodicityUnit::Months => value * 30,
            PeriodicityUnit::Years => value * 365,
        };
        Self { name: name.into(), periodicity_type, unit, value, anchor_policy, approximate_days }
    }

    pub fn is_daily(&self) -> bool {
        self.periodicity_type == PeriodicityType::Daily
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceActivity {
    pub sector_id: SectorId,
    pub name: String,
    pub code: String,
    pub average_minutes: f64,
    pub workload_driver: WorkloadDriver,
    pub classification: ActivityClassification,
    pub periodicity: Option<PeriodicityId>,
    pub tolerance_days: i64,
    pub first_execution_date: Option<NaiveDate>,
    /// 1..n, higher means harder; difficulty >= 3 is distributed via the
    /// Agenda Engine's rotation queue (spec §4.H).
    pub difficulty: u8,
    pub active: bool,
}

impl GovernanceActivity {
    pub fn new(sector_id: SectorId, name: impl Into<String>, code: impl Into<String>, average_minutes: f64, workload_driver: WorkloadDriver, classification: ActivityClassification, difficulty: u8) -> Self {
        Self {
            sector_id,
            name: name.into(),
            code: code.into(),
            average_minutes,
            workload_driver,
            classification,
            periodicity: None,
            tolerance_days: 0,
            first_execution_date: None,
            difficulty,
            active: true,
        }
    }

    /// Is this activity due on `target_date`, given its periodicity?
    /// DAILY periodicities are always due; everything else is due when
    /// `(target_date - first_execution_date).days mod interval_days == 0`,
    /// or within a `±tolerance_days` window (spec §4.H).
    pub fn is_due_on(&self, target_date: NaiveDate, periodicity: Option<&ActivityPeriodicity>) -> bool {
        if self.classification != ActivityClassification::Recurring {
            return false;
        }
        let Some(periodicity) = periodicity else { return false };
        if periodicity.is_daily() {
            return true;
        }
        let Some(first_execution) = self.first_execution_date else { return false };
        if target_date < first_execution {
            return false;
        }
        let interval = periodicity.approximate_days.max(1);
        let days_since = (target_date - first_execution).num_days();
        let remainder = days_since % interval;
        let distance_from_due = remainder.min(interval - remainder);
        distance_from_due <= self.tolerance_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SectorId;
    use slotmap::SlotMap;

    fn sector_id() -> SectorId {
        let mut map: SlotMap<SectorId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn daily_periodicity_is_always_due() {
        let periodicity = ActivityPeriodicity::new("daily", PeriodicityType::Daily, PeriodicityUnit::Days, 1, AnchorPolicy::SameDay);
        let mut activity = GovernanceActivity::new(sector_id(), "Sweep", "SWEEP", 15.0, WorkloadDriver::Constant, ActivityClassification::Recurring, 1);
        activity.first_execution_date = Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(activity.is_due_on(NaiveDate::from_ymd_opt(2026, 7, 30).unwrap(), Some(&periodicity)));
    }

    #[test]
    fn weekly_periodicity_respects_tolerance_window() {
        let periodicity = ActivityPeriodicity::new("weekly", PeriodicityType::Weekly, PeriodicityUnit::Days, 7, AnchorPolicy::SameDay);
        let mut activity = GovernanceActivity::new(sector_id(), "Deep clean", "DEEP", 90.0, WorkloadDriver::Constant, ActivityClassification::Recurring, 4);
        activity.first_execution_date = Some(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
        activity.tolerance_days = 1;

        assert!(activity.is_due_on(NaiveDate::from_ymd_opt(2026, 7, 8).unwrap(), Some(&periodicity)));
        assert!(activity.is_due_on(NaiveDate::from_ymd_opt(2026, 7, 9).unwrap(), Some(&periodicity)));
        assert!(!activity.is_due_on(NaiveDate::from_ymd_opt(2026, 7, 11).unwrap(), Some(&periodicity)));
    }
}
