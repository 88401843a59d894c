use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::SectorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarScope {
    Global,
    Sector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolidayType {
    Holiday,
    HolidayEve,
    Peak,
    LowOccupancy,
    Custom,
}

/// An operational calendar event (SPEC_FULL §3 supplement), the row backing
/// the `get_calendar_factors` interface in spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalCalendarEvent {
    pub scope: CalendarScope,
    pub sector_id: Option<SectorId>,
    pub date: NaiveDate,
    pub holiday_type: HolidayType,
    pub productivity_factor: f64,
    pub demand_factor: f64,
    pub block_convocations: bool,
    pub label: String,
}

/// Result of `get_calendar_factors(date, sector)`: multiplicative
/// composition of every applicable global event, then every applicable
/// sector event, on that date (spec §4.E, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarFactors {
    pub productivity_factor: f64,
    pub demand_factor: f64,
    pub block_convocations: bool,
    pub applied_events: Vec<String>,
}

impl Default for CalendarFactors {
    fn default() -> Self {
        Self { productivity_factor: 1.0, demand_factor: 1.0, block_convocations: false, applied_events: Vec::new() }
    }
}

/// Composes calendar factors: GLOBAL events first, then SECTOR events,
/// multiplicatively (spec §4.E: "Calendar factors combine multiplicatively:
/// GLOBAL events first, then SECTOR events").
pub fn compose_calendar_factors(date: NaiveDate, sector_id: SectorId, events: &[OperationalCalendarEvent]) -> CalendarFactors {
    let mut factors = CalendarFactors::default();

    let mut global_then_sector: Vec<&OperationalCalendarEvent> = events
        .iter()
        .filter(|e| e.date == date && (e.scope == CalendarScope::Global || e.sector_id == Some(sector_id)))
        .collect();
    global_then_sector.sort_by_key(|e| match e.scope {
        CalendarScope::Global => 0,
        CalendarScope::Sector => 1,
    });

    for event in global_then_sector {
        factors.productivity_factor *= event.productivity_factor;
        factors.demand_factor *= event.demand_factor;
        factors.block_convocations = factors.block_convocations || event.block_convocations;
        factors.applied_events.push(event.label.clone());
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn sector_id() -> SectorId {
        let mut map: SlotMap<SectorId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn factors_compose_multiplicatively_global_then_sector() {
        let sector = sector_id();
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let events = vec![
            OperationalCalendarEvent {
                scope: CalendarScope::Sector,
                sector_id: Some(sector),
                date,
                holiday_type: HolidayType::Peak,
                productivity_factor: 0.9,
                demand_factor: 1.2,
                block_convocations: false,
                label: "sector peak".into(),
            },
            OperationalCalendarEvent {
                scope: CalendarScope::Global,
                sector_id: None,
                date,
                holiday_type: HolidayType::Holiday,
                productivity_factor: 0.95,
                demand_factor: 1.1,
                block_convocations: true,
                label: "christmas".into(),
            },
        ];

        let factors = compose_calendar_factors(date, sector, &events);
        assert!((factors.demand_factor - (1.1 * 1.2)).abs() < 1e-9);
        assert!((factors.productivity_factor - (0.95 * 0.9)).abs() < 1e-9);
        assert!(factors.block_convocations);
        assert_eq!(factors.applied_events, vec!["christmas".to_string(), "sector peak".to_string()]);
    }
}
