//! Typed entity identifiers.
//!
//! Every entity collection in [`crate::store`] is a `slotmap::SlotMap` keyed
//! by one of these generational ids, generalizing the teacher's
//! `ReservationId` (`domain/vrm_system_model/reservation/reservation_store.rs`)
//! to every entity this crate persists rather than just one.

use slotmap::new_key_type;

new_key_type! {
    pub struct SectorId;
    pub struct EmployeeId;
    pub struct ActivityId;
    pub struct PeriodicityId;
    pub struct SnapshotId;
    pub struct EventAggId;
    pub struct WeekdayBiasStatsId;
    pub struct HourlyDistributionStatsId;
    pub struct ForecastRunId;
    pub struct ForecastDailyId;
    pub struct ForecastRunSnapshotId;
    pub struct DemandDailyId;
    pub struct SchedulePlanId;
    pub struct ShiftSlotId;
    pub struct AgendaId;
    pub struct AgendaItemId;
    pub struct ConvocationId;
    pub struct RuleId;
    pub struct SectorCalcRuleId;
    pub struct AgentRunId;
    pub struct ReplanSuggestionId;
    pub struct DailySuggestionId;
    pub struct ActivityProgramWeekId;
    pub struct ActivityProgramItemId;
    pub struct CalendarEventId;
    pub struct TurnoverStatsId;
    pub struct ScheduleOverrideLogId;
}
