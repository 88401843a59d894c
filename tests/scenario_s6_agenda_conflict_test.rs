//! Scenario S6 (SPEC_FULL §8): demand for the day outstrips the assigned
//! workforce's capacity. Every agenda must be flagged, and total allocated
//! minutes must cap at capacity rather than silently overshoot it.

use chrono::{NaiveDate, NaiveTime};

use housekeeping_planning_core::domain::activity::{ActivityClassification, GovernanceActivity, WorkloadDriver};
use housekeeping_planning_core::domain::rules::RuleConstraints;
use housekeeping_planning_core::domain::schedule::{HousekeepingSchedulePlan, SchedulePlanKind, SchedulePlanStatus, ShiftSlot};
use housekeeping_planning_core::domain::sector::{ContractVariant, Employee, Sector, SectorOperationalParameters};
use housekeeping_planning_core::domain::trace::{AgentRun, RunType, TraceSink};
use housekeeping_planning_core::domain::weekday::Weekday;
use housekeeping_planning_core::engines::agenda;
use housekeeping_planning_core::pipeline::PipelineContext;
use housekeeping_planning_core::store::Store;
use std::collections::BTreeMap;

#[tokio::test]
async fn demand_exceeding_capacity_flags_every_agenda_and_caps_allocation() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 300)).await;
    let params = SectorOperationalParameters::default_for(sector_id, 300);
    store.set_sector_params(params.clone()).await;

    // average_minutes is set high enough that, scaled by the variable-minutes
    // ratio (1.0 here) and the 4 assigned employees, the pool alone exceeds
    // the 1600-minute capacity below -- this is what forces the allocator to
    // cap every agenda at its own availability instead of under-filling it.
    store
        .insert_activity(GovernanceActivity::new(sector_id, "Vacant-dirty clean", "VD_CLEAN", 500.0, WorkloadDriver::Variable, ActivityClassification::CalculatedByAgent, 2))
        .await;

    let wednesday = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
    assert_eq!(Weekday::from_chrono(wednesday.weekday()), Weekday::Wednesday);

    let forecast_run_id = {
        let mut map: slotmap::SlotMap<housekeeping_planning_core::ids::ForecastRunId, ()> = slotmap::SlotMap::with_key();
        map.insert(())
    };

    // Hand-build a demand row whose rule-adjusted minutes (2000) outstrip
    // the 1600 minutes of assigned capacity set up below (400-minute deficit).
    let demand_row = housekeeping_planning_core::domain::demand::HousekeepingDemandDaily {
        forecast_run_id,
        sector_id,
        target_date: wednesday,
        weekday: Weekday::Wednesday,
        occupied_rooms: 200,
        departures_count: 60,
        departures_source: housekeeping_planning_core::domain::demand::DepartureSource::DefaultFallback,
        arrivals_count: 60,
        arrivals_source: housekeeping_planning_core::domain::demand::DepartureSource::DefaultFallback,
        stayovers_estimated: 140,
        minutes_variable: 2000.0,
        minutes_constant: 0.0,
        minutes_raw: 2000.0,
        minutes_buffered: 2000.0,
        minutes_cal_adj: 2000.0,
        minutes_rule_adj: 2000.0,
        hours_productive: 33.33,
        hours_total: 39.2,
        headcount_required: 4.9,
        headcount_rounded: 5,
        block_convocations: false,
        calculation_breakdown: serde_json::Value::Null,
    };
    store.insert_demand_daily(demand_row).await;

    let plan = HousekeepingSchedulePlan {
        sector_id,
        forecast_run_id,
        week_start: wednesday - chrono::Duration::days(2),
        week_end: wednesday + chrono::Duration::days(4),
        plan_kind: SchedulePlanKind::Baseline,
        baseline_plan_id: None,
        status: SchedulePlanStatus::Final,
        total_headcount_planned: 0,
        total_hours_planned: 0.0,
        coverage_by_hour: BTreeMap::new(),
        validations: Vec::new(),
        delta_vs_baseline: None,
    };
    let plan_id = store.insert_schedule_plan(plan).await;

    // 4 assigned slots, each worth 400 minutes (6h40) of capacity: 1600
    // minutes total, 400 short of the day's 2000-minute demand.
    for i in 0..4 {
        let employee_id = store.insert_employee(Employee::new(sector_id, format!("Employee {i}"), "room_attendant", ContractVariant::Permanent, 40.0)).await;
        let slot = ShiftSlot {
            schedule_plan_id: plan_id,
            target_date: wednesday,
            weekday: Weekday::Wednesday,
            template_name: "morning".into(),
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(13, 40, 0).unwrap(),
            lunch_start: None,
            lunch_end: None,
            hours_worked: 400.0 / 60.0,
            employee_id: Some(employee_id),
            is_assigned: true,
        };
        store.insert_shift_slot(slot).await;
    }

    let now = chrono::Utc::now();
    let mut agent_run = AgentRun::start(sector_id, wednesday, RunType::Agenda, now);
    let mut ctx = PipelineContext::new(sector_id, now, RuleConstraints::default(), params, TraceSink::new(&mut agent_run));

    let conflict = agenda::generate_agendas_for_day(&store, &mut ctx, plan_id, wednesday).await;
    let conflict = conflict.expect("demand of 2000 minutes against 1600 minutes of capacity must report a conflict");
    assert_eq!(conflict.total_demand_minutes, 2000);
    assert_eq!(conflict.total_capacity_minutes, 1600);
    assert_eq!(conflict.deficit_minutes, 400);

    let agendas = store.list_agendas_for_plan(plan_id).await;
    assert_eq!(agendas.len(), 4);
    let total_allocated: i64 = agendas.iter().map(|(_, a)| a.total_minutes_allocated).sum();
    assert_eq!(total_allocated, 1600, "allocation must cap at total capacity, never exceed it");
    for (_, agenda) in &agendas {
        assert!(agenda.has_conflict);
        assert_eq!(agenda.total_minutes_allocated, agenda.total_minutes_available, "each agenda should be filled to its own capacity when demand exceeds it");
    }
}
