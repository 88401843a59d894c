//! Scenario S5 (SPEC_FULL §8): a manual headcount override never touches
//! assigned slots, removes only unassigned ones, and leaves an audit trail.

use chrono::{NaiveDate, NaiveTime};

use housekeeping_planning_core::domain::schedule::{HousekeepingSchedulePlan, SchedulePlanKind, SchedulePlanStatus, ShiftSlot};
use housekeeping_planning_core::domain::sector::{ContractVariant, Employee, Sector};
use housekeeping_planning_core::domain::weekday::Weekday;
use housekeeping_planning_core::engines::schedule;
use housekeeping_planning_core::store::Store;
use std::collections::BTreeMap;

fn slot(plan_id: housekeeping_planning_core::ids::SchedulePlanId, target_date: NaiveDate, weekday: Weekday, template_name: &str, start: u32, end: u32) -> ShiftSlot {
    ShiftSlot {
        schedule_plan_id: plan_id,
        target_date,
        weekday,
        template_name: template_name.into(),
        start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        lunch_start: None,
        lunch_end: None,
        hours_worked: (end - start) as f64,
        employee_id: None,
        is_assigned: false,
    }
}

#[tokio::test]
async fn override_headcount_removes_only_unassigned_slots_and_logs_the_change() {
    let store = Store::new();
    let sector_id = store.insert_sector(Sector::new("Tower A", 100)).await;
    let employee_id = store.insert_employee(Employee::new(sector_id, "Ana Silva", "room_attendant", ContractVariant::Permanent, 40.0)).await;

    let week_start = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(); // Monday
    let tuesday = week_start + chrono::Duration::days(1);

    let plan = HousekeepingSchedulePlan {
        sector_id,
        forecast_run_id: {
            let mut map: slotmap::SlotMap<housekeeping_planning_core::ids::ForecastRunId, ()> = slotmap::SlotMap::with_key();
            map.insert(())
        },
        week_start,
        week_end: week_start + chrono::Duration::days(6),
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

    let morning_1 = slot(plan_id, tuesday, Weekday::Tuesday, "morning", 7, 15);
    let morning_2 = slot(plan_id, tuesday, Weekday::Tuesday, "morning", 7, 15);
    let afternoon_assigned = slot(plan_id, tuesday, Weekday::Tuesday, "afternoon", 14, 22);
    let afternoon_unassigned = slot(plan_id, tuesday, Weekday::Tuesday, "afternoon", 14, 22);

    store.insert_shift_slot(morning_1).await;
    store.insert_shift_slot(morning_2).await;
    let assigned_id = store.insert_shift_slot(afternoon_assigned).await;
    store.insert_shift_slot(afternoon_unassigned).await;

    store
        .update_shift_slot(assigned_id, |s| {
            s.is_assigned = true;
            s.employee_id = Some(employee_id);
        })
        .await
        .unwrap();

    let all_slots = store.list_shift_slots(plan_id).await;
    let slot_refs: Vec<_> = all_slots.iter().map(|(_, s)| s).collect();
    store.update_schedule_plan(plan_id, |p| p.recompute_totals(&slot_refs)).await.unwrap();
    assert_eq!(store.get_schedule_plan(plan_id).await.unwrap().total_headcount_planned, 4);

    schedule::override_headcount(&store, plan_id, tuesday, 3, Some("demand revised down".into())).await.unwrap();

    let remaining = store.list_shift_slots_for_date(plan_id, tuesday).await;
    assert_eq!(remaining.len(), 3, "exactly one unassigned slot should have been removed");
    assert!(remaining.iter().any(|(id, _)| *id == assigned_id), "the assigned slot must never be touched");
    let assigned_slot = store.get_shift_slot(assigned_id).await.unwrap();
    assert!(assigned_slot.is_assigned);
    assert_eq!(assigned_slot.employee_id, Some(employee_id));

    let plan_after = store.get_schedule_plan(plan_id).await.unwrap();
    assert_eq!(plan_after.total_headcount_planned, 3, "plan totals must be recomputed after the override");

    let logs = store.list_override_logs(plan_id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].override_type, "headcount");
    assert_eq!(logs[0].target_date, Some(tuesday));
    assert_eq!(logs[0].original_value, serde_json::json!(4));
    assert_eq!(logs[0].new_value, serde_json::json!(3));
    assert_eq!(logs[0].reason.as_deref(), Some("demand revised down"));
}
