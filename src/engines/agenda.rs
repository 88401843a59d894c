//! Agenda Engine (spec §4.H): distributes calculated/recurrent/eventual
//! activities inside each assigned slot.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::DEFAULT_AGENDA_ITEM_CAP_MINUTES;
use crate::domain::activity::{ActivityClassification, GovernanceActivity, WorkloadDriver};
use crate::domain::agenda::{AgendaConflict, AgendaStatus, EmployeeDailyAgenda, EmployeeDailyAgendaItem};
use crate::ids::{ActivityId, EmployeeId, SchedulePlanId};
use crate::pipeline::PipelineContext;
use crate::store::Store;

struct PoolItem {
    activity_id: ActivityId,
    classification: ActivityClassification,
    difficulty: u8,
    minutes: f64,
    is_pending: bool,
    pending_reason: Option<String>,
}

/// Builds the activity pool for `(sector, target_date)` (spec §4.H).
///
/// A `Variable` activity's minutes are its per-unit average scaled by the
/// variable share of the day's demand and the number of assigned slots:
/// `average_minutes * (minutes_variable / total_demand_minutes) * employee_count`.
async fn build_activity_pool(store: &Store, ctx: &PipelineContext<'_>, target_date: NaiveDate, total_demand_minutes: f64, minutes_variable: f64, employee_count: usize) -> Vec<PoolItem> {
    let activities = store.list_activities_for_sector(ctx.sector_id).await;
    let mut pool = Vec::new();

    for (activity_id, activity) in &activities {
        match activity.classification {
            ActivityClassification::CalculatedByAgent => {
                let minutes = match activity.workload_driver {
                    WorkloadDriver::Variable => {
                        if total_demand_minutes <= 0.0 {
                            0.0
                        } else {
                            activity.average_minutes * (minutes_variable / total_demand_minutes) * employee_count as f64
                        }
                    }
                    WorkloadDriver::Constant => activity.average_minutes,
                };
                if minutes > 0.0 {
                    pool.push(PoolItem { activity_id: *activity_id, classification: activity.classification, difficulty: activity.difficulty, minutes, is_pending: false, pending_reason: None });
                }
            }
            ActivityClassification::Recurring => {
                let periodicity = match activity.periodicity {
                    Some(id) => store.get_periodicity(id).await,
                    None => None,
                };
                if activity.is_due_on(target_date, periodicity.as_ref()) {
                    pool.push(PoolItem { activity_id: *activity_id, classification: activity.classification, difficulty: activity.difficulty, minutes: activity.average_minutes, is_pending: false, pending_reason: None });
                }
            }
            ActivityClassification::Eventual => {
                pool.push(PoolItem {
                    activity_id: *activity_id,
                    classification: activity.classification,
                    difficulty: activity.difficulty,
                    minutes: activity.average_minutes,
                    is_pending: true,
                    pending_reason: Some("manual scheduling required".into()),
                });
            }
        }
    }

    pool.sort_by(|a, b| b.difficulty.cmp(&a.difficulty));
    pool
}

/// Pushes one chunk of `item` onto `agenda`, capped by the per-item minute
/// cap and by `agenda`'s remaining capacity (invariant 5, spec §8:
/// `total_minutes_allocated <= total_minutes_available`). Returns the
/// minutes actually consumed, which may be `0` if the agenda has no
/// capacity left.
fn push_one_chunk(agenda: &mut EmployeeDailyAgenda, item: &PoolItem, activity: &GovernanceActivity, remaining_minutes: f64) -> f64 {
    let cap = DEFAULT_AGENDA_ITEM_CAP_MINUTES as f64;
    let capacity_left = (agenda.total_minutes_available - agenda.total_minutes_allocated).max(0) as f64;
    let chunk = remaining_minutes.min(cap).min(capacity_left);
    if chunk <= 0.0 {
        return 0.0;
    }
    let order = agenda.items.len() as i32;
    let quantity = if activity.average_minutes > 0.0 { chunk / activity.average_minutes } else { 0.0 };
    agenda.push_item(EmployeeDailyAgendaItem { activity_id: item.activity_id, order, minutes: chunk.round() as i64, quantity, classification: item.classification, is_pending: item.is_pending, pending_reason: item.pending_reason.clone() });
    chunk
}

/// Regenerates agendas for every assigned slot of `schedule_plan_id` on
/// `target_date` (spec §4.H). Deletes prior agendas for the plan first
/// (spec §3: "regenerated from scratch on each agenda run").
#[tracing::instrument(skip(store, ctx))]
pub async fn generate_agendas_for_day(store: &Store, ctx: &mut PipelineContext<'_>, schedule_plan_id: SchedulePlanId, target_date: NaiveDate) -> Option<AgendaConflict> {
    let _lock = store.lock_agenda_regeneration(schedule_plan_id).await;

    let day_slots: Vec<_> = store.list_shift_slots_for_date(schedule_plan_id, target_date).await.into_iter().filter(|(_, s)| s.is_assigned).collect();
    if day_slots.is_empty() {
        return None;
    }

    let demand_rows = store
        .list_demand_daily(store.get_schedule_plan(schedule_plan_id).await.map(|p| p.forecast_run_id).unwrap_or_default())
        .await;
    let today_demand = demand_rows.iter().find(|d| d.target_date == target_date);
    let total_demand_minutes = today_demand.map(|d| d.minutes_rule_adj).unwrap_or(0.0);
    let minutes_variable = today_demand.map(|d| d.minutes_variable).unwrap_or(0.0);
    let total_capacity_minutes: i64 = day_slots.iter().map(|(_, s)| ((s.hours_worked * 60.0).round() as i64)).sum();

    let has_conflict = (total_demand_minutes as i64) > total_capacity_minutes;
    let conflict = if has_conflict {
        Some(AgendaConflict { target_date, total_demand_minutes: total_demand_minutes.round() as i64, total_capacity_minutes, deficit_minutes: total_demand_minutes.round() as i64 - total_capacity_minutes })
    } else {
        None
    };

    let pool = build_activity_pool(store, ctx, target_date, total_demand_minutes, minutes_variable, day_slots.len()).await;

    let mut agendas: Vec<EmployeeDailyAgenda> = day_slots
        .iter()
        .map(|(slot_id, slot)| {
            let employee_id = slot.employee_id.expect("filtered to assigned slots");
            EmployeeDailyAgenda::new(schedule_plan_id, *slot_id, employee_id, ctx.sector_id, target_date, (slot.hours_worked * 60.0).round() as i64)
        })
        .collect();

    let mut rotation_queue: Vec<EmployeeId> = agendas.iter().map(|a| a.employee_id).collect();
    let mut rotation_cursor = 0usize;
    let mut last_difficulty: HashMap<EmployeeId, u8> = agendas.iter().map(|a| (a.employee_id, 0u8)).collect();

    for item in &pool {
        let Some(activity) = store.get_activity(item.activity_id).await else { continue };
        let mut remaining_minutes = item.minutes;

        while remaining_minutes > 0.0 {
            let eligible: Vec<usize> = agendas.iter().enumerate().filter(|(_, a)| a.total_minutes_allocated < a.total_minutes_available).map(|(idx, _)| idx).collect();
            if eligible.is_empty() {
                break;
            }

            let target_index = if item.difficulty >= 3 {
                let mut chosen = None;
                for _ in 0..rotation_queue.len().max(1) {
                    if rotation_queue.is_empty() {
                        break;
                    }
                    let candidate = rotation_queue[rotation_cursor % rotation_queue.len()];
                    rotation_cursor += 1;
                    if let Some(idx) = eligible.iter().find(|&&idx| agendas[idx].employee_id == candidate) {
                        chosen = Some(*idx);
                        break;
                    }
                }
                chosen.or_else(|| eligible.iter().min_by_key(|&&idx| agendas[idx].total_minutes_allocated).copied())
            } else {
                eligible
                    .iter()
                    .min_by(|&&a, &&b| {
                        agendas[a]
                            .total_minutes_allocated
                            .cmp(&agendas[b].total_minutes_allocated)
                            .then(difficulty_alternation_key(last_difficulty[&agendas[a].employee_id], item.difficulty).cmp(&difficulty_alternation_key(last_difficulty[&agendas[b].employee_id], item.difficulty)))
                    })
                    .copied()
            };

            let Some(idx) = target_index else { break };
            let consumed = push_one_chunk(&mut agendas[idx], item, &activity, remaining_minutes);
            if consumed <= 0.0 {
                break;
            }
            last_difficulty.insert(agendas[idx].employee_id, item.difficulty);
            remaining_minutes -= consumed;
        }
    }

    if has_conflict {
        for agenda in &mut agendas {
            agenda.has_conflict = true;
            agenda.status = AgendaStatus::Conflict;
            agenda.conflict_reason = Some("demand exceeds assigned capacity".into());
        }
    } else {
        for agenda in &mut agendas {
            agenda.status = AgendaStatus::Generated;
        }
    }

    store.delete_agendas_for_plan(schedule_plan_id).await;
    for agenda in agendas {
        ctx.trace
            .step("agenda.generate", &format!("employee {:?}: allocated {} / available {}", agenda.employee_id, agenda.total_minutes_allocated, agenda.total_minutes_available));
        store.insert_agenda(agenda).await;
    }

    conflict
}

/// Tie-break preferring the employee whose last-assigned difficulty
/// differs most from the candidate (alternation), by producing a key that
/// sorts employees who alternated well first.
fn difficulty_alternation_key(last_difficulty: u8, candidate_difficulty: u8) -> i32 {
    -((candidate_difficulty as i32) - (last_difficulty as i32)).abs()
}
