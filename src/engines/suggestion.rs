//! Suggestion / Replan Engine (spec §4.J): compares live daily demand
//! against the locked baseline plan and emits adjustment suggestions.

use crate::domain::demand::HousekeepingDemandDaily;
use crate::domain::suggestion::{DailySuggestion, ReplanSuggestion, SuggestionImpactCategory, SuggestionPriority, SuggestionStatus, SuggestionType};
use crate::error::{CoreError, Result};
use crate::ids::{DailySuggestionId, ForecastRunId, ReplanSuggestionId, SchedulePlanId};
use crate::pipeline::PipelineContext;
use crate::store::Store;

fn priority_for(headcount_delta: i64, occ_delta_pp: f64) -> SuggestionPriority {
    if headcount_delta.unsigned_abs() >= 2 || occ_delta_pp.abs() >= 10.0 {
        SuggestionPriority::High
    } else if headcount_delta != 0 || occ_delta_pp.abs() >= 5.0 {
        SuggestionPriority::Medium
    } else {
        SuggestionPriority::Low
    }
}

/// One day's comparison (spec §4.J): emits a `ReplanSuggestion` when the
/// headcount delta or the occupancy deviation crosses threshold, and a
/// `DailySuggestion` recommendation alongside it.
fn evaluate_day(schedule_plan_id: SchedulePlanId, baseline: &HousekeepingDemandDaily, live: &HousekeepingDemandDaily, replan_threshold_pp: f64) -> (Option<ReplanSuggestion>, Option<DailySuggestion>) {
    let headcount_delta = live.headcount_rounded - baseline.headcount_rounded;

    let occ_baseline = baseline.calculation_breakdown.get("inputs").and_then(|v| v.get("occ_adj")).and_then(|v| v.as_f64());
    let occ_live = live.calculation_breakdown.get("inputs").and_then(|v| v.get("occ_adj")).and_then(|v| v.as_f64());
    let occ_delta_pp = match (occ_baseline, occ_live) {
        (Some(b), Some(l)) => l - b,
        _ => 0.0,
    };

    let crosses_headcount = headcount_delta != 0;
    let crosses_occupancy = occ_delta_pp.abs() > replan_threshold_pp;

    if !crosses_headcount && !crosses_occupancy {
        return (None, None);
    }

    let reason = if crosses_headcount {
        format!("required headcount moved from {} to {} ({:+})", baseline.headcount_rounded, live.headcount_rounded, headcount_delta)
    } else {
        format!("occupancy deviated {occ_delta_pp:+.1}pp from baseline (threshold {replan_threshold_pp:.1}pp)")
    };

    let replan = ReplanSuggestion {
        schedule_plan_id,
        target_date: live.target_date,
        suggestion_type: if crosses_headcount { "headcount_adjustment".into() } else { "occupancy_deviation".into() },
        original_value: Some(baseline.headcount_required),
        suggested_value: Some(live.headcount_required),
        delta: Some(headcount_delta as f64),
        reason: reason.clone(),
        justification: serde_json::json!({
            "baseline_headcount_rounded": baseline.headcount_rounded,
            "live_headcount_rounded": live.headcount_rounded,
            "occ_delta_pp": occ_delta_pp,
            "replan_threshold_pp": replan_threshold_pp,
        }),
        priority: priority_for(headcount_delta, occ_delta_pp),
        is_accepted: None,
        accepted_at: None,
    };

    let (suggestion_type, category, message) = if live.block_convocations && !baseline.block_convocations {
        (SuggestionType::PreventiveSubstitution, SuggestionImpactCategory::Legal, format!("{}: calendar now blocks convocations, arrange substitutions in advance", live.target_date))
    } else if headcount_delta > 0 {
        (SuggestionType::ReinforceTeam, SuggestionImpactCategory::Operational, format!("{}: reinforce the team by {} head(s)", live.target_date, headcount_delta))
    } else if headcount_delta < 0 {
        (SuggestionType::ReduceHours, SuggestionImpactCategory::Financial, format!("{}: reduce scheduled hours, demand dropped by {} head(s)", live.target_date, -headcount_delta))
    } else if occ_delta_pp > 0.0 {
        (SuggestionType::AnticipateShift, SuggestionImpactCategory::Operational, format!("{}: occupancy trending up {occ_delta_pp:+.1}pp, consider anticipating shifts", live.target_date))
    } else {
        (SuggestionType::PostponeShift, SuggestionImpactCategory::Operational, format!("{}: occupancy trending down {occ_delta_pp:+.1}pp, consider postponing shifts", live.target_date))
    };

    let daily = DailySuggestion { schedule_plan_id, target_date: live.target_date, suggestion_type, category, status: SuggestionStatus::Open, message };

    (Some(replan), Some(daily))
}

/// Compares every day of `live_forecast_run_id`'s demand against
/// `baseline_forecast_run_id`'s, persisting a suggestion pair per
/// crossing day (spec §4.J).
#[tracing::instrument(skip(store, ctx))]
pub async fn compare_and_persist(store: &Store, ctx: &PipelineContext<'_>, schedule_plan_id: SchedulePlanId, baseline_forecast_run_id: ForecastRunId, live_forecast_run_id: ForecastRunId) -> Vec<ReplanSuggestionId> {
    let baseline_rows = store.list_demand_daily(baseline_forecast_run_id).await;
    let live_rows = store.list_demand_daily(live_forecast_run_id).await;

    let mut ids = Vec::new();
    for live in &live_rows {
        let Some(baseline) = baseline_rows.iter().find(|b| b.target_date == live.target_date) else { continue };
        let (replan, daily) = evaluate_day(schedule_plan_id, baseline, live, ctx.params.replan_threshold_pp);
        if let Some(replan) = replan {
            ids.push(store.insert_replan_suggestion(replan).await);
        }
        if let Some(daily) = daily {
            store.insert_daily_suggestion(daily).await;
        }
    }
    ids
}

/// Records accept/reject on a `ReplanSuggestion`; never mutates the plan
/// itself (spec §4.J: "applying a suggestion is an explicit downstream
/// action").
pub async fn decide_replan_suggestion(store: &Store, ctx: &PipelineContext<'_>, id: ReplanSuggestionId, accepted: bool) -> Result<()> {
    let suggestion = store.get_replan_suggestion(id).await.ok_or_else(|| CoreError::NotFound(format!("replan suggestion {:?}", id)))?;
    if suggestion.is_accepted.is_some() {
        return Err(CoreError::Conflict("replan suggestion already decided".into()));
    }
    let as_of = ctx.as_of;
    store
        .update_replan_suggestion(id, |s| {
            s.is_accepted = Some(accepted);
            s.accepted_at = Some(as_of);
        })
        .await
}

/// `OPEN -> APPLIED | IGNORED` (spec §4.J), rejecting any non-monotonic
/// transition.
pub async fn transition_daily_suggestion(store: &Store, id: DailySuggestionId, next: SuggestionStatus) -> Result<()> {
    let suggestion = store.get_daily_suggestion(id).await.ok_or_else(|| CoreError::NotFound(format!("daily suggestion {:?}", id)))?;
    if !suggestion.status.can_transition_to(next) {
        return Err(CoreError::Conflict(format!("{:?} cannot transition to {next:?}", suggestion.status)));
    }
    store.update_daily_suggestion(id, |s| s.status = next).await
}
