//! Convocation Engine (spec §4.I): lifecycle + legal-notice validation,
//! decline-driven reschedule.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};

use crate::config::DEFAULT_RESPONSE_DEADLINE_HOURS;
use crate::domain::calendar::compose_calendar_factors;
use crate::domain::convocation::{Convocation, ConvocationOrigin, ConvocationStatus};
use crate::domain::rules::{RuleViolation, Severity};
use crate::engines::rules::{validate, RuleCandidate};
use crate::error::{CoreError, PipelineOutcome, Result};
use crate::ids::{ConvocationId, EmployeeId, SectorId};
use crate::pipeline::PipelineContext;
use crate::store::Store;

pub struct CreateConvocationInput {
    pub employee_id: EmployeeId,
    pub sector_id: SectorId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i64,
    pub origin: ConvocationOrigin,
    pub response_hours: Option<i64>,
}

fn total_hours(start: NaiveTime, end: NaiveTime, break_minutes: i64) -> f64 {
    let start_min = start.num_seconds_from_midnight() as i64 / 60;
    let mut end_min = end.num_seconds_from_midnight() as i64 / 60;
    if end_min <= start_min {
        end_min += 24 * 60;
    }
    ((end_min - start_min - break_minutes).max(0)) as f64 / 60.0
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(chrono::Datelike::weekday(&date).num_days_from_monday() as i64)
}

/// Builds the candidate values `validate` checks against prior ACCEPTED
/// convocations for the same employee (spec §4.I "Creation").
async fn build_candidate(store: &Store, ctx: &PipelineContext<'_>, employee_id: EmployeeId, date: NaiveDate, start_time: NaiveTime, new_hours: f64) -> RuleCandidate {
    let accepted: Vec<Convocation> = store
        .list_convocations_for_employee(employee_id)
        .await
        .into_iter()
        .map(|(_, c)| c)
        .filter(|c| c.status == ConvocationStatus::Accepted)
        .collect();

    let week = week_start(date);
    let weekly_hours = new_hours + accepted.iter().filter(|c| week_start(c.date) == week).map(|c| c.total_hours).sum::<f64>();
    let daily_hours = new_hours + accepted.iter().filter(|c| c.date == date).map(|c| c.total_hours).sum::<f64>();

    let rest_since_last_shift_hours = accepted
        .iter()
        .filter(|c| c.date <= date)
        .max_by_key(|c| (c.date, c.end_time))
        .map(|c| {
            let prior_end = c.date.and_time(c.end_time).and_utc();
            let this_start = date.and_time(start_time).and_utc();
            (this_start - prior_end).num_minutes() as f64 / 60.0
        });

    let this_start_dt = date.and_time(start_time).and_utc();
    let advance_notice_hours = (this_start_dt - ctx.as_of).num_minutes() as f64 / 60.0;

    RuleCandidate { weekly_hours: Some(weekly_hours), daily_hours: Some(daily_hours), rest_since_last_shift_hours, consecutive_worked_days: None, advance_notice_hours: Some(advance_notice_hours) }
}

/// `create(input)` (spec §4.I): validates first and independently; on a
/// MANDATORY error, returns without persisting.
#[tracing::instrument(skip(store, ctx))]
pub async fn create(store: &Store, ctx: &mut PipelineContext<'_>, input: CreateConvocationInput) -> Result<PipelineOutcome<ConvocationId>> {
    let hours = total_hours(input.start_time, input.end_time, input.break_minutes);
    let candidate = build_candidate(store, ctx, input.employee_id, input.date, input.start_time, hours).await;

    let mut violations = validate(&ctx.rule_snapshot, &candidate);

    let calendar_events = store.list_calendar_events().await;
    let factors = compose_calendar_factors(input.date, input.sector_id, &calendar_events);
    if factors.block_convocations {
        violations.push(RuleViolation { rule_code: "block_convocations".into(), severity: Severity::Error, message: format!("convocations are blocked on {} by calendar event", input.date) });
    }

    let errors: Vec<RuleViolation> = violations.iter().filter(|v| v.severity == Severity::Error).cloned().collect();
    ctx.trace.step("convocation.create", &format!("employee {:?} on {}: {} errors, {} warnings", input.employee_id, input.date, errors.len(), violations.len() - errors.len()));

    if !errors.is_empty() {
        return Ok(PipelineOutcome::blocked(errors));
    }

    let warnings: Vec<RuleViolation> = violations.into_iter().filter(|v| v.severity == Severity::Warning).collect();
    let response_hours = input.response_hours.unwrap_or(DEFAULT_RESPONSE_DEADLINE_HOURS);
    let convocation = Convocation {
        employee_id: input.employee_id,
        sector_id: input.sector_id,
        date: input.date,
        start_time: input.start_time,
        end_time: input.end_time,
        break_minutes: input.break_minutes,
        total_hours: hours,
        status: ConvocationStatus::Pending,
        origin: input.origin,
        sent_at: Some(ctx.as_of),
        response_deadline: ctx.as_of + Duration::hours(response_hours),
        responded_at: None,
        decline_reason: None,
        cancellation_reason: None,
        replaced_convocation_id: None,
        replacement_convocation_id: None,
        legal_validation_passed: warnings.is_empty(),
        legal_validation_errors: Vec::new(),
        legal_validation_warnings: warnings.iter().map(|w| w.message.clone()).collect(),
    };
    let id = store.insert_convocation(convocation).await;
    Ok(PipelineOutcome::ok_with_warnings(id, warnings))
}

/// `accept` (spec §4.I "Response"): PENDING → ACCEPTED.
pub async fn accept(store: &Store, ctx: &PipelineContext<'_>, convocation_id: ConvocationId) -> Result<()> {
    let convocation = store.get_convocation(convocation_id).await.ok_or_else(|| CoreError::NotFound(format!("convocation {:?}", convocation_id)))?;
    if convocation.status != ConvocationStatus::Pending {
        return Err(CoreError::Conflict("only a PENDING convocation may be accepted".into()));
    }
    let as_of = ctx.as_of;
    store
        .update_convocation(convocation_id, |c| {
            c.status = ConvocationStatus::Accepted;
            c.responded_at = Some(as_of);
        })
        .await
}

/// Creates a RESCHEDULE-origin successor for a DECLINED/EXPIRED
/// convocation, linking both ends of the chain (spec §3 "Lifecycle
/// rules", §4.I "auto-reschedule"). A full slot-restricted assignment
/// engine run has no counterpart to bind against here since `Convocation`
/// carries no `ShiftSlotId` reference; the successor repeats the same
/// date/time window under the new origin, which is the concrete behavior
/// `create`'s validation path can still check.
async fn reschedule(store: &Store, ctx: &mut PipelineContext<'_>, predecessor_id: ConvocationId, predecessor: &Convocation) -> Result<Option<ConvocationId>> {
    let input = CreateConvocationInput {
        employee_id: predecessor.employee_id,
        sector_id: predecessor.sector_id,
        date: predecessor.date,
        start_time: predecessor.start_time,
        end_time: predecessor.end_time,
        break_minutes: predecessor.break_minutes,
        origin: ConvocationOrigin::Reschedule,
        response_hours: None,
    };
    let outcome = create(store, ctx, input).await?;
    let Some(successor_id) = outcome.data else { return Ok(None) };

    store.update_convocation(predecessor_id, |c| c.replacement_convocation_id = Some(successor_id)).await?;
    store.update_convocation(successor_id, |c| c.replaced_convocation_id = Some(predecessor_id)).await?;
    Ok(Some(successor_id))
}

/// `decline` (spec §4.I "Response"): PENDING → DECLINED, then attempts an
/// auto-reschedule successor.
#[tracing::instrument(skip(store, ctx))]
pub async fn decline(store: &Store, ctx: &mut PipelineContext<'_>, convocation_id: ConvocationId, reason: Option<String>) -> Result<Option<ConvocationId>> {
    let convocation = store.get_convocation(convocation_id).await.ok_or_else(|| CoreError::NotFound(format!("convocation {:?}", convocation_id)))?;
    if convocation.status != ConvocationStatus::Pending {
        return Err(CoreError::Conflict("only a PENDING convocation may be declined".into()));
    }
    let as_of = ctx.as_of;
    store
        .update_convocation(convocation_id, |c| {
            c.status = ConvocationStatus::Declined;
            c.responded_at = Some(as_of);
            c.decline_reason = reason.clone();
        })
        .await?;

    let declined = store.get_convocation(convocation_id).await.expect("just updated");
    reschedule(store, ctx, convocation_id, &declined).await
}

/// `cancel` (spec §4.I "Cancellation"): only PENDING may be cancelled.
pub async fn cancel(store: &Store, convocation_id: ConvocationId, reason: String) -> Result<()> {
    let convocation = store.get_convocation(convocation_id).await.ok_or_else(|| CoreError::NotFound(format!("convocation {:?}", convocation_id)))?;
    if convocation.status != ConvocationStatus::Pending {
        return Err(CoreError::Conflict("only a PENDING convocation may be cancelled".into()));
    }
    store
        .update_convocation(convocation_id, |c| {
            c.status = ConvocationStatus::Cancelled;
            c.cancellation_reason = Some(reason.clone());
        })
        .await
}

/// Expiry sweep (spec §4.I "Expiry"): every PENDING convocation whose
/// `response_deadline` has passed is marked EXPIRED and queued for
/// reschedule.
#[tracing::instrument(skip(store, ctx))]
pub async fn sweep_expired(store: &Store, ctx: &mut PipelineContext<'_>) -> Result<Vec<ConvocationId>> {
    let now = ctx.as_of;
    let pending = store.list_pending_convocations().await;
    let mut successors = Vec::new();
    for (id, convocation) in pending {
        if !convocation.is_expired_as_of(now) {
            continue;
        }
        store.update_convocation(id, |c| c.status = ConvocationStatus::Expired).await?;
        ctx.trace.step("convocation.expire", &format!("convocation {:?} expired at {}", id, now));
        let expired = store.get_convocation(id).await.expect("just updated");
        if let Some(successor_id) = reschedule(store, ctx, id, &expired).await? {
            successors.push(successor_id);
        }
    }
    Ok(successors)
}
