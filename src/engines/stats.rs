//! Statistics Engine (spec §4.B): weekday-bias EWMA and hourly-distribution
//! tables, both incremental and deterministic.

use std::collections::HashMap;

use crate::domain::datalake::{BiasMethod, EventType, HourlyDistributionStats, WeekdayBiasStats};
use crate::domain::weekday::Weekday;
use crate::ids::SectorId;
use crate::pipeline::PipelineContext;
use crate::store::Store;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_variance(values: &[f64], mean_value: f64) -> f64 {
    values.iter().map(|v| (v - mean_value).powi(2)).sum::<f64>() / values.len() as f64
}

/// Updates `bias_w <- (1 - alpha) * bias_w + alpha * mean(e_new_batch)` for
/// every weekday present in `errors_by_weekday`, skipping weekdays with no
/// paired samples entirely (spec §4.B: "the weekday is skipped silently").
///
/// `n`/`std_pp`/`mae_pp` are pooled across the full history, not just this
/// batch (spec §4.B). The pooling uses the batch's own mean/variance, not
/// the running EWMA bias, as the convergence target for std/mae — the
/// EWMA bias and the plain historical mean are tracked as separate
/// concerns by design.
#[tracing::instrument(skip(store, errors_by_weekday, ctx))]
pub async fn update_weekday_bias(store: &Store, sector_id: SectorId, metric_name: &str, errors_by_weekday: HashMap<Weekday, Vec<f64>>, alpha: f64, ctx: &mut PipelineContext<'_>) {
    for (weekday, errors) in errors_by_weekday {
        if errors.is_empty() {
            continue;
        }
        let batch_mean = mean(&errors);
        let batch_mae = mean(&errors.iter().map(|e| e.abs()).collect::<Vec<_>>());
        let batch_var = population_variance(&errors, batch_mean);

        let existing = store.get_weekday_bias(sector_id, metric_name, weekday).await;
        let (old_bias, old_n, old_std, old_mae) = existing.as_ref().map(|s| (s.bias_pp, s.n, s.std_pp, s.mae_pp)).unwrap_or((0.0, 0, 0.0, 0.0));

        let combined_n = old_n + errors.len() as u32;
        let combined_mae = (old_mae * old_n as f64 + batch_mae * errors.len() as f64) / combined_n as f64;
        let combined_var = (old_std.powi(2) * old_n as f64 + batch_var * errors.len() as f64) / combined_n as f64;
        let new_bias = (1.0 - alpha) * old_bias + alpha * batch_mean;

        let updated = WeekdayBiasStats {
            sector_id,
            metric_name: metric_name.to_string(),
            weekday,
            bias_pp: new_bias,
            n: combined_n,
            std_pp: combined_var.sqrt(),
            mae_pp: combined_mae,
            method: BiasMethod::Ewma,
            method_params: serde_json::json!({ "alpha": alpha }),
        };
        store.set_weekday_bias(updated).await;
        ctx.trace.step("stats.weekday_bias", &format!("updated {:?} bias for {:?}", metric_name, weekday)).calculations = serde_json::json!({ "batch_mean": batch_mean, "new_bias_pp": new_bias, "n": combined_n });
    }
}

/// Sets a weekday's bias directly, bypassing the EWMA recurrence (spec
/// §4.B, "Bootstrap"). Subsequent EWMA updates continue from this bias as
/// if seeded, since `n` is reset to 0.
pub async fn bootstrap_weekday_bias(store: &Store, sector_id: SectorId, metric_name: &str, weekday: Weekday, bias_pp: f64) {
    store
        .set_weekday_bias(WeekdayBiasStats {
            sector_id,
            metric_name: metric_name.to_string(),
            weekday,
            bias_pp,
            n: 0,
            std_pp: 0.0,
            mae_pp: 0.0,
            method: BiasMethod::BootstrapManual,
            method_params: serde_json::Value::Null,
        })
        .await;
}

/// Reads back a weekday's bias, or `(0.0, has_bias_data = false)` when no
/// row exists (spec §4.B: "Consumers must treat absence as bias 0 with
/// `has_bias_data = false`").
pub async fn weekday_bias_or_default(store: &Store, sector_id: SectorId, metric_name: &str, weekday: Weekday) -> (f64, bool) {
    match store.get_weekday_bias(sector_id, metric_name, weekday).await {
        Some(stats) => (stats.bias_pp, true),
        None => (0.0, false),
    }
}

/// Recomputes hourly-distribution percentage shares for `(weekday,
/// event_type)` from the raw hourly aggregate rows (spec §4.B: "sum
/// aggregated counts by hour_timeline; emit a percentage share of the
/// weekday total. `n` is distinct operational-date count").
pub async fn update_hourly_distribution(store: &Store, sector_id: SectorId, metric_name: &str, weekday: Weekday, event_type: EventType) {
    let rows = store.list_hourly_agg_for_sector(sector_id).await;
    let matching: Vec<_> = rows.into_iter().filter(|r| r.weekday == weekday && r.event_type == event_type).collect();
    if matching.is_empty() {
        return;
    }

    let total: u32 = matching.iter().map(|r| r.count_events).sum();
    let distinct_dates: std::collections::HashSet<_> = matching.iter().map(|r| r.operational_date).collect();
    let n = distinct_dates.len() as u32;

    let mut by_hour: HashMap<u8, u32> = HashMap::new();
    for row in &matching {
        *by_hour.entry(row.hour_timeline).or_insert(0) += row.count_events;
    }

    for (hour_timeline, count) in by_hour {
        let pct_share = if total > 0 { count as f64 / total as f64 * 100.0 } else { 0.0 };
        store
            .set_hourly_distribution(HourlyDistributionStats { sector_id, metric_name: metric_name.to_string(), weekday, hour_timeline, pct_share, n })
            .await;
    }
}
