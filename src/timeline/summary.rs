use chrono::{Days, NaiveDate};

use crate::models::{MetricField, Trend, WearableMetric};
use super::types::*;

/// Deltas this close to zero are reported as unchanged.
const UNCHANGED_EPSILON: f64 = 1e-9;

fn mean_of(rows: &[DailyGridRow], field: MetricField) -> (Option<f64>, usize) {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.value(field)).collect();
    if values.is_empty() {
        return (None, 0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (Some(mean), values.len())
}

fn trend(delta: Option<f64>) -> Trend {
    match delta {
        None => Trend::Insufficient,
        Some(d) if d.abs() <= UNCHANGED_EPSILON => Trend::Unchanged,
        Some(d) if d > 0.0 => Trend::Increase,
        Some(_) => Trend::Decrease,
    }
}

/// `(from, to)` inclusive, or `None` when the interval is empty.
fn interval(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    let (from, to) = (from?, to?);
    (from <= to).then_some((from, to))
}

fn summarize_field(pre: &[DailyGridRow], post: &[DailyGridRow], field: MetricField) -> FieldSummary {
    let (pre_mean, pre_count) = mean_of(pre, field);
    let (post_mean, post_count) = mean_of(post, field);
    let delta = pre_mean.zip(post_mean).map(|(before, after)| after - before);
    FieldSummary {
        field,
        pre_mean,
        pre_count,
        post_mean,
        post_count,
        delta,
        trend: trend(delta),
    }
}

/// Pre/post means around each event for every wearable metric and every
/// biomarker that appears somewhere in the grid.
///
/// The pre interval is `[event - pre_days, event)` and the post interval is
/// `(event, event + post_days]`, both clipped to the grid. The event day
/// itself belongs to neither.
pub fn summarize_windows(grid: &DailyGrid, events: &[EventWindow]) -> Vec<WindowSummary> {
    let fields: Vec<MetricField> = WearableMetric::ALL
        .iter()
        .map(|m| MetricField::Wearable(*m))
        .chain(grid.biomarkers_present().into_iter().map(MetricField::Lab))
        .collect();

    events
        .iter()
        .map(|event| {
            let bounds = event.bounds(&grid.window);
            let before = event.event_date.checked_sub_days(Days::new(1));
            let after = event.event_date.checked_add_days(Days::new(1));

            let pre = interval(Some(bounds.start), before)
                .map(|(from, to)| grid.rows_between(from, to))
                .unwrap_or(&[]);
            let post = interval(after, Some(bounds.end))
                .map(|(from, to)| grid.rows_between(from, to))
                .unwrap_or(&[]);

            tracing::debug!(
                event = %event.label,
                pre_days = pre.len(),
                post_days = post.len(),
                "Summarizing event window"
            );

            WindowSummary {
                window: bounds,
                fields: fields
                    .iter()
                    .map(|field| summarize_field(pre, post, *field))
                    .collect(),
            }
        })
        .collect()
}
