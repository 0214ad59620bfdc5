use crate::models::{Direction, MetricField};
use super::types::*;

/// Sums of squared deviations at or below this count as no variance.
const VARIANCE_EPSILON: f64 = 1e-12;

/// Pearson correlation coefficient of two equally long series.
///
/// `None` when there are fewer than two points or either series is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs[..n].iter().sum::<f64>() / nf;
    let mean_y = ys[..n].iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx <= VARIANCE_EPSILON || syy <= VARIANCE_EPSILON {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Values of both fields on the rows where both are present.
fn co_present(rows: &[DailyGridRow], a: MetricField, b: MetricField) -> (Vec<f64>, Vec<f64>) {
    rows.iter()
        .filter_map(|row| Some((row.value(a)?, row.value(b)?)))
        .unzip()
}

/// Correlate every pair inside every event window.
///
/// Emits exactly `events.len() * pairs.len()` results, event-major. Pairs
/// without enough co-present days get a `None` coefficient, never dropped.
pub fn correlate(
    grid: &DailyGrid,
    events: &[EventWindow],
    pairs: &[MetricPair],
) -> Vec<CorrelationResult> {
    let mut results = Vec::with_capacity(events.len() * pairs.len());

    for event in events {
        let bounds = event.bounds(&grid.window);
        let rows = grid.rows_between(bounds.start, bounds.end);

        for pair in pairs {
            let (xs, ys) = co_present(
                rows,
                MetricField::Wearable(pair.wearable),
                MetricField::Lab(pair.biomarker),
            );
            let coefficient = pearson(&xs, &ys);

            tracing::debug!(
                event = %event.label,
                wearable = pair.wearable.as_str(),
                biomarker = pair.biomarker.as_str(),
                samples = xs.len(),
                coefficient = ?coefficient,
                "Correlated pair"
            );

            results.push(CorrelationResult {
                metric_a: pair.wearable,
                metric_b: pair.biomarker,
                window: bounds.clone(),
                coefficient,
                sample_count: xs.len(),
                direction: Direction::from_coefficient(coefficient),
            });
        }
    }

    results
}
