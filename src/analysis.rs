use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::AnalysisPlan;
use crate::models::{DailyWearableMetrics, LabRecord};
use crate::timeline::{
    build_grid, correlate, summarize_windows, CorrelationResult, DailyGrid, WindowSummary,
};

/// Merged timeline plus everything computed from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutput {
    pub grid: DailyGrid,
    pub correlations: Vec<CorrelationResult>,
    pub summaries: Vec<WindowSummary>,
}

/// Build the grid for a validated plan and run the event-relative analyses.
pub fn run_analysis(
    plan: &AnalysisPlan,
    wearable: &BTreeMap<NaiveDate, DailyWearableMetrics>,
    lab_records: &[LabRecord],
) -> AnalysisOutput {
    let grid = build_grid(&plan.window, wearable, lab_records, &plan.events);
    let correlations = correlate(&grid, &plan.events, &plan.pairs);
    let summaries = summarize_windows(&grid, &plan.events);

    let with_coefficient = correlations
        .iter()
        .filter(|c| c.coefficient.is_some())
        .count();
    tracing::info!(
        days = grid.rows.len(),
        lab_days = grid.rows.iter().filter(|r| !r.labs.is_empty()).count(),
        wearable_days = grid.rows.iter().filter(|r| r.has_wearable_data()).count(),
        correlations = correlations.len(),
        with_coefficient,
        "Analysis complete"
    );

    AnalysisOutput {
        grid,
        correlations,
        summaries,
    }
}
