use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DailyWearableMetrics, LabRecord};
use super::types::*;

/// Build the gap-free daily grid for `window`.
///
/// Wearable days and lab records outside the window are dropped. Absent
/// values stay absent: nothing is interpolated or carried forward. Calling
/// this twice with the same inputs yields equal grids.
pub fn build_grid(
    window: &AnalysisWindow,
    wearable: &BTreeMap<NaiveDate, DailyWearableMetrics>,
    lab_records: &[LabRecord],
    events: &[EventWindow],
) -> DailyGrid {
    let mut rows: Vec<DailyGridRow> = window
        .start()
        .iter_days()
        .take_while(|date| *date <= window.end())
        .map(DailyGridRow::empty)
        .collect();

    let index = |date: NaiveDate| -> Option<usize> {
        window
            .contains(date)
            .then(|| (date - window.start()).num_days() as usize)
    };

    let mut ignored_wearable = 0usize;
    for (date, metrics) in wearable {
        match index(*date) {
            Some(i) => rows[i].wearable = metrics.clone(),
            None => ignored_wearable += 1,
        }
    }

    let mut ignored_labs = 0usize;
    for record in lab_records {
        let Some(i) = index(record.date()) else {
            ignored_labs += 1;
            continue;
        };
        let m = &record.measurement;
        rows[i].labs.insert(
            m.biomarker,
            LabCell {
                value: m.value,
                unit: m.unit.clone(),
                flag: record.flag,
                censored: m.censored.is_some(),
            },
        );
    }

    for event in events {
        if let Some(i) = index(event.event_date) {
            rows[i].events.push(event.label.clone());
        }
    }

    if ignored_wearable > 0 || ignored_labs > 0 {
        tracing::debug!(
            start = %window.start(),
            end = %window.end(),
            ignored_wearable,
            ignored_labs,
            "Inputs outside the analysis window ignored"
        );
    }

    DailyGrid {
        window: *window,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lab::sample_measurement;
    use crate::models::{Biomarker, LabFlag, MetricField, WearableMetric};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn window(start: &str, end: &str) -> AnalysisWindow {
        AnalysisWindow::new(d(start), d(end)).unwrap()
    }

    fn recovery(score: f64) -> DailyWearableMetrics {
        DailyWearableMetrics {
            recovery_score: Some(score),
            ..Default::default()
        }
    }

    fn glucose_record(value: f64, date: &str) -> LabRecord {
        LabRecord::new(
            sample_measurement(Biomarker::Glucose, value, (Some(70.0), Some(100.0)), date),
            1,
        )
    }

    #[test]
    fn one_row_per_day_inclusive() {
        let grid = build_grid(&window("2026-01-01", "2026-02-10"), &BTreeMap::new(), &[], &[]);
        assert_eq!(grid.rows.len(), 41);
        assert_eq!(grid.rows[0].date, d("2026-01-01"));
        assert_eq!(grid.rows[40].date, d("2026-02-10"));
        for pair in grid.rows.windows(2) {
            assert_eq!(pair[1].date, pair[0].date.succ_opt().unwrap());
        }
    }

    #[test]
    fn single_day_window() {
        let grid = build_grid(&window("2026-01-05", "2026-01-05"), &BTreeMap::new(), &[], &[]);
        assert_eq!(grid.rows.len(), 1);
        assert!(!grid.rows[0].has_wearable_data());
    }

    #[test]
    fn sources_land_on_their_dates() {
        let mut wearable = BTreeMap::new();
        wearable.insert(d("2026-01-05"), recovery(64.0));
        let labs = [glucose_record(140.0, "2026-01-07")];
        let events = [EventWindow {
            event_date: d("2026-01-06"),
            label: "Cardiac Arrest".into(),
            description: None,
            pre_days: 7,
            post_days: 7,
        }];

        let grid = build_grid(&window("2026-01-01", "2026-01-10"), &wearable, &labs, &events);

        let r5 = grid.row(d("2026-01-05")).unwrap();
        assert_eq!(r5.value(MetricField::Wearable(WearableMetric::RecoveryScore)), Some(64.0));
        assert!(!r5.is_present(MetricField::Lab(Biomarker::Glucose)));

        let r6 = grid.row(d("2026-01-06")).unwrap();
        assert_eq!(r6.events, vec!["Cardiac Arrest".to_string()]);
        assert!(!r6.has_wearable_data());

        let r7 = grid.row(d("2026-01-07")).unwrap();
        let cell = &r7.labs[&Biomarker::Glucose];
        assert_eq!(cell.value, 140.0);
        assert_eq!(cell.flag, LabFlag::High);
        assert!(!cell.censored);
    }

    #[test]
    fn out_of_window_inputs_ignored() {
        let mut wearable = BTreeMap::new();
        wearable.insert(d("2025-12-31"), recovery(50.0));
        wearable.insert(d("2026-01-11"), recovery(51.0));
        let labs = [glucose_record(95.0, "2026-03-01")];

        let grid = build_grid(&window("2026-01-01", "2026-01-10"), &wearable, &labs, &[]);
        assert_eq!(grid.rows.len(), 10);
        assert!(grid.rows.iter().all(|r| !r.has_wearable_data() && r.labs.is_empty()));
        assert!(grid.biomarkers_present().is_empty());
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let mut wearable = BTreeMap::new();
        wearable.insert(d("2026-01-02"), recovery(70.0));
        let labs = [glucose_record(95.0, "2026-01-03")];
        let w = window("2026-01-01", "2026-01-05");

        let a = build_grid(&w, &wearable, &labs, &[]);
        let b = build_grid(&w, &wearable, &labs, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn rows_between_clips_to_grid() {
        let grid = build_grid(&window("2026-01-01", "2026-01-10"), &BTreeMap::new(), &[], &[]);
        assert_eq!(grid.rows_between(d("2025-12-25"), d("2026-01-03")).len(), 3);
        assert_eq!(grid.rows_between(d("2026-01-09"), d("2026-01-20")).len(), 2);
        assert!(grid.rows_between(d("2026-01-05"), d("2026-01-04")).is_empty());
        assert!(grid.row(d("2026-01-11")).is_none());
    }
}
