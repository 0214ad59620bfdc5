use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config::ConfigError;
use crate::models::{
    Biomarker, Direction, DailyWearableMetrics, LabFlag, MetricField, Trend, WearableMetric,
};

/// Inclusive calendar window the grid covers. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl AnalysisWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Comparison interval around a clinical event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventWindow {
    pub event_date: NaiveDate,
    pub label: String,
    pub description: Option<String>,
    pub pre_days: u32,
    pub post_days: u32,
}

impl EventWindow {
    /// `[event - pre_days, event + post_days]`, clipped to the analysis window.
    pub fn bounds(&self, window: &AnalysisWindow) -> WindowBounds {
        let start = self
            .event_date
            .checked_sub_days(Days::new(self.pre_days.into()))
            .unwrap_or(NaiveDate::MIN)
            .max(window.start());
        let end = self
            .event_date
            .checked_add_days(Days::new(self.post_days.into()))
            .unwrap_or(NaiveDate::MAX)
            .min(window.end());
        WindowBounds {
            label: self.label.clone(),
            description: self.description.clone(),
            event_date: self.event_date,
            start,
            end,
        }
    }
}

/// Resolved date interval of an event window, as reported with results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowBounds {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One wearable field paired with one biomarker for correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricPair {
    pub wearable: WearableMetric,
    pub biomarker: Biomarker,
}

/// Lab value copied into the grid on its collection date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabCell {
    pub value: f64,
    pub unit: String,
    pub flag: LabFlag,
    pub censored: bool,
}

/// One calendar day of the merged timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyGridRow {
    pub date: NaiveDate,
    pub wearable: DailyWearableMetrics,
    pub labs: BTreeMap<Biomarker, LabCell>,
    /// Labels of clinical events anchored on this date.
    pub events: Vec<String>,
}

impl DailyGridRow {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            wearable: DailyWearableMetrics::default(),
            labs: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn value(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::Wearable(m) => self.wearable.get(m),
            MetricField::Lab(b) => self.labs.get(&b).map(|cell| cell.value),
        }
    }

    pub fn is_present(&self, field: MetricField) -> bool {
        self.value(field).is_some()
    }

    pub fn has_wearable_data(&self) -> bool {
        !self.wearable.is_empty()
    }
}

/// Gap-free per-day table over an analysis window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyGrid {
    pub window: AnalysisWindow,
    pub rows: Vec<DailyGridRow>,
}

impl DailyGrid {
    pub fn row(&self, date: NaiveDate) -> Option<&DailyGridRow> {
        if !self.window.contains(date) {
            return None;
        }
        let idx = (date - self.window.start()).num_days() as usize;
        self.rows.get(idx)
    }

    /// Rows with `start <= date <= end`, in date order.
    pub fn rows_between(&self, start: NaiveDate, end: NaiveDate) -> &[DailyGridRow] {
        let from = self.rows.partition_point(|r| r.date < start);
        let to = self.rows.partition_point(|r| r.date <= end);
        if from >= to {
            return &[];
        }
        &self.rows[from..to]
    }

    /// Biomarkers that appear on at least one row.
    pub fn biomarkers_present(&self) -> Vec<Biomarker> {
        let mut seen: Vec<Biomarker> = self
            .rows
            .iter()
            .flat_map(|r| r.labs.keys().copied())
            .collect();
        seen.sort();
        seen.dedup();
        seen
    }
}

/// Pearson correlation of one pair inside one event window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub metric_a: WearableMetric,
    pub metric_b: Biomarker,
    pub window: WindowBounds,
    /// `None` when fewer than two co-present dates or a series has no variance.
    pub coefficient: Option<f64>,
    pub sample_count: usize,
    pub direction: Direction,
}

/// Pre/post comparison of one field around one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: MetricField,
    pub pre_mean: Option<f64>,
    pub pre_count: usize,
    pub post_mean: Option<f64>,
    pub post_count: usize,
    pub delta: Option<f64>,
    pub trend: Trend,
}

/// All field summaries for one event window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub window: WindowBounds,
    pub fields: Vec<FieldSummary>,
}
