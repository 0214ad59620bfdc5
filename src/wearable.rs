//! Wearable record normalization.
//!
//! The API client (out of scope here) returns recovery, sleep and cycle
//! records as JSON. This module folds them into one `DailyWearableMetrics`
//! per calendar day. A day-keyed mapping can also be loaded directly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{DailyWearableMetrics, WearableMetric};

const MILLIS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

#[derive(Error, Debug)]
pub enum WearableError {
    #[error("Cannot read wearable data {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid wearable data {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ── Raw API records ──

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecoveryScore {
    pub recovery_score: Option<f64>,
    pub hrv_rmssd_milli: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub spo2_percentage: Option<f64>,
    pub skin_temp_celsius: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecoveryRecord {
    pub created_at: Option<String>,
    pub score: Option<RecoveryScore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StageSummary {
    pub total_in_bed_time_milli: Option<f64>,
    pub total_light_sleep_time_milli: Option<f64>,
    pub total_slow_wave_sleep_time_milli: Option<f64>,
    pub total_rem_sleep_time_milli: Option<f64>,
    pub total_awake_time_milli: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SleepScore {
    pub sleep_performance_percentage: Option<f64>,
    pub sleep_efficiency_percentage: Option<f64>,
    pub sleep_consistency_percentage: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub stage_summary: Option<StageSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SleepRecord {
    pub end: Option<String>,
    pub nap: bool,
    pub score: Option<SleepScore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CycleScore {
    pub strain: Option<f64>,
    pub average_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub kilojoule: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CycleRecord {
    pub start: Option<String>,
    pub score: Option<CycleScore>,
}

/// Everything fetched from the wearable API for one export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawWearableExport {
    pub recovery: Vec<RecoveryRecord>,
    pub sleep: Vec<SleepRecord>,
    #[serde(alias = "cycle")]
    pub cycles: Vec<CycleRecord>,
}

// ── Normalization ──

/// Calendar date of an API timestamp, in the timestamp's own offset.
pub fn timestamp_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn hours(millis: Option<f64>) -> Option<f64> {
    millis.map(|ms| ms / MILLIS_PER_HOUR)
}

fn record_date(kind: &str, timestamp: Option<&str>) -> Option<NaiveDate> {
    let date = timestamp.and_then(timestamp_date);
    if date.is_none() {
        tracing::warn!(
            kind,
            timestamp = timestamp.unwrap_or("<missing>"),
            "Skipping wearable record without a usable date"
        );
    }
    date
}

fn recovery_metrics(score: &RecoveryScore) -> DailyWearableMetrics {
    let mut m = DailyWearableMetrics::default();
    m.set(WearableMetric::RecoveryScore, score.recovery_score);
    m.set(WearableMetric::HrvRmssd, score.hrv_rmssd_milli);
    m.set(WearableMetric::RestingHr, score.resting_heart_rate);
    m.set(WearableMetric::Spo2, score.spo2_percentage);
    m.set(WearableMetric::SkinTemp, score.skin_temp_celsius);
    m
}

fn sleep_metrics(score: &SleepScore) -> DailyWearableMetrics {
    let mut m = DailyWearableMetrics::default();
    m.set(WearableMetric::SleepPerformance, score.sleep_performance_percentage);
    m.set(WearableMetric::SleepEfficiency, score.sleep_efficiency_percentage);
    m.set(WearableMetric::SleepConsistency, score.sleep_consistency_percentage);
    m.set(WearableMetric::RespiratoryRate, score.respiratory_rate);
    if let Some(stages) = &score.stage_summary {
        m.set(WearableMetric::TotalSleepHours, hours(stages.total_in_bed_time_milli));
        m.set(WearableMetric::LightSleepHours, hours(stages.total_light_sleep_time_milli));
        m.set(WearableMetric::DeepSleepHours, hours(stages.total_slow_wave_sleep_time_milli));
        m.set(WearableMetric::RemSleepHours, hours(stages.total_rem_sleep_time_milli));
        m.set(WearableMetric::AwakeHours, hours(stages.total_awake_time_milli));
    }
    m
}

fn cycle_metrics(score: &CycleScore) -> DailyWearableMetrics {
    let mut m = DailyWearableMetrics::default();
    m.set(WearableMetric::DayStrain, score.strain);
    m.set(WearableMetric::AvgHr, score.average_heart_rate);
    m.set(WearableMetric::MaxHr, score.max_heart_rate);
    m.set(WearableMetric::Kilojoules, score.kilojoule);
    m
}

/// Fold raw records into one metrics entry per day.
///
/// Records are applied in export order and the first present value of a
/// field on a given day wins. Naps never contribute sleep metrics.
pub fn normalize(export: &RawWearableExport) -> BTreeMap<NaiveDate, DailyWearableMetrics> {
    let mut days: BTreeMap<NaiveDate, DailyWearableMetrics> = BTreeMap::new();
    let mut merge = |date: NaiveDate, partial: DailyWearableMetrics| {
        days.entry(date).or_default().fill_from(&partial);
    };

    for record in &export.recovery {
        let Some(date) = record_date("recovery", record.created_at.as_deref()) else {
            continue;
        };
        if let Some(score) = &record.score {
            merge(date, recovery_metrics(score));
        }
    }

    for record in export.sleep.iter().filter(|r| !r.nap) {
        let Some(date) = record_date("sleep", record.end.as_deref()) else {
            continue;
        };
        if let Some(score) = &record.score {
            merge(date, sleep_metrics(score));
        }
    }

    for record in &export.cycles {
        let Some(date) = record_date("cycle", record.start.as_deref()) else {
            continue;
        };
        if let Some(score) = &record.score {
            merge(date, cycle_metrics(score));
        }
    }

    days.retain(|_, metrics| !metrics.is_empty());

    tracing::info!(
        recovery = export.recovery.len(),
        sleep = export.sleep.len(),
        cycles = export.cycles.len(),
        days = days.len(),
        "Normalized wearable records"
    );

    days
}

// ── Loading ──

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, WearableError> {
    let raw = std::fs::read_to_string(path).map_err(|source| WearableError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| WearableError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load an already-normalized `{"YYYY-MM-DD": {metric: value}}` mapping.
pub fn load_daily_metrics(
    path: &Path,
) -> Result<BTreeMap<NaiveDate, DailyWearableMetrics>, WearableError> {
    read_json(path)
}

/// Load a raw API export and normalize it.
pub fn load_raw_export(
    path: &Path,
) -> Result<BTreeMap<NaiveDate, DailyWearableMetrics>, WearableError> {
    let export: RawWearableExport = read_json(path)?;
    Ok(normalize(&export))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn export(json: &str) -> RawWearableExport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn timestamps_use_their_own_offset() {
        assert_eq!(timestamp_date("2026-01-05T07:12:00.000Z"), Some(d("2026-01-05")));
        assert_eq!(
            timestamp_date("2026-01-05T23:30:00-05:00"),
            Some(d("2026-01-05"))
        );
        assert_eq!(timestamp_date("2026-01-05T07:12:00"), Some(d("2026-01-05")));
        assert_eq!(timestamp_date("2026-01-05"), Some(d("2026-01-05")));
        assert_eq!(timestamp_date("yesterday"), None);
    }

    #[test]
    fn recovery_fields_mapped() {
        let days = normalize(&export(
            r#"{"recovery": [{
                "created_at": "2026-01-05T11:00:00.000Z",
                "score": {"recovery_score": 64, "hrv_rmssd_milli": 41.2,
                          "resting_heart_rate": 55, "spo2_percentage": 96.5,
                          "skin_temp_celsius": 33.1}
            }]}"#,
        ));
        let day = &days[&d("2026-01-05")];
        assert_eq!(day.recovery_score, Some(64.0));
        assert_eq!(day.hrv_rmssd, Some(41.2));
        assert_eq!(day.resting_hr, Some(55.0));
        assert_eq!(day.spo2, Some(96.5));
        assert_eq!(day.skin_temp, Some(33.1));
    }

    #[test]
    fn sleep_stages_converted_to_hours() {
        let days = normalize(&export(
            r#"{"sleep": [{
                "end": "2026-01-06T06:30:00.000Z",
                "score": {"sleep_performance_percentage": 88,
                          "respiratory_rate": 15.2,
                          "stage_summary": {"total_in_bed_time_milli": 28800000,
                                            "total_rem_sleep_time_milli": 5400000}}
            }]}"#,
        ));
        let day = &days[&d("2026-01-06")];
        assert_eq!(day.sleep_performance, Some(88.0));
        assert_eq!(day.total_sleep_hours, Some(8.0));
        assert_eq!(day.rem_sleep_hours, Some(1.5));
        assert_eq!(day.deep_sleep_hours, None);
        assert_eq!(day.respiratory_rate, Some(15.2));
    }

    #[test]
    fn naps_ignored() {
        let days = normalize(&export(
            r#"{"sleep": [{"end": "2026-01-06T14:00:00Z", "nap": true,
                           "score": {"sleep_performance_percentage": 40}}]}"#,
        ));
        assert!(days.is_empty());
    }

    #[test]
    fn cycle_fields_mapped() {
        let days = normalize(&export(
            r#"{"cycles": [{"start": "2026-01-07T04:00:00.000Z",
                            "score": {"strain": 12.4, "average_heart_rate": 71,
                                      "max_heart_rate": 160, "kilojoule": 9000}}]}"#,
        ));
        let day = &days[&d("2026-01-07")];
        assert_eq!(day.day_strain, Some(12.4));
        assert_eq!(day.avg_hr, Some(71.0));
        assert_eq!(day.max_hr, Some(160.0));
        assert_eq!(day.kilojoules, Some(9000.0));
    }

    #[test]
    fn sources_merge_into_one_day() {
        let days = normalize(&export(
            r#"{
                "recovery": [{"created_at": "2026-01-05T11:00:00Z", "score": {"recovery_score": 64}}],
                "sleep": [{"end": "2026-01-05T06:00:00Z", "score": {"sleep_efficiency_percentage": 91}}],
                "cycle": [{"start": "2026-01-05T04:00:00Z", "score": {"strain": 8.0}}]
            }"#,
        ));
        assert_eq!(days.len(), 1);
        let day = &days[&d("2026-01-05")];
        assert_eq!(day.present_count(), 3);
    }

    #[test]
    fn first_present_value_per_day_wins() {
        let days = normalize(&export(
            r#"{"recovery": [
                {"created_at": "2026-01-05T01:00:00Z", "score": {"resting_heart_rate": 55}},
                {"created_at": "2026-01-05T20:00:00Z", "score": {"resting_heart_rate": 60, "recovery_score": 70}}
            ]}"#,
        ));
        let day = &days[&d("2026-01-05")];
        assert_eq!(day.resting_hr, Some(55.0));
        assert_eq!(day.recovery_score, Some(70.0));
    }

    #[test]
    fn undated_and_unscored_records_skipped() {
        let days = normalize(&export(
            r#"{"recovery": [
                {"score": {"recovery_score": 50}},
                {"created_at": "not a date", "score": {"recovery_score": 51}},
                {"created_at": "2026-01-08T10:00:00Z"}
            ]}"#,
        ));
        assert!(days.is_empty());
    }

    #[test]
    fn load_normalized_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wearable.json");
        std::fs::write(
            &path,
            r#"{"2026-01-05": {"recovery_score": 64}, "2026-01-06": {}}"#,
        )
        .unwrap();
        let days = load_daily_metrics(&path).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[&d("2026-01-05")].recovery_score, Some(64.0));
        assert!(days[&d("2026-01-06")].is_empty());
    }

    #[test]
    fn load_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_raw_export(&path).unwrap_err();
        assert!(matches!(err, WearableError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));

        let missing = load_daily_metrics(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, WearableError::Read { .. }));
    }
}
