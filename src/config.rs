use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Biomarker, WearableMetric};
use crate::timeline::{AnalysisWindow, EventWindow, MetricPair};

/// Application-level constants
pub const APP_NAME: &str = "lab-timeline";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,lab_timeline=debug,pdf_extract=warn,lopdf=warn"
}

/// Get the application data directory (`~/.lab-timeline/`).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lab-timeline")
}

/// Config file used when none is given on the command line.
pub fn default_config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Setup mistakes. Always fatal, unlike data sparsity which is modeled as values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Analysis window starts {start} after it ends {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Event '{label}' on {date} lies outside the analysis window")]
    EventOutsideWindow { label: String, date: NaiveDate },

    #[error("Unknown {kind} field in correlation pair: {name}")]
    UnknownField { kind: &'static str, name: String },
}

/// A clinical event as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    pub date: NaiveDate,
    pub label: String,
    /// Free text carried into the window of every correlation and summary.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_window_days")]
    pub pre_days: u32,
    #[serde(default = "default_window_days")]
    pub post_days: u32,
}

/// A correlation pair as written in the config file; names are resolved on validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub wearable: String,
    pub biomarker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
    #[serde(default = "default_events")]
    pub events: Vec<EventConfig>,
    #[serde(default = "default_pairs")]
    pub pairs: Vec<PairConfig>,
}

/// Validated, typed form of [`AnalysisConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPlan {
    pub window: AnalysisWindow,
    pub events: Vec<EventWindow>,
    pub pairs: Vec<MetricPair>,
}

fn default_window_days() -> u32 {
    7
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 10).unwrap_or_default()
}

fn default_events() -> Vec<EventConfig> {
    vec![
        EventConfig {
            date: NaiveDate::from_ymd_opt(2026, 1, 11).unwrap_or_default(),
            label: "Cardiac Arrest".into(),
            description: Some(
                "Collapse with bystander CPR and a single defibrillation; no intubation.".into(),
            ),
            pre_days: default_window_days(),
            post_days: default_window_days(),
        },
        EventConfig {
            date: NaiveDate::from_ymd_opt(2026, 1, 19).unwrap_or_default(),
            label: "Triple Bypass Surgery".into(),
            description: Some("Triple bypass surgery performed.".into()),
            pre_days: default_window_days(),
            post_days: default_window_days(),
        },
    ]
}

fn default_pairs() -> Vec<PairConfig> {
    [
        ("recovery_score", "glucose"),
        ("hrv_rmssd", "glucose"),
        ("resting_hr", "hemoglobin"),
        ("spo2", "hemoglobin"),
        ("recovery_score", "wbc"),
        ("sleep_performance", "wbc"),
    ]
    .into_iter()
    .map(|(wearable, biomarker)| PairConfig {
        wearable: wearable.into(),
        biomarker: biomarker.into(),
    })
    .collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            events: default_events(),
            pairs: default_pairs(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else the default location if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let fallback = default_config_path();
        if fallback.exists() {
            tracing::debug!(path = %fallback.display(), "Loading default configuration file");
            return Self::load(&fallback);
        }
        tracing::debug!("No configuration file, using built-in defaults");
        Ok(Self::default())
    }

    /// Check the window, events and pairs, producing the typed plan.
    pub fn validate(&self) -> Result<AnalysisPlan, ConfigError> {
        let window = AnalysisWindow::new(self.start_date, self.end_date)?;

        let events = self
            .events
            .iter()
            .map(|e| {
                if !window.contains(e.date) {
                    return Err(ConfigError::EventOutsideWindow {
                        label: e.label.clone(),
                        date: e.date,
                    });
                }
                Ok(EventWindow {
                    event_date: e.date,
                    label: e.label.clone(),
                    description: e.description.clone(),
                    pre_days: e.pre_days,
                    post_days: e.post_days,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pairs = self
            .pairs
            .iter()
            .map(|p| {
                let wearable = p.wearable.parse::<WearableMetric>().map_err(|_| {
                    ConfigError::UnknownField {
                        kind: "wearable",
                        name: p.wearable.clone(),
                    }
                })?;
                let biomarker = p.biomarker.parse::<Biomarker>().map_err(|_| {
                    ConfigError::UnknownField {
                        kind: "biomarker",
                        name: p.biomarker.clone(),
                    }
                })?;
                Ok(MetricPair {
                    wearable,
                    biomarker,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AnalysisPlan {
            window,
            events,
            pairs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn defaults_validate() {
        let plan = AnalysisConfig::default().validate().unwrap();
        assert_eq!(plan.window.start(), date("2026-01-01"));
        assert_eq!(plan.window.end(), date("2026-02-10"));
        assert_eq!(plan.events.len(), 2);
        assert_eq!(plan.events[0].label, "Cardiac Arrest");
        assert_eq!(plan.pairs.len(), 6);
        assert_eq!(
            plan.pairs[0],
            MetricPair {
                wearable: WearableMetric::RecoveryScore,
                biomarker: Biomarker::Glucose,
            }
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let cfg = AnalysisConfig {
            start_date: date("2026-02-10"),
            end_date: date("2026-01-01"),
            events: vec![],
            pairs: vec![],
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidWindow { .. })));
    }

    #[test]
    fn event_outside_window_is_rejected() {
        let mut cfg = AnalysisConfig::default();
        cfg.events.push(EventConfig {
            date: date("2025-12-25"),
            label: "Before".into(),
            description: None,
            pre_days: 3,
            post_days: 3,
        });
        match cfg.validate() {
            Err(ConfigError::EventOutsideWindow { label, .. }) => assert_eq!(label, "Before"),
            other => panic!("expected EventOutsideWindow, got {other:?}"),
        }
    }

    #[test]
    fn unknown_pair_field_is_rejected() {
        let mut cfg = AnalysisConfig::default();
        cfg.pairs.push(PairConfig {
            wearable: "steps".into(),
            biomarker: "glucose".into(),
        });
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnknownField { kind: "wearable", .. })
        ));

        let mut cfg = AnalysisConfig::default();
        cfg.pairs = vec![PairConfig {
            wearable: "resting_hr".into(),
            biomarker: "troponin".into(),
        }];
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnknownField { kind: "biomarker", .. })
        ));
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"start_date": "2026-01-01", "end_date": "2026-01-31",
                "events": [{"date": "2026-01-11", "label": "Cardiac Arrest", "pre_days": 5}]}"#,
        )
        .unwrap();

        let cfg = AnalysisConfig::load(&path).unwrap();
        assert_eq!(cfg.end_date, date("2026-01-31"));
        assert_eq!(cfg.events[0].pre_days, 5);
        assert_eq!(cfg.events[0].post_days, 7);
        assert_eq!(cfg.pairs, default_pairs());
    }

    #[test]
    fn event_description_is_optional_and_carried() {
        let cfg: AnalysisConfig = serde_json::from_str(
            r#"{"events": [
                {"date": "2026-01-11", "label": "Cardiac Arrest", "description": "Collapsed at tennis"},
                {"date": "2026-01-19", "label": "Surgery"}]}"#,
        )
        .unwrap();
        assert_eq!(cfg.events[0].description.as_deref(), Some("Collapsed at tennis"));
        assert_eq!(cfg.events[1].description, None);

        let plan = cfg.validate().unwrap();
        let bounds = plan.events[0].bounds(&plan.window);
        assert_eq!(bounds.description.as_deref(), Some("Collapsed at tennis"));
        assert_eq!(plan.events[1].description, None);
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = AnalysisConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AnalysisConfig::load(Path::new("/nonexistent/lab-timeline.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn app_data_dir_is_named_after_app() {
        assert!(app_data_dir().ends_with(".lab-timeline"));
        assert!(default_config_path().starts_with(app_data_dir()));
    }
}
