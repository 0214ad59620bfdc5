use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use thiserror::Error;

use crate::analysis::run_analysis;
use crate::config::{AnalysisConfig, ConfigError};
use crate::export::{export_all, ExportError};
use crate::models::DailyWearableMetrics;
use crate::pipeline::extraction::DocumentInput;
use crate::pipeline::processor::{discover_documents, DocumentProcessor};
use crate::wearable::{load_daily_metrics, load_raw_export, WearableError};

/// Extract biomarkers from lab documents and align them with daily wearable
/// metrics around clinical events.
#[derive(Parser, Debug)]
#[command(
    name = "lab-timeline",
    version = env!("CARGO_PKG_VERSION"),
    about = "Extract lab biomarkers and correlate them with wearable metrics around clinical events",
    long_about = None
)]
pub struct Cli {
    /// Analysis configuration (JSON). Defaults to ~/.lab-timeline/config.json, then built-ins
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Directory containing lab report documents (.pdf, .txt)
    #[arg(long = "documents")]
    pub documents: PathBuf,

    /// Day-keyed wearable metrics (JSON)
    #[arg(long = "wearable", conflicts_with = "raw_wearable")]
    pub wearable: Option<PathBuf>,

    /// Raw wearable API export with recovery, sleep and cycle records (JSON)
    #[arg(long = "raw-wearable")]
    pub raw_wearable: Option<PathBuf>,

    /// Output directory for CSV and JSON results
    #[arg(long = "out")]
    pub out: PathBuf,
}

/// Fatal setup or output failures. Per-document problems never end up here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wearable(#[from] WearableError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Cannot read documents directory {path}: {source}")]
    Documents {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn load_wearable(cli: &Cli) -> Result<BTreeMap<NaiveDate, DailyWearableMetrics>, AppError> {
    let daily = match (&cli.wearable, &cli.raw_wearable) {
        (Some(path), _) => load_daily_metrics(path)?,
        (None, Some(path)) => load_raw_export(path)?,
        (None, None) => {
            tracing::warn!("No wearable data given, wearable columns will be empty");
            BTreeMap::new()
        }
    };
    tracing::info!(days = daily.len(), "Loaded wearable metrics");
    Ok(daily)
}

fn scan_documents(dir: &Path) -> Result<Vec<DocumentInput>, AppError> {
    discover_documents(dir).map_err(|source| AppError::Documents {
        path: dir.to_path_buf(),
        source,
    })
}

/// Run the full pipeline for already-parsed arguments.
pub fn execute(cli: &Cli) -> Result<(), AppError> {
    let config = AnalysisConfig::load_or_default(cli.config.as_deref())?;
    let plan = config.validate()?;
    tracing::info!(
        start = %plan.window.start(),
        end = %plan.window.end(),
        events = plan.events.len(),
        pairs = plan.pairs.len(),
        "Analysis plan ready"
    );

    let documents = scan_documents(&cli.documents)?;
    let batch = DocumentProcessor::default().process_batch(&documents);
    let wearable = load_wearable(cli)?;

    let output = run_analysis(&plan, &wearable, &batch.assembly.records);
    let written = export_all(&cli.out, &batch, &output)?;

    let extracted = batch.outcomes.iter().filter(|o| o.is_extracted()).count();
    println!(
        "Processed {} document(s): {} extracted, {} skipped.",
        batch.outcomes.len(),
        extracted,
        batch.outcomes.len() - extracted
    );
    println!(
        "{} lab record(s), {} conflict(s), {} day(s) in grid.",
        batch.assembly.records.len(),
        batch.assembly.conflicts.len(),
        output.grid.rows.len()
    );
    for path in written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_argument_set() {
        let cli = Cli::try_parse_from([
            "lab-timeline",
            "--config",
            "cfg.json",
            "--documents",
            "docs",
            "--raw-wearable",
            "raw.json",
            "--out",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        assert_eq!(cli.raw_wearable, Some(PathBuf::from("raw.json")));
        assert_eq!(cli.wearable, None);
    }

    #[test]
    fn wearable_sources_are_exclusive() {
        let result = Cli::try_parse_from([
            "lab-timeline",
            "--documents",
            "docs",
            "--wearable",
            "a.json",
            "--raw-wearable",
            "b.json",
            "--out",
            "out",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_documents_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("config.json");
        std::fs::write(&cfg, "{}").unwrap();
        let cli = Cli {
            config: Some(cfg),
            documents: dir.path().join("nope"),
            wearable: None,
            raw_wearable: None,
            out: dir.path().join("out"),
        };
        assert!(matches!(execute(&cli), Err(AppError::Documents { .. })));
    }

    #[test]
    fn invalid_config_fails_before_processing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("config.json");
        std::fs::write(&cfg, r#"{"start_date": "2026-03-01", "end_date": "2026-02-01"}"#).unwrap();
        let cli = Cli {
            config: Some(cfg),
            documents: dir.path().to_path_buf(),
            wearable: None,
            raw_wearable: None,
            out: dir.path().join("out"),
        };
        assert!(matches!(
            execute(&cli),
            Err(AppError::Config(ConfigError::InvalidWindow { .. }))
        ));
        assert!(!dir.path().join("out").exists());
    }
}
