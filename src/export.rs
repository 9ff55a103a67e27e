use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use tracing::{error, info};

use crate::client::{Auth, HttpTransport, Transport};
use crate::config::{ExportConfig, Source};
use crate::error::{ExportError, Result};
use crate::extract::{extract_rows, FixtureRow, MatchRow, Row};
use crate::fetch::{fetch_fixtures, fetch_matches};
use crate::resolve::resolve_competition;
use crate::summary::{summarize, ExportSummary};
use crate::writer::{output_filename, write_csv};

/// Where an export run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingCompetition { year: u16 },
    FetchingMatches,
    ProcessingMatches,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ResolvingCompetition { year } => {
                write!(f, "Fetching competition ID for {}", year)
            }
            Stage::FetchingMatches => f.write_str("Fetching matches data"),
            Stage::ProcessingMatches => f.write_str("Processing matches data"),
        }
    }
}

/// Receives progress of an export run. Every method defaults to doing nothing.
pub trait ExportObserver {
    fn on_stage(&self, _stage: Stage) {}
    fn on_written(&self, _path: &Path, _rows: usize) {}
    fn on_summary(&self, _summary: &ExportSummary) {}
    fn on_failed(&self, _error: &ExportError) {}
}

pub struct NullObserver;

impl ExportObserver for NullObserver {}

/// Logs progress through `tracing`.
pub struct TracingObserver;

impl ExportObserver for TracingObserver {
    fn on_stage(&self, stage: Stage) {
        info!("{}", stage);
    }

    fn on_written(&self, path: &Path, rows: usize) {
        info!(rows, "Successfully exported matches to {}", path.display());
    }

    fn on_summary(&self, summary: &ExportSummary) {
        match serde_json::to_string(summary) {
            Ok(json) => info!(summary = %json, "Export Summary:"),
            Err(_) => info!("Export Summary:"),
        }
        for line in summary.to_string().lines() {
            info!("{}", line);
        }
    }

    fn on_failed(&self, err: &ExportError) {
        if err.is_network() {
            error!("API request failed: {}", err);
        } else {
            error!("Export failed: {}", err);
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub path: PathBuf,
    pub summary: ExportSummary,
}

/// Resolve, fetch, map and write one season, in that order.
pub struct Exporter<T> {
    config: ExportConfig,
    transport: T,
    observer: Box<dyn ExportObserver>,
}

impl Exporter<HttpTransport> {
    /// An exporter talking HTTP to the source named in `config`.
    pub fn from_config(config: ExportConfig) -> Result<Self> {
        let auth = match config.source {
            Source::Cbf => Auth::Bearer(config.api_key.clone()),
            Source::ApiFootball => Auth::Header {
                name: "x-apisports-key",
                key: config.api_key.clone(),
            },
        };
        let transport = HttpTransport::new(auth, Duration::from_secs(config.timeout_secs))?;
        Ok(Exporter::new(config, transport))
    }
}

impl<T: Transport> Exporter<T> {
    pub fn new(config: ExportConfig, transport: T) -> Self {
        Exporter {
            config,
            transport,
            observer: Box::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ExportObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports season `year` into the configured output directory.
    ///
    /// Nothing is written unless every match record maps cleanly.
    pub fn export_season(&self, year: u16) -> Result<ExportResult> {
        self.export_season_at(year, Local::now().naive_local())
    }

    /// As [`Exporter::export_season`], with `now` used for timestamped filenames.
    pub fn export_season_at(&self, year: u16, now: NaiveDateTime) -> Result<ExportResult> {
        let result = self.run(year, now);
        if let Err(err) = &result {
            self.observer.on_failed(err);
        }
        result
    }

    fn run(&self, year: u16, now: NaiveDateTime) -> Result<ExportResult> {
        match self.config.source {
            Source::Cbf => {
                self.observer.on_stage(Stage::ResolvingCompetition { year });
                let id = resolve_competition(&self.transport, &self.config.cbf_base_url, year)?;
                self.observer.on_stage(Stage::FetchingMatches);
                let matches = fetch_matches(&self.transport, &self.config.cbf_base_url, &id)?;
                self.write::<MatchRow>(year, now, &matches)
            }
            Source::ApiFootball => {
                self.observer.on_stage(Stage::FetchingMatches);
                let fixtures = fetch_fixtures(
                    &self.transport,
                    &self.config.fixtures_url,
                    self.config.league_id,
                    year,
                )?;
                self.write::<FixtureRow>(year, now, &fixtures)
            }
        }
    }

    fn write<R: Row>(&self, year: u16, now: NaiveDateTime, records: &[Value]) -> Result<ExportResult> {
        self.observer.on_stage(Stage::ProcessingMatches);
        let rows: Vec<R> = extract_rows(records)?;

        let filename = output_filename(self.config.filename, year, now);
        let path = write_csv(&rows, &self.config.output_dir.join(filename), self.config.bom)?;
        self.observer.on_written(&path, rows.len());

        let summary = summarize(&rows);
        self.observer.on_summary(&summary);
        Ok(ExportResult { path, summary })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::error::Error;
    use std::fs;
    use std::rc::Rc;

    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::client::CannedTransport;
    use crate::config::FilenameStyle;

    type TestResult = std::result::Result<(), Box<dyn Error>>;

    const BASE: &str = "http://cbf.test/v1";
    const FIXTURES: &str = "http://football.test/fixtures";

    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl ExportObserver for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.events.borrow_mut().push(stage.to_string());
        }
        fn on_written(&self, _path: &Path, rows: usize) {
            self.events.borrow_mut().push(format!("written {}", rows));
        }
        fn on_summary(&self, summary: &ExportSummary) {
            self.events.borrow_mut().push(format!("summary {}", summary.count));
        }
        fn on_failed(&self, error: &ExportError) {
            self.events.borrow_mut().push(format!("failed {}", error));
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn load(name: &str) -> std::result::Result<Value, Box<dyn Error>> {
        let top = env!("CARGO_MANIFEST_DIR");
        let text = fs::read_to_string(format!("{}/test-data/{}", top, name))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn cbf_config(dir: &Path) -> ExportConfig {
        let mut config = ExportConfig::for_source(Source::Cbf);
        config.cbf_base_url = BASE.to_string();
        config.output_dir = dir.join("exports");
        config
    }

    fn competitions() -> Value {
        json!([
            {"id": "c22", "name": "Campeonato Brasileiro Série A", "series": "A", "season": "2022"},
            {"id": "c23", "name": "Campeonato Brasileiro Série A", "series": "A", "season": "2023"}
        ])
    }

    #[test]
    fn test_cbf_export() -> TestResult {
        let dir = TempDir::new()?;
        let transport = CannedTransport::new()
            .with("http://cbf.test/v1/competitions", competitions())
            .with("http://cbf.test/v1/competitions/c23/matches", load("cbf_matches.json")?);
        let events = Rc::new(RefCell::new(Vec::new()));
        let exporter = Exporter::new(cbf_config(dir.path()), transport)
            .with_observer(Box::new(Recorder { events: events.clone() }));

        let result = exporter.export_season_at(2023, now())?;
        assert_eq!(
            result.path,
            dir.path().join("exports/brasileirao_2023_20240301_120000.csv")
        );
        assert_eq!(result.summary.count, 3);
        assert_eq!(result.summary.distinct_teams, 4);
        assert_eq!(result.summary.total_goals, 8.0);
        assert_eq!(result.summary.first_date.as_deref(), Some("2023-04-15"));
        assert_eq!(result.summary.last_date.as_deref(), Some("2023-04-22"));

        let contents = fs::read_to_string(&result.path)?;
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(MatchRow::HEADERS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("2023-04-15,1,Flamengo,Palmeiras,2,1,Maracanã,Rio de Janeiro,RJ,Wilton Pereira Sampaio,52311,3104550.5")
        );
        assert_eq!(lines.count(), 2);

        assert_eq!(
            *events.borrow(),
            vec![
                "Fetching competition ID for 2023",
                "Fetching matches data",
                "Processing matches data",
                "written 3",
                "summary 3",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_api_football_export() -> TestResult {
        let dir = TempDir::new()?;
        let transport = CannedTransport::new().with(
            FIXTURES,
            json!({"response": load("api_football_fixtures.json")?}),
        );
        let mut config = ExportConfig::for_source(Source::ApiFootball);
        config.fixtures_url = FIXTURES.to_string();
        config.output_dir = dir.path().to_path_buf();

        let exporter = Exporter::new(config, transport).with_observer(Box::new(NullObserver));
        let result = exporter.export_season_at(2023, now())?;
        assert_eq!(result.path, dir.path().join("jogos_brasileirao_2023.csv"));
        assert_eq!(result.summary.count, 3);
        assert_eq!(result.summary.total_goals, 5.0);
        assert_eq!(result.summary.mean_attendance, None);

        let bytes = fs::read(&result.path)?;
        assert!(bytes.starts_with("\u{feff}Data,Time Casa".as_bytes()));
        Ok(())
    }

    #[test]
    fn test_missing_competition_fetches_nothing() -> TestResult {
        let dir = TempDir::new()?;
        let transport = CannedTransport::new().with("http://cbf.test/v1/competitions", competitions());
        let exporter = Exporter::new(cbf_config(dir.path()), transport);
        let err = exporter.export_season_at(2019, now()).unwrap_err();
        assert!(matches!(err, ExportError::CompetitionNotFound { year: 2019 }));
        assert_eq!(exporter.transport.requests.borrow().len(), 1);
        assert!(!dir.path().join("exports").exists());
        Ok(())
    }

    #[test]
    fn test_http_404_writes_no_file() -> TestResult {
        let dir = TempDir::new()?;
        let transport = CannedTransport::new()
            .with("http://cbf.test/v1/competitions", competitions())
            .with_status("http://cbf.test/v1/competitions/c23/matches", 404);
        let events = Rc::new(RefCell::new(Vec::new()));
        let exporter = Exporter::new(cbf_config(dir.path()), transport)
            .with_observer(Box::new(Recorder { events: events.clone() }));

        let err = exporter.export_season_at(2023, now()).unwrap_err();
        assert!(err.is_network());
        assert!(!dir.path().join("exports").exists());
        assert!(events.borrow().last().unwrap().starts_with("failed request to"));
        Ok(())
    }

    #[test]
    fn test_unreachable_api_writes_no_file() -> TestResult {
        let dir = TempDir::new()?;
        let mut config = cbf_config(dir.path());
        config.cbf_base_url = "http://127.0.0.1:1/v1".to_string();
        config.api_key = "k".to_string();
        let exporter = Exporter::from_config(config)?.with_observer(Box::new(NullObserver));

        let err = exporter.export_season_at(2023, now()).unwrap_err();
        assert!(matches!(err, ExportError::Transport(_)));
        assert!(err.is_network());
        assert!(!dir.path().join("exports").exists());
        Ok(())
    }

    #[test]
    fn test_malformed_record_writes_no_file() -> TestResult {
        let dir = TempDir::new()?;
        let mut matches = load("cbf_matches.json")?;
        matches[2].as_object_mut().unwrap().remove("referee");
        let transport = CannedTransport::new()
            .with("http://cbf.test/v1/competitions", competitions())
            .with("http://cbf.test/v1/competitions/c23/matches", matches);
        let exporter = Exporter::new(cbf_config(dir.path()), transport);

        let err = exporter.export_season_at(2023, now()).unwrap_err();
        assert!(matches!(err, ExportError::MalformedRecord { index: 2, .. }));
        assert!(!dir.path().join("exports").exists());
        Ok(())
    }

    #[test]
    fn test_empty_season_writes_header() -> TestResult {
        let dir = TempDir::new()?;
        let transport = CannedTransport::new()
            .with("http://cbf.test/v1/competitions", competitions())
            .with("http://cbf.test/v1/competitions/c23/matches", json!([]));
        let mut config = cbf_config(dir.path());
        config.filename = FilenameStyle::Fixed;
        let exporter = Exporter::new(config, transport).with_observer(Box::new(NullObserver));

        let result = exporter.export_season_at(2023, now())?;
        assert_eq!(result.summary.count, 0);
        assert_eq!(
            fs::read_to_string(&result.path)?,
            format!("{}\n", MatchRow::HEADERS.join(","))
        );
        Ok(())
    }
}
