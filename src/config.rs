use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ExportError, Result};

pub const DEFAULT_CBF_BASE_URL: &str = "https://api.cbf.com.br/v1";
pub const DEFAULT_FIXTURES_URL: &str = "https://v3.football.api-sports.io/fixtures";
/// API-Football's id for the Brasileirão Série A.
pub const DEFAULT_LEAGUE_ID: u32 = 71;
pub const DEFAULT_YEAR: u16 = 2023;

/// Which upstream API an export talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// CBF API: competition lookup by season, bearer token auth.
    Cbf,
    /// API-Football: fixed league id, `x-apisports-key` header.
    ApiFootball,
}

impl Source {
    pub fn api_key_env(self) -> &'static str {
        match self {
            Source::Cbf => "CBF_API_KEY",
            Source::ApiFootball => "API_FOOTBALL_KEY",
        }
    }
}

impl FromStr for Source {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cbf" => Ok(Source::Cbf),
            "api-football" | "apifootball" | "api_football" => Ok(Source::ApiFootball),
            other => Err(ExportError::config(
                "BRASILEIRAO_SOURCE",
                format!("unknown source `{}` (expected `cbf` or `api-football`)", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameStyle {
    /// `jogos_brasileirao_{year}.csv`, overwritten on every run.
    Fixed,
    /// `brasileirao_{year}_{YYYYMMDD_HHMMSS}.csv`
    Timestamped,
}

impl FromStr for FilenameStyle {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(FilenameStyle::Fixed),
            "timestamped" => Ok(FilenameStyle::Timestamped),
            other => Err(ExportError::config(
                "BRASILEIRAO_FILENAME",
                format!("unknown filename style `{}`", other),
            )),
        }
    }
}

/// Settings for one export run.
#[derive(Clone)]
pub struct ExportConfig {
    pub source: Source,

    /// Season year, e.g. 2023.
    pub year: u16,

    /// Directory the CSV is written into. Created if missing.
    pub output_dir: PathBuf,

    pub api_key: String,

    pub cbf_base_url: String,

    pub fixtures_url: String,

    pub league_id: u32,

    /// Prefix the file with a UTF-8 byte-order mark so spreadsheets pick the encoding.
    pub bom: bool,

    pub filename: FilenameStyle,

    pub timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::for_source(Source::Cbf)
    }
}

impl ExportConfig {
    /// Defaults matching how each source has always been exported.
    pub fn for_source(source: Source) -> Self {
        let (output_dir, bom, filename) = match source {
            Source::Cbf => ("exports", false, FilenameStyle::Timestamped),
            Source::ApiFootball => (".", true, FilenameStyle::Fixed),
        };
        Self {
            source,
            year: DEFAULT_YEAR,
            output_dir: PathBuf::from(output_dir),
            api_key: String::new(),
            cbf_base_url: DEFAULT_CBF_BASE_URL.to_string(),
            fixtures_url: DEFAULT_FIXTURES_URL.to_string(),
            league_id: DEFAULT_LEAGUE_ID,
            bom,
            filename,
            timeout_secs: 30,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = match get("BRASILEIRAO_SOURCE") {
            Some(s) => s.parse()?,
            None => Source::Cbf,
        };
        let mut config = Self::for_source(source);

        if let Some(year) = get("BRASILEIRAO_YEAR") {
            config.year = parse_var("BRASILEIRAO_YEAR", &year)?;
        }
        if let Some(dir) = get("BRASILEIRAO_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(url) = get("CBF_BASE_URL") {
            config.cbf_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get("API_FOOTBALL_URL") {
            config.fixtures_url = url;
        }
        if let Some(league) = get("API_FOOTBALL_LEAGUE") {
            config.league_id = parse_var("API_FOOTBALL_LEAGUE", &league)?;
        }
        if let Some(bom) = get("BRASILEIRAO_BOM") {
            config.bom = parse_var("BRASILEIRAO_BOM", &bom)?;
        }
        if let Some(style) = get("BRASILEIRAO_FILENAME") {
            config.filename = style.parse()?;
        }
        if let Some(secs) = get("BRASILEIRAO_TIMEOUT_SECS") {
            config.timeout_secs = parse_var("BRASILEIRAO_TIMEOUT_SECS", &secs)?;
        }

        let key_env = source.api_key_env();
        config.api_key = get(key_env)
            .ok_or_else(|| ExportError::config(key_env, "API key not found in environment"))?;

        Ok(config)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ExportError::config(key, format!("invalid value `{}`: {}", value, e)))
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("source", &self.source)
            .field("year", &self.year)
            .field("output_dir", &self.output_dir)
            .field("api_key", &"<redacted>")
            .field("cbf_base_url", &self.cbf_base_url)
            .field("fixtures_url", &self.fixtures_url)
            .field("league_id", &self.league_id)
            .field("bom", &self.bom)
            .field("filename", &self.filename)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
