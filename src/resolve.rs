use serde_json::Value;
use tracing::debug;

use crate::client::Transport;
use crate::error::{ExportError, Result};

/// Substring that marks the national league among CBF competitions.
const COMPETITION_KEYWORD: &str = "brasileiro";
const SERIES: &str = "A";

fn text<'a>(competition: &'a Value, key: &str) -> Option<&'a str> {
    competition.get(key).and_then(Value::as_str)
}

/// Entries of any other shape simply do not match.
fn is_serie_a(competition: &Value, season: &str) -> bool {
    text(competition, "name").map_or(false, |n| n.to_lowercase().contains(COMPETITION_KEYWORD))
        && text(competition, "series") == Some(SERIES)
        && text(competition, "season") == Some(season)
}

/// Ids come back as strings or numbers depending on the endpoint version.
fn id_string(competition: &Value) -> Result<String> {
    match competition.get("id") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        other => Err(ExportError::UnexpectedShape(format!(
            "matching competition has id {:?}",
            other
        ))),
    }
}

/// Look up the CBF competition id of the Série A season `year`.
///
/// Competitions are scanned in listing order and the first one matching keyword,
/// series and season wins; entries after it are never looked at.
pub fn resolve_competition<T: Transport + ?Sized>(
    transport: &T,
    base_url: &str,
    year: u16,
) -> Result<String> {
    let url = format!("{}/competitions", base_url);
    let competitions = match transport.get_json(&url, &[])? {
        Value::Array(competitions) => competitions,
        _ => {
            return Err(ExportError::UnexpectedShape(format!(
                "{} did not return a list of competitions",
                url
            )))
        }
    };
    debug!(count = competitions.len(), year, "scanning competitions");

    let season = year.to_string();
    let found = competitions
        .iter()
        .find(|c| is_serie_a(c, &season))
        .ok_or(ExportError::CompetitionNotFound { year })?;
    id_string(found)
}
