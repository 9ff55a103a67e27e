use serde_json::Value;
use tracing::info;

use crate::client::Transport;
use crate::error::{ExportError, Result};

/// All matches of a CBF competition. The endpoint answers with a bare JSON array.
pub fn fetch_matches<T: Transport + ?Sized>(
    transport: &T,
    base_url: &str,
    competition_id: &str,
) -> Result<Vec<Value>> {
    let url = format!("{}/competitions/{}/matches", base_url, competition_id);
    let matches = match transport.get_json(&url, &[])? {
        Value::Array(matches) => matches,
        _ => {
            return Err(ExportError::UnexpectedShape(format!(
                "{} did not return a list of matches",
                url
            )))
        }
    };
    info!("Retrieved {} matches", matches.len());
    Ok(matches)
}

/// All fixtures of an API-Football league season.
///
/// The list sits under `response`; a body without it is an empty season.
pub fn fetch_fixtures<T: Transport + ?Sized>(
    transport: &T,
    fixtures_url: &str,
    league_id: u32,
    season: u16,
) -> Result<Vec<Value>> {
    let query = [("league", league_id.to_string()), ("season", season.to_string())];
    let body = transport.get_json(fixtures_url, &query)?;
    let fixtures = match body.get("response") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(fixtures)) => fixtures.clone(),
        Some(_) => {
            return Err(ExportError::UnexpectedShape(format!(
                "{} returned a non-list `response`",
                fixtures_url
            )))
        }
    };
    info!("Retrieved {} fixtures", fixtures.len());
    Ok(fixtures)
}
