use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::debug;

use crate::error::{ExportError, Result};

/// How requests authenticate against the upstream API.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// A custom header carrying the key, e.g. `x-apisports-key`.
    Header { name: &'static str, key: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Auth::Header { name, .. } => write!(f, "Header({}: <redacted>)", name),
        }
    }
}

/// One blocking GET returning decoded JSON.
///
/// Resolver and fetchers only talk to the API through this, so they can be driven
/// by canned responses.
pub trait Transport {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value>;
}

pub struct HttpTransport {
    client: Client,
    auth: Auth,
}

impl HttpTransport {
    pub fn new(auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("brasileirao-export/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(HttpTransport { client, auth })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!(url, ?query, "GET");
        let request = self.client.get(url).query(query).header(ACCEPT, "application/json");
        let request = match &self.auth {
            Auth::Bearer(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            Auth::Header { name, key } => request.header(*name, key.as_str()),
        };

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.json()?)
    }
}

/// Serves fixed bodies per URL and records every request it sees.
#[cfg(test)]
pub(crate) struct CannedTransport {
    responses: std::collections::HashMap<String, std::result::Result<Value, u16>>,
    pub(crate) requests: std::cell::RefCell<Vec<(String, Vec<(String, String)>)>>,
}

#[cfg(test)]
impl CannedTransport {
    pub(crate) fn new() -> Self {
        CannedTransport {
            responses: Default::default(),
            requests: Default::default(),
        }
    }

    pub(crate) fn with(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), Ok(body));
        self
    }

    pub(crate) fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_string(), Err(status));
        self
    }
}

#[cfg(test)]
impl Transport for CannedTransport {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        self.requests.borrow_mut().push((
            url.to_string(),
            query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));
        let status = match self.responses.get(url) {
            Some(Ok(body)) => return Ok(body.clone()),
            Some(Err(status)) => *status,
            None => 404,
        };
        Err(ExportError::Status {
            url: url.to_string(),
            status: reqwest::StatusCode::from_u16(status).unwrap_or(reqwest::StatusCode::NOT_FOUND),
        })
    }
}
