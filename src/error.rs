use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

/// Everything that can stop an export run.
///
/// None of these are retried: the pipeline logs the error and gives up without
/// writing an output file.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The API answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no Série A competition found for season {year}")]
    CompetitionNotFound { year: u16 },

    /// A match record lacks a field, or holds a non-scalar where a scalar belongs.
    #[error("malformed match record #{index}: field `{field}` is missing or not a scalar")]
    MalformedRecord { index: usize, field: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error for {key}: {message}")]
    Config { key: String, message: String },
}

impl ExportError {
    pub(crate) fn malformed(index: usize, field: impl Into<String>) -> Self {
        ExportError::MalformedRecord {
            index,
            field: field.into(),
        }
    }

    pub(crate) fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        ExportError::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True for failures talking to the API, as opposed to bad data or local I/O.
    pub fn is_network(&self) -> bool {
        matches!(self, ExportError::Status { .. } | ExportError::Transport(_))
    }
}
