//! Export a Brasileirão Série A season from a football data API to CSV.
//!
//! One run is a single linear pass: resolve the competition (CBF only), fetch its
//! matches, flatten each match into a fixed-column row and write the rows out.

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod resolve;
pub mod summary;
pub mod writer;

pub use config::{ExportConfig, FilenameStyle, Source};
pub use error::{ExportError, Result};
pub use export::{ExportObserver, ExportResult, Exporter, NullObserver, TracingObserver};
pub use extract::{FixtureRow, MatchRow, Row, Scalar};
pub use summary::ExportSummary;
