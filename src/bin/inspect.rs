use std::path::PathBuf;

use anyhow::{bail, Context};
use brasileirao_export::summary::summarize;
use brasileirao_export::writer::{read_headers, read_rows};
use brasileirao_export::{FixtureRow, MatchRow, Row};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => bail!("usage: inspect <export.csv>"),
    };
    println!("Parsing {}", path.display());

    let headers = read_headers(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let summary = if headers.iter().eq(MatchRow::HEADERS) {
        summarize(&read_rows::<MatchRow>(&path)?)
    } else if headers.iter().eq(FixtureRow::HEADERS) {
        summarize(&read_rows::<FixtureRow>(&path)?)
    } else {
        bail!("{} is not a Brasileirão export (headers {:?})", path.display(), headers);
    };

    println!("{}", summary);
    Ok(())
}
