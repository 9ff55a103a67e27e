use anyhow::Context;
use brasileirao_export::{ExportConfig, Exporter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ExportConfig::from_env().context("Failed to load configuration")?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let year = config.year;
    let exporter = Exporter::from_config(config).context("Failed to create HTTP client")?;
    let result = exporter
        .export_season(year)
        .with_context(|| format!("Error during export of season {}", year))?;

    println!("\nExport completed successfully!");
    println!("File saved to: {}", result.path.display());
    Ok(())
}
