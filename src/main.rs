use anyhow::{Context, Result};
use slug_shortener::config;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: `RUST_LOG` filter, text or JSON output.
fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to build log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env().context("Invalid configuration")?;

    init_tracing(&config.log_level, &config.log_format)?;
    config.print_summary();

    slug_shortener::server::run(config).await
}
