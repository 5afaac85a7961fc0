//! Tracing subscriber bootstrap.

use anyhow::anyhow;
use seedkit_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the log filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    env_filter_from(rust_log.as_deref(), settings)
}

fn env_filter_from(rust_log: Option<&str>, settings: &TelemetrySettings) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(&settings.level))
}

/// Install the global fmt subscriber in the configured format.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_writer(std::io::stderr);

    let result = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        target: "seedkit-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}
