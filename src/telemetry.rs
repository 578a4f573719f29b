use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;
use crate::lifecycle::Period;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level when set. Logs go to stderr so
/// command output on stdout stays clean.
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&observability.log_level)?,
    };

    if observability.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init()?;
    }

    tracing::debug!("Ledger portal telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the month a lifecycle operation works on
pub fn create_month_span(
    operation: &str,
    period: Option<Period>,
    slot: Option<&str>,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "month_lifecycle",
        operation = operation,
        period.year = period.map(|p| p.year()),
        period.month = period.map(|p| p.month()),
        slot = slot,
        correlation.id = correlation_id,
    )
}
