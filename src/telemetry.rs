use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// RUST_LOG wins over the configured level. Logs go to stderr so command
/// output on stdout stays machine readable.
pub fn init_telemetry(settings: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    tracing::debug!("Deposit workflow telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the steps of one operation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one workflow operation
pub fn create_workflow_span(
    operation: &str,
    draft_id: Option<&str>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "deposit_workflow",
        operation = operation,
        draft.id = draft_id,
        correlation.id = correlation_id,
    )
}
