use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "quire_cache_hit_total",
            Unit::Count,
            "Total number of bounded cache hits."
        );
        describe_counter!(
            "quire_cache_miss_total",
            Unit::Count,
            "Total number of bounded cache misses."
        );
        describe_counter!(
            "quire_cache_evict_total",
            Unit::Count,
            "Total number of bounded cache evictions due to capacity."
        );
        describe_counter!(
            "quire_log_task_submitted_total",
            Unit::Count,
            "Total number of log export tasks accepted for processing."
        );
        describe_counter!(
            "quire_log_task_rejected_total",
            Unit::Count,
            "Total number of log export submissions refused by the worker pool."
        );
        describe_counter!(
            "quire_log_task_completed_total",
            Unit::Count,
            "Total number of log export tasks that produced an artifact."
        );
        describe_counter!(
            "quire_log_task_failed_total",
            Unit::Count,
            "Total number of log export tasks recorded as failed."
        );
        describe_histogram!(
            "quire_log_task_duration_ms",
            Unit::Milliseconds,
            "Log export latency from claim to completion in milliseconds."
        );
    });
}
