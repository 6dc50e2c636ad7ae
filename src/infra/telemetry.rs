//! Log subscriber and metric descriptions for the edgepurge binary.
//!
//! Logs go to stderr so the JSON reports on stdout stay machine-readable.
//! Metrics are only described here; installing a recorder is left to the
//! host, and without one the trigger's counters are no-ops.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};
use crate::purge::{
    METRIC_DISPATCH_MS, METRIC_PURGE_TOTAL, METRIC_PURGE_URLS_TOTAL, METRIC_TRANSPORT_FAILURE_TOTAL,
};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global subscriber: env filter seeded from `logging.level`,
/// `ErrorLayer` for span traces, then compact or JSON output.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
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
            METRIC_PURGE_TOTAL,
            Unit::Count,
            "Total number of purge requests accepted by the transport."
        );
        describe_counter!(
            METRIC_PURGE_URLS_TOTAL,
            Unit::Count,
            "Total number of individual URLs submitted for purge."
        );
        describe_counter!(
            METRIC_TRANSPORT_FAILURE_TOTAL,
            Unit::Count,
            "Total number of purge submissions the transport rejected."
        );
        describe_histogram!(
            METRIC_DISPATCH_MS,
            Unit::Milliseconds,
            "Purge transport latency in milliseconds."
        );
    });
}
