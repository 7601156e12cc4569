use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::posts::METRIC_STORE_LIST_MS;
use crate::cache::{
    METRIC_CACHE_BACKEND_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE,
    METRIC_CACHE_INVALIDATE_FAILED, METRIC_CACHE_MISS, METRIC_CACHE_POPULATE_SKIPPED,
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
            METRIC_CACHE_HIT,
            Unit::Count,
            "Post listing reads served from the cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Post listing reads that found no cached value."
        );
        describe_counter!(
            METRIC_CACHE_BACKEND_ERROR,
            Unit::Count,
            "Cache backend calls that failed or timed out."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATE,
            Unit::Count,
            "Invalidations of the cached post listing."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATE_FAILED,
            Unit::Count,
            "Invalidations whose backend delete failed."
        );
        describe_counter!(
            METRIC_CACHE_POPULATE_SKIPPED,
            Unit::Count,
            "Populates skipped because an invalidation ran after the miss."
        );
        describe_histogram!(
            METRIC_STORE_LIST_MS,
            Unit::Milliseconds,
            "Latency of the store query behind a cache miss."
        );
    });
}
