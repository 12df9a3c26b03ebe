use std::sync::Arc;

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use tracing::info;

lazy_static! {
    static ref METRICS_INSTANCE: Arc<Metrics> = {
        info!("Initializing Metrics ...");
        Metrics::new()
    };
}

/// Process-wide metrics shared by every provider.
pub fn get_metrics() -> &'static Arc<Metrics> {
    &METRICS_INSTANCE
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Cache metrics
    pub cache_hits: IntCounter,
    pub cache_misses: IntCounter,

    // Issuer metrics
    pub issue_failures: IntCounter,
    pub issue_duration: Histogram,

    // Config
    pub config_errors: IntCounter,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("rdsiam".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            cache_hits: IntCounter::new("token_cache_hits_total", "Tokens served from cache").unwrap(),
            cache_misses: IntCounter::new("token_cache_misses_total", "Token requests that required issuing").unwrap(),

            issue_failures: IntCounter::new("token_issue_failures_total", "Token issuing failures").unwrap(),
            issue_duration: Histogram::with_opts(HistogramOpts::new("token_issue_duration_seconds", "Token issuing duration seconds").buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])).unwrap(),

            config_errors: IntCounter::new("config_validation_errors_total", "Errors while parsing or validating config").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.cache_misses.clone())).unwrap();
        reg.register(Box::new(metrics.issue_failures.clone())).unwrap();
        reg.register(Box::new(metrics.issue_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_errors.clone())).unwrap();

        metrics
    }

    /// Render all registered metrics in the Prometheus text format.
    ///
    /// Services embedding the provider serve this from their own metrics
    /// endpoint; the `rds-iam-token` binary prints it to stderr with
    /// `--print-metrics`.
    pub fn gather_text(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
