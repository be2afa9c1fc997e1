//! Metrics collection for observability
//!
//! Collectors live in a private [`Registry`], so several ledgers can share a
//! process (tests do). [`Metrics::encode_text`] renders the registry in the
//! Prometheus text format; the wallet server logs it on shutdown and an
//! embedder can serve it from its own endpoint.
//!
//! # Metrics
//!
//! - `wallet_transactions_total{type}` - committed transactions by type
//! - `wallet_rejections_total{kind}` - failed operations by error kind
//! - `wallet_operation_duration_seconds{operation}` - operation latency
//! - `wallet_settlements_total{result}` - settled games by result

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed transactions by type
    pub transactions_total: IntCounterVec,

    /// Rejected operations by error kind
    pub rejections_total: IntCounterVec,

    /// Operation latency
    pub operation_duration: HistogramVec,

    /// Settled games by result
    pub settlements_total: IntCounterVec,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounterVec::new(
            Opts::new("wallet_transactions_total", "Committed transactions by type"),
            &["type"],
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("wallet_rejections_total", "Failed operations by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "wallet_operation_duration_seconds",
                "Histogram of operation latencies",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let settlements_total = IntCounterVec::new(
            Opts::new("wallet_settlements_total", "Settled games by result"),
            &["result"],
        )?;
        registry.register(Box::new(settlements_total.clone()))?;

        Ok(Self {
            transactions_total,
            rejections_total,
            operation_duration,
            settlements_total,
            registry,
        })
    }

    /// Record a committed transaction
    pub fn record_transaction(&self, transaction_type: &str) {
        self.transactions_total
            .with_label_values(&[transaction_type])
            .inc();
    }

    /// Record a failed operation
    pub fn record_rejection(&self, kind: &str) {
        self.rejections_total.with_label_values(&[kind]).inc();
    }

    /// Record operation duration
    pub fn record_duration(&self, operation: &str, duration_seconds: f64) {
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Record a settled game
    pub fn record_settlement(&self, result: &str) {
        self.settlements_total.with_label_values(&[result]).inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every collector in the Prometheus text exposition format
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation_is_repeatable() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        assert_eq!(first.transactions_total.with_label_values(&["sent"]).get(), 0);
        assert_eq!(second.rejections_total.with_label_values(&["not_found"]).get(), 0);
    }

    #[test]
    fn test_record_transaction() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transaction("sent");
        metrics.record_transaction("sent");
        metrics.record_transaction("win");

        assert_eq!(metrics.transactions_total.with_label_values(&["sent"]).get(), 2);
        assert_eq!(metrics.transactions_total.with_label_values(&["win"]).get(), 1);
    }

    #[test]
    fn test_record_rejection_and_settlement() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejection("insufficient_balance");
        metrics.record_settlement("loss");
        metrics.record_duration("transfer", 0.002);

        assert_eq!(
            metrics
                .rejections_total
                .with_label_values(&["insufficient_balance"])
                .get(),
            1
        );
        assert_eq!(metrics.settlements_total.with_label_values(&["loss"]).get(), 1);
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_encode_text() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transaction("game_entry");
        metrics.record_settlement("win");

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("wallet_transactions_total{type=\"game_entry\"} 1"));
        assert!(text.contains("wallet_settlements_total{result=\"win\"} 1"));
    }
}
