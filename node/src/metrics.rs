//! # Prometheus Metrics
//!
//! Flow outcome counters for the node. All metrics are registered in a
//! dedicated [`prometheus::Registry`] under the `tally` prefix so they do not
//! collide with any default global registry consumers.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use tally_protocol::flow::FlowError;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Flows started by this node as initiator.
    pub flows_started_total: IntCounter,
    /// Flows that reached finality.
    pub flows_finalised_total: IntCounter,
    /// Flows that aborted for any reason.
    pub flows_aborted_total: IntCounter,
    /// Aborts caused by the notary refusing a double spend.
    pub notary_conflicts_total: IntCounter,
    /// Wall-clock time from flow start to finality or abort.
    pub flow_duration_seconds: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("metric creation");
    registry
        .register(Box::new(counter.clone()))
        .expect("metric registration");
    counter
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("tally".into()), None)
            .expect("failed to create prometheus registry");

        let flows_started_total = counter(
            &registry,
            "flows_started_total",
            "Total number of signing flows started as initiator",
        );
        let flows_finalised_total = counter(
            &registry,
            "flows_finalised_total",
            "Total number of signing flows that reached finality",
        );
        let flows_aborted_total = counter(
            &registry,
            "flows_aborted_total",
            "Total number of signing flows that aborted",
        );
        let notary_conflicts_total = counter(
            &registry,
            "notary_conflicts_total",
            "Total number of flows rejected by the notary as double spends",
        );

        let flow_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "flow_duration_seconds",
                "Signing flow duration from start to finality or abort, in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(flow_duration_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            flows_started_total,
            flows_finalised_total,
            flows_aborted_total,
            notary_conflicts_total,
            flow_duration_seconds,
        }
    }

    /// Counts one finished flow.
    pub fn record_outcome<T>(&self, outcome: &Result<T, FlowError>, elapsed_secs: f64) {
        self.flow_duration_seconds.observe(elapsed_secs);
        match outcome {
            Ok(_) => self.flows_finalised_total.inc(),
            Err(error) => {
                self.flows_aborted_total.inc();
                if matches!(error, FlowError::NotaryConflict { .. }) {
                    self.notary_conflicts_total.inc();
                }
            }
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_are_counted() {
        let metrics = NodeMetrics::new();
        metrics.flows_started_total.inc_by(3);
        metrics.record_outcome(&Ok::<(), FlowError>(()), 0.01);
        metrics.record_outcome::<()>(
            &Err(FlowError::NotaryConflict { conflicts: vec![] }),
            0.02,
        );
        metrics.record_outcome::<()>(&Err(FlowError::SessionFailure("timeout".into())), 30.0);

        assert_eq!(metrics.flows_finalised_total.get(), 1);
        assert_eq!(metrics.flows_aborted_total.get(), 2);
        assert_eq!(metrics.notary_conflicts_total.get(), 1);
        assert_eq!(metrics.flow_duration_seconds.get_sample_count(), 3);
    }

    #[test]
    fn test_encode_uses_prefix() {
        let metrics = NodeMetrics::new();
        metrics.flows_started_total.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("tally_flows_started_total 1"));
        assert!(text.contains("tally_notary_conflicts_total 0"));
    }
}
