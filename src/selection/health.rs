//! Rolling-history aggregation and health classification
//!
//! Health is a point-in-time classification recomputed on demand from the
//! bounded observation window; no transition history is persisted.

use crate::models::{
    HealthStatus, PerformanceMetrics, PerformanceObservation, PerformanceThresholds,
};

/// Arithmetic means over the full window. Callers guarantee `history` is
/// non-empty.
pub(crate) fn aggregate(history: &[PerformanceObservation]) -> PerformanceMetrics {
    let n = history.len() as f64;
    let mut agg = PerformanceMetrics {
        accuracy: 0.0,
        latency_ms: 0.0,
        throughput: 0.0,
        cost_per_request: 0.0,
        error_rate: 0.0,
        custom_metrics: Default::default(),
    };

    for obs in history {
        agg.accuracy += obs.metrics.accuracy;
        agg.latency_ms += obs.metrics.latency_ms;
        agg.throughput += obs.metrics.throughput;
        agg.cost_per_request += obs.metrics.cost_per_request;
        agg.error_rate += obs.metrics.error_rate;
    }

    agg.accuracy /= n;
    agg.latency_ms /= n;
    agg.throughput /= n;
    agg.cost_per_request /= n;
    agg.error_rate /= n;
    agg
}

/// Classification priority: error-rate breach dominates, then
/// accuracy/latency degradation, then healthy.
pub(crate) fn classify(
    aggregate: &PerformanceMetrics,
    thresholds: &PerformanceThresholds,
) -> (HealthStatus, Vec<String>) {
    let mut issues = Vec::new();

    let error_breach = aggregate.error_rate > 2.0 * thresholds.error_rate;
    if error_breach {
        issues.push(format!(
            "error rate {:.3} exceeds 2x threshold {:.3}",
            aggregate.error_rate, thresholds.error_rate
        ));
    }
    if aggregate.accuracy < thresholds.accuracy {
        issues.push(format!(
            "accuracy {:.3} below threshold {:.3}",
            aggregate.accuracy, thresholds.accuracy
        ));
    }
    if aggregate.latency_ms > thresholds.latency_ms {
        issues.push(format!(
            "latency {:.0}ms above threshold {:.0}ms",
            aggregate.latency_ms, thresholds.latency_ms
        ));
    }

    let status = if error_breach {
        HealthStatus::Unhealthy
    } else if issues.is_empty() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    (status, issues)
}
