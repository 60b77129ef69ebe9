//! Prometheus text exposition for service metrics
//!
//! Rendered on demand by the HTTP API at `/metrics` from the cumulative
//! `Metrics::snapshot`, so scrapes and the periodic log reporter never
//! drain each other's counters.

use crate::infra::metrics::{Metrics, MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS};
use std::fmt::Write;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

fn write_metric(output: &mut String, name: &str, help: &str, typ: MetricType, val: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name} {val}");
}

fn write_gauge_f64(output: &mut String, name: &str, help: &str, val: f64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} gauge");
    let _ = writeln!(output, "{name} {val:.2}");
}

/// Write a histogram with cumulative buckets, sum and count
fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    sum: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in METRICS_BUCKET_BOUNDS.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{le=\"+Inf\"}} {cumulative}");

    let count: u64 = buckets.iter().sum();
    let _ = writeln!(output, "{name}_sum {sum}");
    let _ = writeln!(output, "{name}_count {count}");
}

/// Format metrics in Prometheus text exposition format
pub fn format_prometheus_metrics(metrics: &Metrics, registered_users: usize) -> String {
    let summary = metrics.snapshot(registered_users);
    let mut output = String::with_capacity(4096);

    write_tracking_metrics(&mut output, &summary);
    write_reward_metrics(&mut output, &summary);
    write_pass_metrics(&mut output, &summary);

    output
}

fn write_tracking_metrics(output: &mut String, summary: &MetricsSummary) {
    write_metric(
        output,
        "tour_guide_registered_users",
        "Users currently registered",
        MetricType::Gauge,
        summary.registered_users as u64,
    );
    write_metric(
        output,
        "tour_guide_locations_tracked_total",
        "Location fixes appended to user histories",
        MetricType::Counter,
        summary.locations_tracked_total,
    );
    write_metric(
        output,
        "tour_guide_location_failures_total",
        "Location fixes that failed or timed out",
        MetricType::Counter,
        summary.location_failures_total,
    );
    write_gauge_f64(
        output,
        "tour_guide_locations_per_sec",
        "Average location fixes per second since start",
        summary.locations_per_sec,
    );
}

fn write_reward_metrics(output: &mut String, summary: &MetricsSummary) {
    write_metric(
        output,
        "tour_guide_rewards_awarded_total",
        "Rewards granted to users",
        MetricType::Counter,
        summary.rewards_awarded_total,
    );
    write_metric(
        output,
        "tour_guide_oracle_failures_total",
        "Reward point lookups that failed or timed out",
        MetricType::Counter,
        summary.oracle_failures_total,
    );
}

fn write_pass_metrics(output: &mut String, summary: &MetricsSummary) {
    write_metric(
        output,
        "tour_guide_tracking_passes_total",
        "Completed tracking passes",
        MetricType::Counter,
        summary.tracking_passes_total,
    );
    write_metric(
        output,
        "tour_guide_last_pass_users",
        "Users covered by the most recent tracking pass",
        MetricType::Gauge,
        summary.last_pass_users,
    );
    write_histogram(
        output,
        "tour_guide_tracking_pass_ms",
        "Tracking pass duration in milliseconds",
        &summary.pass_buckets,
        summary.pass_sum_ms,
    );
    write_metric(
        output,
        "tour_guide_tracking_pass_p99_ms",
        "99th percentile tracking pass duration",
        MetricType::Gauge,
        summary.pass_p99_ms,
    );
    write_metric(
        output,
        "tour_guide_tracking_pass_max_ms",
        "Longest tracking pass since start",
        MetricType::Gauge,
        summary.pass_max_ms,
    );
}
