//! Metrics collection and exposition.
//!
//! # Metrics
//! - `offline_proxy_requests_total` (counter): requests by handler, status
//! - `offline_proxy_request_duration_seconds` (histogram): latency by handler
//! - `offline_proxy_cache_lookups_total` (counter): lookups by cache, result
//! - `offline_proxy_cache_entries` (gauge): entries across all caches
//! - `offline_proxy_strategy_outcomes_total` (counter): by strategy, outcome
//! - `offline_proxy_catch_decisions_total` (counter): catch handler branch taken
//! - `offline_proxy_activations_total` (counter): deployments promoted to active

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route(handler: &str, status: u16, start: Instant) {
    let handler = handler.to_string();
    counter!(
        "offline_proxy_requests_total",
        "handler" => handler.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("offline_proxy_request_duration_seconds", "handler" => handler)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(cache: &str, hit: bool) {
    counter!(
        "offline_proxy_cache_lookups_total",
        "cache" => cache.to_string(),
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("offline_proxy_cache_entries").set(entries as f64);
}

pub fn record_strategy_outcome(strategy: &'static str, ok: bool) {
    counter!(
        "offline_proxy_strategy_outcomes_total",
        "strategy" => strategy,
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

pub fn record_catch_decision(decision: &'static str) {
    counter!("offline_proxy_catch_decisions_total", "decision" => decision).increment(1);
}

pub fn record_activation() {
    counter!("offline_proxy_activations_total").increment(1);
}
