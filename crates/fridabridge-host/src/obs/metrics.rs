//! Minimal metrics registry for the bridge.
//!
//! Counters with a single dynamic label backed by `DashMap`, rendered in the
//! Prometheus text format. Label values are sorted on render for stable output.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Counter family keyed by one label.
pub struct CounterVec {
    label: &'static str,
    map: DashMap<String, AtomicU64>,
}

impl CounterVec {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            map: DashMap::new(),
        }
    }

    pub fn inc(&self, value: &str) {
        self.add(value, 1);
    }

    pub fn add(&self, value: &str, n: u64) {
        if n == 0 {
            return;
        }
        if let Some(c) = self.map.get(value) {
            c.fetch_add(n, Ordering::Relaxed);
            return;
        }
        self.map
            .entry(value.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self, value: &str) -> u64 {
        self.map
            .get(value)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.map.iter().map(|c| c.value().load(Ordering::Relaxed)).sum()
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (v, n) in rows {
            let _ = writeln!(out, "{}{{{}=\"{}\"}} {}", name, self.label, escape_label(&v), n);
        }
    }
}

pub struct BridgeMetrics {
    /// Raw events taken off the ingestion queue, by signal.
    pub events_ingested: CounterVec,
    /// Events dropped anywhere on the ingestion path, by reason.
    pub events_dropped: CounterVec,
    /// Records handed to a sink or waiter, by signal (`rpc` for replies).
    pub deliveries: CounterVec,
    /// Finished RPC calls, by outcome.
    pub rpc_calls: CounterVec,
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self {
            events_ingested: CounterVec::new("signal"),
            events_dropped: CounterVec::new("reason"),
            deliveries: CounterVec::new("signal"),
            rpc_calls: CounterVec::new("outcome"),
        }
    }
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render all counters plus gauges supplied by the caller.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.events_ingested.render("fridabridge_events_ingested_total", &mut out);
        self.events_dropped.render("fridabridge_events_dropped_total", &mut out);
        self.deliveries.render("fridabridge_deliveries_total", &mut out);
        self.rpc_calls.render("fridabridge_rpc_calls_total", &mut out);
        for (k, v) in extra {
            let _ = writeln!(out, "{} {}", k, v);
        }
        out
    }
}
