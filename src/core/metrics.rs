//! Metrics collection using Prometheus
//!
//! Tracks searches, source fetches, imported GOSTs and HTTP retries in a
//! registry owned by this module. Counters are no-ops until [`init_metrics`]
//! has run, so library code and tests never depend on initialization order.

use once_cell::sync::OnceCell;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

struct Metrics {
    registry: Registry,
    searches_total: IntCounterVec,
    source_fetch_total: IntCounterVec,
    gosts_imported_total: IntCounterVec,
    http_retries_total: IntCounter,
}

static METRICS: OnceCell<Metrics> = OnceCell::new();

impl Metrics {
    fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("gostbot".to_string()), None)?;

        let searches_total = IntCounterVec::new(
            Opts::new("searches_total", "Catalogue searches by origin and outcome"),
            &["origin", "outcome"],
        )?;
        let source_fetch_total = IntCounterVec::new(
            Opts::new("source_fetch_total", "Data source fetches by source and status"),
            &["source", "status"],
        )?;
        let gosts_imported_total = IntCounterVec::new(
            Opts::new("gosts_imported_total", "New GOSTs written to the catalogue by source"),
            &["source"],
        )?;
        let http_retries_total = IntCounter::new("http_retries_total", "HTTP requests retried after a transient error")?;

        registry.register(Box::new(searches_total.clone()))?;
        registry.register(Box::new(source_fetch_total.clone()))?;
        registry.register(Box::new(gosts_imported_total.clone()))?;
        registry.register(Box::new(http_retries_total.clone()))?;

        Ok(Self {
            registry,
            searches_total,
            source_fetch_total,
            gosts_imported_total,
            http_retries_total,
        })
    }
}

/// Initializes the metrics registry. Safe to call more than once.
pub fn init_metrics() -> prometheus::Result<()> {
    METRICS.get_or_try_init(Metrics::new).map(|_| ())
}

/// Records a search. `origin` is "bot" or "cli"; `found` is whether anything matched.
pub fn record_search(origin: &str, found: bool) {
    if let Some(m) = METRICS.get() {
        let outcome = if found { "found" } else { "empty" };
        m.searches_total.with_label_values(&[origin, outcome]).inc();
    }
}

/// Records a source fetch outcome ("ok" or an error kind).
pub fn record_source_fetch(source: &str, status: &str) {
    if let Some(m) = METRICS.get() {
        m.source_fetch_total.with_label_values(&[source, status]).inc();
    }
}

/// Records how many new GOSTs were stored from a source.
pub fn record_imported(source: &str, count: usize) {
    if let Some(m) = METRICS.get() {
        m.gosts_imported_total
            .with_label_values(&[source])
            .inc_by(u64::try_from(count).unwrap_or(u64::MAX));
    }
}

/// Records a retried HTTP request.
pub fn record_http_retry() {
    if let Some(m) = METRICS.get() {
        m.http_retries_total.inc();
    }
}

/// Renders all metrics in Prometheus text exposition format.
pub fn gather() -> prometheus::Result<String> {
    let Some(m) = METRICS.get() else {
        return Ok(String::new());
    };

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&m.registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_exposition() {
        init_metrics().unwrap();
        init_metrics().unwrap();

        record_search("cli", true);
        record_source_fetch("gost.ru", "ok");
        record_imported("gost.ru", 3);
        record_http_retry();

        let text = gather().unwrap();
        assert!(text.contains("gostbot_searches_total"));
        assert!(text.contains("gostbot_source_fetch_total"));
        assert!(text.contains("gostbot_gosts_imported_total"));
        assert!(text.contains("gostbot_http_retries_total"));
    }
}
