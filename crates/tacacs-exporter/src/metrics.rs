//! Prometheus gauges for a probe
//!
//! Each scrape builds its own gauges and text buffer from one
//! [`ProbeResult`]; nothing is kept between requests.

use crate::probe::ProbeResult;
use std::fmt::Write;

const NAMESPACE: &str = "tacacs";

/// Instantaneous metric value
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub name: &'static str,
    pub help: &'static str,
    pub value: f64,
}

impl Gauge {
    fn new(name: &'static str, help: &'static str) -> Self {
        Gauge {
            name,
            help,
            value: 0.0,
        }
    }

    pub fn set(&mut self, value: f64) {
        self.value = value;
    }
}

/// The three gauges exposed per probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeGauges {
    pub duration: Gauge,
    pub status_code: Gauge,
    pub success: Gauge,
}

impl ProbeGauges {
    pub fn new() -> Self {
        ProbeGauges {
            duration: Gauge::new(
                "scrape_duration_seconds",
                "TACACS response time in seconds.",
            ),
            status_code: Gauge::new(
                "status_code",
                "TACACS Authentication reply status code. Common values are Pass(1) and Fail(2).",
            ),
            success: Gauge::new("success", "1 if the TACACS probe was successful."),
        }
    }

    /// Fresh gauges set from one probe result
    ///
    /// The status code gauge keeps its zero default when the probe failed.
    pub fn from_probe(result: &ProbeResult) -> Self {
        let mut gauges = Self::new();
        gauges.duration.set(result.duration.as_secs_f64());
        if let Some(code) = result.status_code() {
            gauges.status_code.set(f64::from(code));
        }
        gauges.success.set(if result.success { 1.0 } else { 0.0 });
        gauges
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gauge> {
        [&self.duration, &self.status_code, &self.success].into_iter()
    }
}

impl Default for ProbeGauges {
    fn default() -> Self {
        Self::new()
    }
}

/// Prometheus metrics in text format
#[derive(Debug, Clone)]
pub struct PrometheusMetrics {
    /// Metrics content in Prometheus text format
    pub content: String,
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Render the gauges of one probe
    pub fn from_probe(result: &ProbeResult) -> Self {
        let mut metrics = Self::new();
        for gauge in ProbeGauges::from_probe(result).iter() {
            metrics.add_gauge(gauge);
        }
        metrics
    }

    /// Add a namespaced gauge
    pub fn add_gauge(&mut self, gauge: &Gauge) {
        let name = format!("{}_{}", NAMESPACE, gauge.name);
        self.add_metric(&name, gauge.value, gauge.help);
    }

    /// Add a metric line
    fn add_metric(&mut self, name: &str, value: impl std::fmt::Display, help: &str) {
        // Writing to a String cannot fail
        let _ = writeln!(self.content, "# HELP {} {}", name, help);
        let _ = writeln!(self.content, "# TYPE {} gauge", name);
        let _ = writeln!(self.content, "{} {}", name, value);
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}
