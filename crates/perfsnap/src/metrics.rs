//! Decode metrics using metrics-rs.
//!
//! The library only emits through the `metrics` facade. The CLI can install
//! [`CliRecorder`] to collect them in memory and print a summary on exit.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use parking_lot::RwLock;

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!(
        "perfsnap_decodes_total",
        Unit::Count,
        "Category decodes, labelled by outcome"
    );
    describe_counter!(
        "perfsnap_parent_fetches_total",
        Unit::Count,
        "Snapshots fetched to resolve parent instance names"
    );
    describe_counter!(
        "perfsnap_duplicate_counters_total",
        Unit::Count,
        "Adjacent duplicate counter definitions dropped"
    );
    describe_gauge!(
        "perfsnap_catalog_categories",
        Unit::Count,
        "Categories in the most recently read catalog"
    );
    describe_histogram!(
        "perfsnap_snapshot_bytes",
        Unit::Bytes,
        "Size of decoded snapshots"
    );
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn record_decode(bytes: usize, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("perfsnap_decodes_total", "outcome" => outcome).increment(1);
    histogram!("perfsnap_snapshot_bytes").record(bytes as f64);
}

pub(crate) fn record_parent_fetch() {
    counter!("perfsnap_parent_fetches_total").increment(1);
}

pub(crate) fn record_duplicate_counter() {
    counter!("perfsnap_duplicate_counters_total").increment(1);
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn record_catalog(categories: usize) {
    gauge!("perfsnap_catalog_categories").set(categories as f64);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

#[derive(Default)]
struct Storage {
    counters: RwLock<HashMap<String, u64>>,
    gauges: RwLock<HashMap<String, f64>>,
    histograms: RwLock<HashMap<String, Vec<f64>>>,
}

/// Handle shared by every metric registered under one key.
struct Slot {
    key: String,
    storage: Arc<Storage>,
}

impl metrics::CounterFn for Slot {
    fn increment(&self, value: u64) {
        *self
            .storage
            .counters
            .write()
            .entry(self.key.clone())
            .or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.storage.counters.write().insert(self.key.clone(), value);
    }
}

impl metrics::GaugeFn for Slot {
    fn increment(&self, value: f64) {
        *self
            .storage
            .gauges
            .write()
            .entry(self.key.clone())
            .or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        metrics::GaugeFn::increment(self, -value);
    }

    fn set(&self, value: f64) {
        self.storage.gauges.write().insert(self.key.clone(), value);
    }
}

impl metrics::HistogramFn for Slot {
    fn record(&self, value: f64) {
        self.storage
            .histograms
            .write()
            .entry(self.key.clone())
            .or_default()
            .push(value);
    }
}

/// Recorder that keeps metrics in memory for a terminal summary.
#[derive(Default)]
pub struct CliRecorder {
    storage: Arc<Storage>,
}

impl CliRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the global recorder. `None` if one is already installed.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let storage = Arc::clone(&self.storage);
        metrics::set_global_recorder(self).ok()?;
        Some(CliRecorderHandle { storage })
    }

    fn slot(&self, key: &Key) -> Arc<Slot> {
        Arc::new(Slot {
            key: key_to_string(key),
            storage: Arc::clone(&self.storage),
        })
    }
}

fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(self.slot(key))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(self.slot(key))
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(self.slot(key))
    }
}

/// Access to the metrics collected by an installed [`CliRecorder`].
pub struct CliRecorderHandle {
    storage: Arc<Storage>,
}

impl CliRecorderHandle {
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.storage.counters.read().get(key).copied()
    }

    pub fn get_gauge(&self, key: &str) -> Option<f64> {
        self.storage.gauges.read().get(key).copied()
    }

    pub fn get_histogram(&self, key: &str) -> Option<Vec<f64>> {
        self.storage.histograms.read().get(key).cloned()
    }

    /// Print all collected metrics.
    pub fn print_summary(&self) {
        let counters = self.storage.counters.read();
        let gauges = self.storage.gauges.read();
        let histograms = self.storage.histograms.read();

        if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
            println!("No metrics collected.");
            return;
        }

        println!();
        println!("## Metrics Summary");
        println!();

        if !counters.is_empty() {
            println!("### Counters");
            let mut entries: Vec<_> = counters.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in entries {
                println!("  {key}: {value}");
            }
            println!();
        }

        if !gauges.is_empty() {
            println!("### Gauges");
            let mut entries: Vec<_> = gauges.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in entries {
                println!("  {key}: {value:.2}");
            }
            println!();
        }

        if !histograms.is_empty() {
            println!("### Histograms");
            let mut entries: Vec<_> = histograms.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, values) in entries {
                #[allow(clippy::cast_precision_loss)]
                let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
                let max = values.iter().copied().fold(0.0_f64, f64::max);
                println!("  {key}: n={} mean={mean:.1} max={max:.1}", values.len());
            }
            println!();
        }
    }
}
