//! Compute command.

use std::path::Path;

use perfsnap::{
    Calculator, CategorySnapshot, CounterSample, CounterType, DecodeOptions, Decoder, Scaling,
    read_snapshot_file,
};
use regex::Regex;
use tracing::{error, info, warn};

use super::decode::instance_rows;
use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, OutputFormat};

/// Handle the `compute` command.
pub fn cmd_compute(
    old: &Path,
    new: &Path,
    object: u32,
    filter: Option<&str>,
    percent: f64,
    format: OutputFormat,
) -> i32 {
    let filter = match filter.map(Regex::new).transpose() {
        Ok(filter) => filter,
        Err(e) => {
            error!(error = %e, "invalid instance filter");
            return EXIT_FAILURE;
        }
    };

    info!(old = %old.display(), new = %new.display(), object, "computing");

    let options = DecodeOptions::default();
    let decoder = Decoder::new(&options);
    let decode = |path: &Path| {
        read_snapshot_file(path).and_then(|raw| decoder.decode(&raw, object))
    };
    let (previous, current) = match (decode(old), decode(new)) {
        (Ok(previous), Ok(current)) => (previous, current),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "decode failed");
            return EXIT_FAILURE;
        }
    };

    let calculator = Calculator::new(Scaling::default().with_percent(percent));
    let mut counters: Vec<u32> = current.counters().map(|counter| counter.name_id).collect();
    counters.sort_unstable();

    let mut failures = 0usize;
    for id in counters {
        for (name, _) in instance_rows(&current) {
            if filter.as_ref().is_some_and(|re| !re.is_match(&name)) {
                continue;
            }
            let Some(sample) = sample(&current, id, &name) else {
                continue;
            };
            let old_sample = sample_of(&previous, id, &name);
            match calculator.compute(old_sample.as_ref(), &sample) {
                Ok(value) => print_value(format, id, &name, sample.counter_type, value),
                Err(e) => {
                    warn!(counter = id, instance = %name, error = %e, "cannot compute");
                    failures += 1;
                }
            }
        }
    }

    previous.dispose();
    current.dispose();
    if failures == 0 { EXIT_SUCCESS } else { EXIT_FAILURE }
}

fn sample(snapshot: &CategorySnapshot, id: u32, instance: &str) -> Option<CounterSample> {
    if instance.is_empty() {
        snapshot.single_sample(id).ok()
    } else {
        snapshot.sample(id, instance).ok()
    }
}

/// Sample from the earlier snapshot; missing instances count as a first read.
fn sample_of(snapshot: &CategorySnapshot, id: u32, instance: &str) -> Option<CounterSample> {
    if snapshot.is_multi_instance() == instance.is_empty() {
        return None;
    }
    sample(snapshot, id, instance)
}

fn print_value(
    format: OutputFormat,
    id: u32,
    instance: &str,
    counter_type: CounterType,
    value: f64,
) {
    match format {
        OutputFormat::Text => {
            let instance = if instance.is_empty() { "-" } else { instance };
            println!("[{id}] {instance:<32} {value:>16.3}  ({counter_type})");
        }
        OutputFormat::Raw => println!("{id}\t{instance}\t{value}"),
    }
}
