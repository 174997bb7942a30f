//! Decode command.

use std::path::Path;

use perfsnap::{CategorySnapshot, DecodeOptions, Decoder, DirSource, read_snapshot_file};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, OutputFormat};

/// Handle the `decode` command.
pub fn cmd_decode(
    file: &Path,
    object: u32,
    source_dir: Option<&Path>,
    format: OutputFormat,
) -> i32 {
    info!(file = %file.display(), object, "decoding");

    let raw = match read_snapshot_file(file) {
        Ok(raw) => raw,
        Err(e) => {
            error!(error = %e, "failed to read snapshot");
            return EXIT_FAILURE;
        }
    };

    let options = DecodeOptions::default();
    let source = source_dir.map(DirSource::new);
    let decoder = match &source {
        Some(source) => Decoder::new(&options).with_source(source),
        None => Decoder::new(&options),
    };

    match decoder.decode(&raw, object) {
        Ok(snapshot) => {
            print_snapshot(&snapshot, format);
            snapshot.dispose();
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %e, "decode failed");
            EXIT_FAILURE
        }
    }
}

/// Instance names paired with their value index.
pub(super) fn instance_rows(snapshot: &CategorySnapshot) -> Vec<(String, usize)> {
    if !snapshot.is_multi_instance() {
        return vec![(String::new(), 0)];
    }
    snapshot
        .instance_names()
        .iter()
        .filter_map(|name| {
            snapshot
                .instance_index(name)
                .ok()
                .map(|index| (name.clone(), index))
        })
        .collect()
}

fn print_snapshot(snapshot: &CategorySnapshot, format: OutputFormat) {
    let mut counters: Vec<_> = snapshot.counters().collect();
    counters.sort_by_key(|counter| counter.name_id);
    let rows = instance_rows(snapshot);

    match format {
        OutputFormat::Text => {
            let clock = snapshot.clock();
            println!("Object: {}", snapshot.object_id());
            println!("Multi-instance: {}", snapshot.is_multi_instance());
            println!("Instances: {}", snapshot.instance_names().len());
            println!("Counters: {}", counters.len());
            println!("System frequency: {}", clock.system_frequency);
            for counter in counters {
                println!();
                println!("[{}] {}", counter.name_id, counter.counter_type);
                for (name, index) in &rows {
                    let value = counter.value(*index).unwrap_or_default();
                    match &counter.base {
                        Some(_) => println!(
                            "  {:<32} {value} / {}",
                            display_name(name),
                            counter.base_value(*index)
                        ),
                        None => println!("  {:<32} {value}", display_name(name)),
                    }
                }
            }
        }
        OutputFormat::Raw => {
            for counter in counters {
                for (name, index) in &rows {
                    println!(
                        "{}\t{}\t{}\t{}",
                        counter.name_id,
                        name,
                        counter.value(*index).unwrap_or_default(),
                        counter.base_value(*index)
                    );
                }
            }
        }
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "-" } else { name }
}
