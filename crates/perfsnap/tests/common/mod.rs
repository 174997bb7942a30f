//! Shared snapshot fixtures.
//!
//! Four categories modelled on a small machine: `Process` and `Thread`
//! (parent/child), multi-instance `Processor` and single-instance `Memory`.
//! Every `step` advances the system clock by one second.

#![allow(dead_code)]

use std::sync::Arc;

use perfsnap::{GLOBAL_KEY, Library, LibraryConfig, MemorySource, NameKind, NameTable};
use perfsnap_format::{
    CounterSpec, InstanceSpec, ObjectBuilder, PERF_100NSEC_TIMER, PERF_COUNTER_COUNTER,
    PERF_COUNTER_LARGE_RAWCOUNT, PERF_COUNTER_NODATA, PERF_COUNTER_RAWCOUNT, PERF_ELAPSED_TIME,
    PERF_RAW_BASE, PERF_RAW_FRACTION, SnapshotBuilder,
};

pub const MEMORY: u32 = 4;
pub const PROCESS: u32 = 230;
pub const THREAD: u32 = 232;
pub const PROCESSOR: u32 = 238;

pub const PROCESSOR_TIME: u32 = 6;
pub const DPC_TIME: u32 = 10;
pub const DPC_BASE: u32 = 12;
pub const AVAILABLE_BYTES: u32 = 24;
pub const NO_DATA: u32 = 30;
pub const INTERRUPTS: u32 = 148;
pub const THREAD_COUNT: u32 = 680;
pub const ELAPSED_TIME: u32 = 684;

pub const SYSTEM_FREQUENCY: i64 = 1_000_000;
pub const OBJECT_FREQUENCY: i64 = 10_000_000;
pub const PROCESS_START: i64 = 1_000;

pub fn names() -> NameTable {
    let text = [
        "4", "Memory",
        "6", "% Processor Time",
        "10", "% DPC Time",
        "12", "DPC Base",
        "24", "Available Bytes",
        "148", "Interrupts/sec",
        "230", "Process",
        "232", "Thread",
        "238", "Processor",
        "680", "Thread Count",
        "684", "Elapsed Time",
    ]
    .join("\n");
    NameTable::from_lines(NameKind::Counter, &text).unwrap()
}

pub fn help() -> NameTable {
    [
        (239, "Processor activity"),
        (7, "Time the processor spent on non-idle threads"),
    ]
    .into_iter()
    .collect()
}

/// Processor: instance `i` is busy `25 * (i + 1)`% of the time (`_Total` 37.5%).
pub fn processor(step: i64) -> ObjectBuilder {
    let instances = [("0", 2_500, 100), ("1", 5_000, 200), ("_Total", 3_750, 300)];
    instances.into_iter().fold(
        ObjectBuilder::new(PROCESSOR)
            .counter(CounterSpec::new(PROCESSOR_TIME, PERF_100NSEC_TIMER))
            .counter(CounterSpec::new(INTERRUPTS, PERF_COUNTER_COUNTER))
            .counter(CounterSpec::new(DPC_TIME, PERF_RAW_FRACTION))
            .counter(CounterSpec::new(DPC_BASE, PERF_RAW_BASE)),
        |object, (name, busy, interrupts)| {
            object.instance(InstanceSpec::new(
                name,
                vec![busy * step, interrupts * step, 5, 20],
            ))
        },
    )
}

pub fn process() -> ObjectBuilder {
    [("Idle", 1), ("System", 150), ("explorer", 40), ("_Total", 191)]
        .into_iter()
        .fold(
            ObjectBuilder::new(PROCESS).counter(CounterSpec::new(THREAD_COUNT, PERF_COUNTER_RAWCOUNT)),
            |object, (name, threads)| object.instance(InstanceSpec::new(name, vec![threads])),
        )
}

/// Threads of explorer, Idle, _Total (the last parent) and System.
pub fn thread() -> ObjectBuilder {
    ObjectBuilder::new(THREAD)
        .counter(CounterSpec::new(PROCESSOR_TIME, PERF_100NSEC_TIMER))
        .instance(InstanceSpec::new("0", vec![10]).parent(PROCESS, 2))
        .instance(InstanceSpec::new("0", vec![20]).parent(PROCESS, 0))
        .instance(InstanceSpec::new("1", vec![30]).parent(PROCESS, 3))
        .instance(InstanceSpec::new("0", vec![40]).parent(PROCESS, 1))
}

pub fn memory(step: i64) -> ObjectBuilder {
    ObjectBuilder::new(MEMORY)
        .counter_frequency(OBJECT_FREQUENCY)
        .counter_time(PROCESS_START + OBJECT_FREQUENCY * step)
        .counter(CounterSpec::new(AVAILABLE_BYTES, PERF_COUNTER_LARGE_RAWCOUNT))
        .counter(CounterSpec::new(NO_DATA, PERF_COUNTER_NODATA))
        .counter(CounterSpec::new(ELAPSED_TIME, PERF_ELAPSED_TIME))
        .values(vec![4_096 * step, 0, PROCESS_START])
}

pub fn snapshot(step: i64, objects: impl IntoIterator<Item = ObjectBuilder>) -> Vec<u8> {
    objects
        .into_iter()
        .fold(
            SnapshotBuilder::new()
                .system_frequency(SYSTEM_FREQUENCY)
                .system_time(SYSTEM_FREQUENCY * step)
                .system_time_100ns(10_000 * step),
            SnapshotBuilder::object,
        )
        .build()
}

/// Load the captures of `step` into `source`, replacing older ones.
pub fn capture(source: &MemorySource, step: i64) {
    source.insert(
        GLOBAL_KEY,
        snapshot(step, [memory(step), process(), thread(), processor(step)]),
    );
    source.insert(MEMORY.to_string(), snapshot(step, [memory(step)]));
    source.insert(PROCESS.to_string(), snapshot(step, [process()]));
    source.insert(THREAD.to_string(), snapshot(step, [thread()]));
    source.insert(PROCESSOR.to_string(), snapshot(step, [processor(step)]));
}

pub fn source(step: i64) -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::new());
    capture(&source, step);
    source
}

pub fn library(source: &Arc<MemorySource>) -> Library {
    Library::new(
        Box::new(Arc::clone(source)),
        names(),
        help(),
        LibraryConfig::default(),
    )
    .unwrap()
}
