//! perfsnap - Windows performance-data snapshot reader
//!
//! Decodes `PERF_DATA_BLOCK` snapshots into per-category counter tables and
//! derives display values (rates, ratios, percentages) from pairs of samples.
//!
//! # Example
//!
//! ```ignore
//! use perfsnap::{DirSource, Library, LibraryConfig, NameKind, NameTable, Counter};
//!
//! let names = NameTable::from_lines(NameKind::Counter, &std::fs::read_to_string("counters.txt")?)?;
//! let library = Library::new(Box::new(DirSource::new("captures/")), names, NameTable::new(), LibraryConfig::default())?;
//! let mut threads = Counter::open(&library, "Process", "Thread Count", "explorer")?;
//! let value = threads.next_value()?;
//! ```

// Re-export from sub-crates
pub use perfsnap_calc::{
    CalcError, Calculator, CounterSample, CounterType, Formula, Scaling, TimeBase,
    compute_counter_value,
};
pub use perfsnap_format::{DataBlockHeader, FormatError};

mod error;
pub use error::{Error, NameKind, Result};

pub mod catalog;
pub mod counter;
pub mod decoder;
pub mod library;
pub mod metrics;
pub mod names;
pub mod snapshot;
pub mod source;

pub use catalog::{Catalog, CategoryEntry};
pub use counter::Counter;
pub use decoder::{
    DecodeOptions, Decoder, MAX_INSTANCE_NAME_LEN, SINGLE_INSTANCE_NAME, object_instance_names,
};
pub use library::{CategoryData, Library, LibraryConfig};
pub use names::NameTable;
pub use snapshot::{CategorySnapshot, CounterDefinition, RawSnapshot, SnapshotClock};
pub use source::{DirSource, GLOBAL_KEY, MemorySource, SnapshotSource, read_snapshot_file};
