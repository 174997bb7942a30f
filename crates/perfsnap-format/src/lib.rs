//! Byte layout of Windows performance-data snapshots.
//!
//! A snapshot is a `PERF_DATA_BLOCK` followed by a run of `PERF_OBJECT_TYPE`
//! blocks. Each object carries its counter definitions and either one
//! counter block (single instance) or a list of instance definitions, each
//! followed by its own counter block. Everything here is little-endian and
//! reproduces the OS structures byte for byte.

pub mod builder;
mod constants;
mod header;
mod read;

pub use builder::{CounterSpec, InstanceSpec, ObjectBuilder, SnapshotBuilder};
pub use constants::*;
pub use header::*;
pub use read::{read_counter_value, read_i32, read_i64, read_u32};

use thiserror::Error;

/// Snapshot layout errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("snapshot truncated: need {needed} bytes at offset {offset}, buffer is {len} bytes")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("invalid {what} length {length} at offset {offset}")]
    InvalidLength {
        what: &'static str,
        offset: usize,
        length: u64,
    },
    #[error("{what} value {value} does not fit the layout")]
    TooLarge { what: &'static str, value: u64 },
}

pub type Result<T> = std::result::Result<T, FormatError>;
