use std::fmt;

use perfsnap_calc::{CalcError, CounterType};
use perfsnap_format::FormatError;
use thiserror::Error;

/// Which string table an entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameKind {
    Counter,
    Help,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter name"),
            Self::Help => f.write_str("help"),
        }
    }
}

/// Decoder and library errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("category with object id {object_id} not found in snapshot")]
    CategoryNotFound { object_id: u32 },
    #[error("malformed snapshot: {0}")]
    Decode(#[from] FormatError),
    #[error("mismatched counter types: {old} then {new}")]
    MismatchedCounterType { old: CounterType, new: CounterType },
    #[error("instance '{0}' not found")]
    InstanceNotFound(String),
    #[error("counter '{counter}' not found in category '{category}'")]
    CounterNotFound { category: String, counter: String },
    #[error("counter id {counter_id} not found in object {object_id}")]
    CounterIdNotFound { object_id: u32, counter_id: u32 },
    #[error("category '{0}' does not exist")]
    UnknownCategory(String),
    #[error("category '{0}' is multi-instance and requires an instance name")]
    InstanceNameRequired(String),
    #[error("category '{category}' is single-instance, instance name '{instance}' not allowed")]
    InstanceNameProhibited { category: String, instance: String },
    #[error("corrupt {kind} table entry '{entry}'")]
    CorruptNameTable { kind: NameKind, entry: String },
    #[error("cannot fetch snapshot '{key}': {reason}")]
    Fetch { key: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("category snapshot already disposed")]
    Disposed,
}

impl From<CalcError> for Error {
    fn from(err: CalcError) -> Self {
        match err {
            CalcError::MismatchedCounterType { old, new } => Self::MismatchedCounterType { old, new },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
