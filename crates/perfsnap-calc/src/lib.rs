//! Derived values from raw performance counter samples.
//!
//! A [`CounterSample`] is one raw reading. [`Calculator`] turns a pair of
//! them (or a single one, for instantaneous counters) into the value a
//! counter display shows: a rate, a ratio, a percentage or an elapsed time.
//!
//! ```ignore
//! use perfsnap_calc::{Calculator, CounterSample, CounterType};
//!
//! let value = Calculator::default().compute(Some(&previous), &current)?;
//! ```

mod calculator;
mod counter_type;
mod sample;

pub use calculator::{Calculator, Scaling, compute_counter_value};
pub use counter_type::{CounterType, Formula, TimeBase};
pub use sample::CounterSample;

use thiserror::Error;

/// Calculation errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcError {
    #[error("mismatched counter types: previous sample is {old}, current sample is {new}")]
    MismatchedCounterType { old: CounterType, new: CounterType },
}

pub type Result<T> = std::result::Result<T, CalcError>;
