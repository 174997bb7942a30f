//! Counter samples.

use crate::CounterType;

/// One raw reading of a counter plus the clocks it was taken against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterSample {
    pub raw_value: i64,
    /// Raw value of the paired base counter, 0 if there is none.
    pub base_value: i64,
    pub counter_frequency: i64,
    pub system_frequency: i64,
    pub system_timestamp: i64,
    pub system_timestamp_100ns: i64,
    pub counter_type: CounterType,
    pub counter_timestamp: i64,
}

impl CounterSample {
    /// All-zero sample of the given type.
    pub const fn empty(counter_type: CounterType) -> Self {
        Self {
            raw_value: 0,
            base_value: 0,
            counter_frequency: 0,
            system_frequency: 0,
            system_timestamp: 0,
            system_timestamp_100ns: 0,
            counter_type,
            counter_timestamp: 0,
        }
    }

    /// Raw value reinterpreted as unsigned (start times of elapsed counters).
    pub const fn unsigned_raw_value(&self) -> u64 {
        self.raw_value as u64
    }
}
