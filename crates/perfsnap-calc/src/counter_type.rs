//! Counter type classification.
//!
//! Every raw type code maps once to a [`CounterType`]; the calculator only
//! ever looks at the [`TimeBase`] and [`Formula`] derived from it.

use std::fmt;

use perfsnap_format::*;

/// Named counter type, one per winperf type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterType {
    RawCountHex,
    LargeRawCountHex,
    Text,
    RawCount,
    LargeRawCount,
    Delta,
    LargeDelta,
    SampleCounter,
    QueueLen,
    LargeQueueLen,
    QueueLen100ns,
    ObjectTimeQueueLen,
    CounterCounter,
    BulkCount,
    RawFraction,
    LargeRawFraction,
    Timer,
    PrecisionSystemTimer,
    Timer100ns,
    PrecisionTimer100ns,
    ObjectTimeTimer,
    PrecisionObjectTimer,
    SampleFraction,
    TimerInverse,
    Timer100nsInverse,
    MultiTimer,
    MultiTimer100ns,
    MultiTimerInverse,
    MultiTimer100nsInverse,
    AverageTimer,
    ElapsedTime,
    NoData,
    AverageBulk,
    SampleBase,
    AverageBase,
    RawBase,
    LargeRawBase,
    MultiBase,
    Histogram,
    /// A code outside the known catalogue, kept verbatim.
    Unknown(u32),
}

/// Which companion field pairs with the raw value as the denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeBase {
    /// `system_time` ticks.
    System,
    /// `system_time` ticks, numerator scaled by `counter_frequency`, base value carried as multiplicity.
    SystemMulti,
    /// `system_time_100ns`.
    Time100ns,
    /// `system_time_100ns`, base value carried as multiplicity.
    Time100nsMulti,
    /// No denominator.
    None,
    /// The base counter's value.
    Base,
    /// Unrecognised; both fields read as zero.
    Unknown,
}

/// Formula family applied to the selected field differences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Formula {
    /// Instantaneous value of the newer sample.
    Raw,
    /// Difference of the two raw values.
    Delta,
    /// Events per second.
    Rate,
    /// Average queue length per time unit.
    QueueLength,
    /// Percentage of busy time.
    Timer,
    /// Percentage of idle time inverted.
    TimerInverse,
    /// Busy percentage averaged across `multiplicity` timers.
    MultiTimer,
    MultiTimerInverse,
    /// Percentage of the base difference.
    SampleFraction,
    /// Percentage of the base, newer sample only.
    RawFraction,
    /// Seconds per operation.
    AverageTimer,
    /// Units per operation.
    AverageBulk,
    /// Seconds since the start time held in the raw value.
    ElapsedTime,
    /// Never yields a value.
    None,
}

impl CounterType {
    pub const fn from_code(code: u32) -> Self {
        match code {
            PERF_COUNTER_RAWCOUNT_HEX => Self::RawCountHex,
            PERF_COUNTER_LARGE_RAWCOUNT_HEX => Self::LargeRawCountHex,
            PERF_COUNTER_TEXT => Self::Text,
            PERF_COUNTER_RAWCOUNT => Self::RawCount,
            PERF_COUNTER_LARGE_RAWCOUNT => Self::LargeRawCount,
            PERF_COUNTER_DELTA => Self::Delta,
            PERF_COUNTER_LARGE_DELTA => Self::LargeDelta,
            PERF_SAMPLE_COUNTER => Self::SampleCounter,
            PERF_COUNTER_QUEUELEN_TYPE => Self::QueueLen,
            PERF_COUNTER_LARGE_QUEUELEN_TYPE => Self::LargeQueueLen,
            PERF_COUNTER_100NS_QUEUELEN_TYPE => Self::QueueLen100ns,
            PERF_COUNTER_OBJ_TIME_QUEUELEN_TYPE => Self::ObjectTimeQueueLen,
            PERF_COUNTER_COUNTER => Self::CounterCounter,
            PERF_COUNTER_BULK_COUNT => Self::BulkCount,
            PERF_RAW_FRACTION => Self::RawFraction,
            PERF_LARGE_RAW_FRACTION => Self::LargeRawFraction,
            PERF_COUNTER_TIMER => Self::Timer,
            PERF_PRECISION_SYSTEM_TIMER => Self::PrecisionSystemTimer,
            PERF_100NSEC_TIMER => Self::Timer100ns,
            PERF_PRECISION_100NS_TIMER => Self::PrecisionTimer100ns,
            PERF_OBJ_TIME_TIMER => Self::ObjectTimeTimer,
            PERF_PRECISION_OBJECT_TIMER => Self::PrecisionObjectTimer,
            PERF_SAMPLE_FRACTION => Self::SampleFraction,
            PERF_COUNTER_TIMER_INV => Self::TimerInverse,
            PERF_100NSEC_TIMER_INV => Self::Timer100nsInverse,
            PERF_COUNTER_MULTI_TIMER => Self::MultiTimer,
            PERF_100NSEC_MULTI_TIMER => Self::MultiTimer100ns,
            PERF_COUNTER_MULTI_TIMER_INV => Self::MultiTimerInverse,
            PERF_100NSEC_MULTI_TIMER_INV => Self::MultiTimer100nsInverse,
            PERF_AVERAGE_TIMER => Self::AverageTimer,
            PERF_ELAPSED_TIME => Self::ElapsedTime,
            PERF_COUNTER_NODATA => Self::NoData,
            PERF_AVERAGE_BULK => Self::AverageBulk,
            PERF_SAMPLE_BASE => Self::SampleBase,
            PERF_AVERAGE_BASE => Self::AverageBase,
            PERF_RAW_BASE => Self::RawBase,
            PERF_LARGE_RAW_BASE => Self::LargeRawBase,
            PERF_COUNTER_MULTI_BASE => Self::MultiBase,
            PERF_COUNTER_HISTOGRAM_TYPE => Self::Histogram,
            other => Self::Unknown(other),
        }
    }

    pub const fn code(self) -> u32 {
        match self {
            Self::RawCountHex => PERF_COUNTER_RAWCOUNT_HEX,
            Self::LargeRawCountHex => PERF_COUNTER_LARGE_RAWCOUNT_HEX,
            Self::Text => PERF_COUNTER_TEXT,
            Self::RawCount => PERF_COUNTER_RAWCOUNT,
            Self::LargeRawCount => PERF_COUNTER_LARGE_RAWCOUNT,
            Self::Delta => PERF_COUNTER_DELTA,
            Self::LargeDelta => PERF_COUNTER_LARGE_DELTA,
            Self::SampleCounter => PERF_SAMPLE_COUNTER,
            Self::QueueLen => PERF_COUNTER_QUEUELEN_TYPE,
            Self::LargeQueueLen => PERF_COUNTER_LARGE_QUEUELEN_TYPE,
            Self::QueueLen100ns => PERF_COUNTER_100NS_QUEUELEN_TYPE,
            Self::ObjectTimeQueueLen => PERF_COUNTER_OBJ_TIME_QUEUELEN_TYPE,
            Self::CounterCounter => PERF_COUNTER_COUNTER,
            Self::BulkCount => PERF_COUNTER_BULK_COUNT,
            Self::RawFraction => PERF_RAW_FRACTION,
            Self::LargeRawFraction => PERF_LARGE_RAW_FRACTION,
            Self::Timer => PERF_COUNTER_TIMER,
            Self::PrecisionSystemTimer => PERF_PRECISION_SYSTEM_TIMER,
            Self::Timer100ns => PERF_100NSEC_TIMER,
            Self::PrecisionTimer100ns => PERF_PRECISION_100NS_TIMER,
            Self::ObjectTimeTimer => PERF_OBJ_TIME_TIMER,
            Self::PrecisionObjectTimer => PERF_PRECISION_OBJECT_TIMER,
            Self::SampleFraction => PERF_SAMPLE_FRACTION,
            Self::TimerInverse => PERF_COUNTER_TIMER_INV,
            Self::Timer100nsInverse => PERF_100NSEC_TIMER_INV,
            Self::MultiTimer => PERF_COUNTER_MULTI_TIMER,
            Self::MultiTimer100ns => PERF_100NSEC_MULTI_TIMER,
            Self::MultiTimerInverse => PERF_COUNTER_MULTI_TIMER_INV,
            Self::MultiTimer100nsInverse => PERF_100NSEC_MULTI_TIMER_INV,
            Self::AverageTimer => PERF_AVERAGE_TIMER,
            Self::ElapsedTime => PERF_ELAPSED_TIME,
            Self::NoData => PERF_COUNTER_NODATA,
            Self::AverageBulk => PERF_AVERAGE_BULK,
            Self::SampleBase => PERF_SAMPLE_BASE,
            Self::AverageBase => PERF_AVERAGE_BASE,
            Self::RawBase => PERF_RAW_BASE,
            Self::LargeRawBase => PERF_LARGE_RAW_BASE,
            Self::MultiBase => PERF_COUNTER_MULTI_BASE,
            Self::Histogram => PERF_COUNTER_HISTOGRAM_TYPE,
            Self::Unknown(code) => code,
        }
    }

    /// Denominator-only counter that pairs with the counter before it.
    pub const fn is_base(self) -> bool {
        matches!(
            self,
            Self::AverageBase
                | Self::MultiBase
                | Self::RawBase
                | Self::LargeRawBase
                | Self::SampleBase
        )
    }

    /// Readable from a single sample, without a previous one.
    pub const fn is_instantaneous(self) -> bool {
        matches!(
            self,
            Self::RawCount
                | Self::RawCountHex
                | Self::LargeRawCount
                | Self::LargeRawCountHex
                | Self::MultiBase
        )
    }

    pub const fn time_base(self) -> TimeBase {
        match self {
            Self::CounterCounter
            | Self::QueueLen
            | Self::SampleCounter
            | Self::ObjectTimeTimer
            | Self::ObjectTimeQueueLen
            | Self::Timer
            | Self::TimerInverse
            | Self::BulkCount
            | Self::LargeQueueLen => TimeBase::System,
            Self::MultiTimer | Self::MultiTimerInverse => TimeBase::SystemMulti,
            Self::QueueLen100ns | Self::Timer100ns | Self::Timer100nsInverse => {
                TimeBase::Time100ns
            }
            Self::MultiTimer100ns | Self::MultiTimer100nsInverse => TimeBase::Time100nsMulti,
            Self::RawCount
            | Self::RawCountHex
            | Self::LargeRawCount
            | Self::LargeRawCountHex
            | Self::Delta
            | Self::LargeDelta
            | Self::MultiBase => TimeBase::None,
            Self::SampleFraction
            | Self::RawFraction
            | Self::LargeRawFraction
            | Self::PrecisionSystemTimer
            | Self::PrecisionTimer100ns
            | Self::PrecisionObjectTimer
            | Self::AverageTimer
            | Self::AverageBulk => TimeBase::Base,
            _ => TimeBase::Unknown,
        }
    }

    pub const fn formula(self) -> Formula {
        match self {
            Self::RawCount
            | Self::RawCountHex
            | Self::LargeRawCount
            | Self::LargeRawCountHex
            | Self::MultiBase => Formula::Raw,
            Self::Delta | Self::LargeDelta => Formula::Delta,
            Self::CounterCounter | Self::BulkCount | Self::SampleCounter => Formula::Rate,
            Self::QueueLen
            | Self::LargeQueueLen
            | Self::QueueLen100ns
            | Self::ObjectTimeQueueLen => Formula::QueueLength,
            Self::Timer | Self::Timer100ns | Self::ObjectTimeTimer => Formula::Timer,
            Self::TimerInverse | Self::Timer100nsInverse => Formula::TimerInverse,
            Self::MultiTimer | Self::MultiTimer100ns => Formula::MultiTimer,
            Self::MultiTimerInverse | Self::MultiTimer100nsInverse => Formula::MultiTimerInverse,
            Self::SampleFraction
            | Self::PrecisionSystemTimer
            | Self::PrecisionTimer100ns
            | Self::PrecisionObjectTimer => Formula::SampleFraction,
            Self::RawFraction | Self::LargeRawFraction => Formula::RawFraction,
            Self::AverageTimer => Formula::AverageTimer,
            Self::AverageBulk => Formula::AverageBulk,
            Self::ElapsedTime => Formula::ElapsedTime,
            _ => Formula::None,
        }
    }
}

impl From<u32> for CounterType {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

impl From<CounterType> for u32 {
    fn from(ty: CounterType) -> Self {
        ty.code()
    }
}

impl fmt::Display for CounterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown(0x{code:08x})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in [
            PERF_COUNTER_RAWCOUNT,
            PERF_100NSEC_MULTI_TIMER_INV,
            PERF_ELAPSED_TIME,
            PERF_LARGE_RAW_BASE,
            PERF_COUNTER_HISTOGRAM_TYPE,
            0x1234_5678,
        ] {
            assert_eq!(CounterType::from_code(code).code(), code);
        }
        assert_eq!(CounterType::from_code(0x1234_5678), CounterType::Unknown(0x1234_5678));
    }

    #[test]
    fn test_precision_timestamp_is_a_base() {
        assert_eq!(CounterType::from_code(PERF_PRECISION_TIMESTAMP), CounterType::LargeRawBase);
        assert!(CounterType::LargeRawBase.is_base());
        assert!(CounterType::MultiBase.is_base());
        assert!(!CounterType::RawFraction.is_base());
    }

    #[test]
    fn test_time_base_groups() {
        assert_eq!(CounterType::Timer.time_base(), TimeBase::System);
        assert_eq!(CounterType::MultiTimerInverse.time_base(), TimeBase::SystemMulti);
        assert_eq!(CounterType::QueueLen100ns.time_base(), TimeBase::Time100ns);
        assert_eq!(CounterType::MultiTimer100ns.time_base(), TimeBase::Time100nsMulti);
        assert_eq!(CounterType::LargeDelta.time_base(), TimeBase::None);
        assert_eq!(CounterType::AverageBulk.time_base(), TimeBase::Base);
        assert_eq!(CounterType::Text.time_base(), TimeBase::Unknown);
        assert_eq!(CounterType::Unknown(7).formula(), Formula::None);
    }

    #[test]
    fn test_display_unknown_code() {
        assert_eq!(CounterType::Unknown(0x10).to_string(), "Unknown(0x00000010)");
        assert_eq!(CounterType::Timer100ns.to_string(), "Timer100ns");
    }
}
