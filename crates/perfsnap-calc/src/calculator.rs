//! Counter value calculator.

use crate::{CalcError, CounterSample, CounterType, Formula, Result, TimeBase};

/// Display scaling of percent-style formulas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaling {
    /// Factor applied to timer and fraction ratios (100 for percent).
    pub percent: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self { percent: 100.0 }
    }
}

impl Scaling {
    /// Set the percent factor.
    pub const fn with_percent(mut self, percent: f64) -> Self {
        self.percent = percent;
        self
    }
}

/// Fields selected from one sample for the formula.
#[derive(Clone, Copy, Debug, Default)]
struct Fields {
    numerator: i128,
    denominator: i128,
    multiplicity: i64,
}

impl Fields {
    fn select(sample: &CounterSample, time_base: TimeBase) -> Self {
        let raw = i128::from(sample.raw_value);
        match time_base {
            TimeBase::System => Self {
                numerator: raw,
                denominator: i128::from(sample.system_timestamp),
                multiplicity: 0,
            },
            TimeBase::SystemMulti => {
                let frequency = i128::from(sample.counter_frequency);
                Self {
                    numerator: if frequency == 0 { raw } else { raw * frequency },
                    denominator: i128::from(sample.system_timestamp),
                    multiplicity: sample.base_value,
                }
            }
            TimeBase::Time100ns => Self {
                numerator: raw,
                denominator: i128::from(sample.system_timestamp_100ns),
                multiplicity: 0,
            },
            TimeBase::Time100nsMulti => Self {
                numerator: raw,
                denominator: i128::from(sample.system_timestamp_100ns),
                multiplicity: sample.base_value,
            },
            TimeBase::None => Self {
                numerator: raw,
                ..Self::default()
            },
            TimeBase::Base => Self {
                numerator: raw,
                denominator: i128::from(sample.base_value),
                multiplicity: 0,
            },
            TimeBase::Unknown => Self::default(),
        }
    }
}

/// Turns pairs of raw samples into display values.
///
/// Stateless; every numeric edge case (no data yet, counter wrap, zero
/// interval) resolves to `0.0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Calculator {
    scaling: Scaling,
}

impl Calculator {
    pub const fn new(scaling: Scaling) -> Self {
        Self { scaling }
    }

    pub const fn scaling(&self) -> Scaling {
        self.scaling
    }

    /// Derive a value from `new`, relative to `old` when the counter needs two points.
    ///
    /// Fails only when both samples are present and their types differ.
    pub fn compute(&self, old: Option<&CounterSample>, new: &CounterSample) -> Result<f64> {
        if new.raw_value == 0 {
            return Ok(0.0);
        }

        let counter_type = new.counter_type;
        let old = match old {
            None if !counter_type.is_instantaneous() => return Ok(0.0),
            None => CounterSample::empty(counter_type),
            Some(old) if old.counter_type != counter_type => {
                return Err(CalcError::MismatchedCounterType {
                    old: old.counter_type,
                    new: counter_type,
                });
            }
            Some(old) => *old,
        };

        if counter_type == CounterType::ElapsedTime {
            return Ok(elapsed_seconds(&old, new));
        }

        let time_base = counter_type.time_base();
        let before = Fields::select(&old, time_base);
        let after = Fields::select(new, time_base);
        let value = self.evaluate(counter_type.formula(), time_base, &before, &after, new);

        Ok(if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn evaluate(
        &self,
        formula: Formula,
        time_base: TimeBase,
        before: &Fields,
        after: &Fields,
        new: &CounterSample,
    ) -> f64 {
        let percent = self.scaling.percent;
        let frequency = new.system_frequency as f64;
        let numerator = after.numerator - before.numerator;
        let denominator = after.denominator - before.denominator;

        match formula {
            Formula::Raw => return after.numerator as f64,
            Formula::RawFraction => {
                if after.denominator <= 0 {
                    return 0.0;
                }
                return percent * after.numerator as f64 / after.denominator as f64;
            }
            Formula::None | Formula::ElapsedTime => return 0.0,
            _ => {}
        }

        if numerator < 0 {
            return 0.0;
        }
        let dn = numerator as f64;
        if formula == Formula::Delta {
            return dn;
        }

        if denominator <= 0 {
            return 0.0;
        }
        let dd = denominator as f64;
        let multiplicity = after.multiplicity as f64;

        match formula {
            Formula::Rate if frequency > 0.0 => dn / (dd / frequency),
            Formula::QueueLength | Formula::AverageBulk => dn / dd,
            Formula::Timer | Formula::SampleFraction => percent * dn / dd,
            Formula::TimerInverse => percent * (1.0 - dn / dd),
            Formula::MultiTimer | Formula::MultiTimerInverse if after.multiplicity > 0 => {
                let mut ratio = dn / dd;
                if time_base == TimeBase::SystemMulti {
                    if frequency <= 0.0 {
                        return 0.0;
                    }
                    // Undo the counter frequency scaling applied during field selection.
                    ratio /= frequency;
                }
                if formula == Formula::MultiTimer {
                    percent * ratio / multiplicity
                } else {
                    percent * (multiplicity - ratio)
                }
            }
            Formula::AverageTimer if frequency > 0.0 => (dn / frequency) / dd,
            _ => 0.0,
        }
    }
}

/// Seconds between the start time held in `old` and the counter clock of `new`.
#[allow(clippy::cast_precision_loss)]
fn elapsed_seconds(old: &CounterSample, new: &CounterSample) -> f64 {
    if old.counter_frequency <= 0 {
        return 0.0;
    }
    let start = old.unsigned_raw_value();
    let now = new.counter_timestamp as u64;
    if start >= now {
        return 0.0;
    }
    (now - start) as f64 / old.counter_frequency as f64
}

/// [`Calculator::compute`] with default scaling.
pub fn compute_counter_value(old: Option<&CounterSample>, new: &CounterSample) -> Result<f64> {
    Calculator::default().compute(old, new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(counter_type: CounterType, raw_value: i64) -> CounterSample {
        CounterSample {
            raw_value,
            system_frequency: 1000,
            ..CounterSample::empty(counter_type)
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn compute(old: &CounterSample, new: &CounterSample) -> f64 {
        compute_counter_value(Some(old), new).unwrap()
    }

    #[test]
    fn test_zero_raw_value_is_no_data() {
        for ty in [
            CounterType::RawCount,
            CounterType::CounterCounter,
            CounterType::Timer100ns,
            CounterType::ElapsedTime,
        ] {
            let old = sample(ty, 50);
            assert_eq!(compute(&old, &sample(ty, 0)), 0.0);
        }
    }

    #[test]
    fn test_first_read() {
        assert_eq!(
            compute_counter_value(None, &sample(CounterType::RawCount, 42)).unwrap(),
            42.0
        );
        assert_eq!(
            compute_counter_value(None, &sample(CounterType::LargeRawCountHex, 7)).unwrap(),
            7.0
        );
        assert_eq!(
            compute_counter_value(None, &sample(CounterType::MultiBase, 3)).unwrap(),
            3.0
        );
        for ty in [
            CounterType::CounterCounter,
            CounterType::RawFraction,
            CounterType::Timer100ns,
            CounterType::ElapsedTime,
            CounterType::Delta,
        ] {
            assert_eq!(compute_counter_value(None, &sample(ty, 99)).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_mismatched_types() {
        let err = compute_counter_value(
            Some(&sample(CounterType::RawCount, 1)),
            &sample(CounterType::LargeRawCount, 2),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CalcError::MismatchedCounterType {
                old: CounterType::RawCount,
                new: CounterType::LargeRawCount,
            }
        );
    }

    #[test]
    fn test_elapsed_time() {
        let old = CounterSample {
            counter_frequency: 100,
            ..sample(CounterType::ElapsedTime, 500)
        };
        let mut new = CounterSample {
            counter_timestamp: 1500,
            ..old
        };
        assert_close(compute(&old, &new), 10.0);

        new.counter_timestamp = 400;
        assert_eq!(compute(&old, &new), 0.0);

        let no_frequency = CounterSample {
            counter_frequency: 0,
            ..old
        };
        new.counter_timestamp = 1500;
        assert_eq!(compute(&no_frequency, &new), 0.0);
    }

    #[test]
    fn test_rate_per_second() {
        let old = CounterSample {
            system_timestamp: 1000,
            ..sample(CounterType::CounterCounter, 100)
        };
        let new = CounterSample {
            system_timestamp: 3000,
            ..sample(CounterType::CounterCounter, 300)
        };
        assert_close(compute(&old, &new), 100.0);
    }

    #[test]
    fn test_timer_100ns_and_inverse() {
        let old = CounterSample {
            system_timestamp_100ns: 10_000,
            ..sample(CounterType::Timer100ns, 1000)
        };
        let new = CounterSample {
            system_timestamp_100ns: 20_000,
            ..sample(CounterType::Timer100ns, 3500)
        };
        assert_close(compute(&old, &new), 25.0);

        let old = CounterSample {
            counter_type: CounterType::Timer100nsInverse,
            ..old
        };
        let new = CounterSample {
            counter_type: CounterType::Timer100nsInverse,
            ..new
        };
        assert_close(compute(&old, &new), 75.0);
    }

    #[test]
    fn test_multi_timers() {
        let old = CounterSample {
            system_timestamp_100ns: 10_000,
            base_value: 4,
            ..sample(CounterType::MultiTimer100ns, 10_000)
        };
        let new = CounterSample {
            system_timestamp_100ns: 20_000,
            base_value: 4,
            ..sample(CounterType::MultiTimer100ns, 30_000)
        };
        assert_close(compute(&old, &new), 50.0);

        let old = CounterSample {
            counter_frequency: 1000,
            system_timestamp: 0,
            base_value: 4,
            ..sample(CounterType::MultiTimer, 100)
        };
        let new = CounterSample {
            counter_frequency: 1000,
            system_timestamp: 100,
            base_value: 4,
            ..sample(CounterType::MultiTimer, 300)
        };
        assert_close(compute(&old, &new), 50.0);

        let inverse = |s: CounterSample| CounterSample {
            counter_type: CounterType::MultiTimerInverse,
            ..s
        };
        assert_close(compute(&inverse(old), &inverse(new)), 200.0);
    }

    #[test]
    fn test_fractions_and_averages() {
        let old = CounterSample {
            base_value: 100,
            ..sample(CounterType::SampleFraction, 10)
        };
        let new = CounterSample {
            base_value: 140,
            ..sample(CounterType::SampleFraction, 30)
        };
        assert_close(compute(&old, &new), 50.0);

        let raw = CounterSample {
            base_value: 200,
            ..sample(CounterType::RawFraction, 25)
        };
        assert_close(compute(&raw, &raw), 12.5);

        let old = sample(CounterType::AverageTimer, 0);
        let new = CounterSample {
            base_value: 2,
            ..sample(CounterType::AverageTimer, 4000)
        };
        assert_close(compute(&old, &new), 2.0);

        let old = CounterSample {
            base_value: 1,
            ..sample(CounterType::AverageBulk, 100)
        };
        let new = CounterSample {
            base_value: 5,
            ..sample(CounterType::AverageBulk, 900)
        };
        assert_close(compute(&old, &new), 200.0);
    }

    #[test]
    fn test_delta_and_raw() {
        assert_close(
            compute(&sample(CounterType::Delta, 7), &sample(CounterType::Delta, 12)),
            5.0,
        );
        assert_close(
            compute(&sample(CounterType::RawCount, 7), &sample(CounterType::RawCount, 3)),
            3.0,
        );
    }

    #[test]
    fn test_negative_and_empty_intervals_clamp() {
        // counter went backwards
        assert_eq!(
            compute(&sample(CounterType::Delta, 12), &sample(CounterType::Delta, 7)),
            0.0
        );

        let old = CounterSample {
            system_timestamp: 500,
            ..sample(CounterType::CounterCounter, 1)
        };
        let new = CounterSample {
            system_timestamp: 500,
            ..sample(CounterType::CounterCounter, 9)
        };
        assert_eq!(compute(&old, &new), 0.0);

        assert_eq!(
            compute(&sample(CounterType::Text, 1), &sample(CounterType::Text, 2)),
            0.0
        );
        assert_eq!(
            compute(&sample(CounterType::Unknown(3), 1), &sample(CounterType::Unknown(3), 2)),
            0.0
        );
    }

    #[test]
    fn test_percent_scaling_is_configurable() {
        let calculator = Calculator::new(Scaling::default().with_percent(1.0));
        let old = CounterSample {
            system_timestamp: 0,
            ..sample(CounterType::Timer, 10)
        };
        let new = CounterSample {
            system_timestamp: 100,
            ..sample(CounterType::Timer, 60)
        };
        assert_close(calculator.compute(Some(&old), &new).unwrap(), 0.5);
        assert_close(compute(&old, &new), 50.0);
    }
}
