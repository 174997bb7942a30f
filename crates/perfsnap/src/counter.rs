//! Stateful reader for one counter.

use perfsnap_calc::{Calculator, CounterSample, CounterType};
use tracing::trace;

use crate::library::Library;
use crate::{Error, Result};

/// One counter of one instance, read repeatedly.
///
/// Keeps the previous sample so that [`next_value`](Self::next_value) can
/// derive rates. The first value of a two-point counter is `0.0`.
pub struct Counter<'a> {
    library: &'a Library,
    category: String,
    counter: String,
    instance: String,
    counter_id: u32,
    help: String,
    counter_type: CounterType,
    previous: Option<CounterSample>,
    calculator: Calculator,
}

impl<'a> Counter<'a> {
    /// Open `counter` of `category`. `instance` is empty for single-instance categories.
    pub fn open(library: &'a Library, category: &str, counter: &str, instance: &str) -> Result<Self> {
        if category.is_empty() || !library.category_exists(category) {
            return Err(Error::UnknownCategory(category.to_string()));
        }
        let counter_id = library.counter_id(category, counter)?;
        let help = library.counter_help(category, counter)?;

        let mut reader = Self {
            library,
            category: category.to_string(),
            counter: counter.to_string(),
            instance: instance.to_string(),
            counter_id,
            help,
            counter_type: CounterType::Unknown(u32::MAX),
            previous: None,
            calculator: Calculator::default(),
        };
        // Validates the instance name and learns the counter type.
        reader.next_sample()?;
        Ok(reader)
    }

    /// Use `calculator` for [`next_value`](Self::next_value).
    pub const fn with_calculator(mut self, calculator: Calculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn counter(&self) -> &str {
        &self.counter
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub const fn counter_type(&self) -> CounterType {
        self.counter_type
    }

    /// Take a fresh raw sample.
    pub fn next_sample(&mut self) -> Result<CounterSample> {
        let snapshot = self.library.sample(&self.category)?;
        let sample = if snapshot.is_multi_instance() {
            if self.instance.is_empty() {
                Err(Error::InstanceNameRequired(self.category.clone()))
            } else {
                snapshot.sample(self.counter_id, &self.instance)
            }
        } else if self.instance.is_empty() {
            snapshot.single_sample(self.counter_id)
        } else {
            Err(Error::InstanceNameProhibited {
                category: self.category.clone(),
                instance: self.instance.clone(),
            })
        };
        snapshot.dispose();

        let sample = sample?;
        self.counter_type = sample.counter_type;
        trace!(counter = %self.counter, raw = sample.raw_value, "sampled");
        Ok(sample)
    }

    /// Take a fresh sample and derive its value against the previous one.
    pub fn next_value(&mut self) -> Result<f64> {
        let sample = self.next_sample()?;
        let value = self.calculator.compute(self.previous.as_ref(), &sample)?;
        self.previous = Some(sample);
        Ok(value)
    }

    /// Current raw value.
    pub fn raw_value(&mut self) -> Result<i64> {
        Ok(self.next_sample()?.raw_value)
    }
}
