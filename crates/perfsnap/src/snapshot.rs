//! Raw snapshot buffers and decoded category snapshots.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use perfsnap_calc::{CounterSample, CounterType};
use perfsnap_format::DataBlockHeader;
use rustc_hash::FxHashMap;

use crate::{Error, Result};

/// One captured snapshot: immutable, cheap to clone, shareable across threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSnapshot {
    data: Arc<[u8]>,
}

impl RawSnapshot {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn header(&self) -> Result<DataBlockHeader> {
        Ok(DataBlockHeader::parse(&self.data)?)
    }
}

impl From<Vec<u8>> for RawSnapshot {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

/// One counter of a decoded category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterDefinition {
    pub name_id: u32,
    pub help_id: u32,
    pub counter_type: CounterType,
    /// Raw values, index-aligned with the category's instances.
    pub values: Vec<i64>,
    /// Denominator counter that followed this one in the snapshot.
    pub base: Option<Box<CounterDefinition>>,
}

impl CounterDefinition {
    pub fn value(&self, index: usize) -> Option<i64> {
        self.values.get(index).copied()
    }

    /// Base value at `index`, 0 without a base counter.
    pub fn base_value(&self, index: usize) -> i64 {
        self.base
            .as_ref()
            .and_then(|base| base.value(index))
            .unwrap_or(0)
    }
}

/// Clocks shared by every sample of one decoded category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotClock {
    pub system_frequency: i64,
    pub system_timestamp: i64,
    pub system_timestamp_100ns: i64,
    pub counter_frequency: i64,
    pub counter_timestamp: i64,
}

/// Decoded view of one category inside a snapshot.
///
/// Immutable once built. Holds the source buffer until [`dispose`] is
/// called (or the value is dropped); disposal is idempotent and lookups
/// after it fail with [`Error::Disposed`].
///
/// [`dispose`]: CategorySnapshot::dispose
#[derive(Debug)]
pub struct CategorySnapshot {
    pub(crate) object_id: u32,
    pub(crate) clock: SnapshotClock,
    pub(crate) multi_instance: bool,
    pub(crate) counters: FxHashMap<u32, CounterDefinition>,
    pub(crate) instances: FxHashMap<String, usize>,
    pub(crate) instance_order: Vec<String>,
    pub(crate) max_instance_name_len: usize,
    pub(crate) disposed: AtomicBool,
    pub(crate) buffer: Mutex<Option<RawSnapshot>>,
}

impl CategorySnapshot {
    pub const fn object_id(&self) -> u32 {
        self.object_id
    }

    pub const fn clock(&self) -> SnapshotClock {
        self.clock
    }

    pub const fn is_multi_instance(&self) -> bool {
        self.multi_instance
    }

    /// Registered (non-base) counter by name id.
    pub fn counter(&self, name_id: u32) -> Option<&CounterDefinition> {
        self.counters.get(&name_id)
    }

    pub fn counters(&self) -> impl Iterator<Item = &CounterDefinition> {
        self.counters.values()
    }

    pub fn counter_count(&self) -> usize {
        self.counters.len()
    }

    /// Registered counter, or a base counter attached to one.
    pub fn definition_or_base(&self, name_id: u32) -> Option<&CounterDefinition> {
        self.counters.get(&name_id).or_else(|| {
            self.counters
                .values()
                .filter_map(|counter| counter.base.as_deref())
                .find(|base| base.name_id == name_id)
        })
    }

    /// Instance names in snapshot order; empty for single-instance categories.
    pub fn instance_names(&self) -> &[String] {
        &self.instance_order
    }

    /// Index of `name`, retrying with the name cut to the maximum instance name length.
    pub fn instance_index(&self, name: &str) -> Result<usize> {
        self.check_disposed()?;
        if let Some(&index) = self.instances.get(name) {
            return Ok(index);
        }
        if name.chars().count() > self.max_instance_name_len {
            let truncated: String = name.chars().take(self.max_instance_name_len).collect();
            if let Some(&index) = self.instances.get(&truncated) {
                return Ok(index);
            }
        }
        Err(Error::InstanceNotFound(name.to_string()))
    }

    /// `false` once disposed.
    pub fn instance_exists(&self, name: &str) -> bool {
        self.instance_index(name).is_ok()
    }

    /// Sample of `counter_id` for the named instance.
    pub fn sample(&self, counter_id: u32, instance: &str) -> Result<CounterSample> {
        self.check_disposed()?;
        let counter = self.lookup(counter_id)?;
        let index = self.instance_index(instance)?;
        self.sample_at(counter, index)
            .ok_or_else(|| Error::InstanceNotFound(instance.to_string()))
    }

    /// Sample of `counter_id` in a single-instance category.
    pub fn single_sample(&self, counter_id: u32) -> Result<CounterSample> {
        self.check_disposed()?;
        let counter = self.lookup(counter_id)?;
        self.sample_at(counter, 0)
            .ok_or_else(|| Error::InstanceNotFound(String::new()))
    }

    /// Every registered counter, keyed by name id then instance name.
    pub fn read_all(&self) -> Result<FxHashMap<u32, FxHashMap<String, CounterSample>>> {
        self.check_disposed()?;
        let mut all = FxHashMap::default();
        for (id, counter) in &self.counters {
            let per_instance = self
                .instances
                .iter()
                .filter_map(|(name, &index)| {
                    self.sample_at(counter, index)
                        .map(|sample| (name.clone(), sample))
                })
                .collect();
            all.insert(*id, per_instance);
        }
        Ok(all)
    }

    /// The source buffer, while not disposed.
    pub fn raw(&self) -> Result<RawSnapshot> {
        self.check_disposed()?;
        self.buffer.lock().clone().ok_or(Error::Disposed)
    }

    /// Release the source buffer. Returns `true` only for the call that released it.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.buffer.lock().take();
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn check_disposed(&self) -> Result<()> {
        if self.is_disposed() {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    fn lookup(&self, counter_id: u32) -> Result<&CounterDefinition> {
        self.definition_or_base(counter_id)
            .ok_or(Error::CounterIdNotFound {
                object_id: self.object_id,
                counter_id,
            })
    }

    fn sample_at(&self, counter: &CounterDefinition, index: usize) -> Option<CounterSample> {
        Some(CounterSample {
            raw_value: counter.value(index)?,
            base_value: counter.base_value(index),
            counter_frequency: self.clock.counter_frequency,
            system_frequency: self.clock.system_frequency,
            system_timestamp: self.clock.system_timestamp,
            system_timestamp_100ns: self.clock.system_timestamp_100ns,
            counter_type: counter.counter_type,
            counter_timestamp: self.clock.counter_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> CategorySnapshot {
        let base = CounterDefinition {
            name_id: 11,
            help_id: 12,
            counter_type: CounterType::SampleBase,
            values: vec![100, 200],
            base: None,
        };
        let fraction = CounterDefinition {
            name_id: 9,
            help_id: 10,
            counter_type: CounterType::SampleFraction,
            values: vec![5, 7],
            base: Some(Box::new(base)),
        };
        let long_name = "x".repeat(127);

        CategorySnapshot {
            object_id: 4,
            clock: SnapshotClock {
                system_frequency: 1000,
                ..SnapshotClock::default()
            },
            multi_instance: true,
            counters: [(9, fraction)].into_iter().collect(),
            instances: [("a".to_string(), 0), (long_name.clone(), 1)]
                .into_iter()
                .collect(),
            instance_order: vec!["a".to_string(), long_name],
            max_instance_name_len: 127,
            disposed: AtomicBool::new(false),
            buffer: Mutex::new(Some(RawSnapshot::new(vec![1u8, 2, 3]))),
        }
    }

    #[test]
    fn test_sample_pairs_base_at_same_index() {
        let snapshot = snapshot();
        let sample = snapshot.sample(9, "a").unwrap();
        assert_eq!(sample.raw_value, 5);
        assert_eq!(sample.base_value, 100);
        assert_eq!(sample.system_frequency, 1000);
        assert_eq!(sample.counter_type, CounterType::SampleFraction);
    }

    #[test]
    fn test_base_counter_lookup() {
        let snapshot = snapshot();
        assert!(snapshot.counter(11).is_none());
        let base = snapshot.sample(11, "a").unwrap();
        assert_eq!(base.raw_value, 100);
        assert_eq!(base.base_value, 0);
        assert!(matches!(
            snapshot.sample(99, "a"),
            Err(Error::CounterIdNotFound { object_id: 4, counter_id: 99 })
        ));
    }

    #[test]
    fn test_long_instance_name_truncated() {
        let snapshot = snapshot();
        let long = "x".repeat(200);
        assert_eq!(snapshot.sample(9, &long).unwrap().raw_value, 7);
        assert!(matches!(
            snapshot.sample(9, "missing"),
            Err(Error::InstanceNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_dispose_once() {
        let snapshot = snapshot();
        assert_eq!(snapshot.raw().unwrap().len(), 3);
        assert!(snapshot.dispose());
        assert!(!snapshot.dispose());
        assert!(snapshot.is_disposed());
        assert!(matches!(snapshot.sample(9, "a"), Err(Error::Disposed)));
        assert!(matches!(snapshot.raw(), Err(Error::Disposed)));
    }

    #[test]
    fn test_disposed_snapshot_has_no_instances() {
        let snapshot = snapshot();
        assert_eq!(snapshot.instance_index("a").unwrap(), 0);
        snapshot.dispose();
        assert!(matches!(snapshot.instance_index("a"), Err(Error::Disposed)));
        assert!(!snapshot.instance_exists("a"));
    }

    #[test]
    fn test_read_all() {
        let snapshot = snapshot();
        let all = snapshot.read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&9]["a"].raw_value, 5);
        assert_eq!(all[&9].len(), 2);
    }
}
