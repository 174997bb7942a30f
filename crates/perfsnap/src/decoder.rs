//! Snapshot decoder.
//!
//! Walks a [`RawSnapshot`] to the object block of one category and turns it
//! into a [`CategorySnapshot`]. Parent instance names come from a second
//! snapshot fetched through a [`SnapshotSource`].

use std::sync::atomic::AtomicBool;

use parking_lot::Mutex;
use perfsnap_calc::CounterType;
use perfsnap_format::{
    COUNTER_BLOCK_HEADER_SIZE, COUNTER_DESCRIPTOR_SIZE, CounterBlock, CounterDescriptor,
    DataBlockHeader, FormatError, INSTANCE_HEADER_SIZE, InstanceHeader, ObjectHeader,
    read_counter_value,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::metrics;
use crate::snapshot::{CategorySnapshot, CounterDefinition, RawSnapshot, SnapshotClock};
use crate::source::SnapshotSource;
use crate::{Error, Result};

/// Name registered for the only instance of a single-instance category.
pub const SINGLE_INSTANCE_NAME: &str = "systemdiagnosticsperfcounterlibsingleinstance";

/// Longest instance name the OS reports; longer lookups are retried truncated.
pub const MAX_INSTANCE_NAME_LEN: usize = 127;

/// Decoder options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Instance name of single-instance categories.
    pub single_instance_name: String,
    /// Length instance lookups fall back to.
    pub max_instance_name_len: usize,
    /// Prefix instance names with their parent instance name.
    pub parent_prefix: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            single_instance_name: SINGLE_INSTANCE_NAME.to_string(),
            max_instance_name_len: MAX_INSTANCE_NAME_LEN,
            parent_prefix: true,
        }
    }
}

impl DecodeOptions {
    pub fn with_single_instance_name(mut self, name: impl Into<String>) -> Self {
        self.single_instance_name = name.into();
        self
    }

    pub const fn with_max_instance_name_len(mut self, len: usize) -> Self {
        self.max_instance_name_len = len;
        self
    }

    pub const fn with_parent_prefix(mut self, enabled: bool) -> Self {
        self.parent_prefix = enabled;
        self
    }
}

/// Counter definition while its object is being decoded.
struct PendingCounter {
    descriptor: CounterDescriptor,
    counter_type: CounterType,
    values: Vec<i64>,
    /// Index of the kept base counter paired with this one.
    base: Option<usize>,
}

/// Decodes category snapshots.
#[derive(Clone, Copy)]
pub struct Decoder<'a> {
    options: &'a DecodeOptions,
    source: Option<&'a dyn SnapshotSource>,
}

impl<'a> Decoder<'a> {
    pub const fn new(options: &'a DecodeOptions) -> Self {
        Self {
            options,
            source: None,
        }
    }

    /// Use `source` to fetch parent snapshots.
    pub const fn with_source(mut self, source: &'a dyn SnapshotSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Decode the category with `object_id`.
    pub fn decode(&self, raw: &RawSnapshot, object_id: u32) -> Result<CategorySnapshot> {
        let result = self.decode_inner(raw, object_id);
        metrics::record_decode(raw.len(), result.is_ok());
        result
    }

    fn decode_inner(&self, raw: &RawSnapshot, object_id: u32) -> Result<CategorySnapshot> {
        let full = raw.as_bytes();
        let header = DataBlockHeader::parse(full)?;
        let data = &full[..header.end(full)];

        let mut snapshot = CategorySnapshot {
            object_id,
            clock: SnapshotClock {
                system_frequency: header.system_frequency,
                system_timestamp: header.system_time,
                system_timestamp_100ns: header.system_time_100ns,
                ..SnapshotClock::default()
            },
            multi_instance: false,
            counters: FxHashMap::default(),
            instances: FxHashMap::default(),
            instance_order: Vec::new(),
            max_instance_name_len: self.options.max_instance_name_len,
            disposed: AtomicBool::new(false),
            buffer: Mutex::new(Some(raw.clone())),
        };

        if header.object_type_count == 0 {
            debug!(object_id, "snapshot has no objects");
            return Ok(snapshot);
        }

        let offset = find_object(data, &header, object_id)?
            .ok_or(Error::CategoryNotFound { object_id })?;
        let object = ObjectHeader::parse(data, offset)?;
        let object_end = object.next(offset)?.min(data.len());
        snapshot.clock.counter_frequency = object.counter_frequency;
        snapshot.clock.counter_timestamp = object.counter_time;
        snapshot.multi_instance = object.is_multi_instance();

        let mut cursor = object.first_counter(offset)?;
        let mut counters = read_counters(data, &mut cursor, &object, object_end)?;

        if snapshot.multi_instance {
            self.read_instances(data, &mut cursor, &object, object_end, &mut counters, &mut snapshot)?;
        } else {
            CounterBlock::parse(data, cursor)?;
            for counter in &mut counters {
                counter
                    .values
                    .push(read_counter_value(data, cursor, &counter.descriptor)?);
            }
            snapshot
                .instances
                .insert(self.options.single_instance_name.clone(), 0);
        }

        snapshot.counters = assemble(counters);
        debug!(
            object_id,
            counters = snapshot.counters.len(),
            instances = snapshot.instance_order.len(),
            "decoded category"
        );
        Ok(snapshot)
    }

    fn read_instances(
        &self,
        data: &[u8],
        cursor: &mut usize,
        object: &ObjectHeader,
        object_end: usize,
        counters: &mut [PendingCounter],
        snapshot: &mut CategorySnapshot,
    ) -> Result<()> {
        let count = object.slot_count();
        check_fits(
            *cursor,
            object_end,
            count,
            INSTANCE_HEADER_SIZE + COUNTER_BLOCK_HEADER_SIZE,
            "instance count",
        )?;

        let mut parents: FxHashMap<u32, Vec<String>> = FxHashMap::default();
        snapshot.instance_order.reserve(count);

        for index in 0..count {
            let instance = InstanceHeader::parse(data, *cursor)?;
            let mut name = instance.name(data, *cursor)?;

            if self.options.parent_prefix && instance.has_parent() {
                if let Some(parent) = self.parent_name(
                    &mut parents,
                    instance.parent_object_id,
                    instance.parent_instance,
                    object.object_id,
                )? {
                    name = format!("{parent}/{name}");
                }
            }

            let unique = unique_name(&snapshot.instances, &name);
            if unique != name {
                trace!(instance = %name, renamed = %unique, "duplicate instance name");
            }
            snapshot.instances.insert(unique.clone(), index);
            snapshot.instance_order.push(unique);

            let block = instance.counter_block(*cursor)?;
            for counter in counters.iter_mut() {
                counter
                    .values
                    .push(read_counter_value(data, block, &counter.descriptor)?);
            }
            *cursor = CounterBlock::parse(data, block)?.next(block)?;
        }
        Ok(())
    }

    /// Name of the parent instance, resolved from a freshly fetched snapshot.
    fn parent_name(
        &self,
        cache: &mut FxHashMap<u32, Vec<String>>,
        parent_id: u32,
        parent_index: u32,
        object_id: u32,
    ) -> Result<Option<String>> {
        if parent_id == object_id {
            warn!(object_id, "instance names its own category as parent");
            return Ok(None);
        }
        let Some(source) = self.source else {
            return Ok(None);
        };

        if !cache.contains_key(&parent_id) {
            debug!(parent_id, "fetching parent snapshot");
            metrics::record_parent_fetch();
            let raw = source.fetch(&parent_id.to_string())?;
            cache.insert(parent_id, object_instance_names(&raw, parent_id)?);
        }

        let names = cache.get(&parent_id).map_or(&[][..], Vec::as_slice);
        let index = parent_index as usize;
        // The last parent instance is never used as a prefix.
        Ok((index + 1 < names.len()).then(|| names[index].clone()))
    }
}

/// Raw instance names of `object_id` in `raw`.
///
/// Empty when the object is missing or single-instance. Names are not
/// disambiguated or parent-prefixed.
pub fn object_instance_names(raw: &RawSnapshot, object_id: u32) -> Result<Vec<String>> {
    let full = raw.as_bytes();
    let header = DataBlockHeader::parse(full)?;
    let data = &full[..header.end(full)];

    let Some(offset) = find_object(data, &header, object_id)? else {
        return Ok(Vec::new());
    };
    let object = ObjectHeader::parse(data, offset)?;
    if !object.is_multi_instance() {
        return Ok(Vec::new());
    }
    let object_end = object.next(offset)?.min(data.len());

    let mut cursor = object.first_counter(offset)?;
    for _ in 0..object.counter_count {
        cursor = CounterDescriptor::parse(data, cursor)?.next(cursor)?;
    }

    let count = object.slot_count();
    check_fits(
        cursor,
        object_end,
        count,
        INSTANCE_HEADER_SIZE + COUNTER_BLOCK_HEADER_SIZE,
        "instance count",
    )?;
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        let instance = InstanceHeader::parse(data, cursor)?;
        names.push(instance.name(data, cursor)?);
        let block = instance.counter_block(cursor)?;
        cursor = CounterBlock::parse(data, block)?.next(block)?;
    }
    Ok(names)
}

/// Offset of the object block with `object_id`.
///
/// Stops at the declared object count or the end of `data`, whichever
/// comes first.
pub(crate) fn find_object(
    data: &[u8],
    header: &DataBlockHeader,
    object_id: u32,
) -> Result<Option<usize>> {
    let mut offset = header.header_length as usize;
    for index in 0..header.object_type_count {
        if offset >= data.len() {
            warn!(
                declared = header.object_type_count,
                found = index,
                "snapshot declares more objects than it holds"
            );
            break;
        }
        let object = ObjectHeader::parse(data, offset)?;
        if object.object_id == object_id {
            return Ok(Some(offset));
        }
        offset = object.next(offset)?;
    }
    Ok(None)
}

/// Read the counter descriptors of `object`, dropping adjacent duplicates.
fn read_counters(
    data: &[u8],
    cursor: &mut usize,
    object: &ObjectHeader,
    object_end: usize,
) -> Result<Vec<PendingCounter>> {
    let declared = object.counter_count as usize;
    check_fits(*cursor, object_end, declared, COUNTER_DESCRIPTOR_SIZE, "counter count")?;

    let mut counters: Vec<PendingCounter> = Vec::with_capacity(declared);
    let mut last_value_counter: Option<usize> = None;

    for _ in 0..declared {
        let descriptor = CounterDescriptor::parse(data, *cursor)?;
        *cursor = descriptor.next(*cursor)?;

        if counters
            .last()
            .is_some_and(|prev| prev.descriptor.name_id == descriptor.name_id)
        {
            debug!(
                object_id = object.object_id,
                counter = descriptor.name_id,
                "dropping duplicate counter definition"
            );
            metrics::record_duplicate_counter();
            continue;
        }

        let counter_type = CounterType::from_code(descriptor.counter_type);
        let kept = counters.len();
        if counter_type.is_base() {
            match last_value_counter {
                Some(owner) => counters[owner].base = Some(kept),
                None => warn!(
                    object_id = object.object_id,
                    counter = descriptor.name_id,
                    "base counter without a preceding counter"
                ),
            }
        } else {
            last_value_counter = Some(kept);
        }

        counters.push(PendingCounter {
            descriptor,
            counter_type,
            // Filled one instance block at a time.
            values: Vec::new(),
            base: None,
        });
    }
    Ok(counters)
}

/// Register every non-base counter that carries data, with its base attached.
fn assemble(counters: Vec<PendingCounter>) -> FxHashMap<u32, CounterDefinition> {
    let definitions: Vec<CounterDefinition> = counters
        .iter()
        .map(|counter| CounterDefinition {
            name_id: counter.descriptor.name_id,
            help_id: counter.descriptor.help_id,
            counter_type: counter.counter_type,
            values: counter.values.clone(),
            base: None,
        })
        .collect();

    let mut table = FxHashMap::default();
    for (counter, mut definition) in counters.iter().zip(definitions.iter().cloned()) {
        if counter.counter_type.is_base() || counter.counter_type == CounterType::NoData {
            continue;
        }
        definition.base = counter
            .base
            .and_then(|index| definitions.get(index))
            .map(|base| Box::new(base.clone()));
        table.insert(definition.name_id, definition);
    }
    table
}

/// `name`, or `name#N` with the smallest free N.
fn unique_name(taken: &FxHashMap<String, usize>, name: &str) -> String {
    if !taken.contains_key(name) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}#{n}"))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Reject counts whose minimum encoded size cannot fit before `end`.
pub(crate) fn check_fits(
    offset: usize,
    end: usize,
    count: usize,
    min_size: usize,
    what: &'static str,
) -> Result<()> {
    let needed = count.saturating_mul(min_size);
    if end.saturating_sub(offset) < needed {
        return Err(FormatError::InvalidLength {
            what,
            offset,
            length: count as u64,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        let mut taken = FxHashMap::default();
        assert_eq!(unique_name(&taken, "proc"), "proc");
        taken.insert("proc".to_string(), 0);
        assert_eq!(unique_name(&taken, "proc"), "proc#1");
        taken.insert("proc#1".to_string(), 1);
        assert_eq!(unique_name(&taken, "proc"), "proc#2");
    }

    #[test]
    fn test_check_fits() {
        assert!(check_fits(0, 100, 2, 40, "counter count").is_ok());
        assert!(matches!(
            check_fits(0, 100, 3, 40, "counter count"),
            Err(Error::Decode(FormatError::InvalidLength { what: "counter count", .. }))
        ));
        assert!(check_fits(0, 100, usize::MAX, 40, "counter count").is_err());
    }

    #[test]
    fn test_default_options() {
        let options = DecodeOptions::default();
        assert_eq!(options.single_instance_name, SINGLE_INSTANCE_NAME);
        assert_eq!(options.max_instance_name_len, 127);
        assert!(options.parent_prefix);
        assert!(!options.with_parent_prefix(false).parent_prefix);
    }
}
