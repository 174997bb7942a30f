//! Category catalog.

use perfsnap_format::{COUNTER_DESCRIPTOR_SIZE, CounterDescriptor, DataBlockHeader, ObjectHeader};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::Result;
use crate::decoder::check_fits;
use crate::names::NameTable;
use crate::snapshot::RawSnapshot;

/// Name and help ids of one category and its counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryEntry {
    pub name: String,
    pub object_id: u32,
    pub help_id: u32,
    /// Counter name ids in snapshot order, adjacent duplicates removed.
    pub counter_ids: Vec<u32>,
    /// Help ids, index-aligned with `counter_ids`.
    pub counter_help_ids: Vec<u32>,
}

impl CategoryEntry {
    /// Position of the counter called `name`.
    pub fn counter_position(&self, names: &NameTable, name: &str) -> Option<usize> {
        self.counter_ids
            .iter()
            .position(|&id| names.get(id).is_some_and(|text| same_name(text, name)))
    }
}

/// Every category of a global snapshot, keyed case-insensitively by name.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: FxHashMap<String, CategoryEntry>,
}

impl Catalog {
    /// Walk every object of `raw`. Objects without a name in `names` are skipped.
    pub fn read(raw: &RawSnapshot, names: &NameTable) -> Result<Self> {
        let full = raw.as_bytes();
        let header = DataBlockHeader::parse(full)?;
        let end = header.end(full);
        let data = &full[..end];

        let mut entries = FxHashMap::default();
        let mut offset = header.header_length as usize;
        for index in 0..header.object_type_count {
            if offset >= end {
                warn!(
                    declared = header.object_type_count,
                    found = index,
                    "snapshot declares more objects than it holds"
                );
                break;
            }
            let object = ObjectHeader::parse(data, offset)?;
            let next = object.next(offset)?;

            let declared = object.counter_count as usize;
            let mut cursor = object.first_counter(offset)?;
            check_fits(
                cursor,
                next.min(end),
                declared,
                COUNTER_DESCRIPTOR_SIZE,
                "counter count",
            )?;

            let mut counter_ids = Vec::with_capacity(declared);
            let mut counter_help_ids = Vec::with_capacity(declared);
            for _ in 0..object.counter_count {
                let descriptor = CounterDescriptor::parse(data, cursor)?;
                if counter_ids.last() != Some(&descriptor.name_id) {
                    counter_ids.push(descriptor.name_id);
                    counter_help_ids.push(descriptor.help_id);
                }
                cursor = descriptor.next(cursor)?;
            }

            match names.get(object.object_id) {
                Some(name) => {
                    entries.insert(
                        key(name),
                        CategoryEntry {
                            name: name.to_string(),
                            object_id: object.object_id,
                            help_id: object.help_id,
                            counter_ids,
                            counter_help_ids,
                        },
                    );
                }
                None => debug!(object_id = object.object_id, "object without a name"),
            }
            offset = next;
        }

        debug!(categories = entries.len(), "catalog read");
        Ok(Self { entries })
    }

    pub fn get(&self, category: &str) -> Option<&CategoryEntry> {
        self.entries.get(&key(category))
    }

    pub fn contains(&self, category: &str) -> bool {
        self.entries.contains_key(&key(category))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CategoryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Case-insensitive name comparison.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use perfsnap_format::{
        CounterSpec, DATA_BLOCK_SIZE, FormatError, OT_NUM_COUNTERS, ObjectBuilder,
        PERF_100NSEC_TIMER, PERF_COUNTER_RAWCOUNT, SnapshotBuilder,
    };

    fn names() -> NameTable {
        [(230, "Process"), (238, "Processor"), (6, "% Processor Time"), (8, "Threads")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_catalog_dedups_and_keys_case_insensitively() {
        let data = SnapshotBuilder::new()
            .object(
                ObjectBuilder::new(238)
                    .counter(CounterSpec::new(6, PERF_100NSEC_TIMER))
                    .counter(CounterSpec::new(6, PERF_100NSEC_TIMER))
                    .counter(CounterSpec::new(8, PERF_COUNTER_RAWCOUNT)),
            )
            .object(ObjectBuilder::new(230).counter(CounterSpec::new(8, PERF_COUNTER_RAWCOUNT)))
            .object(ObjectBuilder::new(999))
            .build();

        let catalog = Catalog::read(&RawSnapshot::from(data), &names()).unwrap();
        assert_eq!(catalog.len(), 2);

        let processor = catalog.get("PROCESSOR").unwrap();
        assert_eq!(processor.object_id, 238);
        assert_eq!(processor.help_id, 239);
        assert_eq!(processor.counter_ids, vec![6, 8]);
        assert_eq!(processor.counter_help_ids, vec![7, 9]);
        assert_eq!(processor.counter_position(&names(), "threads"), Some(1));
        assert!(catalog.contains("process"));
    }

    #[test]
    fn test_catalog_stops_at_total_length() {
        let data = SnapshotBuilder::new()
            .object(ObjectBuilder::new(230))
            .object(ObjectBuilder::new(238))
            .declared_objects(4)
            .build();
        let catalog = Catalog::read(&RawSnapshot::from(data), &names()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_catalog_rejects_oversized_counter_count() {
        let mut data = SnapshotBuilder::new()
            .object(ObjectBuilder::new(230).counter(CounterSpec::new(8, PERF_COUNTER_RAWCOUNT)))
            .build();
        let field = DATA_BLOCK_SIZE + OT_NUM_COUNTERS;
        data[field..field + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        assert!(matches!(
            Catalog::read(&RawSnapshot::from(data), &names()),
            Err(Error::Decode(FormatError::InvalidLength { what: "counter count", .. }))
        ));
    }
}
