//! Snapshot encoder.
//!
//! Produces buffers with the exact layout the OS hands out, for replay
//! fixtures and tests. Counter blocks use one 8-byte slot per counter.

use crate::constants::*;

const VALUE_SLOT: usize = 8;
const FIRST_VALUE: usize = 8;
const PERF_DETAIL_NOVICE: u32 = 100;

/// One counter definition to encode.
#[derive(Clone, Debug)]
pub struct CounterSpec {
    pub name_id: u32,
    pub help_id: u32,
    pub counter_type: u32,
    pub size: u32,
}

impl CounterSpec {
    /// Counter whose value width follows the size bits of `counter_type`.
    pub const fn new(name_id: u32, counter_type: u32) -> Self {
        let size = match counter_type & PERF_SIZE_MASK {
            PERF_SIZE_DWORD => 4,
            PERF_SIZE_LARGE => 8,
            _ => 0,
        };
        Self {
            name_id,
            help_id: name_id + 1,
            counter_type,
            size,
        }
    }

    /// Override the declared value width.
    pub const fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub const fn help_id(mut self, help_id: u32) -> Self {
        self.help_id = help_id;
        self
    }
}

/// One named instance and its counter values.
#[derive(Clone, Debug)]
pub struct InstanceSpec {
    pub name: String,
    pub parent_object_id: u32,
    pub parent_instance: u32,
    /// Index-aligned with the object's counters; missing values encode as 0.
    pub values: Vec<i64>,
}

impl InstanceSpec {
    pub fn new(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            parent_object_id: 0,
            parent_instance: 0,
            values,
        }
    }

    pub const fn parent(mut self, object_id: u32, instance: u32) -> Self {
        self.parent_object_id = object_id;
        self.parent_instance = instance;
        self
    }
}

/// One object (category) to encode.
#[derive(Clone, Debug)]
pub struct ObjectBuilder {
    object_id: u32,
    help_id: u32,
    counter_frequency: i64,
    counter_time: i64,
    counters: Vec<CounterSpec>,
    instances: Option<Vec<InstanceSpec>>,
    values: Vec<i64>,
}

impl ObjectBuilder {
    /// Single-instance object until an instance is added.
    pub const fn new(object_id: u32) -> Self {
        Self {
            object_id,
            help_id: object_id + 1,
            counter_frequency: 0,
            counter_time: 0,
            counters: Vec::new(),
            instances: None,
            values: Vec::new(),
        }
    }

    pub const fn help_id(mut self, help_id: u32) -> Self {
        self.help_id = help_id;
        self
    }

    pub const fn counter_frequency(mut self, frequency: i64) -> Self {
        self.counter_frequency = frequency;
        self
    }

    pub const fn counter_time(mut self, time: i64) -> Self {
        self.counter_time = time;
        self
    }

    pub fn counter(mut self, counter: CounterSpec) -> Self {
        self.counters.push(counter);
        self
    }

    /// Mark the object multi-instance, even with no instances.
    pub fn multi_instance(mut self) -> Self {
        self.instances.get_or_insert_with(Vec::new);
        self
    }

    pub fn instance(mut self, instance: InstanceSpec) -> Self {
        self.instances.get_or_insert_with(Vec::new).push(instance);
        self
    }

    /// Values of a single-instance object.
    pub fn values(mut self, values: Vec<i64>) -> Self {
        self.values = values;
        self
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        let instance_count = self
            .instances
            .as_ref()
            .map_or(PERF_NO_INSTANCES, |list| list.len() as i32);

        let mut header = [0u8; OBJECT_HEADER_SIZE];
        let definition_length =
            OBJECT_HEADER_SIZE + self.counters.len() * COUNTER_DESCRIPTOR_SIZE;
        put_u32(&mut header, OT_DEFINITION_LENGTH, definition_length as u32);
        put_u32(&mut header, OT_HEADER_LENGTH, OBJECT_HEADER_SIZE as u32);
        put_u32(&mut header, OT_NAME_TITLE_INDEX, self.object_id);
        put_u32(&mut header, OT_HELP_TITLE_INDEX, self.help_id);
        put_u32(&mut header, OT_DETAIL_LEVEL, PERF_DETAIL_NOVICE);
        put_u32(&mut header, OT_NUM_COUNTERS, self.counters.len() as u32);
        put_i32(&mut header, OT_NUM_INSTANCES, instance_count);
        put_i64(&mut header, OT_PERF_TIME, self.counter_time);
        put_i64(&mut header, OT_PERF_FREQ, self.counter_frequency);
        out.extend_from_slice(&header);

        for (index, counter) in self.counters.iter().enumerate() {
            let mut cd = [0u8; COUNTER_DESCRIPTOR_SIZE];
            put_u32(&mut cd, CD_BYTE_LENGTH, COUNTER_DESCRIPTOR_SIZE as u32);
            put_u32(&mut cd, CD_NAME_TITLE_INDEX, counter.name_id);
            put_u32(&mut cd, CD_HELP_TITLE_INDEX, counter.help_id);
            put_u32(&mut cd, CD_DETAIL_LEVEL, PERF_DETAIL_NOVICE);
            put_u32(&mut cd, CD_COUNTER_TYPE, counter.counter_type);
            put_u32(&mut cd, CD_COUNTER_SIZE, counter.size);
            put_u32(&mut cd, CD_COUNTER_OFFSET, value_offset(index) as u32);
            out.extend_from_slice(&cd);
        }

        match &self.instances {
            None => self.encode_block(out, &self.values),
            Some(instances) => {
                for instance in instances {
                    encode_instance(out, instance);
                    self.encode_block(out, &instance.values);
                }
            }
        }

        let total = (out.len() - start) as u32;
        put_u32(&mut out[start..], OT_TOTAL_BYTE_LENGTH, total);
    }

    /// 4-byte counters keep the low 32 bits of their value.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn encode_block(&self, out: &mut Vec<u8>, values: &[i64]) {
        let mut block = vec![0u8; FIRST_VALUE + self.counters.len() * VALUE_SLOT];
        let length = block.len() as u32;
        put_u32(&mut block, 0, length);

        for (index, counter) in self.counters.iter().enumerate() {
            let value = values.get(index).copied().unwrap_or(0);
            let offset = value_offset(index);
            match counter.size {
                4 => put_u32(&mut block, offset, value as u32),
                8 => put_i64(&mut block, offset, value),
                _ => {}
            }
        }
        out.extend_from_slice(&block);
    }
}

/// A whole snapshot.
#[derive(Clone, Debug, Default)]
pub struct SnapshotBuilder {
    system_frequency: i64,
    system_time: i64,
    system_time_100ns: i64,
    objects: Vec<ObjectBuilder>,
    declared_objects: Option<u32>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn system_frequency(mut self, frequency: i64) -> Self {
        self.system_frequency = frequency;
        self
    }

    pub const fn system_time(mut self, time: i64) -> Self {
        self.system_time = time;
        self
    }

    pub const fn system_time_100ns(mut self, time: i64) -> Self {
        self.system_time_100ns = time;
        self
    }

    pub fn object(mut self, object: ObjectBuilder) -> Self {
        self.objects.push(object);
        self
    }

    /// Declare a different `NumObjectTypes` than the number of encoded objects.
    pub const fn declared_objects(mut self, count: u32) -> Self {
        self.declared_objects = Some(count);
        self
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; DATA_BLOCK_SIZE];
        out[..8].copy_from_slice(&DATA_BLOCK_SIGNATURE);
        put_u32(&mut out, DB_LITTLE_ENDIAN, 1);
        put_u32(&mut out, DB_VERSION, 1);
        put_u32(&mut out, DB_REVISION, 1);
        put_u32(&mut out, DB_HEADER_LENGTH, DATA_BLOCK_SIZE as u32);
        let declared = self
            .declared_objects
            .unwrap_or(self.objects.len() as u32);
        put_u32(&mut out, DB_NUM_OBJECT_TYPES, declared);
        put_i32(&mut out, DB_DEFAULT_OBJECT, -1);
        put_i64(&mut out, DB_PERF_TIME, self.system_time);
        put_i64(&mut out, DB_PERF_FREQ, self.system_frequency);
        put_i64(&mut out, DB_PERF_TIME_100NS, self.system_time_100ns);

        for object in &self.objects {
            object.encode(&mut out);
        }

        let total = out.len() as u32;
        put_u32(&mut out, DB_TOTAL_BYTE_LENGTH, total);
        out
    }
}

#[allow(clippy::cast_possible_truncation)]
fn encode_instance(out: &mut Vec<u8>, instance: &InstanceSpec) {
    let mut name: Vec<u8> = instance
        .name
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect();
    let name_length = name.len();
    name.resize(name_length.next_multiple_of(8), 0);

    let mut header = [0u8; INSTANCE_HEADER_SIZE];
    put_u32(
        &mut header,
        ID_BYTE_LENGTH,
        (INSTANCE_HEADER_SIZE + name.len()) as u32,
    );
    put_u32(&mut header, ID_PARENT_OBJECT_TITLE_INDEX, instance.parent_object_id);
    put_u32(&mut header, ID_PARENT_OBJECT_INSTANCE, instance.parent_instance);
    put_i32(&mut header, ID_UNIQUE_ID, PERF_NO_UNIQUE_ID);
    put_u32(&mut header, ID_NAME_OFFSET, INSTANCE_HEADER_SIZE as u32);
    put_u32(&mut header, ID_NAME_LENGTH, name_length as u32);

    out.extend_from_slice(&header);
    out.extend_from_slice(&name);
}

const fn value_offset(index: usize) -> usize {
    FIRST_VALUE + index * VALUE_SLOT
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_i64(buf: &mut [u8], offset: usize, value: i64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataBlockHeader, ObjectHeader, read_u32};

    #[test]
    fn test_counter_spec_size_from_type() {
        assert_eq!(CounterSpec::new(1, PERF_COUNTER_RAWCOUNT).size, 4);
        assert_eq!(CounterSpec::new(1, PERF_COUNTER_BULK_COUNT).size, 8);
        assert_eq!(CounterSpec::new(1, PERF_COUNTER_NODATA).size, 0);
        assert_eq!(CounterSpec::new(1, PERF_COUNTER_RAWCOUNT).size(8).size, 8);
    }

    #[test]
    fn test_declared_object_count() {
        let data = SnapshotBuilder::new()
            .object(ObjectBuilder::new(10))
            .declared_objects(4)
            .build();
        let header = DataBlockHeader::parse(&data).unwrap();
        assert_eq!(header.object_type_count, 4);
        assert_eq!(header.total_byte_length as usize, data.len());
    }

    #[test]
    fn test_single_instance_block_follows_descriptors() {
        let data = SnapshotBuilder::new()
            .object(
                ObjectBuilder::new(2)
                    .counter(CounterSpec::new(4, PERF_COUNTER_RAWCOUNT))
                    .values(vec![99]),
            )
            .build();
        let object = ObjectHeader::parse(&data, DATA_BLOCK_SIZE).unwrap();
        assert!(!object.is_multi_instance());

        let block = DATA_BLOCK_SIZE + OBJECT_HEADER_SIZE + COUNTER_DESCRIPTOR_SIZE;
        assert_eq!(read_u32(&data, block).unwrap(), 16);
        assert_eq!(read_u32(&data, block + FIRST_VALUE).unwrap(), 99);
    }

    #[test]
    fn test_narrow_counter_keeps_low_bits() {
        let data = SnapshotBuilder::new()
            .object(
                ObjectBuilder::new(2)
                    .counter(CounterSpec::new(4, PERF_COUNTER_RAWCOUNT))
                    .counter(CounterSpec::new(6, PERF_COUNTER_RAWCOUNT))
                    .values(vec![-1, 0x1_0000_0005]),
            )
            .build();
        let block = DATA_BLOCK_SIZE + OBJECT_HEADER_SIZE + 2 * COUNTER_DESCRIPTOR_SIZE;
        assert_eq!(read_u32(&data, block + value_offset(0)).unwrap(), u32::MAX);
        assert_eq!(read_u32(&data, block + value_offset(1)).unwrap(), 5);
    }
}
