//! Snapshot header structures.

use crate::constants::*;
use crate::read::{advance, bytes, read_i32, read_i64, read_u32, utf16_string};
use crate::{FormatError, Result};

/// `PERF_DATA_BLOCK`: the header at the start of every snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataBlockHeader {
    pub total_byte_length: u32,
    pub header_length: u32,
    pub object_type_count: u32,
    /// Ticks per second of `system_time` (`PerfFreq`).
    pub system_frequency: i64,
    /// High-resolution timestamp (`PerfTime`).
    pub system_time: i64,
    /// Timestamp in 100ns units (`PerfTime100nSec`).
    pub system_time_100ns: i64,
}

impl DataBlockHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        bytes(data, 0, DATA_BLOCK_SIZE)?;

        let header = Self {
            total_byte_length: read_u32(data, DB_TOTAL_BYTE_LENGTH)?,
            header_length: read_u32(data, DB_HEADER_LENGTH)?,
            object_type_count: read_u32(data, DB_NUM_OBJECT_TYPES)?,
            system_frequency: read_i64(data, DB_PERF_FREQ)?,
            system_time: read_i64(data, DB_PERF_TIME)?,
            system_time_100ns: read_i64(data, DB_PERF_TIME_100NS)?,
        };

        if (header.header_length as usize) < DATA_BLOCK_SIZE {
            return Err(FormatError::InvalidLength {
                what: "data block header",
                offset: DB_HEADER_LENGTH,
                length: u64::from(header.header_length),
            });
        }

        Ok(header)
    }

    /// End of the object area: `TotalByteLength`, clipped to the buffer.
    pub fn end(&self, data: &[u8]) -> usize {
        (self.total_byte_length as usize).min(data.len())
    }
}

/// `PERF_OBJECT_TYPE`: one category inside a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    pub total_byte_length: u32,
    pub definition_length: u32,
    pub header_length: u32,
    pub object_id: u32,
    pub help_id: u32,
    pub counter_count: u32,
    /// [`PERF_NO_INSTANCES`] for single-instance objects.
    pub instance_count: i32,
    pub counter_time: i64,
    pub counter_frequency: i64,
}

impl ObjectHeader {
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        bytes(data, offset, OBJECT_HEADER_SIZE)?;

        let header = Self {
            total_byte_length: read_u32(data, offset + OT_TOTAL_BYTE_LENGTH)?,
            definition_length: read_u32(data, offset + OT_DEFINITION_LENGTH)?,
            header_length: read_u32(data, offset + OT_HEADER_LENGTH)?,
            object_id: read_u32(data, offset + OT_NAME_TITLE_INDEX)?,
            help_id: read_u32(data, offset + OT_HELP_TITLE_INDEX)?,
            counter_count: read_u32(data, offset + OT_NUM_COUNTERS)?,
            instance_count: read_i32(data, offset + OT_NUM_INSTANCES)?,
            counter_time: read_i64(data, offset + OT_PERF_TIME)?,
            counter_frequency: read_i64(data, offset + OT_PERF_FREQ)?,
        };

        if (header.header_length as usize) < OBJECT_HEADER_SIZE {
            return Err(FormatError::InvalidLength {
                what: "object header",
                offset,
                length: u64::from(header.header_length),
            });
        }
        // A zero-length object would stall the object scan.
        if header.total_byte_length < header.header_length {
            return Err(FormatError::InvalidLength {
                what: "object",
                offset,
                length: u64::from(header.total_byte_length),
            });
        }
        if header.instance_count < PERF_NO_INSTANCES {
            return Err(FormatError::InvalidLength {
                what: "instance count",
                offset: offset + OT_NUM_INSTANCES,
                length: u64::from(header.instance_count.unsigned_abs()),
            });
        }

        Ok(header)
    }

    pub fn is_multi_instance(&self) -> bool {
        self.instance_count != PERF_NO_INSTANCES
    }

    /// Number of value slots each counter needs.
    pub fn slot_count(&self) -> usize {
        usize::try_from(self.instance_count).unwrap_or(1)
    }

    /// Offset of the next object in the snapshot.
    pub fn next(&self, offset: usize) -> Result<usize> {
        advance(offset, self.total_byte_length)
    }

    /// Offset of the first counter descriptor.
    pub fn first_counter(&self, offset: usize) -> Result<usize> {
        advance(offset, self.header_length)
    }
}

/// `PERF_COUNTER_DEFINITION`: layout and type of one counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterDescriptor {
    pub byte_length: u32,
    pub name_id: u32,
    pub help_id: u32,
    pub default_scale: i32,
    pub detail_level: u32,
    pub counter_type: u32,
    /// Value width in bytes.
    pub size: u32,
    /// Value position relative to the start of the counter block.
    pub offset: u32,
}

impl CounterDescriptor {
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        bytes(data, offset, COUNTER_DESCRIPTOR_SIZE)?;

        let descriptor = Self {
            byte_length: read_u32(data, offset + CD_BYTE_LENGTH)?,
            name_id: read_u32(data, offset + CD_NAME_TITLE_INDEX)?,
            help_id: read_u32(data, offset + CD_HELP_TITLE_INDEX)?,
            default_scale: read_i32(data, offset + CD_DEFAULT_SCALE)?,
            detail_level: read_u32(data, offset + CD_DETAIL_LEVEL)?,
            counter_type: read_u32(data, offset + CD_COUNTER_TYPE)?,
            size: read_u32(data, offset + CD_COUNTER_SIZE)?,
            offset: read_u32(data, offset + CD_COUNTER_OFFSET)?,
        };

        if (descriptor.byte_length as usize) < COUNTER_DESCRIPTOR_SIZE {
            return Err(FormatError::InvalidLength {
                what: "counter definition",
                offset,
                length: u64::from(descriptor.byte_length),
            });
        }

        Ok(descriptor)
    }

    pub fn next(&self, offset: usize) -> Result<usize> {
        advance(offset, self.byte_length)
    }
}

/// `PERF_INSTANCE_DEFINITION`: header of one named instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceHeader {
    pub byte_length: u32,
    /// Object id of the parent category, 0 if none.
    pub parent_object_id: u32,
    pub parent_instance: u32,
    pub unique_id: i32,
    pub name_offset: u32,
    /// Name size in bytes, including the terminating NUL.
    pub name_length: u32,
}

impl InstanceHeader {
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        bytes(data, offset, INSTANCE_HEADER_SIZE)?;

        let header = Self {
            byte_length: read_u32(data, offset + ID_BYTE_LENGTH)?,
            parent_object_id: read_u32(data, offset + ID_PARENT_OBJECT_TITLE_INDEX)?,
            parent_instance: read_u32(data, offset + ID_PARENT_OBJECT_INSTANCE)?,
            unique_id: read_i32(data, offset + ID_UNIQUE_ID)?,
            name_offset: read_u32(data, offset + ID_NAME_OFFSET)?,
            name_length: read_u32(data, offset + ID_NAME_LENGTH)?,
        };

        if (header.byte_length as usize) < INSTANCE_HEADER_SIZE {
            return Err(FormatError::InvalidLength {
                what: "instance definition",
                offset,
                length: u64::from(header.byte_length),
            });
        }

        Ok(header)
    }

    pub const fn has_parent(&self) -> bool {
        self.parent_object_id != 0
    }

    /// Instance name, read relative to the instance at `offset`.
    pub fn name(&self, data: &[u8], offset: usize) -> Result<String> {
        let start = advance(offset, self.name_offset)?;
        utf16_string(data, start, self.name_length as usize)
    }

    /// Offset of the counter block that follows this instance.
    pub fn counter_block(&self, offset: usize) -> Result<usize> {
        advance(offset, self.byte_length)
    }
}

/// `PERF_COUNTER_BLOCK`: prefix of every counter-value block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterBlock {
    pub byte_length: u32,
}

impl CounterBlock {
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let byte_length = read_u32(data, offset)?;
        if (byte_length as usize) < COUNTER_BLOCK_HEADER_SIZE {
            return Err(FormatError::InvalidLength {
                what: "counter block",
                offset,
                length: u64::from(byte_length),
            });
        }
        Ok(Self { byte_length })
    }

    pub fn next(&self, offset: usize) -> Result<usize> {
        advance(offset, self.byte_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CounterSpec, InstanceSpec, ObjectBuilder, SnapshotBuilder};

    #[test]
    fn test_data_block_fields() {
        let data = SnapshotBuilder::new()
            .system_frequency(10_000_000)
            .system_time(1234)
            .system_time_100ns(5678)
            .build();

        let header = DataBlockHeader::parse(&data).unwrap();
        assert_eq!(header.total_byte_length as usize, data.len());
        assert_eq!(header.header_length as usize, DATA_BLOCK_SIZE);
        assert_eq!(header.object_type_count, 0);
        assert_eq!(header.system_frequency, 10_000_000);
        assert_eq!(header.system_time, 1234);
        assert_eq!(header.system_time_100ns, 5678);
        assert_eq!(&data[..8], &DATA_BLOCK_SIGNATURE);
    }

    #[test]
    fn test_data_block_too_small() {
        assert!(matches!(
            DataBlockHeader::parse(&[0u8; 40]),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_object_and_instance_layout() {
        let data = SnapshotBuilder::new()
            .object(
                ObjectBuilder::new(230)
                    .help_id(231)
                    .counter_frequency(100)
                    .counter_time(42)
                    .counter(CounterSpec::new(6, PERF_100NSEC_TIMER))
                    .instance(InstanceSpec::new("0", vec![77]))
                    .instance(InstanceSpec::new("_Total", vec![88]).parent(238, 1)),
            )
            .build();

        let object = ObjectHeader::parse(&data, DATA_BLOCK_SIZE).unwrap();
        assert_eq!(object.object_id, 230);
        assert_eq!(object.help_id, 231);
        assert_eq!(object.counter_count, 1);
        assert_eq!(object.instance_count, 2);
        assert_eq!(object.counter_frequency, 100);
        assert_eq!(object.counter_time, 42);
        assert!(object.is_multi_instance());
        assert_eq!(object.next(DATA_BLOCK_SIZE).unwrap(), data.len());

        let cd_offset = object.first_counter(DATA_BLOCK_SIZE).unwrap();
        let counter = CounterDescriptor::parse(&data, cd_offset).unwrap();
        assert_eq!(counter.name_id, 6);
        assert_eq!(counter.counter_type, PERF_100NSEC_TIMER);
        assert_eq!(counter.size, 8);

        let first = counter.next(cd_offset).unwrap();
        let instance = InstanceHeader::parse(&data, first).unwrap();
        assert_eq!(instance.name(&data, first).unwrap(), "0");
        assert!(!instance.has_parent());

        let block_offset = instance.counter_block(first).unwrap();
        let block = CounterBlock::parse(&data, block_offset).unwrap();
        let second = block.next(block_offset).unwrap();
        let instance = InstanceHeader::parse(&data, second).unwrap();
        assert_eq!(instance.name(&data, second).unwrap(), "_Total");
        assert_eq!(instance.parent_object_id, 238);
        assert_eq!(instance.parent_instance, 1);
    }

    #[test]
    fn test_zero_length_object_rejected() {
        let mut data = SnapshotBuilder::new()
            .object(ObjectBuilder::new(2).counter(CounterSpec::new(4, PERF_COUNTER_RAWCOUNT)))
            .build();
        data[DATA_BLOCK_SIZE..DATA_BLOCK_SIZE + 4].copy_from_slice(&0u32.to_le_bytes());

        assert!(matches!(
            ObjectHeader::parse(&data, DATA_BLOCK_SIZE),
            Err(FormatError::InvalidLength { what: "object", .. })
        ));
    }
}
