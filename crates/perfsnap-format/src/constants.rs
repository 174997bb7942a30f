//! winperf.h layout constants.

// PERF_DATA_BLOCK
pub const DATA_BLOCK_SIZE: usize = 88;
pub const DATA_BLOCK_SIGNATURE: [u8; 8] = *b"P\0E\0R\0F\0"; // L"PERF"
pub const DB_LITTLE_ENDIAN: usize = 8;
pub const DB_VERSION: usize = 12;
pub const DB_REVISION: usize = 16;
pub const DB_TOTAL_BYTE_LENGTH: usize = 20;
pub const DB_HEADER_LENGTH: usize = 24;
pub const DB_NUM_OBJECT_TYPES: usize = 28;
pub const DB_DEFAULT_OBJECT: usize = 32;
pub const DB_SYSTEM_TIME: usize = 36; // SYSTEMTIME, 16 bytes, then 4 bytes padding
pub const DB_PERF_TIME: usize = 56;
pub const DB_PERF_FREQ: usize = 64;
pub const DB_PERF_TIME_100NS: usize = 72;
pub const DB_SYSTEM_NAME_LENGTH: usize = 80;
pub const DB_SYSTEM_NAME_OFFSET: usize = 84;

// PERF_OBJECT_TYPE (the title pointers are DWORDs on 64-bit Windows)
pub const OBJECT_HEADER_SIZE: usize = 64;
pub const OT_TOTAL_BYTE_LENGTH: usize = 0;
pub const OT_DEFINITION_LENGTH: usize = 4;
pub const OT_HEADER_LENGTH: usize = 8;
pub const OT_NAME_TITLE_INDEX: usize = 12;
pub const OT_HELP_TITLE_INDEX: usize = 20;
pub const OT_DETAIL_LEVEL: usize = 28;
pub const OT_NUM_COUNTERS: usize = 32;
pub const OT_DEFAULT_COUNTER: usize = 36;
pub const OT_NUM_INSTANCES: usize = 40;
pub const OT_CODE_PAGE: usize = 44;
pub const OT_PERF_TIME: usize = 48;
pub const OT_PERF_FREQ: usize = 56;

/// `NumInstances` value of an object that has a single, unnamed instance.
pub const PERF_NO_INSTANCES: i32 = -1;

// PERF_COUNTER_DEFINITION
pub const COUNTER_DESCRIPTOR_SIZE: usize = 40;
pub const CD_BYTE_LENGTH: usize = 0;
pub const CD_NAME_TITLE_INDEX: usize = 4;
pub const CD_HELP_TITLE_INDEX: usize = 12;
pub const CD_DEFAULT_SCALE: usize = 20;
pub const CD_DETAIL_LEVEL: usize = 24;
pub const CD_COUNTER_TYPE: usize = 28;
pub const CD_COUNTER_SIZE: usize = 32;
pub const CD_COUNTER_OFFSET: usize = 36;

// PERF_INSTANCE_DEFINITION
pub const INSTANCE_HEADER_SIZE: usize = 24;
pub const ID_BYTE_LENGTH: usize = 0;
pub const ID_PARENT_OBJECT_TITLE_INDEX: usize = 4;
pub const ID_PARENT_OBJECT_INSTANCE: usize = 8;
pub const ID_UNIQUE_ID: usize = 12;
pub const ID_NAME_OFFSET: usize = 16;
pub const ID_NAME_LENGTH: usize = 20;

/// `UniqueID` value of instances identified by name.
pub const PERF_NO_UNIQUE_ID: i32 = -1;

// PERF_COUNTER_BLOCK
pub const COUNTER_BLOCK_HEADER_SIZE: usize = 4;

/// Raw value reported for a counter whose declared size is neither 4 nor 8.
pub const UNREADABLE_RAW_VALUE: i64 = -1;

// Counter type field bits
pub const PERF_SIZE_DWORD: u32 = 0x0000_0000;
pub const PERF_SIZE_LARGE: u32 = 0x0000_0100;
pub const PERF_SIZE_ZERO: u32 = 0x0000_0200;
pub const PERF_SIZE_VARIABLE_LEN: u32 = 0x0000_0300;
pub const PERF_SIZE_MASK: u32 = 0x0000_0300;
pub const PERF_TYPE_COUNTER: u32 = 0x0000_0400;
pub const PERF_DELTA_COUNTER: u32 = 0x0040_0000;
pub const PERF_DELTA_BASE: u32 = 0x0080_0000;
pub const PERF_INVERSE_COUNTER: u32 = 0x0100_0000;
pub const PERF_MULTI_COUNTER: u32 = 0x0200_0000;
pub const PERF_DISPLAY_NOSHOW: u32 = 0x4000_0000;

// Counter types
pub const PERF_COUNTER_RAWCOUNT_HEX: u32 = 0x0000_0000;
pub const PERF_COUNTER_LARGE_RAWCOUNT_HEX: u32 = 0x0000_0100;
pub const PERF_COUNTER_TEXT: u32 = 0x0000_0B00;
pub const PERF_COUNTER_RAWCOUNT: u32 = 0x0001_0000;
pub const PERF_COUNTER_LARGE_RAWCOUNT: u32 = 0x0001_0100;
pub const PERF_COUNTER_DELTA: u32 = 0x0040_0400;
pub const PERF_COUNTER_LARGE_DELTA: u32 = 0x0040_0500;
pub const PERF_SAMPLE_COUNTER: u32 = 0x0041_0400;
pub const PERF_COUNTER_QUEUELEN_TYPE: u32 = 0x0045_0400;
pub const PERF_COUNTER_LARGE_QUEUELEN_TYPE: u32 = 0x0045_0500;
pub const PERF_COUNTER_100NS_QUEUELEN_TYPE: u32 = 0x0055_0500;
pub const PERF_COUNTER_OBJ_TIME_QUEUELEN_TYPE: u32 = 0x0065_0500;
pub const PERF_COUNTER_COUNTER: u32 = 0x1041_0400;
pub const PERF_COUNTER_BULK_COUNT: u32 = 0x1041_0500;
pub const PERF_RAW_FRACTION: u32 = 0x2002_0400;
pub const PERF_LARGE_RAW_FRACTION: u32 = 0x2002_0500;
pub const PERF_COUNTER_TIMER: u32 = 0x2041_0500;
pub const PERF_PRECISION_SYSTEM_TIMER: u32 = 0x2047_0500;
pub const PERF_100NSEC_TIMER: u32 = 0x2051_0500;
pub const PERF_PRECISION_100NS_TIMER: u32 = 0x2057_0500;
pub const PERF_OBJ_TIME_TIMER: u32 = 0x2061_0500;
pub const PERF_PRECISION_OBJECT_TIMER: u32 = 0x2067_0500;
pub const PERF_SAMPLE_FRACTION: u32 = 0x20C2_0400;
pub const PERF_COUNTER_TIMER_INV: u32 = 0x2141_0500;
pub const PERF_100NSEC_TIMER_INV: u32 = 0x2151_0500;
pub const PERF_COUNTER_MULTI_TIMER: u32 = 0x2241_0500;
pub const PERF_100NSEC_MULTI_TIMER: u32 = 0x2251_0500;
pub const PERF_COUNTER_MULTI_TIMER_INV: u32 = 0x2341_0500;
pub const PERF_100NSEC_MULTI_TIMER_INV: u32 = 0x2351_0500;
pub const PERF_AVERAGE_TIMER: u32 = 0x3002_0400;
pub const PERF_ELAPSED_TIME: u32 = 0x3024_0500;
pub const PERF_COUNTER_NODATA: u32 = 0x4000_0200;
pub const PERF_AVERAGE_BULK: u32 = 0x4002_0500;
pub const PERF_SAMPLE_BASE: u32 = 0x4003_0401;
pub const PERF_AVERAGE_BASE: u32 = 0x4003_0402;
pub const PERF_RAW_BASE: u32 = 0x4003_0403;
pub const PERF_LARGE_RAW_BASE: u32 = 0x4003_0503;
pub const PERF_COUNTER_MULTI_BASE: u32 = 0x4203_0500;
pub const PERF_COUNTER_HISTOGRAM_TYPE: u32 = 0x8000_0000;

/// Base timestamp of the precision timers.
pub const PERF_PRECISION_TIMESTAMP: u32 = PERF_LARGE_RAW_BASE;
