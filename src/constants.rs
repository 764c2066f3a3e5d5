pub const DEFAULT_RESET_THRESHOLD: i32 = 64; // Default RESET value as defined in ISO/IEC 14495-1, table C.2

pub const MINIMUM_COMPONENT_COUNT: i32 = 1;
pub const MAXIMUM_COMPONENT_COUNT: i32 = 255;
pub const MAXIMUM_COMPONENT_COUNT_IN_SCAN: i32 = 4;
pub const MINIMUM_BITS_PER_SAMPLE: i32 = 2;
pub const MAXIMUM_BITS_PER_SAMPLE: i32 = 16;
pub const MAXIMUM_NEAR_LOSSLESS: i32 = 255;
pub const MAXIMUM_WIDTH: u32 = u16::MAX as u32;
pub const MAXIMUM_HEIGHT: u32 = u16::MAX as u32;

// Number of regular mode contexts: (9 * 9 * 9 + 1) / 2, one per sign-mirrored gradient triple.
pub const REGULAR_CONTEXT_COUNT: usize = 365;

// Upper bound on the Golomb parameter search; valid streams stay well below it.
pub const MAX_K_VALUE: i32 = 31;

// Largest magnitude a decoded error value may have (16 bit samples).
pub const MAXIMUM_ERROR_VALUE: i32 = 65535;

// Sample interleaved scans handle at most this many components per pixel.
pub const MAXIMUM_SAMPLES_PER_PIXEL: usize = 4;

// The special value to indicate that the stride should be calculated.
pub const AUTO_CALCULATE_STRIDE: usize = 0;

// The size in bytes of the segment length field.
pub const SEGMENT_LENGTH_SIZE: usize = 2;

// The maximum size of the data bytes that fit in a segment.
pub const SEGMENT_MAX_DATA_SIZE: usize = u16::MAX as usize - SEGMENT_LENGTH_SIZE;

// Tag of the HP colour transformation APP8 segment.
pub const COLOR_TRANSFORMATION_TAG: [u8; 4] = *b"mrfx";

// Run length order table, ISO/IEC 14495-1, A.7.1.2, table A.1.
pub const J: [i32; 32] = [
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];
