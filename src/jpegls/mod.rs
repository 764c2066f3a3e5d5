//! JPEG-LS Implementation (ISO/IEC 14495-1 / ITU-T T.87)
//!
//! JPEG-LS is a low-complexity, high-performance lossless and near-lossless
//! image compression standard. It is particularly effective for medical
//! images and synthetic graphics.
//!
//! ## Features
//!
//! This module provides:
//! - `JpeglsEncoder`: encodes 2..16 bit images with 1..255 components, lossless or near-lossless,
//!   with optional custom LSE preset parameters and HP colour transformations.
//! - `JpeglsDecoder`: decodes non-interleaved, line-interleaved and sample-interleaved scans.
//!
//! ## Supported Image Types
//!
//! | Image Type | Interleave modes | Notes |
//! |------------|------------------|-------|
//! | Grayscale 2..16 bit | None | |
//! | 2 or 3 components | None, Line, Sample | HP1/HP2/HP3 for 3 components |
//! | 4 components | None, Line | Sample interleave is rejected |
//! | 5+ components | None | |
//!
//! Uncompressed buffers hold one byte per sample for bit depths up to 8 and two
//! little-endian bytes per sample above that. Non-interleaved images are stored
//! plane by plane, interleaved images pixel by pixel.

pub mod bit_stream_reader;
pub mod bit_stream_writer;
pub mod coding_parameters;
pub mod color_transform;
pub mod decoder;
pub mod encoder;
pub mod golomb_code;
pub mod process_line;
pub mod regular_mode_context;
pub mod run_mode_context;
pub mod scan_codec;
pub mod scan_decoder;
pub mod scan_encoder;
pub mod traits;

pub use coding_parameters::{CodingParameters, JlsParameters, JpeglsPcParameters};
pub use decoder::JpeglsDecoder;
pub use encoder::JpeglsEncoder;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Interleave mode for multi-component scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum InterleaveMode {
    /// No interleaving (non-interleaved).
    None = 0,
    /// Interleaved by line.
    Line = 1,
    /// Interleaved by sample.
    Sample = 2,
}

/// Color transformation for multi-component scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ColorTransformation {
    /// No color transformation.
    None = 0,
    /// HP1 color transformation.
    Hp1 = 1,
    /// HP2 color transformation.
    Hp2 = 2,
    /// HP3 color transformation.
    Hp3 = 3,
}

// Not derived: num_enum treats `#[default]` as the catch-all for unknown values.
impl Default for InterleaveMode {
    fn default() -> Self {
        Self::None
    }
}

impl Default for ColorTransformation {
    fn default() -> Self {
        Self::None
    }
}
