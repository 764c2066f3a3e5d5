//! JPEG-LS (ISO/IEC 14495-1 / ITU-T T.87) lossless and near-lossless image codec.
//!
//! The crate is organised the way the standard is layered:
//!
//! - [`jpeg_stream_reader`] / [`jpeg_stream_writer`] / [`jpeg_segment`]: the JPEG marker
//!   segment container (SOI, SOF55, LSE, APPn, COM, SOS, EOI).
//! - [`jpegls`]: the context model, Golomb-Rice coding, the bit stream engine with
//!   0xFF bit stuffing and the scan encoder/decoder, plus the public
//!   [`JpeglsEncoder`] and [`JpeglsDecoder`].
//! - [`byte_stream`]: the in-memory buffer / `std::io` stream abstraction both sides use.
//!
//! ```no_run
//! use jpegls_rs::{FrameInfo, JpeglsDecoder, JpeglsEncoder};
//!
//! let pixels = vec![0u8; 64 * 64];
//! let mut encoder = JpeglsEncoder::default();
//! encoder.set_frame_info(FrameInfo { width: 64, height: 64, bits_per_sample: 8, component_count: 1 })?;
//! let encoded = encoder.encode_to_vec(&pixels)?;
//!
//! let mut decoder = JpeglsDecoder::new(&encoded);
//! let decoded = decoder.decode_to_vec()?;
//! assert_eq!(decoded, pixels);
//! # Ok::<(), jpegls_rs::JpeglsError>(())
//! ```

pub mod byte_stream;
pub mod constants;
pub mod error;
pub mod jpeg_marker_code;
pub mod jpeg_segment;
pub mod jpeg_stream_reader;
pub mod jpeg_stream_writer;
pub mod jpegls;

pub use error::JpeglsError;
pub use jpegls::coding_parameters::{CodingParameters, JlsParameters, JpeglsPcParameters};
pub use jpegls::{ColorTransformation, InterleaveMode, JpeglsDecoder, JpeglsEncoder};

/// Basic description of an image frame, as carried by the SOF55 segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: i32,
    pub component_count: i32,
}

impl FrameInfo {
    /// Number of bytes a single sample occupies in an uncompressed buffer.
    pub fn bytes_per_sample(&self) -> usize {
        if self.bits_per_sample <= 8 { 1 } else { 2 }
    }
}
