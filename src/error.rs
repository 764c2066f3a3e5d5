use thiserror::Error;

/// Failure conditions reported by the JPEG-LS reader, writer and scan coders.
///
/// Every variant is terminal: the operation that produced it is aborted and no
/// partially decoded or encoded data should be trusted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpeglsError {
    // Structural stream errors
    #[error("JPEG marker start byte not found")]
    JpegMarkerStartByteNotFound = 1,
    #[error("Invalid compressed data")]
    InvalidData = 2,
    #[error("Unknown JPEG marker found")]
    UnknownJpegMarkerFound = 3,

    // Capability errors
    #[error("Encoding not supported")]
    EncodingNotSupported = 10,
    #[error("Parameter value not supported")]
    ParameterValueNotSupported = 11,
    #[error("Image type not supported")]
    ImageTypeNotSupported = 12,

    // Sizing errors
    #[error("Compressed buffer too small")]
    CompressedBufferTooSmall = 20,
    #[error("Uncompressed buffer too small")]
    UncompressedBufferTooSmall = 21,

    // Parameter validity errors
    #[error("Invalid JPEG-LS parameters")]
    InvalidJlsParameters = 30,
}
