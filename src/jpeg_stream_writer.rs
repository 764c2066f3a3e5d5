//! JPEG-LS codestream writer.
//!
//! `JpegStreamWriter` emits markers and big-endian fields into a [`ByteSink`] and
//! serializes a sequence of [`JpegSegment`]s between SOI and EOI.

use crate::byte_stream::ByteSink;
use crate::constants::{SEGMENT_LENGTH_SIZE, SEGMENT_MAX_DATA_SIZE};
use crate::error::JpeglsError;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode};
use crate::jpeg_segment::JpegSegment;
use log::trace;

pub struct JpegStreamWriter<'s, 'a> {
    sink: &'s mut ByteSink<'a>,
    start_position: usize,
}

impl<'s, 'a> JpegStreamWriter<'s, 'a> {
    pub fn new(sink: &'s mut ByteSink<'a>) -> Self {
        let start_position = sink.bytes_written();
        Self { sink, start_position }
    }

    /// Bytes written through this writer, including bytes a scan encoder produced directly.
    pub fn bytes_written(&self) -> usize {
        self.sink.bytes_written() - self.start_position
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), JpeglsError> {
        self.sink.write_bytes(&value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), JpeglsError> {
        self.sink.write_bytes(bytes)
    }

    pub fn write_marker(&mut self, marker: JpegMarkerCode) -> Result<(), JpeglsError> {
        self.write_bytes(&[JPEG_MARKER_START_BYTE, u8::from(marker)])
    }

    /// Writes a marker followed by the segment length and `payload`.
    pub fn write_segment(&mut self, marker: JpegMarkerCode, payload: &[u8]) -> Result<(), JpeglsError> {
        if payload.len() > SEGMENT_MAX_DATA_SIZE {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        trace!("writing {:?} segment, {} bytes", marker, payload.len() + SEGMENT_LENGTH_SIZE);
        self.write_marker(marker)?;
        self.write_u16((payload.len() + SEGMENT_LENGTH_SIZE) as u16)?;
        self.write_bytes(payload)
    }

    /// The sink scan encoders write entropy coded data into.
    pub fn output_stream(&mut self) -> &mut ByteSink<'a> {
        &mut *self.sink
    }

    /// Accounts for `count` bytes written directly into [`Self::output_stream`].
    pub fn seek(&mut self, count: usize) {
        self.sink.seek(count);
    }

    /// Writes a complete codestream: SOI, `segments` in order, then EOI.
    pub fn write_segments(&mut self, segments: &[JpegSegment]) -> Result<usize, JpeglsError> {
        self.write_marker(JpegMarkerCode::StartOfImage)?;
        for segment in segments {
            segment.serialize(self)?;
        }
        self.write_marker(JpegMarkerCode::EndOfImage)?;
        self.sink.flush()?;
        Ok(self.bytes_written())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg_segment::JpegMarkerSegment;

    #[test]
    fn test_write_segment_prefixes_length() {
        let mut buffer = [0u8; 8];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = JpegStreamWriter::new(&mut sink);
        writer.write_segment(JpegMarkerCode::Comment, b"abc").unwrap();
        assert_eq!(writer.bytes_written(), 7);
        assert_eq!(&buffer[..7], &[0xFF, 0xFE, 0x00, 0x05, b'a', b'b', b'c']);
    }

    #[test]
    fn test_write_segments_wraps_in_soi_and_eoi() {
        let mut output = Vec::new();
        let mut sink = ByteSink::from_stream(&mut output);
        let segments = [JpegSegment::Marker(JpegMarkerSegment::create_comment_segment(b"x"))];
        let length = JpegStreamWriter::new(&mut sink).write_segments(&segments).unwrap();
        assert_eq!(length, 9);
        drop(sink);
        assert_eq!(output, vec![0xFF, 0xD8, 0xFF, 0xFE, 0x00, 0x03, b'x', 0xFF, 0xD9]);
    }

    #[test]
    fn test_too_small_destination() {
        let mut buffer = [0u8; 3];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = JpegStreamWriter::new(&mut sink);
        assert_eq!(writer.write_segments(&[]), Err(JpeglsError::CompressedBufferTooSmall));
    }

    #[test]
    fn test_oversize_segment_is_rejected() {
        let payload = vec![0u8; SEGMENT_MAX_DATA_SIZE + 1];
        let mut output = Vec::new();
        let mut sink = ByteSink::from_stream(&mut output);
        let mut writer = JpegStreamWriter::new(&mut sink);
        assert_eq!(
            writer.write_segment(JpegMarkerCode::Comment, &payload),
            Err(JpeglsError::InvalidJlsParameters)
        );
    }
}
