use crate::FrameInfo;
use crate::byte_stream::{ByteSource, ReadSeek};
use crate::error::JpeglsError;
use crate::jpeg_stream_reader::JpegStreamReader;
use crate::jpegls::JlsParameters;

/// Decodes JPEG-LS codestreams from a buffer or a seekable stream.
pub struct JpeglsDecoder<'a> {
    reader: JpegStreamReader<'a>,
}

impl<'a> JpeglsDecoder<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            reader: JpegStreamReader::new(ByteSource::Buffer(source)),
        }
    }

    /// Decodes from `source`; after [`Self::decode`] the stream is positioned just past EOI.
    pub fn from_stream(source: &'a mut dyn ReadSeek) -> Self {
        Self {
            reader: JpegStreamReader::new(ByteSource::Stream(source)),
        }
    }

    /// Reads the segments up to the first scan, which makes the image parameters available.
    pub fn read_header(&mut self) -> Result<(), JpeglsError> {
        self.reader.read_header()
    }

    pub fn parameters(&self) -> JlsParameters {
        self.reader.parameters()
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.reader.frame_info()
    }

    pub fn set_stride(&mut self, stride: usize) {
        self.reader.set_stride(stride);
    }

    /// Size in bytes of the buffer [`Self::decode`] needs; call [`Self::read_header`] first.
    pub fn destination_size(&self) -> usize {
        self.reader.destination_size()
    }

    pub fn decode(&mut self, destination: &mut [u8]) -> Result<(), JpeglsError> {
        self.reader.read(destination)
    }

    pub fn decode_to_vec(&mut self) -> Result<Vec<u8>, JpeglsError> {
        self.read_header()?;
        let mut destination = vec![0u8; self.destination_size()];
        self.decode(&mut destination)?;
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpegls::{InterleaveMode, JpeglsEncoder};
    use std::io::{Cursor, Seek};

    fn encode(frame_info: FrameInfo, interleave_mode: InterleaveMode, pixels: &[u8]) -> Vec<u8> {
        let mut encoder = JpeglsEncoder::default();
        encoder.set_frame_info(frame_info).unwrap();
        encoder.set_interleave_mode(interleave_mode);
        encoder.encode_to_vec(pixels).unwrap()
    }

    #[test]
    fn test_read_header_reports_frame() {
        let frame_info = FrameInfo {
            width: 5,
            height: 3,
            bits_per_sample: 12,
            component_count: 3,
        };
        let encoded = encode(frame_info, InterleaveMode::Sample, &[0; 90]);

        let mut decoder = JpeglsDecoder::new(&encoded);
        decoder.read_header().unwrap();
        assert_eq!(decoder.frame_info(), frame_info);
        assert_eq!(decoder.parameters().interleave_mode, InterleaveMode::Sample);
        assert_eq!(decoder.destination_size(), 90);
    }

    #[test]
    fn test_decode_with_padded_stride() {
        let frame_info = FrameInfo {
            width: 3,
            height: 2,
            bits_per_sample: 8,
            component_count: 1,
        };
        let pixels = [10, 20, 30, 40, 50, 60];
        let encoded = encode(frame_info, InterleaveMode::None, &pixels);

        let mut decoder = JpeglsDecoder::new(&encoded);
        decoder.set_stride(5);
        decoder.read_header().unwrap();
        assert_eq!(decoder.destination_size(), 10);

        let mut destination = vec![0xEE; 10];
        decoder.decode(&mut destination).unwrap();
        assert_eq!(destination, vec![10, 20, 30, 0xEE, 0xEE, 40, 50, 60, 0xEE, 0xEE]);
    }

    #[test]
    fn test_destination_too_small() {
        let frame_info = FrameInfo {
            width: 4,
            height: 4,
            bits_per_sample: 8,
            component_count: 2,
        };
        let encoded = encode(frame_info, InterleaveMode::None, &[3; 32]);
        let mut decoder = JpeglsDecoder::new(&encoded);
        let mut destination = vec![0; 31];
        assert_eq!(decoder.decode(&mut destination), Err(JpeglsError::UncompressedBufferTooSmall));
    }

    #[test]
    fn test_stream_is_left_after_end_of_image() {
        let frame_info = FrameInfo {
            width: 8,
            height: 8,
            bits_per_sample: 8,
            component_count: 1,
        };
        let pixels: Vec<u8> = (0..64).map(|i| (i * 37 % 256) as u8).collect();
        let mut data = encode(frame_info, InterleaveMode::None, &pixels);
        let encoded_length = data.len() as u64;
        data.extend_from_slice(b"trailer");

        let mut cursor = Cursor::new(data);
        let decoded = JpeglsDecoder::from_stream(&mut cursor).decode_to_vec().unwrap();
        assert_eq!(decoded, pixels);
        assert_eq!(cursor.stream_position().unwrap(), encoded_length);
    }
}
