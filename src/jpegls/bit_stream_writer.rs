use crate::byte_stream::ByteSink;
use crate::error::JpeglsError;
use crate::jpeg_marker_code::JPEG_MARKER_START_BYTE;
use log::trace;
use std::io::Write;

/// Size of the intermediate buffer used when the destination is a stream.
const STREAM_BUFFER_SIZE: usize = 4000;

/// Packs variable length codes MSB first into bytes, inserting a zero bit after every
/// 0xFF byte so that no marker can appear inside the entropy coded data (ITU-T T.87, A.1).
///
/// Bytes go straight into the sink's buffer or stream; the caller accounts for them
/// with [`ByteSink::seek`] once the scan is complete.
pub struct BitStreamWriter<'s, 'a> {
    sink: &'s mut ByteSink<'a>,
    stream_buffer: Vec<u8>,
    position: usize,
    compressed_length: usize,
    bytes_written: usize,
    bit_buffer: u32,
    free_bit_count: i32,
    is_ff_written: bool,
}

impl<'s, 'a> BitStreamWriter<'s, 'a> {
    pub fn new(sink: &'s mut ByteSink<'a>) -> Self {
        let (stream_buffer, position, compressed_length) = match sink {
            ByteSink::Buffer { data, position } => (Vec::new(), *position, data.len() - *position),
            ByteSink::Stream { .. } => (vec![0; STREAM_BUFFER_SIZE], 0, STREAM_BUFFER_SIZE),
        };

        Self {
            sink,
            stream_buffer,
            position,
            compressed_length,
            bytes_written: 0,
            bit_buffer: 0,
            free_bit_count: 32,
            is_ff_written: false,
        }
    }

    /// Appends the `bit_count` low bits of `bits`; the other bits of `bits` must be zero.
    pub fn append_to_bit_stream(&mut self, bits: u32, bit_count: i32) -> Result<(), JpeglsError> {
        debug_assert!((0..32).contains(&bit_count));
        debug_assert!(bit_count == 31 || bits >> bit_count == 0);

        self.free_bit_count -= bit_count;
        if self.free_bit_count >= 0 {
            self.bit_buffer |= shift_left(bits, self.free_bit_count);
            return Ok(());
        }

        self.bit_buffer |= bits >> -self.free_bit_count;
        self.flush()?;

        // An 0xFF costs an extra bit, so one flush may not make room for everything.
        if self.free_bit_count < 0 {
            self.bit_buffer |= bits >> -self.free_bit_count;
            self.flush()?;
        }

        debug_assert!(self.free_bit_count >= 0);
        self.bit_buffer |= shift_left(bits, self.free_bit_count);
        Ok(())
    }

    pub fn append_ones_to_bit_stream(&mut self, bit_count: i32) -> Result<(), JpeglsError> {
        self.append_to_bit_stream((1u32 << bit_count) - 1, bit_count)
    }

    /// Pads the last byte with zero bits and pushes every pending byte to the sink.
    pub fn end_scan(&mut self) -> Result<(), JpeglsError> {
        self.flush()?;

        // After an 0xFF the flush inserts the stuffed zero bit itself.
        if self.is_ff_written {
            self.append_to_bit_stream(0, (self.free_bit_count - 1) % 8)?;
        } else {
            self.append_to_bit_stream(0, self.free_bit_count % 8)?;
        }

        self.flush()?;
        debug_assert_eq!(self.free_bit_count, 32);

        if matches!(self.sink, ByteSink::Buffer { .. }) {
            Ok(())
        } else {
            self.overflow()
        }
    }

    /// Number of bytes produced so far, counting partially filled bytes.
    pub fn length(&self) -> usize {
        (self.bytes_written as i64 - ((self.free_bit_count - 32) / 8) as i64) as usize
    }

    pub fn free_bit_count(&self) -> i32 {
        self.free_bit_count
    }

    fn flush(&mut self) -> Result<(), JpeglsError> {
        if self.compressed_length < 4 {
            self.overflow()?;
        }

        for _ in 0..4 {
            if self.free_bit_count >= 32 {
                self.free_bit_count = 32;
                break;
            }

            let value = if self.is_ff_written {
                let value = (self.bit_buffer >> 25) as u8;
                self.bit_buffer <<= 7;
                self.free_bit_count += 7;
                value
            } else {
                let value = (self.bit_buffer >> 24) as u8;
                self.bit_buffer <<= 8;
                self.free_bit_count += 8;
                value
            };

            self.put_byte(value);
            self.is_ff_written = value == JPEG_MARKER_START_BYTE;
            self.position += 1;
            self.compressed_length -= 1;
            self.bytes_written += 1;
        }
        Ok(())
    }

    fn put_byte(&mut self, value: u8) {
        match &mut *self.sink {
            ByteSink::Buffer { data, .. } => data[self.position] = value,
            ByteSink::Stream { .. } => self.stream_buffer[self.position] = value,
        }
    }

    fn overflow(&mut self) -> Result<(), JpeglsError> {
        let ByteSink::Stream { stream, .. } = &mut *self.sink else {
            return Err(JpeglsError::CompressedBufferTooSmall);
        };

        trace!("writing {} bytes of scan data to the stream", self.position);
        stream
            .write_all(&self.stream_buffer[..self.position])
            .map_err(|_| JpeglsError::CompressedBufferTooSmall)?;
        self.position = 0;
        self.compressed_length = self.stream_buffer.len();
        Ok(())
    }
}

fn shift_left(bits: u32, count: i32) -> u32 {
    bits.checked_shl(count as u32).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_are_packed_msb_first() {
        let mut buffer = [0u8; 16];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        writer.append_to_bit_stream(0b101, 3).unwrap();
        writer.append_to_bit_stream(0b1, 1).unwrap();
        writer.append_to_bit_stream(0b0110, 4).unwrap();
        writer.append_to_bit_stream(0b11, 2).unwrap();
        writer.end_scan().unwrap();
        assert_eq!(writer.length(), 2);
        assert_eq!(writer.free_bit_count(), 32);
        assert_eq!(sink.bytes_written(), 0);
        drop(sink);
        assert_eq!(&buffer[..2], &[0b1011_0110, 0b1100_0000]);
    }

    #[test]
    fn test_zero_bit_is_stuffed_after_ff() {
        let mut buffer = [0u8; 16];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        writer.append_ones_to_bit_stream(8).unwrap();
        writer.append_ones_to_bit_stream(7).unwrap();
        writer.end_scan().unwrap();
        let length = writer.length();
        drop(sink);
        assert_eq!(&buffer[..length], &[0xFF, 0x7F]);
    }

    #[test]
    fn test_ff_at_end_of_scan_gets_a_padding_byte() {
        let mut buffer = [0u8; 16];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        writer.append_ones_to_bit_stream(8).unwrap();
        writer.end_scan().unwrap();
        let length = writer.length();
        drop(sink);
        assert_eq!(&buffer[..length], &[0xFF, 0x00]);
    }

    #[test]
    fn test_no_ff_byte_is_followed_by_a_byte_with_high_bit() {
        let mut buffer = [0u8; 256];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        for _ in 0..100 {
            writer.append_ones_to_bit_stream(13).unwrap();
        }
        writer.end_scan().unwrap();
        let length = writer.length();
        drop(sink);
        for pair in buffer[..length].windows(2) {
            if pair[0] == 0xFF {
                assert!(pair[1] < 0x80);
            }
        }
    }

    #[test]
    fn test_small_buffer_overflows() {
        let mut buffer = [0u8; 3];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        let result = (0..10).try_for_each(|_| writer.append_to_bit_stream(0x55, 8));
        assert_eq!(result, Err(JpeglsError::CompressedBufferTooSmall));
    }

    #[test]
    fn test_stream_output_larger_than_internal_buffer() {
        let mut output = Vec::new();
        let mut sink = ByteSink::from_stream(&mut output);
        let mut writer = BitStreamWriter::new(&mut sink);
        for i in 0..10_000u32 {
            writer.append_to_bit_stream(i & 0x7F, 8).unwrap();
        }
        writer.end_scan().unwrap();
        assert_eq!(writer.length(), 10_000);
        drop(sink);
        assert_eq!(output.len(), 10_000);
        assert_eq!(output[300], 300u32 as u8 & 0x7F);
    }
}
