use crate::byte_stream::ByteSource;
use crate::error::JpeglsError;
use crate::jpeg_marker_code::JPEG_MARKER_START_BYTE;
use log::trace;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

type Cache = u64;

const CACHE_BIT_COUNT: i32 = Cache::BITS as i32;
const MAX_READABLE_CACHE_BITS: i32 = CACHE_BIT_COUNT - 8;

/// Bytes kept in front of the read position when a stream buffer is refilled.
const STREAM_LOOK_BEHIND: usize = 16;
const STREAM_CHUNK_SIZE: usize = 4096;

/// Reads the entropy coded segment of a scan, removing the stuffed zero bit that follows
/// each 0xFF byte. Reading stops in front of the first marker (0xFF followed by a byte >= 0x80).
pub struct BitStreamReader<'s, 'a> {
    source: &'s mut ByteSource<'a>,
    stream_buffer: Vec<u8>,
    position: usize,
    end_position: usize,
    end_of_stream: bool,
    read_cache: Cache,
    valid_bits: i32,
}

impl<'s, 'a> BitStreamReader<'s, 'a> {
    pub fn new(source: &'s mut ByteSource<'a>) -> Result<Self, JpeglsError> {
        let end_position = match source {
            ByteSource::Buffer(data) => data.len(),
            ByteSource::Stream(_) => 0,
        };

        let mut reader = Self {
            source,
            stream_buffer: Vec::new(),
            position: 0,
            end_position,
            end_of_stream: false,
            read_cache: 0,
            valid_bits: 0,
        };
        reader.make_valid()?;
        Ok(reader)
    }

    pub fn valid_bits(&self) -> i32 {
        self.valid_bits
    }

    pub fn skip(&mut self, length: i32) {
        debug_assert!(length <= self.valid_bits);
        self.valid_bits -= length;
        self.read_cache = self.read_cache.checked_shl(length as u32).unwrap_or(0);
    }

    pub fn read_bit(&mut self) -> Result<bool, JpeglsError> {
        if self.valid_bits <= 0 {
            self.make_valid()?;
        }

        let set = self.read_cache & (1 << (CACHE_BIT_COUNT - 1)) != 0;
        self.skip(1);
        Ok(set)
    }

    /// Reads `length` (< 32) bits as an unsigned value.
    pub fn read_value(&mut self, length: i32) -> Result<i32, JpeglsError> {
        debug_assert!((0..32).contains(&length));
        if length == 0 {
            return Ok(0);
        }

        if self.valid_bits < length {
            self.make_valid()?;
            if self.valid_bits < length {
                return Err(JpeglsError::InvalidData);
            }
        }

        let result = (self.read_cache >> (CACHE_BIT_COUNT - length)) as i32;
        self.skip(length);
        Ok(result)
    }

    /// The next 8 bits without consuming them. Bits past the end of the data read as zero.
    pub fn peek_byte(&mut self) -> Result<usize, JpeglsError> {
        if self.valid_bits < 8 {
            self.make_valid()?;
        }
        Ok((self.read_cache >> (CACHE_BIT_COUNT - 8)) as usize)
    }

    /// Counts and consumes the zero bits in front of the next 1 bit, and the 1 bit itself.
    pub fn read_high_bits(&mut self) -> Result<i32, JpeglsError> {
        if self.valid_bits < 16 {
            self.make_valid()?;
        }

        let count = self.read_cache.leading_zeros() as i32;
        if count < self.valid_bits {
            self.skip(count + 1);
            return Ok(count);
        }

        let mut high_bits_count = 0;
        loop {
            if self.read_bit()? {
                return Ok(high_bits_count);
            }
            high_bits_count += 1;
            if high_bits_count > CACHE_BIT_COUNT {
                return Err(JpeglsError::InvalidData);
            }
        }
    }

    /// Verifies that the scan ends on a byte boundary right in front of a marker and leaves
    /// the byte source positioned at that marker.
    pub fn end_scan(mut self) -> Result<(), JpeglsError> {
        if !self.is_at_marker_start() {
            self.read_bit()?;
            if !self.is_at_marker_start() {
                return Err(JpeglsError::InvalidData);
            }
        }

        if self.read_cache != 0 {
            return Err(JpeglsError::InvalidData);
        }

        let consumed = self.current_byte_position();
        trace!("scan data ends after {} buffered bytes", consumed);
        match self.source {
            ByteSource::Buffer(data) => *data = &data[consumed..],
            ByteSource::Stream(stream) => {
                let unread = (self.end_position - consumed) as i64;
                stream
                    .seek(SeekFrom::Current(-unread))
                    .map_err(|_| JpeglsError::InvalidData)?;
            }
        }
        Ok(())
    }

    fn byte_at(&self, index: usize) -> u8 {
        match &*self.source {
            ByteSource::Buffer(data) => data[index],
            ByteSource::Stream(_) => self.stream_buffer[index],
        }
    }

    fn is_at_marker_start(&self) -> bool {
        self.position < self.end_position && self.byte_at(self.position) == JPEG_MARKER_START_BYTE
    }

    /// Position of the first byte with bits that are still unread.
    fn current_byte_position(&self) -> usize {
        let mut valid_bits = self.valid_bits;
        let mut position = self.position;

        loop {
            let last_bits_count = if self.byte_at(position - 1) == JPEG_MARKER_START_BYTE {
                7
            } else {
                8
            };

            if valid_bits < last_bits_count {
                return position;
            }

            valid_bits -= last_bits_count;
            position -= 1;
        }
    }

    fn make_valid(&mut self) -> Result<(), JpeglsError> {
        debug_assert!(self.valid_bits <= MAX_READABLE_CACHE_BITS);

        loop {
            self.fill_stream_buffer()?;

            if self.position >= self.end_position {
                return self.check_bits_left();
            }

            let value = self.byte_at(self.position);
            if value == JPEG_MARKER_START_BYTE
                && (self.position == self.end_position - 1 || self.byte_at(self.position + 1) & 0x80 != 0)
            {
                return self.check_bits_left();
            }

            self.read_cache |= (value as Cache) << (MAX_READABLE_CACHE_BITS - self.valid_bits);
            self.position += 1;
            self.valid_bits += 8;

            if value == JPEG_MARKER_START_BYTE {
                self.valid_bits -= 1;
            }

            if self.valid_bits >= MAX_READABLE_CACHE_BITS {
                return Ok(());
            }
        }
    }

    fn check_bits_left(&self) -> Result<(), JpeglsError> {
        if self.valid_bits <= 0 {
            return Err(JpeglsError::InvalidData);
        }
        Ok(())
    }

    fn fill_stream_buffer(&mut self) -> Result<(), JpeglsError> {
        let ByteSource::Stream(stream) = &mut *self.source else {
            return Ok(());
        };
        if self.end_of_stream || self.end_position - self.position >= STREAM_LOOK_BEHIND {
            return Ok(());
        }

        let discard = self.position.saturating_sub(STREAM_LOOK_BEHIND);
        self.stream_buffer.drain(..discard);
        self.position -= discard;

        let mut filled = self.stream_buffer.len();
        self.stream_buffer.resize(filled + STREAM_CHUNK_SIZE, 0);
        while filled < self.stream_buffer.len() {
            match stream.read(&mut self.stream_buffer[filled..]) {
                Ok(0) => {
                    self.end_of_stream = true;
                    break;
                }
                Ok(count) => filled += count,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(_) => return Err(JpeglsError::CompressedBufferTooSmall),
            }
        }
        self.stream_buffer.truncate(filled);
        self.end_position = filled;
        Ok(())
    }
}
