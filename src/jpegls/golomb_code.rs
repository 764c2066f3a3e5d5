//! Limited length Golomb-Rice codes (ISO/IEC 14495-1, A.5.3) and the error value mapping.

use crate::constants::MAXIMUM_ERROR_VALUE;
use crate::error::JpeglsError;
use crate::jpegls::bit_stream_reader::BitStreamReader;
use crate::jpegls::bit_stream_writer::BitStreamWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GolombCodeMatch {
    pub mapped_value: i16,
    pub bit_count: i8,
}

const fn countl_zero_u8(mut x: u8) -> i8 {
    if x == 0 {
        return 8;
    }
    let mut count = 0;
    while (x & 0x80) == 0 {
        x <<= 1;
        count += 1;
    }
    count
}

/// Number of Golomb parameters with a decoding table; larger k never fit a code in 8 bits.
pub const GOLOMB_LUT_SIZE: usize = 8;

/// For each k, the code that starts with a given byte, when the complete code fits in that byte.
/// Entries with `bit_count == 0` need the bit-by-bit decoder.
pub const GOLOMB_LUT: [[GolombCodeMatch; 256]; GOLOMB_LUT_SIZE] = {
    let mut lut = [[GolombCodeMatch {
        mapped_value: 0,
        bit_count: 0,
    }; 256]; GOLOMB_LUT_SIZE];
    let mut k: usize = 0;
    while k < GOLOMB_LUT_SIZE {
        let mut value: usize = 0;
        while value < 256 {
            let unary_length = countl_zero_u8(value as u8);
            let length = unary_length + k as i8 + 1;

            if length <= 8 {
                let shift = 8 - unary_length - 1 - k as i8;
                let remainder = (value >> shift) & ((1 << k) - 1);
                lut[k][value] = GolombCodeMatch {
                    mapped_value: ((unary_length as i16) << k) + remainder as i16,
                    bit_count: length,
                };
            }
            value += 1;
        }
        k += 1;
    }
    lut
};

/// Folds a signed error value onto the non-negative integers: 0, -1, 1, -2, 2, ...
pub fn map_error_value(error_value: i32) -> i32 {
    (error_value >> 30) ^ (2 * error_value)
}

pub fn unmap_error_value(mapped_error_value: i32) -> i32 {
    -(mapped_error_value & 1) ^ (mapped_error_value >> 1)
}

/// Writes `mapped_error_value` with Golomb parameter `k`, switching to the escape code
/// (LIMIT - qbpp - 1 zeros, a one, qbpp bits of value - 1) when the unary part gets too long.
pub fn encode_mapped_value(
    writer: &mut BitStreamWriter,
    k: i32,
    mapped_error_value: i32,
    limit: i32,
    quantized_bits_per_sample: i32,
) -> Result<(), JpeglsError> {
    let mut high_bits = mapped_error_value >> k;

    if high_bits < limit - quantized_bits_per_sample - 1 {
        if high_bits + 1 > 31 {
            writer.append_to_bit_stream(0, high_bits / 2)?;
            high_bits -= high_bits / 2;
        }
        writer.append_to_bit_stream(1, high_bits + 1)?;
        return writer.append_to_bit_stream((mapped_error_value & ((1 << k) - 1)) as u32, k);
    }

    if limit - quantized_bits_per_sample > 31 {
        writer.append_to_bit_stream(0, 31)?;
        writer.append_to_bit_stream(1, limit - quantized_bits_per_sample - 31)?;
    } else {
        writer.append_to_bit_stream(1, limit - quantized_bits_per_sample)?;
    }

    writer.append_to_bit_stream(
        ((mapped_error_value - 1) & ((1 << quantized_bits_per_sample) - 1)) as u32,
        quantized_bits_per_sample,
    )
}

/// Reads one limited length Golomb code and returns the mapped value.
pub fn decode_value(
    reader: &mut BitStreamReader,
    k: i32,
    limit: i32,
    quantized_bits_per_sample: i32,
) -> Result<i32, JpeglsError> {
    let high_bits = reader.read_high_bits()?;

    if high_bits >= limit - (quantized_bits_per_sample + 1) {
        return Ok(reader.read_value(quantized_bits_per_sample)? + 1);
    }

    if k == 0 {
        return Ok(high_bits);
    }

    let value = ((high_bits as i64) << k) + reader.read_value(k)? as i64;
    i32::try_from(value).map_err(|_| JpeglsError::InvalidData)
}

/// Decodes the error value of a regular mode sample, using the byte lookup table when the
/// complete code is already in the bit cache.
pub fn decode_error_value(
    reader: &mut BitStreamReader,
    k: i32,
    limit: i32,
    quantized_bits_per_sample: i32,
) -> Result<i32, JpeglsError> {
    if (k as usize) < GOLOMB_LUT_SIZE {
        let code = GOLOMB_LUT[k as usize][reader.peek_byte()?];
        if code.bit_count != 0 && (code.bit_count as i32) <= reader.valid_bits() {
            reader.skip(code.bit_count as i32);
            return Ok(unmap_error_value(code.mapped_value as i32));
        }
    }

    let error_value = unmap_error_value(decode_value(reader, k, limit, quantized_bits_per_sample)?);
    if error_value.abs() > MAXIMUM_ERROR_VALUE {
        return Err(JpeglsError::InvalidData);
    }
    Ok(error_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_stream::{ByteSink, ByteSource};

    #[test]
    fn test_map_error_value() {
        let mapped: Vec<i32> = [0, -1, 1, -2, 2, -3].iter().map(|&e| map_error_value(e)).collect();
        assert_eq!(mapped, vec![0, 1, 2, 3, 4, 5]);
        for error_value in -70000..70000 {
            assert_eq!(unmap_error_value(map_error_value(error_value)), error_value);
        }
    }

    #[test]
    fn test_lut_matches_code_layout() {
        // k = 2, value 6: unary "0" "1", remainder "10"
        let code = GOLOMB_LUT[2][0b0110_0000];
        assert_eq!(code, GolombCodeMatch { mapped_value: 6, bit_count: 4 });
        assert_eq!(GOLOMB_LUT[0][0b1000_0000].bit_count, 1);
        assert_eq!(GOLOMB_LUT[0][0].bit_count, 0);
        assert_eq!(GOLOMB_LUT[7][0b1000_0000].bit_count, 8);
    }

    #[test]
    fn test_codes_decode_to_the_encoded_values() {
        // (k, mapped value, limit, qbpp); the large values take the escape path.
        let cases = [
            (0, 0, 32, 8),
            (0, 5, 32, 8),
            (2, 17, 32, 8),
            (0, 200, 32, 8),
            (5, 255, 32, 8),
            (3, 60000, 64, 16),
            (15, 65535, 64, 16),
            (1, 3, 20, 2),
        ];

        let mut buffer = vec![0u8; 256];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        for &(k, value, limit, qbpp) in &cases {
            encode_mapped_value(&mut writer, k, value, limit, qbpp).unwrap();
        }
        writer.end_scan().unwrap();
        let length = writer.length();
        drop(sink);
        buffer.truncate(length);
        buffer.extend_from_slice(&[0xFF, 0xD9]);

        let mut source = ByteSource::Buffer(&buffer);
        let mut reader = BitStreamReader::new(&mut source).unwrap();
        for &(k, value, limit, qbpp) in &cases {
            assert_eq!(decode_value(&mut reader, k, limit, qbpp).unwrap(), value, "k={k} value={value}");
        }
        reader.end_scan().unwrap();
    }

    #[test]
    fn test_table_and_bitwise_decoding_agree() {
        let error_values = [0, 1, -1, 3, -4, 12, -31, 100, -128, 127];
        let mut buffer = vec![0u8; 256];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        for k in 0..4 {
            for &error_value in &error_values {
                encode_mapped_value(&mut writer, k, map_error_value(error_value), 32, 8).unwrap();
            }
        }
        writer.end_scan().unwrap();
        let length = writer.length();
        drop(sink);
        buffer.truncate(length);
        buffer.extend_from_slice(&[0xFF, 0xD9]);

        let mut source = ByteSource::Buffer(&buffer);
        let mut reader = BitStreamReader::new(&mut source).unwrap();
        for k in 0..4 {
            for &error_value in &error_values {
                assert_eq!(decode_error_value(&mut reader, k, 32, 8).unwrap(), error_value);
            }
        }
        reader.end_scan().unwrap();
    }

    #[test]
    fn test_value_beyond_i32_is_invalid_data() {
        // 20 zero bits, the terminating one bit and a 30 bit remainder: 20 << 30 overflows an i32.
        let mut buffer = vec![0u8; 64];
        let mut sink = ByteSink::from_buffer(&mut buffer);
        let mut writer = BitStreamWriter::new(&mut sink);
        writer.append_to_bit_stream(1, 21).unwrap();
        writer.append_to_bit_stream(0, 30).unwrap();
        writer.end_scan().unwrap();
        let length = writer.length();
        drop(sink);
        buffer.truncate(length);
        buffer.extend_from_slice(&[0xFF, 0xD9]);

        let mut source = ByteSource::Buffer(&buffer);
        let mut reader = BitStreamReader::new(&mut source).unwrap();
        assert_eq!(decode_value(&mut reader, 30, 64, 16), Err(JpeglsError::InvalidData));
    }
}
