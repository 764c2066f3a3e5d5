use std::fmt::Debug;

/// Storage type of a sample in an uncompressed buffer.
///
/// Samples of 2..=8 bits use one byte, 9..=16 bits two little-endian bytes.
pub trait JpeglsSample: Copy + Debug + Default + PartialEq {
    const BYTES: usize;

    fn to_i32(self) -> i32;
    fn from_i32(val: i32) -> Self;

    /// Reads the sample with index `index` from a byte buffer.
    fn load(bytes: &[u8], index: usize) -> i32;

    /// Writes `value` as the sample with index `index` into a byte buffer.
    fn store(bytes: &mut [u8], index: usize, value: i32);
}

impl JpeglsSample for u8 {
    const BYTES: usize = 1;

    fn to_i32(self) -> i32 {
        self as i32
    }

    fn from_i32(val: i32) -> Self {
        val as u8
    }

    fn load(bytes: &[u8], index: usize) -> i32 {
        bytes[index] as i32
    }

    fn store(bytes: &mut [u8], index: usize, value: i32) {
        bytes[index] = Self::from_i32(value);
    }
}

impl JpeglsSample for u16 {
    const BYTES: usize = 2;

    fn to_i32(self) -> i32 {
        self as i32
    }

    fn from_i32(val: i32) -> Self {
        val as u16
    }

    fn load(bytes: &[u8], index: usize) -> i32 {
        let offset = index * Self::BYTES;
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]]).to_i32()
    }

    fn store(bytes: &mut [u8], index: usize, value: i32) {
        let offset = index * Self::BYTES;
        bytes[offset..offset + Self::BYTES].copy_from_slice(&Self::from_i32(value).to_le_bytes());
    }
}

/// Arithmetic sign mask: -1 for negative values, 0 otherwise.
pub fn bit_wise_sign(i: i32) -> i32 {
    i >> 31
}

/// Negates `val` when `sign` is the -1 mask produced by [`bit_wise_sign`].
pub fn apply_sign(val: i32, sign: i32) -> i32 {
    (sign ^ val) - sign
}

/// -1 for negative values, +1 otherwise.
pub fn sign(n: i32) -> i32 {
    (n >> 31) | 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_helpers() {
        assert_eq!(bit_wise_sign(-5), -1);
        assert_eq!(bit_wise_sign(0), 0);
        assert_eq!(bit_wise_sign(7), 0);

        assert_eq!(apply_sign(12, -1), -12);
        assert_eq!(apply_sign(12, 0), 12);
        assert_eq!(apply_sign(-3, bit_wise_sign(-3)), 3);

        assert_eq!(sign(-1), -1);
        assert_eq!(sign(0), 1);
        assert_eq!(sign(99), 1);
    }

    #[test]
    fn test_u16_samples_are_little_endian() {
        let mut bytes = [0u8; 4];
        u16::store(&mut bytes, 1, 0x1234);
        assert_eq!(bytes, [0, 0, 0x34, 0x12]);
        assert_eq!(u16::load(&bytes, 1), 0x1234);
    }
}
