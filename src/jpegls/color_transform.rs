//! HP1, HP2 and HP3 reversible colour transformations, signalled by the "mrfx" APP8 segment.
//!
//! All arithmetic is modulo 2^bits, which makes each inverse exact.

use crate::jpegls::ColorTransformation;

/// Transforms an RGB triplet into the values that are coded.
pub fn forward(transformation: ColorTransformation, bits_per_sample: i32, red: i32, green: i32, blue: i32) -> [i32; 3] {
    let mask = (1 << bits_per_sample) - 1;
    let half = 1 << (bits_per_sample - 1);

    match transformation {
        ColorTransformation::None => [red, green, blue],
        ColorTransformation::Hp1 => [(red - green + half) & mask, green, (blue - green + half) & mask],
        ColorTransformation::Hp2 => [
            (red - green + half) & mask,
            green,
            (blue - ((red + green) >> 1) + half) & mask,
        ],
        ColorTransformation::Hp3 => {
            let v2 = (blue - green + half) & mask;
            let v3 = (red - green + half) & mask;
            let v1 = (green + ((v2 + v3) >> 2) - (half >> 1)) & mask;
            [v1, v2, v3]
        }
    }
}

/// Restores the RGB triplet from decoded values.
pub fn inverse(transformation: ColorTransformation, bits_per_sample: i32, v1: i32, v2: i32, v3: i32) -> [i32; 3] {
    let mask = (1 << bits_per_sample) - 1;
    let half = 1 << (bits_per_sample - 1);

    match transformation {
        ColorTransformation::None => [v1, v2, v3],
        ColorTransformation::Hp1 => [(v1 + v2 - half) & mask, v2, (v3 + v2 - half) & mask],
        ColorTransformation::Hp2 => {
            let red = (v1 + v2 - half) & mask;
            [red, v2, (v3 + ((red + v2) >> 1) - half) & mask]
        }
        ColorTransformation::Hp3 => {
            let green = (v1 - ((v3 + v2) >> 2) + (half >> 1)) & mask;
            [(v3 + green - half) & mask, green, (v2 + green - half) & mask]
        }
    }
}
