//! Conversion between uncompressed sample buffers and the scan coder's line buffers.

use crate::error::JpeglsError;
use crate::jpegls::ColorTransformation;
use crate::jpegls::color_transform;
use crate::jpegls::scan_codec::LineLayout;
use crate::jpegls::traits::JpeglsSample;
use std::marker::PhantomData;

/// Supplies the scan encoder with one line of samples at a time.
pub trait LineSource {
    fn read_line(&mut self, layout: &LineLayout, line: &mut [i32]) -> Result<(), JpeglsError>;
}

/// Receives each line completed by the scan decoder.
pub trait LineSink {
    fn write_line(&mut self, layout: &LineLayout, line: &[i32]) -> Result<(), JpeglsError>;
}

/// Reads lines from a buffer whose rows are `stride` bytes apart. Rows of multi-component
/// scans hold interleaved pixels; a colour transformation is applied to 3-component pixels.
pub struct RawLineSource<'b, T: JpeglsSample> {
    pixels: &'b [u8],
    stride: usize,
    line_index: usize,
    color_transformation: ColorTransformation,
    bits_per_sample: i32,
    _sample: PhantomData<T>,
}

impl<'b, T: JpeglsSample> RawLineSource<'b, T> {
    pub fn new(
        pixels: &'b [u8],
        stride: usize,
        color_transformation: ColorTransformation,
        bits_per_sample: i32,
    ) -> Self {
        Self {
            pixels,
            stride,
            line_index: 0,
            color_transformation,
            bits_per_sample,
            _sample: PhantomData,
        }
    }
}

impl<T: JpeglsSample> LineSource for RawLineSource<'_, T> {
    fn read_line(&mut self, layout: &LineLayout, line: &mut [i32]) -> Result<(), JpeglsError> {
        let components = layout.component_count();
        let start = self.line_index * self.stride;
        let row = self
            .pixels
            .get(start..start + layout.width * components * T::BYTES)
            .ok_or(JpeglsError::UncompressedBufferTooSmall)?;
        let mask = (1 << self.bits_per_sample) - 1;

        if components == 3 && self.color_transformation != ColorTransformation::None {
            for x in 0..layout.width {
                let values = color_transform::forward(
                    self.color_transformation,
                    self.bits_per_sample,
                    T::load(row, x * 3) & mask,
                    T::load(row, x * 3 + 1) & mask,
                    T::load(row, x * 3 + 2) & mask,
                );
                for (component, value) in values.into_iter().enumerate() {
                    line[layout.position(x, component)] = value;
                }
            }
        } else {
            for x in 0..layout.width {
                for component in 0..components {
                    line[layout.position(x, component)] = T::load(row, x * components + component) & mask;
                }
            }
        }

        self.line_index += 1;
        Ok(())
    }
}

/// Writes decoded lines into a buffer, the mirror image of [`RawLineSource`].
pub struct RawLineSink<'b, T: JpeglsSample> {
    pixels: &'b mut [u8],
    stride: usize,
    line_index: usize,
    color_transformation: ColorTransformation,
    bits_per_sample: i32,
    _sample: PhantomData<T>,
}

impl<'b, T: JpeglsSample> RawLineSink<'b, T> {
    pub fn new(
        pixels: &'b mut [u8],
        stride: usize,
        color_transformation: ColorTransformation,
        bits_per_sample: i32,
    ) -> Self {
        Self {
            pixels,
            stride,
            line_index: 0,
            color_transformation,
            bits_per_sample,
            _sample: PhantomData,
        }
    }
}

impl<T: JpeglsSample> LineSink for RawLineSink<'_, T> {
    fn write_line(&mut self, layout: &LineLayout, line: &[i32]) -> Result<(), JpeglsError> {
        let components = layout.component_count();
        let start = self.line_index * self.stride;
        let row = self
            .pixels
            .get_mut(start..start + layout.width * components * T::BYTES)
            .ok_or(JpeglsError::UncompressedBufferTooSmall)?;

        if components == 3 && self.color_transformation != ColorTransformation::None {
            for x in 0..layout.width {
                let values = color_transform::inverse(
                    self.color_transformation,
                    self.bits_per_sample,
                    line[layout.position(x, 0)],
                    line[layout.position(x, 1)],
                    line[layout.position(x, 2)],
                );
                for (component, value) in values.into_iter().enumerate() {
                    T::store(row, x * 3 + component, value);
                }
            }
        } else {
            for x in 0..layout.width {
                for component in 0..components {
                    T::store(row, x * components + component, line[layout.position(x, component)]);
                }
            }
        }

        self.line_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpegls::InterleaveMode;

    #[test]
    fn test_line_interleaved_source_splits_components_into_rows() {
        let pixels = [1u8, 2, 3, 4, 5, 6, 0xAA, 7, 8, 9, 10, 11, 12, 0xAA];
        let layout = LineLayout::new(2, 3, InterleaveMode::Line);
        let mut source = RawLineSource::<u8>::new(&pixels, 7, ColorTransformation::None, 8);
        let mut line = vec![0; layout.line_length()];

        source.read_line(&layout, &mut line).unwrap();
        assert_eq!(line, vec![0, 1, 4, 0, 0, 2, 5, 0, 0, 3, 6, 0]);

        source.read_line(&layout, &mut line).unwrap();
        assert_eq!(line[layout.position(1, 2)], 12);
        assert_eq!(
            source.read_line(&layout, &mut line),
            Err(JpeglsError::UncompressedBufferTooSmall)
        );
    }

    #[test]
    fn test_sink_restores_what_the_source_read() {
        let mut pixels = Vec::new();
        for value in [100u16, 4000, 65535, 0, 17, 300] {
            pixels.extend_from_slice(&value.to_le_bytes());
        }
        for interleave_mode in [InterleaveMode::Line, InterleaveMode::Sample] {
            for transformation in [ColorTransformation::None, ColorTransformation::Hp2, ColorTransformation::Hp3] {
                let layout = LineLayout::new(2, 3, interleave_mode);
                let mut line = vec![0; layout.line_length()];
                RawLineSource::<u16>::new(&pixels, 12, transformation, 16)
                    .read_line(&layout, &mut line)
                    .unwrap();

                let mut decoded = vec![0u8; 12];
                RawLineSink::<u16>::new(&mut decoded, 12, transformation, 16)
                    .write_line(&layout, &line)
                    .unwrap();
                assert_eq!(decoded, pixels);
            }
        }
    }
}
