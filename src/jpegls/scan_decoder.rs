use crate::byte_stream::ByteSource;
use crate::constants::{MAXIMUM_ERROR_VALUE, MAXIMUM_SAMPLES_PER_PIXEL};
use crate::error::JpeglsError;
use crate::jpegls::bit_stream_reader::BitStreamReader;
use crate::jpegls::coding_parameters::CodingParameters;
use crate::jpegls::golomb_code::{decode_error_value, decode_value};
use crate::jpegls::process_line::LineSink;
use crate::jpegls::scan_codec::{LineLayout, ScanCodec, predicted_value};
use crate::jpegls::traits::{apply_sign, bit_wise_sign, sign};
use log::debug;

/// Decodes the entropy coded data of one scan line by line.
pub struct ScanDecoder {
    codec: ScanCodec,
}

impl ScanDecoder {
    pub fn new(parameters: CodingParameters, layout: LineLayout, height: usize) -> Self {
        Self {
            codec: ScanCodec::new(parameters, layout, height),
        }
    }

    /// Decodes the scan and leaves `source` positioned at the marker that follows it.
    pub fn decode_scan(&mut self, source: &mut ByteSource, sink: &mut dyn LineSink) -> Result<(), JpeglsError> {
        let layout = self.codec.layout;
        debug!(
            "decoding scan: {}x{}, {} component(s), NEAR={}",
            layout.width,
            self.codec.height,
            layout.component_count(),
            self.codec.parameters.near_lossless
        );

        let mut reader = BitStreamReader::new(source)?;
        let row_length = layout.row_length();
        let mut previous_line = vec![0; layout.line_length()];
        let mut current_line = vec![0; layout.line_length()];
        let mut run_index = vec![0; layout.rows];

        for _ in 0..self.codec.height {
            std::mem::swap(&mut previous_line, &mut current_line);

            for (row, row_run_index) in run_index.iter_mut().enumerate() {
                let rows = row * row_length..(row + 1) * row_length;
                let previous_row = &mut previous_line[rows.clone()];
                let current_row = &mut current_line[rows];
                layout.initialize_edges(previous_row, current_row);

                self.codec.run_index = *row_run_index;
                self.decode_line(&mut reader, previous_row, current_row)?;
                *row_run_index = self.codec.run_index;
            }

            sink.write_line(&layout, &current_line)?;
        }

        reader.end_scan()
    }

    fn decode_line(
        &mut self,
        reader: &mut BitStreamReader,
        previous: &[i32],
        current: &mut [i32],
    ) -> Result<(), JpeglsError> {
        let width = self.codec.layout.width;
        let samples = self.codec.layout.samples_per_pixel;
        let mut context_ids = [0; MAXIMUM_SAMPLES_PER_PIXEL];

        let mut index = 1;
        while index <= width {
            for (j, context_id) in context_ids.iter_mut().enumerate().take(samples) {
                *context_id = self.codec.context_id(
                    current[(index - 1) * samples + j],
                    previous[index * samples + j],
                    previous[(index - 1) * samples + j],
                    previous[(index + 1) * samples + j],
                );
            }

            if context_ids[..samples].iter().all(|&qs| qs == 0) {
                index += self.decode_run_mode(reader, index, previous, current)?;
                continue;
            }

            for (j, &qs) in context_ids.iter().enumerate().take(samples) {
                let position = index * samples + j;
                let predicted = predicted_value(
                    current[position - samples],
                    previous[position],
                    previous[position - samples],
                );
                current[position] = self.decode_regular(reader, qs, predicted)?;
            }
            index += 1;
        }
        Ok(())
    }

    fn decode_regular(&mut self, reader: &mut BitStreamReader, qs: i32, predicted: i32) -> Result<i32, JpeglsError> {
        let parameters = self.codec.parameters;
        let sign = bit_wise_sign(qs);
        let context = &mut self.codec.regular_mode_contexts[apply_sign(qs, sign) as usize];
        let k = context.golomb_coding_parameter()?;
        let predicted_value = parameters.correct_prediction(predicted + apply_sign(context.c(), sign));

        let mut error_value = decode_error_value(reader, k, parameters.limit, parameters.quantized_bits_per_sample)?;
        if k == 0 {
            error_value ^= context.error_correction(parameters.near_lossless);
        }
        context.update_variables(error_value, parameters.near_lossless, parameters.reset_threshold)?;

        Ok(parameters.compute_reconstructed_sample(predicted_value, apply_sign(error_value, sign)))
    }

    fn decode_run_mode(
        &mut self,
        reader: &mut BitStreamReader,
        start_index: usize,
        previous: &[i32],
        current: &mut [i32],
    ) -> Result<usize, JpeglsError> {
        let width = self.codec.layout.width;
        let samples = self.codec.layout.samples_per_pixel;
        let mut ra = [0; MAXIMUM_SAMPLES_PER_PIXEL];
        ra[..samples].copy_from_slice(&current[(start_index - 1) * samples..start_index * samples]);
        let ra = &ra[..samples];

        let run_length = self.decode_run_pixels(reader, width + 1 - start_index)?;
        for pixel in start_index..start_index + run_length {
            current[pixel * samples..(pixel + 1) * samples].copy_from_slice(ra);
        }

        let end_index = start_index + run_length;
        if end_index == width + 1 {
            return Ok(run_length);
        }

        if samples == 1 {
            current[end_index] = self.decode_run_interruption_sample(reader, ra[0], previous[end_index])?;
        } else {
            for (j, &ra) in ra.iter().enumerate() {
                let position = end_index * samples + j;
                let rb = previous[position];
                let error_value = self.decode_run_interruption_error(reader, 0)?;
                current[position] = self
                    .codec
                    .parameters
                    .compute_reconstructed_sample(rb, error_value * sign(rb - ra));
            }
        }

        self.codec.decrement_run_index();
        Ok(run_length + 1)
    }

    fn decode_run_pixels(&mut self, reader: &mut BitStreamReader, pixel_count: usize) -> Result<usize, JpeglsError> {
        let mut index = 0;
        while reader.read_bit()? {
            let order_length = 1usize << self.codec.run_order();
            let count = order_length.min(pixel_count - index);
            index += count;

            if count == order_length {
                self.codec.increment_run_index();
            }

            if index == pixel_count {
                break;
            }
        }

        if index != pixel_count {
            // Incomplete run: the remainder follows a zero bit.
            index += reader.read_value(self.codec.run_order())? as usize;
        }

        if index > pixel_count {
            return Err(JpeglsError::InvalidData);
        }
        Ok(index)
    }

    fn decode_run_interruption_sample(
        &mut self,
        reader: &mut BitStreamReader,
        ra: i32,
        rb: i32,
    ) -> Result<i32, JpeglsError> {
        let parameters = self.codec.parameters;
        if parameters.is_near(ra, rb) {
            let error_value = self.decode_run_interruption_error(reader, 1)?;
            return Ok(parameters.compute_reconstructed_sample(ra, error_value));
        }

        let error_value = self.decode_run_interruption_error(reader, 0)?;
        Ok(parameters.compute_reconstructed_sample(rb, error_value * sign(rb - ra)))
    }

    fn decode_run_interruption_error(
        &mut self,
        reader: &mut BitStreamReader,
        context_index: usize,
    ) -> Result<i32, JpeglsError> {
        let limit = self.codec.run_interruption_limit();
        let parameters = self.codec.parameters;
        let context = &mut self.codec.run_mode_contexts[context_index];

        let k = context.golomb_coding_parameter()?;
        let e_mapped_error_value = decode_value(reader, k, limit, parameters.quantized_bits_per_sample)?;
        if e_mapped_error_value > 2 * MAXIMUM_ERROR_VALUE {
            return Err(JpeglsError::InvalidData);
        }

        let error_value = context.decode_error_value(e_mapped_error_value + context.run_interruption_type(), k);
        if error_value.abs() > MAXIMUM_ERROR_VALUE {
            return Err(JpeglsError::InvalidData);
        }
        context.update_variables(error_value, e_mapped_error_value, parameters.reset_threshold)?;
        Ok(error_value)
    }
}
