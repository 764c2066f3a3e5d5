use crate::byte_stream::ByteSink;
use crate::constants::MAXIMUM_SAMPLES_PER_PIXEL;
use crate::error::JpeglsError;
use crate::jpegls::bit_stream_writer::BitStreamWriter;
use crate::jpegls::coding_parameters::CodingParameters;
use crate::jpegls::golomb_code::{encode_mapped_value, map_error_value};
use crate::jpegls::process_line::LineSource;
use crate::jpegls::scan_codec::{LineLayout, ScanCodec, predicted_value};
use crate::jpegls::traits::{apply_sign, bit_wise_sign, sign};
use log::debug;

/// Encodes the lines of one scan into entropy coded data.
pub struct ScanEncoder {
    codec: ScanCodec,
}

impl ScanEncoder {
    pub fn new(parameters: CodingParameters, layout: LineLayout, height: usize) -> Self {
        Self {
            codec: ScanCodec::new(parameters, layout, height),
        }
    }

    /// Encodes every line of the scan and returns the number of bytes written to `sink`.
    pub fn encode_scan(&mut self, source: &mut dyn LineSource, sink: &mut ByteSink) -> Result<usize, JpeglsError> {
        let layout = self.codec.layout;
        debug!(
            "encoding scan: {}x{}, {} component(s), NEAR={}",
            layout.width,
            self.codec.height,
            layout.component_count(),
            self.codec.parameters.near_lossless
        );

        let mut writer = BitStreamWriter::new(sink);
        let row_length = layout.row_length();
        let mut previous_line = vec![0; layout.line_length()];
        let mut current_line = vec![0; layout.line_length()];
        let mut run_index = vec![0; layout.rows];

        for _ in 0..self.codec.height {
            std::mem::swap(&mut previous_line, &mut current_line);
            source.read_line(&layout, &mut current_line)?;

            for (row, row_run_index) in run_index.iter_mut().enumerate() {
                let rows = row * row_length..(row + 1) * row_length;
                let previous_row = &mut previous_line[rows.clone()];
                let current_row = &mut current_line[rows];
                layout.initialize_edges(previous_row, current_row);

                self.codec.run_index = *row_run_index;
                self.encode_line(&mut writer, previous_row, current_row)?;
                *row_run_index = self.codec.run_index;
            }
        }

        writer.end_scan()?;
        Ok(writer.length())
    }

    fn encode_line(
        &mut self,
        writer: &mut BitStreamWriter,
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
                index += self.encode_run_mode(writer, index, previous, current)?;
                continue;
            }

            for (j, &qs) in context_ids.iter().enumerate().take(samples) {
                let position = index * samples + j;
                let predicted = predicted_value(
                    current[position - samples],
                    previous[position],
                    previous[position - samples],
                );
                current[position] = self.encode_regular(writer, qs, current[position], predicted)?;
            }
            index += 1;
        }
        Ok(())
    }

    // Code segments A.5 to A.11
    fn encode_regular(
        &mut self,
        writer: &mut BitStreamWriter,
        qs: i32,
        x: i32,
        predicted: i32,
    ) -> Result<i32, JpeglsError> {
        let parameters = self.codec.parameters;
        let sign = bit_wise_sign(qs);
        let context = &mut self.codec.regular_mode_contexts[apply_sign(qs, sign) as usize];
        let k = context.golomb_coding_parameter()?;
        let predicted_value = parameters.correct_prediction(predicted + apply_sign(context.c(), sign));
        let error_value = parameters.compute_error_value(apply_sign(x - predicted_value, sign));

        encode_mapped_value(
            writer,
            k,
            map_error_value(context.error_correction(k | parameters.near_lossless) ^ error_value),
            parameters.limit,
            parameters.quantized_bits_per_sample,
        )?;
        context.update_variables(error_value, parameters.near_lossless, parameters.reset_threshold)?;

        let reconstructed = parameters.compute_reconstructed_sample(predicted_value, apply_sign(error_value, sign));
        debug_assert!(parameters.is_near(reconstructed, x));
        Ok(reconstructed)
    }

    /// Codes the run that starts at pixel `start_index` and the pixel that interrupts it.
    /// Returns the number of pixels consumed.
    fn encode_run_mode(
        &mut self,
        writer: &mut BitStreamWriter,
        start_index: usize,
        previous: &[i32],
        current: &mut [i32],
    ) -> Result<usize, JpeglsError> {
        let width = self.codec.layout.width;
        let samples = self.codec.layout.samples_per_pixel;
        let mut ra = [0; MAXIMUM_SAMPLES_PER_PIXEL];
        ra[..samples].copy_from_slice(&current[(start_index - 1) * samples..start_index * samples]);
        let ra = &ra[..samples];

        let remaining = width + 1 - start_index;
        let mut run_length = 0;
        while run_length < remaining {
            let pixel = (start_index + run_length) * samples;
            if !self.codec.is_near_pixel(&current[pixel..pixel + samples], ra) {
                break;
            }
            current[pixel..pixel + samples].copy_from_slice(ra);
            run_length += 1;
        }

        self.encode_run_pixels(writer, run_length as i32, run_length == remaining)?;
        if run_length == remaining {
            return Ok(run_length);
        }

        let index = start_index + run_length;
        if samples == 1 {
            current[index] = self.encode_run_interruption_sample(writer, current[index], ra[0], previous[index])?;
        } else {
            for (j, &ra) in ra.iter().enumerate() {
                let position = index * samples + j;
                let rb = previous[position];
                let direction = sign(rb - ra);
                let error_value = self.codec.parameters.compute_error_value(direction * (current[position] - rb));
                self.encode_run_interruption_error(writer, 0, error_value)?;
                current[position] = self
                    .codec
                    .parameters
                    .compute_reconstructed_sample(rb, error_value * direction);
            }
        }

        self.codec.decrement_run_index();
        Ok(run_length + 1)
    }

    // Code segment A.15
    fn encode_run_pixels(
        &mut self,
        writer: &mut BitStreamWriter,
        mut run_length: i32,
        end_of_line: bool,
    ) -> Result<(), JpeglsError> {
        while run_length >= 1 << self.codec.run_order() {
            writer.append_ones_to_bit_stream(1)?;
            run_length -= 1 << self.codec.run_order();
            self.codec.increment_run_index();
        }

        if end_of_line {
            if run_length != 0 {
                writer.append_ones_to_bit_stream(1)?;
            }
            return Ok(());
        }

        // A zero bit followed by the remainder of the run.
        writer.append_to_bit_stream(run_length as u32, self.codec.run_order() + 1)
    }

    // Code segments A.16 to A.19
    fn encode_run_interruption_sample(
        &mut self,
        writer: &mut BitStreamWriter,
        x: i32,
        ra: i32,
        rb: i32,
    ) -> Result<i32, JpeglsError> {
        let parameters = self.codec.parameters;
        if parameters.is_near(ra, rb) {
            let error_value = parameters.compute_error_value(x - ra);
            self.encode_run_interruption_error(writer, 1, error_value)?;
            return Ok(parameters.compute_reconstructed_sample(ra, error_value));
        }

        let direction = sign(rb - ra);
        let error_value = parameters.compute_error_value((x - rb) * direction);
        self.encode_run_interruption_error(writer, 0, error_value)?;
        Ok(parameters.compute_reconstructed_sample(rb, error_value * direction))
    }

    fn encode_run_interruption_error(
        &mut self,
        writer: &mut BitStreamWriter,
        context_index: usize,
        error_value: i32,
    ) -> Result<(), JpeglsError> {
        let limit = self.codec.run_interruption_limit();
        let parameters = self.codec.parameters;
        let context = &mut self.codec.run_mode_contexts[context_index];

        let k = context.golomb_coding_parameter()?;
        let map = context.compute_map(error_value, k);
        let e_mapped_error_value = 2 * error_value.abs() - context.run_interruption_type() - map as i32;
        debug_assert_eq!(
            context.decode_error_value(e_mapped_error_value + context.run_interruption_type(), k),
            error_value
        );

        encode_mapped_value(writer, k, e_mapped_error_value, limit, parameters.quantized_bits_per_sample)?;
        context.update_variables(error_value, e_mapped_error_value, parameters.reset_threshold)
    }
}
