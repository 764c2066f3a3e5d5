use crate::FrameInfo;
use crate::byte_stream::ByteSink;
use crate::constants::{
    MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT, MAXIMUM_HEIGHT, MAXIMUM_WIDTH, MINIMUM_BITS_PER_SAMPLE,
    MINIMUM_COMPONENT_COUNT, SEGMENT_MAX_DATA_SIZE,
};
use crate::error::JpeglsError;
use crate::jpeg_segment::{JpegImageDataSegment, JpegMarkerSegment, JpegSegment};
use crate::jpeg_stream_writer::JpegStreamWriter;
use crate::jpegls::coding_parameters::{compute_default, compute_maximum_near_lossless, is_default, is_valid};
use crate::jpegls::{ColorTransformation, InterleaveMode, JlsParameters, JpeglsPcParameters};
use log::debug;
use std::io::Write;

// Room for SOI, SOF, LSE, APP8, SOS and EOI on top of the raw pixel data.
const HEADER_SIZE_ESTIMATE: usize = 1024;

/// Encodes images into JPEG-LS codestreams.
///
/// The destination is a caller supplied buffer ([`JpeglsEncoder::new`]) or stream
/// ([`JpeglsEncoder::from_stream`]); [`JpeglsEncoder::encode_to_vec`] needs neither.
#[derive(Default)]
pub struct JpeglsEncoder<'a> {
    destination: Option<ByteSink<'a>>,
    frame_info: Option<FrameInfo>,
    near_lossless: i32,
    interleave_mode: InterleaveMode,
    color_transformation: ColorTransformation,
    preset_coding_parameters: JpeglsPcParameters,
    stride: usize,
    comment: Option<Vec<u8>>,
}

impl<'a> JpeglsEncoder<'a> {
    pub fn new(destination: &'a mut [u8]) -> Self {
        Self {
            destination: Some(ByteSink::from_buffer(destination)),
            ..Self::default()
        }
    }

    pub fn from_stream(destination: &'a mut dyn Write) -> Self {
        Self {
            destination: Some(ByteSink::from_stream(destination)),
            ..Self::default()
        }
    }

    pub fn set_frame_info(&mut self, frame_info: FrameInfo) -> Result<(), JpeglsError> {
        if !(1..=MAXIMUM_WIDTH).contains(&frame_info.width)
            || !(1..=MAXIMUM_HEIGHT).contains(&frame_info.height)
            || !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&frame_info.bits_per_sample)
            || !(MINIMUM_COMPONENT_COUNT..=MAXIMUM_COMPONENT_COUNT).contains(&frame_info.component_count)
        {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        self.frame_info = Some(frame_info);
        Ok(())
    }

    pub fn set_near_lossless(&mut self, near_lossless: i32) -> Result<(), JpeglsError> {
        if near_lossless < 0 || near_lossless > compute_maximum_near_lossless(u16::MAX as i32) {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        self.near_lossless = near_lossless;
        Ok(())
    }

    pub fn set_interleave_mode(&mut self, interleave_mode: InterleaveMode) {
        self.interleave_mode = interleave_mode;
    }

    pub fn set_color_transformation(&mut self, color_transformation: ColorTransformation) {
        self.color_transformation = color_transformation;
    }

    /// Custom thresholds, reset interval and MAXVAL for an LSE segment. With a MAXVAL below
    /// `2^bits - 1`, `encode` rejects source samples above it.
    pub fn set_preset_coding_parameters(&mut self, preset_coding_parameters: JpeglsPcParameters) {
        self.preset_coding_parameters = preset_coding_parameters;
    }

    /// Bytes between the rows of the source buffer; 0 means rows are packed.
    pub fn set_stride(&mut self, stride: usize) {
        self.stride = stride;
    }

    /// Adds a COM segment after SOI.
    pub fn set_comment(&mut self, comment: &[u8]) -> Result<(), JpeglsError> {
        if comment.len() > SEGMENT_MAX_DATA_SIZE {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        self.comment = Some(comment.to_vec());
        Ok(())
    }

    /// A destination size that holds the encoded image in all practical cases.
    pub fn estimated_destination_size(&self) -> Result<usize, JpeglsError> {
        let frame_info = self.frame_info.ok_or(JpeglsError::InvalidJlsParameters)?;
        Ok(frame_info.width as usize
            * frame_info.height as usize
            * frame_info.component_count as usize
            * frame_info.bytes_per_sample()
            + HEADER_SIZE_ESTIMATE)
    }

    /// Encodes `source` into the destination and returns the number of bytes written.
    pub fn encode(&mut self, source: &[u8]) -> Result<usize, JpeglsError> {
        let parameters = self.validated_parameters(source)?;
        let segments = self.segments(&parameters, source);
        let destination = self.destination.as_mut().ok_or(JpeglsError::CompressedBufferTooSmall)?;
        JpegStreamWriter::new(destination).write_segments(&segments)
    }

    pub fn encode_to_vec(&self, source: &[u8]) -> Result<Vec<u8>, JpeglsError> {
        let parameters = self.validated_parameters(source)?;
        let segments = self.segments(&parameters, source);

        let mut encoded = Vec::new();
        let mut destination = ByteSink::from_stream(&mut encoded);
        JpegStreamWriter::new(&mut destination).write_segments(&segments)?;
        drop(destination);
        Ok(encoded)
    }

    fn validated_parameters(&self, source: &[u8]) -> Result<JlsParameters, JpeglsError> {
        let frame_info = self.frame_info.ok_or(JpeglsError::InvalidJlsParameters)?;
        let maximum_sample_value = (1 << frame_info.bits_per_sample) - 1;
        if self.near_lossless > compute_maximum_near_lossless(maximum_sample_value) {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        let parameters = JlsParameters {
            frame_info,
            near_lossless: self.near_lossless,
            interleave_mode: self.interleave_mode,
            color_transformation: self.color_transformation,
            stride: self.stride,
            preset_coding_parameters: self.preset_coding_parameters,
        };
        parameters.check_parameter_coherent()?;

        if self.color_transformation != ColorTransformation::None
            && (frame_info.component_count != 3
                || self.interleave_mode == InterleaveMode::None
                || self.near_lossless != 0)
        {
            return Err(JpeglsError::ParameterValueNotSupported);
        }

        is_valid(&self.preset_coding_parameters, maximum_sample_value, self.near_lossless)?;

        if parameters.effective_stride() < parameters.minimum_stride() {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        if source.len() < parameters.destination_size() {
            return Err(JpeglsError::UncompressedBufferTooSmall);
        }

        let preset_maximum = self.preset_coding_parameters.maximum_sample_value;
        if preset_maximum != 0
            && preset_maximum < maximum_sample_value
            && !samples_within(source, &parameters, preset_maximum)
        {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        debug!(
            "encoding {}x{}, {} bit, {} component(s), NEAR={}, {:?} interleave",
            frame_info.width,
            frame_info.height,
            frame_info.bits_per_sample,
            frame_info.component_count,
            self.near_lossless,
            self.interleave_mode
        );
        Ok(parameters)
    }

    fn segments<'p>(&self, parameters: &JlsParameters, source: &'p [u8]) -> Vec<JpegSegment<'p>> {
        let frame_info = parameters.frame_info;
        let mut segments = Vec::new();

        if let Some(comment) = &self.comment {
            segments.push(JpegSegment::Marker(JpegMarkerSegment::create_comment_segment(comment)));
        }

        segments.push(JpegSegment::Marker(JpegMarkerSegment::create_start_of_frame_segment(
            &frame_info,
        )));

        if parameters.color_transformation != ColorTransformation::None {
            segments.push(JpegSegment::Marker(
                JpegMarkerSegment::create_color_transformation_segment(parameters.color_transformation),
            ));
        }

        let maximum_sample_value = (1 << frame_info.bits_per_sample) - 1;
        let defaults = compute_default(maximum_sample_value, parameters.near_lossless);
        if !is_default(&parameters.preset_coding_parameters, &defaults) {
            segments.push(JpegSegment::Marker(
                JpegMarkerSegment::create_jpegls_preset_parameters_segment(&parameters.preset_coding_parameters),
            ));
        }

        if parameters.interleave_mode == InterleaveMode::None {
            let plane_size = parameters.plane_size();
            for component in 0..frame_info.component_count {
                segments.push(JpegSegment::Marker(JpegMarkerSegment::create_start_of_scan_segment(
                    component + 1,
                    1,
                    parameters.near_lossless,
                    InterleaveMode::None,
                )));
                segments.push(JpegSegment::ImageData(JpegImageDataSegment::new(
                    &source[component as usize * plane_size..],
                    *parameters,
                    1,
                )));
            }
        } else {
            segments.push(JpegSegment::Marker(JpegMarkerSegment::create_start_of_scan_segment(
                1,
                frame_info.component_count,
                parameters.near_lossless,
                parameters.interleave_mode,
            )));
            segments.push(JpegSegment::ImageData(JpegImageDataSegment::new(
                source,
                *parameters,
                frame_info.component_count as usize,
            )));
        }

        segments
    }
}

/// Checks every sample of every row of `source` against `maximum_sample_value`; stride padding is ignored.
fn samples_within(source: &[u8], parameters: &JlsParameters, maximum_sample_value: i32) -> bool {
    let row_size = parameters.minimum_stride();
    let row_count = parameters.plane_count() * parameters.frame_info.height as usize;

    source
        .chunks(parameters.effective_stride())
        .take(row_count)
        .all(|row| match parameters.bytes_per_sample() {
            1 => row[..row_size]
                .iter()
                .all(|&sample| i32::from(sample) <= maximum_sample_value),
            _ => row[..row_size]
                .chunks_exact(2)
                .all(|sample| i32::from(u16::from_le_bytes([sample[0], sample[1]])) <= maximum_sample_value),
        })
}
