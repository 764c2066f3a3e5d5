//! The segments an encoded JPEG-LS image is assembled from.

use crate::FrameInfo;
use crate::constants::COLOR_TRANSFORMATION_TAG;
use crate::error::JpeglsError;
use crate::jpeg_marker_code::JpegMarkerCode;
use crate::jpeg_stream_writer::JpegStreamWriter;
use crate::jpegls::coding_parameters::{CodingParameters, JlsParameters, JpeglsPcParameters};
use crate::jpegls::process_line::RawLineSource;
use crate::jpegls::scan_codec::LineLayout;
use crate::jpegls::scan_encoder::ScanEncoder;
use crate::jpegls::{ColorTransformation, InterleaveMode};

/// A marker segment with its payload already serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegMarkerSegment {
    marker: JpegMarkerCode,
    payload: Vec<u8>,
}

impl JpegMarkerSegment {
    pub fn new(marker: JpegMarkerCode, payload: Vec<u8>) -> Self {
        Self { marker, payload }
    }

    pub fn marker(&self) -> JpegMarkerCode {
        self.marker
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// SOF55: P, Y, X, Nf followed by (id, sampling factors, Tq) per component.
    pub fn create_start_of_frame_segment(frame_info: &FrameInfo) -> Self {
        let mut payload = Vec::with_capacity(6 + 3 * frame_info.component_count as usize);
        payload.push(frame_info.bits_per_sample as u8);
        payload.extend_from_slice(&(frame_info.height as u16).to_be_bytes());
        payload.extend_from_slice(&(frame_info.width as u16).to_be_bytes());
        payload.push(frame_info.component_count as u8);

        for component_id in 1..=frame_info.component_count {
            payload.push(component_id as u8);
            payload.push(0x11); // H = 1, V = 1
            payload.push(0); // Tq is always 0 for JPEG-LS
        }

        Self::new(JpegMarkerCode::StartOfFrameJpegls, payload)
    }

    /// LSE type 1: MAXVAL, T1, T2, T3 and RESET.
    pub fn create_jpegls_preset_parameters_segment(preset_coding_parameters: &JpeglsPcParameters) -> Self {
        let mut payload = vec![1];
        for value in [
            preset_coding_parameters.maximum_sample_value,
            preset_coding_parameters.threshold1,
            preset_coding_parameters.threshold2,
            preset_coding_parameters.threshold3,
            preset_coding_parameters.reset_value,
        ] {
            payload.extend_from_slice(&(value as u16).to_be_bytes());
        }

        Self::new(JpegMarkerCode::JpeglsPresetParameters, payload)
    }

    /// APP8 "mrfx" segment announcing an HP colour transformation.
    pub fn create_color_transformation_segment(color_transformation: ColorTransformation) -> Self {
        let mut payload = COLOR_TRANSFORMATION_TAG.to_vec();
        payload.push(u8::from(color_transformation));
        Self::new(JpegMarkerCode::ApplicationData8, payload)
    }

    /// SOS for `component_count` components, the first with id `first_component_id`.
    pub fn create_start_of_scan_segment(
        first_component_id: i32,
        component_count: i32,
        near_lossless: i32,
        interleave_mode: InterleaveMode,
    ) -> Self {
        let mut payload = vec![component_count as u8];
        for component_id in first_component_id..first_component_id + component_count {
            payload.push(component_id as u8);
            payload.push(0); // mapping table selector
        }
        payload.push(near_lossless as u8);
        payload.push(u8::from(interleave_mode));
        payload.push(0); // no point transform

        Self::new(JpegMarkerCode::StartOfScan, payload)
    }

    pub fn create_comment_segment(comment: &[u8]) -> Self {
        Self::new(JpegMarkerCode::Comment, comment.to_vec())
    }
}

/// The entropy coded data of one scan, produced while the segment is serialized.
#[derive(Debug, Clone, Copy)]
pub struct JpegImageDataSegment<'p> {
    pixels: &'p [u8],
    parameters: JlsParameters,
    component_count: usize,
}

impl<'p> JpegImageDataSegment<'p> {
    /// `pixels` starts at the first row of the scan: the plane of the component for
    /// non-interleaved scans, the whole image otherwise.
    pub fn new(pixels: &'p [u8], parameters: JlsParameters, component_count: usize) -> Self {
        Self {
            pixels,
            parameters,
            component_count,
        }
    }

    fn serialize(&self, writer: &mut JpegStreamWriter) -> Result<(), JpeglsError> {
        let parameters = &self.parameters;
        let frame_info = parameters.frame_info;
        let coding_parameters = CodingParameters::new(
            frame_info.bits_per_sample,
            parameters.near_lossless,
            &parameters.preset_coding_parameters,
        )?;
        let layout = LineLayout::new(
            frame_info.width as usize,
            self.component_count,
            parameters.interleave_mode,
        );
        let mut encoder = ScanEncoder::new(coding_parameters, layout, frame_info.height as usize);
        let stride = parameters.effective_stride();

        let bytes_written = if frame_info.bits_per_sample <= 8 {
            let mut source = RawLineSource::<u8>::new(
                self.pixels,
                stride,
                parameters.color_transformation,
                frame_info.bits_per_sample,
            );
            encoder.encode_scan(&mut source, writer.output_stream())?
        } else {
            let mut source = RawLineSource::<u16>::new(
                self.pixels,
                stride,
                parameters.color_transformation,
                frame_info.bits_per_sample,
            );
            encoder.encode_scan(&mut source, writer.output_stream())?
        };

        writer.seek(bytes_written);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum JpegSegment<'p> {
    Marker(JpegMarkerSegment),
    ImageData(JpegImageDataSegment<'p>),
}

impl JpegSegment<'_> {
    pub fn serialize(&self, writer: &mut JpegStreamWriter) -> Result<(), JpeglsError> {
        match self {
            JpegSegment::Marker(segment) => writer.write_segment(segment.marker, &segment.payload),
            JpegSegment::ImageData(segment) => segment.serialize(writer),
        }
    }
}
