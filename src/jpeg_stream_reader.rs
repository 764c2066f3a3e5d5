use crate::FrameInfo;
use crate::byte_stream::ByteSource;
use crate::constants::{AUTO_CALCULATE_STRIDE, COLOR_TRANSFORMATION_TAG, SEGMENT_LENGTH_SIZE};
use crate::error::JpeglsError;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode};
use crate::jpegls::coding_parameters::{CodingParameters, JlsParameters, JpeglsPcParameters};
use crate::jpegls::process_line::RawLineSink;
use crate::jpegls::scan_codec::LineLayout;
use crate::jpegls::scan_decoder::ScanDecoder;
use crate::jpegls::{ColorTransformation, InterleaveMode};
use log::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegStreamReaderState {
    ExpectSoi,
    ExpectMarker,
    ExpectScanHeader,
    ReadingScanData,
    Done,
}

/// Parses the JPEG-LS marker segment container and drives the scan decoder.
pub struct JpegStreamReader<'a> {
    source: ByteSource<'a>,
    state: JpegStreamReaderState,
    parameters: JlsParameters,
    frame_read: bool,
    scan_component_count: usize,
    segment_bytes_read: usize,
}

impl<'a> JpegStreamReader<'a> {
    pub fn new(source: ByteSource<'a>) -> Self {
        Self {
            source,
            state: JpegStreamReaderState::ExpectSoi,
            parameters: JlsParameters::default(),
            frame_read: false,
            scan_component_count: 0,
            segment_bytes_read: 0,
        }
    }

    pub fn parameters(&self) -> JlsParameters {
        self.parameters
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.parameters.frame_info
    }

    /// Overrides the row stride of the destination buffer; 0 derives it from the frame.
    pub fn set_stride(&mut self, stride: usize) {
        self.parameters.stride = stride;
    }

    /// Bytes needed to hold the decoded image. Only meaningful once the header was read.
    pub fn destination_size(&self) -> usize {
        self.parameters.destination_size()
    }

    /// Reads every segment up to and including the first scan header.
    pub fn read_header(&mut self) -> Result<(), JpeglsError> {
        if self.state == JpegStreamReaderState::ExpectSoi {
            self.read_start_of_image()?;
        }

        if self.state == JpegStreamReaderState::ExpectMarker {
            self.read_markers_until_start_of_scan()?;
            self.read_start_of_scan()?;
        }

        Ok(())
    }

    /// Decodes all scans into `destination` and consumes the EOI marker.
    pub fn read(&mut self, destination: &mut [u8]) -> Result<(), JpeglsError> {
        self.read_header()?;
        if self.state != JpegStreamReaderState::ReadingScanData {
            return Err(JpeglsError::InvalidData);
        }

        let stride = self.parameters.effective_stride();
        if stride < self.parameters.minimum_stride() {
            return Err(JpeglsError::InvalidJlsParameters);
        }

        if destination.len() < self.parameters.destination_size() {
            return Err(JpeglsError::UncompressedBufferTooSmall);
        }

        let component_count = self.parameters.frame_info.component_count as usize;
        let mut component_index = 0;
        while component_index < component_count {
            if self.state == JpegStreamReaderState::ExpectMarker {
                self.read_markers_until_start_of_scan()?;
                self.read_start_of_scan()?;
            }

            if component_index + self.scan_component_count > component_count {
                return Err(JpeglsError::InvalidData);
            }

            // Each non-interleaved scan fills its own plane.
            let plane_offset = component_index * self.parameters.plane_size();
            self.decode_scan(&mut destination[plane_offset..])?;
            component_index += self.scan_component_count;
            self.state = JpegStreamReaderState::ExpectMarker;
        }

        self.read_end_of_image()
    }

    fn decode_scan(&mut self, destination: &mut [u8]) -> Result<(), JpeglsError> {
        let parameters = self.parameters;
        let frame_info = parameters.frame_info;
        let coding_parameters = CodingParameters::new(
            frame_info.bits_per_sample,
            parameters.near_lossless,
            &parameters.preset_coding_parameters,
        )?;
        let layout = LineLayout::new(
            frame_info.width as usize,
            self.scan_component_count,
            parameters.interleave_mode,
        );
        let mut decoder = ScanDecoder::new(coding_parameters, layout, frame_info.height as usize);
        let stride = parameters.effective_stride();

        if frame_info.bits_per_sample <= 8 {
            let mut sink = RawLineSink::<u8>::new(
                destination,
                stride,
                parameters.color_transformation,
                frame_info.bits_per_sample,
            );
            decoder.decode_scan(&mut self.source, &mut sink)
        } else {
            let mut sink = RawLineSink::<u16>::new(
                destination,
                stride,
                parameters.color_transformation,
                frame_info.bits_per_sample,
            );
            decoder.decode_scan(&mut self.source, &mut sink)
        }
    }

    fn read_start_of_image(&mut self) -> Result<(), JpeglsError> {
        if self.source.read_u8()? != JPEG_MARKER_START_BYTE
            || self.source.read_u8()? != u8::from(JpegMarkerCode::StartOfImage)
        {
            return Err(JpeglsError::JpegMarkerStartByteNotFound);
        }

        self.state = JpegStreamReaderState::ExpectMarker;
        Ok(())
    }

    fn read_end_of_image(&mut self) -> Result<(), JpeglsError> {
        if self.read_next_marker_code()? != JpegMarkerCode::EndOfImage {
            return Err(JpeglsError::InvalidData);
        }

        self.state = JpegStreamReaderState::Done;
        Ok(())
    }

    fn read_next_marker_code(&mut self) -> Result<JpegMarkerCode, JpeglsError> {
        if self.source.read_u8()? != JPEG_MARKER_START_BYTE {
            return Err(JpeglsError::JpegMarkerStartByteNotFound);
        }

        // Any number of 0xFF fill bytes may precede the marker code.
        let mut code = self.source.read_u8()?;
        while code == JPEG_MARKER_START_BYTE {
            code = self.source.read_u8()?;
        }

        JpegMarkerCode::try_from(code).map_err(|_| JpeglsError::UnknownJpegMarkerFound)
    }

    fn read_markers_until_start_of_scan(&mut self) -> Result<(), JpeglsError> {
        loop {
            let marker = self.read_next_marker_code()?;
            if marker == JpegMarkerCode::StartOfScan {
                self.state = JpegStreamReaderState::ExpectScanHeader;
                return Ok(());
            }
            self.read_marker_segment(marker)?;
        }
    }

    fn read_marker_segment(&mut self, marker: JpegMarkerCode) -> Result<(), JpeglsError> {
        match marker {
            JpegMarkerCode::StartOfFrameJpegls
            | JpegMarkerCode::JpeglsPresetParameters
            | JpegMarkerCode::Comment
            | JpegMarkerCode::ApplicationData0
            | JpegMarkerCode::ApplicationData7
            | JpegMarkerCode::ApplicationData8 => {}
            marker if marker.is_start_of_frame_other_than_jpegls() => {
                return Err(JpeglsError::EncodingNotSupported);
            }
            _ => return Err(JpeglsError::UnknownJpegMarkerFound),
        }

        let length = self.source.read_u16()? as usize;
        if length < SEGMENT_LENGTH_SIZE {
            return Err(JpeglsError::InvalidData);
        }
        let payload_size = length - SEGMENT_LENGTH_SIZE;
        trace!("{:?} segment, {} bytes", marker, length);

        self.segment_bytes_read = 0;
        match marker {
            JpegMarkerCode::StartOfFrameJpegls => self.read_start_of_frame_segment()?,
            JpegMarkerCode::JpeglsPresetParameters => self.read_preset_parameters_segment()?,
            JpegMarkerCode::ApplicationData8 => self.read_color_transformation_segment(payload_size)?,
            _ => {}
        }

        if self.segment_bytes_read > payload_size {
            return Err(JpeglsError::InvalidData);
        }
        self.source.skip(payload_size - self.segment_bytes_read)
    }

    fn read_start_of_frame_segment(&mut self) -> Result<(), JpeglsError> {
        if self.frame_read {
            return Err(JpeglsError::InvalidData);
        }

        let bits_per_sample = self.read_u8()? as i32;
        let height = self.read_u16()? as u32;
        let width = self.read_u16()? as u32;
        let component_count = self.read_u8()? as i32;

        self.parameters.frame_info = FrameInfo {
            width,
            height,
            bits_per_sample,
            component_count,
        };
        self.frame_read = true;
        debug!(
            "frame: {}x{}, {} bit, {} component(s)",
            width, height, bits_per_sample, component_count
        );
        Ok(())
    }

    fn read_preset_parameters_segment(&mut self) -> Result<(), JpeglsError> {
        match self.read_u8()? {
            1 => {
                let preset_coding_parameters = JpeglsPcParameters {
                    maximum_sample_value: self.read_u16()? as i32,
                    threshold1: self.read_u16()? as i32,
                    threshold2: self.read_u16()? as i32,
                    threshold3: self.read_u16()? as i32,
                    reset_value: self.read_u16()? as i32,
                };
                debug!("preset coding parameters: {:?}", preset_coding_parameters);
                self.parameters.preset_coding_parameters = preset_coding_parameters;
                Ok(())
            }
            // Mapping tables and oversize image dimensions.
            2..=4 => Err(JpeglsError::EncodingNotSupported),
            _ => Err(JpeglsError::InvalidJlsParameters),
        }
    }

    fn read_color_transformation_segment(&mut self, payload_size: usize) -> Result<(), JpeglsError> {
        if payload_size < COLOR_TRANSFORMATION_TAG.len() {
            return Ok(());
        }

        let mut tag = [0u8; 4];
        self.read_bytes(&mut tag)?;
        if tag != COLOR_TRANSFORMATION_TAG {
            warn!("skipping APP8 segment without the colour transformation tag");
            return Ok(());
        }

        self.parameters.color_transformation = match self.read_u8()? {
            value @ 0..=3 => ColorTransformation::try_from(value).map_err(|_| JpeglsError::InvalidData)?,
            4 | 5 => return Err(JpeglsError::ImageTypeNotSupported),
            _ => return Err(JpeglsError::InvalidData),
        };
        debug!("colour transformation: {:?}", self.parameters.color_transformation);
        Ok(())
    }

    fn read_start_of_scan(&mut self) -> Result<(), JpeglsError> {
        if !self.frame_read {
            return Err(JpeglsError::InvalidData);
        }

        let length = self.source.read_u16()? as usize;
        let component_count = self.source.read_u8()? as i32;
        if component_count != 1 && component_count != self.parameters.frame_info.component_count {
            return Err(JpeglsError::ParameterValueNotSupported);
        }

        for _ in 0..component_count {
            self.source.read_u8()?; // component id
            self.source.read_u8()?; // mapping table selector
        }

        let near_lossless = self.source.read_u8()? as i32;
        let interleave_mode =
            InterleaveMode::try_from(self.source.read_u8()?).map_err(|_| JpeglsError::InvalidData)?;
        if self.source.read_u8()? != 0 {
            return Err(JpeglsError::InvalidData);
        }

        let expected_length = 6 + 2 * component_count as usize;
        if length != expected_length {
            warn!("SOS length is {}, expected {}", length, expected_length);
        }

        let interleaved = component_count > 1;
        if interleaved == (interleave_mode == InterleaveMode::None)
            && self.parameters.frame_info.component_count > 1
        {
            return Err(JpeglsError::InvalidData);
        }

        self.parameters.near_lossless = near_lossless;
        self.parameters.interleave_mode = interleave_mode;
        self.parameters.check_parameter_coherent()?;
        if self.parameters.stride == AUTO_CALCULATE_STRIDE {
            self.parameters.stride = self.parameters.minimum_stride();
        }

        self.scan_component_count = component_count as usize;
        self.state = JpegStreamReaderState::ReadingScanData;
        debug!(
            "scan: {} component(s), NEAR={}, {:?} interleave",
            component_count, near_lossless, interleave_mode
        );
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, JpeglsError> {
        self.segment_bytes_read += 1;
        self.source.read_u8()
    }

    fn read_u16(&mut self) -> Result<u16, JpeglsError> {
        self.segment_bytes_read += 2;
        self.source.read_u16()
    }

    fn read_bytes(&mut self, destination: &mut [u8]) -> Result<(), JpeglsError> {
        self.segment_bytes_read += destination.len();
        self.source.read_bytes(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOF_8_BIT_4X2_GRAY: [u8; 13] = [0xFF, 0xF7, 0x00, 0x0B, 8, 0, 2, 0, 4, 1, 1, 0x11, 0];
    const SOS_GRAY: [u8; 10] = [0xFF, 0xDA, 0x00, 0x08, 1, 1, 0, 0, 0, 0];

    fn stream(segments: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        for segment in segments {
            data.extend_from_slice(segment);
        }
        data
    }

    fn read_header(data: &[u8]) -> Result<JlsParameters, JpeglsError> {
        let mut reader = JpegStreamReader::new(ByteSource::Buffer(data));
        reader.read_header()?;
        Ok(reader.parameters())
    }

    #[test]
    fn test_read_header_parses_frame_and_scan() {
        let parameters = read_header(&stream(&[&SOF_8_BIT_4X2_GRAY, &SOS_GRAY])).unwrap();
        assert_eq!(
            parameters.frame_info,
            FrameInfo {
                width: 4,
                height: 2,
                bits_per_sample: 8,
                component_count: 1
            }
        );
        assert_eq!(parameters.interleave_mode, InterleaveMode::None);
        assert_eq!(parameters.stride, 4);
        assert_eq!(parameters.destination_size(), 8);
    }

    #[test]
    fn test_missing_start_of_image() {
        assert_eq!(read_header(&[0x00, 0xD8]), Err(JpeglsError::JpegMarkerStartByteNotFound));
        assert_eq!(read_header(&[0xFF, 0xD9]), Err(JpeglsError::JpegMarkerStartByteNotFound));
    }

    #[test]
    fn test_fill_bytes_before_marker_are_skipped() {
        let data = stream(&[&[0xFF, 0xFF, 0xFF], &SOF_8_BIT_4X2_GRAY, &[0xFF], &SOS_GRAY]);
        assert!(read_header(&data).is_ok());
    }

    #[test]
    fn test_comment_and_application_segments_are_skipped() {
        let comment = [0xFF, 0xFE, 0x00, 0x05, b'a', b'b', b'c'];
        let app0 = [0xFF, 0xE0, 0x00, 0x04, 1, 2];
        let app7 = [0xFF, 0xE7, 0x00, 0x02];
        let app8 = [0xFF, 0xE8, 0x00, 0x07, b'x', b'y', b'z', b'w', 1];
        let data = stream(&[&comment, &app0, &app7, &app8, &SOF_8_BIT_4X2_GRAY, &SOS_GRAY]);
        let parameters = read_header(&data).unwrap();
        assert_eq!(parameters.color_transformation, ColorTransformation::None);
    }

    #[test]
    fn test_color_transformation_segment() {
        let app8 = |value: u8| [0xFF, 0xE8, 0x00, 0x07, b'm', b'r', b'f', b'x', value];
        let sof = [0xFF, 0xF7, 0x00, 0x11, 8, 0, 1, 0, 1, 3, 1, 0x11, 0, 2, 0x11, 0, 3, 0x11, 0];
        let sos = [0xFF, 0xDA, 0x00, 0x0C, 3, 1, 0, 2, 0, 3, 0, 0, 1, 0];

        let parameters = read_header(&stream(&[&sof, &app8(2), &sos])).unwrap();
        assert_eq!(parameters.color_transformation, ColorTransformation::Hp2);
        assert_eq!(parameters.interleave_mode, InterleaveMode::Line);
        assert_eq!(parameters.stride, 3);

        assert_eq!(
            read_header(&stream(&[&sof, &app8(5), &sos])),
            Err(JpeglsError::ImageTypeNotSupported)
        );
        assert_eq!(read_header(&stream(&[&sof, &app8(6), &sos])), Err(JpeglsError::InvalidData));
    }

    #[test]
    fn test_preset_parameters_segment() {
        let lse = [0xFF, 0xF8, 0x00, 0x0D, 1, 0, 255, 0, 4, 0, 8, 0, 22, 0, 32];
        let parameters = read_header(&stream(&[&SOF_8_BIT_4X2_GRAY, &lse, &SOS_GRAY])).unwrap();
        assert_eq!(
            parameters.preset_coding_parameters,
            JpeglsPcParameters {
                maximum_sample_value: 255,
                threshold1: 4,
                threshold2: 8,
                threshold3: 22,
                reset_value: 32
            }
        );

        let mapping_table = [0xFF, 0xF8, 0x00, 0x05, 2, 1, 1];
        assert_eq!(
            read_header(&stream(&[&SOF_8_BIT_4X2_GRAY, &mapping_table])),
            Err(JpeglsError::EncodingNotSupported)
        );
    }

    #[test]
    fn test_segment_shorter_than_its_content() {
        let lse = [0xFF, 0xF8, 0x00, 0x05, 1, 0, 255, 0, 4, 0, 8, 0, 22, 0, 32];
        assert_eq!(
            read_header(&stream(&[&SOF_8_BIT_4X2_GRAY, &lse, &SOS_GRAY])),
            Err(JpeglsError::InvalidData)
        );
    }

    #[test]
    fn test_unsupported_markers() {
        let sof0 = [0xFF, 0xC0, 0x00, 0x0B, 8, 0, 2, 0, 4, 1, 1, 0x11, 0];
        assert_eq!(read_header(&stream(&[&sof0])), Err(JpeglsError::EncodingNotSupported));

        let app1 = [0xFF, 0xE1, 0x00, 0x02];
        assert_eq!(read_header(&stream(&[&app1])), Err(JpeglsError::UnknownJpegMarkerFound));

        let dqt = [0xFF, 0xDB, 0x00, 0x02];
        assert_eq!(read_header(&stream(&[&dqt])), Err(JpeglsError::UnknownJpegMarkerFound));
    }

    #[test]
    fn test_scan_header_checks() {
        let sos = |count: u8, ilv: u8, reserved: u8| {
            let mut segment = vec![0xFF, 0xDA, 0x00, 6 + 2 * count, count];
            for id in 1..=count {
                segment.extend_from_slice(&[id, 0]);
            }
            segment.extend_from_slice(&[0, ilv, reserved]);
            segment
        };

        assert_eq!(
            read_header(&stream(&[&SOF_8_BIT_4X2_GRAY, &sos(1, 3, 0)])),
            Err(JpeglsError::InvalidData)
        );
        assert_eq!(
            read_header(&stream(&[&SOF_8_BIT_4X2_GRAY, &sos(1, 0, 1)])),
            Err(JpeglsError::InvalidData)
        );
        assert_eq!(
            read_header(&stream(&[&SOF_8_BIT_4X2_GRAY, &sos(2, 1, 0)])),
            Err(JpeglsError::ParameterValueNotSupported)
        );
        assert_eq!(read_header(&stream(&[&sos(1, 0, 0)])), Err(JpeglsError::InvalidData));
    }

    #[test]
    fn test_one_bit_samples_are_rejected() {
        let sof = [0xFF, 0xF7, 0x00, 0x0B, 1, 0, 2, 0, 4, 1, 1, 0x11, 0];
        assert_eq!(
            read_header(&stream(&[&sof, &SOS_GRAY])),
            Err(JpeglsError::ParameterValueNotSupported)
        );
    }
}
