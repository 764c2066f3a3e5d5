use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Marker codes that can appear in a JPEG-LS byte stream.
///
/// Codes not listed here are reported as unknown markers by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum JpegMarkerCode {
    /// SOF_0: Marks the start of a baseline DCT frame.
    StartOfFrameBaseline = 0xC0,
    /// SOF_1: Marks the start of an extended sequential DCT frame (Huffman).
    StartOfFrameExtendedSequential = 0xC1,
    /// SOF_2: Marks the start of a progressive DCT frame (Huffman).
    StartOfFrameProgressive = 0xC2,
    /// SOF_3: Marks the start of a lossless (sequential) frame (Huffman).
    StartOfFrameLossless = 0xC3,
    /// SOF_5: Differential sequential DCT (Huffman).
    StartOfFrameDifferentialSequential = 0xC5,
    /// SOF_6: Differential progressive DCT (Huffman).
    StartOfFrameDifferentialProgressive = 0xC6,
    /// SOF_7: Differential lossless (Huffman).
    StartOfFrameDifferentialLossless = 0xC7,
    /// SOF_9: Extended sequential DCT (arithmetic).
    StartOfFrameExtendedArithmetic = 0xC9,
    /// SOF_10: Progressive DCT (arithmetic).
    StartOfFrameProgressiveArithmetic = 0xCA,
    /// SOF_11: Lossless (arithmetic).
    StartOfFrameLosslessArithmetic = 0xCB,
    /// SOF_13: Differential sequential DCT (arithmetic).
    StartOfFrameDifferentialSequentialArithmetic = 0xCD,
    /// SOF_14: Differential progressive DCT (arithmetic).
    StartOfFrameDifferentialProgressiveArithmetic = 0xCE,
    /// SOF_15: Differential lossless (arithmetic).
    StartOfFrameDifferentialLosslessArithmetic = 0xCF,

    /// SOI: Marks the start of an image.
    StartOfImage = 0xD8,

    /// EOI: Marks the end of an image.
    EndOfImage = 0xD9,

    /// SOS: Marks the start of scan.
    StartOfScan = 0xDA,

    /// DNL: Defines the number of lines in a scan.
    DefineNumberOfLines = 0xDC,

    /// DRI: Defines the restart interval used in succeeding scans.
    DefineRestartInterval = 0xDD,

    /// APP0: Application data 0: used for JFIF header.
    ApplicationData0 = 0xE0,
    /// APP1: Application data 1: used for EXIF or XMP header.
    ApplicationData1 = 0xE1,
    /// APP2: Application data 2: used for ICC profile.
    ApplicationData2 = 0xE2,
    /// APP3: Application data 3: used for meta info
    ApplicationData3 = 0xE3,
    /// APP4: Application data 4.
    ApplicationData4 = 0xE4,
    /// APP5: Application data 5.
    ApplicationData5 = 0xE5,
    /// APP6: Application data 6.
    ApplicationData6 = 0xE6,
    /// APP7: Application data 7: used for HP color-space info.
    ApplicationData7 = 0xE7,
    /// APP8: Application data 8: used for HP color-transformation info.
    ApplicationData8 = 0xE8,
    /// APP9: Application data 9.
    ApplicationData9 = 0xE9,
    /// APP10: Application data 10.
    ApplicationData10 = 0xEA,
    /// APP11: Application data 11.
    ApplicationData11 = 0xEB,
    /// APP12: Application data 12: used for Picture info.
    ApplicationData12 = 0xEC,
    /// APP13: Application data 13: used by PhotoShop IRB
    ApplicationData13 = 0xED,
    /// APP14: Application data 14: used by Adobe
    ApplicationData14 = 0xEE,
    /// APP15: Application data 15.
    ApplicationData15 = 0xEF,

    /// COM: Comment block.
    Comment = 0xFE,

    // The following markers are defined in ISO/IEC 14495-1 | ITU T.87. (JPEG-LS standard)
    /// SOF_55: Marks the start of a JPEG-LS encoded frame.
    StartOfFrameJpegls = 0xF7,

    /// LSE: Marks the start of a JPEG-LS preset parameters segment.
    JpeglsPresetParameters = 0xF8,
}

impl JpegMarkerCode {
    /// True for the start-of-frame markers of the other JPEG processes (ISO/IEC 10918-1).
    pub fn is_start_of_frame_other_than_jpegls(self) -> bool {
        matches!(
            self,
            Self::StartOfFrameBaseline
                | Self::StartOfFrameExtendedSequential
                | Self::StartOfFrameProgressive
                | Self::StartOfFrameLossless
                | Self::StartOfFrameDifferentialSequential
                | Self::StartOfFrameDifferentialProgressive
                | Self::StartOfFrameDifferentialLossless
                | Self::StartOfFrameExtendedArithmetic
                | Self::StartOfFrameProgressiveArithmetic
                | Self::StartOfFrameLosslessArithmetic
                | Self::StartOfFrameDifferentialSequentialArithmetic
                | Self::StartOfFrameDifferentialProgressiveArithmetic
                | Self::StartOfFrameDifferentialLosslessArithmetic
        )
    }
}

pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_code_conversion() {
        assert_eq!(JpegMarkerCode::try_from(0xF7).ok(), Some(JpegMarkerCode::StartOfFrameJpegls));
        assert_eq!(u8::from(JpegMarkerCode::JpeglsPresetParameters), 0xF8);
        assert!(JpegMarkerCode::try_from(0xC4).is_err());
        assert!(JpegMarkerCode::try_from(0x00).is_err());
    }

    #[test]
    fn test_other_start_of_frame_markers() {
        for code in [0xC0, 0xC1, 0xC2, 0xC3, 0xC5, 0xC6, 0xC7, 0xC9, 0xCA, 0xCB, 0xCD, 0xCE, 0xCF] {
            let marker = JpegMarkerCode::try_from(code).unwrap();
            assert!(marker.is_start_of_frame_other_than_jpegls(), "0x{code:02X}");
        }
        assert!(!JpegMarkerCode::StartOfFrameJpegls.is_start_of_frame_other_than_jpegls());
    }
}
