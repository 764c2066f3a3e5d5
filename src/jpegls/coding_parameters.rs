use crate::FrameInfo;
use crate::constants::{
    AUTO_CALCULATE_STRIDE, DEFAULT_RESET_THRESHOLD, MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT_IN_SCAN,
    MAXIMUM_NEAR_LOSSLESS, MINIMUM_BITS_PER_SAMPLE,
};
use crate::error::JpeglsError;
use crate::jpegls::{ColorTransformation, InterleaveMode};
use std::cmp::{max, min};

/// JPEG-LS preset coding parameters (LSE type 1). A zero field selects the default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JpeglsPcParameters {
    pub maximum_sample_value: i32,
    pub threshold1: i32,
    pub threshold2: i32,
    pub threshold3: i32,
    pub reset_value: i32,
}

/// The complete parameter set of an encoded image, as assembled from SOF, LSE, APP8 and SOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JlsParameters {
    pub frame_info: FrameInfo,
    pub near_lossless: i32,
    pub interleave_mode: InterleaveMode,
    pub color_transformation: ColorTransformation,
    /// Bytes per row of the uncompressed buffer; 0 means "derive from the frame".
    pub stride: usize,
    pub preset_coding_parameters: JpeglsPcParameters,
}

impl JlsParameters {
    pub fn bytes_per_sample(&self) -> usize {
        self.frame_info.bytes_per_sample()
    }

    /// Components stored side by side in one row of the uncompressed buffer.
    pub fn components_in_row(&self) -> usize {
        match self.interleave_mode {
            InterleaveMode::None => 1,
            InterleaveMode::Line | InterleaveMode::Sample => self.frame_info.component_count as usize,
        }
    }

    /// Number of separate planes in the uncompressed buffer.
    pub fn plane_count(&self) -> usize {
        match self.interleave_mode {
            InterleaveMode::None => self.frame_info.component_count as usize,
            InterleaveMode::Line | InterleaveMode::Sample => 1,
        }
    }

    pub fn minimum_stride(&self) -> usize {
        self.frame_info.width as usize * self.components_in_row() * self.bytes_per_sample()
    }

    pub fn effective_stride(&self) -> usize {
        if self.stride == AUTO_CALCULATE_STRIDE {
            self.minimum_stride()
        } else {
            self.stride
        }
    }

    pub fn plane_size(&self) -> usize {
        self.effective_stride() * self.frame_info.height as usize
    }

    /// Size of the uncompressed buffer that holds every component of the image.
    pub fn destination_size(&self) -> usize {
        self.plane_size() * self.plane_count()
    }

    /// Verifies that bit depth, component count and interleave mode form a supported combination.
    pub fn check_parameter_coherent(&self) -> Result<(), JpeglsError> {
        let frame_info = &self.frame_info;
        if !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&frame_info.bits_per_sample) {
            return Err(JpeglsError::ParameterValueNotSupported);
        }

        if frame_info.width == 0 || frame_info.height == 0 {
            return Err(JpeglsError::ParameterValueNotSupported);
        }

        match frame_info.component_count {
            count if count <= 0 => Err(JpeglsError::InvalidJlsParameters),
            4 if self.interleave_mode == InterleaveMode::Sample => Err(JpeglsError::ParameterValueNotSupported),
            count if count > MAXIMUM_COMPONENT_COUNT_IN_SCAN && self.interleave_mode != InterleaveMode::None => {
                Err(JpeglsError::ParameterValueNotSupported)
            }
            _ => Ok(()),
        }
    }
}

/// Numeric parameters a scan is coded with, derived from bit depth, NEAR and the preset values
/// (ISO/IEC 14495-1, A.2.1 and C.2.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingParameters {
    pub maximum_sample_value: i32,
    pub near_lossless: i32,
    pub range: i32,
    pub bits_per_sample: i32,
    pub quantized_bits_per_sample: i32,
    pub limit: i32,
    pub reset_threshold: i32,
    pub threshold1: i32,
    pub threshold2: i32,
    pub threshold3: i32,
}

impl CodingParameters {
    pub fn new(
        bits_per_sample: i32,
        near_lossless: i32,
        preset_coding_parameters: &JpeglsPcParameters,
    ) -> Result<Self, JpeglsError> {
        if !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&bits_per_sample) {
            return Err(JpeglsError::ParameterValueNotSupported);
        }

        let validated = is_valid(preset_coding_parameters, (1 << bits_per_sample) - 1, near_lossless)?;
        let maximum_sample_value = validated.maximum_sample_value;
        let range = compute_range_parameter(maximum_sample_value, near_lossless);
        let bits_per_sample = max(2, log2_ceil(maximum_sample_value + 1));

        Ok(Self {
            maximum_sample_value,
            near_lossless,
            range,
            bits_per_sample,
            quantized_bits_per_sample: log2_ceil(range),
            limit: compute_limit_parameter(bits_per_sample),
            reset_threshold: validated.reset_value,
            threshold1: validated.threshold1,
            threshold2: validated.threshold2,
            threshold3: validated.threshold3,
        })
    }

    pub fn is_near(&self, lhs: i32, rhs: i32) -> bool {
        (lhs - rhs).abs() <= self.near_lossless
    }

    pub fn correct_prediction(&self, predicted: i32) -> i32 {
        predicted.clamp(0, self.maximum_sample_value)
    }

    /// Prediction error reduced to the coded range (A.4.4, A.4.5).
    pub fn compute_error_value(&self, error_value: i32) -> i32 {
        self.modulo_range(self.quantize(error_value))
    }

    pub fn compute_reconstructed_sample(&self, predicted_value: i32, error_value: i32) -> i32 {
        self.fix_reconstructed_value(predicted_value + self.dequantize(error_value))
    }

    fn quantize(&self, error_value: i32) -> i32 {
        let near = self.near_lossless;
        if error_value > near {
            (error_value + near) / (2 * near + 1)
        } else if error_value < -near {
            (error_value - near) / (2 * near + 1)
        } else {
            0
        }
    }

    fn dequantize(&self, error_value: i32) -> i32 {
        error_value * (2 * self.near_lossless + 1)
    }

    fn modulo_range(&self, mut error_value: i32) -> i32 {
        if error_value < 0 {
            error_value += self.range;
        }
        if error_value >= (self.range + 1) / 2 {
            error_value -= self.range;
        }
        error_value
    }

    fn fix_reconstructed_value(&self, mut value: i32) -> i32 {
        let near = self.near_lossless;
        if value < -near {
            value += self.range * (2 * near + 1);
        } else if value > self.maximum_sample_value + near {
            value -= self.range * (2 * near + 1);
        }
        self.correct_prediction(value)
    }
}

// Clamping function as defined by ISO/IEC 14495-1, Figure C.3
const fn clamp(i: i32, j: i32, maximum_sample_value: i32) -> i32 {
    if i > maximum_sample_value || i < j { j } else { i }
}

pub fn compute_maximum_near_lossless(maximum_sample_value: i32) -> i32 {
    min(MAXIMUM_NEAR_LOSSLESS, maximum_sample_value / 2)
}

// Default coding threshold values as defined by ISO/IEC 14495-1, C.2.4.1.1.1
pub fn compute_default(maximum_sample_value: i32, near_lossless: i32) -> JpeglsPcParameters {
    debug_assert!(maximum_sample_value <= u16::MAX as i32);
    debug_assert!(near_lossless >= 0 && near_lossless <= compute_maximum_near_lossless(maximum_sample_value));

    // Default threshold values for JPEG-LS statistical modeling as defined in ISO/IEC 14495-1, table C.3
    // for the case MAXVAL = 255 and NEAR = 0.
    const DEFAULT_THRESHOLD1: i32 = 3; // BASIC_T1
    const DEFAULT_THRESHOLD2: i32 = 7; // BASIC_T2
    const DEFAULT_THRESHOLD3: i32 = 21; // BASIC_T3

    let (threshold1, threshold2, threshold3) = if maximum_sample_value >= 128 {
        let factor = (min(maximum_sample_value, 4095) + 128) / 256;
        let threshold1 = clamp(
            factor * (DEFAULT_THRESHOLD1 - 2) + 2 + 3 * near_lossless,
            near_lossless + 1,
            maximum_sample_value,
        );
        let threshold2 = clamp(
            factor * (DEFAULT_THRESHOLD2 - 3) + 3 + 5 * near_lossless,
            threshold1,
            maximum_sample_value,
        );
        let threshold3 = clamp(
            factor * (DEFAULT_THRESHOLD3 - 4) + 4 + 7 * near_lossless,
            threshold2,
            maximum_sample_value,
        );
        (threshold1, threshold2, threshold3)
    } else {
        let factor = 256 / (maximum_sample_value + 1);
        let threshold1 = clamp(
            max(2, DEFAULT_THRESHOLD1 / factor + 3 * near_lossless),
            near_lossless + 1,
            maximum_sample_value,
        );
        let threshold2 = clamp(
            max(3, DEFAULT_THRESHOLD2 / factor + 5 * near_lossless),
            threshold1,
            maximum_sample_value,
        );
        let threshold3 = clamp(
            max(4, DEFAULT_THRESHOLD3 / factor + 7 * near_lossless),
            threshold2,
            maximum_sample_value,
        );
        (threshold1, threshold2, threshold3)
    };

    JpeglsPcParameters {
        maximum_sample_value,
        threshold1,
        threshold2,
        threshold3,
        reset_value: DEFAULT_RESET_THRESHOLD,
    }
}

pub fn is_default(preset_coding_parameters: &JpeglsPcParameters, defaults: &JpeglsPcParameters) -> bool {
    *preset_coding_parameters == JpeglsPcParameters::default() || preset_coding_parameters == defaults
}

/// Validates preset coding parameters against ISO/IEC 14495-1, C.2.4.1.1, Table C.1 and
/// returns them with every zero field replaced by its default.
pub fn is_valid(
    pc_parameters: &JpeglsPcParameters,
    maximum_component_value: i32,
    near_lossless: i32,
) -> Result<JpeglsPcParameters, JpeglsError> {
    debug_assert!(maximum_component_value >= 3 && maximum_component_value <= u16::MAX as i32);

    if pc_parameters.maximum_sample_value != 0
        && (pc_parameters.maximum_sample_value < 1 || pc_parameters.maximum_sample_value > maximum_component_value)
    {
        return Err(JpeglsError::InvalidJlsParameters);
    }

    let maximum_sample_value = if pc_parameters.maximum_sample_value != 0 {
        pc_parameters.maximum_sample_value
    } else {
        maximum_component_value
    };

    if near_lossless < 0 || near_lossless > compute_maximum_near_lossless(maximum_sample_value) {
        return Err(JpeglsError::InvalidJlsParameters);
    }

    if pc_parameters.threshold1 != 0
        && (pc_parameters.threshold1 < near_lossless + 1 || pc_parameters.threshold1 > maximum_sample_value)
    {
        return Err(JpeglsError::InvalidJlsParameters);
    }

    let defaults = compute_default(maximum_sample_value, near_lossless);

    let threshold1 = if pc_parameters.threshold1 != 0 {
        pc_parameters.threshold1
    } else {
        defaults.threshold1
    };

    if pc_parameters.threshold2 != 0
        && (pc_parameters.threshold2 < threshold1 || pc_parameters.threshold2 > maximum_sample_value)
    {
        return Err(JpeglsError::InvalidJlsParameters);
    }

    let threshold2 = if pc_parameters.threshold2 != 0 {
        pc_parameters.threshold2
    } else {
        defaults.threshold2
    };

    if pc_parameters.threshold3 != 0
        && (pc_parameters.threshold3 < threshold2 || pc_parameters.threshold3 > maximum_sample_value)
    {
        return Err(JpeglsError::InvalidJlsParameters);
    }

    if pc_parameters.reset_value != 0
        && (pc_parameters.reset_value < 3 || pc_parameters.reset_value > max(255, maximum_sample_value))
    {
        return Err(JpeglsError::InvalidJlsParameters);
    }

    Ok(JpeglsPcParameters {
        maximum_sample_value,
        threshold1,
        threshold2,
        threshold3: if pc_parameters.threshold3 != 0 {
            pc_parameters.threshold3
        } else {
            defaults.threshold3
        },
        reset_value: if pc_parameters.reset_value != 0 {
            pc_parameters.reset_value
        } else {
            defaults.reset_value
        },
    })
}

// RANGE as defined by ISO/IEC 14495-1, A.2.1
pub fn compute_range_parameter(maximum_sample_value: i32, near_lossless: i32) -> i32 {
    (maximum_sample_value + 2 * near_lossless) / (2 * near_lossless + 1) + 1
}

// LIMIT as defined by ISO/IEC 14495-1, A.2.1
pub fn compute_limit_parameter(bits_per_sample: i32) -> i32 {
    2 * (bits_per_sample + max(8, bits_per_sample))
}

/// Smallest `x` with `2^x >= n`.
pub fn log2_ceil(n: i32) -> i32 {
    let mut x = 0;
    while n > (1 << x) {
        x += 1;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters(component_count: i32, interleave_mode: InterleaveMode) -> JlsParameters {
        JlsParameters {
            frame_info: FrameInfo {
                width: 16,
                height: 8,
                bits_per_sample: 8,
                component_count,
            },
            interleave_mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_compute_default_8_bit() {
        let defaults = compute_default(255, 0);
        assert_eq!(
            defaults,
            JpeglsPcParameters {
                maximum_sample_value: 255,
                threshold1: 3,
                threshold2: 7,
                threshold3: 21,
                reset_value: 64
            }
        );
    }

    #[test]
    fn test_compute_default_other_depths() {
        let twelve_bit = compute_default(4095, 0);
        assert_eq!((twelve_bit.threshold1, twelve_bit.threshold2, twelve_bit.threshold3), (18, 67, 276));

        let sixteen_bit = compute_default(65535, 0);
        assert_eq!((sixteen_bit.threshold1, sixteen_bit.threshold2, sixteen_bit.threshold3), (18, 67, 276));

        let four_bit = compute_default(15, 0);
        assert_eq!((four_bit.threshold1, four_bit.threshold2, four_bit.threshold3), (2, 3, 4));

        let near_lossless = compute_default(255, 3);
        assert_eq!(
            (near_lossless.threshold1, near_lossless.threshold2, near_lossless.threshold3),
            (12, 22, 42)
        );
    }

    #[test]
    fn test_is_valid_fills_defaults() {
        let validated = is_valid(&JpeglsPcParameters::default(), 255, 0).unwrap();
        assert_eq!(validated, compute_default(255, 0));

        let custom = JpeglsPcParameters {
            threshold1: 4,
            ..Default::default()
        };
        let validated = is_valid(&custom, 255, 0).unwrap();
        assert_eq!(validated.threshold1, 4);
        assert_eq!(validated.threshold2, 7);
    }

    #[test]
    fn test_is_valid_rejects_out_of_range_values() {
        let too_large = JpeglsPcParameters {
            maximum_sample_value: 256,
            ..Default::default()
        };
        assert_eq!(is_valid(&too_large, 255, 0), Err(JpeglsError::InvalidJlsParameters));

        let unordered = JpeglsPcParameters {
            threshold1: 10,
            threshold2: 5,
            ..Default::default()
        };
        assert_eq!(is_valid(&unordered, 255, 0), Err(JpeglsError::InvalidJlsParameters));

        let bad_reset = JpeglsPcParameters {
            reset_value: 2,
            ..Default::default()
        };
        assert_eq!(is_valid(&bad_reset, 255, 0), Err(JpeglsError::InvalidJlsParameters));

        assert_eq!(
            is_valid(&JpeglsPcParameters::default(), 255, 128),
            Err(JpeglsError::InvalidJlsParameters)
        );
    }

    #[test]
    fn test_is_default() {
        let defaults = compute_default(255, 0);
        assert!(is_default(&JpeglsPcParameters::default(), &defaults));
        assert!(is_default(&defaults, &defaults));
        let custom = JpeglsPcParameters {
            reset_value: 32,
            ..defaults
        };
        assert!(!is_default(&custom, &defaults));
    }

    #[test]
    fn test_coding_parameters_derivation() {
        let lossless = CodingParameters::new(8, 0, &JpeglsPcParameters::default()).unwrap();
        assert_eq!(lossless.range, 256);
        assert_eq!(lossless.quantized_bits_per_sample, 8);
        assert_eq!(lossless.limit, 32);
        assert_eq!(lossless.reset_threshold, 64);

        let sixteen_bit = CodingParameters::new(16, 0, &JpeglsPcParameters::default()).unwrap();
        assert_eq!(sixteen_bit.range, 65536);
        assert_eq!(sixteen_bit.quantized_bits_per_sample, 16);
        assert_eq!(sixteen_bit.limit, 64);

        let near = CodingParameters::new(8, 3, &JpeglsPcParameters::default()).unwrap();
        assert_eq!(near.range, 38);
        assert_eq!(near.quantized_bits_per_sample, 6);

        assert_eq!(
            CodingParameters::new(1, 0, &JpeglsPcParameters::default()),
            Err(JpeglsError::ParameterValueNotSupported)
        );
    }

    #[test]
    fn test_error_value_and_reconstruction() {
        let lossless = CodingParameters::new(8, 0, &JpeglsPcParameters::default()).unwrap();
        assert_eq!(lossless.compute_error_value(200), -56);
        assert_eq!(lossless.compute_error_value(-200), 56);
        assert_eq!(lossless.compute_reconstructed_sample(250, 10), 4);
        assert_eq!(lossless.compute_reconstructed_sample(100, -56), 44);

        let near = CodingParameters::new(8, 2, &JpeglsPcParameters::default()).unwrap();
        let error_value = near.compute_error_value(7);
        assert_eq!(error_value, 1);
        let reconstructed = near.compute_reconstructed_sample(100, error_value);
        assert!((reconstructed - 107).abs() <= 2);
    }

    #[test]
    fn test_check_parameter_coherent() {
        assert!(parameters(1, InterleaveMode::None).check_parameter_coherent().is_ok());
        assert!(parameters(3, InterleaveMode::Sample).check_parameter_coherent().is_ok());
        assert!(parameters(4, InterleaveMode::Line).check_parameter_coherent().is_ok());
        assert_eq!(
            parameters(4, InterleaveMode::Sample).check_parameter_coherent(),
            Err(JpeglsError::ParameterValueNotSupported)
        );
        assert_eq!(
            parameters(5, InterleaveMode::Line).check_parameter_coherent(),
            Err(JpeglsError::ParameterValueNotSupported)
        );
        assert!(parameters(5, InterleaveMode::None).check_parameter_coherent().is_ok());
        assert_eq!(
            parameters(0, InterleaveMode::None).check_parameter_coherent(),
            Err(JpeglsError::InvalidJlsParameters)
        );

        let mut one_bit = parameters(1, InterleaveMode::None);
        one_bit.frame_info.bits_per_sample = 1;
        assert_eq!(one_bit.check_parameter_coherent(), Err(JpeglsError::ParameterValueNotSupported));
    }

    #[test]
    fn test_buffer_geometry() {
        let planar = parameters(3, InterleaveMode::None);
        assert_eq!(planar.minimum_stride(), 16);
        assert_eq!(planar.destination_size(), 16 * 8 * 3);

        let mut interleaved = parameters(3, InterleaveMode::Line);
        interleaved.frame_info.bits_per_sample = 12;
        assert_eq!(interleaved.minimum_stride(), 16 * 3 * 2);
        assert_eq!(interleaved.destination_size(), 16 * 3 * 2 * 8);

        interleaved.stride = 100;
        assert_eq!(interleaved.destination_size(), 800);
    }

    #[test]
    fn test_log2_ceil() {
        assert_eq!(log2_ceil(1), 0);
        assert_eq!(log2_ceil(2), 1);
        assert_eq!(log2_ceil(38), 6);
        assert_eq!(log2_ceil(256), 8);
        assert_eq!(log2_ceil(257), 9);
    }
}
