use crate::constants::{J, REGULAR_CONTEXT_COUNT};
use crate::jpegls::InterleaveMode;
use crate::jpegls::coding_parameters::CodingParameters;
use crate::jpegls::regular_mode_context::RegularModeContext;
use crate::jpegls::run_mode_context::RunModeContext;

/// Arrangement of one scan line in the coder's line buffers.
///
/// Every row holds `width + 2` pixels: an edge pixel on each side of the image samples.
/// Line interleaved scans keep one row per component, sample interleaved scans keep
/// one row of pixels with `samples_per_pixel` samples each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLayout {
    pub width: usize,
    pub rows: usize,
    pub samples_per_pixel: usize,
}

impl LineLayout {
    pub fn new(width: usize, component_count: usize, interleave_mode: InterleaveMode) -> Self {
        match interleave_mode {
            InterleaveMode::None => Self {
                width,
                rows: 1,
                samples_per_pixel: 1,
            },
            InterleaveMode::Line => Self {
                width,
                rows: component_count,
                samples_per_pixel: 1,
            },
            InterleaveMode::Sample => Self {
                width,
                rows: 1,
                samples_per_pixel: component_count,
            },
        }
    }

    /// Components coded by the scan.
    pub fn component_count(&self) -> usize {
        self.rows * self.samples_per_pixel
    }

    pub fn row_length(&self) -> usize {
        (self.width + 2) * self.samples_per_pixel
    }

    pub fn line_length(&self) -> usize {
        self.row_length() * self.rows
    }

    /// Index of sample `component` of image column `x` in a line buffer.
    pub fn position(&self, x: usize, component: usize) -> usize {
        if self.rows > 1 {
            component * self.row_length() + x + 1
        } else {
            (x + 1) * self.samples_per_pixel + component
        }
    }

    /// Copies the edge pixels used by prediction: the right edge of the previous row and the
    /// left edge of the current row.
    pub fn initialize_edges(&self, previous_row: &mut [i32], current_row: &mut [i32]) {
        let samples = self.samples_per_pixel;
        for j in 0..samples {
            previous_row[(self.width + 1) * samples + j] = previous_row[self.width * samples + j];
            current_row[j] = previous_row[samples + j];
        }
    }
}

/// State shared by the scan encoder and decoder: coding parameters, the 365 regular mode
/// contexts, both run interruption contexts and the run index.
#[derive(Debug, Clone)]
pub struct ScanCodec {
    pub parameters: CodingParameters,
    pub layout: LineLayout,
    pub height: usize,
    pub regular_mode_contexts: Vec<RegularModeContext>,
    pub run_mode_contexts: [RunModeContext; 2],
    pub run_index: usize,
}

impl ScanCodec {
    pub fn new(parameters: CodingParameters, layout: LineLayout, height: usize) -> Self {
        let range = parameters.range;
        Self {
            parameters,
            layout,
            height,
            regular_mode_contexts: vec![RegularModeContext::new(range); REGULAR_CONTEXT_COUNT],
            run_mode_contexts: [RunModeContext::new(0, range), RunModeContext::new(1, range)],
            run_index: 0,
        }
    }

    // Code segment A.4
    pub fn quantize_gradient(&self, di: i32) -> i32 {
        let parameters = &self.parameters;
        if di <= -parameters.threshold3 {
            -4
        } else if di <= -parameters.threshold2 {
            -3
        } else if di <= -parameters.threshold1 {
            -2
        } else if di < -parameters.near_lossless {
            -1
        } else if di <= parameters.near_lossless {
            0
        } else if di < parameters.threshold1 {
            1
        } else if di < parameters.threshold2 {
            2
        } else if di < parameters.threshold3 {
            3
        } else {
            4
        }
    }

    /// Signed context number of the neighbourhood; 0 selects run mode.
    pub fn context_id(&self, ra: i32, rb: i32, rc: i32, rd: i32) -> i32 {
        compute_context_id(
            self.quantize_gradient(rd - rb),
            self.quantize_gradient(rb - rc),
            self.quantize_gradient(rc - ra),
        )
    }

    pub fn is_near_pixel(&self, lhs: &[i32], rhs: &[i32]) -> bool {
        lhs.iter().zip(rhs).all(|(&a, &b)| self.parameters.is_near(a, b))
    }

    /// Run length order J[RUNindex] of the current run.
    pub fn run_order(&self) -> i32 {
        J[self.run_index]
    }

    pub fn increment_run_index(&mut self) {
        self.run_index = (self.run_index + 1).min(J.len() - 1);
    }

    pub fn decrement_run_index(&mut self) {
        self.run_index = self.run_index.saturating_sub(1);
    }

    /// LIMIT used for the sample that ends a run.
    pub fn run_interruption_limit(&self) -> i32 {
        self.parameters.limit - self.run_order() - 1
    }
}

pub fn compute_context_id(q1: i32, q2: i32, q3: i32) -> i32 {
    (q1 * 9 + q2) * 9 + q3
}

/// Median edge detector (ISO/IEC 14495-1, A.4.1).
pub fn predicted_value(ra: i32, rb: i32, rc: i32) -> i32 {
    if rc >= ra.max(rb) {
        ra.min(rb)
    } else if rc <= ra.min(rb) {
        ra.max(rb)
    } else {
        ra + rb - rc
    }
}
