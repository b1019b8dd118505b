//! Log-Gabor phase encoding.
//!
//! Each radial row of the normalized grid is filtered in the frequency
//! domain with a log-Gabor band-pass and quantized to one bit per sample by
//! the sign of the real part. Phase survives illumination changes that
//! amplitude does not, which is what makes the code stable across captures.
//! Rows are independent, so the `rayon` feature encodes them in parallel.

use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::normalize::SampleGrid;
use crate::util::{IrisMatchError, IrisMatchResult};

/// The persisted biometric artifact: a phase code and its validity mask.
///
/// Both are flattened row-major bit arrays of length
/// `radial_res * angular_res`, immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrisTemplate {
    code: Vec<u8>,
    mask: Vec<u8>,
}

impl IrisTemplate {
    /// Builds a template from matching-length code and mask bit arrays.
    pub fn new(code: Vec<u8>, mask: Vec<u8>) -> IrisMatchResult<Self> {
        if code.len() != mask.len() {
            return Err(IrisMatchError::TemplateLengthMismatch {
                expected: code.len(),
                got: mask.len(),
            });
        }
        Ok(Self { code, mask })
    }

    /// Flattened phase code bits.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Flattened validity bits (1 = reliable).
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Template length in bits.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// True when the template holds no bits.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// Per-row frequency-domain phase encoder with precomputed FFT plans.
pub struct PhaseEncoder {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    filter: Vec<f32>,
    angular_res: usize,
}

impl PhaseEncoder {
    /// Plans the forward/inverse transforms and bakes the log-Gabor filter.
    pub fn new(cfg: &PipelineConfig) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(cfg.angular_res),
            inverse: planner.plan_fft_inverse(cfg.angular_res),
            filter: log_gabor_filter(cfg.angular_res, cfg.center_frequency, cfg.bandwidth_sigma),
            angular_res: cfg.angular_res,
        }
    }

    /// Encodes a normalized grid into a template.
    ///
    /// The output mask is the grid's mask flattened unchanged; the code is a
    /// function of the sampled intensities alone.
    pub fn encode(&self, grid: &SampleGrid) -> IrisMatchResult<IrisTemplate> {
        if grid.angular_res() != self.angular_res {
            return Err(IrisMatchError::TemplateLengthMismatch {
                expected: self.angular_res,
                got: grid.angular_res(),
            });
        }

        let rows = 0..grid.radial_res();
        #[cfg(feature = "rayon")]
        let code: Vec<u8> = rows
            .into_par_iter()
            .flat_map_iter(|r| self.encode_row(grid.row(r)))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let code: Vec<u8> = rows.flat_map(|r| self.encode_row(grid.row(r))).collect();

        tracing::debug!(bits = code.len(), "phase code produced");
        IrisTemplate::new(code, grid.mask().to_vec())
    }

    fn encode_row(&self, row: &[f32]) -> Vec<u8> {
        let n = self.angular_res;
        let mut buffer: Vec<Complex32> = row.iter().map(|&v| Complex32::new(v, 0.0)).collect();
        self.forward.process(&mut buffer);
        for (bin, gain) in buffer.iter_mut().zip(&self.filter) {
            *bin *= *gain;
        }
        self.inverse.process(&mut buffer);
        // The inverse transform is unnormalized; 1/n scaling cannot change
        // the sign, but keep the spatial samples at their true magnitude.
        let scale = 1.0 / n as f32;
        buffer.iter().map(|c| u8::from(c.re * scale > 0.0)).collect()
    }
}

/// Gaussian-in-log-frequency band-pass over the discrete FFT bins.
///
/// Bin `k` maps to the signed normalized frequency `k/n` for the first half
/// and `(k-n)/n` for the second; the filter depends on its magnitude. The
/// zero-frequency bin gets a negligible placeholder radius so the log term
/// stays finite.
fn log_gabor_filter(n: usize, center_frequency: f32, sigma: f32) -> Vec<f32> {
    let denom = 2.0 * sigma.ln().powi(2);
    (0..n)
        .map(|k| {
            let signed = if k < n.div_ceil(2) {
                k as f32 / n as f32
            } else {
                (k as f32 - n as f32) / n as f32
            };
            let radius = if signed == 0.0 { 1e-6 } else { signed.abs() };
            (-(radius / center_frequency).ln().powi(2) / denom).exp()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{log_gabor_filter, IrisTemplate, PhaseEncoder};
    use crate::config::PipelineConfig;
    use crate::image::ImageView;
    use crate::normalize::normalize;
    use crate::segment::Circle;

    fn textured_grid(cfg: &PipelineConfig) -> crate::normalize::SampleGrid {
        let width = 200;
        let data: Vec<u8> = (0..width * width)
            .map(|i| (((i * 31) ^ (i / 7)) % 200) as u8 + 30)
            .collect();
        let view = ImageView::from_slice(&data, width, width).unwrap();
        let pupil = Circle {
            cx: 100.0,
            cy: 100.0,
            radius: 20.0,
        };
        let iris = Circle {
            cx: 100.0,
            cy: 100.0,
            radius: 60.0,
        };
        normalize(view, &pupil, &iris, cfg)
    }

    #[test]
    fn code_and_mask_have_grid_length() {
        let cfg = PipelineConfig::default();
        let grid = textured_grid(&cfg);
        let template = PhaseEncoder::new(&cfg).encode(&grid).unwrap();
        assert_eq!(template.len(), cfg.template_len());
        assert_eq!(template.code().len(), template.mask().len());
    }

    #[test]
    fn mask_passes_through_unchanged() {
        let cfg = PipelineConfig::default();
        let grid = textured_grid(&cfg);
        let template = PhaseEncoder::new(&cfg).encode(&grid).unwrap();
        assert_eq!(template.mask(), grid.mask());
    }

    #[test]
    fn encoding_is_deterministic() {
        let cfg = PipelineConfig::default();
        let grid = textured_grid(&cfg);
        let encoder = PhaseEncoder::new(&cfg);
        assert_eq!(
            encoder.encode(&grid).unwrap(),
            encoder.encode(&grid).unwrap()
        );
    }

    #[test]
    fn textured_rows_yield_mixed_bits() {
        let cfg = PipelineConfig::default();
        let grid = textured_grid(&cfg);
        let template = PhaseEncoder::new(&cfg).encode(&grid).unwrap();
        let ones = template.code().iter().filter(|&&b| b == 1).count();
        assert!(ones > 0 && ones < template.len());
    }

    #[test]
    fn filter_peaks_at_center_frequency() {
        let filter = log_gabor_filter(256, 0.25, 0.5);
        // Bin 64 of 256 is exactly 0.25.
        let peak = filter[64];
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(filter.iter().all(|&g| g <= 1.0 + 1e-6));
        // DC bin is effectively suppressed.
        assert!(filter[0] < 1e-3);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(IrisTemplate::new(vec![1, 0, 1], vec![1, 1]).is_err());
    }
}
