//! Pipeline configuration.
//!
//! All tunables live in one immutable [`PipelineConfig`] handed to
//! [`Pipeline::new`](crate::Pipeline::new). Several configurations may
//! coexist, e.g. for cameras with different optics.

use crate::util::{IrisMatchError, IrisMatchResult};

/// Tunable constants for the whole pipeline.
///
/// `Default` yields values tuned for typical close-range eye captures.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    /// Radial resolution of the normalized grid (rows).
    pub radial_res: usize,
    /// Angular resolution of the normalized grid (columns).
    pub angular_res: usize,
    /// Minimum Laplacian variance for a capture to be considered sharp.
    pub sharpness_threshold: f64,
    /// CLAHE tile edge length in pixels.
    pub clahe_tile: usize,
    /// CLAHE clip limit, as a multiple of the uniform bin height.
    pub clahe_clip_limit: f32,
    /// Median filter aperture (full window edge, odd).
    pub median_aperture: usize,
    /// Smallest circle radius the boundary search considers, in pixels.
    pub min_radius: usize,
    /// Largest circle radius the boundary search considers, in pixels.
    pub max_radius: usize,
    /// Minimum distance between accepted circle centers, in pixels.
    pub min_center_dist: usize,
    /// Gradient magnitude above which a pixel votes as an edge.
    pub edge_threshold: f32,
    /// Minimum center votes (and radius support) for an accepted circle.
    pub accumulator_threshold: u32,
    /// Outer boundary radius as a multiple of the pupil radius, used when
    /// only one circle is detected. A heuristic, not a calibrated value.
    pub iris_fallback_ratio: f32,
    /// Intensities strictly above this are masked as glare.
    pub glare_threshold: u8,
    /// Intensities strictly below this are masked as shadow.
    pub shadow_threshold: u8,
    /// Log-Gabor center frequency, normalized to [0, 0.5].
    pub center_frequency: f32,
    /// Log-Gabor bandwidth parameter (sigma over center frequency).
    pub bandwidth_sigma: f32,
    /// Half-range of the angular alignment search, in grid columns.
    pub rotation_shifts: isize,
    /// Minimum jointly-valid cells for a shift to contribute a distance.
    pub min_overlap: usize,
    /// Hamming distance below which two templates are declared a match.
    pub hamming_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            radial_res: 64,
            angular_res: 256,
            sharpness_threshold: 800.0,
            clahe_tile: 8,
            clahe_clip_limit: 3.0,
            median_aperture: 11,
            min_radius: 25,
            max_radius: 160,
            min_center_dist: 50,
            edge_threshold: 100.0,
            accumulator_threshold: 30,
            iris_fallback_ratio: 2.8,
            glare_threshold: 245,
            shadow_threshold: 30,
            center_frequency: 0.25,
            bandwidth_sigma: 0.5,
            rotation_shifts: 10,
            min_overlap: 100,
            hamming_threshold: 0.32,
        }
    }
}

impl PipelineConfig {
    /// Total template length in bits.
    pub fn template_len(&self) -> usize {
        self.radial_res * self.angular_res
    }

    /// Checks the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> IrisMatchResult<()> {
        if self.radial_res < 2 || self.angular_res < 2 {
            return Err(IrisMatchError::InvalidConfig(
                "grid resolutions must be at least 2",
            ));
        }
        if self.clahe_tile == 0 {
            return Err(IrisMatchError::InvalidConfig(
                "clahe_tile must be nonzero",
            ));
        }
        if self.median_aperture == 0 || self.median_aperture % 2 == 0 {
            return Err(IrisMatchError::InvalidConfig(
                "median_aperture must be odd",
            ));
        }
        if self.min_radius == 0 || self.min_radius >= self.max_radius {
            return Err(IrisMatchError::InvalidConfig(
                "radius range must satisfy 0 < min < max",
            ));
        }
        if !(0.0..=0.5).contains(&self.center_frequency) || self.center_frequency == 0.0 {
            return Err(IrisMatchError::InvalidConfig(
                "center_frequency must lie in (0, 0.5]",
            ));
        }
        if self.bandwidth_sigma <= 0.0 || self.bandwidth_sigma == 1.0 {
            return Err(IrisMatchError::InvalidConfig(
                "bandwidth_sigma must be positive and not 1",
            ));
        }
        if self.rotation_shifts < 0 {
            return Err(IrisMatchError::InvalidConfig(
                "rotation_shifts must be non-negative",
            ));
        }
        if self.iris_fallback_ratio <= 1.0 {
            return Err(IrisMatchError::InvalidConfig(
                "iris_fallback_ratio must exceed 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.hamming_threshold) {
            return Err(IrisMatchError::InvalidConfig(
                "hamming_threshold must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn default_template_len_is_full_grid() {
        assert_eq!(PipelineConfig::default().template_len(), 64 * 256);
    }

    #[test]
    fn rejects_even_median_aperture() {
        let cfg = PipelineConfig {
            median_aperture: 10,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_radius_range() {
        let cfg = PipelineConfig {
            min_radius: 200,
            max_radius: 160,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
