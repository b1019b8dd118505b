//! Rubber-sheet normalization with dynamic masking.
//!
//! The annular iris region is unwrapped into a fixed-size rectangle by
//! indexing radial position as a fraction between the pupil boundary (0) and
//! the outer boundary (1). Because the fraction, not the absolute distance,
//! indexes the grid, the representation is invariant to pupil dilation.

use crate::config::PipelineConfig;
use crate::image::ImageView;
use crate::segment::Circle;

/// Fixed-shape polar sample grid with a per-cell validity mask.
///
/// Row-major: row = radial position, column = angular position.
/// Mask value 1 marks a reliable sample; 0 marks out-of-frame, glare, or
/// shadow cells that matching must ignore.
#[derive(Clone, Debug)]
pub struct SampleGrid {
    values: Vec<f32>,
    mask: Vec<u8>,
    radial_res: usize,
    angular_res: usize,
}

impl SampleGrid {
    pub fn radial_res(&self) -> usize {
        self.radial_res
    }

    pub fn angular_res(&self) -> usize {
        self.angular_res
    }

    /// Row-major sampled intensities.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Row-major validity mask (1 = valid).
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Radial row `r` of sampled intensities.
    pub fn row(&self, r: usize) -> &[f32] {
        &self.values[r * self.angular_res..(r + 1) * self.angular_res]
    }
}

/// Unwraps the iris annulus into a `radial_res` x `angular_res` grid.
///
/// For each angle, sample locations interpolate linearly between the pupil
/// boundary point and the outer boundary point. Cells outside the frame stay
/// at intensity 0 and are masked invalid. Cells strictly above the glare
/// threshold or strictly below the shadow threshold are masked invalid; a
/// cell exactly at either threshold is valid.
///
/// Sample coordinates are floored to a pixel, so a coordinate in (-1, 0)
/// lands on pixel -1 and is masked out-of-frame rather than clamped into
/// the first row or column. Truncation toward zero would silently fold such
/// samples back into the frame.
pub fn normalize(
    image: ImageView<'_>,
    pupil: &Circle,
    iris: &Circle,
    cfg: &PipelineConfig,
) -> SampleGrid {
    let radial_res = cfg.radial_res;
    let angular_res = cfg.angular_res;
    let mut values = vec![0.0f32; radial_res * angular_res];
    let mut mask = vec![1u8; radial_res * angular_res];

    for t in 0..angular_res {
        let theta = 2.0 * std::f32::consts::PI * t as f32 / angular_res as f32;
        let (xp, yp) = pupil.point_at(theta);
        let (xi, yi) = iris.point_at(theta);

        for r in 0..radial_res {
            let fraction = r as f32 / (radial_res - 1) as f32;
            let x = ((1.0 - fraction) * xp + fraction * xi).floor() as i64;
            let y = ((1.0 - fraction) * yp + fraction * yi).floor() as i64;
            let cell = r * angular_res + t;

            match image.get_signed(x, y) {
                Some(value) => {
                    values[cell] = f32::from(value);
                    if value > cfg.glare_threshold || value < cfg.shadow_threshold {
                        mask[cell] = 0;
                    }
                }
                None => mask[cell] = 0,
            }
        }
    }

    let valid = mask.iter().filter(|&&m| m == 1).count();
    tracing::debug!(valid, total = mask.len(), "normalized grid");

    SampleGrid {
        values,
        mask,
        radial_res,
        angular_res,
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;
    use crate::config::PipelineConfig;
    use crate::image::ImageView;
    use crate::segment::Circle;

    fn small_cfg() -> PipelineConfig {
        PipelineConfig {
            radial_res: 8,
            angular_res: 32,
            ..PipelineConfig::default()
        }
    }

    fn concentric(radius_pupil: f32, radius_iris: f32) -> (Circle, Circle) {
        let pupil = Circle {
            cx: 50.0,
            cy: 50.0,
            radius: radius_pupil,
        };
        let iris = Circle {
            cx: 50.0,
            cy: 50.0,
            radius: radius_iris,
        };
        (pupil, iris)
    }

    #[test]
    fn grid_has_configured_shape() {
        let data = vec![128u8; 100 * 100];
        let view = ImageView::from_slice(&data, 100, 100).unwrap();
        let (pupil, iris) = concentric(10.0, 30.0);
        let grid = normalize(view, &pupil, &iris, &small_cfg());
        assert_eq!(grid.values().len(), 8 * 32);
        assert_eq!(grid.mask().len(), 8 * 32);
    }

    #[test]
    fn in_frame_mid_gray_cells_are_valid() {
        let data = vec![128u8; 100 * 100];
        let view = ImageView::from_slice(&data, 100, 100).unwrap();
        let (pupil, iris) = concentric(10.0, 30.0);
        let grid = normalize(view, &pupil, &iris, &small_cfg());
        assert!(grid.mask().iter().all(|&m| m == 1));
        assert!(grid.values().iter().all(|&v| v == 128.0));
    }

    #[test]
    fn out_of_frame_cells_are_masked_with_zero_intensity() {
        let data = vec![128u8; 100 * 100];
        let view = ImageView::from_slice(&data, 100, 100).unwrap();
        // Outer boundary far outside the frame.
        let (pupil, iris) = concentric(10.0, 90.0);
        let grid = normalize(view, &pupil, &iris, &small_cfg());
        let invalid = grid.mask().iter().filter(|&&m| m == 0).count();
        assert!(invalid > 0);
        for (cell, &m) in grid.mask().iter().enumerate() {
            if m == 0 {
                assert_eq!(grid.values()[cell], 0.0);
            }
        }
    }

    #[test]
    fn coordinates_just_left_of_frame_are_masked_not_clamped() {
        // At theta = pi the pupil boundary point sits at x = -0.5, which
        // floors to pixel -1. It must count as out-of-frame; truncation
        // toward zero would fold it back into column 0.
        let data = vec![128u8; 100 * 100];
        let view = ImageView::from_slice(&data, 100, 100).unwrap();
        let pupil = Circle {
            cx: 0.5,
            cy: 50.0,
            radius: 1.0,
        };
        let iris = Circle {
            cx: 50.0,
            cy: 50.0,
            radius: 30.0,
        };
        let cfg = small_cfg();
        let grid = normalize(view, &pupil, &iris, &cfg);
        // Row 0 samples the pupil boundary; column 16 of 32 is theta = pi.
        assert_eq!(grid.mask()[16], 0);
        assert_eq!(grid.values()[16], 0.0);
        // Theta = 0 lands at x = 1.5, comfortably inside.
        assert_eq!(grid.mask()[0], 1);
    }

    #[test]
    fn threshold_boundaries_are_inclusive_valid() {
        let cfg = small_cfg();
        for value in [cfg.shadow_threshold, cfg.glare_threshold] {
            let data = vec![value; 100 * 100];
            let view = ImageView::from_slice(&data, 100, 100).unwrap();
            let (pupil, iris) = concentric(10.0, 30.0);
            let grid = normalize(view, &pupil, &iris, &cfg);
            assert!(grid.mask().iter().all(|&m| m == 1));
        }
    }

    #[test]
    fn glare_and_shadow_are_masked() {
        let cfg = small_cfg();
        for value in [cfg.shadow_threshold - 1, cfg.glare_threshold + 1] {
            let data = vec![value; 100 * 100];
            let view = ImageView::from_slice(&data, 100, 100).unwrap();
            let (pupil, iris) = concentric(10.0, 30.0);
            let grid = normalize(view, &pupil, &iris, &cfg);
            assert!(grid.mask().iter().all(|&m| m == 0));
        }
    }
}
