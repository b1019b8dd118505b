//! Pupil and iris boundary location.

use crate::config::PipelineConfig;
use crate::image::ImageView;
use crate::util::{IrisMatchError, IrisMatchResult};

pub mod hough;
pub mod median;

pub use hough::detect_circles;
pub use median::median_blur;

/// A circle in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
}

impl Circle {
    /// Point on the circle at angle `theta` (radians).
    pub fn point_at(&self, theta: f32) -> (f32, f32) {
        (
            self.cx + self.radius * theta.cos(),
            self.cy + self.radius * theta.sin(),
        )
    }
}

/// Estimates the pupil and outer iris boundary circles.
///
/// Smooths the image, runs the circle accumulator, and takes the
/// smallest-radius detection as the pupil. The largest remaining detection
/// becomes the outer boundary; with a single detection the outer boundary is
/// synthesized concentric with the pupil at `iris_fallback_ratio` times its
/// radius, trading precision for pipeline continuity when the limbus is not
/// separately visible.
pub fn locate(image: ImageView<'_>, cfg: &PipelineConfig) -> IrisMatchResult<(Circle, Circle)> {
    let smoothed = median_blur(image, cfg.median_aperture)?;
    let mut circles = detect_circles(smoothed.view(), cfg);
    if circles.is_empty() {
        return Err(IrisMatchError::IrisNotFound);
    }
    circles.sort_by(|a, b| a.radius.total_cmp(&b.radius));

    let pupil = circles[0];
    let iris = if circles.len() > 1 {
        *circles.last().expect("nonempty after sort")
    } else {
        Circle {
            cx: pupil.cx,
            cy: pupil.cy,
            radius: pupil.radius * cfg.iris_fallback_ratio,
        }
    };
    tracing::debug!(
        pupil_cx = pupil.cx,
        pupil_cy = pupil.cy,
        pupil_r = pupil.radius,
        iris_r = iris.radius,
        detections = circles.len(),
        "boundaries located"
    );
    Ok((pupil, iris))
}
