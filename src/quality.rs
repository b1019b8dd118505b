//! Sharpness gating.
//!
//! The gate scores a capture by the variance of its Laplacian response and
//! rejects captures below a configured threshold before any geometric work
//! is spent on them.

use crate::config::PipelineConfig;
use crate::image::ImageView;
use crate::util::{IrisMatchError, IrisMatchResult};

/// Variance of the 3x3 cross Laplacian over interior pixels.
///
/// Blur attenuates high-frequency content, so the second-derivative response
/// of a defocused capture clusters near zero and its variance drops.
pub fn laplacian_variance(image: ImageView<'_>) -> f64 {
    let width = image.width();
    let height = image.height();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;
    for y in 1..height - 1 {
        let above = image.row(y - 1).expect("row in bounds");
        let here = image.row(y).expect("row in bounds");
        let below = image.row(y + 1).expect("row in bounds");
        for x in 1..width - 1 {
            let response = f64::from(above[x]) + f64::from(below[x]) + f64::from(here[x - 1])
                + f64::from(here[x + 1])
                - 4.0 * f64::from(here[x]);
            sum += response;
            sum_sq += response * response;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    sum_sq / n - mean * mean
}

/// Rejects captures whose sharpness score falls below the threshold.
///
/// Returns the measured score on success so callers can log it.
pub fn assess(image: ImageView<'_>, cfg: &PipelineConfig) -> IrisMatchResult<f64> {
    let sharpness = laplacian_variance(image);
    tracing::debug!(sharpness, threshold = cfg.sharpness_threshold, "quality gate");
    if sharpness < cfg.sharpness_threshold {
        return Err(IrisMatchError::TooBlurry {
            sharpness,
            threshold: cfg.sharpness_threshold,
        });
    }
    Ok(sharpness)
}
