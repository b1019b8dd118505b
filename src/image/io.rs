//! Capture decoding behind the `image-io` feature.
//!
//! The pipeline itself only consumes [`ImageView`](super::ImageView); this
//! module is the single seam where on-disk captures enter, flattened to
//! grayscale. Decode failures surface as the "invalid image" error so
//! callers can report a bad upload distinctly from pipeline failures.

use crate::image::OwnedImage;
use crate::util::{IrisMatchError, IrisMatchResult};
use std::path::Path;

/// Decodes a capture file into an owned grayscale raster.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> IrisMatchResult<OwnedImage> {
    let decoded = image::open(path).map_err(|err| IrisMatchError::InvalidImage {
        reason: err.to_string(),
    })?;
    gray_capture(&decoded)
}

/// Flattens an already decoded image to the pipeline's grayscale raster.
///
/// Useful when the capture arrives as in-memory bytes rather than a file.
pub fn gray_capture(decoded: &image::DynamicImage) -> IrisMatchResult<OwnedImage> {
    let gray = decoded.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    OwnedImage::new(gray.into_raw(), width, height)
}
