//! Error types for irismatch.

use thiserror::Error;

/// Result alias for irismatch operations.
pub type IrisMatchResult<T> = std::result::Result<T, IrisMatchError>;

/// Errors that can occur while running the iris pipeline.
///
/// The `Display` strings of the first four variants are the client-facing
/// failure reasons; the request layer surfaces them verbatim.
#[derive(Debug, Error)]
pub enum IrisMatchError {
    /// The capture is too blurry for boundary detection to be trusted.
    #[error("image too blurry")]
    TooBlurry {
        /// Laplacian-variance sharpness measured on the capture.
        sharpness: f64,
        /// Threshold the score fell below.
        threshold: f64,
    },
    /// The input could not be decoded as a grayscale raster.
    #[error("invalid image")]
    InvalidImage { reason: String },
    /// No plausible circular iris boundary was found.
    #[error("iris not found")]
    IrisNotFound,
    /// The claimed subject identifier has no enrolled template.
    #[error("user not found")]
    UnknownSubject { subject_id: String },
    /// Image dimensions are zero or overflow addressing.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The pixel buffer does not match the declared dimensions.
    #[error("buffer length mismatch: needed {needed}, got {got}")]
    BufferMismatch { needed: usize, got: usize },
    /// A configuration value is outside its usable range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// Two templates of different code/mask lengths were compared.
    #[error("template length mismatch: expected {expected}, got {got}")]
    TemplateLengthMismatch { expected: usize, got: usize },
}
