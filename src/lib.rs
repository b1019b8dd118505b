//! Irismatch is an iris-based identity verification library.
//!
//! A grayscale eye capture flows through quality gating, local contrast
//! enhancement, pupil/iris boundary detection, rubber-sheet normalization
//! with dynamic masking, and log-Gabor phase encoding to produce a
//! fixed-length binary template. Verification compares two templates with a
//! masked Hamming distance minimized over a small angular rotation search.
//!
//! Every stage is a pure function, so the pipeline parallelizes trivially
//! across requests; the optional `rayon` feature additionally parallelizes
//! the per-row encode step, and `image-io` adds `image`-crate loading
//! helpers.

pub mod config;
pub mod encode;
pub mod enhance;
pub mod image;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod quality;
pub mod segment;
pub mod util;

pub use config::PipelineConfig;
pub use encode::{IrisTemplate, PhaseEncoder};
pub use image::{ImageView, OwnedImage};
pub use matcher::{masked_hamming_search, match_templates, MatchResult};
pub use normalize::SampleGrid;
pub use pipeline::Pipeline;
pub use segment::Circle;
pub use util::{IrisMatchError, IrisMatchResult};

#[cfg(feature = "image-io")]
pub use image::io;
