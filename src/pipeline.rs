//! The enrollment/verification pipeline.
//!
//! Stages run strictly left to right: quality gate, contrast enhancement,
//! boundary location, normalization, phase encoding, and (for verification)
//! matching. Each stage is a pure function of its inputs; the first failing
//! stage aborts the request. The pipeline holds no mutable state, so
//! concurrent requests can share one instance freely.

use crate::config::PipelineConfig;
use crate::encode::{IrisTemplate, PhaseEncoder};
use crate::image::ImageView;
use crate::matcher::{match_templates, MatchResult};
use crate::normalize::normalize;
use crate::segment::locate;
use crate::util::{IrisMatchError, IrisMatchResult};
use crate::{enhance, quality};

/// A configured iris pipeline with FFT plans built once at construction.
pub struct Pipeline {
    cfg: PipelineConfig,
    encoder: PhaseEncoder,
}

impl Pipeline {
    /// Builds a pipeline after validating the configuration.
    pub fn new(cfg: PipelineConfig) -> IrisMatchResult<Self> {
        cfg.validate()?;
        Ok(Self {
            encoder: PhaseEncoder::new(&cfg),
            cfg,
        })
    }

    /// Pipeline with the default configuration.
    pub fn with_defaults() -> Self {
        // The default config always validates.
        Self::new(PipelineConfig::default()).expect("default config is valid")
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Runs stages 1-5 and produces the template for an enrollment.
    ///
    /// The caller persists the result keyed by a subject identifier; the
    /// pipeline never touches storage.
    pub fn enroll(&self, image: ImageView<'_>) -> IrisMatchResult<IrisTemplate> {
        let sharpness = quality::assess(image, &self.cfg)?;
        let enhanced = enhance::enhance(image, &self.cfg)?;
        let (pupil, iris) = locate(enhanced.view(), &self.cfg)?;
        let grid = normalize(enhanced.view(), &pupil, &iris, &self.cfg);
        let template = self.encoder.encode(&grid)?;
        tracing::info!(
            sharpness,
            pupil_radius = pupil.radius,
            iris_radius = iris.radius,
            bits = template.len(),
            "capture encoded"
        );
        Ok(template)
    }

    /// Compares a fresh capture against an already retrieved template.
    pub fn verify(
        &self,
        image: ImageView<'_>,
        enrolled: &IrisTemplate,
    ) -> IrisMatchResult<MatchResult> {
        let live = self.enroll(image)?;
        match_templates(enrolled, &live, &self.cfg)
    }

    /// Verifies a capture against the template enrolled for `subject_id`.
    ///
    /// `lookup` is the caller's view into its template store; a `None`
    /// result surfaces as the "user not found" failure.
    pub fn verify_with<F>(
        &self,
        subject_id: &str,
        image: ImageView<'_>,
        lookup: F,
    ) -> IrisMatchResult<MatchResult>
    where
        F: FnOnce(&str) -> Option<IrisTemplate>,
    {
        let enrolled = lookup(subject_id).ok_or_else(|| IrisMatchError::UnknownSubject {
            subject_id: subject_id.to_owned(),
        })?;
        self.verify(image, &enrolled)
    }
}
