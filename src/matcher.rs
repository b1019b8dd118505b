//! Masked rotation-invariant template comparison.
//!
//! Eye rotation between captures appears as a column shift of the unwrapped
//! grid, so the matcher scans a small symmetric shift range and keeps the
//! best masked Hamming distance. Shifts without enough jointly valid cells
//! are skipped; when every shift is skipped the comparison carries too
//! little reliable data to mean anything, and that outcome is reported
//! distinctly instead of being folded into a confident "no match".

use crate::config::PipelineConfig;
use crate::encode::IrisTemplate;
use crate::util::{IrisMatchError, IrisMatchResult};

/// Outcome of comparing a fresh capture against an enrolled template.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    /// Best masked Hamming distance over the shift range, in [0, 1].
    pub distance: f32,
    /// Similarity, `1 - distance`.
    pub score: f32,
    /// True when `distance` is below the configured threshold.
    pub matched: bool,
    /// True when no shift had enough jointly valid cells; `distance` then
    /// degrades to the worst case 1.0 and `matched` is false.
    pub insufficient_data: bool,
}

/// Minimum masked Hamming distance over the angular shift range.
///
/// Returns `None` when every shift has fewer than `min_overlap` jointly
/// valid cells.
pub fn masked_hamming_search(
    a: &IrisTemplate,
    b: &IrisTemplate,
    cfg: &PipelineConfig,
) -> IrisMatchResult<Option<f32>> {
    let len = cfg.template_len();
    for template in [a, b] {
        if template.len() != len {
            return Err(IrisMatchError::TemplateLengthMismatch {
                expected: len,
                got: template.len(),
            });
        }
    }

    let rows = cfg.radial_res;
    let cols = cfg.angular_res as isize;
    let mut best: Option<f32> = None;

    for shift in -cfg.rotation_shifts..=cfg.rotation_shifts {
        let mut disagree = 0usize;
        let mut valid = 0usize;

        for r in 0..rows {
            let base = r * cols as usize;
            for c in 0..cols {
                // Column c of b shifted right by `shift` columns, circular.
                let source = (c - shift).rem_euclid(cols) as usize;
                let idx_a = base + c as usize;
                let idx_b = base + source;
                if a.mask()[idx_a] != 0 && b.mask()[idx_b] != 0 {
                    valid += 1;
                    if (a.code()[idx_a] != 0) != (b.code()[idx_b] != 0) {
                        disagree += 1;
                    }
                }
            }
        }

        if valid < cfg.min_overlap {
            continue;
        }
        let distance = disagree as f32 / valid as f32;
        best = Some(match best {
            Some(current) => current.min(distance),
            None => distance,
        });
    }

    Ok(best)
}

/// Compares two templates and applies the match decision threshold.
pub fn match_templates(
    a: &IrisTemplate,
    b: &IrisTemplate,
    cfg: &PipelineConfig,
) -> IrisMatchResult<MatchResult> {
    let result = match masked_hamming_search(a, b, cfg)? {
        Some(distance) => MatchResult {
            distance,
            score: 1.0 - distance,
            matched: distance < cfg.hamming_threshold,
            insufficient_data: false,
        },
        None => MatchResult {
            distance: 1.0,
            score: 0.0,
            matched: false,
            insufficient_data: true,
        },
    };
    tracing::debug!(
        distance = result.distance,
        matched = result.matched,
        insufficient_data = result.insufficient_data,
        "templates compared"
    );
    Ok(result)
}
