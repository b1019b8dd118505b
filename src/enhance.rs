//! Local contrast enhancement (CLAHE).
//!
//! Histogram equalization over small tiles with a clip limit, then bilinear
//! blending of neighboring tile mappings so tile seams do not imprint on the
//! result. The clip limit bounds how far any single intensity bin can be
//! amplified, which keeps near-uniform regions (sclera, shadow) from turning
//! into amplified noise.

use crate::config::PipelineConfig;
use crate::image::{ImageView, OwnedImage};
use crate::util::IrisMatchResult;

const BINS: usize = 256;

/// Applies clip-limited adaptive histogram equalization.
///
/// Pure function of the input: same shape, same value range, deterministic.
pub fn enhance(image: ImageView<'_>, cfg: &PipelineConfig) -> IrisMatchResult<OwnedImage> {
    let width = image.width();
    let height = image.height();
    let tile = cfg.clahe_tile.min(width).min(height).max(1);
    let tiles_x = width.div_ceil(tile);
    let tiles_y = height.div_ceil(tile);

    tracing::debug!(width, height, tile, tiles_x, tiles_y, "contrast enhancement");

    // One clipped-equalization lookup table per tile.
    let mut luts = vec![[0u8; BINS]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        let y0 = ty * tile;
        let y1 = (y0 + tile).min(height);
        for tx in 0..tiles_x {
            let x0 = tx * tile;
            let x1 = (x0 + tile).min(width);
            let mut hist = [0u32; BINS];
            for y in y0..y1 {
                let row = image.row(y).expect("tile row in bounds");
                for &value in &row[x0..x1] {
                    hist[value as usize] += 1;
                }
            }
            let area = ((x1 - x0) * (y1 - y0)) as u32;
            clip_histogram(&mut hist, cfg.clahe_clip_limit, area);
            luts[ty * tiles_x + tx] = equalization_lut(&hist, area);
        }
    }

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        let (j0, j1, wy) = blend_coords(y, tile, tiles_y);
        let row = image.row(y).expect("row in bounds");
        let out_row = &mut out[y * width..(y + 1) * width];
        for (x, slot) in out_row.iter_mut().enumerate() {
            let (i0, i1, wx) = blend_coords(x, tile, tiles_x);
            let v = row[x] as usize;
            let top = lerp(
                luts[j0 * tiles_x + i0][v] as f32,
                luts[j0 * tiles_x + i1][v] as f32,
                wx,
            );
            let bottom = lerp(
                luts[j1 * tiles_x + i0][v] as f32,
                luts[j1 * tiles_x + i1][v] as f32,
                wx,
            );
            *slot = lerp(top, bottom, wy).round().clamp(0.0, 255.0) as u8;
        }
    }

    OwnedImage::new(out, width, height)
}

/// Clips bins at `clip_limit` times the uniform height and redistributes the
/// excess evenly, remainder over evenly spaced bins.
fn clip_histogram(hist: &mut [u32; BINS], clip_limit: f32, area: u32) {
    let uniform = area as f32 / BINS as f32;
    let clip = ((clip_limit * uniform).max(1.0)) as u32;
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let share = excess / BINS as u32;
    let mut remainder = (excess % BINS as u32) as usize;
    for bin in hist.iter_mut() {
        *bin += share;
    }
    if remainder > 0 {
        let step = BINS / remainder;
        let mut i = 0;
        while i < BINS && remainder > 0 {
            hist[i] += 1;
            remainder -= 1;
            i += step;
        }
    }
}

fn equalization_lut(hist: &[u32; BINS], area: u32) -> [u8; BINS] {
    let mut lut = [0u8; BINS];
    let scale = 255.0 / area as f32;
    let mut cdf = 0u32;
    for (value, bin) in hist.iter().enumerate() {
        cdf += bin;
        lut[value] = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Neighboring tile indices and the blend weight toward the second one.
fn blend_coords(pos: usize, tile: usize, ntiles: usize) -> (usize, usize, f32) {
    let g = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if g <= 0.0 {
        return (0, 0, 0.0);
    }
    let i0 = g.floor() as usize;
    if i0 + 1 >= ntiles {
        return (ntiles - 1, ntiles - 1, 0.0);
    }
    (i0, i0 + 1, g - i0 as f32)
}

fn lerp(a: f32, b: f32, w: f32) -> f32 {
    a + (b - a) * w
}
