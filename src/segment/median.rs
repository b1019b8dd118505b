//! Median smoothing for the boundary search.
//!
//! Speckle noise produces spurious edge votes in the circle accumulator; a
//! median filter removes it while keeping circular edges sharp, which is why
//! it is preferred over Gaussian smoothing here.

use crate::image::{ImageView, OwnedImage};
use crate::util::IrisMatchResult;

/// Median filter with an odd square aperture and clamped borders.
///
/// Uses a sliding 256-bin histogram per row, so cost grows with the aperture
/// edge rather than its area.
pub fn median_blur(image: ImageView<'_>, aperture: usize) -> IrisMatchResult<OwnedImage> {
    let width = image.width();
    let height = image.height();
    let r = (aperture / 2) as i64;
    let window = (2 * r + 1) * (2 * r + 1);
    // Rank of the median among `window` samples, 1-based cumulative count.
    let target = (window / 2 + 1) as u32;

    let clamp_x = |x: i64| x.clamp(0, width as i64 - 1) as usize;
    let clamp_y = |y: i64| y.clamp(0, height as i64 - 1) as usize;

    let mut out = vec![0u8; width * height];
    for y in 0..height as i64 {
        let mut hist = [0u32; 256];
        for dx in -r..=r {
            add_column(image, &mut hist, clamp_x(dx), y, r, &clamp_y, 1);
        }
        out[y as usize * width] = histogram_median(&hist, target);

        for x in 1..width as i64 {
            add_column(image, &mut hist, clamp_x(x - r - 1), y, r, &clamp_y, -1);
            add_column(image, &mut hist, clamp_x(x + r), y, r, &clamp_y, 1);
            out[y as usize * width + x as usize] = histogram_median(&hist, target);
        }
    }

    OwnedImage::new(out, width, height)
}

fn add_column(
    image: ImageView<'_>,
    hist: &mut [u32; 256],
    x: usize,
    y: i64,
    r: i64,
    clamp_y: &impl Fn(i64) -> usize,
    sign: i64,
) {
    for dy in -r..=r {
        let value = image
            .get(x, clamp_y(y + dy))
            .expect("clamped coordinate in bounds") as usize;
        if sign > 0 {
            hist[value] += 1;
        } else {
            hist[value] -= 1;
        }
    }
}

fn histogram_median(hist: &[u32; 256], target: u32) -> u8 {
    let mut cumulative = 0u32;
    for (value, &count) in hist.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return value as u8;
        }
    }
    255
}

#[cfg(test)]
mod tests {
    use super::median_blur;
    use crate::image::ImageView;

    #[test]
    fn flattens_isolated_speckle() {
        let mut data = vec![100u8; 21 * 21];
        data[10 * 21 + 10] = 255;
        let view = ImageView::from_slice(&data, 21, 21).unwrap();
        let out = median_blur(view, 5).unwrap();
        assert_eq!(out.view().get(10, 10), Some(100));
    }

    #[test]
    fn preserves_a_wide_step_edge() {
        let mut data = vec![0u8; 20 * 20];
        for y in 0..20 {
            for x in 10..20 {
                data[y * 20 + x] = 200;
            }
        }
        let view = ImageView::from_slice(&data, 20, 20).unwrap();
        let out = median_blur(view, 3).unwrap();
        assert_eq!(out.view().get(5, 10), Some(0));
        assert_eq!(out.view().get(15, 10), Some(200));
    }

    #[test]
    fn identity_on_uniform_input() {
        let data = vec![42u8; 15 * 15];
        let view = ImageView::from_slice(&data, 15, 15).unwrap();
        let out = median_blur(view, 11).unwrap();
        assert!(out.as_slice().iter().all(|&v| v == 42));
    }
}
