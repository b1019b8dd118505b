//! Gradient Hough transform for circles.
//!
//! Edge pixels vote for circle centers along their gradient direction, one
//! vote per candidate radius in the configured range. On rasterized edges
//! the Sobel direction is quantized by the pixel staircase, which splits a
//! center's votes into a small cluster of nearby cells instead of one sharp
//! peak. Peak selection therefore runs on a box-summed copy of the vote map,
//! and each accepted peak is refined to the vote-weighted centroid of its
//! cluster before the radius is read from a histogram of edge-point
//! distances around the refined center.

use crate::config::PipelineConfig;
use crate::image::ImageView;
use crate::segment::Circle;

struct EdgePoint {
    x: f32,
    y: f32,
    // Unit gradient direction.
    dx: f32,
    dy: f32,
}

/// Detects circles in a smoothed grayscale image.
///
/// Returns at most one circle per accepted center, unsorted.
pub fn detect_circles(image: ImageView<'_>, cfg: &PipelineConfig) -> Vec<Circle> {
    let edges = edge_points(image, cfg.edge_threshold);
    tracing::debug!(edge_points = edges.len(), "circle accumulator input");
    if edges.is_empty() {
        return Vec::new();
    }

    let width = image.width();
    let height = image.height();
    let mut accumulator = vec![0u32; width * height];
    for point in &edges {
        // Vote along the gradient line in both directions: the center lies
        // on it whichever side of the edge the darker region is.
        for sign in [-1.0f32, 1.0] {
            for radius in cfg.min_radius..=cfg.max_radius {
                let cx = (point.x + sign * point.dx * radius as f32).round();
                let cy = (point.y + sign * point.dy * radius as f32).round();
                if cx < 0.0 || cy < 0.0 {
                    continue;
                }
                let (cx, cy) = (cx as usize, cy as usize);
                if cx < width && cy < height {
                    accumulator[cy * width + cx] += 1;
                }
            }
        }
    }

    let smoothed = box_sum(&accumulator, width, height, SMOOTH_RADIUS);
    let centers = select_centers(&smoothed, width, height, cfg);
    let mut circles = Vec::with_capacity(centers.len());
    for (px, py) in centers {
        let (cx, cy) = refine_center(&accumulator, width, height, px, py);
        if let Some(radius) = estimate_radius(&edges, cx, cy, cfg) {
            circles.push(Circle {
                cx,
                cy,
                radius,
            });
        }
    }
    circles
}

/// Sobel edge extraction over interior pixels.
fn edge_points(image: ImageView<'_>, threshold: f32) -> Vec<EdgePoint> {
    let width = image.width();
    let height = image.height();
    if width < 3 || height < 3 {
        return Vec::new();
    }

    let mut points = Vec::new();
    for y in 1..height - 1 {
        let above = image.row(y - 1).expect("row in bounds");
        let here = image.row(y).expect("row in bounds");
        let below = image.row(y + 1).expect("row in bounds");
        for x in 1..width - 1 {
            let gx = f32::from(above[x + 1]) + 2.0 * f32::from(here[x + 1])
                + f32::from(below[x + 1])
                - f32::from(above[x - 1])
                - 2.0 * f32::from(here[x - 1])
                - f32::from(below[x - 1]);
            let gy = f32::from(below[x - 1]) + 2.0 * f32::from(below[x])
                + f32::from(below[x + 1])
                - f32::from(above[x - 1])
                - 2.0 * f32::from(above[x])
                - f32::from(above[x + 1]);
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude >= threshold {
                points.push(EdgePoint {
                    x: x as f32,
                    y: y as f32,
                    dx: gx / magnitude,
                    dy: gy / magnitude,
                });
            }
        }
    }
    points
}

// Half-width of the box window used both to merge staircase vote clusters
// before peak selection and to average them back into one center.
const SMOOTH_RADIUS: usize = 2;
const CENTROID_RADIUS: usize = 10;

/// Sliding box sum with clamped borders, separable in two passes.
fn box_sum(src: &[u32], width: usize, height: usize, radius: usize) -> Vec<u32> {
    let mut rows = vec![0u32; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let mut acc: u32 = row[..(radius + 1).min(width)].iter().sum();
        rows[y * width] = acc;
        for x in 1..width {
            if x + radius < width {
                acc += row[x + radius];
            }
            if x > radius {
                acc -= row[x - radius - 1];
            }
            rows[y * width + x] = acc;
        }
    }

    let mut out = vec![0u32; width * height];
    for x in 0..width {
        let mut acc: u32 = (0..(radius + 1).min(height)).map(|y| rows[y * width + x]).sum();
        out[x] = acc;
        for y in 1..height {
            if y + radius < height {
                acc += rows[(y + radius) * width + x];
            }
            if y > radius {
                acc -= rows[(y - radius - 1) * width + x];
            }
            out[y * width + x] = acc;
        }
    }
    out
}

/// Picks local maxima of the summed vote map above threshold, strongest
/// first, suppressing centers closer than `min_center_dist` to an already
/// accepted one.
fn select_centers(
    summed: &[u32],
    width: usize,
    height: usize,
    cfg: &PipelineConfig,
) -> Vec<(usize, usize)> {
    let mut peaks: Vec<(usize, usize, u32)> = Vec::new();
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let votes = summed[y * width + x];
            if votes < cfg.accumulator_threshold {
                continue;
            }
            let mut is_max = true;
            'neighbors: for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    if (nx, ny) != (x, y) && summed[ny * width + nx] > votes {
                        is_max = false;
                        break 'neighbors;
                    }
                }
            }
            if is_max {
                peaks.push((x, y, votes));
            }
        }
    }
    peaks.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.1, a.0).cmp(&(b.1, b.0))));

    let min_dist_sq = (cfg.min_center_dist * cfg.min_center_dist) as f32;
    let mut kept: Vec<(usize, usize)> = Vec::new();
    for (x, y, _) in peaks {
        let far_enough = kept.iter().all(|&(kx, ky)| {
            (kx as f32 - x as f32).powi(2) + (ky as f32 - y as f32).powi(2) >= min_dist_sq
        });
        if far_enough {
            kept.push((x, y));
        }
    }
    kept
}

/// Vote-weighted centroid of the cluster around a selected peak.
///
/// Two passes over the raw vote map: the first recenters the window on the
/// cluster, the second averages it symmetrically. This cancels the staircase
/// bias, which scatters votes into lobes placed symmetrically about the true
/// center.
fn refine_center(
    accumulator: &[u32],
    width: usize,
    height: usize,
    px: usize,
    py: usize,
) -> (f32, f32) {
    let mut cx = px as f32;
    let mut cy = py as f32;
    for _ in 0..2 {
        let x0 = (cx.round() as usize).saturating_sub(CENTROID_RADIUS);
        let y0 = (cy.round() as usize).saturating_sub(CENTROID_RADIUS);
        let x1 = (cx.round() as usize + CENTROID_RADIUS).min(width - 1);
        let y1 = (cy.round() as usize + CENTROID_RADIUS).min(height - 1);

        let mut total = 0f64;
        let mut sum_x = 0f64;
        let mut sum_y = 0f64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let votes = f64::from(accumulator[y * width + x]);
                total += votes;
                sum_x += votes * x as f64;
                sum_y += votes * y as f64;
            }
        }
        if total == 0.0 {
            break;
        }
        cx = (sum_x / total) as f32;
        cy = (sum_y / total) as f32;
    }
    (cx, cy)
}

/// Most supported radius for a center, from the edge-distance histogram.
///
/// Returns `None` when no radius bin reaches the accumulator threshold.
fn estimate_radius(edges: &[EdgePoint], cx: f32, cy: f32, cfg: &PipelineConfig) -> Option<f32> {
    let bins = cfg.max_radius - cfg.min_radius + 1;
    let mut hist = vec![0u32; bins];
    for point in edges {
        let distance = ((point.x - cx).powi(2) + (point.y - cy).powi(2)).sqrt();
        let bin = distance.round() as isize - cfg.min_radius as isize;
        if (0..bins as isize).contains(&bin) {
            hist[bin as usize] += 1;
        }
    }

    let (best_bin, &support) = hist
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
    if support < cfg.accumulator_threshold {
        return None;
    }
    Some((cfg.min_radius + best_bin) as f32)
}

#[cfg(test)]
mod tests {
    use super::detect_circles;
    use crate::config::PipelineConfig;
    use crate::image::ImageView;

    fn disk_image(width: usize, height: usize, cx: f32, cy: f32, radius: f32) -> Vec<u8> {
        let mut data = vec![200u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
                if d < radius {
                    data[y * width + x] = 40;
                }
            }
        }
        data
    }

    #[test]
    fn finds_a_single_dark_disk() {
        let data = disk_image(200, 200, 100.0, 100.0, 40.0);
        let view = ImageView::from_slice(&data, 200, 200).unwrap();
        let circles = detect_circles(view, &PipelineConfig::default());
        assert_eq!(circles.len(), 1);
        let circle = &circles[0];
        assert!((circle.cx - 100.0).abs() <= 2.0, "cx = {}", circle.cx);
        assert!((circle.cy - 100.0).abs() <= 2.0, "cy = {}", circle.cy);
        assert!((circle.radius - 40.0).abs() <= 2.0, "r = {}", circle.radius);
    }

    #[test]
    fn staircase_edges_do_not_pull_the_center_diagonally() {
        // A rasterized circle quantizes Sobel directions along the pixel
        // staircase, scattering the center votes into lobes offset from the
        // true center. Centroid refinement must average the lobes back.
        let data = disk_image(220, 220, 83.0, 117.0, 55.0);
        let view = ImageView::from_slice(&data, 220, 220).unwrap();
        let circles = detect_circles(view, &PipelineConfig::default());
        assert_eq!(circles.len(), 1);
        let circle = &circles[0];
        assert!((circle.cx - 83.0).abs() <= 2.0, "cx = {}", circle.cx);
        assert!((circle.cy - 117.0).abs() <= 2.0, "cy = {}", circle.cy);
        assert!((circle.radius - 55.0).abs() <= 2.0, "r = {}", circle.radius);
    }

    #[test]
    fn separated_disks_yield_two_circles() {
        let mut data = disk_image(300, 160, 70.0, 80.0, 30.0);
        for y in 0..160 {
            for x in 0..300 {
                let d = ((x as f32 - 220.0).powi(2) + (y as f32 - 80.0).powi(2)).sqrt();
                if d < 45.0 {
                    data[y * 300 + x] = 40;
                }
            }
        }
        let view = ImageView::from_slice(&data, 300, 160).unwrap();
        let mut radii: Vec<f32> = detect_circles(view, &PipelineConfig::default())
            .iter()
            .map(|c| c.radius)
            .collect();
        radii.sort_by(f32::total_cmp);
        assert_eq!(radii.len(), 2);
        assert!((radii[0] - 30.0).abs() <= 2.0);
        assert!((radii[1] - 45.0).abs() <= 2.0);
    }

    #[test]
    fn featureless_image_yields_nothing() {
        let data = vec![128u8; 120 * 120];
        let view = ImageView::from_slice(&data, 120, 120).unwrap();
        assert!(detect_circles(view, &PipelineConfig::default()).is_empty());
    }
}
