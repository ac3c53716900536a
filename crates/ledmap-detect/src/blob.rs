//! Connected blobs of a binary mask and their shape descriptors.
//!
//! Blobs are 8-connected components. Each is described by the closed outer
//! boundary traced through its pixel centers (Moore neighborhood, Jacob's
//! stopping criterion): `area` is the area enclosed by that boundary and
//! `perimeter` its length, so a single pixel or a one-pixel-wide line has
//! zero area. The centroid and brightness means are taken over all pixels.

use ledmap_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::mask::{BinaryMask, MaskCleanup};

/// Clockwise neighbor order in image coordinates (Y down), starting east.
const DIRS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Index of west in [`DIRS`]; the raster-first pixel of a blob always has
/// background there.
const WEST: usize = 4;

/// A candidate light blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Pixel centroid (pixels, origin top-left).
    pub center: Point2<f32>,
    /// Area enclosed by the traced outer boundary.
    pub area: f32,
    pub pixel_count: usize,
    pub perimeter: f32,
    /// `4*pi*area / perimeter^2`, clamped to `[0, 1]`; zero without a perimeter.
    pub circularity: f32,
    /// Mean of the brightness image over the blob (0 when not sampled).
    pub raw_brightness: f32,
    /// Mean of the difference image over the blob (0 when not sampled).
    pub diff_brightness: f32,
    /// Filled in by the scorer that selected this candidate.
    pub score: f32,
}

/// Area band and cleanup settings for blob extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobParams {
    /// Blobs with `area < min_area` are dropped.
    pub min_area: f32,
    /// Blobs with `area > max_area` are dropped; `None` disables the bound.
    pub max_area: Option<f32>,
    pub cleanup: MaskCleanup,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            min_area: 5.0,
            max_area: None,
            cleanup: MaskCleanup::default(),
        }
    }
}

impl BlobParams {
    pub fn accepts(&self, area: f32) -> bool {
        area >= self.min_area && self.max_area.is_none_or(|max| area <= max)
    }
}

/// Images sampled for per-blob mean brightness. Views whose size does not
/// match the mask are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrightnessSamples<'a> {
    pub raw: Option<GrayImageView<'a>>,
    pub diff: Option<GrayImageView<'a>>,
}

/// Clean the mask, split it into blobs and keep those inside the area band.
///
/// A mask whose buffer does not match its dimensions yields no candidates.
///
/// Candidates come back in raster order of their first pixel with
/// `score = 0`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(mask, samples, params),
        fields(width = mask.width, height = mask.height)
    )
)]
pub fn extract_candidates(
    mask: &BinaryMask,
    samples: BrightnessSamples<'_>,
    params: &BlobParams,
) -> Vec<Candidate> {
    if !mask.is_consistent() {
        log::debug!(
            "mask {}x{} holds {} cells, no candidates",
            mask.width,
            mask.height,
            mask.data.len()
        );
        return Vec::new();
    }
    let cleaned = params.cleanup.apply(mask);
    let usable = |img: &GrayImageView<'_>| {
        img.is_consistent() && img.width == mask.width && img.height == mask.height
    };
    let raw = samples.raw.filter(|img| usable(img));
    let diff = samples.diff.filter(|img| usable(img));

    let components = label_components(&cleaned);
    let mut out = Vec::new();
    for comp in &components.blobs {
        let (perimeter, area) = trace_boundary(&components, comp);
        if !params.accepts(area) {
            continue;
        }
        let n = comp.pixels.len() as f32;
        let (sx, sy) = comp
            .pixels
            .iter()
            .fold((0.0f64, 0.0f64), |(sx, sy), &(x, y)| {
                (sx + x as f64, sy + y as f64)
            });
        let mean_of = |img: Option<GrayImageView<'_>>| {
            img.map_or(0.0, |img| {
                let sum: u64 = comp.pixels.iter().map(|&(x, y)| img.get(x, y) as u64).sum();
                sum as f32 / n
            })
        };
        out.push(Candidate {
            center: Point2::new((sx / n as f64) as f32, (sy / n as f64) as f32),
            area,
            pixel_count: comp.pixels.len(),
            perimeter,
            circularity: circularity(area, perimeter),
            raw_brightness: mean_of(raw),
            diff_brightness: mean_of(diff),
            score: 0.0,
        });
    }
    log::trace!(
        "{} blobs, {} inside area band",
        components.blobs.len(),
        out.len()
    );
    out
}

/// `4*pi*A / P^2`, clamped to `[0, 1]`.
pub fn circularity(area: f32, perimeter: f32) -> f32 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    (4.0 * std::f32::consts::PI * area / (perimeter * perimeter)).clamp(0.0, 1.0)
}

struct Component {
    label: u32,
    pixels: Vec<(usize, usize)>,
}

struct Components {
    width: usize,
    height: usize,
    labels: Vec<u32>, // 0 = background
    blobs: Vec<Component>,
}

fn label_components(mask: &BinaryMask) -> Components {
    let (w, h) = (mask.width, mask.height);
    let mut labels = vec![0u32; w * h];
    let mut blobs = Vec::new();
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if !mask.get(x, y) || labels[y * w + x] != 0 {
                continue;
            }
            let label = blobs.len() as u32 + 1;
            let mut pixels = Vec::new();
            labels[y * w + x] = label;
            stack.push((x, y));
            while let Some((px, py)) = stack.pop() {
                pixels.push((px, py));
                for &(dx, dy) in &DIRS {
                    let nx = px as i64 + dx;
                    let ny = py as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if mask.get(nx, ny) && labels[ny * w + nx] == 0 {
                        labels[ny * w + nx] = label;
                        stack.push((nx, ny));
                    }
                }
            }
            // pixels[0] is the raster-first pixel; the boundary trace starts there.
            blobs.push(Component { label, pixels });
        }
    }

    Components {
        width: w,
        height: h,
        labels,
        blobs,
    }
}

/// Returns `(perimeter, enclosed_area)` of the outer boundary.
fn trace_boundary(all: &Components, comp: &Component) -> (f32, f32) {
    let inside = |x: i64, y: i64| {
        x >= 0
            && y >= 0
            && (x as usize) < all.width
            && (y as usize) < all.height
            && all.labels[y as usize * all.width + x as usize] == comp.label
    };
    let Some(&(sx, sy)) = comp.pixels.first() else {
        return (0.0, 0.0);
    };
    let start = (sx as i64, sy as i64);

    let mut p = start;
    let mut back = WEST;
    let mut first_step: Option<((i64, i64), usize)> = None;
    let mut perimeter = 0.0f32;
    let mut twice_area = 0.0f64;
    let max_steps = 4 * comp.pixels.len() + 16;

    for _ in 0..max_steps {
        // Sweep clockwise from the backtrack neighbor.
        let mut step = None;
        for k in 1..=8 {
            let d = (back + k) % 8;
            if inside(p.0 + DIRS[d].0, p.1 + DIRS[d].1) {
                step = Some((d, (back + k - 1) % 8));
                break;
            }
        }
        let Some((d, prev)) = step else {
            return (0.0, 0.0); // isolated pixel
        };
        let c = (p.0 + DIRS[d].0, p.1 + DIRS[d].1);
        let b = (p.0 + DIRS[prev].0, p.1 + DIRS[prev].1);
        let new_back = direction_of(b.0 - c.0, b.1 - c.1);

        if p == start {
            match first_step {
                Some(first) if first == (c, new_back) => break,
                Some(_) => {}
                None => first_step = Some((c, new_back)),
            }
        }

        perimeter += if d % 2 == 0 {
            1.0
        } else {
            std::f32::consts::SQRT_2
        };
        twice_area += (p.0 * c.1 - c.0 * p.1) as f64;
        p = c;
        back = new_back;
    }

    (perimeter, (twice_area.abs() * 0.5) as f32)
}

fn direction_of(dx: i64, dy: i64) -> usize {
    DIRS.iter().position(|&d| d == (dx, dy)).unwrap_or(WEST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ledmap_core::GrayImage;

    fn disk_mask(w: usize, h: usize, cx: f32, cy: f32, r: f32) -> BinaryMask {
        let mut m = BinaryMask::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r * r {
                    m.set(x, y, true);
                }
            }
        }
        m
    }

    fn rect_mask(w: usize, h: usize, x0: usize, y0: usize, rw: usize, rh: usize) -> BinaryMask {
        let mut m = BinaryMask::new(w, h);
        for y in y0..y0 + rh {
            for x in x0..x0 + rw {
                m.set(x, y, true);
            }
        }
        m
    }

    fn single_component(mask: &BinaryMask) -> (f32, f32) {
        let comps = label_components(mask);
        assert_eq!(comps.blobs.len(), 1);
        trace_boundary(&comps, &comps.blobs[0])
    }

    #[test]
    fn square_boundary_runs_through_pixel_centers() {
        let m = rect_mask(10, 10, 2, 3, 3, 3);
        let (perimeter, area) = single_component(&m);
        assert_abs_diff_eq!(perimeter, 8.0, epsilon = 1e-5);
        assert_abs_diff_eq!(area, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn thin_shapes_have_no_area() {
        let (p, a) = single_component(&rect_mask(6, 6, 1, 1, 2, 1));
        assert_abs_diff_eq!(p, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(a, 0.0, epsilon = 1e-5);

        let (p, a) = single_component(&rect_mask(6, 6, 2, 2, 1, 1));
        assert_eq!((p, a), (0.0, 0.0));
    }

    #[test]
    fn trace_terminates_on_shapes_with_spurs() {
        // A plus sign revisits its start pixel before closing.
        let mut m = rect_mask(9, 9, 4, 1, 1, 7);
        for x in 1..8 {
            m.set(x, 4, true);
        }
        let (p, a) = single_component(&m);
        assert!(p > 0.0 && p.is_finite());
        assert!(a >= 0.0);
    }

    #[test]
    fn disk_is_nearly_circular() {
        let m = disk_mask(40, 40, 20.0, 20.0, 8.0);
        let cands = extract_candidates(&m, BrightnessSamples::default(), &BlobParams::default());
        assert_eq!(cands.len(), 1);
        let c = &cands[0];
        assert_abs_diff_eq!(c.center.x, 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(c.center.y, 20.0, epsilon = 1e-3);
        assert!(c.circularity > 0.8, "circularity {}", c.circularity);
        assert!(c.area > 150.0 && c.area < 220.0, "area {}", c.area);
    }

    #[test]
    fn area_band_filters_blobs() {
        let m = disk_mask(60, 30, 10.0, 15.0, 2.0).union(&disk_mask(60, 30, 40.0, 15.0, 9.0));
        let params = BlobParams {
            min_area: 20.0,
            max_area: Some(1000.0),
            ..BlobParams::default()
        };
        let cands = extract_candidates(&m, BrightnessSamples::default(), &params);
        assert_eq!(cands.len(), 1);
        assert_abs_diff_eq!(cands[0].center.x, 40.0, epsilon = 1e-3);

        let tight = BlobParams {
            min_area: 1.0,
            max_area: Some(30.0),
            ..BlobParams::default()
        };
        let cands = extract_candidates(&m, BrightnessSamples::default(), &tight);
        assert_eq!(cands.len(), 1);
        assert_abs_diff_eq!(cands[0].center.x, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn brightness_means_sample_matching_views_only() {
        let m = rect_mask(12, 12, 3, 3, 5, 5);
        let mut raw = GrayImage::new(12, 12);
        raw.data.iter_mut().for_each(|v| *v = 90);
        let wrong = GrayImage::new(5, 5);
        let samples = BrightnessSamples {
            raw: Some(raw.view()),
            diff: Some(wrong.view()),
        };
        let cands = extract_candidates(&m, samples, &BlobParams::default());
        assert_eq!(cands.len(), 1);
        assert_abs_diff_eq!(cands[0].raw_brightness, 90.0, epsilon = 1e-4);
        assert_eq!(cands[0].diff_brightness, 0.0);
        // the cleanup rounds off the four corners
        assert_eq!(cands[0].pixel_count, 21);
    }

    #[test]
    fn inconsistent_mask_yields_no_candidates() {
        let m = BinaryMask {
            width: 10,
            height: 10,
            data: vec![true; 7],
        };
        let cands = extract_candidates(&m, BrightnessSamples::default(), &BlobParams::default());
        assert!(cands.is_empty());
    }
}
