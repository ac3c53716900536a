//! Binary masks and the open-then-close cleanup pass.

use ledmap_core::GrayImageView;
use serde::{Deserialize, Serialize};

/// Row-major binary mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    /// `true` wherever `img > threshold`.
    pub fn from_threshold(img: &GrayImageView<'_>, threshold: u8) -> Self {
        Self {
            width: img.width,
            height: img.height,
            data: img.data.iter().map(|&v| v > threshold).collect(),
        }
    }

    /// Buffer length matches the dimensions.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.width * self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        self.data[y * self.width + x] = v;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn union(&self, other: &BinaryMask) -> BinaryMask {
        BinaryMask {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| a || b)
                .collect(),
        }
    }

    pub fn erode(&self, kernel: &[(i32, i32)]) -> BinaryMask {
        self.morph(kernel, true)
    }

    pub fn dilate(&self, kernel: &[(i32, i32)]) -> BinaryMask {
        self.morph(kernel, false)
    }

    // Erosion keeps a pixel only if every in-bounds kernel neighbor is set;
    // dilation sets it if any is. Out-of-bounds neighbors are ignored.
    fn morph(&self, kernel: &[(i32, i32)], erode: bool) -> BinaryMask {
        let mut out = BinaryMask::new(self.width, self.height);
        if !self.is_consistent() {
            return out;
        }
        let (w, h) = (self.width as i32, self.height as i32);
        for y in 0..h {
            for x in 0..w {
                let mut acc = erode;
                for &(dx, dy) in kernel {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let v = self.data[(ny * w + nx) as usize];
                    if erode && !v {
                        acc = false;
                        break;
                    }
                    if !erode && v {
                        acc = true;
                        break;
                    }
                }
                out.data[(y * w + x) as usize] = acc;
            }
        }
        out
    }
}

/// Morphological cleanup applied to every mask before blob extraction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaskCleanup {
    /// Radius of the elliptical structuring element (1 => 3x3 cross,
    /// 2 => 5x5 ellipse).
    /// Values below 1 are raised to 1: the pass is never skipped.
    pub kernel_radius: u32,
}

impl Default for MaskCleanup {
    fn default() -> Self {
        Self { kernel_radius: 1 }
    }
}

impl MaskCleanup {
    /// Open (drop isolated specks) then close (fill pinholes).
    pub fn apply(&self, mask: &BinaryMask) -> BinaryMask {
        let kernel = ellipse_kernel(self.kernel_radius.max(1));
        let opened = mask.erode(&kernel).dilate(&kernel);
        opened.dilate(&kernel).erode(&kernel)
    }
}

/// Offsets of the elliptical structuring element fitting a `(2r+1)^2` box,
/// rasterized row by row like OpenCV's `MORPH_ELLIPSE`: row `dy` spans
/// `|dx| <= round(sqrt(r^2 - dy^2))`. Radius 1 is the 3x3 cross.
pub fn ellipse_kernel(radius: u32) -> Vec<(i32, i32)> {
    let r = radius as i32;
    let mut out = Vec::new();
    for dy in -r..=r {
        let half = (((r * r - dy * dy) as f64).sqrt()).round() as i32;
        for dx in -half..=half {
            out.push((dx, dy));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> BinaryMask {
        let height = rows.len();
        let width = rows[0].len();
        let mut m = BinaryMask::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                m.set(x, y, ch == '#');
            }
        }
        m
    }

    #[test]
    fn small_kernels_match_expected_shapes() {
        let k1 = ellipse_kernel(1);
        assert_eq!(k1.len(), 5);
        assert!(!k1.contains(&(1, 1)));
        let k2 = ellipse_kernel(2);
        assert_eq!(k2.len(), 17);
        assert!(k2.contains(&(2, 1)));
        assert!(k2.contains(&(0, 2)));
        assert!(!k2.contains(&(1, 2)));
        assert!(!k2.contains(&(2, 2)));
    }

    #[test]
    fn cleanup_removes_isolated_speck() {
        let m = mask_from_rows(&[
            "..........",
            ".#........",
            "..........",
            "....####..",
            "....####..",
            "....####..",
            "....####..",
            "..........",
        ]);
        let cleaned = MaskCleanup { kernel_radius: 1 }.apply(&m);
        assert!(!cleaned.get(1, 1));
        assert!(cleaned.get(5, 4));
    }

    #[test]
    fn cleanup_fills_pinhole() {
        let m = mask_from_rows(&[
            "..........",
            ".#######..",
            ".#######..",
            ".###.###..",
            ".#######..",
            ".#######..",
            "..........",
        ]);
        let cleaned = MaskCleanup { kernel_radius: 1 }.apply(&m);
        assert!(cleaned.get(4, 3));
    }

    #[test]
    fn inconsistent_mask_morphs_to_empty() {
        let m = BinaryMask {
            width: 4,
            height: 4,
            data: vec![true; 3],
        };
        assert!(!m.is_consistent());
        assert_eq!(m.erode(&ellipse_kernel(1)).count(), 0);
        assert_eq!(m.dilate(&ellipse_kernel(1)).count(), 0);
    }

    #[test]
    fn zero_radius_still_cleans() {
        let mut m = BinaryMask::new(5, 5);
        m.set(2, 2, true);
        let cleaned = MaskCleanup { kernel_radius: 0 }.apply(&m);
        assert_eq!(cleaned.count(), 0);
    }
}
