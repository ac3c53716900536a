//! Lightweight image containers.
//!
//! Frames arrive as packed 3-channel RGB buffers (row-major, `len = w*h*3`).
//! Detection works on single-channel views derived from them: luma for
//! baseline differencing and HSV for hue classification.

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// True when the buffer length matches the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.width * self.height
    }

    pub fn same_size(&self, other: &GrayImageView<'_>) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn to_owned_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

/// Packed RGB view (`len = w*h*3`).
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    /// Black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Write one pixel; out-of-bounds writes are ignored.
    pub fn put(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let o = (y as usize * self.width + x as usize) * 3;
        self.data[o..o + 3].copy_from_slice(&rgb);
    }

    /// Paint a filled disk, clipped to the frame.
    pub fn fill_disk(&mut self, cx: f32, cy: f32, radius: f32, rgb: [u8; 3]) {
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.put(x, y, rgb);
                }
            }
        }
    }
}

impl RgbImageView<'_> {
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.width * self.height * 3
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let o = (y * self.width + x) * 3;
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    /// Luma conversion with BT.601 weights in 14-bit fixed point.
    pub fn to_gray(&self) -> GrayImage {
        let mut data = Vec::with_capacity(self.width * self.height);
        for px in self.data.chunks_exact(3) {
            let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
            // 0.299, 0.587, 0.114 scaled by 2^14
            let y = (r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14;
            data.push(y.min(255) as u8);
        }
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Convert to 8-bit HSV with hue in `[0, 180)`.
    pub fn to_hsv(&self) -> HsvImage {
        let mut data = Vec::with_capacity(self.width * self.height);
        for px in self.data.chunks_exact(3) {
            data.push(Hsv::from_rgb([px[0], px[1], px[2]]));
        }
        HsvImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// One HSV pixel on the 8-bit scale: hue in `[0, 180)`, saturation and value
/// in `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let v = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let delta = v - min;
        let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };
        let h_deg = if delta <= 0.0 {
            0.0
        } else if v == rf {
            60.0 * (gf - bf) / delta
        } else if v == gf {
            120.0 + 60.0 * (bf - rf) / delta
        } else {
            240.0 + 60.0 * (rf - gf) / delta
        };
        let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };
        let h = (h_deg / 2.0).round() as u32 % 180;
        Self {
            h: h as u8,
            s: s.round().clamp(0.0, 255.0) as u8,
            v: v as u8,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HsvImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Hsv>,
}

impl HsvImage {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Hsv {
        self.data[y * self.width + x]
    }

    /// Value channel as a gray image.
    pub fn value_channel(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|p| p.v).collect(),
        }
    }
}

/// Per-pixel `|a - b|`. Returns `None` when the views differ in size.
pub fn abs_diff(a: &GrayImageView<'_>, b: &GrayImageView<'_>) -> Option<GrayImage> {
    if !a.same_size(b) || !a.is_consistent() || !b.is_consistent() {
        return None;
    }
    let data = a
        .data
        .iter()
        .zip(b.data)
        .map(|(&p, &q)| p.abs_diff(q))
        .collect();
    Some(GrayImage {
        width: a.width,
        height: a.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_colors_map_to_expected_hues() {
        assert_eq!(Hsv::from_rgb([255, 0, 0]).h, 0);
        assert_eq!(Hsv::from_rgb([0, 255, 0]).h, 60);
        assert_eq!(Hsv::from_rgb([0, 0, 255]).h, 120);
        let white = Hsv::from_rgb([255, 255, 255]);
        assert_eq!((white.s, white.v), (0, 255));
    }

    #[test]
    fn gray_conversion_keeps_neutral_levels() {
        let mut img = RgbImage::new(2, 1);
        img.put(0, 0, [200, 200, 200]);
        let gray = img.view().to_gray();
        assert_eq!(gray.data, vec![200, 0]);
    }

    #[test]
    fn abs_diff_rejects_mismatched_sizes() {
        let a = GrayImage::new(4, 4);
        let b = GrayImage::new(4, 3);
        assert!(abs_diff(&a.view(), &b.view()).is_none());

        let mut c = GrayImage::new(4, 4);
        c.data[5] = 30;
        let d = abs_diff(&a.view(), &c.view()).expect("same size");
        assert_eq!(d.data[5], 30);
        assert_eq!(d.data[0], 0);
    }

    #[test]
    fn fill_disk_clips_at_border() {
        let mut img = RgbImage::new(8, 8);
        img.fill_disk(0.0, 0.0, 3.0, [10, 20, 30]);
        assert_eq!(img.view().pixel(0, 0), [10, 20, 30]);
        assert_eq!(img.view().pixel(7, 7), [0, 0, 0]);
    }
}
