//! Color classes used by the passive (marker sequence) mode.

use ledmap_core::{Hsv, HsvImage};
use serde::{Deserialize, Serialize};

use crate::mask::BinaryMask;

/// Inclusive box in 8-bit HSV space (hue on the `[0, 180)` scale).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lo: [u8; 3],
    pub hi: [u8; 3],
}

impl HsvRange {
    pub const fn new(lo: [u8; 3], hi: [u8; 3]) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn contains(&self, p: Hsv) -> bool {
        (self.lo[0]..=self.hi[0]).contains(&p.h)
            && (self.lo[1]..=self.hi[1]).contains(&p.s)
            && (self.lo[2]..=self.hi[2]).contains(&p.v)
    }
}

/// Union of HSV boxes; red needs two because its hue wraps around zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueBand {
    pub ranges: Vec<HsvRange>,
}

impl HueBand {
    pub fn blue() -> Self {
        Self {
            ranges: vec![HsvRange::new([100, 100, 100], [130, 255, 255])],
        }
    }

    pub fn green() -> Self {
        Self {
            ranges: vec![HsvRange::new([35, 100, 100], [85, 255, 255])],
        }
    }

    pub fn red() -> Self {
        Self {
            ranges: vec![
                HsvRange::new([0, 100, 100], [10, 255, 255]),
                HsvRange::new([160, 100, 100], [180, 255, 255]),
            ],
        }
    }

    pub fn contains(&self, p: Hsv) -> bool {
        self.ranges.iter().any(|r| r.contains(p))
    }

    pub fn mask(&self, hsv: &HsvImage) -> BinaryMask {
        BinaryMask {
            width: hsv.width,
            height: hsv.height,
            data: hsv.data.iter().map(|&p| self.contains(p)).collect(),
        }
    }
}

/// What a colored blob means in a marker sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerClass {
    /// Blue: the first LED.
    Start,
    /// Green: every LED between the markers.
    Sequence,
    /// Red: the last LED.
    End,
}

impl MarkerClass {
    pub const ALL: [MarkerClass; 3] = [MarkerClass::Start, MarkerClass::Sequence, MarkerClass::End];

    pub fn label(self) -> &'static str {
        match self {
            MarkerClass::Start => "start",
            MarkerClass::Sequence => "sequence",
            MarkerClass::End => "end",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledmap_core::RgbImage;

    #[test]
    fn saturated_primaries_fall_into_their_bands() {
        assert!(HueBand::blue().contains(Hsv::from_rgb([0, 0, 255])));
        assert!(HueBand::green().contains(Hsv::from_rgb([0, 255, 0])));
        assert!(HueBand::red().contains(Hsv::from_rgb([255, 0, 0])));
        // Magenta-ish red sits on the wrapped side of the hue circle.
        assert!(HueBand::red().contains(Hsv::from_rgb([255, 0, 40])));
        assert!(!HueBand::green().contains(Hsv::from_rgb([255, 0, 0])));
    }

    #[test]
    fn dim_or_washed_out_pixels_are_excluded() {
        assert!(!HueBand::green().contains(Hsv::from_rgb([0, 60, 0])));
        assert!(!HueBand::green().contains(Hsv::from_rgb([200, 255, 200])));
        assert!(!HueBand::blue().contains(Hsv::from_rgb([255, 255, 255])));
    }

    #[test]
    fn mask_marks_only_in_band_pixels() {
        let mut img = RgbImage::new(4, 1);
        img.put(1, 0, [0, 255, 0]);
        img.put(2, 0, [0, 0, 255]);
        let mask = HueBand::green().mask(&img.view().to_hsv());
        assert_eq!(mask.data, vec![false, true, false, false]);
    }
}
