use ledmap_core::{abs_diff, GrayImage, GrayImageView, HsvImage, RgbImageView};

use crate::blob::{extract_candidates, BrightnessSamples};
use crate::hue::MarkerClass;
use crate::mask::BinaryMask;
use crate::score::{score_differential, select_hue_class, DifferentialParams, HueParams, Selection};

/// Find the light that appeared since `baseline`.
///
/// Size mismatches and malformed buffers give an empty selection.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(frame, baseline, params),
        fields(width = frame.width, height = frame.height)
    )
)]
pub fn detect_differential(
    frame: &GrayImageView<'_>,
    baseline: &GrayImageView<'_>,
    params: &DifferentialParams,
) -> Selection {
    let Some(diff) = abs_diff(frame, baseline) else {
        log::debug!(
            "frame {}x{} does not match baseline {}x{}",
            frame.width,
            frame.height,
            baseline.width,
            baseline.height
        );
        return Selection::default();
    };
    let mask = BinaryMask::from_threshold(&diff.view(), params.diff_threshold);
    let samples = BrightnessSamples {
        raw: Some(*frame),
        diff: Some(diff.view()),
    };
    let candidates = extract_candidates(&mask, samples, &params.blob);
    score_differential(candidates, params)
}

/// One frame prepared for hue classification.
#[derive(Clone, Debug)]
pub struct HueFrame {
    pub hsv: HsvImage,
    value: GrayImage,
}

impl HueFrame {
    pub fn from_rgb(frame: &RgbImageView<'_>) -> Option<Self> {
        if !frame.is_consistent() || frame.data.is_empty() {
            return None;
        }
        let hsv = frame.to_hsv();
        let value = hsv.value_channel();
        Some(Self { hsv, value })
    }

    pub fn value(&self) -> GrayImageView<'_> {
        self.value.view()
    }
}

/// Detect the blob of one marker class. Brightness is the HSV value channel.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(frame, params), fields(class = class.label()))
)]
pub fn detect_hue_class(frame: &HueFrame, class: MarkerClass, params: &HueParams) -> Selection {
    let mask = params.band(class).mask(&frame.hsv);
    let samples = BrightnessSamples {
        raw: Some(frame.value()),
        diff: None,
    };
    let candidates = extract_candidates(&mask, samples, &params.blob);
    select_hue_class(candidates, class, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ledmap_core::RgbImage;

    fn dark(w: usize, h: usize) -> RgbImage {
        RgbImage::new(w, h)
    }

    #[test]
    fn lit_disk_is_found_against_baseline() {
        let baseline = dark(64, 48);
        let mut frame = baseline.clone();
        frame.fill_disk(40.0, 20.0, 4.0, [230, 230, 230]);
        let b = baseline.view().to_gray();
        let f = frame.view().to_gray();
        let sel = detect_differential(&f.view(), &b.view(), &DifferentialParams::default());
        let best = sel.best.expect("disk");
        assert_abs_diff_eq!(best.center.x, 40.0, epsilon = 0.5);
        assert_abs_diff_eq!(best.center.y, 20.0, epsilon = 0.5);
        assert!(best.raw_brightness > 200.0);
    }

    #[test]
    fn dim_change_stays_below_threshold() {
        let baseline = dark(32, 32);
        let mut frame = baseline.clone();
        frame.fill_disk(16.0, 16.0, 4.0, [20, 20, 20]);
        let sel = detect_differential(
            &frame.view().to_gray().view(),
            &baseline.view().to_gray().view(),
            &DifferentialParams::default(),
        );
        assert!(sel.is_empty());
    }

    #[test]
    fn size_mismatch_is_not_an_error() {
        let a = GrayImage::new(10, 10);
        let b = GrayImage::new(12, 10);
        let sel = detect_differential(&a.view(), &b.view(), &DifferentialParams::default());
        assert!(sel.is_empty());
    }

    #[test]
    fn hue_classes_pick_their_own_color() {
        let mut img = dark(80, 40);
        img.fill_disk(10.0, 20.0, 5.0, [0, 0, 255]);
        img.fill_disk(40.0, 20.0, 5.0, [0, 255, 0]);
        img.fill_disk(70.0, 20.0, 5.0, [255, 0, 0]);
        let frame = HueFrame::from_rgb(&img.view()).expect("frame");
        let params = HueParams::default();

        let start = detect_hue_class(&frame, MarkerClass::Start, &params);
        let seq = detect_hue_class(&frame, MarkerClass::Sequence, &params);
        let end = detect_hue_class(&frame, MarkerClass::End, &params);
        assert_abs_diff_eq!(start.best.expect("blue").center.x, 10.0, epsilon = 0.5);
        assert_abs_diff_eq!(seq.best.expect("green").center.x, 40.0, epsilon = 0.5);
        assert_abs_diff_eq!(end.best.expect("red").center.x, 70.0, epsilon = 0.5);
    }

    #[test]
    fn malformed_frame_is_rejected() {
        let bad = RgbImage {
            width: 4,
            height: 4,
            data: vec![0; 5],
        };
        assert!(HueFrame::from_rgb(&bad.view()).is_none());
    }
}
