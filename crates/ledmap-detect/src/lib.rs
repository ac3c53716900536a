//! Light-blob detection for LED calibration.
//!
//! - [`BinaryMask`] + [`MaskCleanup`]: thresholded masks and the mandatory
//!   open-then-close pass.
//! - [`extract_candidates`]: 8-connected blobs with area, perimeter,
//!   circularity and brightness means.
//! - [`detect_differential`] / [`detect_hue_class`]: the two frame-level
//!   detectors (baseline differencing and marker hue classes).
//! - [`confirm`]: agreement of repeated detections across frames.

mod blob;
mod confirm;
mod detect;
mod hue;
mod mask;
mod score;

pub use blob::{circularity, extract_candidates, BlobParams, BrightnessSamples, Candidate};
pub use confirm::{confirm, ConfirmParams, Confirmation, Inconclusive};
pub use detect::{detect_differential, detect_hue_class, HueFrame};
pub use hue::{HsvRange, HueBand, MarkerClass};
pub use mask::{ellipse_kernel, BinaryMask, MaskCleanup};
pub use score::{
    light_output, score_differential, select_hue_class, DifferentialParams, HueParams,
    ScoreWeights, SequenceBlend, Selection,
};
