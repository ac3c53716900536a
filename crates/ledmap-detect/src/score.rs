//! Ranking policies for candidate blobs.
//!
//! Both policies return a [`Selection`]: at most one chosen candidate plus a
//! short ranked list for diagnostics. An empty selection is the normal
//! "not visible yet" outcome.

use serde::{Deserialize, Serialize};

use crate::blob::{BlobParams, Candidate};
use crate::hue::{HueBand, MarkerClass};
use crate::mask::MaskCleanup;

/// Weights of the differential score terms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Total light output relative to the brightest candidate in the frame.
    pub brightness: f32,
    /// Area relative to the largest candidate in the frame.
    pub area: f32,
    pub circularity: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            brightness: 0.70,
            area: 0.20,
            circularity: 0.10,
        }
    }
}

/// Parameters of the active (baseline differencing) detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferentialParams {
    /// Pixels with `|frame - baseline| > diff_threshold` enter the mask.
    pub diff_threshold: u8,
    /// Raw brightness that maps to a unit emphasis factor.
    pub reference_brightness: f32,
    pub weights: ScoreWeights,
    pub blob: BlobParams,
    /// Length of the ranked list kept for diagnostics.
    pub max_ranked: usize,
}

impl Default for DifferentialParams {
    fn default() -> Self {
        Self {
            diff_threshold: 25,
            reference_brightness: 100.0,
            weights: ScoreWeights::default(),
            blob: BlobParams {
                min_area: 5.0,
                max_area: None,
                cleanup: MaskCleanup { kernel_radius: 1 },
            },
            max_ranked: 10,
        }
    }
}

/// Blend used to break ties between several sequence-colored blobs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceBlend {
    pub brightness: f32,
    pub circularity: f32,
}

impl Default for SequenceBlend {
    fn default() -> Self {
        Self {
            brightness: 0.6,
            circularity: 0.4,
        }
    }
}

/// Parameters of the passive (hue-classified) detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueParams {
    pub start_band: HueBand,
    pub sequence_band: HueBand,
    pub end_band: HueBand,
    pub blob: BlobParams,
    pub sequence_blend: SequenceBlend,
    /// End-marker blobs at or above this area are treated as non-LED red
    /// regions and skipped, unless nothing else is left.
    pub end_marker_max_area: f32,
    pub max_ranked: usize,
}

impl Default for HueParams {
    fn default() -> Self {
        Self {
            start_band: HueBand::blue(),
            sequence_band: HueBand::green(),
            end_band: HueBand::red(),
            blob: BlobParams {
                min_area: 10.0,
                max_area: Some(5000.0),
                cleanup: MaskCleanup { kernel_radius: 2 },
            },
            sequence_blend: SequenceBlend::default(),
            end_marker_max_area: 500.0,
            max_ranked: 10,
        }
    }
}

impl HueParams {
    pub fn band(&self, class: MarkerClass) -> &HueBand {
        match class {
            MarkerClass::Start => &self.start_band,
            MarkerClass::Sequence => &self.sequence_band,
            MarkerClass::End => &self.end_band,
        }
    }
}

/// Outcome of a scoring policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub best: Option<Candidate>,
    /// Best first; includes `best`.
    pub ranked: Vec<Candidate>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.best.is_none()
    }

    /// Ranked candidates other than the selected one.
    pub fn rejected(&self) -> &[Candidate] {
        self.ranked.get(1..).unwrap_or(&[])
    }
}

/// Raw-brightness emphasis: `(raw / reference)^2`.
#[inline]
fn emphasis(raw: f32, reference: f32) -> f32 {
    let r = raw / reference.max(f32::EPSILON);
    r * r
}

/// Total light output of a candidate under the differential policy.
pub fn light_output(c: &Candidate, reference_brightness: f32) -> f32 {
    c.area * c.diff_brightness * emphasis(c.raw_brightness, reference_brightness)
}

/// Score every candidate against the frame's maxima and rank them.
pub fn score_differential(mut candidates: Vec<Candidate>, params: &DifferentialParams) -> Selection {
    if candidates.is_empty() {
        return Selection::default();
    }
    let w = &params.weights;
    let totals: Vec<f32> = candidates
        .iter()
        .map(|c| light_output(c, params.reference_brightness))
        .collect();
    let max_total = totals.iter().copied().fold(0.0f32, f32::max);
    let max_area = candidates.iter().map(|c| c.area).fold(0.0f32, f32::max);

    for (c, total) in candidates.iter_mut().zip(totals) {
        let t = if max_total > 0.0 { total / max_total } else { 0.0 };
        let a = if max_area > 0.0 { c.area / max_area } else { 0.0 };
        c.score = w.brightness * t + w.area * a + w.circularity * c.circularity;
    }
    rank(candidates, params.max_ranked, |c| c.score)
}

/// Pick the candidate for one marker class.
///
/// * `Start`: largest area.
/// * `Sequence`: highest brightness/circularity blend.
/// * `End`: largest area among blobs below `end_marker_max_area`.
///
/// Every candidate's `score` is set to the sequence blend so the ranked
/// list is comparable across classes.
pub fn select_hue_class(
    mut candidates: Vec<Candidate>,
    class: MarkerClass,
    params: &HueParams,
) -> Selection {
    let blend = params.sequence_blend;
    for c in &mut candidates {
        c.score =
            (c.raw_brightness / 255.0) * blend.brightness + c.circularity * blend.circularity;
    }
    match class {
        MarkerClass::Start => rank(candidates, params.max_ranked, |c| c.area),
        MarkerClass::Sequence => rank(candidates, params.max_ranked, |c| c.score),
        MarkerClass::End => {
            let (small, oversized): (Vec<_>, Vec<_>) = candidates
                .into_iter()
                .partition(|c| c.area < params.end_marker_max_area);
            let pool = if small.is_empty() {
                if !oversized.is_empty() {
                    log::debug!("all end-marker blobs are oversized, keeping them");
                }
                oversized
            } else {
                small
            };
            rank(pool, params.max_ranked, |c| c.area)
        }
    }
}

fn rank(
    mut candidates: Vec<Candidate>,
    max_ranked: usize,
    key: impl Fn(&Candidate) -> f32,
) -> Selection {
    candidates.sort_by(|a, b| key(b).total_cmp(&key(a)));
    candidates.truncate(max_ranked.max(1));
    Selection {
        best: candidates.first().cloned(),
        ranked: candidates,
    }
}
