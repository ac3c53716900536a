//! Frame-by-frame discovery of LED positions in a marker-sequence clip.
//!
//! The recorded pattern holds the start marker (index 0) and the end marker
//! (last index) lit in their own colors while the sequence color walks along
//! the strip one LED at a time. Every sequence-colored blob that is not near
//! a position seen before gets the next index.

use kiddo::{KdTree, SquaredEuclidean};
use ledmap_core::{LedIndex, MarkKind, OverlayEvent, PositionMap, RgbImageView};
use ledmap_detect::{detect_hue_class, HueFrame, MarkerClass};
use nalgebra::Point2;
use serde::Serialize;

use crate::error::TrackError;
use crate::params::TrackerParams;

/// What one frame contributed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observation {
    pub start_found: Option<Point2<f32>>,
    pub end_found: Option<Point2<f32>>,
    /// Newly assigned sequence index.
    pub discovered: Option<(LedIndex, Point2<f32>)>,
    /// Sequence candidates dismissed as duplicates or beyond the quota.
    pub dismissed: Vec<Point2<f32>>,
    /// Lower-ranked sequence blobs that were not considered.
    pub ignored: Vec<Point2<f32>>,
}

/// Final outcome of a tracked clip.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TrackResult {
    /// Start marker at 0, sequence at `1..`, end marker last.
    pub positions: PositionMap,
    pub sequence_found: usize,
    pub end_index: Option<LedIndex>,
    /// Both markers and every expected sequence position were found.
    pub complete: bool,
    /// Stopped by the cancel token before the clip ended.
    pub cancelled: bool,
    pub frames: u64,
}

pub struct SequenceTracker {
    params: TrackerParams,
    start: Option<Point2<f32>>,
    end: Option<Point2<f32>>,
    sequence: Vec<Point2<f32>>,
    tree: KdTree<f32, 2>,
    frames: u64,
}

impl SequenceTracker {
    pub fn new(params: TrackerParams) -> Result<Self, TrackError> {
        params.validate()?;
        Ok(Self {
            params,
            start: None,
            end: None,
            sequence: Vec::new(),
            tree: KdTree::new(),
            frames: 0,
        })
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    pub fn start_marker(&self) -> Option<Point2<f32>> {
        self.start
    }

    pub fn end_marker(&self) -> Option<Point2<f32>> {
        self.end
    }

    pub fn sequence(&self) -> &[Point2<f32>] {
        &self.sequence
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Positions found so far, markers included.
    pub fn found(&self) -> usize {
        self.sequence.len() + self.start.is_some() as usize + self.end.is_some() as usize
    }

    fn quota_full(&self) -> bool {
        self.params
            .sequence_quota()
            .is_some_and(|q| self.sequence.len() >= q)
    }

    /// True once both markers and the full sequence quota are known. Never
    /// true without an expected total.
    pub fn is_done(&self) -> bool {
        self.start.is_some() && self.end.is_some() && self.quota_full()
    }

    /// Process one frame. Malformed frames count but contribute nothing.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, frame), fields(frame = self.frames + 1))
    )]
    pub fn observe(&mut self, frame: &RgbImageView<'_>) -> Observation {
        self.frames += 1;
        let mut obs = Observation::default();
        let Some(hue) = HueFrame::from_rgb(frame) else {
            log::debug!("frame {} is malformed, skipped", self.frames);
            return obs;
        };
        let hp = &self.params.hue;

        if self.start.is_none() {
            if let Some(c) = detect_hue_class(&hue, MarkerClass::Start, hp).best {
                log::info!(
                    "start marker (index 0) at ({:.1}, {:.1}) in frame {}",
                    c.center.x,
                    c.center.y,
                    self.frames
                );
                self.start = Some(c.center);
                obs.start_found = Some(c.center);
            }
        }
        if self.end.is_none() {
            if let Some(c) = detect_hue_class(&hue, MarkerClass::End, hp).best {
                log::info!(
                    "end marker at ({:.1}, {:.1}) in frame {}",
                    c.center.x,
                    c.center.y,
                    self.frames
                );
                self.end = Some(c.center);
                obs.end_found = Some(c.center);
            }
        }

        let selection = detect_hue_class(&hue, MarkerClass::Sequence, hp);
        obs.ignored = selection.rejected().iter().map(|c| c.center).collect();
        if let Some(c) = selection.best {
            if self.quota_full() || self.is_known(c.center) {
                obs.dismissed.push(c.center);
            } else {
                let index = self.sequence.len() as LedIndex + 1;
                self.tree.add(&[c.center.x, c.center.y], self.sequence.len() as u64);
                self.sequence.push(c.center);
                log::info!(
                    "sequence LED {} at ({:.1}, {:.1}) in frame {}",
                    index,
                    c.center.x,
                    c.center.y,
                    self.frames
                );
                if self.quota_full() {
                    log::info!("all {} expected sequence LEDs found", self.sequence.len());
                }
                obs.discovered = Some((index, c.center));
            }
        }
        obs
    }

    /// Within the same-position radius of a marker or a sequence LED.
    fn is_known(&self, p: Point2<f32>) -> bool {
        let r = self.params.same_position_radius;
        let near = |q: Point2<f32>| nalgebra::distance(&p, &q) < r;
        if self.start.is_some_and(near) || self.end.is_some_and(near) {
            return true;
        }
        if self.sequence.is_empty() {
            return false;
        }
        let nn = self.tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y]);
        nn.distance < r * r
    }

    /// Annotated view of an observation for debug displays.
    pub fn overlay(&self, obs: &Observation) -> OverlayEvent {
        let mut event = OverlayEvent {
            frame_number: self.frames,
            state: if self.is_done() { "complete" } else { "tracking" }.to_string(),
            current_index: Some(self.sequence.len() as LedIndex),
            brightness: None,
            marks: Vec::new(),
        };
        if let Some(p) = self.start {
            event.push(p, MarkKind::Baseline).label = Some(0);
        }
        if let Some(p) = self.end {
            event.push(p, MarkKind::Baseline);
        }
        for (i, p) in self.sequence.iter().enumerate() {
            if obs.discovered.is_some_and(|(_, q)| q == *p) {
                continue;
            }
            event.push(*p, MarkKind::Known).label = Some(i as LedIndex + 1);
        }
        if let Some((index, p)) = obs.discovered {
            event.push(p, MarkKind::New).label = Some(index);
        }
        for p in obs.dismissed.iter().chain(&obs.ignored) {
            event.push(*p, MarkKind::Rejected);
        }
        event
    }

    /// Assemble the index map. The end marker is assigned last.
    pub fn finish(self) -> TrackResult {
        let mut positions = PositionMap::new();
        if let Some(p) = self.start {
            positions.insert(0, p);
        }
        for (i, p) in self.sequence.iter().enumerate() {
            positions.insert(i as LedIndex + 1, *p);
        }
        let next = self.sequence.len() as LedIndex + 1;
        let end_index = self.end.map(|p| {
            let index = self.params.end_marker_index(next);
            if !positions.insert(index, p) {
                log::warn!("end marker index {index} already taken by a sequence LED");
            }
            log::info!("end marker assigned index {index}");
            index
        });
        TrackResult {
            complete: self.is_done(),
            sequence_found: self.sequence.len(),
            end_index,
            cancelled: false,
            frames: self.frames,
            positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledmap_core::RgbImage;

    const BLUE: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];

    fn frame(blobs: &[([u8; 3], f32, f32)]) -> RgbImage {
        let mut img = RgbImage::new(160, 100);
        for &(rgb, x, y) in blobs {
            img.fill_disk(x, y, 5.0, rgb);
        }
        img
    }

    #[test]
    fn nearby_repeat_is_not_a_new_led() {
        let mut t = SequenceTracker::new(TrackerParams::default()).expect("tracker");
        let a = t.observe(&frame(&[(GREEN, 50.0, 50.0)]).view());
        assert_eq!(a.discovered.map(|(i, _)| i), Some(1));
        let b = t.observe(&frame(&[(GREEN, 56.0, 52.0)]).view());
        assert!(b.discovered.is_none());
        assert_eq!(b.dismissed.len(), 1);
        let c = t.observe(&frame(&[(GREEN, 90.0, 50.0)]).view());
        assert_eq!(c.discovered.map(|(i, _)| i), Some(2));
    }

    #[test]
    fn sequence_blob_on_a_marker_is_suppressed() {
        let mut t = SequenceTracker::new(TrackerParams::default()).expect("tracker");
        t.observe(&frame(&[(BLUE, 30.0, 30.0)]).view());
        // A green reflection right next to the start marker.
        let obs = t.observe(&frame(&[(BLUE, 30.0, 30.0), (GREEN, 42.0, 30.0)]).view());
        assert!(obs.discovered.is_none());
        assert!(t.sequence().is_empty());
    }

    #[test]
    fn quota_stops_new_assignments() {
        let mut t = SequenceTracker::new(TrackerParams::with_expected_total(3)).expect("tracker");
        t.observe(&frame(&[(GREEN, 20.0, 20.0)]).view());
        let obs = t.observe(&frame(&[(GREEN, 120.0, 20.0)]).view());
        assert!(obs.discovered.is_none());
        assert_eq!(t.sequence().len(), 1);
        assert!(!t.is_done());
    }

    #[test]
    fn malformed_frame_is_counted_and_skipped() {
        let mut t = SequenceTracker::new(TrackerParams::default()).expect("tracker");
        let bad = RgbImage {
            width: 3,
            height: 3,
            data: vec![1; 4],
        };
        assert_eq!(t.observe(&bad.view()), Observation::default());
        assert_eq!(t.frames(), 1);
    }

    #[test]
    fn overlay_labels_markers_and_sequence() {
        let mut t = SequenceTracker::new(TrackerParams::default()).expect("tracker");
        t.observe(&frame(&[(BLUE, 20.0, 20.0), (GREEN, 60.0, 20.0)]).view());
        let obs = t.observe(&frame(&[(BLUE, 20.0, 20.0), (GREEN, 100.0, 20.0)]).view());
        let ev = t.overlay(&obs);
        assert_eq!(ev.count(MarkKind::Baseline), 1);
        assert_eq!(ev.count(MarkKind::Known), 1);
        assert_eq!(ev.count(MarkKind::New), 1);
        assert_eq!(ev.frame_number, 2);
    }
}
