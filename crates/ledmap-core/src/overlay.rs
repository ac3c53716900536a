//! Per-frame annotation events for optional debug displays.
//!
//! The detection code only *emits* these; drawing them on a frame, showing
//! them on screen or encoding them into a video is up to the consumer.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::position::LedIndex;

/// How a point should be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    /// Reference marker (start / end) or the baseline-era detection.
    Baseline,
    /// Selected in this frame.
    New,
    /// Accepted earlier in the run.
    Known,
    /// Seen but discarded (duplicate, low score, oversized).
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayMark {
    pub position: Point2<f32>,
    pub kind: MarkKind,
    pub label: Option<LedIndex>,
    pub score: Option<f32>,
}

/// Snapshot of one processed frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OverlayEvent {
    pub frame_number: u64,
    pub state: String,
    pub current_index: Option<LedIndex>,
    pub brightness: Option<u32>,
    pub marks: Vec<OverlayMark>,
}

impl OverlayEvent {
    pub fn push(&mut self, position: Point2<f32>, kind: MarkKind) -> &mut OverlayMark {
        self.marks.push(OverlayMark {
            position,
            kind,
            label: None,
            score: None,
        });
        let last = self.marks.len() - 1;
        &mut self.marks[last]
    }

    pub fn count(&self, kind: MarkKind) -> usize {
        self.marks.iter().filter(|m| m.kind == kind).count()
    }
}

/// Consumer of overlay events.
pub trait OverlaySink {
    fn emit(&mut self, event: &OverlayEvent);
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OverlaySink for NullSink {
    fn emit(&mut self, _event: &OverlayEvent) {}
}

impl<F: FnMut(&OverlayEvent)> OverlaySink for F {
    fn emit(&mut self, event: &OverlayEvent) {
        self(event)
    }
}
