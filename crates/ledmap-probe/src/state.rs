use ledmap_core::LedIndex;
use nalgebra::Point2;
use serde::Serialize;

/// Phase of the per-LED calibration cycle.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ProbeState {
    /// Not started, or stopped.
    #[default]
    Idle,
    /// Discarding settle frames with the LED under test off, then storing
    /// the baseline.
    CapturingBaseline { skipped: u32 },
    /// LED commanded; discarding settle frames.
    WaitingForLight { skipped: u32 },
    /// Sampling detections for the current brightness.
    Confirming {
        frames: u32,
        samples: Vec<Point2<f32>>,
    },
    /// Every index has been accepted or declared undetected.
    Complete,
}

impl ProbeState {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeState::Idle => "idle",
            ProbeState::CapturingBaseline { .. } => "capturing_baseline",
            ProbeState::WaitingForLight { .. } => "waiting_for_light",
            ProbeState::Confirming { .. } => "confirming",
            ProbeState::Complete => "complete",
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, ProbeState::Idle | ProbeState::Complete)
    }
}

/// Read-only view of a session for display surfaces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbeSnapshot {
    pub state: &'static str,
    pub current_index: LedIndex,
    pub brightness: u32,
    pub detected: usize,
    pub undetected: usize,
    pub total_leds: u32,
}
