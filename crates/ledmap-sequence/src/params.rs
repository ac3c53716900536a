use ledmap_core::LedIndex;
use ledmap_detect::HueParams;
use serde::{Deserialize, Serialize};

use crate::error::TrackError;

/// How the end marker's index is chosen once the clip is done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndIndexPolicy {
    /// `ExpectedTotal` when a total is configured, else `AfterLastSequence`.
    #[default]
    Auto,
    /// One past the highest sequence index found.
    AfterLastSequence,
    /// `expected_total - 1`.
    ExpectedTotal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// LEDs on the strip including both markers. `None` scans the whole clip.
    pub expected_total: Option<u32>,
    /// Detections closer than this (pixels) to a known position are the
    /// same LED.
    pub same_position_radius: f32,
    pub end_index: EndIndexPolicy,
    pub hue: HueParams,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            expected_total: None,
            same_position_radius: 15.0,
            end_index: EndIndexPolicy::Auto,
            hue: HueParams::default(),
        }
    }
}

impl TrackerParams {
    pub fn with_expected_total(total: u32) -> Self {
        Self {
            expected_total: Some(total),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        if let Some(total) = self.expected_total {
            if total < 2 {
                return Err(TrackError::InvalidParams(format!(
                    "expected_total {total} leaves no room for start and end markers"
                )));
            }
        }
        if !self.same_position_radius.is_finite() || self.same_position_radius < 0.0 {
            return Err(TrackError::InvalidParams(format!(
                "same_position_radius must be a finite non-negative distance, got {}",
                self.same_position_radius
            )));
        }
        Ok(())
    }

    /// Sequence positions needed before the run can stop early.
    pub fn sequence_quota(&self) -> Option<usize> {
        self.expected_total.map(|n| n.saturating_sub(2) as usize)
    }

    /// Index assigned to the end marker given the next free sequence index.
    pub fn end_marker_index(&self, next_sequence_index: LedIndex) -> LedIndex {
        match (self.end_index, self.expected_total) {
            (EndIndexPolicy::Auto | EndIndexPolicy::ExpectedTotal, Some(total)) => total - 1,
            _ => next_sequence_index,
        }
    }
}
