//! Passive LED calibration from a recorded marker-sequence clip.
//!
//! The strip plays a fixed pattern ([`MarkerPlayback`]): a start marker at
//! index 0, the sequence color stepping through `1..n-1`, an end marker at
//! `n-1`. [`ClipAnalyzer`] replays the recording through a
//! [`SequenceTracker`] and assigns indices in order of appearance.

mod clip;
mod error;
mod params;
mod playback;
mod tracker;

pub use clip::ClipAnalyzer;
pub use error::TrackError;
pub use params::{EndIndexPolicy, TrackerParams};
pub use playback::{play, LedLitEvent, MarkerPlayback, PlaybackParams, PlaybackStep};
pub use tracker::{Observation, SequenceTracker, TrackResult};
