//! Map individually addressable LEDs to positions in a camera image.
//!
//! Two calibration modes share one detection engine:
//!
//! - **active** ([`calibrate_active`]): light one LED at a time over an
//!   [`LedChannel`], difference each frame against a dark baseline and raise
//!   the brightness until several frames agree;
//! - **passive** ([`analyze_clip`]): replay a recording of the marker
//!   pattern ([`sequence::MarkerPlayback`]) and number LEDs in order of
//!   appearance.
//!
//! Both produce a [`CalibrationResult`]: raw pixel positions plus their
//! unit-square normalization (origin bottom-left). Indices without a
//! position are listed (`undetected`, `missing`) rather than guessed.
//!
//! ## Quickstart
//!
//! ```no_run
//! use ledmap::{analyze_clip, CancelToken, ImageSequence, NullSink, TrackerParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut frames = ImageSequence::from_dir("recording/")?;
//! let params = TrackerParams::with_expected_total(50);
//! let result = analyze_clip(&mut frames, params, &CancelToken::new(), &mut NullSink)?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `ledmap::core`: images, position maps, normalization, device traits.
//! - `ledmap::detect`: blob extraction, scoring, confirmation.
//! - `ledmap::probe`: the active brightness-stepping state machine.
//! - `ledmap::sequence`: the passive tracker and marker playback.
//! - `ledmap::frames` (feature `image`): `image` crate adapters.

pub use ledmap_core as core;
pub use ledmap_detect as detect;
pub use ledmap_probe as probe;
pub use ledmap_sequence as sequence;

pub use ledmap_core::{
    normalize, CancelToken, FrameClip, FrameSource, LedChannel, LedColor, LedCommand, LedIndex,
    NormalizedMap, NullSink, OverlayEvent, OverlaySink, PositionMap, RgbImage,
};
pub use ledmap_probe::{ActiveProber, ProbeParams, ProbeReport};
pub use ledmap_sequence::{ClipAnalyzer, MarkerPlayback, TrackResult, TrackerParams};

mod calibrate;
mod config;

pub use calibrate::{analyze_clip, calibrate_active, CalibrateError, CalibrationResult};
pub use config::{ConfigError, LedMapConfig};

#[cfg(feature = "image")]
pub mod frames;

#[cfg(feature = "image")]
pub use frames::ImageSequence;

/// Install a `tracing` subscriber and route `log` records into it.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    ledmap_core::init_tracing(json);
    // Already installed when tracing-subscriber carries its own log bridge.
    let _ = tracing_log::LogTracer::init();
}
