//! Core types for mapping addressable LEDs to camera-space positions.
//!
//! This crate holds what both calibration strategies share and nothing
//! detector-specific: image containers, the `index -> position` map and its
//! unit-square normalization, and the traits through which frames are pulled
//! and LEDs are commanded.

mod cancel;
mod device;
mod image;
mod logger;
mod normalize;
mod overlay;
mod position;

pub use cancel::CancelToken;
pub use device::{
    ChannelError, FrameClip, FrameError, FrameSource, LedChannel, LedColor, LedCommand,
    RecordingChannel,
};
pub use image::{abs_diff, GrayImage, GrayImageView, Hsv, HsvImage, RgbImage, RgbImageView};
pub use normalize::{normalize, NormalizedMap, RawBounds, NORMALIZE_EPS};
pub use overlay::{MarkKind, NullSink, OverlayEvent, OverlayMark, OverlaySink};
pub use position::{LedIndex, PositionEntry, PositionMap};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
