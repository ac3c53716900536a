//! Interfaces to the outside world: where frames come from and how single
//! LEDs are commanded.

use serde::{Deserialize, Serialize};

use crate::image::RgbImage;
use crate::position::LedIndex;

/// Transient failure while pulling a frame. The caller skips the tick.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("frame read failed: {0}")]
    Read(String),
    #[error("empty frame")]
    Empty,
}

/// Synchronous pull source of fixed-size RGB frames.
///
/// `None` means end of stream. `Some(Err(_))` is a transient failure and the
/// next call may succeed.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Result<RgbImage, FrameError>>;

    /// Total number of frames if the source is finite and knows it.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// A finite, replayable frame sequence held in memory.
#[derive(Clone, Debug, Default)]
pub struct FrameClip {
    frames: Vec<RgbImage>,
    cursor: usize,
}

impl FrameClip {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Rewind to the first frame.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl FrameSource for FrameClip {
    fn next_frame(&mut self) -> Option<Result<RgbImage, FrameError>> {
        let frame = self.frames.get(self.cursor)?.clone();
        self.cursor += 1;
        if frame.data.is_empty() {
            return Some(Err(FrameError::Empty));
        }
        Some(Ok(frame))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}

/// Color requested for a single LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedColor {
    /// Gray level on the prober's brightness scale.
    Level(u32),
    Rgb([u8; 3]),
}

impl LedColor {
    pub const BLUE: LedColor = LedColor::Rgb([0, 0, 255]);
    pub const GREEN: LedColor = LedColor::Rgb([0, 255, 0]);
    pub const RED: LedColor = LedColor::Rgb([255, 0, 0]);

    /// Resolve to an RGB triple; levels scale by `level_gain` and saturate.
    pub fn to_rgb(self, level_gain: u32) -> [u8; 3] {
        match self {
            LedColor::Level(level) => {
                let v = level.saturating_mul(level_gain).min(255) as u8;
                [v, v, v]
            }
            LedColor::Rgb(rgb) => rgb,
        }
    }
}

/// One command for the LED channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LedCommand {
    /// Light only `index`, everything else off.
    SetSingle { index: LedIndex, color: LedColor },
    SetAll { color: [u8; 3] },
    Clear,
}

/// Errors raised by an LED channel.
#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("LED channel unavailable: {0}")]
    Unavailable(String),
    #[error("LED command rejected: {0}")]
    Rejected(String),
}

/// Fire-and-forget channel to the LED controller.
///
/// Implementations may be asynchronous underneath; callers never assume the
/// world changed before their own settle delay has elapsed.
pub trait LedChannel {
    /// Checked once before a session processes any frame.
    fn ensure_ready(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }

    fn set_single(&mut self, index: LedIndex, color: LedColor) -> Result<(), ChannelError>;

    fn set_all(&mut self, color: [u8; 3]) -> Result<(), ChannelError>;

    fn clear(&mut self) -> Result<(), ChannelError>;

    fn send(&mut self, command: LedCommand) -> Result<(), ChannelError> {
        match command {
            LedCommand::SetSingle { index, color } => self.set_single(index, color),
            LedCommand::SetAll { color } => self.set_all(color),
            LedCommand::Clear => self.clear(),
        }
    }
}

/// Channel that records every command; useful for dry runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingChannel {
    pub commands: Vec<LedCommand>,
}

impl LedChannel for RecordingChannel {
    fn set_single(&mut self, index: LedIndex, color: LedColor) -> Result<(), ChannelError> {
        self.commands.push(LedCommand::SetSingle { index, color });
        Ok(())
    }

    fn set_all(&mut self, color: [u8; 3]) -> Result<(), ChannelError> {
        self.commands.push(LedCommand::SetAll { color });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ChannelError> {
        self.commands.push(LedCommand::Clear);
        Ok(())
    }
}
