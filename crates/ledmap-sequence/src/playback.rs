//! The marker pattern recorded for sequence tracking, as a lazy sequence of
//! blink steps.
//!
//! The start marker blinks at index 0, each sequence LED blinks once in
//! index order, and the end marker blinks at the last index. Only one LED is
//! lit at any time.

use std::time::Duration;

use ledmap_core::{CancelToken, ChannelError, LedChannel, LedColor, LedIndex};
use ledmap_detect::MarkerClass;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackParams {
    /// Full on+off period of one blink.
    pub blink_ms: u64,
    /// Blinks shown for each marker.
    pub marker_blinks: u32,
    pub start_color: [u8; 3],
    pub sequence_color: [u8; 3],
    pub end_color: [u8; 3],
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            blink_ms: 500,
            marker_blinks: 3,
            start_color: [0, 0, 255],
            sequence_color: [0, 255, 0],
            end_color: [255, 0, 0],
        }
    }
}

impl PlaybackParams {
    pub fn color(&self, class: MarkerClass) -> [u8; 3] {
        match class {
            MarkerClass::Start => self.start_color,
            MarkerClass::Sequence => self.sequence_color,
            MarkerClass::End => self.end_color,
        }
    }
}

/// Light `index` in `color` for `on`, then everything off for `off`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackStep {
    pub index: LedIndex,
    pub class: MarkerClass,
    pub color: [u8; 3],
    pub on: Duration,
    pub off: Duration,
    /// Final blink of this index.
    pub last_blink: bool,
}

/// Emitted once per index after its last blink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LedLitEvent {
    pub index: LedIndex,
    pub class: MarkerClass,
}

/// Iterator over the steps of the marker pattern for `total` LEDs.
#[derive(Clone, Debug)]
pub struct MarkerPlayback {
    params: PlaybackParams,
    total: u32,
    cursor: u64,
}

impl MarkerPlayback {
    pub fn new(total: u32, params: PlaybackParams) -> Self {
        Self {
            params,
            total,
            cursor: 0,
        }
    }

    fn blinks(&self) -> u64 {
        self.params.marker_blinks.max(1) as u64
    }

    /// Total number of steps.
    pub fn step_count(&self) -> u64 {
        match self.total {
            0 => 0,
            1 => self.blinks(),
            n => 2 * self.blinks() + (n as u64 - 2),
        }
    }

    fn step_at(&self, k: u64) -> Option<PlaybackStep> {
        if k >= self.step_count() {
            return None;
        }
        let blinks = self.blinks();
        let sequence = self.total.saturating_sub(2) as u64;
        let (index, class, last_blink) = if k < blinks {
            (0, MarkerClass::Start, k + 1 == blinks)
        } else if k < blinks + sequence {
            ((k - blinks + 1) as LedIndex, MarkerClass::Sequence, true)
        } else {
            let b = k - blinks - sequence;
            (self.total - 1, MarkerClass::End, b + 1 == blinks)
        };
        let half = Duration::from_millis(self.params.blink_ms / 2);
        Some(PlaybackStep {
            index,
            class,
            color: self.params.color(class),
            on: half,
            off: half,
            last_blink,
        })
    }
}

impl Iterator for MarkerPlayback {
    type Item = PlaybackStep;

    fn next(&mut self) -> Option<PlaybackStep> {
        let step = self.step_at(self.cursor)?;
        self.cursor += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.step_count().saturating_sub(self.cursor) as usize;
        (left, Some(left))
    }
}

/// Play the pattern on `channel`, sleeping between transitions.
///
/// Cancellation is checked before every step; the strip is cleared on the
/// way out either way. Returns the number of indices fully shown.
pub fn play<C, F>(
    playback: MarkerPlayback,
    channel: &mut C,
    cancel: &CancelToken,
    mut on_lit: F,
) -> Result<usize, ChannelError>
where
    C: LedChannel + ?Sized,
    F: FnMut(LedLitEvent),
{
    channel.ensure_ready()?;
    log::info!("playing marker sequence over {} LEDs", playback.total);
    let mut shown = 0;
    for step in playback {
        if cancel.is_cancelled() {
            log::info!("marker playback cancelled after {shown} LEDs");
            break;
        }
        channel.set_single(step.index, LedColor::Rgb(step.color))?;
        sleep(step.on);
        channel.clear()?;
        sleep(step.off);
        if step.last_blink {
            shown += 1;
            on_lit(LedLitEvent {
                index: step.index,
                class: step.class,
            });
        }
    }
    channel.clear()?;
    log::info!("marker playback finished, {shown} LEDs shown");
    Ok(shown)
}

fn sleep(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}
