//! The active calibration state machine.
//!
//! [`ProbeSession`] consumes one frame per [`tick`](ProbeSession::tick) and
//! answers with the LED commands to send; it never talks to the channel
//! itself. That keeps every transition a plain function of
//! `(state, frame)` and lets the driver decide how commands reach the
//! hardware.

use ledmap_core::{
    GrayImage, LedColor, LedCommand, LedIndex, MarkKind, OverlayEvent, PositionMap, RgbImageView,
};
use ledmap_detect::{confirm, detect_differential, Confirmation, Inconclusive, Selection};
use nalgebra::Point2;

use crate::error::ProbeError;
use crate::params::ProbeParams;
use crate::state::{ProbeSnapshot, ProbeState};

/// Something the driver has to act on or report.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeEffect {
    /// Forward to the LED channel.
    Command(LedCommand),
    Accepted {
        index: LedIndex,
        position: Point2<f32>,
        brightness: u32,
    },
    /// Brightness ceiling reached without a confirmed position.
    Undetected { index: LedIndex },
    /// Last index handled.
    Finished,
}

/// Result of one tick.
#[derive(Clone, Debug, Default)]
pub struct ProbeTick {
    pub effects: Vec<ProbeEffect>,
    /// Detection run on this frame, when the session was confirming.
    pub detection: Option<Selection>,
}

#[derive(Clone, Debug)]
pub struct ProbeSession {
    params: ProbeParams,
    state: ProbeState,
    index: LedIndex,
    brightness: u32,
    baseline: Option<GrayImage>,
    positions: PositionMap,
    undetected: Vec<LedIndex>,
}

impl ProbeSession {
    pub fn new(params: ProbeParams) -> Result<Self, ProbeError> {
        params.validate()?;
        let brightness = params.brightness_floor;
        Ok(Self {
            params,
            state: ProbeState::Idle,
            index: 0,
            brightness,
            baseline: None,
            positions: PositionMap::new(),
            undetected: Vec::new(),
        })
    }

    pub fn params(&self) -> &ProbeParams {
        &self.params
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn current_index(&self) -> LedIndex {
        self.index
    }

    pub fn brightness(&self) -> u32 {
        self.brightness
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn undetected(&self) -> &[LedIndex] {
        &self.undetected
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_complete(&self) -> bool {
        self.state == ProbeState::Complete
    }

    /// Begin a fresh run at index 0. Previous results are discarded.
    pub fn start(&mut self) -> Vec<ProbeEffect> {
        self.reset();
        log::info!(
            "probing {} LEDs, brightness {}..={} step {}",
            self.params.total_leds,
            self.params.brightness_floor,
            self.params.brightness_ceiling,
            self.params.brightness_step
        );
        self.state = ProbeState::CapturingBaseline { skipped: 0 };
        vec![ProbeEffect::Command(LedCommand::Clear)]
    }

    /// Halt the run. Accepted positions are kept.
    pub fn stop(&mut self) -> Vec<ProbeEffect> {
        if self.state.is_running() {
            log::info!(
                "probing stopped at index {} ({} detected)",
                self.index,
                self.positions.len()
            );
        }
        self.state = ProbeState::Idle;
        self.baseline = None;
        vec![ProbeEffect::Command(LedCommand::Clear)]
    }

    /// Back to a pristine idle session.
    pub fn reset(&mut self) {
        self.state = ProbeState::Idle;
        self.index = 0;
        self.brightness = self.params.brightness_floor;
        self.baseline = None;
        self.positions.clear();
        self.undetected.clear();
    }

    pub fn snapshot(&self) -> ProbeSnapshot {
        ProbeSnapshot {
            state: self.state.label(),
            current_index: self.index,
            brightness: self.brightness,
            detected: self.positions.len(),
            undetected: self.undetected.len(),
            total_leds: self.params.total_leds,
        }
    }

    /// Advance the state machine by one frame.
    ///
    /// Malformed frames leave the state untouched.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "trace",
            skip(self, frame),
            fields(state = self.state.label(), index = self.index, brightness = self.brightness)
        )
    )]
    pub fn tick(&mut self, frame: &RgbImageView<'_>) -> ProbeTick {
        let mut tick = ProbeTick::default();
        if !self.state.is_running() || !frame.is_consistent() || frame.data.is_empty() {
            return tick;
        }
        let settle = self.params.settle_frames;

        match &mut self.state {
            ProbeState::Idle | ProbeState::Complete => {}
            ProbeState::CapturingBaseline { skipped } => {
                if *skipped < settle {
                    *skipped += 1;
                } else {
                    self.baseline = Some(frame.to_gray());
                    log::debug!("baseline captured for LED {}", self.index);
                    tick.effects.push(self.light_command());
                    self.state = ProbeState::WaitingForLight { skipped: 0 };
                }
            }
            ProbeState::WaitingForLight { skipped } => {
                if *skipped < settle {
                    *skipped += 1;
                } else {
                    self.state = ProbeState::Confirming {
                        frames: 0,
                        samples: Vec::new(),
                    };
                    self.sample(frame, &mut tick);
                }
            }
            ProbeState::Confirming { .. } => self.sample(frame, &mut tick),
        }
        tick
    }

    /// Annotated view of a tick for debug displays.
    pub fn overlay(&self, frame_number: u64, tick: &ProbeTick) -> OverlayEvent {
        let mut event = OverlayEvent {
            frame_number,
            state: self.state.label().to_string(),
            current_index: self.state.is_running().then_some(self.index),
            brightness: self.state.is_running().then_some(self.brightness),
            marks: Vec::new(),
        };
        for e in self.positions.iter() {
            event.push(e.position, MarkKind::Known).label = Some(e.index);
        }
        if let Some(sel) = &tick.detection {
            if let Some(best) = &sel.best {
                let m = event.push(best.center, MarkKind::New);
                m.score = Some(best.score);
            }
            for c in sel.rejected() {
                event.push(c.center, MarkKind::Rejected).score = Some(c.score);
            }
        }
        event
    }

    fn light_command(&self) -> ProbeEffect {
        ProbeEffect::Command(LedCommand::SetSingle {
            index: self.index,
            color: LedColor::Level(self.brightness),
        })
    }

    fn sample(&mut self, frame: &RgbImageView<'_>, tick: &mut ProbeTick) {
        let selection = match &self.baseline {
            Some(baseline) => {
                let gray = frame.to_gray();
                detect_differential(&gray.view(), &baseline.view(), &self.params.detection)
            }
            None => Selection::default(),
        };

        let ProbeState::Confirming { frames, samples } = &mut self.state else {
            return;
        };
        if let Some(best) = &selection.best {
            samples.push(best.center);
        }
        *frames += 1;
        if *frames < self.params.confirm_frames {
            tick.detection = Some(selection);
            return;
        }
        let collected = std::mem::take(samples);
        tick.detection = Some(selection);
        self.decide(&collected, tick);
    }

    fn decide(&mut self, samples: &[Point2<f32>], tick: &mut ProbeTick) {
        match confirm(samples, &self.params.confirm) {
            Confirmation::Accepted { position, spread } => {
                log::info!(
                    "LED {} at ({:.1}, {:.1}), brightness {}, spread {:.2}",
                    self.index,
                    position.x,
                    position.y,
                    self.brightness,
                    spread
                );
                self.positions.insert(self.index, position);
                tick.effects.push(ProbeEffect::Accepted {
                    index: self.index,
                    position,
                    brightness: self.brightness,
                });
                self.advance(tick);
            }
            Confirmation::Inconclusive(reason) => {
                match reason {
                    Inconclusive::TooFewSamples { got, needed } => log::debug!(
                        "LED {} not seen at brightness {} ({got}/{needed} samples)",
                        self.index,
                        self.brightness
                    ),
                    Inconclusive::Scattered { spread, limit } => log::debug!(
                        "LED {} detections scattered at brightness {} ({spread:.1} > {limit:.1})",
                        self.index,
                        self.brightness
                    ),
                }
                let next = self.brightness.saturating_add(self.params.brightness_step);
                if next > self.params.brightness_ceiling {
                    log::warn!(
                        "LED {} undetected up to brightness {}",
                        self.index,
                        self.params.brightness_ceiling
                    );
                    self.undetected.push(self.index);
                    tick.effects.push(ProbeEffect::Undetected { index: self.index });
                    self.advance(tick);
                } else {
                    self.brightness = next;
                    log::debug!("LED {} retry at brightness {}", self.index, next);
                    tick.effects.push(self.light_command());
                    self.state = ProbeState::WaitingForLight { skipped: 0 };
                }
            }
        }
    }

    fn advance(&mut self, tick: &mut ProbeTick) {
        self.index += 1;
        self.brightness = self.params.brightness_floor;
        self.baseline = None;
        tick.effects.push(ProbeEffect::Command(LedCommand::Clear));
        if self.index >= self.params.total_leds {
            log::info!(
                "probing complete: {}/{} detected, {} undetected",
                self.positions.len(),
                self.params.total_leds,
                self.undetected.len()
            );
            self.state = ProbeState::Complete;
            tick.effects.push(ProbeEffect::Finished);
        } else {
            self.state = ProbeState::CapturingBaseline { skipped: 0 };
        }
    }
}
