use std::time::Duration;

use ledmap_core::{CancelToken, FrameSource, LedChannel, LedIndex, OverlaySink, PositionMap};
use serde::Serialize;

use crate::error::ProbeError;
use crate::params::ProbeParams;
use crate::session::{ProbeEffect, ProbeSession};

/// Outcome of a probing run. Partial when the run was cut short.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProbeReport {
    pub positions: PositionMap,
    /// Indices that exhausted the brightness range, in probing order.
    pub undetected: Vec<LedIndex>,
    /// Every index was handled.
    pub completed: bool,
    pub cancelled: bool,
    /// Frames processed (failed reads excluded).
    pub frames: u64,
    pub failed_reads: u64,
}

/// Drives a [`ProbeSession`] from a frame source and an LED channel.
#[derive(Clone, Debug)]
pub struct ActiveProber {
    params: ProbeParams,
}

impl ActiveProber {
    pub fn new(params: ProbeParams) -> Result<Self, ProbeError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ProbeParams {
        &self.params
    }

    /// Run until every LED is handled, the source ends or `cancel` fires.
    ///
    /// Fails only if the channel is not ready; everything after the first
    /// frame degrades to skipped ticks and undetected indices.
    pub fn run<S, C, O>(
        &self,
        source: &mut S,
        channel: &mut C,
        cancel: &CancelToken,
        sink: &mut O,
    ) -> Result<ProbeReport, ProbeError>
    where
        S: FrameSource + ?Sized,
        C: LedChannel + ?Sized,
        O: OverlaySink + ?Sized,
    {
        channel.ensure_ready()?;
        let mut session = ProbeSession::new(self.params.clone())?;
        let delay = Duration::from_millis(self.params.tick_delay_ms);
        let mut report = ProbeReport::default();

        dispatch(channel, &session.start());
        loop {
            if cancel.is_cancelled() {
                log::info!("probing cancelled");
                report.cancelled = true;
                break;
            }
            let frame = match source.next_frame() {
                None => {
                    log::info!("frame source ended");
                    break;
                }
                Some(Err(e)) => {
                    log::warn!("skipping tick: {e}");
                    report.failed_reads += 1;
                    continue;
                }
                Some(Ok(frame)) => frame,
            };
            report.frames += 1;

            let tick = session.tick(&frame.view());
            dispatch(channel, &tick.effects);
            sink.emit(&session.overlay(report.frames, &tick));

            if session.is_complete() {
                break;
            }
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }

        report.completed = session.is_complete();
        if !report.completed {
            dispatch(channel, &session.stop());
        }
        report.positions = session.positions().clone();
        report.undetected = session.undetected().to_vec();
        Ok(report)
    }
}

fn dispatch<C: LedChannel + ?Sized>(channel: &mut C, effects: &[ProbeEffect]) {
    for effect in effects {
        if let ProbeEffect::Command(cmd) = effect {
            if let Err(e) = channel.send(*cmd) {
                log::warn!("LED command {cmd:?} failed: {e}");
            }
        }
    }
}
