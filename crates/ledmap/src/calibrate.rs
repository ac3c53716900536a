//! End-to-end helpers that turn a run into raw + normalized maps.

use std::fs;
use std::path::Path;

use ledmap_core::{
    normalize, CancelToken, FrameSource, LedChannel, LedIndex, NormalizedMap, OverlaySink,
    PositionMap,
};
use ledmap_probe::{ActiveProber, ProbeError, ProbeParams};
use ledmap_sequence::{ClipAnalyzer, TrackError, TrackerParams};
use nalgebra::Point2;
use serde::Serialize;

use crate::config::ConfigError;

#[derive(thiserror::Error, Debug)]
pub enum CalibrateError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Raw and normalized positions of one calibration run.
///
/// `undetected` holds the indices that were looked for and not found: the
/// brightness ceiling was reached (active) or a fully scanned clip never
/// showed them (passive). `missing` is every index in `0..total_leds`
/// without a position, including ones a cut-short run never reached.
#[derive(Clone, Debug, Serialize)]
pub struct CalibrationResult {
    pub total_leds: u32,
    pub raw: PositionMap,
    pub normalized: NormalizedMap,
    pub undetected: Vec<LedIndex>,
    pub missing: Vec<LedIndex>,
    /// The run handled every index (active) or reached the expected total
    /// (passive).
    pub complete: bool,
}

impl CalibrationResult {
    pub fn new(
        raw: PositionMap,
        total_leds: u32,
        undetected: Vec<LedIndex>,
        complete: bool,
    ) -> Self {
        let normalized = normalize(&raw);
        let missing: Vec<LedIndex> = (0..total_leds).filter(|&i| !raw.contains(i)).collect();
        if !undetected.is_empty() {
            log::warn!(
                "{} of {total_leds} LEDs undetected: {undetected:?}",
                undetected.len()
            );
        }
        if missing.len() > undetected.len() {
            log::info!("{} LEDs have no position", missing.len());
        }
        Self {
            total_leds,
            raw,
            normalized,
            undetected,
            missing,
            complete,
        }
    }

    /// Normalized position per index; `None` marks an undetected LED.
    pub fn slots(&self) -> Vec<Option<Point2<f32>>> {
        self.normalized.slots(self.total_leds)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Run the active prober and normalize what it found.
pub fn calibrate_active<S, C, O>(
    source: &mut S,
    channel: &mut C,
    params: ProbeParams,
    cancel: &CancelToken,
    sink: &mut O,
) -> Result<CalibrationResult, CalibrateError>
where
    S: FrameSource + ?Sized,
    C: LedChannel + ?Sized,
    O: OverlaySink + ?Sized,
{
    let total = params.total_leds;
    let report = ActiveProber::new(params)?.run(source, channel, cancel, sink)?;
    Ok(CalibrationResult::new(
        report.positions,
        total,
        report.undetected,
        report.completed,
    ))
}

/// Track a recorded marker-sequence clip and normalize what it found.
///
/// Without an expected total, `total_leds` is one past the highest index
/// found.
pub fn analyze_clip<S, O>(
    source: &mut S,
    params: TrackerParams,
    cancel: &CancelToken,
    sink: &mut O,
) -> Result<CalibrationResult, CalibrateError>
where
    S: FrameSource + ?Sized,
    O: OverlaySink + ?Sized,
{
    let expected = params.expected_total;
    let result = ClipAnalyzer::new(params)?.run(source, cancel, sink)?;
    let total = expected.unwrap_or_else(|| result.positions.max_index().map_or(0, |m| m + 1));
    // Nothing is ruled out until the clip has been scanned to its end.
    let undetected = if result.cancelled {
        Vec::new()
    } else {
        (0..total).filter(|&i| !result.positions.contains(i)).collect()
    };
    Ok(CalibrationResult::new(
        result.positions,
        total,
        undetected,
        result.complete,
    ))
}
