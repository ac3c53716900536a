use ledmap_core::{CancelToken, FrameSource, OverlaySink};

use crate::error::TrackError;
use crate::params::TrackerParams;
use crate::tracker::{SequenceTracker, TrackResult};

/// Runs a [`SequenceTracker`] over a recorded clip.
#[derive(Clone, Debug)]
pub struct ClipAnalyzer {
    params: TrackerParams,
}

impl ClipAnalyzer {
    pub fn new(params: TrackerParams) -> Result<Self, TrackError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Track until the expected total is reached, the clip ends or `cancel`
    /// fires. Without an expected total the whole clip is scanned.
    pub fn run<S, O>(
        &self,
        source: &mut S,
        cancel: &CancelToken,
        sink: &mut O,
    ) -> Result<TrackResult, TrackError>
    where
        S: FrameSource + ?Sized,
        O: OverlaySink + ?Sized,
    {
        let mut tracker = SequenceTracker::new(self.params.clone())?;
        let total_frames = source.len_hint();
        match (total_frames, self.params.expected_total) {
            (Some(n), Some(e)) => log::info!("analysing {n} frames, expecting {e} LEDs"),
            (Some(n), None) => log::info!("analysing {n} frames, scanning the whole clip"),
            (None, Some(e)) => log::info!("analysing clip, expecting {e} LEDs"),
            (None, None) => log::info!("analysing clip, scanning until it ends"),
        }

        let mut last_progress = 0u64;
        let mut cancelled = false;
        loop {
            if cancel.is_cancelled() {
                log::info!("clip analysis cancelled");
                cancelled = true;
                break;
            }
            let frame = match source.next_frame() {
                None => break,
                Some(Err(e)) => {
                    log::warn!("skipping frame: {e}");
                    continue;
                }
                Some(Ok(frame)) => frame,
            };
            let obs = tracker.observe(&frame.view());
            sink.emit(&tracker.overlay(&obs));

            if let Some(n) = total_frames.filter(|&n| n > 0) {
                let progress = tracker.frames() * 100 / n as u64;
                if progress >= last_progress + 10 {
                    log::info!(
                        "progress {progress}% (frame {}/{n}), {} LEDs so far",
                        tracker.frames(),
                        tracker.found()
                    );
                    last_progress = progress;
                }
            }
            if tracker.is_done() {
                break;
            }
        }

        let mut result = tracker.finish();
        result.cancelled = cancelled;
        log::info!(
            "analysis complete: {} LEDs ({} sequence) in {} frames",
            result.positions.len(),
            result.sequence_found,
            result.frames
        );
        if let Some(expected) = self.params.expected_total {
            if result.positions.len() != expected as usize {
                log::warn!(
                    "expected {expected} LEDs but found {}",
                    result.positions.len()
                );
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ledmap_core::{FrameClip, NullSink, OverlayEvent, RgbImage};

    const BLUE: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];
    const RED: [u8; 3] = [255, 0, 0];

    const A: (f32, f32) = (20.0, 60.0);
    const B: (f32, f32) = (60.0, 40.0);
    const C: (f32, f32) = (100.0, 30.0);
    const D: (f32, f32) = (140.0, 20.0);

    fn frame(blobs: &[([u8; 3], (f32, f32))]) -> RgbImage {
        let mut img = RgbImage::new(160, 90);
        for &(rgb, (x, y)) in blobs {
            img.fill_disk(x, y, 5.0, rgb);
        }
        img
    }

    fn scripted(fifth: RgbImage) -> FrameClip {
        FrameClip::new(vec![
            frame(&[(BLUE, A)]),
            frame(&[(BLUE, A), (GREEN, B)]),
            frame(&[(BLUE, A), (GREEN, C)]),
            frame(&[(BLUE, A), (RED, D)]),
            fifth,
        ])
    }

    fn assert_at(result: &TrackResult, index: u32, (x, y): (f32, f32)) {
        let p = result.positions.get(index).expect("index present");
        assert_abs_diff_eq!(p.x, x, epsilon = 0.5);
        assert_abs_diff_eq!(p.y, y, epsilon = 0.5);
    }

    #[test]
    fn scripted_clip_yields_ordered_indices() {
        for fifth in [
            RgbImage::new(160, 90),
            frame(&[(GREEN, (80.0, 75.0)), (RED, (10.0, 10.0))]),
        ] {
            let mut clip = scripted(fifth);
            let result = ClipAnalyzer::new(TrackerParams::with_expected_total(4))
                .expect("params")
                .run(&mut clip, &CancelToken::new(), &mut NullSink)
                .expect("run");
            assert!(result.complete);
            assert_eq!(result.frames, 4);
            assert_eq!(result.positions.len(), 4);
            assert_at(&result, 0, A);
            assert_at(&result, 1, B);
            assert_at(&result, 2, C);
            assert_at(&result, 3, D);
            assert_eq!(result.end_index, Some(3));
        }
    }

    #[test]
    fn auto_mode_scans_whole_clip() {
        let mut clip = scripted(frame(&[(GREEN, (80.0, 75.0))]));
        let result = ClipAnalyzer::new(TrackerParams::default())
            .expect("params")
            .run(&mut clip, &CancelToken::new(), &mut NullSink)
            .expect("run");
        assert_eq!(result.frames, 5);
        assert!(!result.complete);
        assert_eq!(result.sequence_found, 3);
        assert_eq!(result.end_index, Some(4));
        assert_at(&result, 3, (80.0, 75.0));
        assert_at(&result, 4, D);
    }

    #[test]
    fn short_clip_reports_what_it_found() {
        let mut clip = FrameClip::new(vec![
            frame(&[(BLUE, A)]),
            frame(&[(BLUE, A), (GREEN, B)]),
        ]);
        let result = ClipAnalyzer::new(TrackerParams::with_expected_total(10))
            .expect("params")
            .run(&mut clip, &CancelToken::new(), &mut NullSink)
            .expect("run");
        assert!(!result.complete);
        assert_eq!(result.positions.len(), 2);
        assert!(result.end_index.is_none());
        assert!(result.positions.get(9).is_none());
    }

    #[test]
    fn overlay_sees_every_frame_until_cancelled() {
        let mut clip = scripted(RgbImage::new(160, 90));
        let cancel = CancelToken::new();
        let stop = cancel.clone();
        let mut frames = Vec::new();
        let mut sink = |ev: &OverlayEvent| {
            frames.push(ev.frame_number);
            if ev.frame_number == 2 {
                stop.cancel();
            }
        };
        let result = ClipAnalyzer::new(TrackerParams::default())
            .expect("params")
            .run(&mut clip, &cancel, &mut sink)
            .expect("run");
        assert_eq!(frames, vec![1, 2]);
        assert_eq!(result.frames, 2);
        assert_eq!(result.sequence_found, 1);
        assert!(result.cancelled);
    }
}
