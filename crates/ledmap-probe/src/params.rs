use ledmap_detect::{ConfirmParams, DifferentialParams};
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Configuration of the active brightness prober.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeParams {
    /// Number of LEDs on the strip; indices `0..total_leds` are probed.
    pub total_leds: u32,
    /// First brightness tried for every LED.
    pub brightness_floor: u32,
    /// Last brightness tried before the LED is declared undetected.
    pub brightness_ceiling: u32,
    pub brightness_step: u32,
    /// Frames discarded after each LED command (and before the baseline)
    /// so exposure and the command round trip can settle.
    pub settle_frames: u32,
    /// Frames sampled per brightness attempt.
    pub confirm_frames: u32,
    /// Wall-clock pause between ticks of the driver loop.
    pub tick_delay_ms: u64,
    pub detection: DifferentialParams,
    pub confirm: ConfirmParams,
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self {
            total_leds: 50,
            brightness_floor: 1,
            brightness_ceiling: 100,
            brightness_step: 1,
            settle_frames: 6,
            confirm_frames: 3,
            tick_delay_ms: 33,
            detection: DifferentialParams::default(),
            confirm: ConfirmParams::default(),
        }
    }
}

impl ProbeParams {
    pub fn for_leds(total_leds: u32) -> Self {
        Self {
            total_leds,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        let fail = |msg: String| Err(ProbeError::InvalidParams(msg));
        if self.total_leds == 0 {
            return fail("total_leds must be positive".into());
        }
        if self.brightness_floor > self.brightness_ceiling {
            return fail(format!(
                "brightness_floor {} exceeds brightness_ceiling {}",
                self.brightness_floor, self.brightness_ceiling
            ));
        }
        if self.brightness_step == 0 {
            return fail("brightness_step must be positive".into());
        }
        if (self.confirm_frames as usize) < self.confirm.min_samples.max(2) {
            return fail(format!(
                "confirm_frames {} cannot yield {} samples",
                self.confirm_frames,
                self.confirm.min_samples.max(2)
            ));
        }
        Ok(())
    }

    /// Upper bound on brightness attempts per LED.
    pub fn attempts_per_led(&self) -> u32 {
        (self.brightness_ceiling - self.brightness_floor.min(self.brightness_ceiling))
            / self.brightness_step.max(1)
            + 1
    }
}
