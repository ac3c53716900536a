#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ledmap::core::{ChannelError, FrameError, RgbImage};
use ledmap::{FrameSource, LedChannel, LedColor, LedIndex};

pub const WIDTH: usize = 160;
pub const HEIGHT: usize = 90;
pub const LED_RADIUS: f32 = 5.0;

/// Gray gain applied to brightness levels when rendering.
pub const LEVEL_GAIN: u32 = 60;

/// A strip of LEDs in front of a static camera.
#[derive(Debug)]
pub struct Scene {
    pub leds: Vec<(f32, f32)>,
    /// LEDs the camera cannot see.
    pub hidden: Vec<LedIndex>,
    pub lit: Option<(LedIndex, LedColor)>,
    /// One frame per command when recording.
    pub recorded: Vec<RgbImage>,
    pub record: bool,
}

impl Scene {
    pub fn new(leds: Vec<(f32, f32)>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            leds,
            hidden: Vec::new(),
            lit: None,
            recorded: Vec::new(),
            record: false,
        }))
    }

    pub fn render(&self) -> RgbImage {
        let mut img = RgbImage::new(WIDTH, HEIGHT);
        // fixture light that is always on
        img.fill_disk(150.0, 80.0, 3.0, [255, 255, 255]);
        if let Some((index, color)) = self.lit {
            if !self.hidden.contains(&index) {
                if let Some(&(x, y)) = self.leds.get(index as usize) {
                    img.fill_disk(x, y, LED_RADIUS, color.to_rgb(LEVEL_GAIN));
                }
            }
        }
        img
    }

    fn changed(&mut self) {
        if self.record {
            let frame = self.render();
            self.recorded.push(frame);
        }
    }
}

/// Live camera: renders the scene on every read, forever.
pub struct Camera(pub Rc<RefCell<Scene>>);

impl FrameSource for Camera {
    fn next_frame(&mut self) -> Option<Result<RgbImage, FrameError>> {
        Some(Ok(self.0.borrow().render()))
    }
}

pub struct Strip(pub Rc<RefCell<Scene>>);

impl LedChannel for Strip {
    fn set_single(&mut self, index: LedIndex, color: LedColor) -> Result<(), ChannelError> {
        let mut scene = self.0.borrow_mut();
        scene.lit = Some((index, color));
        scene.changed();
        Ok(())
    }

    fn set_all(&mut self, _color: [u8; 3]) -> Result<(), ChannelError> {
        Err(ChannelError::Rejected("whole-strip fill not wired".into()))
    }

    fn clear(&mut self) -> Result<(), ChannelError> {
        let mut scene = self.0.borrow_mut();
        scene.lit = None;
        scene.changed();
        Ok(())
    }
}

/// Five LEDs along a diagonal, at least 30 px apart.
pub fn diagonal_strip() -> Vec<(f32, f32)> {
    vec![
        (20.0, 70.0),
        (50.0, 60.0),
        (80.0, 50.0),
        (110.0, 40.0),
        (140.0, 20.0),
    ]
}
