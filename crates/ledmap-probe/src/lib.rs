//! Active LED calibration: light one LED at a time, difference the camera
//! frame against a dark baseline and step the brightness up until repeated
//! detections agree.
//!
//! [`ProbeSession`] is the pure state machine; [`ActiveProber`] wires it to
//! a [`FrameSource`](ledmap_core::FrameSource) and an
//! [`LedChannel`](ledmap_core::LedChannel).

mod error;
mod params;
mod runner;
mod session;
mod state;

pub use error::ProbeError;
pub use params::ProbeParams;
pub use runner::{ActiveProber, ProbeReport};
pub use session::{ProbeEffect, ProbeSession, ProbeTick};
pub use state::{ProbeSnapshot, ProbeState};
