//! Multi-frame agreement check for repeated detections of one LED.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmParams {
    /// Fewer samples than this are inconclusive. Never below 2.
    pub min_samples: usize,
    /// Largest allowed distance of any sample from the centroid (pixels).
    pub max_spread: f32,
}

impl Default for ConfirmParams {
    fn default() -> Self {
        Self {
            min_samples: 2,
            max_spread: 15.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Confirmation {
    Accepted {
        position: Point2<f32>,
        /// Distance of the farthest sample from `position`.
        spread: f32,
    },
    Inconclusive(Inconclusive),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Inconclusive {
    TooFewSamples { got: usize, needed: usize },
    Scattered { spread: f32, limit: f32 },
}

impl Confirmation {
    pub fn position(&self) -> Option<Point2<f32>> {
        match self {
            Confirmation::Accepted { position, .. } => Some(*position),
            Confirmation::Inconclusive(_) => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Confirmation::Accepted { .. })
    }
}

/// Accept the centroid of `samples` when they agree.
pub fn confirm(samples: &[Point2<f32>], params: &ConfirmParams) -> Confirmation {
    let needed = params.min_samples.max(2);
    if samples.len() < needed {
        return Confirmation::Inconclusive(Inconclusive::TooFewSamples {
            got: samples.len(),
            needed,
        });
    }
    let n = samples.len() as f32;
    let (sx, sy) = samples
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    let centroid = Point2::new(sx / n, sy / n);
    let spread = samples
        .iter()
        .map(|p| nalgebra::distance(p, &centroid))
        .fold(0.0f32, f32::max);
    if !spread.is_finite() || spread > params.max_spread {
        return Confirmation::Inconclusive(Inconclusive::Scattered {
            spread,
            limit: params.max_spread,
        });
    }
    Confirmation::Accepted {
        position: centroid,
        spread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn close_samples_are_accepted_at_centroid() {
        let samples = [Point2::new(10.0, 10.0), Point2::new(10.0, 11.0)];
        let c = confirm(&samples, &ConfirmParams::default());
        let p = c.position().expect("accepted");
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 10.5, epsilon = 1e-5);
    }

    #[test]
    fn scattered_samples_are_inconclusive() {
        let samples = [Point2::new(10.0, 10.0), Point2::new(40.0, 40.0)];
        let c = confirm(&samples, &ConfirmParams::default());
        assert!(matches!(
            c,
            Confirmation::Inconclusive(Inconclusive::Scattered { .. })
        ));
    }

    #[test]
    fn single_sample_never_confirms() {
        let params = ConfirmParams {
            min_samples: 1,
            ..ConfirmParams::default()
        };
        let c = confirm(&[Point2::new(1.0, 1.0)], &params);
        assert_eq!(
            c,
            Confirmation::Inconclusive(Inconclusive::TooFewSamples { got: 1, needed: 2 })
        );
        assert!(!confirm(&[], &params).is_accepted());
    }

    #[test]
    fn spread_limit_is_configurable() {
        let samples = [Point2::new(0.0, 0.0), Point2::new(0.0, 8.0)];
        assert!(confirm(&samples, &ConfirmParams::default()).is_accepted());
        let strict = ConfirmParams {
            max_spread: 3.0,
            ..ConfirmParams::default()
        };
        assert!(!confirm(&samples, &strict).is_accepted());
    }
}
