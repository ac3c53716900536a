//! Raw pixel positions -> unit square.
//!
//! X maps left-to-right onto `[0, 1]`; Y is flipped so that image-down
//! becomes geometry-up (`0` = bottom, `1` = top).

use std::collections::HashMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::position::{LedIndex, PositionMap};

/// Lower bound on an axis range, so degenerate layouts (all LEDs on one
/// row or column) do not divide by zero.
pub const NORMALIZE_EPS: f32 = 1e-6;

/// Axis-aligned bounds of the raw positions that were normalized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawBounds {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
}

impl RawBounds {
    pub fn of(map: &PositionMap) -> Option<Self> {
        let mut it = map.iter();
        let first = it.next()?.position;
        let (mut min, mut max) = (first, first);
        for e in it {
            let p = e.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    pub fn range(&self) -> (f32, f32) {
        (
            (self.max.x - self.min.x).max(NORMALIZE_EPS),
            (self.max.y - self.min.y).max(NORMALIZE_EPS),
        )
    }
}

/// Unit-square positions (origin bottom-left, Y up). Only indices present
/// in the raw map appear here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NormalizedMap {
    pub bounds: Option<RawBounds>,
    pub entries: Vec<(LedIndex, Point2<f32>)>,
    #[serde(skip)]
    lookup: HashMap<LedIndex, usize>,
}

impl NormalizedMap {
    pub fn get(&self, index: LedIndex) -> Option<Point2<f32>> {
        if self.lookup.len() == self.entries.len() {
            return self.lookup.get(&index).map(|&i| self.entries[i].1);
        }
        // Deserialized maps have no lookup table.
        self.entries
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(LedIndex, Point2<f32>)> {
        self.entries.iter()
    }

    /// Dense view over `[0, total)`; indices without a detection are `None`.
    pub fn slots(&self, total: u32) -> Vec<Option<Point2<f32>>> {
        (0..total).map(|i| self.get(i)).collect()
    }

    /// Reinterpret the normalized points as a raw map (for chaining).
    pub fn to_position_map(&self) -> PositionMap {
        self.entries.iter().copied().collect()
    }
}

/// Rescale every present entry of `raw` into the unit square.
pub fn normalize(raw: &PositionMap) -> NormalizedMap {
    let Some(bounds) = RawBounds::of(raw) else {
        return NormalizedMap::default();
    };
    let (range_x, range_y) = bounds.range();
    log::debug!(
        "normalizing {} positions, bounds x=[{:.1}, {:.1}] y=[{:.1}, {:.1}]",
        raw.len(),
        bounds.min.x,
        bounds.max.x,
        bounds.min.y,
        bounds.max.y
    );

    let mut entries = Vec::with_capacity(raw.len());
    let mut lookup = HashMap::with_capacity(raw.len());
    for e in raw.iter() {
        let nx = (e.position.x - bounds.min.x) / range_x;
        let ny = 1.0 - (e.position.y - bounds.min.y) / range_y;
        lookup.insert(e.index, entries.len());
        entries.push((e.index, Point2::new(nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))));
    }

    NormalizedMap {
        bounds: Some(bounds),
        entries,
        lookup,
    }
}
