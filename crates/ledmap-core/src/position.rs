use std::collections::HashMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// 0-based LED address, dense over `[0, total_leds)`.
pub type LedIndex = u32;

/// One `index -> position` pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub index: LedIndex,
    pub position: Point2<f32>,
}

/// Raw camera-space positions (pixels, origin top-left, Y down).
///
/// Keys are unique and the first write for an index wins; later inserts for
/// the same index are ignored. Iteration follows insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PositionEntry>", into = "Vec<PositionEntry>")]
pub struct PositionMap {
    entries: Vec<PositionEntry>,
    lookup: HashMap<LedIndex, usize>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position. Returns `false` (and leaves the map untouched) when
    /// the index already has one.
    pub fn insert(&mut self, index: LedIndex, position: Point2<f32>) -> bool {
        if self.lookup.contains_key(&index) {
            return false;
        }
        self.lookup.insert(index, self.entries.len());
        self.entries.push(PositionEntry { index, position });
        true
    }

    pub fn get(&self, index: LedIndex) -> Option<Point2<f32>> {
        self.lookup.get(&index).map(|&i| self.entries[i].position)
    }

    pub fn contains(&self, index: LedIndex) -> bool {
        self.lookup.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionEntry> {
        self.entries.iter()
    }

    pub fn indices(&self) -> impl Iterator<Item = LedIndex> + '_ {
        self.entries.iter().map(|e| e.index)
    }

    pub fn max_index(&self) -> Option<LedIndex> {
        self.indices().max()
    }

    /// Dense view over `[0, total)`; undetected indices are `None`.
    pub fn slots(&self, total: u32) -> Vec<Option<Point2<f32>>> {
        (0..total).map(|i| self.get(i)).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lookup.clear();
    }
}

impl From<Vec<PositionEntry>> for PositionMap {
    fn from(entries: Vec<PositionEntry>) -> Self {
        let mut map = PositionMap::new();
        for e in entries {
            map.insert(e.index, e.position);
        }
        map
    }
}

impl From<PositionMap> for Vec<PositionEntry> {
    fn from(map: PositionMap) -> Self {
        map.entries
    }
}

impl FromIterator<(LedIndex, Point2<f32>)> for PositionMap {
    fn from_iter<T: IntoIterator<Item = (LedIndex, Point2<f32>)>>(iter: T) -> Self {
        let mut map = PositionMap::new();
        for (index, position) in iter {
            map.insert(index, position);
        }
        map
    }
}
