//! Broad-phase spatial index abstractions for entity proximity queries.
//!
//! The entity store mirrors `(key, bounding box)` pairs into an index and
//! asks it for overlap candidates. Implementations may return false
//! positives from a query; they must never return false negatives. Anything
//! satisfying [`SpatialIndex`] can back the store, including tree structures
//! maintained elsewhere; this crate ships a scan baseline and a uniform
//! grid.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use skirmish_geom::Aabb;
use thiserror::Error;

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// Configuration values that cannot be used (e.g. a non-positive cell
    /// size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// The key is already registered and was not removed first.
    #[error("key is already present in the index")]
    DuplicateKey,
    /// The key is not registered.
    #[error("key is not present in the index")]
    UnknownKey,
}

/// Common behaviour exposed by broad-phase indices.
///
/// Mutating calls are not synchronized; callers serialize them alongside
/// mutation of whatever table the index mirrors.
pub trait SpatialIndex<K> {
    /// Register `key` with its bounding box.
    fn insert(&mut self, key: K, aabb: Aabb) -> Result<(), IndexError>;

    /// Drop `key` from the index.
    fn remove(&mut self, key: K) -> Result<(), IndexError>;

    /// Replace the bounding box of `key`, registering it if absent.
    fn update(&mut self, key: K, aabb: Aabb);

    /// Collect every key whose box overlaps `region`, ascending by key.
    ///
    /// The result is a superset of the truly-overlapping set with respect to
    /// whatever geometry the caller layers on top; with respect to the
    /// registered boxes it is exact.
    fn broad_phase(&self, region: &Aabb) -> Vec<K>;

    /// Number of registered keys.
    fn len(&self) -> usize;

    /// Whether no keys are registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scan-everything baseline index.
///
/// Correct for any workload and fast enough for small populations; also the
/// oracle the grid implementation is checked against.
#[derive(Debug, Clone)]
pub struct BruteForceIndex<K> {
    entries: BTreeMap<K, Aabb>,
}

impl<K> BruteForceIndex<K> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K> Default for BruteForceIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Ord> SpatialIndex<K> for BruteForceIndex<K> {
    fn insert(&mut self, key: K, aabb: Aabb) -> Result<(), IndexError> {
        if self.entries.contains_key(&key) {
            return Err(IndexError::DuplicateKey);
        }
        self.entries.insert(key, aabb);
        Ok(())
    }

    fn remove(&mut self, key: K) -> Result<(), IndexError> {
        self.entries
            .remove(&key)
            .map(|_| ())
            .ok_or(IndexError::UnknownKey)
    }

    fn update(&mut self, key: K, aabb: Aabb) {
        self.entries.insert(key, aabb);
    }

    fn broad_phase(&self, region: &Aabb) -> Vec<K> {
        // BTreeMap iteration is already key-ascending.
        self.entries
            .iter()
            .filter(|(_, aabb)| aabb.overlaps(region))
            .map(|(key, _)| *key)
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Uniform grid index bucketing boxes by the cells they span.
///
/// Only `cell_size` survives serialization; registered entries are runtime
/// state and are rebuilt by the owning store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformGridIndex<K> {
    cell_size: f64,
    #[serde(skip)]
    cells: HashMap<(i64, i64), Vec<K>>,
    #[serde(skip)]
    entries: HashMap<K, Aabb>,
}

impl<K> UniformGridIndex<K> {
    /// Create a grid with the provided cell edge length.
    pub fn new(cell_size: f64) -> Result<Self, IndexError> {
        if !(cell_size > 0.0) {
            return Err(IndexError::InvalidConfig("cell_size must be positive"));
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
            entries: HashMap::new(),
        })
    }

    /// Edge length of each grid cell.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Inclusive cell coordinate range covered by `aabb`.
    fn cell_range(&self, aabb: &Aabb) -> ((i64, i64), (i64, i64)) {
        let min = (aabb.min() / self.cell_size).floor();
        let max = (aabb.max() / self.cell_size).floor();
        ((min.x as i64, min.y as i64), (max.x as i64, max.y as i64))
    }
}

impl<K> Default for UniformGridIndex<K> {
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            cells: HashMap::new(),
            entries: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Ord> UniformGridIndex<K> {
    fn link(&mut self, key: K, aabb: &Aabb) {
        let ((x0, y0), (x1, y1)) = self.cell_range(aabb);
        for x in x0..=x1 {
            for y in y0..=y1 {
                self.cells.entry((x, y)).or_default().push(key);
            }
        }
    }

    fn unlink(&mut self, key: K, aabb: &Aabb) {
        let ((x0, y0), (x1, y1)) = self.cell_range(aabb);
        for x in x0..=x1 {
            for y in y0..=y1 {
                if let Some(bucket) = self.cells.get_mut(&(x, y)) {
                    bucket.retain(|other| *other != key);
                    if bucket.is_empty() {
                        self.cells.remove(&(x, y));
                    }
                }
            }
        }
    }
}

impl<K: Copy + Eq + Hash + Ord> SpatialIndex<K> for UniformGridIndex<K> {
    fn insert(&mut self, key: K, aabb: Aabb) -> Result<(), IndexError> {
        if self.entries.contains_key(&key) {
            return Err(IndexError::DuplicateKey);
        }
        self.link(key, &aabb);
        self.entries.insert(key, aabb);
        Ok(())
    }

    fn remove(&mut self, key: K) -> Result<(), IndexError> {
        let aabb = self.entries.remove(&key).ok_or(IndexError::UnknownKey)?;
        self.unlink(key, &aabb);
        Ok(())
    }

    fn update(&mut self, key: K, aabb: Aabb) {
        if let Some(previous) = self.entries.remove(&key) {
            self.unlink(key, &previous);
        }
        self.link(key, &aabb);
        self.entries.insert(key, aabb);
    }

    fn broad_phase(&self, region: &Aabb) -> Vec<K> {
        let ((x0, y0), (x1, y1)) = self.cell_range(region);

        // Scan whichever is smaller, the cell window or the occupied set. A
        // world-spanning region would otherwise walk an unbounded window.
        let window = (i128::from(x1) - i128::from(x0) + 1)
            * (i128::from(y1) - i128::from(y0) + 1);
        let mut candidates: Vec<K> = Vec::new();
        if window > self.cells.len() as i128 {
            for ((x, y), bucket) in &self.cells {
                if *x >= x0 && *x <= x1 && *y >= y0 && *y <= y1 {
                    candidates.extend(bucket.iter().copied());
                }
            }
        } else {
            for x in x0..=x1 {
                for y in y0..=y1 {
                    if let Some(bucket) = self.cells.get(&(x, y)) {
                        candidates.extend(bucket.iter().copied());
                    }
                }
            }
        }

        candidates.sort_unstable();
        candidates.dedup();
        candidates.retain(|key| {
            self.entries
                .get(key)
                .is_some_and(|aabb| aabb.overlaps(region))
        });
        candidates
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
