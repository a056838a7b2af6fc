use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{kdtree, loader};
use crate::error::{ProbeError, Result};

// ---------------------------------------------------------------------------
// Position – one electrode contact on the probe plane
// ---------------------------------------------------------------------------

/// Integer coordinate of one channel. Its index in the position list is the
/// channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Position { x, y }
    }

    /// Squared Euclidean distance in integer arithmetic. Saturates at
    /// `u128::MAX` for points at opposite ends of the `i64` range.
    pub fn distance_squared(&self, other: &Position) -> u128 {
        let dx = (i128::from(self.x) - i128::from(other.x)).unsigned_abs();
        let dy = (i128::from(self.y) - i128::from(other.y)).unsigned_abs();
        (dx * dx).saturating_add(dy * dy)
    }

    pub fn distance(&self, other: &Position) -> f64 {
        self.planar_squared(other).sqrt()
    }

    /// Whether `other` lies at distance `<= radius`. Symmetric in its two
    /// positions.
    pub fn within(&self, other: &Position, radius: f64) -> bool {
        self.planar_squared(other) <= radius * radius
    }

    // per-axis rounding matches the k-d tree's pruning test
    fn planar_squared(&self, other: &Position) -> f64 {
        let dx = axis_delta(self.x, other.x);
        let dy = axis_delta(self.y, other.y);
        dx * dx + dy * dy
    }
}

/// Signed difference `a - b` along one axis, widened before subtracting.
pub(crate) fn axis_delta(a: i64, b: i64) -> f64 {
    (i128::from(a) - i128::from(b)) as f64
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// NeighborGraph – channel id → set of nearby channel ids
// ---------------------------------------------------------------------------

/// Per-channel neighbor sets, indexed by channel id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborGraph {
    sets: Vec<BTreeSet<usize>>,
}

impl NeighborGraph {
    pub fn from_sets(sets: Vec<BTreeSet<usize>>) -> Self {
        NeighborGraph { sets }
    }

    /// Number of channels the graph describes.
    pub fn num_recording_channels(&self) -> usize {
        self.sets.len()
    }

    /// Size of the largest neighbor set (0 for an empty graph).
    pub fn max_neighbors(&self) -> usize {
        self.sets.iter().map(BTreeSet::len).max().unwrap_or(0)
    }

    pub fn neighbors(&self, channel: usize) -> Option<&BTreeSet<usize>> {
        self.sets.get(channel)
    }

    pub fn contains(&self, channel: usize, other: usize) -> bool {
        self.sets.get(channel).is_some_and(|set| set.contains(&other))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<usize>)> {
        self.sets.iter().enumerate()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// NeighborSource – where the neighbor graph comes from
// ---------------------------------------------------------------------------

/// Either a precomputed neighbor file or a radius for the spatial query.
#[derive(Debug, Clone, PartialEq)]
pub enum NeighborSource {
    File(PathBuf),
    Radius(f64),
}

impl NeighborSource {
    /// Resolve the optional pair found in configuration. Exactly one side
    /// must be present.
    pub fn resolve(file: Option<&Path>, radius: Option<f64>) -> Result<Self> {
        match (file, radius) {
            (Some(path), None) => Ok(NeighborSource::File(path.to_path_buf())),
            (None, Some(r)) => {
                validate_radius(r)?;
                Ok(NeighborSource::Radius(r))
            }
            (Some(_), Some(_)) => Err(ProbeError::Configuration(
                "both a neighbor file and a neighborhood radius were given".to_string(),
            )),
            (None, None) => Err(ProbeError::Configuration(
                "neither a neighbor file nor a neighborhood radius was given".to_string(),
            )),
        }
    }
}

pub(crate) fn validate_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(ProbeError::Configuration(format!(
            "neighborhood radius must be finite and non-negative, got {radius}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ProbeGeometry – positions plus neighbor graph
// ---------------------------------------------------------------------------

/// Channel positions and the neighbor graph derived from them (or loaded
/// alongside them). Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ProbeGeometry {
    positions: Vec<Position>,
    neighbors: NeighborGraph,
    source: NeighborSource,
}

impl ProbeGeometry {
    /// Load positions, then resolve the neighbor graph from `source`.
    pub fn load(positions_path: &Path, source: &NeighborSource) -> Result<Self> {
        let positions = loader::load_positions(positions_path)?;
        let neighbors = match source {
            NeighborSource::File(path) => {
                let graph = loader::load_neighbors(path)?;
                if graph.num_recording_channels() != positions.len() {
                    return Err(ProbeError::Consistency {
                        left: "position file",
                        left_count: positions.len(),
                        right: "neighbor file",
                        right_count: graph.num_recording_channels(),
                    });
                }
                graph
            }
            NeighborSource::Radius(radius) => kdtree::compute_neighbors(&positions, *radius)?,
        };

        log::debug!(
            "loaded geometry from {}: {} channels, max {} neighbors",
            positions_path.display(),
            positions.len(),
            neighbors.max_neighbors()
        );

        Ok(ProbeGeometry {
            positions,
            neighbors,
            source: source.clone(),
        })
    }

    /// Build geometry from in-memory positions using a radius query.
    pub fn from_positions(positions: Vec<Position>, radius: f64) -> Result<Self> {
        let neighbors = kdtree::compute_neighbors(&positions, radius)?;
        Ok(ProbeGeometry {
            positions,
            neighbors,
            source: NeighborSource::Radius(radius),
        })
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn neighbors(&self) -> &NeighborGraph {
        &self.neighbors
    }

    pub fn neighbor_source(&self) -> &NeighborSource {
        &self.source
    }

    pub fn num_recording_channels(&self) -> usize {
        self.neighbors.num_recording_channels()
    }

    pub fn max_neighbors(&self) -> usize {
        self.neighbors.max_neighbors()
    }
}
