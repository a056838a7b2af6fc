/// Geometry layer: channel positions and the neighbor graph.
///
/// Architecture:
/// ```text
///  positions file        neighbor file   or   radius
///        │                     │                 │
///        ▼                     ▼                 ▼
///   ┌──────────┐         ┌──────────┐     ┌──────────┐
///   │  loader   │         │  loader   │     │  kdtree   │  radius query per channel
///   └──────────┘         └──────────┘     └──────────┘
///        │                     │                 │
///        └──────────┬──────────┴─────────────────┘
///                   ▼
///           ┌───────────────┐
///           │ ProbeGeometry │  Vec<Position>, NeighborGraph
///           └───────────────┘
/// ```

pub mod kdtree;
pub mod loader;
pub mod model;

pub use kdtree::{compute_neighbors, KdTree};
pub use loader::{load_neighbors, load_positions};
pub use model::{NeighborGraph, NeighborSource, Position, ProbeGeometry};
