//! # mea-probe
//!
//! Read-only access to dense multi-electrode-array recordings, ready for spike
//! detection and sorting.
//!
//! A probe ties together three things:
//!
//! - **geometry** – channel positions and the neighbor graph, loaded from a
//!   file or computed with a radius query
//! - **source** – the recorded samples, either a flat interleaved `i16`
//!   stream (memory-mapped) or a 3Brain HDF5 container (schema 100 or 101)
//! - **constants** – per-probe timing and threshold values
//!
//! and serves fixed windows of frames through [`Probe::read`].
//!
//! ```rust,ignore
//! use mea_probe::{NeuroPixel, Probe};
//!
//! let probe = NeuroPixel::open("recording.bin".as_ref(), 30_000.0)?;
//! let window = probe.read(0, 1_000)?; // 1000 × 385
//! let local = probe.neighbors().neighbors(42);
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod probe;
pub mod source;

pub use config::{ChannelCount, GeometryConfig, ProbeProfile, ProfileConstants};
pub use error::{ProbeError, Result};
pub use geometry::{NeighborGraph, NeighborSource, Position, ProbeGeometry};
pub use probe::{BioCam, CustomProbe, NeuroPixel, Probe, ProbeDescriptor};
pub use source::{
    open_source, ChannelCoord, ContainerMetadata, ContainerSource, ContainerVersion, FlatBinarySource,
    RawDataSource, Window,
};
