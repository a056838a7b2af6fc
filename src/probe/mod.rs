/// Probe layer: constants + geometry + data source behind one `read`.
///
/// Architecture:
/// ```text
///   ProbeProfile ──► ProbeDescriptor (constants, geometry)
///                          │
///          ┌───────────────┼────────────────┐
///          ▼               ▼                ▼
///     NeuroPixel        BioCam         CustomProbe
///   (flat, fixed C)  (container,     (any source via
///                     discovered C)    open_source)
///          │               │                │
///          └───────────────┴────────────────┘
///                          ▼
///                 read(t0, t1) → Window
/// ```

pub mod profiles;

pub use profiles::{BioCam, CustomProbe, NeuroPixel};

use crate::config::{ProbeProfile, ProfileConstants};
use crate::error::{ProbeError, Result};
use crate::geometry::{NeighborGraph, Position, ProbeGeometry};
use crate::source::{RawDataSource, Window};

// ---------------------------------------------------------------------------
// Probe – the interface handed to detection and visualisation
// ---------------------------------------------------------------------------

/// A recording probe. Concrete probes bind a data source and override
/// [`Probe::read`]; the provided implementation refuses to read.
pub trait Probe {
    fn descriptor(&self) -> &ProbeDescriptor;

    /// Number of frames available to [`Probe::read`].
    fn frame_count(&self) -> usize;

    /// Sampling rate in Hz, `0.0` when unknown.
    fn fps(&self) -> f64 {
        self.descriptor().constants().fps
    }

    /// Frames `[t0, t1)` as a `(t1 - t0) × channel_count` block.
    fn read(&self, _t0: usize, _t1: usize) -> Result<Window<'_>> {
        Err(ProbeError::Invocation {
            probe: self.descriptor().name().to_string(),
        })
    }

    fn positions(&self) -> &[Position] {
        self.descriptor().geometry().positions()
    }

    fn neighbors(&self) -> &NeighborGraph {
        self.descriptor().geometry().neighbors()
    }

    fn channel_count(&self) -> usize {
        self.descriptor().geometry().num_recording_channels()
    }

    fn max_neighbors(&self) -> usize {
        self.descriptor().geometry().max_neighbors()
    }

    fn constants(&self) -> &ProfileConstants {
        self.descriptor().constants()
    }
}

// ---------------------------------------------------------------------------
// ProbeDescriptor – constants and geometry without a recording
// ---------------------------------------------------------------------------

/// Name, constants and geometry of a probe. On its own it serves geometry
/// consumers; reading from it is an error.
#[derive(Debug, Clone)]
pub struct ProbeDescriptor {
    name: String,
    constants: ProfileConstants,
    geometry: ProbeGeometry,
}

impl ProbeDescriptor {
    /// Validate the constants, then load positions and resolve neighbors.
    pub fn load(profile: &ProbeProfile) -> Result<Self> {
        profile.constants.validate()?;
        let source = profile.geometry.neighbor_source()?;
        let geometry = ProbeGeometry::load(&profile.geometry.positions, &source)?;
        Self::new(&profile.name, profile.constants.clone(), geometry)
    }

    pub fn new(name: &str, constants: ProfileConstants, geometry: ProbeGeometry) -> Result<Self> {
        constants.validate()?;
        if let Some(fixed) = constants.fixed_channels() {
            if fixed != geometry.num_recording_channels() {
                return Err(ProbeError::Consistency {
                    left: "profile",
                    left_count: fixed,
                    right: "geometry",
                    right_count: geometry.num_recording_channels(),
                });
            }
        }
        Ok(ProbeDescriptor {
            name: name.to_string(),
            constants,
            geometry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constants(&self) -> &ProfileConstants {
        &self.constants
    }

    pub fn geometry(&self) -> &ProbeGeometry {
        &self.geometry
    }

    /// Geometry and recording must describe the same channels.
    pub fn check_source<S: RawDataSource + ?Sized>(&self, source: &S) -> Result<()> {
        let geometry_channels = self.geometry.num_recording_channels();
        if geometry_channels != source.channel_count() {
            return Err(ProbeError::Consistency {
                left: "neighbor graph",
                left_count: geometry_channels,
                right: "recording",
                right_count: source.channel_count(),
            });
        }
        Ok(())
    }

    pub(crate) fn with_fps(mut self, fps: f64) -> Self {
        self.constants.fps = fps;
        self
    }
}

impl Probe for ProbeDescriptor {
    fn descriptor(&self) -> &ProbeDescriptor {
        self
    }

    fn frame_count(&self) -> usize {
        0
    }
}
