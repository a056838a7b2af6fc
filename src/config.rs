use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};
use crate::geometry::NeighborSource;

// ---------------------------------------------------------------------------
// ProfileConstants – fixed per-probe-type values
// ---------------------------------------------------------------------------

/// How a profile learns its channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCount {
    /// Known up front (flat recordings carry no header).
    Fixed(usize),
    /// Read from the recording's own metadata at open.
    Discovered,
}

/// Timing and threshold constants handed to the detection stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConstants {
    pub channels: ChannelCount,
    /// Frames between threshold crossing and spike peak.
    pub spike_delay: u32,
    pub spike_peak_duration: u32,
    pub noise_duration: u32,
    /// Fraction in `[0, 1]`.
    pub noise_amp_percent: f64,
    /// Sampling rate in Hz; `0.0` means unset.
    #[serde(default)]
    pub fps: f64,
}

impl ProfileConstants {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.noise_amp_percent) {
            return Err(ProbeError::Configuration(format!(
                "noise_amp_percent must lie in [0, 1], got {}",
                self.noise_amp_percent
            )));
        }
        if !self.fps.is_finite() || self.fps < 0.0 {
            return Err(ProbeError::Configuration(format!(
                "sampling rate must be finite and non-negative, got {}",
                self.fps
            )));
        }
        if self.channels == ChannelCount::Fixed(0) {
            return Err(ProbeError::Configuration(
                "fixed channel count must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fixed_channels(&self) -> Option<usize> {
        match self.channels {
            ChannelCount::Fixed(n) => Some(n),
            ChannelCount::Discovered => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GeometryConfig – where positions and neighbors come from
// ---------------------------------------------------------------------------

/// Geometry file locations. Exactly one of `neighbors` and `radius` must
/// be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub positions: PathBuf,
    #[serde(default)]
    pub neighbors: Option<PathBuf>,
    #[serde(default)]
    pub radius: Option<f64>,
}

impl GeometryConfig {
    pub fn with_neighbor_file(positions: impl Into<PathBuf>, neighbors: impl Into<PathBuf>) -> Self {
        GeometryConfig {
            positions: positions.into(),
            neighbors: Some(neighbors.into()),
            radius: None,
        }
    }

    pub fn with_radius(positions: impl Into<PathBuf>, radius: f64) -> Self {
        GeometryConfig {
            positions: positions.into(),
            neighbors: None,
            radius: Some(radius),
        }
    }

    pub fn neighbor_source(&self) -> Result<NeighborSource> {
        NeighborSource::resolve(self.neighbors.as_deref(), self.radius)
    }

    /// Resolve relative paths against `dir`. Absolute paths are untouched.
    pub fn with_base_dir(mut self, dir: &Path) -> Self {
        if self.positions.is_relative() {
            self.positions = dir.join(&self.positions);
        }
        if let Some(neighbors) = self.neighbors.as_mut() {
            if neighbors.is_relative() {
                *neighbors = dir.join(&*neighbors);
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// ProbeProfile – a named probe type
// ---------------------------------------------------------------------------

pub const NEUROPIXEL_CHANNELS: usize = 385;
pub const NEUROPIXEL_FPS: f64 = 30_000.0;

/// Everything needed to build a probe except the recording itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeProfile {
    pub name: String,
    pub constants: ProfileConstants,
    pub geometry: GeometryConfig,
}

impl ProbeProfile {
    /// Neuropixels probe: 385 channels in a headerless flat recording.
    pub fn neuropixel() -> Self {
        ProbeProfile {
            name: "neuropixel".to_string(),
            constants: ProfileConstants {
                channels: ChannelCount::Fixed(NEUROPIXEL_CHANNELS),
                spike_delay: 5,
                spike_peak_duration: 5,
                noise_duration: 2,
                noise_amp_percent: 0.95,
                fps: NEUROPIXEL_FPS,
            },
            // a radius of 78 reproduces the shipped neighbor matrix
            geometry: GeometryConfig::with_neighbor_file(
                "probes/positions_neuropixel",
                "probes/neighbormatrix_neuropixel",
            ),
        }
    }

    /// 3Brain BioCam array: channel count and rate live in the container.
    pub fn biocam() -> Self {
        ProbeProfile {
            name: "biocam".to_string(),
            constants: ProfileConstants {
                channels: ChannelCount::Discovered,
                spike_delay: 5,
                spike_peak_duration: 5,
                noise_duration: 2,
                noise_amp_percent: 0.95,
                fps: 0.0,
            },
            // a radius of 2 reproduces the shipped neighbor matrix
            geometry: GeometryConfig::with_neighbor_file(
                "probes/positions_biocam",
                "probes/neighbormatrix_biocam",
            ),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))?;
        let profile: ProbeProfile = serde_json::from_str(&text)
            .map_err(|e| ProbeError::Configuration(format!("{}: {e}", path.display())))?;
        profile.constants.validate()?;
        Ok(profile)
    }

    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.constants.fps = fps;
        self
    }

    pub fn with_channels(mut self, channels: ChannelCount) -> Self {
        self.constants.channels = channels;
        self
    }
}
