use std::fmt;
use std::path::Path;

use super::{Probe, ProbeDescriptor};
use crate::config::{ChannelCount, ProbeProfile};
use crate::error::{ProbeError, Result};
use crate::source::{
    open_source, ContainerMetadata, ContainerSource, FlatBinarySource, RawDataSource, Window,
};

// ---------------------------------------------------------------------------
// NeuroPixel – fixed channel count, flat recording
// ---------------------------------------------------------------------------

/// Neuropixels probe over a headerless flat recording.
#[derive(Debug)]
pub struct NeuroPixel {
    descriptor: ProbeDescriptor,
    source: FlatBinarySource,
}

impl NeuroPixel {
    /// Built-in profile with the geometry files under `probes/`.
    pub fn open(data_path: &Path, fps: f64) -> Result<Self> {
        Self::from_profile(&ProbeProfile::neuropixel().with_fps(fps), data_path)
    }

    /// Any flat-recording profile; its channel count must be fixed.
    pub fn from_profile(profile: &ProbeProfile, data_path: &Path) -> Result<Self> {
        let ChannelCount::Fixed(channels) = profile.constants.channels else {
            return Err(ProbeError::Configuration(format!(
                "profile '{}' reads flat recordings and needs a fixed channel count",
                profile.name
            )));
        };
        let descriptor = ProbeDescriptor::load(profile)?;
        let source = FlatBinarySource::open(data_path, channels)?;
        descriptor.check_source(&source)?;
        Ok(NeuroPixel { descriptor, source })
    }

    pub fn source(&self) -> &FlatBinarySource {
        &self.source
    }
}

impl Probe for NeuroPixel {
    fn descriptor(&self) -> &ProbeDescriptor {
        &self.descriptor
    }

    fn frame_count(&self) -> usize {
        self.source.frame_count()
    }

    fn read(&self, t0: usize, t1: usize) -> Result<Window<'_>> {
        self.source.read_window(t0, t1)
    }
}

// ---------------------------------------------------------------------------
// BioCam – channel count and rate discovered from the container
// ---------------------------------------------------------------------------

/// 3Brain BioCam array over a versioned container recording.
#[derive(Debug)]
pub struct BioCam {
    descriptor: ProbeDescriptor,
    source: ContainerSource,
}

impl BioCam {
    /// Built-in profile with the geometry files under `probes/`. A `fps` of
    /// `0.0` takes the rate stored in the container.
    pub fn open(data_path: &Path, fps: f64) -> Result<Self> {
        Self::from_profile(&ProbeProfile::biocam().with_fps(fps), data_path)
    }

    pub fn from_profile(profile: &ProbeProfile, data_path: &Path) -> Result<Self> {
        let descriptor = ProbeDescriptor::load(profile)?;
        let source = ContainerSource::open(data_path)?;
        descriptor.check_source(&source)?;

        let fps = resolve_fps(profile.constants.fps, source.sampling_rate());

        Ok(BioCam {
            descriptor: descriptor.with_fps(fps),
            source,
        })
    }

    pub fn metadata(&self) -> &ContainerMetadata {
        self.source.metadata()
    }

    pub fn source(&self) -> &ContainerSource {
        &self.source
    }
}

impl Probe for BioCam {
    fn descriptor(&self) -> &ProbeDescriptor {
        &self.descriptor
    }

    fn frame_count(&self) -> usize {
        self.source.frame_count()
    }

    fn read(&self, t0: usize, t1: usize) -> Result<Window<'_>> {
        self.source.read_window(t0, t1)
    }
}

// ---------------------------------------------------------------------------
// CustomProbe – profile from configuration, layout from the file name
// ---------------------------------------------------------------------------

/// A probe described by a [`ProbeProfile`] (usually loaded from JSON) over
/// whichever recording layout `data_path` turns out to be.
pub struct CustomProbe {
    descriptor: ProbeDescriptor,
    source: Box<dyn RawDataSource>,
}

impl CustomProbe {
    pub fn open(profile: &ProbeProfile, data_path: &Path) -> Result<Self> {
        let descriptor = ProbeDescriptor::load(profile)?;
        let source = open_source(data_path, profile.constants.fixed_channels())?;
        descriptor.check_source(source.as_ref())?;

        let fps = resolve_fps(profile.constants.fps, source.sampling_rate());

        Ok(CustomProbe {
            descriptor: descriptor.with_fps(fps),
            source,
        })
    }
}

impl fmt::Debug for CustomProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomProbe")
            .field("descriptor", &self.descriptor)
            .field("channels", &self.source.channel_count())
            .field("frames", &self.source.frame_count())
            .finish_non_exhaustive()
    }
}

impl Probe for CustomProbe {
    fn descriptor(&self) -> &ProbeDescriptor {
        &self.descriptor
    }

    fn frame_count(&self) -> usize {
        self.source.frame_count()
    }

    fn read(&self, t0: usize, t1: usize) -> Result<Window<'_>> {
        self.source.read_window(t0, t1)
    }
}

/// A caller-supplied rate wins; otherwise the recording's own rate if it is
/// usable, else the unset sentinel `0.0`.
fn resolve_fps(requested: f64, stored: Option<f64>) -> f64 {
    if requested > 0.0 {
        return requested;
    }
    stored
        .filter(|rate| rate.is_finite() && *rate > 0.0)
        .unwrap_or(0.0)
}
