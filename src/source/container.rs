use std::fmt;
use std::path::{Path, PathBuf};

use hdf5::{Dataset, File, H5Type};
use ndarray::{s, Array2};

use super::{RawDataSource, Window};
use crate::error::{ProbeError, Result};

const DATA_GROUP: &str = "3BData";
const RAW: &str = "3BData/Raw";
const VERSION_ATTR: &str = "Version";
const N_FRAMES: &str = "3BRecInfo/3BRecVars/NRecFrames";
const SAMPLING_RATE: &str = "3BRecInfo/3BRecVars/SamplingRate";
const SIGNAL_INVERSION: &str = "3BRecInfo/3BRecVars/SignalInversion";
const BIT_DEPTH: &str = "3BRecInfo/3BRecVars/BitDepth";
const MAX_VOLT: &str = "3BRecInfo/3BRecVars/MaxVolt";
const MIN_VOLT: &str = "3BRecInfo/3BRecVars/MinVolt";
const N_COLS: &str = "3BRecInfo/3BMeaChip/NCols";
const CHANNELS: &str = "3BRecInfo/3BMeaStreams/Raw/Chs";

// ---------------------------------------------------------------------------
// ContainerVersion – known 3Brain schema versions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerVersion {
    /// `Raw` is a 2-D `(frames, channels)` dataset.
    V100,
    /// `Raw` is a 1-D dataset of interleaved frames.
    V101,
}

impl ContainerVersion {
    pub fn number(self) -> i64 {
        match self {
            ContainerVersion::V100 => 100,
            ContainerVersion::V101 => 101,
        }
    }

    fn from_number(path: &Path, version: i64) -> Result<Self> {
        match version {
            100 => Ok(ContainerVersion::V100),
            101 => Ok(ContainerVersion::V101),
            other => Err(ProbeError::format(
                path,
                format!("unsupported container schema version {other}"),
            )),
        }
    }
}

impl fmt::Display for ContainerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

// ---------------------------------------------------------------------------
// ChannelCoord – one entry of the recorded-channel table
// ---------------------------------------------------------------------------

/// 1-based chip row / column of a recorded channel, stored as the compound
/// `{Row, Col}` in the container.
#[derive(H5Type, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ChannelCoord {
    #[hdf5(rename = "Row")]
    pub row: i16,
    #[hdf5(rename = "Col")]
    pub col: i16,
}

impl ChannelCoord {
    /// Linear electrode index on a chip with `n_cols` columns.
    pub fn linear_index(&self, n_cols: usize) -> Option<usize> {
        let row = usize::try_from(self.row).ok()?.checked_sub(1)?;
        let col = usize::try_from(self.col).ok()?.checked_sub(1)?;
        Some(col + row * n_cols)
    }
}

// ---------------------------------------------------------------------------
// ContainerMetadata
// ---------------------------------------------------------------------------

/// Recording parameters read once at open.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerMetadata {
    pub version: ContainerVersion,
    pub frame_count: usize,
    pub sampling_rate: f64,
    pub channel_count: usize,
    /// Linear chip index of each recorded channel, in recording order.
    pub channel_indices: Vec<usize>,
    /// `-1.0` when the acquisition system stored inverted samples.
    pub signal_inversion: f64,
    pub bit_depth: Option<u8>,
    pub max_volt: Option<f64>,
    pub min_volt: Option<f64>,
}

// ---------------------------------------------------------------------------
// ContainerSource – versioned HDF5 recording
// ---------------------------------------------------------------------------

type ReadStrategy = fn(&ContainerSource, usize, usize) -> Result<Array2<i16>>;

/// 3Brain container recording. The schema version is read once at open and
/// fixes which read strategy every later window uses.
pub struct ContainerSource {
    path: PathBuf,
    _file: File,
    raw: Dataset,
    metadata: ContainerMetadata,
    read: ReadStrategy,
}

impl fmt::Debug for ContainerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerSource")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ContainerSource {
    pub fn open(path: &Path) -> Result<Self> {
        let h5 = |e: hdf5::Error| ProbeError::hdf5(path, e);

        let file = File::open(path).map_err(h5)?;
        let version = file
            .group(DATA_GROUP)
            .and_then(|g| g.attr(VERSION_ATTR))
            .and_then(|a| a.read_scalar::<i64>())
            .map_err(h5)?;
        let version = ContainerVersion::from_number(path, version)?;

        let frames = read_scalar::<i64>(&file, path, N_FRAMES)?;
        let frame_count = usize::try_from(frames)
            .map_err(|_| ProbeError::format(path, format!("negative frame count {frames}")))?;
        let sampling_rate = read_scalar::<f64>(&file, path, SAMPLING_RATE)?;

        let raw = file.dataset(RAW).map_err(h5)?;
        let shape = raw.shape();
        let (channel_count, read): (usize, ReadStrategy) = match version {
            ContainerVersion::V100 => {
                let [stored_frames, channels] = shape[..] else {
                    return Err(ProbeError::format(
                        path,
                        format!("version 100 expects 2-D raw data, got shape {shape:?}"),
                    ));
                };
                if stored_frames < frame_count {
                    return Err(ProbeError::format(
                        path,
                        format!("raw data holds {stored_frames} frames, metadata claims {frame_count}"),
                    ));
                }
                (channels, read_frames_v100 as ReadStrategy)
            }
            ContainerVersion::V101 => {
                let [len] = shape[..] else {
                    return Err(ProbeError::format(
                        path,
                        format!("version 101 expects 1-D raw data, got shape {shape:?}"),
                    ));
                };
                if frame_count == 0 || len % frame_count != 0 {
                    return Err(ProbeError::format(
                        path,
                        format!("{len} raw samples do not divide into {frame_count} frames"),
                    ));
                }
                (len / frame_count, read_interleaved_v101 as ReadStrategy)
            }
        };
        if channel_count == 0 {
            return Err(ProbeError::format(path, "recording has no channels"));
        }

        let channel_indices = read_channel_indices(&file, path)?;
        if channel_indices.len() != channel_count {
            return Err(ProbeError::format(
                path,
                format!(
                    "channel table lists {} channels, raw data has {channel_count}",
                    channel_indices.len()
                ),
            ));
        }

        let metadata = ContainerMetadata {
            version,
            frame_count,
            sampling_rate,
            channel_count,
            channel_indices,
            signal_inversion: read_scalar_opt::<f64>(&file, path, SIGNAL_INVERSION)?.unwrap_or(1.0),
            bit_depth: read_scalar_opt::<u8>(&file, path, BIT_DEPTH)?,
            max_volt: read_scalar_opt::<f64>(&file, path, MAX_VOLT)?,
            min_volt: read_scalar_opt::<f64>(&file, path, MIN_VOLT)?,
        };

        log::info!(
            "3Brain data format {}, signal inversion {}: {} channels, {} frames at {} Hz",
            metadata.version,
            metadata.signal_inversion,
            metadata.channel_count,
            metadata.frame_count,
            metadata.sampling_rate
        );

        Ok(ContainerSource {
            path: path.to_path_buf(),
            _file: file,
            raw,
            metadata,
            read,
        })
    }

    pub fn metadata(&self) -> &ContainerMetadata {
        &self.metadata
    }

    pub fn version(&self) -> ContainerVersion {
        self.metadata.version
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RawDataSource for ContainerSource {
    fn channel_count(&self) -> usize {
        self.metadata.channel_count
    }

    fn frame_count(&self) -> usize {
        self.metadata.frame_count
    }

    fn sampling_rate(&self) -> Option<f64> {
        Some(self.metadata.sampling_rate)
    }

    fn read_window(&self, t0: usize, t1: usize) -> Result<Window<'_>> {
        ProbeError::check_window(t0, t1, self.metadata.frame_count)?;
        let block = (self.read)(self, t0, t1)?;
        Ok(Window::from(block))
    }
}

// -- Read strategies --

fn read_frames_v100(src: &ContainerSource, t0: usize, t1: usize) -> Result<Array2<i16>> {
    src.raw
        .read_slice_2d::<i16, _>(s![t0..t1, ..])
        .map_err(|e| ProbeError::hdf5(&src.path, e))
}

fn read_interleaved_v101(src: &ContainerSource, t0: usize, t1: usize) -> Result<Array2<i16>> {
    let c = src.metadata.channel_count;
    let flat = src
        .raw
        .read_slice_1d::<i16, _>(s![t0 * c..t1 * c])
        .map_err(|e| ProbeError::hdf5(&src.path, e))?;
    flat.into_shape_with_order((t1 - t0, c))
        .map_err(|e| ProbeError::format(&src.path, e.to_string()))
}

// -- Metadata helpers --

fn read_scalar<T: H5Type + Copy>(file: &File, path: &Path, name: &str) -> Result<T> {
    let values = file
        .dataset(name)
        .and_then(|ds| ds.read_raw::<T>())
        .map_err(|e| ProbeError::hdf5(path, e))?;
    values
        .first()
        .copied()
        .ok_or_else(|| ProbeError::format(path, format!("{name} is empty")))
}

fn read_scalar_opt<T: H5Type + Copy>(file: &File, path: &Path, name: &str) -> Result<Option<T>> {
    if !file.link_exists(name) {
        return Ok(None);
    }
    read_scalar(file, path, name).map(Some)
}

fn read_channel_indices(file: &File, path: &Path) -> Result<Vec<usize>> {
    let n_cols = read_scalar::<u32>(file, path, N_COLS)? as usize;
    let coords = file
        .dataset(CHANNELS)
        .and_then(|ds| ds.read_raw::<ChannelCoord>())
        .map_err(|e| ProbeError::hdf5(path, e))?;
    coords
        .iter()
        .map(|c| {
            c.linear_index(n_cols).ok_or_else(|| {
                ProbeError::format(path, format!("channel ({}, {}) is not 1-based", c.row, c.col))
            })
        })
        .collect()
}
