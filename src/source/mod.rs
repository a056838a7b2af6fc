/// Raw-data layer: read-only windowed access to recorded samples.
///
/// Architecture:
/// ```text
///  .bin / .raw / …            .brw / .h5 / .hdf5
///        │                           │
///        ▼                           ▼
///   ┌──────────────────┐      ┌─────────────────┐
///   │ FlatBinarySource │      │ ContainerSource │  version 100 │ 101 bound at open
///   └──────────────────┘      └─────────────────┘
///        │                           │
///        └─────────────┬─────────────┘
///                      ▼
///          read_window(t0, t1) → Window  (frames × channels, i16)
/// ```

pub mod container;
pub mod flat;

use std::path::Path;

use ndarray::{CowArray, Ix2};

pub use container::{ChannelCoord, ContainerMetadata, ContainerSource, ContainerVersion};
pub use flat::FlatBinarySource;

use crate::error::{ProbeError, Result};

/// A `(t1 - t0) × channel_count` block of samples. Borrowed straight from
/// the mapping where the layout allows it, otherwise a copy of exactly the
/// requested frames.
pub type Window<'a> = CowArray<'a, i16, Ix2>;

/// Read-only accessor over one recording.
pub trait RawDataSource {
    fn channel_count(&self) -> usize;

    fn frame_count(&self) -> usize;

    /// Sampling rate stored with the recording, if the layout carries one.
    fn sampling_rate(&self) -> Option<f64> {
        None
    }

    /// Frames `[t0, t1)` for every channel. Requires
    /// `t0 < t1 <= frame_count`; anything else is a range error.
    fn read_window(&self, t0: usize, t1: usize) -> Result<Window<'_>>;
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Open a recording of unknown layout. Dispatch by extension.
///
/// Supported formats:
/// * `.brw` / `.h5` / `.hdf5` – 3Brain container, channel count read from it
/// * anything else – headerless interleaved `i16`, `channels` required
pub fn open_source(path: &Path, channels: Option<usize>) -> Result<Box<dyn RawDataSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "brw" | "h5" | "hdf5" => Ok(Box::new(ContainerSource::open(path)?)),
        _ => {
            let channels = channels.ok_or_else(|| {
                ProbeError::Configuration(format!(
                    "{} looks like a flat recording; its channel count must be given",
                    path.display()
                ))
            })?;
            Ok(Box::new(FlatBinarySource::open(path, channels)?))
        }
    }
}
