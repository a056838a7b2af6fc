use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

// ---------------------------------------------------------------------------
// ProbeError – every failure the probe layer can report
// ---------------------------------------------------------------------------

/// Errors raised while building a probe or reading from it.
///
/// None of these are retried internally and no operation returns partial data
/// alongside an error.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Neighbor source or profile constants cannot be resolved.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A geometry file or recording does not have the expected layout.
    #[error("format error in {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Two independently authored inputs disagree on the channel count.
    #[error("channel count mismatch: {left} has {left_count} channels, {right} has {right_count}")]
    Consistency {
        left: &'static str,
        left_count: usize,
        right: &'static str,
        right_count: usize,
    },

    /// A window outside `[0, frame_count)` or with `t1 <= t0`.
    #[error("window [{t0}, {t1}) is outside the recording (frame count {frame_count})")]
    Range {
        t0: usize,
        t1: usize,
        frame_count: usize,
    },

    /// `read` called on a probe with no bound data source.
    #[error("read is not implemented for probe '{probe}'")]
    Invocation { probe: String },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hdf5 error on {}: {source}", path.display())]
    Hdf5 {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },
}

impl ProbeError {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ProbeError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProbeError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn hdf5(path: impl Into<PathBuf>, source: hdf5::Error) -> Self {
        ProbeError::Hdf5 {
            path: path.into(),
            source,
        }
    }

    /// Check the shared window contract: `t0 < t1 <= frame_count`.
    pub(crate) fn check_window(t0: usize, t1: usize, frame_count: usize) -> Result<()> {
        if t0 >= t1 || t1 > frame_count {
            return Err(ProbeError::Range {
                t0,
                t1,
                frame_count,
            });
        }
        Ok(())
    }
}
