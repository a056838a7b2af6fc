use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use ndarray::ArrayView2;

use super::{RawDataSource, Window};
use crate::error::{ProbeError, Result};

const SAMPLE_BYTES: usize = std::mem::size_of::<i16>();

// ---------------------------------------------------------------------------
// FlatBinarySource – memory-mapped interleaved i16 stream
// ---------------------------------------------------------------------------

/// Headerless recording of little-endian `i16` samples, frame after frame,
/// each frame holding channels `0..C` in order.
///
/// Windows borrow directly from the read-only mapping.
#[derive(Debug)]
pub struct FlatBinarySource {
    path: PathBuf,
    mmap: Mmap,
    channel_count: usize,
    frame_count: usize,
}

impl FlatBinarySource {
    pub fn open(path: &Path, channel_count: usize) -> Result<Self> {
        if channel_count == 0 {
            return Err(ProbeError::Configuration(
                "flat recording needs a positive channel count".to_string(),
            ));
        }

        let file = File::open(path).map_err(|e| ProbeError::io(path, e))?;
        // SAFETY: the mapping is read-only; the recording must not be
        // truncated by another process while this source is alive.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ProbeError::io(path, e))?;

        if mmap.len() % SAMPLE_BYTES != 0 {
            return Err(ProbeError::format(
                path,
                format!("{} bytes is not a whole number of 16-bit samples", mmap.len()),
            ));
        }
        let total_samples = mmap.len() / SAMPLE_BYTES;
        if total_samples % channel_count != 0 {
            return Err(ProbeError::format(
                path,
                format!("{total_samples} samples is not a multiple of {channel_count} channels"),
            ));
        }

        let source = FlatBinarySource {
            path: path.to_path_buf(),
            mmap,
            channel_count,
            frame_count: total_samples / channel_count,
        };
        // surface alignment problems at open rather than on first read
        source.samples()?;

        log::debug!(
            "mapped {}: {} channels, {} frames",
            path.display(),
            channel_count,
            source.frame_count
        );
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn samples(&self) -> Result<&[i16]> {
        if self.mmap.is_empty() {
            return Ok(&[]);
        }
        bytemuck::try_cast_slice(&self.mmap[..])
            .map_err(|e| ProbeError::format(&self.path, format!("cannot view mapping as i16: {e}")))
    }
}

impl RawDataSource for FlatBinarySource {
    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_window(&self, t0: usize, t1: usize) -> Result<Window<'_>> {
        ProbeError::check_window(t0, t1, self.frame_count)?;
        let c = self.channel_count;
        let samples = &self.samples()?[t0 * c..t1 * c];
        let view = ArrayView2::from_shape((t1 - t0, c), samples)
            .map_err(|e| ProbeError::format(&self.path, e.to_string()))?;
        Ok(Window::from(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_samples(samples: &[i16]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for s in samples {
            file.write_all(&s.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn window_is_frame_major_reshape() {
        // 3 channels, 4 frames: value = 10 * frame + channel
        let samples: Vec<i16> = (0..4)
            .flat_map(|t| (0..3).map(move |c| 10 * t + c))
            .collect();
        let file = write_samples(&samples);
        let source = FlatBinarySource::open(file.path(), 3).unwrap();
        assert_eq!(source.frame_count(), 4);
        assert_eq!(source.channel_count(), 3);

        let window = source.read_window(1, 3).unwrap();
        assert_eq!(window.shape(), &[2, 3]);
        assert_eq!(window[[0, 0]], 10);
        assert_eq!(window[[1, 2]], 22);
        assert!(window.is_view());
    }

    #[test]
    fn negative_samples_survive() {
        let file = write_samples(&[-32768, 32767, -1, 0]);
        let source = FlatBinarySource::open(file.path(), 2).unwrap();
        let window = source.read_window(0, 2).unwrap();
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![-32768, 32767, -1, 0]);
    }

    #[test]
    fn sample_count_must_divide_by_channels() {
        let file = write_samples(&[0; 10]);
        let err = FlatBinarySource::open(file.path(), 3).unwrap_err();
        assert!(matches!(err, ProbeError::Format { .. }), "{err}");
    }

    #[test]
    fn odd_byte_length_is_format_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3]).unwrap();
        file.flush().unwrap();
        assert!(matches!(
            FlatBinarySource::open(file.path(), 1),
            Err(ProbeError::Format { .. })
        ));
    }

    #[test]
    fn zero_channels_is_configuration_error() {
        let file = write_samples(&[0; 4]);
        assert!(matches!(
            FlatBinarySource::open(file.path(), 0),
            Err(ProbeError::Configuration(_))
        ));
    }

    #[test]
    fn empty_recording_rejects_every_window() {
        let file = NamedTempFile::new().unwrap();
        let source = FlatBinarySource::open(file.path(), 4).unwrap();
        assert_eq!(source.frame_count(), 0);
        assert!(matches!(
            source.read_window(0, 1),
            Err(ProbeError::Range { .. })
        ));
    }
}
