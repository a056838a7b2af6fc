#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use mea_probe::{ChannelCoord, ChannelCount, GeometryConfig, ProbeProfile, ProfileConstants};
use ndarray::Array2;

/// `frames × channels` block; cells are distinct for up to 100 channels and
/// 300 frames, and odd frames are negative.
pub fn synthetic_samples(frames: usize, channels: usize) -> Array2<i16> {
    Array2::from_shape_fn((frames, channels), |(t, c)| {
        let v = (t * 100 + c) as i32;
        (if t % 2 == 1 { -v } else { v }) as i16
    })
}

pub fn write_text(path: &Path, text: &str) {
    let mut file = File::create(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

pub fn write_flat(path: &Path, samples: &Array2<i16>) {
    let mut file = File::create(path).unwrap();
    for v in samples.iter() {
        file.write_all(&v.to_le_bytes()).unwrap();
    }
}

/// Single-row probe at 10 µm pitch. Each channel neighbors itself and
/// the contacts on either side.
pub fn write_line_geometry(dir: &Path, channels: usize) -> GeometryConfig {
    let positions: String = (0..channels).map(|i| format!("{},0\n", i * 10)).collect();
    let neighbors: String = (0..channels)
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(channels - 1);
            let ids: Vec<String> = (lo..=hi).map(|n| n.to_string()).collect();
            format!("{},\n", ids.join(","))
        })
        .collect();

    let positions_path = dir.join(format!("positions_{channels}"));
    let neighbors_path = dir.join(format!("neighbors_{channels}"));
    write_text(&positions_path, &positions);
    write_text(&neighbors_path, &neighbors);
    GeometryConfig::with_neighbor_file(positions_path, neighbors_path)
}

pub fn profile(name: &str, channels: ChannelCount, geometry: GeometryConfig) -> ProbeProfile {
    ProbeProfile {
        name: name.to_string(),
        constants: ProfileConstants {
            channels,
            spike_delay: 5,
            spike_peak_duration: 5,
            noise_duration: 2,
            noise_amp_percent: 0.95,
            fps: 0.0,
        },
        geometry,
    }
}

/// Write a 3Brain container. Versions other than 100 use the interleaved
/// 1-D layout.
pub fn write_container(path: &Path, version: i64, samples: &Array2<i16>, fps: f64) -> PathBuf {
    let file = hdf5::File::create(path).unwrap();

    let data = file.create_group("3BData").unwrap();
    data.new_attr::<i64>()
        .create("Version")
        .unwrap()
        .write_scalar(&version)
        .unwrap();
    if version == 100 {
        data.new_dataset_builder()
            .with_data(samples)
            .create("Raw")
            .unwrap();
    } else {
        let interleaved: Vec<i16> = samples.iter().copied().collect();
        data.new_dataset_builder()
            .with_data(&interleaved[..])
            .create("Raw")
            .unwrap();
    }

    let info = file.create_group("3BRecInfo").unwrap();
    let vars = info.create_group("3BRecVars").unwrap();
    vars.new_dataset_builder()
        .with_data(&[samples.nrows() as i64][..])
        .create("NRecFrames")
        .unwrap();
    vars.new_dataset_builder()
        .with_data(&[fps][..])
        .create("SamplingRate")
        .unwrap();
    vars.new_dataset_builder()
        .with_data(&[-1.0f64][..])
        .create("SignalInversion")
        .unwrap();

    let n_cols = samples.ncols();
    info.create_group("3BMeaChip")
        .unwrap()
        .new_dataset_builder()
        .with_data(&[n_cols as u32][..])
        .create("NCols")
        .unwrap();

    let chs: Vec<ChannelCoord> = (0..n_cols)
        .map(|i| ChannelCoord {
            row: 1,
            col: (i + 1) as i16,
        })
        .collect();
    info.create_group("3BMeaStreams")
        .unwrap()
        .create_group("Raw")
        .unwrap()
        .new_dataset_builder()
        .with_data(&chs[..])
        .create("Chs")
        .unwrap();

    path.to_path_buf()
}
