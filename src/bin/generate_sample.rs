use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use mea_probe::{
    ChannelCoord, ChannelCount, ContainerVersion, GeometryConfig, Position, ProbeGeometry,
    ProbeProfile, ProfileConstants,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Write a small synthetic probe and one recording in every supported layout.
#[derive(Parser, Debug)]
struct Args {
    /// Output directory.
    #[arg(long, default_value = "sample_probe")]
    out: PathBuf,
    #[arg(long, default_value_t = 8)]
    cols: usize,
    #[arg(long, default_value_t = 8)]
    rows: usize,
    /// Electrode pitch in µm.
    #[arg(long, default_value_t = 42)]
    pitch: i64,
    /// Neighborhood radius used for the neighbor file.
    #[arg(long, default_value_t = 60.0)]
    radius: f64,
    #[arg(long, default_value_t = 20_000)]
    frames: usize,
    #[arg(long, default_value_t = 17_855.0)]
    fps: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn spike_waveform(t: f64, amplitude: f64) -> f64 {
    let trough = -amplitude * (-(t * t) / (2.0 * 1.5f64.powi(2))).exp();
    let rebound = 0.3 * amplitude * (-(t - 6.0).powi(2) / (2.0 * 4.0f64.powi(2))).exp();
    trough + rebound
}

/// Gaussian background noise plus spikes spread over each spiking
/// channel's neighborhood, decaying with distance.
fn synthesize(geometry: &ProbeGeometry, args: &Args, rng: &mut StdRng) -> Result<Array2<i16>> {
    let channels = geometry.num_recording_channels();
    let noise = Normal::new(0.0, 12.0)?;

    let mut data = Array2::<f64>::zeros((args.frames, channels));
    data.mapv_inplace(|_| noise.sample(rng));

    let n_spikes = args.frames / 200;
    for _ in 0..n_spikes {
        let centre = rng.gen_range(0..channels);
        let t_peak = rng.gen_range(10..args.frames - 30) as i64;
        let amplitude = rng.gen_range(80.0..300.0);
        let origin = geometry.positions()[centre];

        for &ch in geometry.neighbors().neighbors(centre).into_iter().flatten() {
            let d = origin.distance(&geometry.positions()[ch]);
            let scaled = amplitude * (-d / args.radius).exp();
            for dt in -5..25_i64 {
                let t = (t_peak + dt) as usize;
                data[[t, ch]] += spike_waveform(dt as f64, scaled);
            }
        }
    }

    Ok(data.mapv(|v| v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16))
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_lines<I, L>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = L>,
    L: std::fmt::Display,
{
    let mut out = BufWriter::new(File::create(path).with_context(|| path.display().to_string())?);
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

fn write_flat(path: &Path, samples: &Array2<i16>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for v in samples.iter() {
        out.write_all(&v.to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

fn write_container(
    path: &Path,
    version: ContainerVersion,
    samples: &Array2<i16>,
    args: &Args,
) -> Result<()> {
    let file = hdf5::File::create(path)?;

    let data = file.create_group("3BData")?;
    data.new_attr::<i64>()
        .create("Version")?
        .write_scalar(&version.number())?;
    match version {
        ContainerVersion::V100 => {
            data.new_dataset_builder().with_data(samples).create("Raw")?;
        }
        ContainerVersion::V101 => {
            let interleaved: Vec<i16> = samples.iter().copied().collect();
            data.new_dataset_builder()
                .with_data(&interleaved[..])
                .create("Raw")?;
        }
    }

    let info = file.create_group("3BRecInfo")?;
    let vars = info.create_group("3BRecVars")?;
    vars.new_dataset_builder()
        .with_data(&[samples.nrows() as i64][..])
        .create("NRecFrames")?;
    vars.new_dataset_builder()
        .with_data(&[args.fps][..])
        .create("SamplingRate")?;
    vars.new_dataset_builder()
        .with_data(&[1.0f64][..])
        .create("SignalInversion")?;
    vars.new_dataset_builder()
        .with_data(&[12u8][..])
        .create("BitDepth")?;
    vars.new_dataset_builder()
        .with_data(&[4125.0f64][..])
        .create("MaxVolt")?;
    vars.new_dataset_builder()
        .with_data(&[-4125.0f64][..])
        .create("MinVolt")?;

    let chip = info.create_group("3BMeaChip")?;
    chip.new_dataset_builder()
        .with_data(&[args.cols as u32][..])
        .create("NCols")?;

    let chs: Vec<ChannelCoord> = (0..samples.ncols())
        .map(|i| ChannelCoord {
            row: (i / args.cols + 1) as i16,
            col: (i % args.cols + 1) as i16,
        })
        .collect();
    info.create_group("3BMeaStreams")?
        .create_group("Raw")?
        .new_dataset_builder()
        .with_data(&chs[..])
        .create("Chs")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.frames >= 100, "need at least 100 frames, got {}", args.frames);
    ensure!(args.cols > 0 && args.rows > 0, "grid must have at least one electrode");

    fs::create_dir_all(&args.out).with_context(|| args.out.display().to_string())?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let positions: Vec<Position> = (0..args.rows * args.cols)
        .map(|i| {
            let col = (i % args.cols) as i64;
            let row = (i / args.cols) as i64;
            Position::new(col * args.pitch, row * args.pitch)
        })
        .collect();
    let geometry = ProbeGeometry::from_positions(positions, args.radius)?;

    let positions_path = args.out.join("positions");
    let neighbors_path = args.out.join("neighbormatrix");
    write_lines(
        &positions_path,
        geometry.positions().iter().map(|p| format!("{},{},", p.x, p.y)),
    )?;
    write_lines(
        &neighbors_path,
        geometry.neighbors().iter().map(|(_, set)| {
            set.iter().map(|ch| format!("{ch},")).collect::<String>()
        }),
    )?;

    let samples = synthesize(&geometry, &args, &mut rng)?;
    write_flat(&args.out.join("recording.bin"), &samples)?;
    write_container(&args.out.join("recording_v100.brw"), ContainerVersion::V100, &samples, &args)?;
    write_container(&args.out.join("recording_v101.brw"), ContainerVersion::V101, &samples, &args)?;

    let profile = ProbeProfile {
        name: "sample".to_string(),
        constants: ProfileConstants {
            channels: ChannelCount::Fixed(geometry.num_recording_channels()),
            spike_delay: 5,
            spike_peak_duration: 5,
            noise_duration: 2,
            noise_amp_percent: 0.95,
            fps: args.fps,
        },
        geometry: GeometryConfig::with_neighbor_file(positions_path, neighbors_path),
    };
    let profile_path = args.out.join("profile.json");
    serde_json::to_writer_pretty(File::create(&profile_path)?, &profile)?;

    println!(
        "Wrote {} channels × {} frames (max {} neighbors) to {}",
        geometry.num_recording_channels(),
        args.frames,
        geometry.max_neighbors(),
        args.out.display()
    );
    Ok(())
}
