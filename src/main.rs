use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mea_probe::{BioCam, CustomProbe, NeighborSource, NeuroPixel, Probe, ProbeProfile};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "mea-probe", version, about = "Inspect and window multi-electrode-array recordings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print probe geometry and recording dimensions.
    Info(ProbeArgs),
    /// Write frames [t0, t1) as CSV, one row per frame.
    Read {
        #[command(flatten)]
        probe: ProbeArgs,
        #[arg(long)]
        t0: usize,
        #[arg(long)]
        t1: usize,
        /// Output file (stdout when omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileKind {
    Neuropixel,
    Biocam,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Recording file (flat .bin or 3Brain .brw/.h5).
    data: PathBuf,
    /// Built-in probe profile.
    #[arg(long, value_enum, default_value_t = ProfileKind::Neuropixel)]
    profile: ProfileKind,
    /// JSON probe profile; overrides --profile.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Position file override.
    #[arg(long)]
    positions: Option<PathBuf>,
    /// Neighbor file override.
    #[arg(long, conflicts_with = "radius")]
    neighbors: Option<PathBuf>,
    /// Compute neighbors within this radius instead of loading a file.
    #[arg(long)]
    radius: Option<f64>,
    /// Sampling rate in Hz.
    #[arg(long)]
    fps: Option<f64>,
}

impl ProbeArgs {
    fn profile(&self) -> Result<ProbeProfile> {
        let mut profile = match &self.config {
            Some(path) => ProbeProfile::from_json_file(path)
                .with_context(|| format!("loading probe profile {}", path.display()))?,
            None => match self.profile {
                ProfileKind::Neuropixel => ProbeProfile::neuropixel(),
                ProfileKind::Biocam => ProbeProfile::biocam(),
            },
        };

        if let Some(positions) = &self.positions {
            profile.geometry.positions = positions.clone();
        }
        if let Some(neighbors) = &self.neighbors {
            profile.geometry.neighbors = Some(neighbors.clone());
            profile.geometry.radius = None;
        }
        if let Some(radius) = self.radius {
            profile.geometry.radius = Some(radius);
            profile.geometry.neighbors = None;
        }
        if let Some(fps) = self.fps {
            profile.constants.fps = fps;
        }
        Ok(profile)
    }

    fn open(&self) -> Result<Box<dyn Probe>> {
        let profile = self.profile()?;
        let probe: Box<dyn Probe> = match (&self.config, self.profile) {
            (Some(_), _) => Box::new(CustomProbe::open(&profile, &self.data)?),
            (None, ProfileKind::Neuropixel) => Box::new(NeuroPixel::from_profile(&profile, &self.data)?),
            (None, ProfileKind::Biocam) => Box::new(BioCam::from_profile(&profile, &self.data)?),
        };
        Ok(probe)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn info(args: &ProbeArgs) -> Result<()> {
    let probe = args
        .open()
        .with_context(|| format!("opening {}", args.data.display()))?;
    let descriptor = probe.descriptor();

    println!("probe:          {}", descriptor.name());
    println!("channels:       {}", probe.channel_count());
    println!("frames:         {}", probe.frame_count());
    if probe.fps() > 0.0 {
        println!("sampling rate:  {} Hz", probe.fps());
        println!("duration:       {:.3} s", probe.frame_count() as f64 / probe.fps());
    } else {
        println!("sampling rate:  unset");
    }
    match descriptor.geometry().neighbor_source() {
        NeighborSource::File(path) => println!("neighbors:      {}", path.display()),
        NeighborSource::Radius(r) => println!("neighbors:      radius {r}"),
    }
    println!("max neighbors:  {}", probe.max_neighbors());
    Ok(())
}

fn read(args: &ProbeArgs, t0: usize, t1: usize, output: Option<&PathBuf>) -> Result<()> {
    let probe = args
        .open()
        .with_context(|| format!("opening {}", args.data.display()))?;
    let window = probe
        .read(t0, t1)
        .with_context(|| format!("reading frames [{t0}, {t1})"))?;

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(sink);

    let header = std::iter::once("frame".to_string())
        .chain((0..window.ncols()).map(|ch| format!("ch{ch}")));
    writer.write_record(header)?;
    for (offset, row) in window.rows().into_iter().enumerate() {
        let record = std::iter::once((t0 + offset).to_string())
            .chain(row.iter().map(|v| v.to_string()));
        writer.write_record(record)?;
    }
    writer.flush()?;

    log::info!("wrote {} frames × {} channels", window.nrows(), window.ncols());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Info(args) => info(args),
        Command::Read {
            probe,
            t0,
            t1,
            output,
        } => read(probe, *t0, *t1, output.as_ref()),
    }
}
