mod common;

use mea_probe::{
    ChannelCount, CustomProbe, FlatBinarySource, GeometryConfig, NeuroPixel, Probe, ProbeDescriptor,
    ProbeError, ProbeProfile,
};
use ndarray::{s, Array2};
use tempfile::tempdir;

use common::{profile, synthetic_samples, write_flat, write_line_geometry, write_text};

const CHANNELS: usize = 12;
const FRAMES: usize = 40;

fn flat_probe(dir: &std::path::Path) -> (NeuroPixel, Array2<i16>) {
    let samples = synthetic_samples(FRAMES, CHANNELS);
    let data = dir.join("recording.bin");
    write_flat(&data, &samples);
    let geometry = write_line_geometry(dir, CHANNELS);
    let probe = NeuroPixel::from_profile(
        &profile("line12", ChannelCount::Fixed(CHANNELS), geometry),
        &data,
    )
    .unwrap();
    (probe, samples)
}

#[test]
fn full_read_is_channel_major_reshape() {
    let dir = tempdir().unwrap();
    let (probe, samples) = flat_probe(dir.path());

    assert_eq!(probe.frame_count(), FRAMES);
    assert_eq!(probe.channel_count(), CHANNELS);

    let window = probe.read(0, FRAMES).unwrap();
    assert_eq!(window.shape(), &[FRAMES, CHANNELS]);
    assert_eq!(window, samples);
}

#[test]
fn partial_window_matches_slice() {
    let dir = tempdir().unwrap();
    let (probe, samples) = flat_probe(dir.path());

    let window = probe.read(7, 19).unwrap();
    assert_eq!(window, samples.slice(s![7..19, ..]));
    assert!(window.is_view());

    let last = probe.read(FRAMES - 1, FRAMES).unwrap();
    assert_eq!(last.shape(), &[1, CHANNELS]);
}

#[test]
fn out_of_range_windows_fail() {
    let dir = tempdir().unwrap();
    let (probe, _) = flat_probe(dir.path());

    for (t0, t1) in [(FRAMES - 1, FRAMES + 1), (5, 5), (5, 3), (0, FRAMES + 1)] {
        let err = probe.read(t0, t1).unwrap_err();
        assert!(
            matches!(err, ProbeError::Range { frame_count, .. } if frame_count == FRAMES),
            "[{t0}, {t1}) gave {err}"
        );
    }
}

#[test]
fn neighbor_file_channel_count_must_match_recording() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("recording.bin");
    write_flat(&data, &synthetic_samples(FRAMES, 12));
    let geometry = write_line_geometry(dir.path(), 10);

    // through the profile: fixed count 12 against a 10-channel geometry
    let err = NeuroPixel::from_profile(&profile("np", ChannelCount::Fixed(12), geometry.clone()), &data)
        .unwrap_err();
    assert!(matches!(err, ProbeError::Consistency { .. }), "{err}");

    // directly: 10-channel neighbor graph against the 12-channel recording
    let descriptor =
        ProbeDescriptor::load(&profile("np", ChannelCount::Discovered, geometry)).unwrap();
    let source = FlatBinarySource::open(&data, 12).unwrap();
    let err = descriptor.check_source(&source).unwrap_err();
    assert!(
        matches!(
            err,
            ProbeError::Consistency {
                left_count: 10,
                right_count: 12,
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn recording_not_multiple_of_channels_is_format_error() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("recording.bin");
    write_flat(&data, &synthetic_samples(7, 5));
    let geometry = write_line_geometry(dir.path(), 12);

    let err = NeuroPixel::from_profile(&profile("np", ChannelCount::Fixed(12), geometry), &data)
        .unwrap_err();
    assert!(matches!(err, ProbeError::Format { .. }), "{err}");
}

#[test]
fn single_channel_round_trip() {
    let dir = tempdir().unwrap();
    let known: Vec<i16> = vec![3, -7, 1024, i16::MIN, i16::MAX, 0, 42, -1];
    let samples = Array2::from_shape_vec((known.len(), 1), known.clone()).unwrap();
    let data = dir.path().join("one.bin");
    write_flat(&data, &samples);

    let positions = dir.path().join("positions_one");
    let neighbors = dir.path().join("neighbors_one");
    write_text(&positions, "0,0\n");
    write_text(&neighbors, "0\n");

    let probe = NeuroPixel::from_profile(
        &profile(
            "one",
            ChannelCount::Fixed(1),
            GeometryConfig::with_neighbor_file(positions, neighbors),
        ),
        &data,
    )
    .unwrap();

    assert_eq!(probe.max_neighbors(), 1);
    let window = probe.read(0, known.len()).unwrap();
    assert_eq!(window.iter().copied().collect::<Vec<_>>(), known);
}

#[test]
fn radius_geometry_replaces_neighbor_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("recording.bin");
    write_flat(&data, &synthetic_samples(FRAMES, CHANNELS));
    let from_file = write_line_geometry(dir.path(), CHANNELS);
    let geometry = GeometryConfig::with_radius(from_file.positions.clone(), 20.0);

    let probe =
        NeuroPixel::from_profile(&profile("radius", ChannelCount::Fixed(CHANNELS), geometry), &data)
            .unwrap();
    // 10 µm pitch, radius 20: two contacts either side
    assert_eq!(probe.max_neighbors(), 5);
    assert!(probe.neighbors().contains(0, 2));
    assert!(!probe.neighbors().contains(0, 3));
}

#[test]
fn missing_neighbor_source_is_configuration_error() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("recording.bin");
    write_flat(&data, &synthetic_samples(FRAMES, CHANNELS));
    let mut geometry = write_line_geometry(dir.path(), CHANNELS);
    geometry.neighbors = None;

    let err = NeuroPixel::from_profile(&profile("np", ChannelCount::Fixed(CHANNELS), geometry), &data)
        .unwrap_err();
    assert!(matches!(err, ProbeError::Configuration(_)), "{err}");
}

#[test]
fn flat_profile_needs_fixed_channels() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("recording.bin");
    write_flat(&data, &synthetic_samples(FRAMES, CHANNELS));
    let geometry = write_line_geometry(dir.path(), CHANNELS);

    let err = NeuroPixel::from_profile(&profile("np", ChannelCount::Discovered, geometry), &data)
        .unwrap_err();
    assert!(matches!(err, ProbeError::Configuration(_)), "{err}");
}

#[test]
fn builtin_neuropixel_keeps_caller_rate() {
    let np = ProbeProfile::neuropixel().with_fps(25_000.0);
    assert_eq!(np.constants.fps, 25_000.0);
    assert_eq!(np.constants.fixed_channels(), Some(385));
}

#[test]
fn custom_probe_from_json_reads_flat_recording() {
    let dir = tempdir().unwrap();
    let samples = synthetic_samples(FRAMES, CHANNELS);
    let data = dir.path().join("recording.dat");
    write_flat(&data, &samples);

    let geometry = write_line_geometry(dir.path(), CHANNELS);
    let mut custom = profile("custom", ChannelCount::Fixed(CHANNELS), geometry);
    custom.constants.fps = 20_000.0;
    let config = dir.path().join("profile.json");
    write_text(&config, &serde_json::to_string_pretty(&custom).unwrap());

    let loaded = ProbeProfile::from_json_file(&config).unwrap();
    assert_eq!(loaded, custom);

    let probe = CustomProbe::open(&loaded, &data).unwrap();
    assert_eq!(probe.fps(), 20_000.0);
    assert_eq!(probe.descriptor().name(), "custom");
    assert_eq!(probe.read(3, 9).unwrap(), samples.slice(s![3..9, ..]));

    let debug = format!("{probe:?}");
    assert!(debug.starts_with("CustomProbe"), "{debug}");
    assert!(debug.contains("frames: 40"), "{debug}");
}
