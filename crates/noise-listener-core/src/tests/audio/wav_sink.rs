use crate::{
    AudioFormat, AudioSink, Episode, WAV_EXTENSION, WavFileSink, episode_file_name,
    tests::audio::support::{loud, quiet},
};

use chrono::{Local, TimeZone};

/// WHAT: Episode file names follow YYYY-MM-DD_HHMMSS.ext
/// WHY: One timestamp-named file per episode
#[test]
fn given_local_time_when_naming_episode_then_timestamp_format() {
    // Given: A fixed local time
    let at = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();

    // When: Building the file name
    let name = episode_file_name(&at, WAV_EXTENSION);

    // Then: Zero-padded date, underscore, compact time
    assert_eq!(name, "2024-03-05_070809.wav");
}

/// WHAT: Persisted episode round-trips through hound
/// WHY: The WAV header must match the stream and samples must be in order
#[test]
fn given_episode_when_persisting_then_wav_has_format_and_samples() {
    // Given: A sink in a scratch directory and a three-block episode
    let dir = tempfile::tempdir().unwrap();
    let mut sink = WavFileSink::new(dir.path().join("recordings"));
    let blocks = vec![quiet(1), loud(2), quiet(3)];
    let expected: Vec<i16> = blocks.iter().flat_map(|b| b.samples()).collect();
    let episode = Episode::with_preroll(blocks);
    let format = AudioFormat::pcm16(16_000, 2);

    // When: Persisting
    let path = sink.persist(episode, format).unwrap();

    // Then: File exists in the output dir with the stream's header and samples
    assert!(path.starts_with(dir.path().join("recordings")));
    assert_eq!(
        path.extension().and_then(|e| e.to_str()),
        Some(WAV_EXTENSION)
    );

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, expected);
}

/// WHAT: Name collisions get a numeric suffix
/// WHY: Two episodes stopping in the same second must not overwrite each other
#[test]
fn given_existing_file_when_choosing_path_then_suffix_added() {
    // Given: A file already occupying the timestamp name
    let dir = tempfile::tempdir().unwrap();
    let sink = WavFileSink::new(dir.path());
    let at = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
    std::fs::write(dir.path().join("2024-03-05_070809.wav"), b"taken").unwrap();

    // When: Choosing a path for the same second
    let path = sink.path_for(&at);

    // Then: The first free suffix is used
    assert_eq!(path, dir.path().join("2024-03-05_070809-1.wav"));
}

/// WHAT: Reserving claims the file before anything is written
/// WHY: Deferred writers must not be handed a name another episode already holds
#[test]
fn given_same_second_when_reserving_twice_then_distinct_files_created() {
    // Given: A sink whose output directory does not exist yet
    let dir = tempfile::tempdir().unwrap();
    let sink = WavFileSink::new(dir.path().join("recordings"));
    let at = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();

    // When: Reserving twice for the same second without writing
    let first = sink.reserve_path_for(&at).unwrap();
    let second = sink.reserve_path_for(&at).unwrap();

    // Then: Timestamp name, then the first suffix, both already on disk
    assert_eq!(first, dir.path().join("recordings/2024-03-05_070809.wav"));
    assert_eq!(second, dir.path().join("recordings/2024-03-05_070809-1.wav"));
    assert!(first.exists());
    assert!(second.exists());
}

/// WHAT: Unwritable output directory yields a Persist error
/// WHY: Sink failures must surface so the listener can report them
#[test]
fn given_output_dir_is_a_file_when_persisting_then_persist_error() {
    // Given: An "output directory" that is actually a regular file
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();
    let mut sink = WavFileSink::new(&blocker);

    // When: Persisting
    let result = sink.persist(
        Episode::with_preroll(vec![quiet(1)]),
        AudioFormat::pcm16(16_000, 1),
    );

    // Then: Persist error
    assert!(matches!(result, Err(crate::ListenerError::Persist { .. })));
}
