use crate::{
    AudioBlock, AudioFormat, DetectionConfig, ListenerEvent, NoiseListener, RecordingState,
    tests::audio::support::{
        CollectingSink, FailingSink, ScriptedSource, acquisition_error, loud, quiet,
    },
};

use std::time::Duration;

const IDLE_THRESHOLD: f64 = 0.005;
const RECORDING_THRESHOLD: f64 = 0.004;
const PREROLL_BLOCKS: usize = 4;
const TIMEOUT_BLOCKS: u32 = 3;
const MAX_TAP_BLOCKS: u32 = 3;

fn test_config() -> DetectionConfig {
    DetectionConfig {
        format: AudioFormat::pcm16(16_000, 1),
        block_duration: Duration::from_millis(50),
        initial_threshold: IDLE_THRESHOLD,
        recording_threshold: RECORDING_THRESHOLD,
        oversensitive_blocks: 300,
        undersensitive_blocks: 2400,
        max_tap_blocks: MAX_TAP_BLOCKS,
        preroll_capacity_blocks: PREROLL_BLOCKS,
        recording_quiet_timeout_blocks: TIMEOUT_BLOCKS,
        auto_adjust: false,
    }
}

fn listener() -> NoiseListener<CollectingSink> {
    NoiseListener::new(test_config(), CollectingSink::default()).unwrap()
}

fn feed<S: crate::AudioSink>(
    listener: &mut NoiseListener<S>,
    blocks: impl IntoIterator<Item = AudioBlock>,
) -> Vec<ListenerEvent> {
    blocks
        .into_iter()
        .flat_map(|block| listener.on_block(block))
        .collect()
}

fn taps(events: &[ListenerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ListenerEvent::TapDetected { .. }))
        .count()
}

/// WHAT: First noisy block starts an episode seeded with pre-roll
/// WHY: Recording begins immediately; the trigger block arrives via pre-roll
#[test]
fn given_idle_when_first_noisy_block_then_episode_started_with_preroll() {
    // Given: An idle listener that has heard two quiet blocks
    let mut listener = listener();
    feed(&mut listener, [quiet(1), quiet(2)]);

    // When: A loud block arrives
    let events = listener.on_block(loud(1));

    // Then: Recording starts with three pre-roll blocks and a lowered threshold
    assert!(matches!(
        events.as_slice(),
        [ListenerEvent::EpisodeStarted {
            preroll_blocks: 3,
            ..
        }]
    ));
    assert!(listener.is_recording());
    assert_eq!(listener.current_threshold().value(), RECORDING_THRESHOLD);
    let RecordingState::Recording(episode) = listener.state() else {
        unreachable!("listener reported recording");
    };
    assert_eq!(episode.blocks(), &[quiet(1), quiet(2), loud(1)]);
}

/// WHAT: Short burst yields a tap and, after the timeout, a saved episode
/// WHY: Recording is never deferred; tap classification happens afterwards
#[test]
fn given_short_burst_when_quiet_follows_then_tap_and_episode_saved() {
    // Given: Two quiet blocks then a two-block burst
    let mut listener = listener();
    let mut events = feed(&mut listener, [quiet(1), quiet(2), loud(1), loud(2)]);

    // When: Enough quiet blocks arrive to exceed the timeout
    events.extend(feed(
        &mut listener,
        (3..=3 + TIMEOUT_BLOCKS as i16).map(quiet),
    ));

    // Then: Exactly one tap and exactly one persisted episode
    assert_eq!(taps(&events), 1);
    assert!(events.iter().any(|e| matches!(
        e,
        ListenerEvent::TapDetected {
            noisy_blocks: 2,
            ..
        }
    )));
    assert_eq!(listener.sink().episodes.len(), 1);
    assert!(!listener.is_recording());

    let (episode, _) = &listener.sink().episodes[0];
    assert_eq!(
        episode.blocks(),
        &[
            quiet(1),
            quiet(2),
            loud(1),
            loud(2),
            quiet(3),
            quiet(4),
            quiet(5),
            quiet(6)
        ]
    );
}

/// WHAT: Tap is reported on the first quiet block only
/// WHY: The noisy run is cleared once it has been classified
#[test]
fn given_tap_reported_when_more_quiet_blocks_then_no_second_tap() {
    // Given: A one-block burst followed by a quiet block
    let mut listener = listener();
    let first = feed(&mut listener, [loud(1), quiet(1)]);

    // When: More quiet blocks arrive
    let rest = feed(&mut listener, [quiet(2), quiet(3)]);

    // Then: Only the first quiet block produced a tap
    assert_eq!(taps(&first), 1);
    assert_eq!(taps(&rest), 0);
}

/// WHAT: Sustained noise records pre-roll plus every block while recording
/// WHY: The saved file must contain the context before and the quiet tail after
#[test]
fn given_sustained_noise_when_timeout_elapses_then_single_episode_without_tap() {
    // Given: Six quiet blocks, so the four-slot ring has wrapped
    let mut listener = listener();
    let mut events = feed(&mut listener, (1..=6).map(quiet));

    // When: Five loud blocks then four quiet blocks
    events.extend(feed(&mut listener, (1..=5).map(loud)));
    events.extend(feed(&mut listener, (11..=14).map(quiet)));

    // Then: No tap, one episode: last three quiet + trigger, the rest, the tail
    assert_eq!(taps(&events), 0);
    assert_eq!(listener.sink().episodes.len(), 1);

    let (episode, format) = &listener.sink().episodes[0];
    assert_eq!(*format, AudioFormat::pcm16(16_000, 1));
    assert_eq!(episode.preroll_blocks(), PREROLL_BLOCKS);

    let mut expected = vec![quiet(4), quiet(5), quiet(6)];
    expected.extend((1..=5).map(loud));
    expected.extend((11..=14).map(quiet));
    assert_eq!(episode.blocks(), expected.as_slice());
}

/// WHAT: Recording stops only after the timeout is exceeded
/// WHY: The comparison is strictly greater than the configured count
#[test]
fn given_recording_when_exactly_timeout_quiet_blocks_then_still_recording() {
    // Given: A recording episode
    let mut listener = listener();
    listener.on_block(loud(1));

    // When: Exactly TIMEOUT_BLOCKS quiet blocks
    feed(&mut listener, (1..=TIMEOUT_BLOCKS as i16).map(quiet));

    // Then: Still recording; one more quiet block stops it
    assert!(listener.is_recording());
    let events = listener.on_block(quiet(99));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ListenerEvent::EpisodeSaved { .. }))
    );
    assert!(!listener.is_recording());
}

/// WHAT: A noisy block during the quiet tail keeps the episode open
/// WHY: The in-episode quiet counter restarts on every noisy block
#[test]
fn given_recording_when_noise_interrupts_quiet_tail_then_timeout_restarts() {
    // Given: A recording with a quiet tail one block short of stopping
    let mut listener = listener();
    listener.on_block(loud(1));
    feed(&mut listener, (1..=TIMEOUT_BLOCKS as i16).map(quiet));

    // When: Noise returns, then TIMEOUT_BLOCKS more quiet blocks
    listener.on_block(loud(2));
    feed(&mut listener, (10..10 + TIMEOUT_BLOCKS as i16).map(quiet));

    // Then: Still recording, nothing persisted
    assert!(listener.is_recording());
    assert!(listener.sink().episodes.is_empty());
}

/// WHAT: Threshold drops while recording and is restored afterwards
/// WHY: Hysteresis keeps quieter tails inside the episode
#[test]
fn given_episode_when_stopped_then_idle_threshold_restored() {
    // Given: An episode in progress
    let mut listener = listener();
    listener.on_block(loud(1));
    assert_eq!(listener.current_threshold().value(), RECORDING_THRESHOLD);

    // When: The episode times out
    feed(&mut listener, (1..=TIMEOUT_BLOCKS as i16 + 1).map(quiet));

    // Then: Idle threshold is back
    assert_eq!(listener.current_threshold().value(), IDLE_THRESHOLD);
}

/// WHAT: stop_episode while idle does nothing
/// WHY: The operation must be safe to call directly
#[test]
fn given_idle_when_stopping_episode_then_no_op() {
    // Given: An idle listener
    let mut listener = listener();

    // When: Stopping twice
    let first = listener.stop_episode();
    let second = listener.stop_episode();

    // Then: No events, nothing persisted, threshold unchanged
    assert!(first.is_none());
    assert!(second.is_none());
    assert!(listener.sink().episodes.is_empty());
    assert_eq!(listener.current_threshold().value(), IDLE_THRESHOLD);
}

/// WHAT: Sink failure still returns the listener to idle
/// WHY: A failed write must not wedge the loop or keep the episode
#[test]
fn given_failing_sink_when_episode_stops_then_idle_and_failure_reported() {
    // Given: A listener whose sink always fails, mid-episode
    let mut listener = NoiseListener::new(test_config(), FailingSink::default()).unwrap();
    listener.on_block(loud(1));

    // When: The episode times out
    let events = feed(&mut listener, (1..=TIMEOUT_BLOCKS as i16 + 1).map(quiet));

    // Then: Failure event, idle state, restored threshold
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ListenerEvent::EpisodePersistFailed { .. }))
    );
    assert!(!listener.is_recording());
    assert_eq!(listener.sink().attempts, 1);
    assert_eq!(listener.stats().episodes_failed, 1);
    assert_eq!(listener.current_threshold().value(), IDLE_THRESHOLD);

    // And: The next noisy block starts a fresh episode
    listener.on_block(loud(2));
    assert!(listener.is_recording());
}

/// WHAT: Acquisition errors are counted and listening continues
/// WHY: Transient driver failures are not fatal
#[test]
fn given_read_failure_when_listening_then_counted_and_next_read_processed() {
    // Given: A source that fails once, then delivers a loud block
    let mut listener = listener();
    let mut source = ScriptedSource::new(vec![acquisition_error(), Ok(loud(1))]);

    // When: Listening twice
    let first = listener.listen(&mut source);
    let second = listener.listen(&mut source);

    // Then: Error reported, then normal classification resumes
    assert_eq!(
        first,
        vec![ListenerEvent::AcquisitionFailed { error_count: 1 }]
    );
    assert!(matches!(
        second.as_slice(),
        [ListenerEvent::EpisodeStarted { .. }]
    ));
    assert_eq!(listener.stats().acquisition_errors, 1);
    assert_eq!(listener.stats().blocks_processed, 1);
}

/// WHAT: A failed read counts as noise for tap detection
/// WHY: A missed block must not make the environment look quiet
#[test]
fn given_read_failure_when_quiet_block_follows_then_tap_reported() {
    // Given: A failed read
    let mut listener = listener();
    let mut source = ScriptedSource::new(vec![acquisition_error(), Ok(quiet(1))]);
    listener.listen(&mut source);

    // When: A quiet block follows
    let events = listener.listen(&mut source);

    // Then: The forced noisy cycle is reported as a one-block tap
    assert!(events.iter().any(|e| matches!(
        e,
        ListenerEvent::TapDetected {
            noisy_blocks: 1,
            ..
        }
    )));
}

/// WHAT: Malformed blocks are skipped without recording them, but still end as a tap
/// WHY: An odd-length block cannot be classified or written as 16-bit PCM
#[test]
fn given_malformed_block_when_processing_then_skipped_and_counted() {
    // Given: A recording episode
    let mut listener = listener();
    listener.on_block(loud(1));

    // When: An odd-length block arrives
    let events = listener.on_block(AudioBlock::from_bytes(vec![1u8, 2, 3]));

    // Then: Reported, counted, and not appended
    assert!(matches!(
        events.as_slice(),
        [ListenerEvent::InvalidBlock { .. }]
    ));
    assert_eq!(listener.stats().invalid_blocks, 1);
    let RecordingState::Recording(episode) = listener.state() else {
        unreachable!("listener reported recording");
    };
    assert_eq!(episode.len(), 1);

    // When: The next block is quiet
    let events = listener.on_block(quiet(1));

    // Then: The malformed block counted as a one-block noisy run
    assert!(events.iter().any(|e| matches!(
        e,
        ListenerEvent::TapDetected {
            noisy_blocks: 1,
            ..
        }
    )));
}

/// WHAT: finish flushes an in-progress episode
/// WHY: Shutdown at a block boundary must not lose the current recording
#[test]
fn given_recording_when_finishing_then_episode_persisted() {
    // Given: An episode in progress
    let mut listener = listener();
    feed(&mut listener, [quiet(1), loud(1), loud(2)]);

    // When: Finishing
    let (sink, event) = listener.finish();

    // Then: The episode reached the sink
    assert!(matches!(event, Some(ListenerEvent::EpisodeSaved { blocks: 3, .. })));
    assert_eq!(sink.episodes.len(), 1);
}

/// WHAT: Invalid configuration is rejected at construction
/// WHY: A zero-capacity detector cannot run
#[test]
fn given_invalid_config_when_creating_listener_then_error() {
    // Given: A config with a zero threshold
    let config = DetectionConfig {
        initial_threshold: 0.0,
        ..test_config()
    };

    // When: Creating a listener
    let result = NoiseListener::new(config, CollectingSink::default());

    // Then: Construction fails
    assert!(result.is_err());
}
