use crate::{PrerollBuffer, tests::audio::support::quiet};

const CAPACITY: usize = 4;

/// WHAT: Fresh buffer snapshots to nothing
/// WHY: Never-written slots must not leak into an episode
#[test]
fn given_new_buffer_when_snapshotting_then_empty() {
    // Given: A buffer that has never been pushed to
    let buffer = PrerollBuffer::new(CAPACITY);

    // When: Taking a snapshot
    let snapshot = buffer.snapshot();

    // Then: Nothing is returned
    assert!(snapshot.is_empty());
    assert!(buffer.is_empty());
}

/// WHAT: Partially filled buffer returns only written blocks in order
/// WHY: Pre-roll at startup is shorter than capacity
#[test]
fn given_fewer_than_capacity_pushes_when_snapshotting_then_push_order() {
    // Given: Two blocks pushed into a four-slot ring
    let mut buffer = PrerollBuffer::new(CAPACITY);
    buffer.push(quiet(1));
    buffer.push(quiet(2));

    // When: Taking a snapshot
    let snapshot = buffer.snapshot();

    // Then: Both blocks, oldest first
    assert_eq!(snapshot, vec![quiet(1), quiet(2)]);
    assert_eq!(buffer.len(), 2);
}

/// WHAT: Exactly full buffer returns all blocks in push order
/// WHY: Pre-roll must be chronological
#[test]
fn given_capacity_pushes_when_snapshotting_then_all_in_push_order() {
    // Given: Exactly CAPACITY blocks pushed
    let mut buffer = PrerollBuffer::new(CAPACITY);
    for tag in 1..=CAPACITY as i16 {
        buffer.push(quiet(tag));
    }

    // When: Taking a snapshot
    let snapshot = buffer.snapshot();

    // Then: All blocks, oldest first
    assert_eq!(snapshot, vec![quiet(1), quiet(2), quiet(3), quiet(4)]);
}

/// WHAT: Overflow evicts the oldest block
/// WHY: The ring keeps only the most recent CAPACITY blocks
#[test]
fn given_one_more_than_capacity_when_snapshotting_then_first_evicted() {
    // Given: CAPACITY + 1 blocks pushed
    let mut buffer = PrerollBuffer::new(CAPACITY);
    for tag in 1..=CAPACITY as i16 + 1 {
        buffer.push(quiet(tag));
    }

    // When: Taking a snapshot
    let snapshot = buffer.snapshot();

    // Then: Most recent CAPACITY blocks, oldest first, block 1 gone
    assert_eq!(snapshot, vec![quiet(2), quiet(3), quiet(4), quiet(5)]);
    assert_eq!(buffer.len(), CAPACITY);
}

/// WHAT: Snapshot does not mutate the ring
/// WHY: Recording start reads the ring while capture keeps writing to it
#[test]
fn given_snapshot_taken_when_pushing_again_then_ring_continues_normally() {
    // Given: A wrapped ring and a snapshot of it
    let mut buffer = PrerollBuffer::new(CAPACITY);
    for tag in 1..=6 {
        buffer.push(quiet(tag));
    }
    let first = buffer.snapshot();

    // When: Snapshotting again and pushing one more block
    let second = buffer.snapshot();
    buffer.push(quiet(7));

    // Then: Repeated snapshots agree and the next push evicts the oldest
    assert_eq!(first, second);
    assert_eq!(buffer.snapshot(), vec![quiet(4), quiet(5), quiet(6), quiet(7)]);
}

/// WHAT: Zero capacity is raised to one slot
/// WHY: The ring index must never divide by zero
#[test]
fn given_zero_capacity_when_creating_then_single_slot() {
    // Given/When: A buffer requested with zero capacity
    let mut buffer = PrerollBuffer::new(0);
    buffer.push(quiet(1));
    buffer.push(quiet(2));

    // Then: It holds exactly the latest block
    assert_eq!(buffer.capacity(), 1);
    assert_eq!(buffer.snapshot(), vec![quiet(2)]);
}
