use crate::utils::replacer::{LRUKReplacer, Replacer};

#[test]
fn evict_prefers_incomplete_history() {
    // k = 2, access pattern 1,2,3,1,2: only frame 3 has fewer than two
    // accesses, so it is infinitely distant and goes first.
    let replacer = LRUKReplacer::new(7, 2);
    for frame_id in [1, 2, 3, 1, 2] {
        replacer.record_access(frame_id);
    }
    for frame_id in 1..=3 {
        replacer.set_evictable(frame_id, true);
    }
    assert_eq!(replacer.size(), 3);

    assert_eq!(replacer.evict(), Some(3));

    // The survivors both have full histories; frame 1's second-most-recent
    // access is the older one.
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.evict(), Some(2));
    assert_eq!(replacer.size(), 0);
    assert_eq!(replacer.evict(), None);
}

#[test]
fn evict_largest_backward_k_distance() {
    // Interleave accesses so that, with k = 2, the second-most-recent
    // accesses land at t=1 (frame 1), t=2 (frame 2) and t=5 (frame 3).
    // Frame 0 only absorbs the filler timestamps and stays pinned.
    let replacer = LRUKReplacer::new(7, 2);
    for frame_id in [0, 1, 2, 0, 0, 3, 0, 0, 0, 2, 1, 3] {
        replacer.record_access(frame_id);
    }
    for frame_id in 1..=3 {
        replacer.set_evictable(frame_id, true);
    }

    // Earliest k-th access = largest backward distance.
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.evict(), Some(2));
    assert_eq!(replacer.evict(), Some(3));
}

#[test]
fn incomplete_tier_evicts_least_recently_used() {
    // k = 3 keeps every history incomplete. Frame 1 is touched again after
    // frame 2, so frame 2 has gone longest without an access and must go
    // first even though frame 1's oldest access is older.
    let replacer = LRUKReplacer::new(4, 3);
    for frame_id in [1, 2, 1] {
        replacer.record_access(frame_id);
    }
    replacer.set_evictable(1, true);
    replacer.set_evictable(2, true);

    assert_eq!(replacer.evict(), Some(2));
    assert_eq!(replacer.evict(), Some(1));
}

#[test]
fn set_evictable_is_idempotent() {
    let replacer = LRUKReplacer::new(4, 2);
    replacer.record_access(0);

    replacer.set_evictable(0, true);
    replacer.set_evictable(0, true);
    assert_eq!(replacer.size(), 1);

    replacer.set_evictable(0, false);
    replacer.set_evictable(0, false);
    assert_eq!(replacer.size(), 0);
}

#[test]
fn remove_drops_history() {
    let replacer = LRUKReplacer::new(4, 2);
    replacer.record_access(0);
    replacer.record_access(0);
    replacer.record_access(1);
    replacer.record_access(1);
    replacer.set_evictable(0, true);
    replacer.set_evictable(1, true);

    replacer.remove(0);
    assert_eq!(replacer.size(), 1);

    // Frame 0 re-enters with a fresh single-access history, which beats
    // frame 1's full one.
    replacer.record_access(0);
    replacer.set_evictable(0, true);
    assert_eq!(replacer.evict(), Some(0));
}

#[test]
#[should_panic(expected = "out of range")]
fn record_access_rejects_out_of_range_frame() {
    let replacer = LRUKReplacer::new(4, 2);
    replacer.record_access(4);
}

#[test]
#[should_panic(expected = "non-evictable")]
fn remove_rejects_pinned_frame() {
    let replacer = LRUKReplacer::new(4, 2);
    replacer.record_access(0);
    replacer.remove(0);
}

#[test]
#[should_panic(expected = "untracked")]
fn remove_rejects_unknown_frame() {
    let replacer = LRUKReplacer::new(4, 2);
    replacer.remove(3);
}
