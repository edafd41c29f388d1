use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use crate::storage::page::page::FrameId;

pub trait Replacer {
    fn evict(&self) -> Option<FrameId>;
    fn record_access(&self, frame_id: FrameId);
    fn set_evictable(&self, frame_id: FrameId, evictable: bool);
    fn remove(&self, frame_id: FrameId);
    fn size(&self) -> usize;
}

struct LRUKNode {
    /// Access timestamps, newest first, at most `k` retained.
    history: VecDeque<u64>,
    is_evictable: bool,
}

impl LRUKNode {
    fn new() -> Self {
        LRUKNode {
            history: VecDeque::new(),
            is_evictable: false,
        }
    }

    /// Timestamp of the k-th most recent access, or `None` when the frame has
    /// fewer than `k` recorded accesses (backward distance +inf).
    fn kth_access(&self, k: usize) -> Option<u64> {
        self.history.get(k - 1).copied()
    }

    /// Most recent access. Ranks the incomplete-history tier: among frames
    /// with fewer than `k` accesses, the least recently used one goes first.
    fn last_access(&self) -> u64 {
        self.history.front().copied().unwrap_or(0)
    }
}

struct ReplacerState {
    node_store: HashMap<FrameId, LRUKNode>,
    current_timestamp: u64,
    /// Number of evictable frames, maintained by `set_evictable` and the
    /// removal paths.
    curr_size: usize,
}

/// LRU-K replacement policy over the pool's frames.
///
/// The victim is the evictable frame with the largest backward k-distance;
/// frames with fewer than `k` accesses count as infinitely distant and are
/// preferred, the least recently used among them going first. A single scan
/// thus cannot push out frames with an established reuse history.
///
/// The replacer carries its own latch; the buffer pool calls it without
/// holding any frame state, and external callers may do the same.
pub struct LRUKReplacer {
    state: Mutex<ReplacerState>,
    replacer_size: usize,
    k: usize,
}

impl LRUKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "LRU-K requires k >= 1");

        LRUKReplacer {
            state: Mutex::new(ReplacerState {
                node_store: HashMap::new(),
                current_timestamp: 0,
                curr_size: 0,
            }),
            replacer_size: num_frames,
            k,
        }
    }

    fn check_frame(&self, frame_id: FrameId) {
        assert!(
            frame_id < self.replacer_size,
            "frame id {} out of range for replacer of size {}",
            frame_id,
            self.replacer_size
        );
    }
}

impl Replacer for LRUKReplacer {
    fn evict(&self) -> Option<FrameId> {
        let mut state = self.state.lock().unwrap();

        // Ordering key: the +inf tier (history < k) sorts before the finite
        // tier, then earlier relevant timestamp, then smaller frame id.
        let mut victim: Option<(bool, u64, FrameId)> = None;
        for (&frame_id, node) in &state.node_store {
            if !node.is_evictable {
                continue;
            }
            let key = match node.kth_access(self.k) {
                None => (false, node.last_access(), frame_id),
                Some(ts) => (true, ts, frame_id),
            };
            if victim.map_or(true, |best| key < best) {
                victim = Some(key);
            }
        }

        let (_, _, frame_id) = victim?;
        state.node_store.remove(&frame_id);
        state.curr_size -= 1;
        Some(frame_id)
    }

    fn record_access(&self, frame_id: FrameId) {
        self.check_frame(frame_id);

        let mut state = self.state.lock().unwrap();
        let timestamp = state.current_timestamp;
        state.current_timestamp += 1;

        let node = state.node_store.entry(frame_id).or_insert_with(LRUKNode::new);
        node.history.push_front(timestamp);
        node.history.truncate(self.k);
    }

    fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.check_frame(frame_id);

        let mut state = self.state.lock().unwrap();
        let node = state.node_store.entry(frame_id).or_insert_with(LRUKNode::new);
        if node.is_evictable == evictable {
            return;
        }
        node.is_evictable = evictable;

        if evictable {
            state.curr_size += 1;
        } else {
            state.curr_size -= 1;
        }
    }

    fn remove(&self, frame_id: FrameId) {
        self.check_frame(frame_id);

        let mut state = self.state.lock().unwrap();
        let evictable = match state.node_store.get(&frame_id) {
            None => panic!("cannot remove untracked frame {}", frame_id),
            Some(node) => node.is_evictable,
        };
        if !evictable {
            panic!("cannot remove non-evictable frame {}", frame_id);
        }

        state.node_store.remove(&frame_id);
        state.curr_size -= 1;
    }

    fn size(&self) -> usize {
        self.state.lock().unwrap().curr_size
    }
}
