use std::{
    collections::VecDeque,
    sync::{mpsc::Receiver, Arc, Mutex},
};

use anyhow::Result;
use hashlink::LinkedHashMap;
use log::trace;

use crate::{
    storage::{
        disk::{
            manager::DiskManager,
            scheduler::{DiskData, DiskRequest, DiskScheduler},
        },
        page::{
            page::{zeroed_frame, FrameData, FrameId, PageId, PageRef},
            page_guard::{BasicPageGuard, ReadPageGuard, WritePageGuard},
        },
    },
    utils::replacer::{LRUKReplacer, Replacer},
};

struct FrameMeta {
    page_id: Option<PageId>,
    pin_count: u32,
    is_dirty: bool,
}

impl FrameMeta {
    fn empty() -> Self {
        FrameMeta {
            page_id: None,
            pin_count: 0,
            is_dirty: false,
        }
    }
}

/// Everything the pool latch protects. A frame is either on the free list or
/// holds a page recorded in the page table, never both.
struct PoolState {
    frames: Vec<FrameMeta>,
    page_table: LinkedHashMap<PageId, FrameId>,
    free_frames: VecDeque<FrameId>,
    free_page_ids: VecDeque<PageId>,
    next_page_id: PageId,
}

/// Bounded pool of page frames backed by the disk scheduler.
///
/// A single coarse latch serializes every public operation, including the
/// inline waits on I/O completions. That is deadlock-free because the
/// scheduler worker only ever touches the disk manager and frame buffers,
/// never the pool latch.
pub struct BufferPoolManager {
    pool_size: usize,
    page_size: usize,
    state: Mutex<PoolState>,

    /// Frame buffers, indexed by frame id. Fixed for the pool's lifetime.
    buffers: Vec<FrameData>,

    /// Finds unpinned candidate frames for eviction.
    replacer: LRUKReplacer,

    /// Hands page-granularity I/O to the background worker.
    disk_scheduler: DiskScheduler,
}

impl BufferPoolManager {
    pub fn new(
        pool_size: usize,
        page_size: usize,
        disk_manager: Arc<DiskManager>,
        replacer_k: usize,
    ) -> Self {
        assert_eq!(
            page_size,
            disk_manager.page_size(),
            "pool and disk manager disagree on the page size"
        );

        let mut frames = Vec::with_capacity(pool_size);
        let mut buffers = Vec::with_capacity(pool_size);
        let mut free_frames = VecDeque::with_capacity(pool_size);

        // Initially every frame is free.
        for frame_id in 0..pool_size {
            frames.push(FrameMeta::empty());
            buffers.push(zeroed_frame(page_size));
            free_frames.push_back(frame_id);
        }

        Self {
            pool_size,
            page_size,
            state: Mutex::new(PoolState {
                frames,
                page_table: LinkedHashMap::new(),
                free_frames,
                free_page_ids: VecDeque::new(),
                next_page_id: 0,
            }),
            buffers,
            replacer: LRUKReplacer::new(pool_size, replacer_k),
            disk_scheduler: DiskScheduler::new(disk_manager),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Allocates a fresh page pinned into a frame. The new page's bytes are
    /// zeroed and it starts out clean. Returns `None` when every frame is
    /// pinned.
    pub fn new_page(&self) -> Option<(PageId, PageRef)> {
        let mut state = self.state.lock().unwrap();

        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = Self::allocate_page_id(&mut state);

        self.buffers[frame_id].write().unwrap().fill(0);

        let meta = &mut state.frames[frame_id];
        meta.page_id = Some(page_id);
        meta.pin_count = 1;
        meta.is_dirty = false;

        state.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Some((page_id, self.page_ref(page_id, frame_id)))
    }

    /// Pins `page_id` into the pool, reading it from disk if it is not
    /// resident. Returns `None` when the page is absent and every frame is
    /// pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Option<PageRef> {
        let mut state = self.state.lock().unwrap();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.frames[frame_id].pin_count += 1;
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Some(self.page_ref(page_id, frame_id));
        }

        let frame_id = self.acquire_frame(&mut state)?;

        // Any write-back of the evicted page has already retired, so this
        // read into the same frame observes it.
        let completion = self.schedule_read(page_id, Arc::clone(&self.buffers[frame_id]));
        Self::await_io(completion);

        let meta = &mut state.frames[frame_id];
        meta.page_id = Some(page_id);
        meta.pin_count = 1;
        meta.is_dirty = false;

        state.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Some(self.page_ref(page_id, frame_id))
    }

    /// Drops one pin on `page_id`. The dirty flag is sticky: unpinning with
    /// `is_dirty = false` never clears it. Returns `false` when the page is
    /// not resident or its pin count is already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };

        let meta = &mut state.frames[frame_id];
        if meta.pin_count == 0 {
            return false;
        }

        meta.pin_count -= 1;
        if is_dirty {
            meta.is_dirty = true;
        }

        if meta.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }

        true
    }

    /// Writes `page_id` back to disk if dirty, waiting for the completion.
    /// Ignores the pin count and never evicts or deallocates. Returns `false`
    /// when the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };

        if state.frames[frame_id].is_dirty {
            let completion = self.schedule_write(page_id, self.snapshot(frame_id));
            Self::await_io(completion);
            state.frames[frame_id].is_dirty = false;
        }

        true
    }

    /// Flushes every dirty resident page. Writes are issued back to back and
    /// the call returns once all completions fire.
    pub fn flush_all(&self) {
        let mut state = self.state.lock().unwrap();

        let mut pending = Vec::new();
        for (&page_id, &frame_id) in state.page_table.iter() {
            if !state.frames[frame_id].is_dirty {
                continue;
            }
            pending.push((frame_id, self.schedule_write(page_id, self.snapshot(frame_id))));
        }

        for (frame_id, completion) in pending {
            Self::await_io(completion);
            state.frames[frame_id].is_dirty = false;
        }
    }

    /// Removes `page_id` from the pool and recycles its id. A page that is
    /// not resident deletes trivially; a pinned page cannot be deleted.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return true;
        };

        if state.frames[frame_id].pin_count > 0 {
            return false;
        }

        if state.frames[frame_id].is_dirty {
            let completion = self.schedule_write(page_id, self.snapshot(frame_id));
            Self::await_io(completion);
        }

        self.replacer.remove(frame_id);
        state.page_table.remove(&page_id);
        state.frames[frame_id] = FrameMeta::empty();
        self.buffers[frame_id].write().unwrap().fill(0);
        state.free_frames.push_back(frame_id);
        state.free_page_ids.push_back(page_id);

        true
    }

    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock().unwrap();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(state.frames[frame_id].pin_count)
    }

    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        let state = self.state.lock().unwrap();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(state.frames[frame_id].is_dirty)
    }

    /// Allocates a new page behind a guard that unpins it on drop.
    pub fn new_page_guarded(&self) -> Option<BasicPageGuard<'_>> {
        let (_, page) = self.new_page()?;
        Some(BasicPageGuard::new(self, page))
    }

    pub fn fetch_page_basic(&self, page_id: PageId) -> Option<BasicPageGuard<'_>> {
        let page = self.fetch_page(page_id)?;
        Some(BasicPageGuard::new(self, page))
    }

    pub fn fetch_page_read(&self, page_id: PageId) -> Option<ReadPageGuard<'_>> {
        Some(self.fetch_page_basic(page_id)?.upgrade_read())
    }

    pub fn fetch_page_write(&self, page_id: PageId) -> Option<WritePageGuard<'_>> {
        Some(self.fetch_page_basic(page_id)?.upgrade_write())
    }

    /// Takes a frame off the free list, or evicts a victim, writing its page
    /// back first if dirty. Returns `None` when every frame is pinned.
    fn acquire_frame(&self, state: &mut PoolState) -> Option<FrameId> {
        if let Some(frame_id) = state.free_frames.pop_front() {
            return Some(frame_id);
        }

        let frame_id = self.replacer.evict()?;
        trace!("evicting frame {}", frame_id);

        let meta = &mut state.frames[frame_id];
        debug_assert_eq!(meta.pin_count, 0, "evicted a pinned frame");

        let evicted_page_id = meta
            .page_id
            .take()
            .expect("evictable frame holds no page");

        if meta.is_dirty {
            meta.is_dirty = false;
            let completion = self.schedule_write(evicted_page_id, self.snapshot(frame_id));
            Self::await_io(completion);
        }

        state.page_table.remove(&evicted_page_id);
        Some(frame_id)
    }

    fn allocate_page_id(state: &mut PoolState) -> PageId {
        if let Some(page_id) = state.free_page_ids.pop_front() {
            return page_id;
        }
        let page_id = state.next_page_id;
        state.next_page_id += 1;
        page_id
    }

    fn page_ref(&self, page_id: PageId, frame_id: FrameId) -> PageRef {
        PageRef::new(page_id, Arc::clone(&self.buffers[frame_id]))
    }

    /// Copy of the frame's current bytes, handed to the scheduler so the
    /// frame itself can be reused while the write is in flight.
    fn snapshot(&self, frame_id: FrameId) -> Box<[u8]> {
        self.buffers[frame_id].read().unwrap().clone()
    }

    fn schedule_write(&self, page_id: PageId, data: Box<[u8]>) -> Receiver<Result<()>> {
        let (callback, completion) = DiskScheduler::create_promise();
        self.disk_scheduler.schedule(DiskRequest {
            data: DiskData::Write(data),
            page_id,
            callback,
        });
        completion
    }

    fn schedule_read(&self, page_id: PageId, frame: FrameData) -> Receiver<Result<()>> {
        let (callback, completion) = DiskScheduler::create_promise();
        self.disk_scheduler.schedule(DiskRequest {
            data: DiskData::Read(frame),
            page_id,
            callback,
        });
        completion
    }

    /// Blocks on a completion. I/O failures are fatal to the pool.
    fn await_io(completion: Receiver<Result<()>>) {
        completion
            .recv()
            .expect("disk scheduler dropped a completion")
            .unwrap_or_else(|err| panic!("disk I/O failed: {:#}", err));
    }

    /// Checks the pool's structural invariants. Test support.
    #[cfg(test)]
    pub(crate) fn audit(&self) {
        let state = self.state.lock().unwrap();

        assert_eq!(
            state.page_table.len() + state.free_frames.len(),
            self.pool_size,
            "every frame must be resident or free"
        );

        for (&page_id, &frame_id) in state.page_table.iter() {
            assert_eq!(state.frames[frame_id].page_id, Some(page_id));
        }

        for &frame_id in &state.free_frames {
            assert_eq!(state.frames[frame_id].page_id, None);
            assert_eq!(state.frames[frame_id].pin_count, 0);
        }

        let unpinned_resident = state
            .frames
            .iter()
            .filter(|meta| meta.page_id.is_some() && meta.pin_count == 0)
            .count();
        assert_eq!(self.replacer.size(), unpinned_resident);
    }
}
