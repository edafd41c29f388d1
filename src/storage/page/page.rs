use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type PageId = u32;
pub type FrameId = usize;

pub mod page_constants {
    /// Conventional page size. The disk manager and the buffer pool take the
    /// page size as a constructor parameter; this is the default the tests
    /// and benches build with.
    pub const PAGE_SIZE: usize = 1024 * 4;
}

/// The byte buffer of a single frame. Shared between the buffer pool, the
/// page guards handed to clients, and in-flight read requests on the disk
/// scheduler; the pin count guarantees no two of them write concurrently.
pub type FrameData = Arc<RwLock<Box<[u8]>>>;

pub fn zeroed_frame(page_size: usize) -> FrameData {
    Arc::new(RwLock::new(vec![0u8; page_size].into_boxed_slice()))
}

/// A pinned reference to a page resident in the buffer pool.
///
/// Holding a `PageRef` does not release the pin by itself; the caller must
/// pair it with `unpin_page`, or use the guard API which does so on drop.
/// The buffer stays valid for as long as the pin is held.
pub struct PageRef {
    page_id: PageId,
    data: FrameData,
}

impl PageRef {
    pub(crate) fn new(page_id: PageId, data: FrameData) -> Self {
        Self { page_id, data }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.data.read().unwrap()
    }

    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.data.write().unwrap()
    }
}
