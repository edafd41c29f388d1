use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use crate::{
    buffer::buffer_pool_manager::BufferPoolManager,
    storage::page::page::{PageId, PageRef},
};

/// Scoped ownership of one pin on a page.
///
/// Dropping the guard unpins the page exactly once. Moving the guard (or
/// upgrading it into a read/write guard) transfers the pin and leaves the
/// source empty, so destruction of a moved-from guard is a no-op.
pub struct BasicPageGuard<'a> {
    inner: Option<GuardInner<'a>>,
}

struct GuardInner<'a> {
    bpm: &'a BufferPoolManager,
    page: PageRef,
    is_dirty: bool,
}

impl<'a> BasicPageGuard<'a> {
    pub(crate) fn new(bpm: &'a BufferPoolManager, page: PageRef) -> Self {
        Self {
            inner: Some(GuardInner {
                bpm,
                page,
                is_dirty: false,
            }),
        }
    }

    fn inner(&self) -> &GuardInner<'a> {
        self.inner.as_ref().expect("page guard is empty")
    }

    pub fn page_id(&self) -> PageId {
        self.inner().page.page_id()
    }

    pub fn data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.inner().page.data()
    }

    /// Mutable access to the page bytes. Marks the pin dirty, so the frame is
    /// written back before eviction.
    pub fn data_mut(&mut self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        let inner = self.inner.as_mut().expect("page guard is empty");
        inner.is_dirty = true;
        inner.page.data_mut()
    }

    /// Converts into a read guard. The pin carries over; this guard becomes
    /// empty.
    pub fn upgrade_read(mut self) -> ReadPageGuard<'a> {
        ReadPageGuard {
            guard: BasicPageGuard {
                inner: self.inner.take(),
            },
        }
    }

    /// Converts into a write guard, which unpins dirty. The pin carries over;
    /// this guard becomes empty.
    pub fn upgrade_write(mut self) -> WritePageGuard<'a> {
        let mut inner = self.inner.take();
        if let Some(inner) = inner.as_mut() {
            inner.is_dirty = true;
        }
        WritePageGuard {
            guard: BasicPageGuard { inner },
        }
    }
}

impl Drop for BasicPageGuard<'_> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.bpm.unpin_page(inner.page.page_id(), inner.is_dirty);
        }
    }
}

/// Read-intent wrapper around a basic guard. Unpins clean on drop unless the
/// underlying pin was already dirtied.
pub struct ReadPageGuard<'a> {
    guard: BasicPageGuard<'a>,
}

impl ReadPageGuard<'_> {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.guard.data()
    }
}

/// Write-intent wrapper around a basic guard. The page is marked dirty for
/// the lifetime of the guard, so dropping it unpins dirty.
pub struct WritePageGuard<'a> {
    guard: BasicPageGuard<'a>,
}

impl WritePageGuard<'_> {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.guard.data()
    }

    pub fn data_mut(&mut self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.guard.data_mut()
    }
}
