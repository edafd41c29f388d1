use std::{
    fs::{File, OpenOptions},
    os::unix::fs::FileExt,
    path::Path,
};

use anyhow::{Context, Result};
use log::debug;

use crate::storage::page::page::PageId;

/// Blocking page store over a single database file.
///
/// Pages live at `page_id * page_size` offsets. Positioned I/O keeps the
/// manager free of any seek state, so the scheduler worker and foreground
/// callers never contend on a file cursor.
pub struct DiskManager {
    db_io: File,
    page_size: usize,
}

impl DiskManager {
    pub fn new(path: impl AsRef<Path>, page_size: usize) -> Result<Self> {
        assert!(page_size > 0, "page size must be non-zero");

        let path = path.as_ref();
        let db_io = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .with_context(|| format!("failed to open database file {}", path.display()))?;

        debug!("opened database file {}", path.display());

        Ok(Self { db_io, page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Reads one page into `buf`. Bytes past the current end of the file read
    /// back as zeroes; a freshly allocated page has never been written.
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        assert_eq!(buf.len(), self.page_size, "page buffer must be one page");

        let mut offset = page_id as u64 * self.page_size as u64;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .db_io
                .read_at(&mut buf[filled..], offset)
                .with_context(|| format!("I/O error while reading page {}", page_id))?;
            if n == 0 {
                break;
            }
            filled += n;
            offset += n as u64;
        }
        buf[filled..].fill(0);

        Ok(())
    }

    /// Writes one page from `buf` at the page's fixed offset.
    pub fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<()> {
        assert_eq!(buf.len(), self.page_size, "page buffer must be one page");

        let offset = page_id as u64 * self.page_size as u64;
        self.db_io
            .write_all_at(buf, offset)
            .with_context(|| format!("I/O error while writing page {}", page_id))?;

        Ok(())
    }
}
