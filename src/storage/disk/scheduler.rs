use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::JoinHandle,
};

use anyhow::Result;
use log::debug;

use super::manager::DiskManager;
use crate::storage::page::page::{FrameData, PageId};

pub enum DiskData {
    /// Snapshot of the frame taken at schedule time. The worker never touches
    /// the live frame for writes, so an evicted frame can be reused while its
    /// old contents are still in flight.
    Write(Box<[u8]>),
    /// Shared reference to the frame buffer the page is read into. The caller
    /// must keep the frame out of circulation until the completion fires.
    Read(FrameData),
}

/// A request to perform one page of disk I/O.
pub struct DiskRequest {
    pub data: DiskData,

    /// ID of the page being read from / written to disk.
    pub page_id: PageId,

    /// One-shot channel fulfilled exactly once when the request retires.
    /// Carries the outcome of the underlying disk manager call.
    pub callback: Sender<Result<()>>,
}

/// Serializes page-granularity I/O onto a single background worker.
///
/// Requests retire in `schedule` order; there is no reordering, batching, or
/// prioritization. Dropping the scheduler enqueues a shutdown sentinel after
/// any pending requests and joins the worker.
pub struct DiskScheduler {
    request_queue: Sender<Option<DiskRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    pub fn new(manager: Arc<DiskManager>) -> Self {
        let (tx, rx) = mpsc::channel::<Option<DiskRequest>>();

        let worker = std::thread::Builder::new()
            .name("disk-scheduler".into())
            .spawn(move || Self::worker_loop(manager, rx))
            .expect("failed to spawn disk scheduler worker");

        Self {
            request_queue: tx,
            worker: Some(worker),
        }
    }

    /// Enqueues a request for the background worker. Never blocks.
    pub fn schedule(&self, request: DiskRequest) {
        self.request_queue
            .send(Some(request))
            .expect("disk scheduler worker is gone");
    }

    /// Creates the one-shot completion pair for a request. The sender goes
    /// into the request; the caller keeps the receiver and blocks on it (or
    /// polls it) until the I/O retires.
    pub fn create_promise() -> (Sender<Result<()>>, Receiver<Result<()>>) {
        mpsc::channel()
    }

    fn worker_loop(manager: Arc<DiskManager>, request_queue: Receiver<Option<DiskRequest>>) {
        debug!("disk scheduler worker started");

        while let Ok(Some(request)) = request_queue.recv() {
            let outcome = match &request.data {
                DiskData::Write(buf) => manager.write_page(request.page_id, buf),
                DiskData::Read(frame) => {
                    let mut buf = frame.write().unwrap();
                    manager.read_page(request.page_id, &mut buf[..])
                }
            };

            // A failure must not crash the worker; the issuer decides policy.
            // The receiver may already be gone if the issuer gave up waiting.
            let _ = request.callback.send(outcome);
        }

        debug!("disk scheduler worker shut down");
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        // Sentinel after all pending requests; the worker drains, then exits.
        let _ = self.request_queue.send(None);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
