//! Fire-and-forget ingestion: a bounded channel into a writer worker.
//!
//! Hosts submit events without awaiting persistence; the worker drains to
//! the store in submit order. Checkpoints see only committed events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use engram_core::errors::{EngramError, EngramResult};
use engram_core::event::NewEvent;

use crate::engine::Engram;

/// Receipt for a submitted event. The event may not be durable yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Receipt(pub u64);

/// Handle to the background ingest worker.
pub struct IngestQueue {
    tx: Option<SyncSender<NewEvent>>,
    worker: Option<JoinHandle<()>>,
    next_receipt: AtomicU64,
}

impl IngestQueue {
    /// Spawn a worker draining a bounded channel of `capacity` into the
    /// engine.
    pub fn spawn(engine: Arc<Engram>, capacity: usize) -> Self {
        let (tx, rx) = sync_channel::<NewEvent>(capacity);
        let worker = std::thread::spawn(move || {
            for event in rx {
                match engine.ingest(event) {
                    Ok(receipt) => {
                        debug!(event = %receipt.event_id, "queued event persisted")
                    }
                    Err(e) => warn!(error = %e, "queued ingest failed"),
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
            next_receipt: AtomicU64::new(1),
        }
    }

    /// Submit an event. Returns immediately with a receipt; blocks only
    /// when the channel is full (backpressure), and errors once closed.
    pub fn submit(&self, event: NewEvent) -> EngramResult<Receipt> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| EngramError::Cancelled("ingest queue closed".into()))?;

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                // Bounded backpressure: block until the worker catches up.
                tx.send(event)
                    .map_err(|_| EngramError::Cancelled("ingest queue closed".into()))?;
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err(EngramError::Cancelled("ingest queue closed".into()));
            }
        }
        Ok(Receipt(self.next_receipt.fetch_add(1, Ordering::Relaxed)))
    }

    /// Close the queue and drain remaining items. Blocks until the worker
    /// finishes; a panicked worker surfaces as `Cancelled`.
    pub fn close(mut self) -> EngramResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> EngramResult<()> {
        self.tx.take(); // drop sender so the worker's loop ends
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| EngramError::Cancelled("ingest worker panicked".into()))?;
        }
        Ok(())
    }
}

impl Drop for IngestQueue {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
