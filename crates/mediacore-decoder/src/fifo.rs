// crates/mediacore-decoder/src/fifo.rs
//
// The decoder owner's input queue. Carries either a compressed `Block` or
// a one-shot drain marker. Backpressure has two modes selected per push:
// paced (block the producer until room frees up — appropriate for a
// demuxer that can afford to wait) and unpaced (reject immediately with
// `FifoOverflow` — appropriate for a live source that must never stall).

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use mediacore_types::{Block, CoreError};

#[derive(Debug, Clone)]
pub enum FifoItem {
    Data(Block),
    Drain,
}

impl FifoItem {
    fn byte_size(&self) -> usize {
        match self {
            FifoItem::Data(b) => b.byte_size(),
            FifoItem::Drain => 0,
        }
    }
}

struct Inner {
    queue: VecDeque<FifoItem>,
    bytes: usize,
    closed: bool,
}

pub struct BlockFifo {
    inner: Mutex<Inner>,
    not_empty: Condvar,
    not_full: Condvar,
    byte_cap: usize,
    count_cap: usize,
}

impl BlockFifo {
    pub fn new(byte_cap: usize, count_cap: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { queue: VecDeque::new(), bytes: 0, closed: false }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            byte_cap,
            count_cap,
        }
    }

    /// Push an item. `pace = true` blocks the caller until the FIFO has
    /// room; `pace = false` rejects immediately with `FifoOverflow` rather
    /// than stall the producer. `Drain` markers bypass both caps — they
    /// carry no bytes and must always get through.
    pub fn push(&self, item: FifoItem, pace: bool) -> Result<(), CoreError> {
        let size = item.byte_size();
        let mut inner = self.inner.lock();

        if size > 0 {
            if pace {
                while !inner.closed
                    && (inner.bytes + size > self.byte_cap || inner.queue.len() >= self.count_cap)
                {
                    self.not_full.wait(&mut inner);
                }
            } else if inner.bytes + size > self.byte_cap {
                return Err(CoreError::FifoOverflow { bytes: inner.bytes + size });
            }
        }

        if inner.closed {
            return Ok(());
        }

        inner.bytes += size;
        inner.queue.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks until an item is available or the FIFO is closed and
    /// drained, in which case it returns `None`.
    pub fn pop(&self) -> Option<FifoItem> {
        let mut inner = self.inner.lock();
        while inner.queue.is_empty() && !inner.closed {
            self.not_empty.wait(&mut inner);
        }
        let item = inner.queue.pop_front();
        if let Some(ref item) = item {
            inner.bytes -= item.byte_size();
        }
        self.not_full.notify_one();
        item
    }

    /// Drop every queued item without processing it (used by `flush`).
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.queue.clear();
        inner.bytes = 0;
        self.not_full.notify_all();
    }

    /// Mark the FIFO closed: no more pushes take effect, and `pop` starts
    /// returning `None` once the backlog drains.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.inner.lock().bytes
    }
}
