// crates/mediacore-video/src/change_bitmap.rs
//
// Pending reconfiguration requests on the video output worker. An
// embedder calls `request(bit)` from any thread; the worker drains and
// acknowledges bits during its own loop. A bit nobody acknowledges by the
// end of an iteration is a caller bug — the worker treats it as fatal.

use std::sync::atomic::{AtomicU32, Ordering};

use mediacore_types::{ChangeBitmap, CoreError};

#[derive(Default)]
pub struct ChangeBitmapTracker {
    pending: AtomicU32,
}

impl ChangeBitmapTracker {
    pub fn new() -> Self {
        Self { pending: AtomicU32::new(0) }
    }

    pub fn request(&self, bits: ChangeBitmap) {
        self.pending.fetch_or(bits.bits(), Ordering::SeqCst);
    }

    pub fn pending(&self) -> ChangeBitmap {
        ChangeBitmap::from_bits_truncate(self.pending.load(Ordering::SeqCst))
    }

    fn ack(&self, bits: ChangeBitmap) {
        self.pending.fetch_and(!bits.bits(), Ordering::SeqCst);
    }

    /// Run one iteration: hand `pending()` to `handle`, which returns the
    /// subset it acted on, then acknowledge those bits. Any bit still
    /// pending afterwards is unrecognized by every handler this worker
    /// knows about — fatal.
    pub fn drain(&self, handle: impl FnOnce(ChangeBitmap) -> ChangeBitmap) -> Result<(), CoreError> {
        let pending = self.pending();
        if pending.is_empty() {
            return Ok(());
        }
        let handled = handle(pending);
        self.ack(handled);

        let leftover = self.pending();
        if !leftover.is_empty() {
            return Err(CoreError::UnauthorizedChange { bit: leftover.bits() });
        }
        Ok(())
    }
}
