// crates/mediacore-video/src/heap.rs
//
// Fixed-capacity slab pools for Picture and SubpictureUnit slots. Both
// heaps hold their slots behind one heap-wide lock: allocation, status
// transitions, and pixel/payload writes all happen under that lock. This
// trades away the lock-free-write fast path a single-owner slot could in
// principle support for a heap that's trivially safe to reason about —
// the allocation and scan logic is the part worth getting right here, not
// the write path.

use parking_lot::Mutex;

use mediacore_types::{
    AspectRatio, CoreError, CropRect, MatrixCoefficients, Picture, PictureHandle, PictureStatus,
    PixelFormat, SpuHandle, SubpictureKind, SubpictureUnit,
};

fn chroma_width_for(format: PixelFormat, width: u32) -> u32 {
    match format {
        PixelFormat::Yuv420 | PixelFormat::Yuv422 => width.div_ceil(2),
        PixelFormat::Yuv444 | PixelFormat::PresenterNative => width,
    }
}

/// A fixed-capacity pool of `Picture` slots. Slots are never added or
/// removed after construction — only recycled between FREE/DESTROYED and
/// RESERVED.
pub struct PictureHeap {
    slots: Mutex<Vec<Picture>>,
}

impl PictureHeap {
    pub fn new(capacity: usize) -> Self {
        Self { slots: Mutex::new((0..capacity).map(|_| Picture::free()).collect()) }
    }

    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }

    /// Reserve a slot for a `width`x`height` frame in `format`. Scans once:
    /// a DESTROYED slot whose geometry already matches is reused verbatim
    /// (its pixel buffer keeps its allocation); otherwise the first FREE
    /// slot wins, falling back to the first DESTROYED slot seen. `HeapFull`
    /// if neither exists.
    pub fn create_picture(
        &self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<PictureHandle, CoreError> {
        let mut slots = self.slots.lock();

        if let Some(idx) = slots.iter().position(|p| {
            p.status == PictureStatus::Destroyed
                && p.format == format
                && p.width == width
                && p.height == height
        }) {
            let p = &mut slots[idx];
            p.status = PictureStatus::Reserved;
            p.ref_count = 0;
            p.date = None;
            p.crop = CropRect::full_frame(width, height);
            p.aspect = AspectRatio::Square;
            p.matrix = MatrixCoefficients::Bt601;
            return Ok(PictureHandle(idx));
        }

        let mut free_idx = None;
        let mut destroyed_idx = None;
        for (i, p) in slots.iter().enumerate() {
            match p.status {
                PictureStatus::Free if free_idx.is_none() => free_idx = Some(i),
                PictureStatus::Destroyed if destroyed_idx.is_none() => destroyed_idx = Some(i),
                _ => {}
            }
        }

        let idx = free_idx.or(destroyed_idx).ok_or(CoreError::HeapFull)?;
        let chroma_width = chroma_width_for(format, width);
        slots[idx] = Picture {
            format,
            width,
            height,
            chroma_width,
            crop: CropRect::full_frame(width, height),
            aspect: AspectRatio::Square,
            matrix: MatrixCoefficients::Bt601,
            date: None,
            ref_count: 0,
            status: PictureStatus::Reserved,
            data: Vec::new(),
        };
        Ok(PictureHandle(idx))
    }

    pub fn write_pixels(&self, handle: PictureHandle, data: Vec<u8>) {
        self.slots.lock()[handle.0].data = data;
    }

    pub fn set_aspect(&self, handle: PictureHandle, aspect: AspectRatio) {
        self.slots.lock()[handle.0].aspect = aspect;
    }

    pub fn display(&self, handle: PictureHandle) {
        self.slots.lock()[handle.0].display();
    }

    pub fn date(&self, handle: PictureHandle, date_us: i64) {
        self.slots.lock()[handle.0].date(date_us);
    }

    pub fn link(&self, handle: PictureHandle) {
        self.slots.lock()[handle.0].link();
    }

    pub fn unlink(&self, handle: PictureHandle) {
        self.slots.lock()[handle.0].unlink();
    }

    /// Pick the READY picture with the earliest date, if any. Ties broken
    /// by slot index so selection is deterministic.
    pub fn select_ready(&self) -> Option<(PictureHandle, i64)> {
        let slots = self.slots.lock();
        slots
            .iter()
            .enumerate()
            .filter(|(_, p)| p.status.is_displayable())
            .filter_map(|(i, p)| p.date.map(|d| (i, d)))
            .min_by_key(|(i, d)| (*d, *i))
            .map(|(i, d)| (PictureHandle(i), d))
    }

    pub fn snapshot(&self, handle: PictureHandle) -> Picture {
        self.slots.lock()[handle.0].clone()
    }

    /// Present `handle`: force it to DISPLAYED and drop the worker's own
    /// reference. If nothing else is holding a reference the slot becomes
    /// DESTROYED immediately.
    pub fn consume_displayed(&self, handle: PictureHandle) {
        let mut slots = self.slots.lock();
        let p = &mut slots[handle.0];
        p.status = PictureStatus::Displayed;
        if p.ref_count > 0 {
            p.ref_count -= 1;
        }
        if p.ref_count == 0 {
            p.status = PictureStatus::Destroyed;
        }
    }

    /// Discard `handle` without presenting it — used when a picture missed
    /// its display window.
    pub fn drop_late(&self, handle: PictureHandle) {
        self.slots.lock()[handle.0].status = PictureStatus::Destroyed;
    }

    /// Force every non-FREE, non-DISPLAYED slot to DESTROYED — used when a
    /// rate change invalidates everything queued for display.
    pub fn flush(&self) {
        let mut slots = self.slots.lock();
        for p in slots.iter_mut() {
            if !matches!(p.status, PictureStatus::Free | PictureStatus::Displayed) {
                p.status = PictureStatus::Destroyed;
            }
        }
    }
}

/// A fixed-capacity pool of `SubpictureUnit` slots, mirroring `PictureHeap`
/// but without the same-geometry reuse fast path (subpicture slots don't
/// carry a fixed width/height).
pub struct SubpictureHeap {
    slots: Mutex<Vec<SubpictureUnit>>,
}

impl SubpictureHeap {
    pub fn new(capacity: usize) -> Self {
        Self { slots: Mutex::new((0..capacity).map(|_| SubpictureUnit::free()).collect()) }
    }

    pub fn create_subpicture(&self, kind: SubpictureKind) -> Result<SpuHandle, CoreError> {
        let mut slots = self.slots.lock();

        if let Some(idx) = slots
            .iter()
            .position(|s| s.status == mediacore_types::SubpictureStatus::Destroyed && s.kind == kind)
        {
            let s = &mut slots[idx];
            s.status = mediacore_types::SubpictureStatus::Reserved;
            s.ref_count = 0;
            s.payload.clear();
            return Ok(SpuHandle(idx));
        }

        let mut free_idx = None;
        let mut destroyed_idx = None;
        for (i, s) in slots.iter().enumerate() {
            match s.status {
                mediacore_types::SubpictureStatus::Free if free_idx.is_none() => free_idx = Some(i),
                mediacore_types::SubpictureStatus::Destroyed if destroyed_idx.is_none() => {
                    destroyed_idx = Some(i)
                }
                _ => {}
            }
        }

        let idx = free_idx.or(destroyed_idx).ok_or(CoreError::HeapFull)?;
        slots[idx] = SubpictureUnit { kind, ..SubpictureUnit::free() };
        slots[idx].status = mediacore_types::SubpictureStatus::Reserved;
        Ok(SpuHandle(idx))
    }

    pub fn write_payload(&self, handle: SpuHandle, payload: Vec<u8>, channel: u32, order: i32) {
        let mut slots = self.slots.lock();
        let s = &mut slots[handle.0];
        s.payload = payload;
        s.channel = channel;
        s.order = order;
    }

    pub fn set_times(&self, handle: SpuHandle, start_us: i64, stop_us: i64) {
        let mut slots = self.slots.lock();
        let s = &mut slots[handle.0];
        s.begin = start_us;
        s.end = stop_us;
    }

    pub fn ready(&self, handle: SpuHandle) {
        self.slots.lock()[handle.0].ready();
    }

    pub fn link(&self, handle: SpuHandle) {
        self.slots.lock()[handle.0].link();
    }

    pub fn unlink(&self, handle: SpuHandle) {
        self.slots.lock()[handle.0].unlink();
    }

    /// All READY units whose `[begin, end)` window covers `now_us`, ordered
    /// by `order` ascending (compositing order, lowest drawn first).
    pub fn active_at(&self, now_us: i64) -> Vec<(SpuHandle, SubpictureUnit)> {
        let slots = self.slots.lock();
        let mut out: Vec<(SpuHandle, SubpictureUnit)> = slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status.is_displayable() && s.begin <= now_us && now_us < s.end)
            .map(|(i, s)| (SpuHandle(i), s.clone()))
            .collect();
        out.sort_by_key(|(_, s)| s.order);
        out
    }
}
