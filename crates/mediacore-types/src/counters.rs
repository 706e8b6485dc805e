// crates/mediacore-types/src/counters.rs
//
// The user-visible surface this layer exposes is limited to structured log
// events and counter updates. Plain atomics — no mutex needed since every
// field is independently monotonic from the perspective of a single worker
// thread, and readers only want a best-effort snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counters {
    pub decoded: AtomicU64,
    pub lost_pictures: AtomicU64,
    pub displayed: AtomicU64,
    pub lost_abuffers: AtomicU64,
    pub played_abuffers: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            decoded: self.decoded.load(Ordering::Relaxed),
            lost_pictures: self.lost_pictures.load(Ordering::Relaxed),
            displayed: self.displayed.load(Ordering::Relaxed),
            lost_abuffers: self.lost_abuffers.load(Ordering::Relaxed),
            played_abuffers: self.played_abuffers.load(Ordering::Relaxed),
        }
    }

    pub fn bump_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bump_lost_picture(&self) {
        self.lost_pictures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bump_displayed(&self) {
        self.displayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bump_lost_abuffer(&self) {
        self.lost_abuffers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bump_played_abuffer(&self) {
        self.played_abuffers.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountersSnapshot {
    pub decoded: u64,
    pub lost_pictures: u64,
    pub displayed: u64,
    pub lost_abuffers: u64,
    pub played_abuffers: u64,
}
