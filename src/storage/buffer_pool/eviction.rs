//! Pluggable page-replacement policies for the buffer pool.
//!
//! Three strategies are provided — [`Fifo`], [`Lru`], and [`Clock`] — all
//! implementing the [`ReplacementPolicy`] trait so [`super::BufferPool`] can be
//! built against whichever one the caller selects at construction time.

use crate::error::Result;
use crate::storage::buffer_pool::buffer_frame::Frame;

/// Selects which resident, unpinned frame to evict when the pool is full.
///
/// Implementations only ever see frames with `pin_count == 0` as eviction
/// candidates; a frame pinned at least once is never offered as a victim.
pub trait ReplacementPolicy: std::fmt::Debug {
    /// Called every time a frame transitions to pinned, whether the page was
    /// already resident (a hit) or was just loaded from disk (a miss-fill).
    /// Updates whatever per-frame bookkeeping this policy keeps in
    /// `Frame::policy_cookie`.
    fn record_access(&mut self, frames: &mut [Frame], frame_idx: usize);

    /// Called every time the pool reads a page from disk. Only FIFO's hand
    /// position depends on this; other policies ignore it.
    fn note_disk_read(&mut self) {}

    /// Picks a victim frame among those with zero pins. `flush` writes a
    /// dirty frame's content back to disk without evicting it — CLOCK uses
    /// this to flush-and-skip a dirty, unreferenced frame. Returns `None` if
    /// no unpinned frame exists.
    ///
    /// # Errors
    ///
    /// Propagates any error `flush` returns.
    fn choose_victim(
        &mut self,
        frames: &mut [Frame],
        flush: &mut dyn FnMut(&Frame) -> Result<()>,
    ) -> Result<Option<usize>>;
}

/// FIFO: the hand is the running count of disk reads performed, modulo pool
/// capacity. Victim search starts at the hand and wraps at most once.
#[derive(Debug, Default)]
pub struct Fifo {
    reads: u64,
}

impl Fifo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for Fifo {
    fn record_access(&mut self, _frames: &mut [Frame], _frame_idx: usize) {}

    fn note_disk_read(&mut self) {
        self.reads += 1;
    }

    fn choose_victim(
        &mut self,
        frames: &mut [Frame],
        _flush: &mut dyn FnMut(&Frame) -> Result<()>,
    ) -> Result<Option<usize>> {
        if frames.is_empty() {
            return Ok(None);
        }
        let len = frames.len();
        #[allow(clippy::cast_possible_truncation)]
        let hand = (self.reads as usize) % len;
        for offset in 0..len {
            let idx = (hand + offset) % len;
            if frames[idx].is_evictable() {
                return Ok(Some(idx));
            }
        }
        Ok(None)
    }
}

/// LRU: a monotonic tick increments on every access (hit or miss-fill); each
/// frame remembers the tick at its most recent access in `policy_cookie`.
/// The victim is the unpinned frame with the smallest recorded tick.
#[derive(Debug, Default)]
pub struct Lru {
    tick: u64,
}

impl Lru {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for Lru {
    fn record_access(&mut self, frames: &mut [Frame], frame_idx: usize) {
        self.tick += 1;
        frames[frame_idx].policy_cookie = self.tick;
    }

    fn choose_victim(
        &mut self,
        frames: &mut [Frame],
        _flush: &mut dyn FnMut(&Frame) -> Result<()>,
    ) -> Result<Option<usize>> {
        let victim = frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_evictable())
            .min_by_key(|(_, f)| f.policy_cookie)
            .map(|(idx, _)| idx);
        Ok(victim)
    }
}

/// CLOCK (second-chance): each frame carries a reference bit in
/// `policy_cookie` (0 or 1). A shared hand sweeps the frame array; a
/// referenced frame is given a second chance (bit cleared, hand advances); an
/// unreferenced dirty frame is flushed and passed over; an unreferenced clean
/// frame is evicted.
#[derive(Debug, Default)]
pub struct Clock {
    hand: usize,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for Clock {
    fn record_access(&mut self, frames: &mut [Frame], frame_idx: usize) {
        frames[frame_idx].policy_cookie = 1;
    }

    fn choose_victim(
        &mut self,
        frames: &mut [Frame],
        flush: &mut dyn FnMut(&Frame) -> Result<()>,
    ) -> Result<Option<usize>> {
        let len = frames.len();
        if len == 0 {
            return Ok(None);
        }
        if !frames.iter().any(Frame::is_evictable) {
            return Ok(None);
        }

        // Bounded to two full sweeps: the first clears every reference bit,
        // the second is guaranteed to find a victim.
        for _ in 0..(2 * len) {
            let idx = self.hand;
            self.hand = (self.hand + 1) % len;

            if !frames[idx].is_evictable() {
                continue;
            }
            if frames[idx].policy_cookie == 1 {
                frames[idx].policy_cookie = 0;
                continue;
            }
            if frames[idx].dirty {
                flush(&frames[idx])?;
                frames[idx].dirty = false;
                continue;
            }
            return Ok(Some(idx));
        }
        Ok(None)
    }
}
