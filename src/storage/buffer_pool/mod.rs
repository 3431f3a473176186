//! Buffer pool: a bounded in-memory cache of pages with explicit pinning and
//! a pluggable replacement policy.
//!
//! Access to a `BufferPool` is serial by contract — nothing here uses
//! `Mutex`/`RwLock`, only plain `&mut self` methods. A [`PageHandle`] is a
//! small `Copy` value identifying a pinned frame; callers fetch its bytes
//! through [`BufferPool::frame_data`]/[`BufferPool::frame_data_mut`] rather
//! than holding a borrow, since the pool itself needs `&mut self` to serve
//! later requests.

mod buffer_frame;
mod eviction;

pub use buffer_frame::Frame;
pub use eviction::{Clock, Fifo, Lru, ReplacementPolicy};

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::error::{Result, StorageError};
use crate::storage::page::{DiskManager, Page, PageId, PAGE_SIZE};

/// A pinned reference to a resident page. Cheap to copy; carries no borrow
/// of the pool, so it can be held across calls that also need `&mut` access
/// to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    page_id: PageId,
    frame_idx: usize,
}

impl PageHandle {
    /// The page this handle refers to.
    #[must_use]
    pub fn page_id(self) -> PageId {
        self.page_id
    }
}

/// Snapshot of one frame's state, returned by [`BufferPool::introspect`].
#[derive(Debug, Clone, Copy)]
pub struct FrameSnapshot {
    pub page_id: PageId,
    pub dirty: bool,
    pub pin_count: u32,
}

/// A bounded cache of pages backed by a single paged file.
pub struct BufferPool {
    frames: Vec<Frame>,
    page_table: HashMap<PageId, usize>,
    policy: Box<dyn ReplacementPolicy>,
    disk_manager: DiskManager,
    read_io: u64,
    write_io: u64,
}

impl BufferPool {
    /// `init`: creates `capacity` empty frames over `disk_manager` using the
    /// given replacement policy.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PoolInitFailed`] if `capacity` is zero.
    pub fn new(
        capacity: usize,
        policy: Box<dyn ReplacementPolicy>,
        disk_manager: DiskManager,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(StorageError::PoolInitFailed(
                "capacity must be greater than zero".to_string(),
            ));
        }
        let frames = (0..capacity).map(Frame::new).collect();
        debug!("buffer pool initialized with {capacity} frames");
        Ok(Self {
            frames,
            page_table: HashMap::with_capacity(capacity),
            policy,
            disk_manager,
            read_io: 0,
            write_io: 0,
        })
    }

    /// Number of frames in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Number of pages fetched from disk since creation (or the last reset).
    #[must_use]
    pub fn read_io(&self) -> u64 {
        self.read_io
    }

    /// Number of pages written to disk since creation (or the last reset).
    #[must_use]
    pub fn write_io(&self) -> u64 {
        self.write_io
    }

    /// `pin`: returns a handle to `page_id`'s resident frame, loading it from
    /// disk first if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchRecord`] if `page_id` is negative (the
    /// `NO_PAGE` sentinel or any other invalid reference) — computing a file
    /// offset for it would otherwise overflow. Returns
    /// [`StorageError::NoFreeFrame`] if every frame is pinned, or propagates
    /// an I/O error from the paged-file adapter.
    pub fn pin(&mut self, page_id: PageId) -> Result<PageHandle> {
        if page_id.is_none() {
            return Err(StorageError::NoSuchRecord);
        }
        if let Some(&frame_idx) = self.page_table.get(&page_id) {
            self.frames[frame_idx].pin();
            self.policy.record_access(&mut self.frames, frame_idx);
            trace!("pin hit: page {page_id} in frame {frame_idx}");
            return Ok(PageHandle { page_id, frame_idx });
        }

        let frame_idx = self.acquire_frame()?;

        let page = self.disk_manager.read_block(page_id)?;
        self.read_io += 1;
        self.policy.note_disk_read();

        self.frames[frame_idx].content = page.data;
        self.frames[frame_idx].page_id = page_id;
        self.frames[frame_idx].pin_count = 1;
        self.frames[frame_idx].dirty = false;
        self.policy.record_access(&mut self.frames, frame_idx);
        self.page_table.insert(page_id, frame_idx);
        trace!("pin miss: loaded page {page_id} into frame {frame_idx}");

        Ok(PageHandle { page_id, frame_idx })
    }

    /// `unpin`: decrements the pin count of the frame holding `page_id`.
    /// A page not currently resident is a no-op — this mirrors the original
    /// C implementation's behavior rather than treating it as an error (see
    /// DESIGN.md).
    pub fn unpin(&mut self, page_id: PageId) {
        if let Some(&frame_idx) = self.page_table.get(&page_id) {
            self.frames[frame_idx].unpin();
        }
    }

    /// `markDirty`: flags the frame holding `page_id` as dirty.
    pub fn mark_dirty(&mut self, page_id: PageId) {
        if let Some(&frame_idx) = self.page_table.get(&page_id) {
            self.frames[frame_idx].dirty = true;
        }
    }

    /// Read-only view of a pinned page's bytes.
    #[must_use]
    pub fn frame_data(&self, handle: PageHandle) -> &[u8; PAGE_SIZE] {
        &self.frames[handle.frame_idx].content
    }

    /// Mutable view of a pinned page's bytes. Does not itself set the dirty
    /// bit — callers that mutate content must call [`Self::mark_dirty`].
    pub fn frame_data_mut(&mut self, handle: PageHandle) -> &mut [u8; PAGE_SIZE] {
        &mut self.frames[handle.frame_idx].content
    }

    /// `forcePage`: writes the frame holding `page_id` back to disk and
    /// clears its dirty bit, regardless of pin count.
    ///
    /// # Errors
    ///
    /// Propagates an I/O error from the paged-file adapter.
    pub fn force_page(&mut self, page_id: PageId) -> Result<()> {
        if let Some(&frame_idx) = self.page_table.get(&page_id) {
            self.write_frame(frame_idx)?;
        }
        Ok(())
    }

    /// `forceFlushPool`: writes back every dirty, unpinned frame; leaves
    /// pinned dirty frames untouched.
    ///
    /// # Errors
    ///
    /// Propagates an I/O error from the paged-file adapter.
    pub fn force_flush_pool(&mut self) -> Result<()> {
        for frame_idx in 0..self.frames.len() {
            let frame = &self.frames[frame_idx];
            if frame.dirty && frame.pin_count == 0 {
                self.write_frame(frame_idx)?;
            }
        }
        Ok(())
    }

    /// `shutdown`: force-flushes all dirty, unpinned frames.
    ///
    /// Takes `&mut self` rather than consuming the pool: a refused shutdown
    /// must leave the existing instance intact so the caller can unpin the
    /// offending page and retry against the same pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PageStillPinned`] if any frame is still
    /// pinned, leaving the pool's state untouched.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(frame) = self.frames.iter().find(|f| f.pin_count > 0) {
            warn!("shutdown refused: page {} still pinned", frame.page_id);
            return Err(StorageError::PageStillPinned(frame.page_id.raw()));
        }
        self.force_flush_pool()?;
        debug!("buffer pool shut down cleanly");
        Ok(())
    }

    /// `introspection`: a snapshot of every frame's (page id, dirty, pin
    /// count) state, in frame order.
    #[must_use]
    pub fn introspect(&self) -> Vec<FrameSnapshot> {
        self.frames
            .iter()
            .map(|f| FrameSnapshot {
                page_id: f.page_id,
                dirty: f.dirty,
                pin_count: f.pin_count,
            })
            .collect()
    }

    fn acquire_frame(&mut self) -> Result<usize> {
        if let Some(idx) = self.frames.iter().position(Frame::is_empty) {
            return Ok(idx);
        }

        let Self {
            frames,
            disk_manager,
            write_io,
            ..
        } = self;
        let victim = self.policy.choose_victim(frames, &mut |frame| {
            disk_manager.write_block(&Page::from_data(frame.page_id, frame.content))?;
            *write_io += 1;
            Ok(())
        })?;

        let Some(frame_idx) = victim else {
            return Err(StorageError::NoFreeFrame);
        };

        if self.frames[frame_idx].dirty {
            self.write_frame(frame_idx)?;
        }
        let victim_page = self.frames[frame_idx].page_id;
        self.page_table.remove(&victim_page);
        self.frames[frame_idx].reset();

        Ok(frame_idx)
    }

    fn write_frame(&mut self, frame_idx: usize) -> Result<()> {
        let frame = &self.frames[frame_idx];
        if frame.page_id.is_none() {
            return Ok(());
        }
        let page = Page::from_data(frame.page_id, frame.content);
        self.disk_manager.write_block(&page)?;
        self.write_io += 1;
        self.frames[frame_idx].dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_pool(capacity: usize) -> (BufferPool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.tbl");
        let dm = DiskManager::create(&db_path).unwrap();
        let pool = BufferPool::new(capacity, Box::new(Fifo::new()), dm).unwrap();
        (pool, temp_dir)
    }

    #[test]
    fn new_page_reads_zero_filled() {
        let (mut pool, _temp) = create_test_pool(4);
        let handle = pool.pin(PageId::new(0)).unwrap();
        assert!(pool.frame_data(handle).iter().all(|&b| b == 0));
    }

    #[test]
    fn pin_unpin_roundtrip_persists_writes() {
        let (mut pool, _temp) = create_test_pool(4);

        let handle = pool.pin(PageId::new(0)).unwrap();
        pool.frame_data_mut(handle)[0] = 42;
        pool.mark_dirty(PageId::new(0));
        pool.unpin(PageId::new(0));
        pool.force_page(PageId::new(0)).unwrap();

        let handle2 = pool.pin(PageId::new(0)).unwrap();
        assert_eq!(pool.frame_data(handle2)[0], 42);
    }

    #[test]
    fn unpin_unknown_page_is_a_no_op() {
        let (mut pool, _temp) = create_test_pool(4);
        pool.unpin(PageId::new(99));
    }

    #[test]
    fn pin_rejects_negative_page_id_instead_of_overflowing() {
        let (mut pool, _temp) = create_test_pool(4);
        let err = pool.pin(crate::storage::page::NO_PAGE).unwrap_err();
        assert!(matches!(err, StorageError::NoSuchRecord));
    }

    #[test]
    fn no_free_frame_when_all_pinned() {
        let (mut pool, _temp) = create_test_pool(2);
        let _h0 = pool.pin(PageId::new(0)).unwrap();
        let _h1 = pool.pin(PageId::new(1)).unwrap();
        let err = pool.pin(PageId::new(2)).unwrap_err();
        assert!(matches!(err, StorageError::NoFreeFrame));
    }

    #[test]
    fn shutdown_fails_with_pinned_page() {
        let (mut pool, _temp) = create_test_pool(2);
        let _h0 = pool.pin(PageId::new(0)).unwrap();
        let err = pool.shutdown().unwrap_err();
        assert!(matches!(err, StorageError::PageStillPinned(0)));
    }

    #[test]
    fn shutdown_succeeds_on_the_same_pool_once_unpinned() {
        let (mut pool, _temp) = create_test_pool(2);
        pool.pin(PageId::new(0)).unwrap();
        let err = pool.shutdown().unwrap_err();
        assert!(matches!(err, StorageError::PageStillPinned(0)));

        pool.unpin(PageId::new(0));
        pool.shutdown().unwrap();
    }

    #[test]
    fn fifo_evicts_oldest_loaded_page() {
        // Pool size 3, FIFO. Pin 1,2,3 (each once, then unpin). Pin 4.
        // Expect page 1 evicted, readIO = 4, writeIO = 0.
        let (mut pool, _temp) = create_test_pool(3);

        for i in 1..=3 {
            let h = pool.pin(PageId::new(i)).unwrap();
            pool.unpin(h.page_id());
        }
        pool.pin(PageId::new(4)).unwrap();

        assert_eq!(pool.read_io(), 4);
        assert_eq!(pool.write_io(), 0);
        assert!(!pool.page_table.contains_key(&PageId::new(1)));
    }

    #[test]
    fn lru_evicts_oldest_untouched_page() {
        // Pool size 3, LRU. Pin & unpin 1, 2, 3; pin & unpin 1 again; pin 4.
        // Expect page 2 evicted (oldest untouched), readIO = 4.
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.tbl");
        let dm = DiskManager::create(&db_path).unwrap();
        let mut pool = BufferPool::new(3, Box::new(Lru::new()), dm).unwrap();

        for i in 1..=3 {
            let h = pool.pin(PageId::new(i)).unwrap();
            pool.unpin(h.page_id());
        }
        let h1 = pool.pin(PageId::new(1)).unwrap();
        pool.unpin(h1.page_id());

        pool.pin(PageId::new(4)).unwrap();

        assert_eq!(pool.read_io(), 4);
        assert!(!pool.page_table.contains_key(&PageId::new(2)));
        assert!(pool.page_table.contains_key(&PageId::new(1)));
    }

    #[test]
    fn clock_two_round_sweep_evicts_after_both_bits_clear() {
        // Pool size 2, CLOCK. Pin & unpin 1, 2 (both reference bits set). Pin 3.
        // Expect: first pass clears bits on 1 and 2, second pass evicts page 1,
        // readIO = 3.
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.tbl");
        let dm = DiskManager::create(&db_path).unwrap();
        let mut pool = BufferPool::new(2, Box::new(Clock::new()), dm).unwrap();

        let h1 = pool.pin(PageId::new(1)).unwrap();
        pool.unpin(h1.page_id());
        let h2 = pool.pin(PageId::new(2)).unwrap();
        pool.unpin(h2.page_id());

        pool.pin(PageId::new(3)).unwrap();

        assert_eq!(pool.read_io(), 3);
        assert!(!pool.page_table.contains_key(&PageId::new(1)));
        assert!(pool.page_table.contains_key(&PageId::new(2)));
    }

    #[test]
    fn pool_capacity_one_blocks_second_pin_until_unpinned() {
        // Pool of capacity 1: pin A, pin B -> NO_FREE_FRAME unless A unpinned;
        // after unpin A, pin B evicts A (writing back if dirty).
        let (mut pool, _temp) = create_test_pool(1);

        let a = pool.pin(PageId::new(1)).unwrap();
        pool.frame_data_mut(a)[0] = 7;
        pool.mark_dirty(a.page_id());

        let err = pool.pin(PageId::new(2)).unwrap_err();
        assert!(matches!(err, StorageError::NoFreeFrame));

        pool.unpin(a.page_id());
        pool.pin(PageId::new(2)).unwrap();

        assert_eq!(pool.write_io(), 1);
        assert!(!pool.page_table.contains_key(&PageId::new(1)));
    }

    #[test]
    fn introspect_reports_pin_and_dirty_state() {
        let (mut pool, _temp) = create_test_pool(2);
        let h = pool.pin(PageId::new(0)).unwrap();
        pool.mark_dirty(h.page_id());

        let snapshot = pool.introspect();
        assert_eq!(snapshot[0].page_id, PageId::new(0));
        assert_eq!(snapshot[0].pin_count, 1);
        assert!(snapshot[0].dirty);
    }
}
