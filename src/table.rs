//! The record manager: a single-file table backed by a [`BufferPool`] over a
//! slotted-page layout, with a cached schema header.

use std::path::Path;

use log::debug;

use crate::error::{Result, StorageError};
use crate::record::{Record, Rid};
use crate::schema::Schema;
use crate::slotted_page::{self, FREE_MARKER, OCCUPIED_MARKER};
use crate::storage::buffer_pool::{BufferPool, ReplacementPolicy};
use crate::storage::page::{DiskManager, PageId};

/// An open table: buffer pool, cached schema, and the two header fields
/// (`tuple_count`, `free_list_hint`) that live on page 0 but are kept here in
/// memory between calls and written back on [`Table::close`].
pub struct Table {
    pool: BufferPool,
    schema: Schema,
    tuple_count: i32,
    free_list_hint: PageId,
    record_size: usize,
}

impl Table {
    /// `createTable`: writes a fresh page-0 header for `schema` to a new
    /// paged file at `path`. Does not open a buffer pool — callers follow up
    /// with [`Table::open`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TableOpenFailed`] if the file already exists or
    /// cannot be created, or if the schema header does not fit in one page.
    pub fn create(path: &Path, schema: &Schema) -> Result<()> {
        let name = path.display().to_string();
        let mut dm = DiskManager::create(path).map_err(|e| StorageError::TableOpenFailed {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        let header = schema
            .to_header_bytes(0, PageId::FIRST_DATA_PAGE.raw())
            .map_err(|e| StorageError::TableOpenFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let page = crate::storage::page::Page::from_data(PageId::HEADER, header);
        dm.write_block(&page).map_err(|e| StorageError::TableOpenFailed {
            name,
            reason: e.to_string(),
        })?;
        debug!("created table at {}", path.display());
        Ok(())
    }

    /// `openTable`: opens the paged file at `path`, attaches a buffer pool of
    /// `capacity` frames using `policy`, and parses the page-0 header.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TableOpenFailed`] if the file cannot be opened,
    /// the pool cannot be initialized, or the header fails to parse.
    pub fn open(path: &Path, capacity: usize, policy: Box<dyn ReplacementPolicy>) -> Result<Self> {
        let name = path.display().to_string();
        let dm = DiskManager::open(path).map_err(|e| StorageError::TableOpenFailed {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let mut pool =
            BufferPool::new(capacity, policy, dm).map_err(|e| StorageError::TableOpenFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        let handle = pool.pin(PageId::HEADER).map_err(|e| StorageError::TableOpenFailed {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let header = *pool.frame_data(handle);
        pool.unpin(PageId::HEADER);

        let (tuple_count, free_list_hint, schema) =
            Schema::from_header_bytes(&header).map_err(|e| StorageError::TableOpenFailed {
                name,
                reason: e.to_string(),
            })?;

        let record_size = schema.record_size();
        debug!("opened table at {} ({} tuples)", path.display(), tuple_count);
        Ok(Self {
            pool,
            schema,
            tuple_count,
            free_list_hint: PageId::new(free_list_hint),
            record_size,
        })
    }

    /// `destroyTable`: removes the paged file at `path`. The table must
    /// already be closed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TableDeleteFailed`] if the file cannot be removed.
    pub fn delete(path: &Path) -> Result<()> {
        DiskManager::destroy(path).map_err(|e| StorageError::TableDeleteFailed {
            name: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Writes the current `(tuple_count, free_list_hint)` header back to page
    /// 0 and shuts down the pool, failing if any page is still pinned.
    ///
    /// The original header lives in a mutable in-memory struct backed
    /// directly by the page; this Rust port caches those two fields on
    /// `Table` instead, so closing must write them back once (see
    /// DESIGN.md).
    ///
    /// Takes `&mut self` rather than consuming the table: a refused close
    /// must leave the existing instance intact so the caller can unpin the
    /// offending page and retry against the same table.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PageStillPinned`] if a frame is still pinned.
    pub fn close(&mut self) -> Result<()> {
        let header = self
            .schema
            .to_header_bytes(self.tuple_count, self.free_list_hint.raw())?;
        let handle = self.pool.pin(PageId::HEADER)?;
        *self.pool.frame_data_mut(handle) = header;
        self.pool.mark_dirty(PageId::HEADER);
        self.pool.unpin(PageId::HEADER);
        self.pool.shutdown()
    }

    /// Number of live tuples currently in the table.
    #[must_use]
    pub fn num_tuples(&self) -> i32 {
        self.tuple_count
    }

    /// The table's schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    pub(crate) fn record_size(&self) -> usize {
        self.record_size
    }

    /// `insertRecord`: finds the first free slot starting from
    /// `free_list_hint`, copies `record`'s payload in, marks it occupied, and
    /// stamps `record.id`.
    ///
    /// Pages past the current end of file read back zero-filled (all slots
    /// free), so the free-list hint walking forward transparently extends
    /// the file — no separate "allocate a new page" step is needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InsertFailed`] if no frame is available to
    /// scan candidate pages.
    pub fn insert_record(&mut self, record: &mut Record) -> Result<()> {
        let mut page_id = self.free_list_hint;
        if page_id.is_none() {
            page_id = PageId::FIRST_DATA_PAGE;
        }

        loop {
            let handle = self
                .pool
                .pin(page_id)
                .map_err(|e| StorageError::InsertFailed(e.to_string()))?;
            let slot = slotted_page::find_free_slot(self.pool.frame_data(handle), self.record_size);

            let Some(slot) = slot else {
                self.pool.unpin(page_id);
                page_id = page_id.next();
                continue;
            };

            let offset = slotted_page::slot_offset(slot, self.record_size);
            let page = self.pool.frame_data_mut(handle);
            page[offset] = OCCUPIED_MARKER;
            page[offset + 1..offset + self.record_size].copy_from_slice(record.payload());
            self.pool.mark_dirty(page_id);
            self.pool.unpin(page_id);

            #[allow(clippy::cast_possible_wrap)]
            let rid = Rid::new(page_id, slot as i32);
            record.id = rid;
            self.tuple_count += 1;
            self.free_list_hint = page_id;
            return Ok(());
        }
    }

    /// `deleteRecord`: marks `rid`'s slot free and points the free-list hint
    /// at its page.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchRecord`] if `rid` is out of range or the
    /// slot is not occupied, or [`StorageError::DeleteFailed`] if the page
    /// cannot be pinned.
    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        if rid.page.is_none() || rid.slot < 0 {
            return Err(StorageError::NoSuchRecord);
        }
        let handle = self
            .pool
            .pin(rid.page)
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        let offset = slotted_page::slot_offset(rid.slot as usize, self.record_size);

        if self.pool.frame_data(handle)[offset] != OCCUPIED_MARKER {
            self.pool.unpin(rid.page);
            return Err(StorageError::NoSuchRecord);
        }

        self.pool.frame_data_mut(handle)[offset] = FREE_MARKER;
        self.pool.mark_dirty(rid.page);
        self.pool.unpin(rid.page);

        self.tuple_count -= 1;
        self.free_list_hint = rid.page;
        Ok(())
    }

    /// `updateRecord`: overwrites the payload at `record.id`, leaving the
    /// occupancy marker untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchRecord`] if `record.id` is out of range
    /// or the slot is not occupied, or [`StorageError::UpdateFailed`] if the
    /// page cannot be pinned.
    pub fn update_record(&mut self, record: &Record) -> Result<()> {
        let rid = record.id;
        if rid.page.is_none() || rid.slot < 0 {
            return Err(StorageError::NoSuchRecord);
        }
        let handle = self
            .pool
            .pin(rid.page)
            .map_err(|e| StorageError::UpdateFailed(e.to_string()))?;
        let offset = slotted_page::slot_offset(rid.slot as usize, self.record_size);

        if self.pool.frame_data(handle)[offset] != OCCUPIED_MARKER {
            self.pool.unpin(rid.page);
            return Err(StorageError::NoSuchRecord);
        }

        let page = self.pool.frame_data_mut(handle);
        page[offset + 1..offset + self.record_size].copy_from_slice(record.payload());
        self.pool.mark_dirty(rid.page);
        self.pool.unpin(rid.page);
        Ok(())
    }

    /// `getRecord`: copies the record at `rid` out of the pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoSuchRecord`] if `rid` is out of range or the
    /// slot is not occupied.
    pub fn get_record(&mut self, rid: Rid) -> Result<Record> {
        if rid.page.is_none() || rid.slot < 0 {
            return Err(StorageError::NoSuchRecord);
        }
        let handle = self.pool.pin(rid.page)?;
        let offset = slotted_page::slot_offset(rid.slot as usize, self.record_size);
        let page = self.pool.frame_data(handle);

        if page[offset] != OCCUPIED_MARKER {
            self.pool.unpin(rid.page);
            return Err(StorageError::NoSuchRecord);
        }

        let data = page[offset..offset + self.record_size].to_vec();
        self.pool.unpin(rid.page);
        Ok(Record::from_raw(rid, data))
    }
}
