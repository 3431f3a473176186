//! The scan engine: a restartable cursor over every live tuple in a table,
//! filtered by a predicate.

use crate::error::{Result, StorageError};
use crate::expr::{eval_expr, Expr};
use crate::record::{Record, Rid};
use crate::slotted_page;
use crate::storage::page::PageId;
use crate::table::Table;
use crate::types::Value;

/// An in-progress scan over `table`, holding no page pinned between calls to
/// [`Scan::next`].
pub struct Scan<'a> {
    table: &'a mut Table,
    predicate: Expr,
    cursor: Option<Rid>,
    scan_count: i32,
}

impl<'a> Scan<'a> {
    /// `startScan`: begins a scan of `table` filtered by `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingScanCondition`] if `predicate` is `None`.
    pub fn start(table: &'a mut Table, predicate: Option<Expr>) -> Result<Self> {
        let predicate = predicate.ok_or(StorageError::MissingScanCondition)?;
        Ok(Self {
            table,
            predicate,
            cursor: None,
            scan_count: 0,
        })
    }

    /// `getNextRecord`: advances the cursor to the next tuple for which the
    /// predicate evaluates to `true`.
    ///
    /// Slots whose marker byte is not the occupied marker are skipped before
    /// the predicate is evaluated at all — stale payload bytes in a freed
    /// slot are never handed to the evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoMoreTuples`] once every tuple has been
    /// examined (and resets the cursor, so the scan can be restarted by
    /// calling `next` again). Propagates any error from pinning a page or
    /// evaluating the predicate.
    pub fn next(&mut self) -> Result<Record> {
        loop {
            if self.scan_count >= self.table.num_tuples() {
                self.cursor = None;
                self.scan_count = 0;
                return Err(StorageError::NoMoreTuples);
            }

            let rid = self.advance_cursor();
            let record_size = self.table.record_size();
            let pool = self.table.pool_mut();

            let handle = pool.pin(rid.page)?;
            let offset = slotted_page::slot_offset(rid.slot as usize, record_size);
            let occupied = pool.frame_data(handle)[offset] == slotted_page::OCCUPIED_MARKER;

            if !occupied {
                pool.unpin(rid.page);
                continue;
            }

            let data = pool.frame_data(handle)[offset..offset + record_size].to_vec();
            pool.unpin(rid.page);

            self.scan_count += 1;
            let record = Record::from_raw(rid, data);

            match eval_expr(&record, self.table.schema(), &self.predicate)? {
                Value::Bool(true) => return Ok(record),
                Value::Bool(false) => continue,
                other => {
                    return Err(StorageError::UnknownDatatype(format!(
                        "scan predicate must evaluate to a boolean, got {other:?}"
                    )))
                }
            }
        }
    }

    /// `closeScan`: releases the scan. Since [`Scan::next`] never holds a
    /// page pinned across calls, this is a no-op provided for API symmetry.
    pub fn close(self) {}

    fn advance_cursor(&mut self) -> Rid {
        let record_size = self.table.record_size();
        let capacity = slotted_page::slot_capacity(record_size);

        let next = match self.cursor {
            None => Rid::new(PageId::FIRST_DATA_PAGE, 0),
            Some(rid) => {
                let next_slot = rid.slot + 1;
                if next_slot as usize >= capacity {
                    Rid::new(rid.page.next(), 0)
                } else {
                    Rid::new(rid.page, next_slot)
                }
            }
        };
        self.cursor = Some(next);
        next
    }
}
