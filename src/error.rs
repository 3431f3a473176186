//! Error types for tupledb storage operations.

use thiserror::Error;

/// Result type alias using [`StorageError`].
pub type Result<T> = std::result::Result<T, StorageError>;

/// Every fallible boundary operation in this crate returns one of these variants
/// instead of panicking or propagating an out-of-band exception.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The buffer pool could not allocate its frame array.
    #[error("buffer pool init failed: {0}")]
    PoolInitFailed(String),

    /// `shutdown` or `close_table` was called while a frame was still pinned.
    #[error("page {0} is still pinned")]
    PageStillPinned(i32),

    /// Every frame in the pool is pinned; no victim is available.
    #[error("no free frame available in buffer pool")]
    NoFreeFrame,

    /// A heap allocation failed.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// The paged-file adapter reported an I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `Table::open` failed for a subordinate reason (bad header, missing file, ...).
    #[error("failed to open table {name}: {reason}")]
    TableOpenFailed { name: String, reason: String },

    /// `Table::delete` failed to remove the backing file.
    #[error("failed to delete table {name}: {reason}")]
    TableDeleteFailed { name: String, reason: String },

    /// `insert_record` failed.
    #[error("insert failed: {0}")]
    InsertFailed(String),

    /// `delete_record` failed.
    #[error("delete failed: {0}")]
    DeleteFailed(String),

    /// `update_record` failed.
    #[error("update failed: {0}")]
    UpdateFailed(String),

    /// `get_record` found the slot free (not occupied by `'#'`).
    #[error("no record at the given RID")]
    NoSuchRecord,

    /// A scan cursor has examined every tuple in the table.
    #[error("no more tuples")]
    NoMoreTuples,

    /// `start_scan` was called with no predicate.
    #[error("scan requires a predicate")]
    MissingScanCondition,

    /// An attribute or schema reference named an unrecognized data type.
    #[error("unknown data type: {0}")]
    UnknownDatatype(String),

    /// An attribute number was out of range (negative or ≥ `num_attr`).
    #[error("bad attribute number: {0}")]
    BadAttrNum(i32),

    /// A required argument was absent where the contract forbids it.
    #[error("null argument: {0}")]
    NullArgument(&'static str),

    /// A replacement policy or other pluggable strategy was requested that this
    /// build does not implement.
    #[error("strategy not implemented: {0}")]
    StrategyNotImplemented(String),
}
