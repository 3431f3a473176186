//! The paged-file adapter: synchronous, fixed-block I/O over a single file.
//!
//! Since no existing crate matches this exact `readBlock`/`writeBlock`-by-page-number
//! shape, it lives in-crate as a thin wrapper over [`std::fs::File`].

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage::page::{Page, PageId, PAGE_SIZE};

/// Manages synchronous disk I/O for one table's paged file.
pub struct DiskManager {
    path: PathBuf,
    file: File,
}

impl DiskManager {
    /// `createPageFile`: creates a fresh, empty paged file, failing if it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::Io`] if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// `openPageFile`: opens an existing paged file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::Io`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// `destroyPageFile`: removes a paged file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::Io`] if the file cannot be removed.
    pub fn destroy(path: &Path) -> Result<()> {
        std::fs::remove_file(path)?;
        Ok(())
    }

    /// Returns the path to the paged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of whole pages currently persisted in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's metadata cannot be read.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.metadata()?.len();
        Ok(len.div_ceil(PAGE_SIZE as u64) as u32)
    }

    /// `readBlock`: reads one page from disk.
    ///
    /// A read past the current end of file returns a zero-filled page (implicit
    /// extension), so new data pages read back as all-slots-free.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying seek or read fails for any reason other
    /// than an end-of-file short read.
    pub fn read_block(&mut self, page_id: PageId) -> Result<Page> {
        self.file.seek(SeekFrom::Start(page_id.offset(PAGE_SIZE)))?;

        let mut data = [0u8; PAGE_SIZE];
        match self.file.read_exact(&mut data) {
            Ok(()) => Ok(Page::from_data(page_id, data)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(Page::new(page_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// `writeBlock`: writes one page to disk, extending the file if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying seek or write fails.
    pub fn write_block(&mut self, page: &Page) -> Result<()> {
        self.file.seek(SeekFrom::Start(page.id.offset(PAGE_SIZE)))?;
        self.file.write_all(&page.data)?;
        Ok(())
    }

    /// Flushes OS-buffered writes to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
