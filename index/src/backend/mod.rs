// index/src/backend/mod.rs

//! Owner of the metadata record.
//!
//! [`Backend`] keeps the decoded [`Metadata`] in memory together with a dirty
//! flag, applies the mutation policy (read-only mode, key sizing) before any
//! change, and writes the record back at commit points. Node pages are not
//! touched here.

use log::debug;

use crate::codec::{read_at, write_at};
use crate::meta::{Flags, Metadata, METADATA_OFFSET, METADATA_SIZE};
use crate::page::{LinearLayout, PageId, PageLayout};
use crate::store::ByteStore;
use crate::{IndexError, Result};

/// Page size used by [`Backend::create`] when none is configured.
pub const DEFAULT_PAGE_SIZE: u16 = 4096;

/// Key size limit used by [`Backend::create`] when none is configured.
pub const DEFAULT_MAX_KEY_SIZE: u16 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Reject every mutation.
    pub read_only: bool,
    /// Page size for new stores. On open, the stored page size must match
    /// when this is set.
    pub page_size: Option<u16>,
    /// Key size limit for new stores. Ignored on open.
    pub max_key_size: u16,
    /// Byte offset of the metadata record, and of page 0.
    pub meta_offset: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_only: false,
            page_size: None,
            max_key_size: DEFAULT_MAX_KEY_SIZE,
            meta_offset: METADATA_OFFSET,
        }
    }
}

impl Config {
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn page_size(mut self, page_size: u16) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn max_key_size(mut self, max_key_size: u16) -> Self {
        self.max_key_size = max_key_size;
        self
    }

    pub fn meta_offset(mut self, offset: u64) -> Self {
        self.meta_offset = offset;
        self
    }
}

/// A store together with its decoded metadata record.
///
/// All methods run synchronously on the caller's thread. The dirty flag is
/// plain state guarded by `&mut self`; sharing a backend across threads is up
/// to the owning tree.
#[derive(Debug)]
pub struct Backend<S: ByteStore> {
    store: S,
    meta: Metadata,
    layout: LinearLayout,
    offset: u64,
    read_only: bool,
    dirty: bool,
}

impl<S: ByteStore> Backend<S> {
    /// Initializes a new tree in `store` and writes its metadata record.
    ///
    /// Whatever was at the metadata offset is overwritten.
    pub fn create(mut store: S, config: Config) -> Result<Self> {
        if config.read_only {
            return Err(IndexError::Immutable);
        }

        let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let meta = Metadata::new(page_size, config.max_key_size);
        meta.validate()?;

        write_at(&mut store, config.meta_offset, &meta)?;
        debug!(
            "created index at offset {} (page size {}, max key {})",
            config.meta_offset, meta.page_size, meta.max_key_size
        );

        Ok(Self {
            store,
            meta,
            layout: LinearLayout::new(config.meta_offset, meta.page_size),
            offset: config.meta_offset,
            read_only: false,
            dirty: false,
        })
    }

    /// Loads and validates the metadata record of an existing tree.
    pub fn open(mut store: S, config: Config) -> Result<Self> {
        let meta = Self::load(&mut store, config.meta_offset)?;

        if let Some(expected) = config.page_size {
            if meta.page_size != expected {
                return Err(IndexError::InvalidMetadata(format!(
                    "page size mismatch: configured {expected}, stored {}",
                    meta.page_size
                )));
            }
        }

        debug!(
            "opened index at offset {} (version {}, {} entries, root {:?}, read-only: {})",
            config.meta_offset, meta.version, meta.size, meta.root, config.read_only
        );

        Ok(Self {
            store,
            meta,
            layout: LinearLayout::new(config.meta_offset, meta.page_size),
            offset: config.meta_offset,
            read_only: config.read_only,
            dirty: false,
        })
    }

    // Decodes into a scratch record so a failed decode never leaks out
    fn load(store: &mut S, offset: u64) -> Result<Metadata> {
        let mut meta = Metadata::default();
        read_at(store, offset, METADATA_SIZE, &mut meta)?;
        meta.validate()?;
        Ok(meta)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    pub fn root(&self) -> Option<PageId> {
        self.meta.root
    }

    pub fn len(&self) -> u32 {
        self.meta.size
    }

    pub fn is_empty(&self) -> bool {
        self.meta.size == 0
    }

    pub fn version(&self) -> u8 {
        self.meta.version
    }

    pub fn flags(&self) -> Flags {
        self.meta.flags
    }

    pub fn page_size(&self) -> u16 {
        self.meta.page_size
    }

    pub fn max_key_size(&self) -> u16 {
        self.meta.max_key_size
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// True when the in-memory record has changes not yet committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn layout(&self) -> &LinearLayout {
        &self.layout
    }

    /// Byte offset of `page` in the store.
    pub fn page_offset(&self, page: PageId) -> u64 {
        self.layout.offset_of(page)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the store back. Uncommitted changes are dropped.
    pub fn into_inner(self) -> S {
        self.store
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(IndexError::Immutable);
        }
        Ok(())
    }

    /// Rejects keys the tree cannot store: empty ones and ones longer than
    /// the configured limit.
    pub fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(IndexError::EmptyKey);
        }
        if key.len() > usize::from(self.meta.max_key_size) {
            return Err(IndexError::KeyTooLarge {
                len: key.len(),
                max: self.meta.max_key_size,
            });
        }
        Ok(())
    }

    fn ensure_mutable_key(&self, key: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.check_key(key)
    }

    /// Accounts for a new entry under `key`.
    pub fn record_insert(&mut self, key: &[u8]) -> Result<()> {
        self.ensure_mutable_key(key)?;

        let size = self.meta.size.checked_add(1);
        self.meta.size = size.ok_or(IndexError::SizeOverflow)?;
        self.dirty = true;
        Ok(())
    }

    /// Checks that `key` may be overwritten. The entry count is unchanged.
    pub fn record_update(&mut self, key: &[u8]) -> Result<()> {
        self.ensure_mutable_key(key)
    }

    /// Accounts for the removal of the entry under `key`.
    pub fn record_delete(&mut self, key: &[u8]) -> Result<()> {
        self.ensure_mutable_key(key)?;

        let size = self.meta.size.checked_sub(1);
        self.meta.size = size.ok_or(IndexError::SizeUnderflow)?;
        self.dirty = true;
        Ok(())
    }

    /// Points the tree at a new root page, or marks it empty with `None`.
    pub fn set_root(&mut self, root: Option<PageId>) -> Result<()> {
        self.ensure_writable()?;

        if self.meta.root != root {
            self.meta.root = root;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn set_flags(&mut self, flags: Flags) -> Result<()> {
        self.ensure_writable()?;

        if self.meta.flags != flags {
            self.meta.flags = flags;
            self.dirty = true;
        }
        Ok(())
    }

    /// Writes the record back if it changed since the last commit.
    ///
    /// On failure the record stays dirty so the commit can be repeated.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.ensure_writable()?;

        write_at(&mut self.store, self.offset, &self.meta)?;
        self.dirty = false;
        debug!(
            "committed index metadata ({} entries, root {:?})",
            self.meta.size, self.meta.root
        );
        Ok(())
    }

    /// Re-reads the record from the store, dropping uncommitted changes.
    ///
    /// On failure the in-memory record is left as it was.
    pub fn reload(&mut self) -> Result<()> {
        let meta = Self::load(&mut self.store, self.offset)?;
        if meta.page_size != self.meta.page_size {
            return Err(IndexError::InvalidMetadata(format!(
                "page size changed on disk: was {}, now {}",
                self.meta.page_size, meta.page_size
            )));
        }

        self.meta = meta;
        self.dirty = false;
        Ok(())
    }
}
