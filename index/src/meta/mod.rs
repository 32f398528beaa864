// index/src/meta/mod.rs

//! Root metadata record of the tree.
//!
//! The record is 14 bytes, big-endian, at fixed field offsets:
//!
//! ```text
//! 0      version   u8
//! 1      flags     u8
//! 2..4   maxKeySz  u16
//! 4..6   pageSz    u16
//! 6..10  size      u32
//! 10..14 rootID    u32 (0 = empty tree)
//! ```
//!
//! The layout is the same on every host; nothing here depends on the
//! in-memory representation of [`Metadata`].

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{Decode, Encode};
use crate::page::{PageId, PAGE_ID_SIZE};
use crate::{IndexError, Result};

/// Bytes reserved on disk for the record.
pub const METADATA_SIZE: usize = 14;

/// Where the record lives in a store unless configured otherwise.
pub const METADATA_OFFSET: u64 = 0;

/// On-disk format version written by this crate.
pub const CURRENT_VERSION: u8 = 1;

/// Format flag bits.
///
/// Bits this build does not know about are carried through decode and encode
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// Global state of the tree, persisted at the metadata offset.
///
/// Whether the in-memory copy differs from disk is tracked by the owning
/// [`Backend`](crate::Backend), never here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    pub version: u8,
    pub flags: Flags,
    /// Longest key the tree accepts, in bytes.
    pub max_key_size: u16,
    /// Size of every page, fixed for the life of the store.
    pub page_size: u16,
    /// Number of entries reachable from the root.
    pub size: u32,
    /// Entry page of the tree, `None` while the tree is empty.
    pub root: Option<PageId>,
}

impl Metadata {
    /// A fresh record for an empty tree in the current format.
    pub fn new(page_size: u16, max_key_size: u16) -> Self {
        Self {
            version: CURRENT_VERSION,
            flags: Flags::empty(),
            max_key_size,
            page_size,
            size: 0,
            root: None,
        }
    }

    /// Checks the invariants decode does not: a known version, a non-zero
    /// key limit, and a page able to hold one key plus one page pointer.
    ///
    /// Page 0 carries the record, so a page is also never smaller than
    /// [`METADATA_SIZE`]; otherwise page 1 would start inside the record.
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 || self.version > CURRENT_VERSION {
            return Err(IndexError::InvalidMetadata(format!(
                "unsupported format version: {}",
                self.version
            )));
        }

        if self.max_key_size == 0 {
            return Err(IndexError::InvalidMetadata(
                "max key size must be greater than zero".to_string(),
            ));
        }

        let key_and_pointer = usize::from(self.max_key_size) + PAGE_ID_SIZE;
        let needed = key_and_pointer.max(METADATA_SIZE);
        if usize::from(self.page_size) < needed {
            return Err(IndexError::InvalidMetadata(format!(
                "page size {} is below the {needed}-byte minimum for a {}-byte key limit",
                self.page_size, self.max_key_size
            )));
        }

        Ok(())
    }
}

impl Encode for Metadata {
    fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(METADATA_SIZE);
        buf.put_u8(self.version);
        buf.put_u8(self.flags.bits());
        buf.put_u16(self.max_key_size);
        buf.put_u16(self.page_size);
        buf.put_u32(self.size);
        buf.put_u32(PageId::to_raw(self.root));
        Ok(buf.freeze())
    }
}

impl Decode for Metadata {
    const ENCODED_LEN: usize = METADATA_SIZE;

    /// Trailing bytes past the record are ignored.
    fn decode(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() < METADATA_SIZE {
            return Err(IndexError::InsufficientData {
                needed: METADATA_SIZE,
                got: buf.len(),
            });
        }

        let mut buf = &buf[..METADATA_SIZE];
        self.version = buf.get_u8();
        self.flags = Flags::from_bits(buf.get_u8());
        self.max_key_size = buf.get_u16();
        self.page_size = buf.get_u16();
        self.size = buf.get_u32();
        self.root = PageId::from_raw(buf.get_u32());
        Ok(())
    }
}
