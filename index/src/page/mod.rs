// index/src/page/mod.rs

use std::fmt;
use std::num::NonZeroU32;

/// Width of a page identifier on disk.
pub const PAGE_ID_SIZE: usize = 4;

/// Handle for a fixed-size page in the backing store.
///
/// Page 0 holds the metadata record and is never handed out to the tree, so
/// the on-disk value 0 is free to mean "no page". `Option<PageId>` is the
/// same size as a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(NonZeroU32);

impl PageId {
    /// Returns `None` for the reserved page 0.
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Decodes an on-disk page reference, where 0 means absent.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Self::new(raw)
    }

    /// Encodes an optional page reference, writing 0 for absent.
    pub const fn to_raw(id: Option<Self>) -> u32 {
        match id {
            Some(id) => id.get(),
            None => 0,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps page identifiers onto byte offsets of the store.
///
/// Supplied by the page allocator; this layer only consumes it.
pub trait PageLayout {
    /// Size in bytes of every page.
    fn page_size(&self) -> u16;

    /// Byte offset of the first byte of `page`.
    fn offset_of(&self, page: PageId) -> u64;
}

/// Pages laid end to end after `base`, page `n` at `base + n * page_size`.
///
/// Page 0 starts at `base` and holds the metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearLayout {
    base: u64,
    page_size: u16,
}

impl LinearLayout {
    pub const fn new(base: u64, page_size: u16) -> Self {
        Self { base, page_size }
    }

    pub const fn base(&self) -> u64 {
        self.base
    }
}

impl PageLayout for LinearLayout {
    fn page_size(&self) -> u16 {
        self.page_size
    }

    fn offset_of(&self, page: PageId) -> u64 {
        self.base + u64::from(page.get()) * u64::from(self.page_size)
    }
}
