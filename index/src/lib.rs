//! Foundation layer of an on-disk B+Tree index
//!
//! This crate provides the byte-addressable I/O contract the tree is built
//! on, the fixed-layout metadata record anchoring its persistent state, and
//! the backend that owns that record and enforces the mutation policy.
//! Node layout, page allocation and the user-facing put/get/delete API live
//! above this layer.

pub mod backend;
pub mod codec;
pub mod meta;
pub mod page;
pub mod store;

pub use backend::{Backend, Config};
pub use codec::{decode_into, read_at, write_at, Decode, Encode};
pub use meta::{Flags, Metadata, CURRENT_VERSION, METADATA_OFFSET, METADATA_SIZE};
pub use page::{LinearLayout, PageId, PageLayout, PAGE_ID_SIZE};
pub use store::{ByteStore, MemStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("read insufficient data: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("insufficient data for decode: need {needed} bytes, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("cannot decode into a missing target")]
    MissingTarget,

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("invalid sized key: key is empty")]
    EmptyKey,

    #[error("invalid sized key: {len} bytes exceeds limit of {max}")]
    KeyTooLarge { len: usize, max: u16 },

    #[error("operation not allowed in read-only mode")]
    Immutable,

    #[error("entry count overflow")]
    SizeOverflow,

    #[error("entry count underflow: delete from an empty tree")]
    SizeUnderflow,

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
