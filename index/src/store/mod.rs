// index/src/store/mod.rs

//! Random-access byte stores.
//!
//! The tree never talks to a file directly. Everything goes through
//! [`ByteStore`], which only knows how to read and write bytes at an offset.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// A random-access byte store.
///
/// Implementations do no locking; callers serialize writers themselves.
pub trait ByteStore {
    /// Reads up to `len` bytes starting at `offset`.
    ///
    /// Returns fewer than `len` bytes only when the store ends before
    /// `offset + len`. Reading past the end yields an empty buffer, not an
    /// error.
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>>;

    /// Writes all of `bytes` starting at `offset`.
    ///
    /// Landing fewer bytes than `bytes.len()` is an error.
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()>;
}

impl<S: ByteStore + ?Sized> ByteStore for &mut S {
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        (**self).write_at(offset, bytes)
    }
}

impl ByteStore for File {
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(offset))?;

        let mut buffer = Vec::with_capacity(len);
        // `take` stops at EOF, leaving a short buffer for the caller to judge
        Read::take(&mut *self, len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(bytes)
    }
}

fn to_index(offset: u64) -> io::Result<usize> {
    usize::try_from(offset).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("offset {offset} is not addressable"),
        )
    })
}

/// An in-memory store backed by a growable buffer.
///
/// Writes past the current end zero-fill the gap, the same way a sparse file
/// would read back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    data: Vec<u8>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl ByteStore for MemStore {
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = to_index(offset)?.min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let start = to_index(offset)?;
        let end = start
            .checked_add(bytes.len())
            .ok_or(io::ErrorKind::InvalidInput)?;

        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(bytes);
        Ok(())
    }
}

/// A memory-mapped region of fixed length.
///
/// The mapping cannot grow, so a write that does not fit fails before any
/// byte is copied.
#[cfg(feature = "mmap")]
impl ByteStore for memmap2::MmapMut {
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = to_index(offset)?.min(self.len());
        let end = start.saturating_add(len).min(self.len());
        Ok(self[start..end].to_vec())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let start = to_index(offset)?;
        let end = start
            .checked_add(bytes.len())
            .filter(|&end| end <= self.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!(
                        "write of {} bytes at offset {offset} exceeds mapping of {} bytes",
                        bytes.len(),
                        self.len()
                    ),
                )
            })?;

        self[start..end].copy_from_slice(bytes);
        Ok(())
    }
}

/// Store wrapper that counts calls, used to prove rejected operations never
/// touch the store.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct SpyStore {
    pub inner: MemStore,
    pub reads: usize,
    pub writes: usize,
}

#[cfg(test)]
impl ByteStore for SpyStore {
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.reads += 1;
        self.inner.read_at(offset, len)
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.writes += 1;
        self.inner.write_at(offset, bytes)
    }
}
