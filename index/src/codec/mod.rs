// index/src/codec/mod.rs

//! Positioned binary codec.
//!
//! Records that live at a known offset implement [`Encode`] and [`Decode`];
//! [`write_at`] and [`read_at`] move them between memory and a [`ByteStore`].

use bytes::Bytes;
use log::trace;

use crate::store::ByteStore;
use crate::{IndexError, Result};

/// A value with a deterministic byte encoding.
pub trait Encode {
    fn encode(&self) -> Result<Bytes>;
}

/// A value that can be filled in from its byte encoding.
///
/// Decoding assigns fields one at a time and does not roll back on failure.
/// After an `Err`, the target may be partially overwritten and must be
/// discarded.
pub trait Decode {
    /// Minimum number of bytes a valid encoding occupies.
    const ENCODED_LEN: usize;

    fn decode(&mut self, buf: &[u8]) -> Result<()>;
}

/// Encodes `value` and writes it starting exactly at `offset`.
///
/// Encode errors and store errors are returned as-is. Nothing is retried.
pub fn write_at<S, T>(store: &mut S, offset: u64, value: &T) -> Result<()>
where
    S: ByteStore + ?Sized,
    T: Encode + ?Sized,
{
    let bytes = value.encode()?;
    store.write_at(offset, &bytes)?;
    trace!("wrote {} bytes at offset {}", bytes.len(), offset);
    Ok(())
}

/// Reads exactly `size` bytes at `offset` and decodes them into `into`.
///
/// A store that comes back with fewer than `size` bytes yields
/// [`IndexError::ShortRead`] and `into` is left alone. Decode errors are
/// returned as-is, in which case `into` may be partially written.
pub fn read_at<S, T>(store: &mut S, offset: u64, size: usize, into: &mut T) -> Result<()>
where
    S: ByteStore + ?Sized,
    T: Decode,
{
    let buf = store.read_at(offset, size)?;
    if buf.len() < size {
        return Err(IndexError::ShortRead {
            expected: size,
            actual: buf.len(),
        });
    }
    trace!("read {} bytes at offset {}", size, offset);
    into.decode(&buf[..size])
}

/// Decodes `buf` into an optional target.
///
/// The buffer length is checked against [`Decode::ENCODED_LEN`] first, then
/// the target's presence. Neither failure touches the target.
pub fn decode_into<T: Decode>(target: Option<&mut T>, buf: &[u8]) -> Result<()> {
    if buf.len() < T::ENCODED_LEN {
        return Err(IndexError::InsufficientData {
            needed: T::ENCODED_LEN,
            got: buf.len(),
        });
    }
    target.ok_or(IndexError::MissingTarget)?.decode(buf)
}
