//! Pull-based reading of a remote object through ranged GETs.
//!
//! An [`ObjectStream`] learns the object size once, on its first read, and
//! then serves each `read` either from the last fetched chunk or by fetching
//! exactly the requested window `[position, position + len)` clipped to the
//! object size. Nothing is prefetched.

use std::io::{self, Read};
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::object::ObjectRef;
use crate::error::{ClientError, ClientResult};

/// A store that can report object sizes and return byte ranges.
pub trait RangeSource {
    /// Size of the object in bytes.
    fn object_size(&self, object: &ObjectRef) -> ClientResult<u64>;

    /// Bytes `start..=end_inclusive` of the object.
    fn fetch_range(&self, object: &ObjectRef, start: u64, end_inclusive: u64)
    -> ClientResult<Bytes>;
}

impl<T: RangeSource + ?Sized> RangeSource for &T {
    fn object_size(&self, object: &ObjectRef) -> ClientResult<u64> {
        (**self).object_size(object)
    }

    fn fetch_range(
        &self,
        object: &ObjectRef,
        start: u64,
        end_inclusive: u64,
    ) -> ClientResult<Bytes> {
        (**self).fetch_range(object, start, end_inclusive)
    }
}

impl<T: RangeSource + ?Sized> RangeSource for Arc<T> {
    fn object_size(&self, object: &ObjectRef) -> ClientResult<u64> {
        (**self).object_size(object)
    }

    fn fetch_range(
        &self,
        object: &ObjectRef,
        start: u64,
        end_inclusive: u64,
    ) -> ClientResult<Bytes> {
        (**self).fetch_range(object, start, end_inclusive)
    }
}

/// A readable view of one remote object.
#[derive(Debug)]
pub struct ObjectStream<S> {
    source: S,
    object: ObjectRef,
    size: Option<u64>,
    position: u64,
    buffer: Bytes,
    buffer_start: u64,
}

impl<S: RangeSource> ObjectStream<S> {
    /// Open a stream. No request is made until the first read.
    pub fn open(source: S, object: ObjectRef) -> Self {
        Self {
            source,
            object,
            size: None,
            position: 0,
            buffer: Bytes::new(),
            buffer_start: 0,
        }
    }

    /// The object being read.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Object size, fetched on first use and then remembered.
    pub fn size(&mut self) -> ClientResult<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let size = self.source.object_size(&self.object)?;
        debug!(object = %self.object, size, "resolved object size");
        self.size = Some(size);
        Ok(size)
    }

    /// Whether every byte has been read.
    pub fn is_eof(&mut self) -> ClientResult<bool> {
        Ok(self.position >= self.size()?)
    }

    fn buffered(&self, len: u64) -> Option<&[u8]> {
        let offset = usize::try_from(self.position.checked_sub(self.buffer_start)?).ok()?;
        let end = offset.checked_add(usize::try_from(len).ok()?)?;
        self.buffer.get(offset..end)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> ClientResult<usize> {
        let size = self.size()?;
        if buf.is_empty() || self.position >= size {
            return Ok(0);
        }
        let wanted = u64::try_from(buf.len())
            .unwrap_or(u64::MAX)
            .min(size - self.position);

        if self.buffered(wanted).is_none() {
            let end = self.position + wanted - 1;
            debug!(object = %self.object, range = %format!("{}-{end}", self.position), "fetching range");
            let data = self.source.fetch_range(&self.object, self.position, end)?;
            if data.is_empty() {
                return Err(ClientError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("empty range response for {} at {}", self.object, self.position),
                )));
            }
            self.buffer = data;
            self.buffer_start = self.position;
        }

        let offset = usize::try_from(self.position - self.buffer_start).unwrap_or(usize::MAX);
        let available = self.buffer.get(offset..).unwrap_or_default();
        let n = available.len().min(buf.len()).min(usize::try_from(wanted).unwrap_or(usize::MAX));
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl<S: RangeSource> Read for ObjectStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map_err(|e| match e {
            ClientError::Io(e) => e,
            other => io::Error::other(other),
        })
    }
}
