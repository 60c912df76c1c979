//! Output destinations for the printf engine.

use std::io::Write;

use super::file::StreamGuard;
use crate::errno;

/// Byte destination of a formatter.
pub trait Sink {
    /// Writes all of `bytes` or fails with an errno value.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32>;

    /// Announces that `additional` bytes are about to be written.
    fn reserve(&mut self, _additional: usize) -> Result<(), i32> {
        Ok(())
    }

    /// Called once after the last conversion.
    fn finish(&mut self) -> Result<(), i32> {
        Ok(())
    }
}

impl Sink for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        (**self).write_bytes(bytes)
    }

    fn reserve(&mut self, additional: usize) -> Result<(), i32> {
        (**self).reserve(additional)
    }

    fn finish(&mut self) -> Result<(), i32> {
        (**self).finish()
    }
}

/// Descriptor-style writer (`dprintf`): each write goes straight through.
#[derive(Debug)]
pub struct FdSink<W: Write> {
    inner: W,
}

impl<W: Write> FdSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for FdSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        self.inner
            .write_all(bytes)
            .map_err(|e| errno::from_io_error(&e))
    }

    fn finish(&mut self) -> Result<(), i32> {
        self.inner.flush().map_err(|e| errno::from_io_error(&e))
    }
}

/// `snprintf` destination: keeps what fits, always leaves room for the NUL.
#[derive(Debug)]
pub struct BoundedBuf<'b> {
    buf: &'b mut [u8],
    /// Logical length, including bytes that did not fit.
    len: usize,
}

impl<'b> BoundedBuf<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Bytes produced so far, stored or not.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Sink for BoundedBuf<'_> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        let room = self.buf.len().saturating_sub(1);
        if self.len < room {
            let take = bytes.len().min(room - self.len);
            self.buf[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        }
        self.len = self.len.saturating_add(bytes.len());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), i32> {
        if let Some(last) = self.buf.len().checked_sub(1) {
            self.buf[self.len.min(last)] = 0;
        }
        Ok(())
    }
}

/// `sprintf`/`asprintf` destination: grows as needed and is NUL-terminated.
#[derive(Debug)]
pub struct UnboundedBuf<'b> {
    buf: &'b mut Vec<u8>,
}

impl<'b> UnboundedBuf<'b> {
    pub fn new(buf: &'b mut Vec<u8>) -> Self {
        Self { buf }
    }
}

impl Sink for UnboundedBuf<'_> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn reserve(&mut self, additional: usize) -> Result<(), i32> {
        self.buf.try_reserve(additional).map_err(|_| errno::ENOMEM)
    }

    fn finish(&mut self) -> Result<(), i32> {
        self.write_bytes(&[0])
    }
}

/// Byte output to a locked narrow stream.
pub struct StreamSink<'g, 's> {
    guard: &'g StreamGuard<'s>,
}

impl<'g, 's> StreamSink<'g, 's> {
    pub fn new(guard: &'g StreamGuard<'s>) -> Self {
        Self { guard }
    }
}

impl Sink for StreamSink<'_, '_> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        self.guard.write_unlocked(bytes)
    }
}

/// Output to a locked wide stream: every byte becomes one wide character.
pub struct WideStreamSink<'g, 's> {
    guard: &'g StreamGuard<'s>,
}

impl<'g, 's> WideStreamSink<'g, 's> {
    pub fn new(guard: &'g StreamGuard<'s>) -> Self {
        Self { guard }
    }
}

impl Sink for WideStreamSink<'_, '_> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        bytes
            .iter()
            .try_for_each(|&b| self.guard.put_wide_unlocked(u32::from(b)))
    }
}

/// Counts bytes on their way to `inner` and enforces the `INT_MAX` limit.
pub(crate) struct Counted<S> {
    inner: S,
    count: usize,
}

/// Largest count a formatter can report.
pub(crate) const INT_MAX: usize = i32::MAX as usize;

impl<S: Sink> Counted<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink> Sink for Counted<S> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), i32> {
        self.reserve(bytes.len())?;
        self.inner.write_bytes(bytes)?;
        self.count += bytes.len();
        Ok(())
    }

    fn reserve(&mut self, additional: usize) -> Result<(), i32> {
        if self.count.saturating_add(additional) > INT_MAX {
            return Err(errno::EOVERFLOW);
        }
        self.inner.reserve(additional)
    }

    fn finish(&mut self) -> Result<(), i32> {
        self.inner.finish()
    }
}
