//! Stream buffering.
//!
//! Three modes: fully-buffered (`_IOFBF`), line-buffered (`_IOLBF`) and
//! unbuffered (`_IONBF`). The buffer never talks to a backend itself: callers
//! hand it the function that moves bytes, so the same buffer serves any
//! stream backend.
//!
//! Storage is allocated on first use with a fallible reservation, and the
//! mode can only change before any I/O has happened.

use crate::errno;

/// Default buffer size (POSIX `BUFSIZ`).
pub const BUFSIZ: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufMode {
    /// Fully buffered: flush when the buffer is full.
    Full,
    /// Line buffered: flush on newline or when full.
    Line,
    /// Unbuffered: every write goes straight through.
    None,
}

/// `setvbuf` mode values.
pub const IOFBF: i32 = 0;
pub const IOLBF: i32 = 1;
pub const IONBF: i32 = 2;

impl BufMode {
    /// Convert from the `setvbuf` integer constant.
    pub fn from_setvbuf(mode: i32) -> Option<BufMode> {
        match mode {
            IOFBF => Some(BufMode::Full),
            IOLBF => Some(BufMode::Line),
            IONBF => Some(BufMode::None),
            _ => Option::None,
        }
    }
}

/// Buffer for one stream; holds either pending output or read-ahead input.
///
/// Reading keeps `pos <= filled <= data.len()`. While output is pending
/// `filled` stays 0 and `pos` is the pending length.
#[derive(Debug)]
pub struct StreamBuffer {
    data: Vec<u8>,
    pos: usize,
    filled: usize,
    capacity: usize,
    mode: BufMode,
    io_started: bool,
}

impl StreamBuffer {
    /// Create a buffer; storage is reserved lazily.
    pub fn new(mode: BufMode, capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
            filled: 0,
            capacity: if mode == BufMode::None { 0 } else { capacity.max(1) },
            mode,
            io_started: false,
        }
    }

    pub fn mode(&self) -> BufMode {
        self.mode
    }

    /// Bytes the buffer holds before it must flush; 0 when unbuffered.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change buffering mode and size (`setvbuf`).
    ///
    /// Fails with `EINVAL` once I/O has occurred.
    pub fn set_mode(&mut self, mode: BufMode, size: usize) -> Result<(), i32> {
        if self.io_started {
            return Err(errno::EINVAL);
        }
        *self = Self::new(mode, size);
        Ok(())
    }

    fn storage(&mut self, size: usize) -> Result<&mut [u8], i32> {
        if self.data.len() < size {
            self.data
                .try_reserve_exact(size - self.data.len())
                .map_err(|_| errno::ENOMEM)?;
            self.data.resize(size, 0);
        }
        Ok(&mut self.data[..size])
    }

    /// Buffer `data`, passing to `sink` whatever must go out now.
    ///
    /// Full mode flushes when `data` does not fit; writes at least as large
    /// as the buffer bypass it. Line mode additionally flushes everything
    /// once a newline has been buffered.
    pub fn write<F>(&mut self, data: &[u8], mut sink: F) -> Result<(), i32>
    where
        F: FnMut(&[u8]) -> Result<(), i32>,
    {
        self.io_started = true;
        if self.mode == BufMode::None {
            return sink(data);
        }

        if self.pos + data.len() > self.capacity {
            self.flush(&mut sink)?;
        }
        if data.len() >= self.capacity {
            sink(data)?;
        } else {
            let start = self.pos;
            let capacity = self.capacity;
            self.storage(capacity)?[start..start + data.len()].copy_from_slice(data);
            self.pos += data.len();
        }

        if self.mode == BufMode::Line && data.contains(&b'\n') {
            self.flush(&mut sink)?;
        }
        Ok(())
    }

    /// Bytes written but not yet flushed.
    pub fn pending_output(&self) -> &[u8] {
        if self.filled > 0 {
            return &[];
        }
        &self.data[..self.pos.min(self.data.len())]
    }

    /// Hands pending output to `sink`. The data stays pending if it fails.
    pub fn flush<F>(&mut self, mut sink: F) -> Result<(), i32>
    where
        F: FnMut(&[u8]) -> Result<(), i32>,
    {
        if self.filled == 0 && self.pos > 0 {
            sink(&self.data[..self.pos])?;
            self.pos = 0;
        }
        Ok(())
    }

    /// Next read-ahead byte, if any.
    pub fn next_byte(&mut self) -> Option<u8> {
        self.io_started = true;
        if self.pos < self.filled {
            self.pos += 1;
            Some(self.data[self.pos - 1])
        } else {
            None
        }
    }

    pub fn buffered_input(&self) -> usize {
        self.filled.saturating_sub(self.pos)
    }

    /// Refills the read-ahead from `source`; returns the bytes obtained
    /// (0 at end of input). Unbuffered streams read one byte at a time.
    pub fn refill<F>(&mut self, mut source: F) -> Result<usize, i32>
    where
        F: FnMut(&mut [u8]) -> Result<usize, i32>,
    {
        self.io_started = true;
        self.pos = 0;
        self.filled = 0;
        let size = self.capacity.max(1);
        let n = source(self.storage(size)?)?;
        self.filled = n.min(size);
        Ok(self.filled)
    }

    /// Discard pending data in either direction.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(out: &mut Vec<Vec<u8>>) -> impl FnMut(&[u8]) -> Result<(), i32> + '_ {
        move |chunk: &[u8]| {
            out.push(chunk.to_vec());
            Ok(())
        }
    }

    #[test]
    fn full_buffer_absorbs_small_writes() {
        let mut buf = StreamBuffer::new(BufMode::Full, 64);
        let mut flushed = Vec::new();
        buf.write(b"hello", collect(&mut flushed)).unwrap();
        assert!(flushed.is_empty());
        assert_eq!(buf.pending_output(), b"hello");
    }

    #[test]
    fn full_buffer_flushes_on_overflow() {
        let mut buf = StreamBuffer::new(BufMode::Full, 8);
        let mut flushed = Vec::new();
        buf.write(b"abcd", collect(&mut flushed)).unwrap();
        buf.write(b"efgh!", collect(&mut flushed)).unwrap();
        assert_eq!(flushed, vec![b"abcd".to_vec()]);
        assert_eq!(buf.pending_output(), b"efgh!");
    }

    #[test]
    fn large_write_bypasses_buffer() {
        let mut buf = StreamBuffer::new(BufMode::Full, 4);
        let mut flushed = Vec::new();
        buf.write(b"ab", collect(&mut flushed)).unwrap();
        buf.write(b"0123456789", collect(&mut flushed)).unwrap();
        assert_eq!(flushed, vec![b"ab".to_vec(), b"0123456789".to_vec()]);
        assert!(buf.pending_output().is_empty());
    }

    #[test]
    fn line_buffer_flushes_on_newline() {
        let mut buf = StreamBuffer::new(BufMode::Line, 64);
        let mut flushed = Vec::new();
        buf.write(b"hello", collect(&mut flushed)).unwrap();
        assert!(flushed.is_empty());
        buf.write(b" world\n", collect(&mut flushed)).unwrap();
        assert_eq!(flushed, vec![b"hello world\n".to_vec()]);
        assert!(buf.pending_output().is_empty());
    }

    #[test]
    fn unbuffered_always_flushes() {
        let mut buf = StreamBuffer::new(BufMode::None, BUFSIZ);
        let mut flushed = Vec::new();
        buf.write(b"hello", collect(&mut flushed)).unwrap();
        assert_eq!(flushed, vec![b"hello".to_vec()]);
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn failed_flush_keeps_data() {
        let mut buf = StreamBuffer::new(BufMode::Full, 16);
        buf.write(b"keep", |_| Ok(())).unwrap();
        assert_eq!(buf.flush(|_| Err(errno::EIO)), Err(errno::EIO));
        assert_eq!(buf.pending_output(), b"keep");
    }

    #[test]
    fn read_side_refill() {
        let mut buf = StreamBuffer::new(BufMode::Full, 4);
        let mut input: &[u8] = b"hello";
        let mut take = |dst: &mut [u8]| {
            let n = dst.len().min(input.len());
            dst[..n].copy_from_slice(&input[..n]);
            input = &input[n..];
            Ok(n)
        };
        assert_eq!(buf.refill(&mut take), Ok(4));
        assert_eq!(buf.buffered_input(), 4);
        let first: Vec<u8> = std::iter::from_fn(|| buf.next_byte()).collect();
        assert_eq!(first, b"hell");
        assert_eq!(buf.refill(&mut take), Ok(1));
        assert_eq!(buf.next_byte(), Some(b'o'));
        assert_eq!(buf.refill(&mut take), Ok(0));
        assert_eq!(buf.next_byte(), None);
    }

    #[test]
    fn set_mode_before_io() {
        let mut buf = StreamBuffer::new(BufMode::Full, 64);
        assert!(buf.set_mode(BufMode::Line, 128).is_ok());
        assert_eq!(buf.mode(), BufMode::Line);
        assert_eq!(buf.capacity(), 128);
    }

    #[test]
    fn set_mode_after_io_fails() {
        let mut buf = StreamBuffer::new(BufMode::Full, 64);
        buf.write(b"x", |_| Ok(())).unwrap();
        assert_eq!(buf.set_mode(BufMode::Line, 128), Err(errno::EINVAL));
    }

    #[test]
    fn setvbuf_constants() {
        let modes: Vec<_> = (IOFBF..=IONBF + 1).map(BufMode::from_setvbuf).collect();
        assert_eq!(
            modes,
            [Some(BufMode::Full), Some(BufMode::Line), Some(BufMode::None), Option::None]
        );
    }
}
