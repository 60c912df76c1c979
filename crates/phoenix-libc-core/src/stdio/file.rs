//! FILE stream state management.
//!
//! [`Stream`] is the safe Rust model of a C `FILE`: open flags, buffer,
//! error/EOF bits, position, one byte of pushback and a character-width
//! latch, all behind a recursive lock. Bytes move through a
//! [`StreamBackend`], so the same record serves process handles and memory.
//!
//! Locking follows `flockfile`: [`Stream::lock`] returns a [`StreamGuard`]
//! that may be taken again on the same thread, and every `*_unlocked`
//! operation takes that guard as proof of ownership.

use std::cell::{RefCell, RefMut};
use std::io;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use super::buffer::{BUFSIZ, BufMode, StreamBuffer};
use super::EOF;
use crate::errno;
use crate::string::c_str;
use crate::wchar::encode_wide;
use crate::wctype::WEOF;

// ---------------------------------------------------------------------------
// Stream flags
// ---------------------------------------------------------------------------

/// File open mode flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    pub readable: bool,
    pub writable: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    pub binary: bool,
    pub exclusive: bool,
}

/// Runtime stream state flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamFlags {
    pub eof: bool,
    pub error: bool,
}

/// Character orientation of a stream. Latches on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharWidth {
    #[default]
    Unset,
    Narrow,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Idle,
    Reading,
    Writing,
}

// ---------------------------------------------------------------------------
// Mode parsing
// ---------------------------------------------------------------------------

/// Parse a POSIX fopen mode string (e.g. "r", "w+", "rb", "a+b").
///
/// Returns `None` if the mode string is invalid.
pub fn parse_mode(mode: &[u8]) -> Option<OpenFlags> {
    let mode = c_str(mode);
    let (&base, modifiers) = mode.split_first()?;

    let mut flags = OpenFlags::default();
    match base {
        b'r' => flags.readable = true,
        b'w' => {
            flags.writable = true;
            flags.create = true;
            flags.truncate = true;
        }
        b'a' => {
            flags.writable = true;
            flags.create = true;
            flags.append = true;
        }
        _ => return None,
    }

    // Modifiers: '+', 'b', 'x' in any order.
    for &m in modifiers {
        match m {
            b'+' => {
                flags.readable = true;
                flags.writable = true;
            }
            b'b' => flags.binary = true,
            b'x' if base == b'w' => flags.exclusive = true,
            _ => return None,
        }
    }

    Some(flags)
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Where a stream's bytes come from and go to.
///
/// Operations report errno values. An interrupted call surfaces `EINTR`
/// to the caller; streams never retry it.
pub trait StreamBackend: Send {
    /// Reads up to `buf.len()` bytes; `Ok(0)` means end of input.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        let _ = buf;
        Err(errno::EBADF)
    }

    /// Writes some prefix of `data` and returns its length.
    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        let _ = data;
        Err(errno::EBADF)
    }

    fn flush(&mut self) -> Result<(), i32> {
        Ok(())
    }
}

/// Output collected by a [`MemBackend`], readable while the stream lives.
#[derive(Debug, Clone, Default)]
pub struct MemOutput(Arc<Mutex<Vec<u8>>>);

impl MemOutput {
    /// Everything written and flushed so far.
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().clone()
    }
}

/// In-memory backend: reads a fixed input, appends output to a [`MemOutput`].
#[derive(Debug, Default)]
pub struct MemBackend {
    input: Vec<u8>,
    pos: usize,
    output: MemOutput,
}

impl MemBackend {
    pub fn new(input: impl Into<Vec<u8>>) -> (Self, MemOutput) {
        let output = MemOutput::default();
        let backend = Self {
            input: input.into(),
            pos: 0,
            output: output.clone(),
        };
        (backend, output)
    }
}

impl StreamBackend for MemBackend {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        let rest = &self.input[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        self.output.0.lock().extend_from_slice(data);
        Ok(data.len())
    }
}

/// Read-only backend over an [`io::Read`] (e.g. standard input).
#[derive(Debug)]
pub struct IoReader<R>(pub R);

impl<R: io::Read + Send> StreamBackend for IoReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        self.0.read(buf).map_err(|e| errno::from_io_error(&e))
    }
}

/// Write-only backend over an [`io::Write`] (e.g. standard output).
#[derive(Debug)]
pub struct IoWriter<W>(pub W);

impl<W: io::Write + Send> StreamBackend for IoWriter<W> {
    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        self.0.write(data).map_err(|e| errno::from_io_error(&e))
    }

    fn flush(&mut self) -> Result<(), i32> {
        self.0.flush().map_err(|e| errno::from_io_error(&e))
    }
}

/// Writes all of `data`, continuing after short writes.
fn write_all(backend: &mut dyn StreamBackend, mut data: &[u8]) -> Result<(), i32> {
    while !data.is_empty() {
        match backend.write(data)? {
            0 => return Err(errno::EIO),
            n => data = &data[n.min(data.len())..],
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stream state
// ---------------------------------------------------------------------------

struct StreamState {
    /// `None` once closed.
    backend: Option<Box<dyn StreamBackend>>,
    buffer: StreamBuffer,
    open_flags: OpenFlags,
    flags: StreamFlags,
    width: CharWidth,
    direction: Direction,
    /// Bytes consumed or produced since open.
    position: u64,
    /// One byte of `ungetc` pushback, layered over the buffer.
    pushback: Option<u8>,
}

impl StreamState {
    fn backend(&mut self) -> Result<&mut dyn StreamBackend, i32> {
        match self.backend.as_deref_mut() {
            Some(backend) => Ok(backend),
            None => Err(errno::EBADF),
        }
    }

    /// Latches the stream error bit when `result` failed.
    fn track<T>(&mut self, result: Result<T, i32>) -> Result<T, i32> {
        if result.is_err() {
            self.flags.error = true;
        }
        result
    }

    fn orient(&mut self, want: CharWidth) -> Result<(), i32> {
        match self.width {
            CharWidth::Unset => {
                self.width = want;
                Ok(())
            }
            current if current == want => Ok(()),
            _ => {
                self.flags.error = true;
                Err(errno::EINVAL)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), i32> {
        self.backend()?;
        if !self.open_flags.writable {
            self.flags.error = true;
            return Err(errno::EBADF);
        }
        if self.direction == Direction::Reading {
            self.pushback = None;
            self.buffer.reset();
        }
        self.direction = Direction::Writing;

        let Self {
            backend, buffer, ..
        } = self;
        let result = match backend.as_deref_mut() {
            Some(backend) => buffer.write(data, |chunk| write_all(backend, chunk)),
            None => Err(errno::EBADF),
        };
        self.track(result)?;
        self.position += data.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), i32> {
        self.backend()?;
        let result = match self.direction {
            Direction::Writing => {
                let Self {
                    backend, buffer, ..
                } = self;
                match backend.as_deref_mut() {
                    Some(backend) => buffer
                        .flush(|chunk| write_all(backend, chunk))
                        .and_then(|()| backend.flush()),
                    None => Err(errno::EBADF),
                }
            }
            Direction::Reading => {
                self.buffer.reset();
                self.pushback = None;
                Ok(())
            }
            Direction::Idle => Ok(()),
        };
        self.track(result)?;
        self.direction = Direction::Idle;
        Ok(())
    }

    fn getc(&mut self) -> Result<Option<u8>, i32> {
        self.backend()?;
        if !self.open_flags.readable {
            self.flags.error = true;
            return Err(errno::EBADF);
        }
        if let Some(b) = self.pushback.take() {
            self.position += 1;
            return Ok(Some(b));
        }
        if self.direction == Direction::Writing {
            self.flush()?;
        }
        self.direction = Direction::Reading;

        if self.buffer.buffered_input() == 0 {
            let Self {
                backend, buffer, ..
            } = self;
            let result = match backend.as_deref_mut() {
                Some(backend) => buffer.refill(|dst| backend.read(dst)),
                None => Err(errno::EBADF),
            };
            if self.track(result)? == 0 {
                self.flags.eof = true;
                return Ok(None);
            }
        }
        let byte = self.buffer.next_byte();
        if byte.is_some() {
            self.position += 1;
        }
        Ok(byte)
    }

    fn ungetc(&mut self, b: u8) -> Result<(), i32> {
        self.backend()?;
        if self.pushback.is_some() {
            return Err(errno::EINVAL);
        }
        self.pushback = Some(b);
        self.flags.eof = false;
        self.position = self.position.saturating_sub(1);
        Ok(())
    }

    fn close(&mut self) -> Result<(), i32> {
        let flushed = self.flush();
        self.backend = None;
        self.pushback = None;
        self.buffer.reset();
        flushed
    }
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

/// POSIX FILE stream.
pub struct Stream {
    state: ReentrantMutex<RefCell<StreamState>>,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl Stream {
    /// Create a stream over `backend` with explicit buffering.
    pub fn new(backend: Box<dyn StreamBackend>, open_flags: OpenFlags, buf_mode: BufMode) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(StreamState {
                backend: Some(backend),
                buffer: StreamBuffer::new(buf_mode, BUFSIZ),
                open_flags,
                flags: StreamFlags::default(),
                width: CharWidth::Unset,
                direction: Direction::Idle,
                position: 0,
                pushback: None,
            })),
        }
    }

    /// Create a fully-buffered stream from an fopen-style mode string.
    pub fn open(backend: Box<dyn StreamBackend>, mode: &[u8]) -> Result<Self, i32> {
        let flags = parse_mode(mode).ok_or(errno::EINVAL)?;
        Ok(Self::new(backend, flags, BufMode::Full))
    }

    /// In-memory stream opened with `mode`; returns the stream and a handle
    /// on its output.
    pub fn memory(input: impl Into<Vec<u8>>, mode: &[u8]) -> Result<(Self, MemOutput), i32> {
        let (backend, output) = MemBackend::new(input);
        Ok((Self::open(Box::new(backend), mode)?, output))
    }

    /// Acquire the stream lock (`flockfile`). Recursive on one thread.
    pub fn lock(&self) -> StreamGuard<'_> {
        StreamGuard {
            inner: self.state.lock(),
        }
    }

    /// `ftrylockfile`: the guard, or `None` if another thread holds it.
    pub fn try_lock(&self) -> Option<StreamGuard<'_>> {
        self.state.try_lock().map(|inner| StreamGuard { inner })
    }
}

/// Proof that the current thread holds a stream's lock. Dropping it is
/// `funlockfile`.
pub struct StreamGuard<'s> {
    inner: ReentrantMutexGuard<'s, RefCell<StreamState>>,
}

impl StreamGuard<'_> {
    fn state(&self) -> RefMut<'_, StreamState> {
        self.inner.borrow_mut()
    }

    /// Unlocked byte output.
    pub fn write_unlocked(&self, data: &[u8]) -> Result<(), i32> {
        self.state().write(data)
    }

    /// Unlocked wide-character output: orients the stream wide and writes
    /// the character's single-byte form.
    pub fn put_wide_unlocked(&self, wc: u32) -> Result<(), i32> {
        let mut state = self.state();
        state.orient(CharWidth::Wide)?;
        let byte = state.track(encode_wide(wc))?;
        state.write(&[byte])
    }

    /// Unlocked byte input; `Ok(None)` at end of input.
    pub fn getc_unlocked(&self) -> Result<Option<u8>, i32> {
        self.state().getc()
    }

    /// Unlocked wide-character input; `Ok(None)` at end of input.
    pub fn get_wide_unlocked(&self) -> Result<Option<u32>, i32> {
        let mut state = self.state();
        state.orient(CharWidth::Wide)?;
        Ok(state.getc()?.map(u32::from))
    }

    /// Push one byte back. A second pushback before a read fails.
    pub fn ungetc_unlocked(&self, b: u8) -> Result<(), i32> {
        self.state().ungetc(b)
    }

    /// Latch the orientation, failing with `EINVAL` (and setting the error
    /// bit) if the stream is already oriented the other way.
    pub fn orient(&self, want: CharWidth) -> Result<(), i32> {
        self.state().orient(want)
    }

    pub fn flush_unlocked(&self) -> Result<(), i32> {
        self.state().flush()
    }

    pub fn is_open(&self) -> bool {
        self.state().backend.is_some()
    }

    pub fn is_eof(&self) -> bool {
        self.state().flags.eof
    }

    pub fn is_error(&self) -> bool {
        self.state().flags.error
    }

    pub fn set_error(&self) {
        self.state().flags.error = true;
    }

    pub fn clear_err(&self) {
        let mut state = self.state();
        state.flags.eof = false;
        state.flags.error = false;
    }

    pub fn char_width(&self) -> CharWidth {
        self.state().width
    }

    pub fn open_flags(&self) -> OpenFlags {
        self.state().open_flags
    }

    pub fn buf_mode(&self) -> BufMode {
        self.state().buffer.mode()
    }

    /// Output bytes held in the buffer.
    pub fn buffered(&self) -> usize {
        self.state().buffer.pending_output().len()
    }

    pub fn position(&self) -> u64 {
        self.state().position
    }

    /// Change buffering (`setvbuf`); only before any I/O.
    pub fn set_buffering(&self, mode: BufMode, size: usize) -> Result<(), i32> {
        self.state().buffer.set_mode(mode, size)
    }

    /// `fwide`: orient if `mode` is nonzero and the stream is unset, then
    /// report the orientation as -1, 0 or 1.
    pub fn fwide(&self, mode: i32) -> i32 {
        let mut state = self.state();
        if state.width == CharWidth::Unset {
            state.width = match mode.signum() {
                1 => CharWidth::Wide,
                -1 => CharWidth::Narrow,
                _ => CharWidth::Unset,
            };
        }
        match state.width {
            CharWidth::Wide => 1,
            CharWidth::Narrow => -1,
            CharWidth::Unset => 0,
        }
    }

    /// Flushes, then detaches the backend. Later operations fail with `EBADF`.
    pub(crate) fn close_unlocked(&self) -> Result<(), i32> {
        self.state().close()
    }
}

// ---------------------------------------------------------------------------
// C-shaped operations
// ---------------------------------------------------------------------------

/// `flockfile`.
pub fn flockfile(stream: &Stream) -> StreamGuard<'_> {
    stream.lock()
}

/// `ftrylockfile`.
pub fn ftrylockfile(stream: &Stream) -> Option<StreamGuard<'_>> {
    stream.try_lock()
}

/// `funlockfile`.
pub fn funlockfile(guard: StreamGuard<'_>) {
    drop(guard);
}

fn put_narrow(guard: &StreamGuard<'_>, data: &[u8]) -> Result<(), i32> {
    guard.orient(CharWidth::Narrow)?;
    guard.write_unlocked(data)
}

/// `putc_unlocked`.
pub fn putc_unlocked(c: i32, guard: &StreamGuard<'_>) -> i32 {
    let byte = c as u8;
    errno::report(put_narrow(guard, &[byte]).map(|()| i32::from(byte)), EOF)
}

/// `fputc`: writes `c` converted to a byte; returns it or `EOF`.
pub fn fputc(c: i32, stream: &Stream) -> i32 {
    putc_unlocked(c, &stream.lock())
}

/// `putc`.
pub fn putc(c: i32, stream: &Stream) -> i32 {
    fputc(c, stream)
}

/// `putchar`.
pub fn putchar(c: i32) -> i32 {
    fputc(c, &super::stdout())
}

/// `fputs`: writes `s` up to its terminator; 0 on success, `EOF` on error.
pub fn fputs(s: &[u8], stream: &Stream) -> i32 {
    let guard = stream.lock();
    errno::report(put_narrow(&guard, c_str(s)).map(|()| 0), EOF)
}

/// `puts`: `s` and a newline to standard output.
pub fn puts(s: &[u8]) -> i32 {
    let out = super::stdout();
    let guard = out.lock();
    let result = put_narrow(&guard, c_str(s)).and_then(|()| guard.write_unlocked(b"\n"));
    errno::report(result.map(|()| 0), EOF)
}

fn get_narrow(guard: &StreamGuard<'_>) -> Result<Option<u8>, i32> {
    guard.orient(CharWidth::Narrow)?;
    guard.getc_unlocked()
}

/// `getc_unlocked`.
pub fn getc_unlocked(guard: &StreamGuard<'_>) -> i32 {
    match get_narrow(guard) {
        Ok(Some(b)) => i32::from(b),
        Ok(None) => EOF,
        Err(code) => {
            errno::set_errno(code);
            EOF
        }
    }
}

/// `fgetc`: the next byte as a non-negative int, or `EOF`.
pub fn fgetc(stream: &Stream) -> i32 {
    getc_unlocked(&stream.lock())
}

/// `getc`.
pub fn getc(stream: &Stream) -> i32 {
    fgetc(stream)
}

/// `getchar`.
pub fn getchar() -> i32 {
    fgetc(&super::stdin())
}

/// `fgets`: reads up to `buf.len() - 1` bytes, stopping after a newline,
/// and NUL-terminates. Returns the number of bytes stored, or `None` when
/// nothing was read before end of input or an error.
pub fn fgets(buf: &mut [u8], stream: &Stream) -> Option<usize> {
    let last = buf.len().checked_sub(1)?;
    let guard = stream.lock();
    let mut n = 0;
    while n < last {
        match get_narrow(&guard) {
            Ok(Some(b)) => {
                buf[n] = b;
                n += 1;
                if b == b'\n' {
                    break;
                }
            }
            Ok(None) => break,
            Err(code) => {
                errno::set_errno(code);
                return None;
            }
        }
    }
    if n == 0 && last > 0 {
        return None;
    }
    buf[n] = 0;
    Some(n)
}

/// `ungetc`: pushes `c` back; returns it, or `EOF` on failure.
pub fn ungetc(c: i32, stream: &Stream) -> i32 {
    if c == EOF {
        return EOF;
    }
    let byte = c as u8;
    let guard = stream.lock();
    errno::report(guard.ungetc_unlocked(byte).map(|()| i32::from(byte)), EOF)
}

/// `ferror`.
pub fn ferror(stream: &Stream) -> i32 {
    i32::from(stream.lock().is_error())
}

/// `feof`.
pub fn feof(stream: &Stream) -> i32 {
    i32::from(stream.lock().is_eof())
}

/// `clearerr`.
pub fn clearerr(stream: &Stream) {
    stream.lock().clear_err();
}

/// `fwide`.
pub fn fwide(stream: &Stream, mode: i32) -> i32 {
    stream.lock().fwide(mode)
}

/// `fputwc`: returns `wc`, or `WEOF` on failure.
pub fn fputwc(wc: u32, stream: &Stream) -> u32 {
    let guard = stream.lock();
    errno::report(guard.put_wide_unlocked(wc).map(|()| wc), WEOF)
}

/// `fgetwc`: the next wide character, or `WEOF`.
pub fn fgetwc(stream: &Stream) -> u32 {
    match stream.lock().get_wide_unlocked() {
        Ok(Some(wc)) => wc,
        Ok(None) => WEOF,
        Err(code) => {
            errno::set_errno(code);
            WEOF
        }
    }
}

/// `setvbuf`: `mode` is one of `_IOFBF`, `_IOLBF`, `_IONBF`; a `size` of 0
/// selects `BUFSIZ`. Returns 0, or -1 with `EINVAL`.
pub fn setvbuf(stream: &Stream, mode: i32, size: usize) -> i32 {
    let result = BufMode::from_setvbuf(mode)
        .ok_or(errno::EINVAL)
        .and_then(|mode| {
            let size = if size == 0 { BUFSIZ } else { size };
            stream.lock().set_buffering(mode, size)
        });
    errno::report(result.map(|()| 0), -1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
