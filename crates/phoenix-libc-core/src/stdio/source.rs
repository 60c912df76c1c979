//! Character sources for the scanf engine.
//!
//! A [`Source`] hands out one byte at a time and takes back the byte it just
//! gave, which is how the scanner un-reads the character that ends a field.

use super::file::StreamGuard;
use crate::string::c_str;

/// Byte input with one byte of pushback.
pub trait Source {
    /// Next byte, or `Ok(None)` at end of input.
    fn getc(&mut self) -> Result<Option<u8>, i32>;

    /// Returns `b`, the byte most recently read, to the input.
    fn ungetc(&mut self, b: u8) -> Result<(), i32>;
}

impl<S: Source + ?Sized> Source for &mut S {
    fn getc(&mut self) -> Result<Option<u8>, i32> {
        (**self).getc()
    }

    fn ungetc(&mut self, b: u8) -> Result<(), i32> {
        (**self).ungetc(b)
    }
}

/// A byte string; the first NUL (or the slice end) is end of input.
#[derive(Debug, Clone)]
pub struct StrSource<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> StrSource<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input: c_str(input),
            pos: 0,
        }
    }

    /// Unread remainder.
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }
}

impl Source for StrSource<'_> {
    fn getc(&mut self) -> Result<Option<u8>, i32> {
        let b = self.input.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }

    fn ungetc(&mut self, _b: u8) -> Result<(), i32> {
        self.pos = self.pos.saturating_sub(1);
        Ok(())
    }
}

/// A stream the caller holds locked.
pub struct StreamSource<'g, 's> {
    guard: &'g StreamGuard<'s>,
}

impl<'g, 's> StreamSource<'g, 's> {
    pub fn new(guard: &'g StreamGuard<'s>) -> Self {
        Self { guard }
    }
}

impl Source for StreamSource<'_, '_> {
    fn getc(&mut self) -> Result<Option<u8>, i32> {
        self.guard.getc_unlocked()
    }

    fn ungetc(&mut self, b: u8) -> Result<(), i32> {
        self.guard.ungetc_unlocked(b)
    }
}
