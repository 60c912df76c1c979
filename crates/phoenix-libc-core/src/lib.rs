//! # phoenix-libc-core
//!
//! Safe Rust implementation of the formatted I/O and locale core of a C
//! library: the `printf`/`scanf` engines, the streams they drive, and the
//! locale registry with the character classification built on it.
//!
//! No `unsafe` code is permitted at the crate level.

#![deny(unsafe_code)]

pub mod ctype;
pub mod errno;
pub mod locale;
pub mod stdio;
pub mod string;
pub mod wchar;
pub mod wctype;
