//! Standard I/O.
//!
//! Implements the `<stdio.h>` formatted I/O family: the printf and scanf
//! engines over a shared conversion parser, the streams they read and write,
//! and the process stream table.

pub mod args;
pub mod buffer;
pub mod file;
mod float;
pub mod printf;
pub mod scanf;
pub mod sink;
pub mod source;
pub mod spec;
pub mod table;

/// End-of-file / error return of the character and scanning functions.
pub const EOF: i32 = -1;

pub use buffer::{BUFSIZ, BufMode, IOFBF as _IOFBF, IOLBF as _IOLBF, IONBF as _IONBF};
pub use file::{
    CharWidth, MemBackend, MemOutput, OpenFlags, Stream, StreamBackend, StreamGuard, clearerr,
    feof, ferror, fgetc, fgets, fgetwc, flockfile, fputc, fputs, fputwc, ftrylockfile,
    funlockfile, fwide, getc, getchar, putc, putchar, puts, setvbuf, ungetc,
};
pub use args::{ArgCursor, FormatArg};
pub use printf::{
    asprintf, dprintf, fprintf, fwprintf, printf, snprintf, sprintf, vasprintf, vdprintf,
    vfprintf, vfwprintf, vprintf, vsnprintf, vsprintf,
};
pub use scanf::{ScanArg, fscanf, scanf, sscanf, vfscanf, vscanf, vsscanf};
pub use table::{FOPEN_MAX, fclose, fflush, fopen, stderr, stdin, stdout};
