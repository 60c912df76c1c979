//! Error number definitions.
//!
//! Implements `<errno.h>` support with thread-local errno storage. Fallible
//! routines in this crate return `Result<T, i32>` where the error is one of
//! the constants below; the C-shaped entry points translate an `Err` into the
//! POSIX return convention and park the code here.

use std::cell::Cell;

thread_local! {
    static ERRNO: Cell<i32> = const { Cell::new(0) };
}

pub const EPERM: i32 = 1;
pub const ENOENT: i32 = 2;
pub const EINTR: i32 = 4;
pub const EIO: i32 = 5;
pub const EBADF: i32 = 9;
pub const EAGAIN: i32 = 11;
pub const ENOMEM: i32 = 12;
pub const EACCES: i32 = 13;
pub const EINVAL: i32 = 22;
pub const ENFILE: i32 = 23;
pub const EMFILE: i32 = 24;
pub const ENOSPC: i32 = 28;
pub const ESPIPE: i32 = 29;
pub const EPIPE: i32 = 32;
pub const ERANGE: i32 = 34;
pub const EOVERFLOW: i32 = 75;
pub const EILSEQ: i32 = 84;

/// Returns the current thread-local errno value.
///
/// Equivalent to reading C `errno`.
pub fn get_errno() -> i32 {
    ERRNO.get()
}

/// Sets the current thread-local errno value.
///
/// Equivalent to assigning to C `errno`.
pub fn set_errno(value: i32) {
    ERRNO.set(value);
}

/// Maps a host I/O error onto an errno value.
///
/// Errors that carry an OS code keep it; the rest collapse to the closest
/// POSIX kind, defaulting to `EIO`.
pub fn from_io_error(err: &std::io::Error) -> i32 {
    if let Some(code) = err.raw_os_error() {
        return code;
    }
    match err.kind() {
        std::io::ErrorKind::Interrupted => EINTR,
        std::io::ErrorKind::OutOfMemory => ENOMEM,
        std::io::ErrorKind::InvalidInput => EINVAL,
        std::io::ErrorKind::BrokenPipe => EPIPE,
        std::io::ErrorKind::WouldBlock => EAGAIN,
        std::io::ErrorKind::PermissionDenied => EACCES,
        std::io::ErrorKind::NotFound => ENOENT,
        _ => EIO,
    }
}

/// Unwraps `result`, parking its error (if any) in errno and returning `fallback`.
///
/// This is the bridge between the `Result`-based internals and the
/// "return -1 and set errno" convention of the C surface.
pub fn report<T>(result: Result<T, i32>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(code) => {
            set_errno(code);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_is_thread_local() {
        set_errno(EINVAL);
        let other = std::thread::spawn(get_errno).join().unwrap();
        assert_eq!(other, 0);
        assert_eq!(get_errno(), EINVAL);
    }

    #[test]
    fn report_sets_errno_on_failure() {
        set_errno(0);
        assert_eq!(report::<i32>(Err(EOVERFLOW), -1), -1);
        assert_eq!(get_errno(), EOVERFLOW);
        assert_eq!(report(Ok(7), -1), 7);
        assert_eq!(get_errno(), EOVERFLOW);
    }

    #[test]
    fn io_errors_map_to_posix_kinds() {
        let interrupted = std::io::Error::from(std::io::ErrorKind::Interrupted);
        assert_eq!(from_io_error(&interrupted), EINTR);
        let raw = std::io::Error::from_raw_os_error(EBADF);
        assert_eq!(from_io_error(&raw), EBADF);
        let other = std::io::Error::other("boom");
        assert_eq!(from_io_error(&other), EIO);
    }
}
