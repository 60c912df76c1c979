//! String operations that depend on the locale.
//!
//! Byte strings are `&[u8]` slices in which a NUL byte (`0x00`) marks the
//! logical end; a slice without NUL is taken whole.

pub mod coll;

pub use coll::{strcoll, strcoll_l, strxfrm, strxfrm_l};

/// Returns the length of a NUL-terminated byte string (not counting the NUL).
///
/// Equivalent to C `strlen`. If no NUL is found, returns the full slice length.
pub fn strlen(s: &[u8]) -> usize {
    s.iter().position(|&b| b == 0).unwrap_or(s.len())
}

/// The bytes of `s` before its terminator.
#[inline]
pub fn c_str(s: &[u8]) -> &[u8] {
    &s[..strlen(s)]
}

/// Bounded `strnlen`: length of `s`, but at most `max`.
pub fn strnlen(s: &[u8], max: usize) -> usize {
    strlen(&s[..s.len().min(max)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strlen() {
        assert_eq!(strlen(b"hello\0"), 5);
        assert_eq!(strlen(b"\0"), 0);
        assert_eq!(strlen(b"abc"), 3);
    }

    #[test]
    fn test_strnlen() {
        assert_eq!(strnlen(b"hello\0", 3), 3);
        assert_eq!(strnlen(b"hi\0", 10), 2);
        assert_eq!(strnlen(b"", 4), 0);
    }

    #[test]
    fn test_c_str() {
        assert_eq!(c_str(b"ab\0cd"), b"ab");
        assert_eq!(c_str(b"xyz"), b"xyz");
    }
}
