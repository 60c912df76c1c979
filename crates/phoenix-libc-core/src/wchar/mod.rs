//! Multibyte and wide character conversion.
//!
//! Every supported locale uses a single-byte encoding, so a multibyte
//! character is exactly one byte and a wide character converts to bytes only
//! when it is at most 255. The conversion state carries nothing but is kept
//! so callers can thread it through as they would `mbstate_t`.

use crate::ctype::EOF;
use crate::errno;

pub use crate::wctype::WEOF;

/// Upper bound on bytes per multibyte character for any locale.
pub const MB_LEN_MAX: usize = 4;
/// Bytes per multibyte character in the current locale.
pub const MB_CUR_MAX: usize = 1;

/// `mbrtowc` result for an input that ends inside a character.
pub const MB_INCOMPLETE: usize = usize::MAX - 1;
/// `mbrtowc`/`wcrtomb` result for an invalid sequence.
pub const MB_INVALID: usize = usize::MAX;

/// Conversion state (`mbstate_t`). Always in the initial state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MbState {
    _private: (),
}

impl MbState {
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

/// Encodes `wc` as its single byte, or fails with `EILSEQ`.
#[inline]
pub fn encode_wide(wc: u32) -> Result<u8, i32> {
    u8::try_from(wc).map_err(|_| errno::EILSEQ)
}

/// `wcrtomb`: writes the encoding of `wc` to `dst` and returns its length.
///
/// With `dst == None` this resets the state and returns 1, like passing a
/// null buffer in C. Unencodable characters set `EILSEQ` and return
/// [`MB_INVALID`].
pub fn wcrtomb(dst: Option<&mut [u8]>, wc: u32, _state: Option<&mut MbState>) -> usize {
    let Some(dst) = dst else {
        return 1;
    };
    match encode_wide(wc) {
        Ok(byte) => match dst.first_mut() {
            Some(slot) => {
                *slot = byte;
                1
            }
            None => {
                errno::set_errno(errno::EINVAL);
                MB_INVALID
            }
        },
        Err(code) => {
            errno::set_errno(code);
            MB_INVALID
        }
    }
}

/// `mbrtowc`: decodes at most one character from `src`.
///
/// Returns 0 for the NUL character, 1 for any other byte and
/// [`MB_INCOMPLETE`] when `src` is empty.
pub fn mbrtowc(pwc: Option<&mut u32>, src: &[u8], _state: Option<&mut MbState>) -> usize {
    let Some(&byte) = src.first() else {
        return MB_INCOMPLETE;
    };
    if let Some(out) = pwc {
        *out = u32::from(byte);
    }
    usize::from(byte != 0)
}

/// `mbrlen`.
pub fn mbrlen(src: &[u8], state: Option<&mut MbState>) -> usize {
    mbrtowc(None, src, state)
}

/// `btowc`: `EOF` maps to `WEOF`, bytes to themselves.
pub fn btowc(c: i32) -> u32 {
    match u8::try_from(c) {
        Ok(byte) => u32::from(byte),
        Err(_) => WEOF,
    }
}

/// `wctob`: the single-byte form of `wc`, or `EOF` if it has none.
pub fn wctob(wc: u32) -> i32 {
    encode_wide(wc).map_or(EOF, i32::from)
}

/// `mbsinit`: nonzero when `state` is absent or initial, which is always.
pub fn mbsinit(state: Option<&MbState>) -> i32 {
    i32::from(state.is_none_or(|s| *s == MbState::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wcrtomb_encodes_latin1_range() {
        let mut buf = [0u8; MB_LEN_MAX];
        assert_eq!(wcrtomb(Some(&mut buf), 0xE9, None), 1);
        assert_eq!(buf[0], 0xE9);
        assert_eq!(wcrtomb(Some(&mut buf), u32::from(b'A'), None), 1);
        assert_eq!(buf[0], b'A');
    }

    #[test]
    fn wcrtomb_rejects_values_above_255() {
        errno::set_errno(0);
        let mut buf = [0u8; MB_LEN_MAX];
        assert_eq!(wcrtomb(Some(&mut buf), 0x100, None), MB_INVALID);
        assert_eq!(errno::get_errno(), errno::EILSEQ);
    }

    #[test]
    fn wcrtomb_null_buffer_resets() {
        assert_eq!(wcrtomb(None, 0x1F600, None), 1);
    }

    #[test]
    fn mbrtowc_single_byte() {
        let mut wc = 0;
        assert_eq!(mbrtowc(Some(&mut wc), b"\xC4x", None), 1);
        assert_eq!(wc, 0xC4);
        assert_eq!(mbrtowc(Some(&mut wc), b"\0", None), 0);
        assert_eq!(wc, 0);
        assert_eq!(mbrtowc(Some(&mut wc), b"", None), MB_INCOMPLETE);
        assert_eq!(mbrlen(b"z", None), 1);
    }

    #[test]
    fn btowc_and_wctob() {
        assert_eq!(btowc(EOF), WEOF);
        assert_eq!(btowc(0xFF), 0xFF);
        assert_eq!(btowc(300), WEOF);
        assert_eq!(wctob(u32::from(b'a')), i32::from(b'a'));
        assert_eq!(wctob(0x20AC), EOF);
        assert_eq!(wctob(WEOF), EOF);
    }

    #[test]
    fn mbsinit_is_always_initial() {
        assert_eq!(mbsinit(None), 1);
        assert_eq!(mbsinit(Some(&MbState::default())), 1);
    }
}
