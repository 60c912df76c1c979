//! Locale-aware comparison: strcoll, strxfrm.
//!
//! A string is split into collating elements, longest match first, and each
//! element is replaced by its weight from the `LC_COLLATE` table. Strings
//! order by weight sequence; equal sequences fall back to byte order so that
//! only identical strings compare equal.

use std::cmp::Ordering;

use super::c_str;
use crate::locale::{self, CollationElement, CollationKey, Locale, LocaleHandle};

/// Weights for bytes absent from the table sort after every listed element.
const UNLISTED_BASE: u64 = 1 << 16;

/// Digits per weight in a transformed key.
const KEY_DIGITS: usize = 9;
/// Radix of key digits; digits are stored offset by [`DIGIT_OFFSET`].
const KEY_RADIX: u64 = 254;
const DIGIT_OFFSET: u8 = 2;
/// Separates the weight section of a key from the tiebreak bytes.
const KEY_SEPARATOR: u8 = 0x01;

/// Iterator over the weights of a string under one collation table.
struct Weights<'a> {
    rest: &'a [u8],
    table: &'a [CollationElement],
}

impl<'a> Weights<'a> {
    fn new(s: &'a [u8], table: &'a [CollationElement]) -> Self {
        Self {
            rest: c_str(s),
            table,
        }
    }
}

impl Iterator for Weights<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let (&first, tail) = self.rest.split_first()?;
        if let Some(&second) = tail.first() {
            let pair = self
                .table
                .iter()
                .find(|e| e.key == CollationKey::Pair([first, second]));
            if let Some(element) = pair {
                self.rest = &tail[1..];
                return Some(element.weight);
            }
        }
        self.rest = tail;
        let weight = self
            .table
            .iter()
            .find(|e| e.key == CollationKey::Byte(first))
            .map_or(UNLISTED_BASE + u64::from(first), |e| e.weight);
        Some(weight)
    }
}

/// Orders `a` and `b` under an explicit table.
pub fn compare_with(table: &[CollationElement], a: &[u8], b: &[u8]) -> Ordering {
    Weights::new(a, table)
        .cmp(Weights::new(b, table))
        .then_with(|| c_str(a).cmp(c_str(b)))
}

/// Transformed key of `src` under an explicit table, without terminator.
pub fn transform_with(table: &[CollationElement], src: &[u8]) -> Vec<u8> {
    let src = c_str(src);
    let mut key = Vec::with_capacity(src.len() * (KEY_DIGITS + 1) + 1);
    for weight in Weights::new(src, table) {
        let mut digits = [0u8; KEY_DIGITS];
        let mut rest = weight;
        for digit in digits.iter_mut().rev() {
            *digit = (rest % KEY_RADIX) as u8 + DIGIT_OFFSET;
            rest /= KEY_RADIX;
        }
        key.extend_from_slice(&digits);
    }
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(src);
    key
}

fn ordering_to_int(ordering: Ordering) -> i32 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

fn strcoll_in(s1: &[u8], s2: &[u8], locale: &Locale) -> i32 {
    ordering_to_int(compare_with(locale.collation(), s1, s2))
}

/// Compares two strings by the collation order of the current locale.
///
/// Equivalent to C `strcoll`. Returns -1, 0 or 1.
pub fn strcoll(s1: &[u8], s2: &[u8]) -> i32 {
    strcoll_in(s1, s2, &locale::current_locale())
}

/// `strcoll_l`.
pub fn strcoll_l(s1: &[u8], s2: &[u8], locale: &LocaleHandle) -> i32 {
    strcoll_in(s1, s2, &locale.resolve())
}

fn strxfrm_in(dest: &mut [u8], src: &[u8], locale: &Locale) -> usize {
    let key = transform_with(locale.collation(), src);
    let copied = key.len().min(dest.len());
    dest[..copied].copy_from_slice(&key[..copied]);
    if key.len() < dest.len() {
        dest[key.len()] = 0;
    }
    key.len()
}

/// Transforms `src` into a key whose `strcmp` order matches `strcoll`.
///
/// Equivalent to C `strxfrm`. Returns the full key length excluding the NUL.
/// When that length is at least `dest.len()` the key did not fit: `dest`
/// holds a truncated, unterminated prefix.
pub fn strxfrm(dest: &mut [u8], src: &[u8]) -> usize {
    strxfrm_in(dest, src, &locale::current_locale())
}

/// `strxfrm_l`.
pub fn strxfrm_l(dest: &mut [u8], src: &[u8], locale: &LocaleHandle) -> usize {
    strxfrm_in(dest, src, &locale.resolve())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{LC_COLLATE_MASK, newlocale};

    fn german() -> LocaleHandle {
        newlocale(LC_COLLATE_MASK, "de_DE", None).unwrap()
    }

    fn key(src: &[u8], locale: &LocaleHandle) -> Vec<u8> {
        let len = strxfrm_l(&mut [], src, locale);
        let mut buf = vec![0u8; len + 1];
        assert_eq!(strxfrm_l(&mut buf, src, locale), len);
        buf.truncate(len);
        buf
    }

    #[test]
    fn c_locale_matches_byte_order() {
        assert_eq!(strcoll(b"abc\0", b"abd\0"), -1);
        assert_eq!(strcoll(b"abc\0", b"abc\0"), 0);
        assert_eq!(strcoll(b"b\0", b"a\0"), 1);
        assert_eq!(strcoll(b"Z\0", b"a\0"), -1);
        assert_eq!(strcoll(b"ab\0", b"abc\0"), -1);
        assert_eq!(strcoll(b"\0", b"\0"), 0);
    }

    #[test]
    fn german_umlauts_sort_beside_base_letter() {
        let de = german();
        assert_eq!(strcoll_l(b"\xE4\0", b"a\0", &de), 1);
        assert_eq!(strcoll_l(b"\xE4\0", b"b\0", &de), -1);
        assert_eq!(strcoll_l(b"\xE4rger\0", b"azur\0", &de), -1);
        assert_eq!(strcoll_l(b"\xDF\0", b"s\0", &de), 1);
        assert_eq!(strcoll_l(b"\xDF\0", b"t\0", &de), -1);
    }

    #[test]
    fn c_locale_puts_high_bytes_after_ascii() {
        assert_eq!(strcoll(b"\xE4\0", b"z\0"), 1);
    }

    #[test]
    fn ligature_pairs_collate_as_one_element() {
        let table = [
            CollationElement::byte(b'c', 0x300),
            CollationElement::byte(b'h', 0x800),
            CollationElement::byte(b'd', 0x400),
            CollationElement::pair(b'c', b'h', 0x380),
        ];
        // "ch" sorts as a letter between "c" and "d".
        assert_eq!(compare_with(&table, b"ch", b"cz"), Ordering::Greater);
        assert_eq!(compare_with(&table, b"ch", b"d"), Ordering::Less);
        assert_eq!(compare_with(&table, b"ch", b"c"), Ordering::Greater);
        assert_eq!(compare_with(&table, b"cd", b"ch"), Ordering::Less);
    }

    #[test]
    fn strxfrm_order_matches_strcoll() {
        let de = german();
        let words: [&[u8]; 8] = [
            b"a", b"\xE4", b"b", b"s", b"\xDF", b"ss", b"t", b"Zebra",
        ];
        for a in words {
            for b in words {
                let by_key = key(a, &de).cmp(&key(b, &de));
                assert_eq!(ordering_to_int(by_key), strcoll_l(a, b, &de));
            }
        }
    }

    #[test]
    fn strxfrm_reports_length_when_truncated() {
        let mut small = [0xAAu8; 4];
        let len = strxfrm(&mut small, b"hi\0");
        assert_eq!(len, 2 * KEY_DIGITS + 1 + 2);
        assert_ne!(small, [0xAA; 4]);

        let mut exact = vec![0xAAu8; len + 1];
        assert_eq!(strxfrm(&mut exact, b"hi\0"), len);
        assert_eq!(exact[len], 0);
        assert_eq!(&exact[len - 2..len], b"hi");
    }

    #[test]
    fn transformed_keys_never_contain_nul() {
        let k = transform_with(Locale::POSIX.collation(), b"\x01\x7f\xff");
        assert!(!k.contains(&0));
    }
}
