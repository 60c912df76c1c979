//! Character classification and conversion.
//!
//! Implements `<ctype.h>` over the active locale. Arguments are C `int`s:
//! a byte value in `0..=255` or `EOF`. Anything else belongs to no class and
//! is returned unchanged by the case conversions.
//!
//! In the "C" locale the predicates are plain ASCII range tests; other
//! locales consult the class sets and case tables of their `LC_CTYPE` record.

use crate::locale::{self, Locale, LocaleHandle};

/// End-of-file marker accepted (and rejected) by every predicate.
pub const EOF: i32 = -1;

/// The twelve standard character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Alnum,
    Alpha,
    Blank,
    Cntrl,
    Digit,
    Graph,
    Lower,
    Print,
    Punct,
    Space,
    Upper,
    Xdigit,
}

impl CharClass {
    pub const ALL: [CharClass; 12] = [
        CharClass::Alnum,
        CharClass::Alpha,
        CharClass::Blank,
        CharClass::Cntrl,
        CharClass::Digit,
        CharClass::Graph,
        CharClass::Lower,
        CharClass::Print,
        CharClass::Punct,
        CharClass::Space,
        CharClass::Upper,
        CharClass::Xdigit,
    ];

    /// Looks up a class by its `wctype` name (`"alpha"`, `"digit"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            CharClass::Alnum => "alnum",
            CharClass::Alpha => "alpha",
            CharClass::Blank => "blank",
            CharClass::Cntrl => "cntrl",
            CharClass::Digit => "digit",
            CharClass::Graph => "graph",
            CharClass::Lower => "lower",
            CharClass::Print => "print",
            CharClass::Punct => "punct",
            CharClass::Space => "space",
            CharClass::Upper => "upper",
            CharClass::Xdigit => "xdigit",
        }
    }
}

/// ASCII rules of the POSIX locale.
fn posix_contains(class: CharClass, c: u8) -> bool {
    match class {
        CharClass::Alnum => c.is_ascii_alphanumeric(),
        CharClass::Alpha => c.is_ascii_alphabetic(),
        CharClass::Blank => matches!(c, b' ' | b'\t'),
        CharClass::Cntrl => c < 0x20 || c == 0x7F,
        CharClass::Digit => c.is_ascii_digit(),
        CharClass::Graph => (0x21..=0x7E).contains(&c),
        CharClass::Lower => c.is_ascii_lowercase(),
        CharClass::Print => (0x20..=0x7E).contains(&c),
        CharClass::Punct => (0x21..=0x7E).contains(&c) && !c.is_ascii_alphanumeric(),
        CharClass::Space => matches!(c, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r'),
        CharClass::Upper => c.is_ascii_uppercase(),
        CharClass::Xdigit => c.is_ascii_hexdigit(),
    }
}

/// Byte-level membership test against `locale`.
#[inline]
pub fn byte_in_class(class: CharClass, c: u8, locale: &Locale) -> bool {
    if locale.is_posix_ctype() {
        posix_contains(class, c)
    } else {
        locale.ctype().contains(class, c)
    }
}

/// Upper-case mapping of a byte under `locale`.
#[inline]
pub fn byte_to_upper(c: u8, locale: &Locale) -> u8 {
    if locale.is_posix_ctype() {
        c.to_ascii_uppercase()
    } else {
        locale.ctype().toupper.map(c)
    }
}

/// Lower-case mapping of a byte under `locale`.
#[inline]
pub fn byte_to_lower(c: u8, locale: &Locale) -> u8 {
    if locale.is_posix_ctype() {
        c.to_ascii_lowercase()
    } else {
        locale.ctype().tolower.map(c)
    }
}

/// Membership of a C `int` character under `locale`; `EOF` and values
/// outside `0..=255` are in no class.
pub fn is_class_in(class: CharClass, c: i32, locale: &Locale) -> bool {
    u8::try_from(c).is_ok_and(|b| byte_in_class(class, b, locale))
}

fn map_int(c: i32, f: impl FnOnce(u8) -> u8) -> i32 {
    match u8::try_from(c) {
        Ok(b) => i32::from(f(b)),
        Err(_) => c,
    }
}

/// `toupper_l` on a [`Locale`] value.
pub fn to_upper_in(c: i32, locale: &Locale) -> i32 {
    map_int(c, |b| byte_to_upper(b, locale))
}

/// `tolower_l` on a [`Locale`] value.
pub fn to_lower_in(c: i32, locale: &Locale) -> i32 {
    map_int(c, |b| byte_to_lower(b, locale))
}

macro_rules! classifiers {
    ($($class:ident => $plain:ident, $with:ident, $what:literal;)*) => {
        $(
            #[doc = concat!("Returns `true` if `c` is ", $what, " in the current locale.")]
            #[inline]
            pub fn $plain(c: i32) -> bool {
                is_class_in(CharClass::$class, c, &locale::current_locale())
            }

            #[doc = concat!("Returns `true` if `c` is ", $what, " in `locale`.")]
            #[inline]
            pub fn $with(c: i32, locale: &LocaleHandle) -> bool {
                is_class_in(CharClass::$class, c, &locale.resolve())
            }
        )*
    };
}

classifiers! {
    Alnum => is_alnum, is_alnum_l, "alphanumeric";
    Alpha => is_alpha, is_alpha_l, "alphabetic";
    Blank => is_blank, is_blank_l, "a blank (space or tab)";
    Cntrl => is_cntrl, is_cntrl_l, "a control character";
    Digit => is_digit, is_digit_l, "a decimal digit";
    Graph => is_graph, is_graph_l, "printable and not a space";
    Lower => is_lower, is_lower_l, "a lowercase letter";
    Print => is_print, is_print_l, "printable (including space)";
    Punct => is_punct, is_punct_l, "punctuation";
    Space => is_space, is_space_l, "whitespace";
    Upper => is_upper, is_upper_l, "an uppercase letter";
    Xdigit => is_xdigit, is_xdigit_l, "a hexadecimal digit";
}

/// Converts `c` to uppercase in the current locale.
#[inline]
pub fn to_upper(c: i32) -> i32 {
    to_upper_in(c, &locale::current_locale())
}

/// Converts `c` to lowercase in the current locale.
#[inline]
pub fn to_lower(c: i32) -> i32 {
    to_lower_in(c, &locale::current_locale())
}

#[inline]
pub fn to_upper_l(c: i32, locale: &LocaleHandle) -> i32 {
    to_upper_in(c, &locale.resolve())
}

#[inline]
pub fn to_lower_l(c: i32, locale: &LocaleHandle) -> i32 {
    to_lower_in(c, &locale.resolve())
}

/// `isascii`: locale independent.
#[inline]
pub fn is_ascii(c: i32) -> bool {
    (0..=0x7F).contains(&c)
}

/// `toascii`: clears everything but the low seven bits.
#[inline]
pub fn to_ascii(c: i32) -> i32 {
    c & 0x7F
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{LC_ALL_MASK, LC_CTYPE_MASK, newlocale};

    fn german() -> LocaleHandle {
        newlocale(LC_CTYPE_MASK, "de_DE", None).unwrap()
    }

    #[test]
    fn test_is_alpha() {
        assert!(is_alpha(i32::from(b'A')));
        assert!(is_alpha(i32::from(b'z')));
        assert!(!is_alpha(i32::from(b'0')));
        assert!(!is_alpha(i32::from(b' ')));
        assert!(!is_alpha(0xC4));
    }

    #[test]
    fn test_is_digit() {
        assert!(is_digit(i32::from(b'0')));
        assert!(is_digit(i32::from(b'9')));
        assert!(!is_digit(i32::from(b'a')));
    }

    #[test]
    fn test_is_space() {
        for c in [b' ', b'\t', b'\n', 0x0B, 0x0C, b'\r'] {
            assert!(is_space(i32::from(c)));
        }
        assert!(!is_space(i32::from(b'a')));
    }

    #[test]
    fn test_punct_excludes_space_and_alnum() {
        assert!(is_punct(i32::from(b'!')));
        assert!(is_punct(i32::from(b'~')));
        assert!(!is_punct(i32::from(b' ')));
        assert!(!is_punct(i32::from(b'q')));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_upper(i32::from(b'a')), i32::from(b'A'));
        assert_eq!(to_lower(i32::from(b'Z')), i32::from(b'z'));
        assert_eq!(to_upper(i32::from(b'5')), i32::from(b'5'));
        assert_eq!(to_upper(0xE4), 0xE4);
    }

    #[test]
    fn eof_and_out_of_range_are_in_no_class() {
        for class in CharClass::ALL {
            assert!(!is_class_in(class, EOF, &Locale::POSIX));
            assert!(!is_class_in(class, 256, &Locale::POSIX));
            assert!(!is_class_in(class, -200, &Locale::POSIX));
        }
        assert_eq!(to_upper(EOF), EOF);
        assert_eq!(to_lower(1000), 1000);
    }

    #[test]
    fn posix_rules_match_table_data() {
        let c_locale = Locale::POSIX;
        for class in CharClass::ALL {
            for b in 0u8..=255 {
                assert_eq!(
                    posix_contains(class, b),
                    c_locale.ctype().contains(class, b),
                    "{} {b:#x}",
                    class.name()
                );
            }
        }
    }

    #[test]
    fn latin1_letters_classify_under_german_locale() {
        let de = german();
        assert!(is_alpha_l(0xE4, &de));
        assert!(is_lower_l(0xE4, &de));
        assert!(is_upper_l(0xC4, &de));
        assert!(!is_alpha_l(0xD7, &de));
        assert!(is_punct_l(0xD7, &de));
        assert!(is_cntrl_l(0x85, &de));
        assert_eq!(to_upper_l(0xE4, &de), 0xC4);
        assert_eq!(to_lower_l(0xDC, &de), 0xFC);
        assert_eq!(to_upper_l(0xDF, &de), 0xDF);
    }

    #[test]
    fn alnum_is_alpha_or_digit_everywhere() {
        let de = newlocale(LC_ALL_MASK, "de_DE", None).unwrap();
        for c in -1..=256 {
            assert_eq!(
                is_alnum_l(c, &de),
                is_alpha_l(c, &de) || is_digit_l(c, &de)
            );
            assert_eq!(is_alnum(c), is_alpha(c) || is_digit(c));
        }
    }

    #[test]
    fn class_names_round_trip() {
        for class in CharClass::ALL {
            assert_eq!(CharClass::from_name(class.name()), Some(class));
        }
        assert_eq!(CharClass::from_name("word"), None);
    }

    #[test]
    fn ascii_helpers() {
        assert!(is_ascii(0x7F));
        assert!(!is_ascii(0x80));
        assert!(!is_ascii(EOF));
        assert_eq!(to_ascii(0xC1), 0x41);
    }
}
