//! Wide character classification and mapping.
//!
//! Implements `<wctype.h>`. Wide characters are `u32` code points; only the
//! single-byte range `0..=255` is classified, through the same locale data as
//! [`crate::ctype`]. Everything above belongs to no class and maps to itself.

use crate::ctype::{self, CharClass};
use crate::locale::{self, Locale, LocaleHandle};

/// Wide end-of-file marker (`wint_t` all ones).
pub const WEOF: u32 = 0xFFFF_FFFF;

/// Result of `wctrans`: one of the two standard mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseMapping {
    ToUpper,
    ToLower,
}

impl CaseMapping {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "toupper" => Some(Self::ToUpper),
            "tolower" => Some(Self::ToLower),
            _ => None,
        }
    }
}

/// Wide membership test under `locale`.
pub fn is_wclass_in(class: CharClass, wc: u32, locale: &Locale) -> bool {
    u8::try_from(wc).is_ok_and(|b| ctype::byte_in_class(class, b, locale))
}

/// Applies `mapping` to `wc` under `locale`.
pub fn map_wide_in(mapping: CaseMapping, wc: u32, locale: &Locale) -> u32 {
    match u8::try_from(wc) {
        Ok(b) => u32::from(match mapping {
            CaseMapping::ToUpper => ctype::byte_to_upper(b, locale),
            CaseMapping::ToLower => ctype::byte_to_lower(b, locale),
        }),
        Err(_) => wc,
    }
}

macro_rules! wide_classifiers {
    ($($class:ident => $plain:ident, $with:ident;)*) => {
        $(
            #[inline]
            pub fn $plain(wc: u32) -> bool {
                is_wclass_in(CharClass::$class, wc, &locale::current_locale())
            }

            #[inline]
            pub fn $with(wc: u32, locale: &LocaleHandle) -> bool {
                is_wclass_in(CharClass::$class, wc, &locale.resolve())
            }
        )*
    };
}

wide_classifiers! {
    Alnum => is_walnum, is_walnum_l;
    Alpha => is_walpha, is_walpha_l;
    Blank => is_wblank, is_wblank_l;
    Cntrl => is_wcntrl, is_wcntrl_l;
    Digit => is_wdigit, is_wdigit_l;
    Graph => is_wgraph, is_wgraph_l;
    Lower => is_wlower, is_wlower_l;
    Print => is_wprint, is_wprint_l;
    Punct => is_wpunct, is_wpunct_l;
    Space => is_wspace, is_wspace_l;
    Upper => is_wupper, is_wupper_l;
    Xdigit => is_wxdigit, is_wxdigit_l;
}

#[inline]
pub fn to_wupper(wc: u32) -> u32 {
    map_wide_in(CaseMapping::ToUpper, wc, &locale::current_locale())
}

#[inline]
pub fn to_wlower(wc: u32) -> u32 {
    map_wide_in(CaseMapping::ToLower, wc, &locale::current_locale())
}

#[inline]
pub fn to_wupper_l(wc: u32, locale: &LocaleHandle) -> u32 {
    map_wide_in(CaseMapping::ToUpper, wc, &locale.resolve())
}

#[inline]
pub fn to_wlower_l(wc: u32, locale: &LocaleHandle) -> u32 {
    map_wide_in(CaseMapping::ToLower, wc, &locale.resolve())
}

/// `wctype`: class handle by name, `None` for unknown names.
pub fn wctype(name: &str) -> Option<CharClass> {
    CharClass::from_name(name)
}

/// `wctype_l`. Class names do not depend on the locale.
pub fn wctype_l(name: &str, _locale: &LocaleHandle) -> Option<CharClass> {
    wctype(name)
}

/// `iswctype`: nonzero when `wc` is in `class`; a null class gives 0.
pub fn iswctype(wc: u32, class: Option<CharClass>) -> i32 {
    iswctype_in(wc, class, &locale::current_locale())
}

pub fn iswctype_l(wc: u32, class: Option<CharClass>, locale: &LocaleHandle) -> i32 {
    iswctype_in(wc, class, &locale.resolve())
}

fn iswctype_in(wc: u32, class: Option<CharClass>, locale: &Locale) -> i32 {
    class.map_or(0, |class| i32::from(is_wclass_in(class, wc, locale)))
}

/// `wctrans`: mapping handle by name, `None` for unknown names.
pub fn wctrans(name: &str) -> Option<CaseMapping> {
    CaseMapping::from_name(name)
}

pub fn wctrans_l(name: &str, _locale: &LocaleHandle) -> Option<CaseMapping> {
    wctrans(name)
}

/// `towctrans`: a null mapping returns `wc` unchanged.
pub fn towctrans(wc: u32, mapping: Option<CaseMapping>) -> u32 {
    match mapping {
        Some(mapping) => map_wide_in(mapping, wc, &locale::current_locale()),
        None => wc,
    }
}

pub fn towctrans_l(wc: u32, mapping: Option<CaseMapping>, locale: &LocaleHandle) -> u32 {
    match mapping {
        Some(mapping) => map_wide_in(mapping, wc, &locale.resolve()),
        None => wc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{LC_CTYPE_MASK, newlocale};

    #[test]
    fn wide_predicates_agree_with_narrow_in_byte_range() {
        for c in 0u32..=255 {
            assert_eq!(is_walpha(c), ctype::is_alpha(c as i32));
            assert_eq!(is_wspace(c), ctype::is_space(c as i32));
            assert_eq!(to_wupper(c), ctype::to_upper(c as i32) as u32);
        }
    }

    #[test]
    fn wide_values_above_byte_range_are_unclassified() {
        for wc in [0x100, 0x3B1, 0x1F600, WEOF] {
            assert!(!is_walpha(wc));
            assert!(!is_wprint(wc));
            assert_eq!(to_wupper(wc), wc);
            assert_eq!(to_wlower(wc), wc);
        }
    }

    #[test]
    fn wctype_accepts_the_twelve_names() {
        for name in [
            "alnum", "alpha", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
            "space", "upper", "xdigit",
        ] {
            assert!(wctype(name).is_some(), "{name}");
        }
        assert_eq!(wctype("ALPHA"), None);
        assert_eq!(wctype(""), None);
    }

    #[test]
    fn iswctype_dispatches_and_null_class_is_zero() {
        let digit = wctype("digit");
        assert_eq!(iswctype(u32::from(b'7'), digit), 1);
        assert_eq!(iswctype(u32::from(b'x'), digit), 0);
        assert_eq!(iswctype(u32::from(b'7'), None), 0);
    }

    #[test]
    fn towctrans_dispatches_and_null_mapping_is_identity() {
        assert_eq!(towctrans(u32::from(b'q'), wctrans("toupper")), u32::from(b'Q'));
        assert_eq!(towctrans(u32::from(b'Q'), wctrans("tolower")), u32::from(b'q'));
        assert_eq!(towctrans(u32::from(b'q'), None), u32::from(b'q'));
        assert_eq!(wctrans("totitle"), None);
    }

    #[test]
    fn german_locale_extends_wide_classes() {
        let de = newlocale(LC_CTYPE_MASK, "de_DE", None).unwrap();
        assert!(is_walpha_l(0xF6, &de));
        assert_eq!(to_wupper_l(0xF6, &de), 0xD6);
        assert_eq!(towctrans_l(0xD6, wctrans("tolower"), &de), 0xF6);
        assert_eq!(iswctype_l(0xC9, wctype("upper"), &de), 1);
        assert!(!is_walpha_l(0x100, &de));
    }
}
