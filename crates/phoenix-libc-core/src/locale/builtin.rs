//! Compile-time locale tables.
//!
//! Every locale the library knows about is described here in full. Records
//! are immutable and live for the whole program; a [`super::Locale`] only
//! stores indices into [`BUILTIN_LOCALES`].

use crate::ctype::CharClass;

/// Value used for unspecified numeric `lconv` fields (POSIX `CHAR_MAX`).
pub const CHAR_MAX: i8 = 127;

/// Index of the "C" locale. "POSIX" resolves here too.
pub const POSIX_INDEX: usize = 0;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One built-in locale.
#[derive(Debug)]
pub struct BuiltinLocale {
    /// Canonical name reported by `setlocale`.
    pub name: &'static str,
    /// Other names that resolve to this record.
    pub aliases: &'static [&'static str],
    /// Character encoding name (`nl_langinfo(CODESET)`).
    pub codeset: &'static str,
    pub numeric: NumericInfo,
    pub monetary: MonetaryInfo,
    pub time: TimeInfo,
    pub messages: MessagesInfo,
    pub ctype: CtypeInfo,
    pub collation: &'static [CollationElement],
}

impl BuiltinLocale {
    /// Whether `name` selects this record. Matching is literal.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

/// `LC_NUMERIC` data.
#[derive(Debug)]
pub struct NumericInfo {
    pub decimal_point: &'static [u8],
    pub thousands_sep: &'static [u8],
    /// Group sizes from the right; the last entry repeats, `CHAR_MAX` stops.
    pub grouping: &'static [u8],
}

/// `LC_MONETARY` data (the POSIX `lconv` monetary members).
#[derive(Debug)]
pub struct MonetaryInfo {
    pub int_curr_symbol: &'static [u8],
    pub currency_symbol: &'static [u8],
    pub mon_decimal_point: &'static [u8],
    pub mon_thousands_sep: &'static [u8],
    pub mon_grouping: &'static [u8],
    pub positive_sign: &'static [u8],
    pub negative_sign: &'static [u8],
    pub int_frac_digits: i8,
    pub frac_digits: i8,
    pub p_cs_precedes: i8,
    pub p_sep_by_space: i8,
    pub n_cs_precedes: i8,
    pub n_sep_by_space: i8,
    pub p_sign_posn: i8,
    pub n_sign_posn: i8,
    pub int_p_cs_precedes: i8,
    pub int_p_sep_by_space: i8,
    pub int_n_cs_precedes: i8,
    pub int_n_sep_by_space: i8,
    pub int_p_sign_posn: i8,
    pub int_n_sign_posn: i8,
}

/// One entry of an `LC_TIME` era list.
#[derive(Debug, Clone, Copy)]
pub struct Era {
    /// `b'+'` or `b'-'`: whether years count up or down from `offset`.
    pub direction: u8,
    pub offset: u32,
    pub start: (i32, u8, u8),
    /// `None` means the era is open ended.
    pub end: Option<(i32, u8, u8)>,
    pub name: &'static str,
    pub format: &'static str,
}

impl Era {
    /// Renders the era in the `direction:offset:start:end:name:format` form
    /// used by `nl_langinfo(ERA)`.
    pub fn describe(&self) -> String {
        let (sy, sm, sd) = self.start;
        let end = match self.end {
            Some((y, m, d)) => format!("{y:04}/{m:02}/{d:02}"),
            None if self.direction == b'-' => String::from("-*"),
            None => String::from("+*"),
        };
        format!(
            "{}:{}:{sy:04}/{sm:02}/{sd:02}:{end}:{}:{}",
            self.direction as char, self.offset, self.name, self.format
        )
    }
}

/// `LC_TIME` data.
#[derive(Debug)]
pub struct TimeInfo {
    pub d_t_fmt: &'static [u8],
    pub d_fmt: &'static [u8],
    pub t_fmt: &'static [u8],
    pub am: &'static [u8],
    pub pm: &'static [u8],
    pub t_fmt_ampm: &'static [u8],
    pub day: [&'static [u8]; 7],
    pub abday: [&'static [u8]; 7],
    pub mon: [&'static [u8]; 12],
    pub abmon: [&'static [u8]; 12],
    pub eras: &'static [Era],
    pub era_d_fmt: &'static [u8],
    pub era_t_fmt: &'static [u8],
    pub era_d_t_fmt: &'static [u8],
    pub alt_digits: &'static [u8],
}

/// `LC_MESSAGES` data.
#[derive(Debug)]
pub struct MessagesInfo {
    pub yesexpr: &'static [u8],
    pub noexpr: &'static [u8],
    pub yesstr: &'static [u8],
    pub nostr: &'static [u8],
}

// ---------------------------------------------------------------------------
// Classification tables
// ---------------------------------------------------------------------------

/// 256-bit membership set over single-byte code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassSet([u64; 4]);

impl ClassSet {
    /// Builds a set from inclusive byte ranges.
    pub const fn from_ranges(ranges: &[(u8, u8)]) -> Self {
        let mut bits = [0u64; 4];
        let mut i = 0;
        while i < ranges.len() {
            let (lo, hi) = ranges[i];
            let mut c = lo as usize;
            while c <= hi as usize {
                bits[c / 64] |= 1u64 << (c % 64);
                c += 1;
            }
            i += 1;
        }
        Self(bits)
    }

    #[inline]
    pub const fn contains(&self, c: u8) -> bool {
        self.0[(c / 64) as usize] & (1u64 << (c % 64)) != 0
    }
}

/// Byte-to-byte case mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseMap([u8; 256]);

impl CaseMap {
    /// Identity everywhere except the given ranges, which move by `delta`.
    pub const fn shifted(ranges: &[(u8, u8)], delta: i16) -> Self {
        let mut table = [0u8; 256];
        let mut c = 0;
        while c < 256 {
            table[c] = c as u8;
            c += 1;
        }
        let mut i = 0;
        while i < ranges.len() {
            let (lo, hi) = ranges[i];
            let mut c = lo as usize;
            while c <= hi as usize {
                table[c] = (c as i16 + delta) as u8;
                c += 1;
            }
            i += 1;
        }
        Self(table)
    }

    #[inline]
    pub const fn map(&self, c: u8) -> u8 {
        self.0[c as usize]
    }
}

/// `LC_CTYPE` data: the eleven primitive classes plus case tables.
///
/// `alnum` is not stored; it is always `alpha | digit`.
#[derive(Debug)]
pub struct CtypeInfo {
    pub upper: ClassSet,
    pub lower: ClassSet,
    pub alpha: ClassSet,
    pub digit: ClassSet,
    pub space: ClassSet,
    pub cntrl: ClassSet,
    pub punct: ClassSet,
    pub graph: ClassSet,
    pub print: ClassSet,
    pub xdigit: ClassSet,
    pub blank: ClassSet,
    pub toupper: CaseMap,
    pub tolower: CaseMap,
}

impl CtypeInfo {
    /// Table membership test for `class`.
    pub fn contains(&self, class: CharClass, c: u8) -> bool {
        match class {
            CharClass::Alnum => self.alpha.contains(c) || self.digit.contains(c),
            CharClass::Alpha => self.alpha.contains(c),
            CharClass::Blank => self.blank.contains(c),
            CharClass::Cntrl => self.cntrl.contains(c),
            CharClass::Digit => self.digit.contains(c),
            CharClass::Graph => self.graph.contains(c),
            CharClass::Lower => self.lower.contains(c),
            CharClass::Print => self.print.contains(c),
            CharClass::Punct => self.punct.contains(c),
            CharClass::Space => self.space.contains(c),
            CharClass::Upper => self.upper.contains(c),
            CharClass::Xdigit => self.xdigit.contains(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Collation
// ---------------------------------------------------------------------------

/// A collating element: one byte, or a two-byte ligature collating as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollationKey {
    Byte(u8),
    Pair([u8; 2]),
}

/// One `(element, weight)` pair of a collation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollationElement {
    pub key: CollationKey,
    pub weight: u64,
}

impl CollationElement {
    pub const fn byte(b: u8, weight: u64) -> Self {
        Self {
            key: CollationKey::Byte(b),
            weight,
        }
    }

    pub const fn pair(a: u8, b: u8, weight: u64) -> Self {
        Self {
            key: CollationKey::Pair([a, b]),
            weight,
        }
    }
}

/// ASCII bytes weigh `b << 8`; the low byte leaves room for variants.
const fn with_ascii<const N: usize>(extra: &[CollationElement]) -> [CollationElement; N] {
    let mut out = [CollationElement::byte(0, 0); N];
    let mut i = 0;
    while i < 128 {
        out[i] = CollationElement::byte(i as u8, (i as u64) << 8);
        i += 1;
    }
    let mut j = 0;
    while j < extra.len() {
        out[128 + j] = extra[j];
        j += 1;
    }
    out
}

const fn variant(b: u8, base: u8, rank: u64) -> CollationElement {
    CollationElement::byte(b, ((base as u64) << 8) | rank)
}

static POSIX_COLLATION: [CollationElement; 128] = with_ascii(&[]);

const LATIN1_VARIANTS: [CollationElement; 62] = [
    variant(0xC0, b'A', 1),
    variant(0xC1, b'A', 2),
    variant(0xC2, b'A', 3),
    variant(0xC3, b'A', 4),
    variant(0xC4, b'A', 5),
    variant(0xC5, b'A', 6),
    variant(0xC6, b'A', 7),
    variant(0xC7, b'C', 1),
    variant(0xC8, b'E', 1),
    variant(0xC9, b'E', 2),
    variant(0xCA, b'E', 3),
    variant(0xCB, b'E', 4),
    variant(0xCC, b'I', 1),
    variant(0xCD, b'I', 2),
    variant(0xCE, b'I', 3),
    variant(0xCF, b'I', 4),
    variant(0xD0, b'D', 1),
    variant(0xD1, b'N', 1),
    variant(0xD2, b'O', 1),
    variant(0xD3, b'O', 2),
    variant(0xD4, b'O', 3),
    variant(0xD5, b'O', 4),
    variant(0xD6, b'O', 5),
    variant(0xD8, b'O', 6),
    variant(0xD9, b'U', 1),
    variant(0xDA, b'U', 2),
    variant(0xDB, b'U', 3),
    variant(0xDC, b'U', 4),
    variant(0xDD, b'Y', 1),
    variant(0xDE, b'T', 1),
    variant(0xDF, b's', 8),
    variant(0xE0, b'a', 1),
    variant(0xE1, b'a', 2),
    variant(0xE2, b'a', 3),
    variant(0xE3, b'a', 4),
    variant(0xE4, b'a', 5),
    variant(0xE5, b'a', 6),
    variant(0xE6, b'a', 7),
    variant(0xE7, b'c', 1),
    variant(0xE8, b'e', 1),
    variant(0xE9, b'e', 2),
    variant(0xEA, b'e', 3),
    variant(0xEB, b'e', 4),
    variant(0xEC, b'i', 1),
    variant(0xED, b'i', 2),
    variant(0xEE, b'i', 3),
    variant(0xEF, b'i', 4),
    variant(0xF0, b'd', 1),
    variant(0xF1, b'n', 1),
    variant(0xF2, b'o', 1),
    variant(0xF3, b'o', 2),
    variant(0xF4, b'o', 3),
    variant(0xF5, b'o', 4),
    variant(0xF6, b'o', 5),
    variant(0xF8, b'o', 6),
    variant(0xF9, b'u', 1),
    variant(0xFA, b'u', 2),
    variant(0xFB, b'u', 3),
    variant(0xFC, b'u', 4),
    variant(0xFD, b'y', 1),
    variant(0xFE, b't', 1),
    variant(0xFF, b'y', 2),
];

static LATIN1_COLLATION: [CollationElement; 128 + LATIN1_VARIANTS.len()] =
    with_ascii(&LATIN1_VARIANTS);

// ---------------------------------------------------------------------------
// Locale records
// ---------------------------------------------------------------------------

const POSIX_PUNCT: [(u8, u8); 4] = [(0x21, 0x2F), (0x3A, 0x40), (0x5B, 0x60), (0x7B, 0x7E)];

const POSIX_CTYPE: CtypeInfo = CtypeInfo {
    upper: ClassSet::from_ranges(&[(b'A', b'Z')]),
    lower: ClassSet::from_ranges(&[(b'a', b'z')]),
    alpha: ClassSet::from_ranges(&[(b'A', b'Z'), (b'a', b'z')]),
    digit: ClassSet::from_ranges(&[(b'0', b'9')]),
    space: ClassSet::from_ranges(&[(b'\t', b'\r'), (b' ', b' ')]),
    cntrl: ClassSet::from_ranges(&[(0x00, 0x1F), (0x7F, 0x7F)]),
    punct: ClassSet::from_ranges(&POSIX_PUNCT),
    graph: ClassSet::from_ranges(&[(0x21, 0x7E)]),
    print: ClassSet::from_ranges(&[(0x20, 0x7E)]),
    xdigit: ClassSet::from_ranges(&[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')]),
    blank: ClassSet::from_ranges(&[(b'\t', b'\t'), (b' ', b' ')]),
    toupper: CaseMap::shifted(&[(b'a', b'z')], -32),
    tolower: CaseMap::shifted(&[(b'A', b'Z')], 32),
};

const LATIN1_CTYPE: CtypeInfo = CtypeInfo {
    upper: ClassSet::from_ranges(&[(b'A', b'Z'), (0xC0, 0xD6), (0xD8, 0xDE)]),
    lower: ClassSet::from_ranges(&[(b'a', b'z'), (0xB5, 0xB5), (0xDF, 0xF6), (0xF8, 0xFF)]),
    alpha: ClassSet::from_ranges(&[
        (b'A', b'Z'),
        (b'a', b'z'),
        (0xAA, 0xAA),
        (0xB5, 0xB5),
        (0xBA, 0xBA),
        (0xC0, 0xD6),
        (0xD8, 0xF6),
        (0xF8, 0xFF),
    ]),
    digit: ClassSet::from_ranges(&[(b'0', b'9')]),
    space: ClassSet::from_ranges(&[(b'\t', b'\r'), (b' ', b' ')]),
    cntrl: ClassSet::from_ranges(&[(0x00, 0x1F), (0x7F, 0x9F)]),
    punct: ClassSet::from_ranges(&[
        (0x21, 0x2F),
        (0x3A, 0x40),
        (0x5B, 0x60),
        (0x7B, 0x7E),
        (0xA0, 0xA9),
        (0xAB, 0xB4),
        (0xB6, 0xB9),
        (0xBB, 0xBF),
        (0xD7, 0xD7),
        (0xF7, 0xF7),
    ]),
    graph: ClassSet::from_ranges(&[(0x21, 0x7E), (0xA0, 0xFF)]),
    print: ClassSet::from_ranges(&[(0x20, 0x7E), (0xA0, 0xFF)]),
    xdigit: ClassSet::from_ranges(&[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')]),
    blank: ClassSet::from_ranges(&[(b'\t', b'\t'), (b' ', b' ')]),
    toupper: CaseMap::shifted(&[(b'a', b'z'), (0xE0, 0xF6), (0xF8, 0xFE)], -32),
    tolower: CaseMap::shifted(&[(b'A', b'Z'), (0xC0, 0xD6), (0xD8, 0xDE)], 32),
};

/// Every locale this library can switch to, indexed by slot value.
pub static BUILTIN_LOCALES: [BuiltinLocale; 2] = [
    BuiltinLocale {
        name: "C",
        aliases: &["POSIX"],
        codeset: "ANSI_X3.4-1968",
        numeric: NumericInfo {
            decimal_point: b".",
            thousands_sep: b"",
            grouping: b"",
        },
        monetary: MonetaryInfo {
            int_curr_symbol: b"",
            currency_symbol: b"",
            mon_decimal_point: b"",
            mon_thousands_sep: b"",
            mon_grouping: b"",
            positive_sign: b"",
            negative_sign: b"",
            int_frac_digits: CHAR_MAX,
            frac_digits: CHAR_MAX,
            p_cs_precedes: CHAR_MAX,
            p_sep_by_space: CHAR_MAX,
            n_cs_precedes: CHAR_MAX,
            n_sep_by_space: CHAR_MAX,
            p_sign_posn: CHAR_MAX,
            n_sign_posn: CHAR_MAX,
            int_p_cs_precedes: CHAR_MAX,
            int_p_sep_by_space: CHAR_MAX,
            int_n_cs_precedes: CHAR_MAX,
            int_n_sep_by_space: CHAR_MAX,
            int_p_sign_posn: CHAR_MAX,
            int_n_sign_posn: CHAR_MAX,
        },
        time: TimeInfo {
            d_t_fmt: b"%a %b %e %H:%M:%S %Y",
            d_fmt: b"%m/%d/%y",
            t_fmt: b"%H:%M:%S",
            am: b"AM",
            pm: b"PM",
            t_fmt_ampm: b"%I:%M:%S %p",
            day: [
                b"Sunday",
                b"Monday",
                b"Tuesday",
                b"Wednesday",
                b"Thursday",
                b"Friday",
                b"Saturday",
            ],
            abday: [b"Sun", b"Mon", b"Tue", b"Wed", b"Thu", b"Fri", b"Sat"],
            mon: [
                b"January",
                b"February",
                b"March",
                b"April",
                b"May",
                b"June",
                b"July",
                b"August",
                b"September",
                b"October",
                b"November",
                b"December",
            ],
            abmon: [
                b"Jan", b"Feb", b"Mar", b"Apr", b"May", b"Jun", b"Jul", b"Aug", b"Sep", b"Oct",
                b"Nov", b"Dec",
            ],
            eras: &[],
            era_d_fmt: b"",
            era_t_fmt: b"",
            era_d_t_fmt: b"",
            alt_digits: b"",
        },
        messages: MessagesInfo {
            yesexpr: b"^[yY]",
            noexpr: b"^[nN]",
            yesstr: b"yes",
            nostr: b"no",
        },
        ctype: POSIX_CTYPE,
        collation: &POSIX_COLLATION,
    },
    BuiltinLocale {
        name: "de_DE.ISO-8859-1",
        aliases: &["de_DE"],
        codeset: "ISO-8859-1",
        numeric: NumericInfo {
            decimal_point: b",",
            thousands_sep: b".",
            grouping: &[3, 3],
        },
        monetary: MonetaryInfo {
            int_curr_symbol: b"EUR ",
            currency_symbol: b"EUR",
            mon_decimal_point: b",",
            mon_thousands_sep: b".",
            mon_grouping: &[3, 3],
            positive_sign: b"",
            negative_sign: b"-",
            int_frac_digits: 2,
            frac_digits: 2,
            p_cs_precedes: 0,
            p_sep_by_space: 1,
            n_cs_precedes: 0,
            n_sep_by_space: 1,
            p_sign_posn: 1,
            n_sign_posn: 1,
            int_p_cs_precedes: 0,
            int_p_sep_by_space: 1,
            int_n_cs_precedes: 0,
            int_n_sep_by_space: 1,
            int_p_sign_posn: 1,
            int_n_sign_posn: 1,
        },
        time: TimeInfo {
            d_t_fmt: b"%a %d %b %Y %T",
            d_fmt: b"%d.%m.%Y",
            t_fmt: b"%T",
            am: b"",
            pm: b"",
            t_fmt_ampm: b"",
            day: [
                b"Sonntag",
                b"Montag",
                b"Dienstag",
                b"Mittwoch",
                b"Donnerstag",
                b"Freitag",
                b"Samstag",
            ],
            abday: [b"So", b"Mo", b"Di", b"Mi", b"Do", b"Fr", b"Sa"],
            mon: [
                b"Januar",
                b"Februar",
                b"M\xE4rz",
                b"April",
                b"Mai",
                b"Juni",
                b"Juli",
                b"August",
                b"September",
                b"Oktober",
                b"November",
                b"Dezember",
            ],
            abmon: [
                b"Jan", b"Feb", b"M\xE4r", b"Apr", b"Mai", b"Jun", b"Jul", b"Aug", b"Sep",
                b"Okt", b"Nov", b"Dez",
            ],
            eras: &[],
            era_d_fmt: b"",
            era_t_fmt: b"",
            era_d_t_fmt: b"",
            alt_digits: b"",
        },
        messages: MessagesInfo {
            yesexpr: b"^[+1jJyY]",
            noexpr: b"^[-0nN]",
            yesstr: b"ja",
            nostr: b"nein",
        },
        ctype: LATIN1_CTYPE,
        collation: &LATIN1_COLLATION,
    },
];

/// Finds the slot index of the built-in called `name`.
pub fn lookup(name: &str) -> Option<usize> {
    BUILTIN_LOCALES.iter().position(|l| l.answers_to(name))
}

/// Record at `index`, falling back to "C" for indices that were never handed out.
#[inline]
pub fn builtin(index: usize) -> &'static BuiltinLocale {
    BUILTIN_LOCALES
        .get(index)
        .unwrap_or(&BUILTIN_LOCALES[POSIX_INDEX])
}
