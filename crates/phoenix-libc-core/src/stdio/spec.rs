//! Conversion specification parser shared by printf and scanf.
//!
//! [`parse_format_spec`] is handed the bytes following a `%` and yields a
//! structured [`FormatSpec`] plus the number of bytes it consumed. The two
//! dialects share the grammar
//!
//! ```text
//! [N$] [flags] [width] [m] [.precision] [length] conversion
//! ```
//!
//! with these differences: printf takes `*`/`*N$` widths and precisions and
//! rejects `%[` and `m`; scanf takes neither `*` (its suppression sigil is
//! stripped by the caller) nor a precision, and accepts `m` and `%[`.

/// Which engine is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Printf,
    Scanf,
}

/// Flags parsed from a format directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub left_justify: bool, // '-'
    pub force_sign: bool,   // '+'
    pub space_sign: bool,   // ' '
    pub alt_form: bool,     // '#'
    pub zero_pad: bool,     // '0'
    pub group: bool,        // '\''
}

/// Width specification. `FromArg(0)` takes the next sequential argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    None,
    Fixed(usize),
    FromArg(usize),
}

/// Precision specification. `Fixed(0)` and `None` are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    None,
    Fixed(usize),
    FromArg(usize),
}

/// Length modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMod {
    None,
    Hh,   // 'hh'
    H,    // 'h'
    L,    // 'l'
    Ll,   // 'll'
    J,    // 'j'
    Z,    // 'z'
    T,    // 't'
    BigL, // 'L'
}

/// Floating-point rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatStyle {
    Fixed,      // f F
    Scientific, // e E
    Flexible,   // g G
    Hex,        // a A
}

/// What a conversion does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvKind {
    Integer,
    Float(FloatStyle),
    Char,
    Str,
    Pointer,
    Scanset,
    Count,
    Percent,
}

/// Digit base of an integer conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Octal,
    Decimal,
    Hex,
    /// `%i` input: base from the `0`/`0x` prefix.
    Detect,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Octal => 8,
            Radix::Decimal | Radix::Detect => 10,
            Radix::Hex => 16,
        }
    }
}

/// A `%[...]` member set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanset<'a> {
    /// Bytes between `[` (after any `^`) and the closing `]`.
    pub body: &'a [u8],
    pub negated: bool,
    members: [u64; 4],
}

impl<'a> Scanset<'a> {
    fn new(body: &'a [u8], negated: bool) -> Self {
        let mut members = [0u64; 4];
        let mut add = |b: u8| members[usize::from(b / 64)] |= 1u64 << (b % 64);
        let mut i = 0;
        while i < body.len() {
            let lo = body[i];
            // A '-' between two bytes spans them; first, last or descending
            // it is an ordinary member.
            if body.get(i + 1) == Some(&b'-') && i + 2 < body.len() && body[i + 2] >= lo {
                (lo..=body[i + 2]).for_each(&mut add);
                i += 3;
                continue;
            }
            add(lo);
            i += 1;
        }
        Self {
            body,
            negated,
            members,
        }
    }

    /// Whether `b` is accepted by the set (negation applied).
    #[inline]
    pub fn accepts(&self, b: u8) -> bool {
        let member = self.members[usize::from(b / 64)] & (1u64 << (b % 64)) != 0;
        member != self.negated
    }
}

/// A parsed conversion specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec<'a> {
    /// `N` of a leading `N$`, or 0 for the next sequential argument.
    pub position: usize,
    pub flags: FormatFlags,
    pub width: Width,
    pub precision: Precision,
    pub length: LengthMod,
    pub kind: ConvKind,
    pub radix: Radix,
    pub signed: bool,
    pub uppercase: bool,
    /// The conversion character itself.
    pub conversion: u8,
    pub scanset: Option<Scanset<'a>>,
    /// scanf `m`: allocate the destination.
    pub alloc: bool,
}

impl FormatSpec<'_> {
    /// Whether the conversion consumes an argument.
    pub fn takes_arg(&self) -> bool {
        !matches!(self.kind, ConvKind::Percent)
    }

    /// Whether `%lc`/`%ls` (or `%C`/`%S`) wide forms apply.
    pub fn is_wide(&self) -> bool {
        matches!(self.kind, ConvKind::Char | ConvKind::Str | ConvKind::Scanset)
            && self.length == LengthMod::L
    }
}

/// Parses a decimal run starting at `pos`; returns the value and the end.
fn parse_decimal(fmt: &[u8], mut pos: usize) -> (Option<usize>, usize) {
    let start = pos;
    let mut value = 0_usize;
    while pos < fmt.len() && fmt[pos].is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(usize::from(fmt[pos] - b'0'));
        pos += 1;
    }
    ((pos > start).then_some(value), pos)
}

/// Parses an optional `N$` at `pos`. Returns the index and the new position,
/// or `(0, pos)` when there is none.
fn parse_position(fmt: &[u8], pos: usize) -> Option<(usize, usize)> {
    match parse_decimal(fmt, pos) {
        (Some(n), end) if fmt.get(end) == Some(&b'$') => {
            if n == 0 {
                None
            } else {
                Some((n, end + 1))
            }
        }
        _ => Some((0, pos)),
    }
}

/// Parse a single conversion specification starting after the '%' character.
///
/// Returns `(spec, bytes_consumed)` where `bytes_consumed` counts from
/// `fmt[0]`, or `None` if the directive is malformed for `dialect`.
pub fn parse_format_spec(fmt: &[u8], dialect: Dialect) -> Option<(FormatSpec<'_>, usize)> {
    let len = fmt.len();
    let (position, mut pos) = parse_position(fmt, 0)?;

    // --- flags ---
    let mut flags = FormatFlags::default();
    while pos < len {
        match (dialect, fmt[pos]) {
            (_, b'\'') => flags.group = true,
            (Dialect::Printf, b'-') => flags.left_justify = true,
            (Dialect::Printf, b'+') => flags.force_sign = true,
            (Dialect::Printf, b' ') => flags.space_sign = true,
            (Dialect::Printf, b'#') => flags.alt_form = true,
            (Dialect::Printf, b'0') => flags.zero_pad = true,
            _ => break,
        }
        pos += 1;
    }
    // POSIX: '+' overrides ' '; '-' overrides '0'.
    if flags.force_sign {
        flags.space_sign = false;
    }
    if flags.left_justify {
        flags.zero_pad = false;
    }

    // --- width ---
    let width = if pos < len && fmt[pos] == b'*' {
        if dialect == Dialect::Scanf {
            return None;
        }
        let (n, next) = parse_position(fmt, pos + 1)?;
        pos = next;
        Width::FromArg(n)
    } else {
        let (value, next) = parse_decimal(fmt, pos);
        pos = next;
        value.map_or(Width::None, Width::Fixed)
    };

    // --- assignment allocation ---
    let mut alloc = false;
    if dialect == Dialect::Scanf && pos < len && fmt[pos] == b'm' {
        alloc = true;
        pos += 1;
    }

    // --- precision ---
    let precision = if pos < len && fmt[pos] == b'.' {
        if dialect == Dialect::Scanf {
            return None;
        }
        pos += 1;
        if pos < len && fmt[pos] == b'*' {
            let (n, next) = parse_position(fmt, pos + 1)?;
            pos = next;
            Precision::FromArg(n)
        } else {
            let (value, next) = parse_decimal(fmt, pos);
            pos = next;
            Precision::Fixed(value.unwrap_or(0))
        }
    } else {
        Precision::None
    };

    // --- length modifier ---
    let mut length = LengthMod::None;
    if pos < len {
        let (modifier, width) = match (fmt[pos], fmt.get(pos + 1)) {
            (b'h', Some(b'h')) => (LengthMod::Hh, 2),
            (b'h', _) => (LengthMod::H, 1),
            (b'l', Some(b'l')) => (LengthMod::Ll, 2),
            (b'l', _) => (LengthMod::L, 1),
            (b'j', _) => (LengthMod::J, 1),
            (b'z', _) => (LengthMod::Z, 1),
            (b't', _) => (LengthMod::T, 1),
            (b'L', _) => (LengthMod::BigL, 1),
            _ => (LengthMod::None, 0),
        };
        length = modifier;
        pos += width;
    }

    // --- conversion specifier ---
    let conversion = *fmt.get(pos)?;
    pos += 1;

    let mut spec = FormatSpec {
        position,
        flags,
        width,
        precision,
        length,
        kind: ConvKind::Integer,
        radix: Radix::Decimal,
        signed: false,
        uppercase: conversion.is_ascii_uppercase(),
        conversion,
        scanset: None,
        alloc,
    };

    match conversion {
        b'd' => spec.signed = true,
        b'i' => {
            spec.signed = true;
            spec.radix = Radix::Detect;
        }
        b'u' => {}
        b'o' => spec.radix = Radix::Octal,
        b'x' | b'X' => spec.radix = Radix::Hex,
        b'f' | b'F' => spec.kind = ConvKind::Float(FloatStyle::Fixed),
        b'e' | b'E' => spec.kind = ConvKind::Float(FloatStyle::Scientific),
        b'g' | b'G' => spec.kind = ConvKind::Float(FloatStyle::Flexible),
        b'a' | b'A' => spec.kind = ConvKind::Float(FloatStyle::Hex),
        b'c' => spec.kind = ConvKind::Char,
        b'C' => {
            spec.kind = ConvKind::Char;
            spec.length = LengthMod::L;
        }
        b's' => spec.kind = ConvKind::Str,
        b'S' => {
            spec.kind = ConvKind::Str;
            spec.length = LengthMod::L;
        }
        b'p' => {
            spec.kind = ConvKind::Pointer;
            spec.radix = Radix::Hex;
            spec.uppercase = false;
        }
        b'n' => spec.kind = ConvKind::Count,
        b'%' => spec.kind = ConvKind::Percent,
        b'[' if dialect == Dialect::Scanf => {
            let (scanset, consumed) = parse_scanset(&fmt[pos..])?;
            spec.kind = ConvKind::Scanset;
            spec.scanset = Some(scanset);
            pos += consumed;
        }
        _ => return None,
    }
    if spec.kind != ConvKind::Scanset {
        spec.uppercase &= !matches!(conversion, b'C' | b'S');
    }
    if alloc && !matches!(spec.kind, ConvKind::Str | ConvKind::Char | ConvKind::Scanset) {
        return None;
    }

    Some((spec, pos))
}

/// Parses the body of `%[` (the bytes after `[`) through the closing `]`.
///
/// Returns the set and the number of bytes consumed, including the `]`.
pub fn parse_scanset(fmt: &[u8]) -> Option<(Scanset<'_>, usize)> {
    let mut pos = 0;
    let negated = fmt.first() == Some(&b'^');
    if negated {
        pos += 1;
    }
    let body_start = pos;
    // A ']' right after '[' or '[^' is a member, not the terminator.
    if fmt.get(pos) == Some(&b']') {
        pos += 1;
    }
    while pos < fmt.len() && fmt[pos] != b']' {
        pos += 1;
    }
    if pos >= fmt.len() {
        return None;
    }
    let body = &fmt[body_start..pos];
    Some((Scanset::new(body, negated), pos + 1))
}
