//! Formatted input (`scanf` family).
//!
//! The engine walks a format with the shared conversion parser, pulls bytes
//! from a [`Source`] and stores results through [`ScanArg`] destinations.
//! Every destination is a typed `&mut`; a destination whose type does not
//! fit the conversion's length class fails the call with `EINVAL`.

use super::args::{ArgPlan, uses_positions};
use super::file::{CharWidth, Stream, StreamGuard};
use super::source::{Source, StrSource, StreamSource};
use super::spec::{ConvKind, Dialect, FormatSpec, LengthMod, Radix, Width, parse_format_spec};
use super::table::stdin;
use super::EOF;
use crate::ctype::{CharClass, byte_in_class};
use crate::errno;
use crate::locale::{self, Locale};
use crate::string::c_str;

/// One scanf destination, typed by the C object it stands for.
///
/// `Chars` receives `%c` bytes, or a NUL-terminated `%s`/`%[` field; its
/// length bounds the field. `Alloc` is the `m` form: it is cleared and
/// grown to hold the field (without a terminator).
#[derive(Debug)]
pub enum ScanArg<'a> {
    SChar(&'a mut i8),
    UChar(&'a mut u8),
    Short(&'a mut i16),
    UShort(&'a mut u16),
    Int(&'a mut i32),
    UInt(&'a mut u32),
    Long(&'a mut i64),
    ULong(&'a mut u64),
    LongLong(&'a mut i64),
    ULongLong(&'a mut u64),
    IntMax(&'a mut i64),
    UIntMax(&'a mut u64),
    Size(&'a mut usize),
    PtrDiff(&'a mut isize),
    Pointer(&'a mut usize),
    Float(&'a mut f32),
    Double(&'a mut f64),
    LongDouble(&'a mut f64),
    Chars(&'a mut [u8]),
    WideChars(&'a mut [u32]),
    Alloc(&'a mut Vec<u8>),
}

impl ScanArg<'_> {
    /// Bit width of this integer destination when read with `length`.
    fn int_bits(&self, length: LengthMod) -> Option<u32> {
        use ScanArg::*;
        let (class, bits) = match self {
            SChar(_) | UChar(_) => (LengthMod::Hh, 8),
            Short(_) | UShort(_) => (LengthMod::H, 16),
            Int(_) | UInt(_) => (LengthMod::None, 32),
            Long(_) | ULong(_) => (LengthMod::L, 64),
            LongLong(_) | ULongLong(_) => (LengthMod::Ll, 64),
            IntMax(_) | UIntMax(_) => (LengthMod::J, 64),
            Size(_) => (LengthMod::Z, usize::BITS),
            PtrDiff(_) => (LengthMod::T, isize::BITS),
            _ => return None,
        };
        (class == length).then_some(bits)
    }

    /// Stores the low bits of `raw`.
    fn put_int(&mut self, raw: u64) {
        use ScanArg::*;
        match self {
            SChar(v) => **v = raw as i8,
            UChar(v) => **v = raw as u8,
            Short(v) => **v = raw as i16,
            UShort(v) => **v = raw as u16,
            Int(v) => **v = raw as i32,
            UInt(v) => **v = raw as u32,
            Long(v) | LongLong(v) | IntMax(v) => **v = raw as i64,
            ULong(v) | ULongLong(v) | UIntMax(v) => **v = raw,
            Size(v) | Pointer(v) => **v = raw as usize,
            PtrDiff(v) => **v = raw as isize,
            _ => {}
        }
    }
}

/// Result of reading one field.
enum Field<T> {
    Value(T),
    Mismatch,
    Eof,
}

/// What a directive did.
enum Flow {
    Assigned,
    /// Converted without storing (`*`).
    Skipped,
    /// `%n` or `%%`: nothing converted.
    Continue,
    Stop,
    InputFailure,
}

impl<T> From<Field<T>> for Flow {
    fn from(field: Field<T>) -> Self {
        match field {
            Field::Value(_) => Flow::Skipped,
            Field::Mismatch => Flow::Stop,
            Field::Eof => Flow::InputFailure,
        }
    }
}

// ---------------------------------------------------------------------------
// Destinations
// ---------------------------------------------------------------------------

/// Where `%c`, `%s` and `%[` put their characters.
enum TextDest<'t> {
    Discard,
    Narrow(&'t mut [u8]),
    Wide(&'t mut [u32]),
    Grow(&'t mut Vec<u8>),
}

impl<'t> TextDest<'t> {
    fn of(spec: &FormatSpec<'_>, target: Option<&'t mut ScanArg<'_>>) -> Result<Self, i32> {
        let Some(target) = target else {
            return Ok(TextDest::Discard);
        };
        let (alloc, wide) = (spec.alloc, spec.is_wide());
        match target {
            ScanArg::Chars(buf) if !alloc && !wide => Ok(TextDest::Narrow(buf)),
            ScanArg::WideChars(buf) if !alloc && wide => Ok(TextDest::Wide(buf)),
            ScanArg::Alloc(vec) if alloc && !wide => {
                vec.clear();
                Ok(TextDest::Grow(vec))
            }
            _ => Err(errno::EINVAL),
        }
    }

    /// Characters it can take, keeping one slot for the NUL when `nul`.
    fn room(&self, nul: bool) -> usize {
        let reserve = usize::from(nul);
        match self {
            TextDest::Discard | TextDest::Grow(_) => usize::MAX,
            TextDest::Narrow(buf) => buf.len().saturating_sub(reserve),
            TextDest::Wide(buf) => buf.len().saturating_sub(reserve),
        }
    }

    fn put(&mut self, n: usize, b: u8) -> Result<(), i32> {
        match self {
            TextDest::Discard => {}
            TextDest::Narrow(buf) => buf[n] = b,
            TextDest::Wide(buf) => buf[n] = u32::from(b),
            TextDest::Grow(vec) => {
                vec.try_reserve(1).map_err(|_| errno::ENOMEM)?;
                vec.push(b);
            }
        }
        Ok(())
    }

    fn terminate(&mut self, n: usize) {
        match self {
            TextDest::Narrow(buf) => {
                if let Some(slot) = buf.get_mut(n) {
                    *slot = 0;
                }
            }
            TextDest::Wide(buf) => {
                if let Some(slot) = buf.get_mut(n) {
                    *slot = 0;
                }
            }
            TextDest::Discard | TextDest::Grow(_) => {}
        }
    }
}

/// Destinations in the order the format reads them.
struct Targets<'t, 'a> {
    args: &'t mut [ScanArg<'a>],
    /// Planned slots (1-based) when the format uses `%N$`.
    slots: Option<std::vec::IntoIter<usize>>,
    next: usize,
}

impl<'t, 'a> Targets<'t, 'a> {
    fn for_format(fmt: &[u8], args: &'t mut [ScanArg<'a>]) -> Result<Self, i32> {
        let slots = if uses_positions(fmt, Dialect::Scanf) {
            let plan = ArgPlan::build(fmt, Dialect::Scanf)?;
            if plan.len() > args.len() {
                return Err(errno::EINVAL);
            }
            Some(plan.slots().to_vec().into_iter())
        } else {
            None
        };
        Ok(Self {
            args,
            slots,
            next: 0,
        })
    }

    fn next(&mut self) -> Result<&mut ScanArg<'a>, i32> {
        let index = match &mut self.slots {
            Some(slots) => slots.next().ok_or(errno::EINVAL)? - 1,
            None => {
                self.next += 1;
                self.next - 1
            }
        };
        self.args.get_mut(index).ok_or(errno::EINVAL)
    }
}

/// Clamps a parsed magnitude into a `bits`-wide destination.
///
/// Returns the two's-complement bits to store and whether the value was out
/// of range. Unsigned conversions of negative input wrap, as `strtoul` does.
fn fit_integer(neg: bool, magnitude: u64, overflow: bool, bits: u32, signed: bool) -> (u64, bool) {
    let umax = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    if signed {
        let max = umax >> 1;
        let min_magnitude = max + 1;
        if neg {
            if overflow || magnitude > min_magnitude {
                (min_magnitude.wrapping_neg(), true)
            } else {
                (magnitude.wrapping_neg(), false)
            }
        } else if overflow || magnitude > max {
            (max, true)
        } else {
            (magnitude, false)
        }
    } else if overflow || magnitude > umax {
        (umax, true)
    } else if neg {
        (magnitude.wrapping_neg() & umax, false)
    } else {
        (magnitude, false)
    }
}

/// `x * 2^exp` without intermediate overflow of the scale factor.
fn scale_by_pow2(mut x: f64, mut exp: i32) -> f64 {
    const STEP: i32 = 1000;
    while exp > STEP && x.is_finite() {
        x *= 2f64.powi(STEP);
        exp -= STEP;
    }
    while exp < -STEP && x != 0.0 {
        x *= 2f64.powi(-STEP);
        exp += STEP;
    }
    x * 2f64.powi(exp)
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'l, S> {
    src: S,
    locale: &'l Locale,
    /// Bytes consumed so far (`%n`).
    consumed: usize,
    eof: bool,
    /// First read error; reading stops there.
    failure: Option<i32>,
}

impl<'l, S: Source> Scanner<'l, S> {
    fn new(src: S, locale: &'l Locale) -> Self {
        Self {
            src,
            locale,
            consumed: 0,
            eof: false,
            failure: None,
        }
    }

    fn getc(&mut self) -> Option<u8> {
        if self.eof {
            return None;
        }
        match self.src.getc() {
            Ok(Some(b)) => {
                self.consumed += 1;
                Some(b)
            }
            Ok(None) => {
                self.eof = true;
                None
            }
            Err(code) => {
                self.failure.get_or_insert(code);
                self.eof = true;
                None
            }
        }
    }

    fn ungetc(&mut self, b: u8) -> Result<(), i32> {
        self.src.ungetc(b)?;
        self.consumed -= 1;
        Ok(())
    }

    /// Next byte of a field with `left` bytes of width remaining.
    fn take(&mut self, left: &mut usize) -> Option<u8> {
        if *left == 0 {
            return None;
        }
        let b = self.getc()?;
        *left -= 1;
        Some(b)
    }

    /// Returns the byte that ended a field, if one was read.
    fn put_back(&mut self, next: Option<u8>) -> Result<(), i32> {
        match next {
            Some(b) => self.ungetc(b),
            None => Ok(()),
        }
    }

    fn is_space(&self, b: u8) -> bool {
        byte_in_class(CharClass::Space, b, self.locale)
    }

    fn skip_space(&mut self) -> Result<(), i32> {
        while let Some(b) = self.getc() {
            if !self.is_space(b) {
                return self.ungetc(b);
            }
        }
        Ok(())
    }

    fn no_input<T>(&self) -> Field<T> {
        if self.eof { Field::Eof } else { Field::Mismatch }
    }

    fn thousands_sep(&self, spec: &FormatSpec<'_>) -> Option<u8> {
        match self.locale.numeric().thousands_sep {
            [sep] if spec.flags.group => Some(*sep),
            _ => None,
        }
    }

    fn radix_char(&self) -> u8 {
        match self.locale.numeric().decimal_point {
            [point] => *point,
            _ => b'.',
        }
    }

    // -----------------------------------------------------------------------
    // Integers
    // -----------------------------------------------------------------------

    /// Reads sign, prefix and digits; returns `(negative, magnitude, overflow)`.
    fn scan_integer(
        &mut self,
        spec: &FormatSpec<'_>,
        left: &mut usize,
    ) -> Result<Field<(bool, u64, bool)>, i32> {
        self.skip_space()?;
        let Some(mut c) = self.take(left) else {
            return Ok(self.no_input());
        };

        let mut neg = false;
        if c == b'+' || c == b'-' {
            neg = c == b'-';
            match self.take(left) {
                Some(b) => c = b,
                None => return Ok(Field::Mismatch),
            }
        }

        let mut base = spec.radix.base();
        let mut digits = 0usize;
        let mut next = Some(c);
        let prefixed = matches!(spec.radix, Radix::Hex | Radix::Detect);
        if prefixed && c == b'0' {
            digits = 1;
            next = self.take(left);
            match next {
                Some(x) if x | 0x20 == b'x' => match self.take(left) {
                    Some(h) if h.is_ascii_hexdigit() => {
                        base = 16;
                        digits = 0;
                        next = Some(h);
                    }
                    // "0x" without hex digits reads as zero.
                    other => {
                        self.put_back(other)?;
                        return Ok(Field::Value((neg, 0, false)));
                    }
                },
                _ if spec.radix == Radix::Detect => base = 8,
                _ => {}
            }
        }

        let sep = self.thousands_sep(spec);
        let mut magnitude = 0u64;
        let mut overflow = false;
        while let Some(b) = next {
            if let Some(d) = char::from(b).to_digit(base) {
                match magnitude
                    .checked_mul(u64::from(base))
                    .and_then(|m| m.checked_add(u64::from(d)))
                {
                    Some(m) => magnitude = m,
                    None => overflow = true,
                }
                digits += 1;
            } else if Some(b) != sep || digits == 0 {
                break;
            }
            next = self.take(left);
        }
        self.put_back(next)?;

        if digits == 0 {
            return Ok(Field::Mismatch);
        }
        Ok(Field::Value((neg, magnitude, overflow)))
    }

    fn convert_integer(
        &mut self,
        spec: &FormatSpec<'_>,
        mut left: usize,
        mut target: Option<&mut ScanArg<'_>>,
    ) -> Result<Flow, i32> {
        let bits = match target.as_deref() {
            None => 64,
            Some(ScanArg::Pointer(_)) if spec.kind == ConvKind::Pointer => usize::BITS,
            Some(_) if spec.kind == ConvKind::Pointer => return Err(errno::EINVAL),
            Some(t) => t.int_bits(spec.length).ok_or(errno::EINVAL)?,
        };
        let (neg, magnitude, overflow) = match self.scan_integer(spec, &mut left)? {
            Field::Value(v) => v,
            other => return Ok(other.into()),
        };
        let Some(target) = target.as_deref_mut() else {
            return Ok(Flow::Skipped);
        };
        let signed = spec.signed && spec.kind != ConvKind::Pointer;
        let (raw, clamped) = fit_integer(neg, magnitude, overflow, bits, signed);
        if clamped {
            errno::set_errno(errno::EOVERFLOW);
        }
        target.put_int(raw);
        Ok(Flow::Assigned)
    }

    // -----------------------------------------------------------------------
    // Floats
    // -----------------------------------------------------------------------

    /// Matches the rest of `word` (its first byte already read),
    /// case-insensitively.
    fn expect_word(&mut self, word: &[u8], left: &mut usize) -> Result<bool, i32> {
        for &w in &word[1..] {
            match self.take(left) {
                Some(b) if b.to_ascii_lowercase() == w => {}
                other => {
                    self.put_back(other)?;
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn scan_float(&mut self, spec: &FormatSpec<'_>, left: &mut usize) -> Result<Field<f64>, i32> {
        self.skip_space()?;
        let Some(mut c) = self.take(left) else {
            return Ok(self.no_input());
        };
        let mut neg = false;
        if c == b'+' || c == b'-' {
            neg = c == b'-';
            match self.take(left) {
                Some(b) => c = b,
                None => return Ok(Field::Mismatch),
            }
        }

        let magnitude = match c.to_ascii_lowercase() {
            b'i' => {
                if !self.expect_word(b"inf", left)? {
                    return Ok(Field::Mismatch);
                }
                // "inf" may continue as "infinity".
                match self.take(left) {
                    Some(b) if b.to_ascii_lowercase() == b'i' => {
                        self.expect_word(b"inity", left)?;
                    }
                    other => self.put_back(other)?,
                }
                Field::Value(f64::INFINITY)
            }
            b'n' => {
                if !self.expect_word(b"nan", left)? {
                    return Ok(Field::Mismatch);
                }
                self.scan_nan_payload(left)?
            }
            b'0' => match self.take(left) {
                Some(x) if x | 0x20 == b'x' => self.scan_hex_float(left)?,
                next => self.scan_decimal(spec, String::from("0"), next, left)?,
            },
            _ => self.scan_decimal(spec, String::new(), Some(c), left)?,
        };

        Ok(match magnitude {
            Field::Value(v) if neg => Field::Value(-v),
            other => other,
        })
    }

    /// Optional `(n-char-sequence)` after "nan".
    fn scan_nan_payload(&mut self, left: &mut usize) -> Result<Field<f64>, i32> {
        match self.take(left) {
            Some(b'(') => {}
            other => {
                self.put_back(other)?;
                return Ok(Field::Value(f64::NAN));
            }
        }
        loop {
            match self.take(left) {
                Some(b')') => return Ok(Field::Value(f64::NAN)),
                Some(b) if b.is_ascii_alphanumeric() || b == b'_' => {}
                other => {
                    self.put_back(other)?;
                    return Ok(Field::Mismatch);
                }
            }
        }
    }

    /// Decimal mantissa and exponent. `text` holds digits already read and
    /// `next` the first byte not yet examined.
    fn scan_decimal(
        &mut self,
        spec: &FormatSpec<'_>,
        mut text: String,
        mut next: Option<u8>,
        left: &mut usize,
    ) -> Result<Field<f64>, i32> {
        let sep = self.thousands_sep(spec);
        let point = self.radix_char();
        let mut digits = text.len();

        while let Some(b) = next {
            if b.is_ascii_digit() {
                text.push(char::from(b));
                digits += 1;
            } else if Some(b) != sep || digits == 0 {
                break;
            }
            next = self.take(left);
        }
        if next == Some(point) {
            text.push('.');
            next = self.take(left);
            while let Some(b) = next.filter(u8::is_ascii_digit) {
                text.push(char::from(b));
                digits += 1;
                next = self.take(left);
            }
        }
        if digits == 0 {
            self.put_back(next)?;
            return Ok(Field::Mismatch);
        }

        if next.is_some_and(|b| b | 0x20 == b'e') {
            let mut exponent = String::from("e");
            next = self.take(left);
            if let Some(sign) = next.filter(|&b| b == b'+' || b == b'-') {
                exponent.push(char::from(sign));
                next = self.take(left);
            }
            let mut exp_digits = 0;
            while let Some(b) = next.filter(u8::is_ascii_digit) {
                exponent.push(char::from(b));
                exp_digits += 1;
                next = self.take(left);
            }
            if exp_digits > 0 {
                text.push_str(&exponent);
            }
        }
        self.put_back(next)?;

        Ok(text.parse::<f64>().map_or(Field::Mismatch, Field::Value))
    }

    /// Hex float after "0x": hex digits, optional point, optional `p` exponent.
    fn scan_hex_float(&mut self, left: &mut usize) -> Result<Field<f64>, i32> {
        let point = self.radix_char();
        let mut mantissa = 0u64;
        let mut exp = 0i32;
        let mut sticky = false;
        let mut digits = 0;
        let mut after_point = false;

        let mut next = self.take(left);
        loop {
            match next {
                Some(b) if b == point && !after_point => after_point = true,
                Some(b) if b.is_ascii_hexdigit() => {
                    let d = u64::from(char::from(b).to_digit(16).unwrap_or(0));
                    if mantissa >> 60 == 0 {
                        mantissa = mantissa << 4 | d;
                        if after_point {
                            exp -= 4;
                        }
                    } else {
                        sticky |= d != 0;
                        if !after_point {
                            exp += 4;
                        }
                    }
                    digits += 1;
                }
                _ => break,
            }
            next = self.take(left);
        }
        if digits == 0 {
            // "0x" alone is the zero before the 'x'.
            self.put_back(next)?;
            return Ok(Field::Value(0.0));
        }

        if next.is_some_and(|b| b | 0x20 == b'p') {
            next = self.take(left);
            let mut exp_neg = false;
            if let Some(sign) = next.filter(|&b| b == b'+' || b == b'-') {
                exp_neg = sign == b'-';
                next = self.take(left);
            }
            let mut bin_exp = 0i32;
            while let Some(b) = next.filter(u8::is_ascii_digit) {
                bin_exp = bin_exp.saturating_mul(10).saturating_add(i32::from(b - b'0'));
                next = self.take(left);
            }
            exp = exp.saturating_add(if exp_neg { -bin_exp } else { bin_exp });
        }
        self.put_back(next)?;

        if sticky {
            mantissa |= 1;
        }
        Ok(Field::Value(scale_by_pow2(mantissa as f64, exp)))
    }

    fn convert_float(
        &mut self,
        spec: &FormatSpec<'_>,
        mut left: usize,
        target: Option<&mut ScanArg<'_>>,
    ) -> Result<Flow, i32> {
        let fits = match (spec.length, target.as_deref()) {
            (_, None) => true,
            (LengthMod::None, Some(ScanArg::Float(_)))
            | (LengthMod::L, Some(ScanArg::Double(_)))
            | (LengthMod::BigL, Some(ScanArg::LongDouble(_))) => true,
            _ => false,
        };
        if !fits {
            return Err(errno::EINVAL);
        }
        let value = match self.scan_float(spec, &mut left)? {
            Field::Value(v) => v,
            other => return Ok(other.into()),
        };
        match target {
            Some(ScanArg::Float(v)) => **v = value as f32,
            Some(ScanArg::Double(v) | ScanArg::LongDouble(v)) => **v = value,
            _ => return Ok(Flow::Skipped),
        }
        Ok(Flow::Assigned)
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    fn convert_text(
        &mut self,
        spec: &FormatSpec<'_>,
        width: Option<usize>,
        target: Option<&mut ScanArg<'_>>,
    ) -> Result<Flow, i32> {
        let assigned = target.is_some();
        let mut dest = TextDest::of(spec, target)?;
        let is_char = spec.kind == ConvKind::Char;
        let default_width = if is_char { 1 } else { usize::MAX };
        let limit = width.unwrap_or(default_width).min(dest.room(!is_char));
        if limit == 0 {
            return Err(errno::EINVAL);
        }

        if spec.kind == ConvKind::Str {
            self.skip_space()?;
        }
        let mut n = 0;
        while n < limit {
            let Some(b) = self.getc() else { break };
            let member = match spec.kind {
                ConvKind::Char => true,
                ConvKind::Scanset => spec.scanset.is_some_and(|set| set.accepts(b)),
                _ => !self.is_space(b),
            };
            if !member {
                self.ungetc(b)?;
                break;
            }
            dest.put(n, b)?;
            n += 1;
        }

        if is_char && n < limit {
            return Ok(Flow::InputFailure);
        }
        if n == 0 {
            return Ok(if self.eof { Flow::InputFailure } else { Flow::Stop });
        }
        if !is_char {
            dest.terminate(n);
        }
        Ok(if assigned { Flow::Assigned } else { Flow::Skipped })
    }

    // -----------------------------------------------------------------------
    // Directives
    // -----------------------------------------------------------------------

    fn convert(
        &mut self,
        spec: &FormatSpec<'_>,
        target: Option<&mut ScanArg<'_>>,
    ) -> Result<Flow, i32> {
        let width = match spec.width {
            Width::Fixed(n) if n > 0 => Some(n),
            _ => None,
        };
        let left = width.unwrap_or(usize::MAX);
        match spec.kind {
            ConvKind::Integer | ConvKind::Pointer => self.convert_integer(spec, left, target),
            ConvKind::Float(_) => self.convert_float(spec, left, target),
            ConvKind::Char | ConvKind::Str | ConvKind::Scanset => {
                self.convert_text(spec, width, target)
            }
            ConvKind::Count => {
                if let Some(target) = target {
                    target.int_bits(spec.length).ok_or(errno::EINVAL)?;
                    target.put_int(self.consumed as u64);
                }
                Ok(Flow::Continue)
            }
            ConvKind::Percent => {
                self.skip_space()?;
                match self.getc() {
                    Some(b'%') => Ok(Flow::Continue),
                    Some(b) => {
                        self.ungetc(b)?;
                        Ok(Flow::Stop)
                    }
                    None => Ok(Flow::InputFailure),
                }
            }
        }
    }

    /// Runs `fmt`. `Ok(None)` is an input failure before any conversion.
    fn run(&mut self, fmt: &[u8], targets: &mut Targets<'_, '_>) -> Result<Option<usize>, i32> {
        let mut assigned = 0;
        let mut converted = false;
        let mut input_failure = false;
        let mut pos = 0;

        while pos < fmt.len() {
            let b = fmt[pos];
            if self.is_space(b) {
                while pos < fmt.len() && self.is_space(fmt[pos]) {
                    pos += 1;
                }
                self.skip_space()?;
                continue;
            }
            pos += 1;
            if b != b'%' {
                match self.getc() {
                    Some(c) if c == b => continue,
                    Some(c) => {
                        self.ungetc(c)?;
                        break;
                    }
                    None => {
                        input_failure = true;
                        break;
                    }
                }
            }

            let suppressed = fmt.get(pos) == Some(&b'*');
            if suppressed {
                pos += 1;
            }
            let Some((spec, consumed)) = parse_format_spec(&fmt[pos..], Dialect::Scanf) else {
                break;
            };
            pos += consumed;

            let target = if suppressed || !spec.takes_arg() {
                None
            } else {
                Some(targets.next()?)
            };
            match self.convert(&spec, target)? {
                Flow::Assigned => {
                    assigned += 1;
                    converted = true;
                }
                Flow::Skipped => converted = true,
                Flow::Continue => {}
                Flow::Stop => break,
                Flow::InputFailure => {
                    input_failure = true;
                    break;
                }
            }
        }

        if input_failure && !converted {
            return match self.failure {
                Some(code) => Err(code),
                None => Ok(None),
            };
        }
        Ok(Some(assigned))
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Scans `src` under the calling thread's locale.
///
/// Returns the number of assignments, or `None` when input ended before the
/// first conversion completed.
pub fn scan_from<S: Source>(
    src: S,
    fmt: &[u8],
    args: &mut [ScanArg<'_>],
) -> Result<Option<usize>, i32> {
    scan_from_l(src, &locale::current_locale(), fmt, args)
}

/// [`scan_from`] with an explicit locale.
pub fn scan_from_l<S: Source>(
    src: S,
    locale: &Locale,
    fmt: &[u8],
    args: &mut [ScanArg<'_>],
) -> Result<Option<usize>, i32> {
    let fmt = c_str(fmt);
    let mut targets = Targets::for_format(fmt, args)?;
    Scanner::new(src, locale).run(fmt, &mut targets)
}

fn to_count(result: Result<Option<usize>, i32>) -> i32 {
    match result {
        Ok(Some(n)) => i32::try_from(n).unwrap_or(i32::MAX),
        Ok(None) => EOF,
        Err(code) => {
            errno::set_errno(code);
            EOF
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// `scanf`: reads standard input.
pub fn scanf(fmt: &[u8], args: &mut [ScanArg<'_>]) -> i32 {
    fscanf(&stdin(), fmt, args)
}

/// `vscanf`.
pub fn vscanf(fmt: &[u8], ap: &mut [ScanArg<'_>]) -> i32 {
    scanf(fmt, ap)
}

/// `fscanf`: reads `stream` under its lock.
pub fn fscanf(stream: &Stream, fmt: &[u8], args: &mut [ScanArg<'_>]) -> i32 {
    let guard = stream.lock();
    fscanf_unlocked(&guard, fmt, args)
}

/// `vfscanf`.
pub fn vfscanf(stream: &Stream, fmt: &[u8], ap: &mut [ScanArg<'_>]) -> i32 {
    fscanf(stream, fmt, ap)
}

/// `fscanf` on a stream the caller already holds locked.
pub fn fscanf_unlocked(guard: &StreamGuard<'_>, fmt: &[u8], args: &mut [ScanArg<'_>]) -> i32 {
    to_count(
        guard
            .orient(CharWidth::Narrow)
            .and_then(|()| scan_from(StreamSource::new(guard), fmt, args)),
    )
}

/// `sscanf`: reads the NUL-terminated `input`.
pub fn sscanf(input: &[u8], fmt: &[u8], args: &mut [ScanArg<'_>]) -> i32 {
    to_count(scan_from(StrSource::new(input), fmt, args))
}

/// `vsscanf`.
pub fn vsscanf(input: &[u8], fmt: &[u8], ap: &mut [ScanArg<'_>]) -> i32 {
    sscanf(input, fmt, ap)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
