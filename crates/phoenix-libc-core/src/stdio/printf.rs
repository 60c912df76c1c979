//! printf formatting engine.
//!
//! Walks a format string, renders each directive with its typed argument and
//! streams the result to a [`Sink`]. Every entry point (`printf`, `fprintf`,
//! `dprintf`, `sprintf`, `snprintf`, `asprintf`, `fwprintf` and their `v`
//! forms) is a thin wrapper choosing the sink.

use std::io::Write;

use super::args::{ArgCursor, ArgKind, ArgSource, FormatArg};
use super::file::{CharWidth, Stream, StreamGuard};
use super::float::{format_a, format_e, format_f, format_g};
use super::sink::{BoundedBuf, Counted, FdSink, Sink, StreamSink, UnboundedBuf, WideStreamSink};
use super::spec::{
    ConvKind, Dialect, FloatStyle, FormatSpec, LengthMod, Precision, Radix, Width,
    parse_format_spec,
};
use super::table::stdout;
use crate::errno;
use crate::locale::{self, CHAR_MAX, Locale, NumericInfo};
use crate::string::c_str;
use crate::wchar::encode_wide;

/// Rendered for a null `%s` argument.
const NULL_STR: &[u8] = b"(null)";
/// Rendered for a null `%p` argument.
const NULL_PTR: &[u8] = b"(nil)";

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Formats `fmt` with `args` into `sink` under the calling thread's locale.
///
/// Returns the number of bytes produced (for a truncating sink, the number
/// that would have been produced). Fails with `EINVAL` on an argument list
/// that does not match the format and `EOVERFLOW` past `INT_MAX` bytes.
pub fn format_into<S: Sink>(sink: S, fmt: &[u8], args: &[FormatArg<'_>]) -> Result<usize, i32> {
    format_into_l(sink, &locale::current_locale(), fmt, args)
}

/// [`format_into`] under an explicit locale.
pub fn format_into_l<S: Sink>(
    sink: S,
    locale: &Locale,
    fmt: &[u8],
    args: &[FormatArg<'_>],
) -> Result<usize, i32> {
    let fmt = c_str(fmt);
    let mut source = ArgSource::for_format(fmt, args)?;
    let mut out = Counted::new(sink);
    let mut pos = 0;

    while pos < fmt.len() {
        let literal_end = fmt[pos..]
            .iter()
            .position(|&b| b == b'%')
            .map_or(fmt.len(), |i| pos + i);
        if literal_end > pos {
            out.write_bytes(&fmt[pos..literal_end])?;
        }
        if literal_end == fmt.len() {
            break;
        }
        pos = literal_end + 1;

        match parse_format_spec(&fmt[pos..], Dialect::Printf) {
            Some((spec, consumed)) => {
                pos += consumed;
                let spec = resolve_stars(spec, &mut source)?;
                convert(&mut out, &spec, &mut source, locale)?;
            }
            // Malformed directive: the '%' is emitted as text.
            None => out.write_bytes(b"%")?,
        }
    }

    out.finish()?;
    Ok(out.count())
}

/// Replaces `*` widths and precisions with the values they read.
fn resolve_stars<'f>(
    mut spec: FormatSpec<'f>,
    source: &mut ArgSource<'_, '_>,
) -> Result<FormatSpec<'f>, i32> {
    if let Width::FromArg(_) = spec.width {
        let width = int_value(source.next(ArgKind::Int)?) as i32;
        if width < 0 {
            spec.flags.left_justify = true;
            spec.flags.zero_pad = false;
        }
        spec.width = Width::Fixed(width.unsigned_abs() as usize);
    }
    if let Precision::FromArg(_) = spec.precision {
        let precision = int_value(source.next(ArgKind::Int)?) as i32;
        spec.precision = match usize::try_from(precision) {
            Ok(p) => Precision::Fixed(p),
            Err(_) => Precision::None,
        };
    }
    Ok(spec)
}

fn convert<S: Sink>(
    out: &mut Counted<S>,
    spec: &FormatSpec<'_>,
    source: &mut ArgSource<'_, '_>,
    locale: &Locale,
) -> Result<(), i32> {
    match spec.kind {
        ConvKind::Percent => out.write_bytes(b"%"),
        ConvKind::Integer => {
            let arg = source.next(ArgKind::Int)?;
            if spec.signed {
                format_signed(signed_value(arg, spec.length), spec, locale, out)
            } else {
                format_unsigned(unsigned_value(arg, spec.length), spec, locale, out)
            }
        }
        ConvKind::Float(_) => match source.next(ArgKind::Float)? {
            FormatArg::Float(value) => format_float(value, spec, locale, out),
            _ => Err(errno::EINVAL),
        },
        ConvKind::Char => {
            let value = int_value(source.next(ArgKind::Int)?);
            let byte = if spec.is_wide() {
                encode_wide(value as u32)?
            } else {
                value as u8
            };
            format_char(byte, spec, out)
        }
        ConvKind::Str if spec.is_wide() => match source.next(ArgKind::WideStr)? {
            FormatArg::WideStr(Some(ws)) => format_wide_str(ws, spec, out),
            FormatArg::WideStr(None) => format_str(NULL_STR, spec, out),
            _ => Err(errno::EINVAL),
        },
        ConvKind::Str => match source.next(ArgKind::Str)? {
            FormatArg::Str(s) => format_str(s.map_or(NULL_STR, c_str), spec, out),
            _ => Err(errno::EINVAL),
        },
        ConvKind::Pointer => match source.next(ArgKind::Pointer)? {
            FormatArg::Pointer(addr) => format_pointer(addr, spec, out),
            _ => Err(errno::EINVAL),
        },
        ConvKind::Count => match source.next(ArgKind::Count)? {
            FormatArg::Count(cell) => {
                cell.set(truncate_to(out.count() as i64, spec.length));
                Ok(())
            }
            _ => Err(errno::EINVAL),
        },
        ConvKind::Scanset => Err(errno::EINVAL),
    }
}

fn int_value(arg: FormatArg<'_>) -> i64 {
    match arg {
        FormatArg::Int(v) => v,
        FormatArg::Uint(v) => v as i64,
        _ => 0,
    }
}

/// Narrows a value the way a C argument of the length class would be.
fn truncate_to(value: i64, length: LengthMod) -> i64 {
    match length {
        LengthMod::Hh => i64::from(value as i8),
        LengthMod::H => i64::from(value as i16),
        LengthMod::None => i64::from(value as i32),
        _ => value,
    }
}

fn signed_value(arg: FormatArg<'_>, length: LengthMod) -> i64 {
    truncate_to(int_value(arg), length)
}

fn unsigned_value(arg: FormatArg<'_>, length: LengthMod) -> u64 {
    let raw = int_value(arg) as u64;
    match length {
        LengthMod::Hh => u64::from(raw as u8),
        LengthMod::H => u64::from(raw as u16),
        LengthMod::None => u64::from(raw as u32),
        _ => raw,
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Pieces of one padded field, in output order.
#[derive(Default)]
struct Field<'b> {
    sign: Option<u8>,
    prefix: &'b [u8],
    /// Zeros between the prefix and the body (integer precision).
    fill: usize,
    body: &'b [u8],
    /// Zeros after the body (float precision past the exact digits).
    trail: usize,
    suffix: &'b [u8],
}

impl Field<'_> {
    fn len(&self) -> usize {
        usize::from(self.sign.is_some())
            .saturating_add(self.prefix.len())
            .saturating_add(self.fill)
            .saturating_add(self.body.len())
            .saturating_add(self.trail)
            .saturating_add(self.suffix.len())
    }
}

/// Writes `field` padded to the spec's width. Zero padding goes between
/// the prefix and the body.
fn emit_field<S: Sink + ?Sized>(
    out: &mut S,
    spec: &FormatSpec<'_>,
    field: &Field<'_>,
    zero_pad: bool,
) -> Result<(), i32> {
    let content = field.len();
    let pad_total = resolve_width(spec).saturating_sub(content);
    out.reserve(content.saturating_add(pad_total))?;

    let left = spec.flags.left_justify;
    if !left && !zero_pad {
        pad(out, b' ', pad_total)?;
    }
    if let Some(s) = field.sign {
        out.write_bytes(&[s])?;
    }
    out.write_bytes(field.prefix)?;
    if !left && zero_pad {
        pad(out, b'0', pad_total)?;
    }
    pad(out, b'0', field.fill)?;
    out.write_bytes(field.body)?;
    pad(out, b'0', field.trail)?;
    out.write_bytes(field.suffix)?;
    if left {
        pad(out, b' ', pad_total)?;
    }
    Ok(())
}

fn sign_of(negative: bool, spec: &FormatSpec<'_>) -> Option<u8> {
    if negative {
        Some(b'-')
    } else if spec.flags.force_sign {
        Some(b'+')
    } else if spec.flags.space_sign {
        Some(b' ')
    } else {
        None
    }
}

/// Render a signed integer according to `spec`.
pub fn format_signed<S: Sink + ?Sized>(
    value: i64,
    spec: &FormatSpec<'_>,
    locale: &Locale,
    out: &mut S,
) -> Result<(), i32> {
    emit_integer(
        sign_of(value < 0, spec),
        value.unsigned_abs(),
        spec,
        locale,
        out,
    )
}

/// Render an unsigned integer according to `spec`. Sign flags are ignored.
pub fn format_unsigned<S: Sink + ?Sized>(
    value: u64,
    spec: &FormatSpec<'_>,
    locale: &Locale,
    out: &mut S,
) -> Result<(), i32> {
    emit_integer(None, value, spec, locale, out)
}

fn emit_integer<S: Sink + ?Sized>(
    sign: Option<u8>,
    magnitude: u64,
    spec: &FormatSpec<'_>,
    locale: &Locale,
    out: &mut S,
) -> Result<(), i32> {
    let mut digits = [0u8; 64];
    let count = render_digits(magnitude, u64::from(spec.radix.base()), spec.uppercase, &mut digits);
    let precision = match spec.precision {
        Precision::Fixed(p) => Some(p),
        _ => None,
    };

    // Precision 0 with value 0 produces no digits.
    let digit_slice: &[u8] = if magnitude == 0 && precision == Some(0) {
        b""
    } else {
        &digits[64 - count..]
    };
    let fill = precision.map_or(0, |p| p.saturating_sub(digit_slice.len()));

    let numeric = locale.numeric();
    let grouped = (spec.flags.group && spec.radix.base() == 10 && !numeric.thousands_sep.is_empty())
        .then(|| group_digits(digit_slice, numeric.grouping, numeric.thousands_sep));
    let body = grouped.as_deref().unwrap_or(digit_slice);

    let prefix: &[u8] = match (spec.flags.alt_form, spec.radix) {
        (true, Radix::Octal) if fill == 0 && body.first() != Some(&b'0') => b"0",
        (true, Radix::Hex) if magnitude != 0 => {
            if spec.uppercase {
                b"0X"
            } else {
                b"0x"
            }
        }
        _ => b"",
    };

    let field = Field {
        sign,
        prefix,
        fill,
        body,
        ..Field::default()
    };
    // An explicit precision disables the '0' flag.
    emit_field(out, spec, &field, spec.flags.zero_pad && precision.is_none())
}

/// Render a floating-point value according to `spec`.
///
/// Handles `%f`, `%e`, `%g` and `%a` in both cases. The radix character and
/// `'` grouping come from the locale's `LC_NUMERIC`.
pub fn format_float<S: Sink + ?Sized>(
    value: f64,
    spec: &FormatSpec<'_>,
    locale: &Locale,
    out: &mut S,
) -> Result<(), i32> {
    let sign = sign_of(value.is_sign_negative(), spec);

    if !value.is_finite() {
        let text: &[u8] = match (value.is_nan(), spec.uppercase) {
            (true, false) => b"nan",
            (true, true) => b"NAN",
            (false, false) => b"inf",
            (false, true) => b"INF",
        };
        let field = Field {
            sign,
            body: text,
            ..Field::default()
        };
        return emit_field(out, spec, &field, false);
    }

    let style = match spec.kind {
        ConvKind::Float(style) => style,
        _ => FloatStyle::Fixed,
    };
    let precision = match spec.precision {
        Precision::Fixed(p) => Some(p),
        _ => None,
    };
    let p = precision.unwrap_or(6);
    let abs = value.abs();
    let alt = spec.flags.alt_form;
    let upper = spec.uppercase;

    let (digits, fixed) = match style {
        FloatStyle::Fixed => (format_f(abs, p, alt), true),
        FloatStyle::Scientific => (format_e(abs, p, upper, alt), false),
        FloatStyle::Flexible => format_g(abs, p, upper, alt),
        FloatStyle::Hex => (format_a(abs, precision, upper, alt), false),
    };
    let body = localize(digits.head.as_bytes(), fixed && spec.flags.group, locale.numeric());

    let (prefix, rest) = if style == FloatStyle::Hex {
        body.split_at(2)
    } else {
        body.split_at(0)
    };
    let field = Field {
        sign,
        prefix,
        fill: 0,
        body: rest,
        trail: digits.zeros,
        suffix: digits.exp.as_bytes(),
    };
    emit_field(out, spec, &field, spec.flags.zero_pad)
}

/// Swaps in the locale decimal point and optionally groups the integer part.
fn localize(body: &[u8], group: bool, numeric: &NumericInfo) -> Vec<u8> {
    let int_end = body
        .iter()
        .position(|b| !b.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let (int_part, rest) = body.split_at(int_end);

    let mut out = Vec::with_capacity(body.len() + 8);
    if group && !numeric.thousands_sep.is_empty() {
        out.extend_from_slice(&group_digits(int_part, numeric.grouping, numeric.thousands_sep));
    } else {
        out.extend_from_slice(int_part);
    }
    match rest.split_first() {
        Some((b'.', frac)) => {
            let point = if numeric.decimal_point.is_empty() {
                b"."
            } else {
                numeric.decimal_point
            };
            out.extend_from_slice(point);
            out.extend_from_slice(frac);
        }
        _ => out.extend_from_slice(rest),
    }
    out
}

/// Inserts `sep` between digit groups counted from the right.
///
/// `grouping` lists group sizes from the right; its last entry repeats, and
/// a size of 0 or `CHAR_MAX` ends grouping.
pub(crate) fn group_digits(digits: &[u8], grouping: &[u8], sep: &[u8]) -> Vec<u8> {
    let mut cuts = Vec::new();
    let mut end = digits.len();
    let mut size = 0usize;
    let mut sizes = grouping.iter();
    loop {
        if let Some(&g) = sizes.next() {
            if g == 0 || g >= CHAR_MAX as u8 {
                break;
            }
            size = usize::from(g);
        }
        if size == 0 || end <= size {
            break;
        }
        end -= size;
        cuts.push(end);
    }

    let mut out = Vec::with_capacity(digits.len() + cuts.len() * sep.len());
    let mut start = 0;
    for &cut in cuts.iter().rev() {
        out.extend_from_slice(&digits[start..cut]);
        out.extend_from_slice(sep);
        start = cut;
    }
    out.extend_from_slice(&digits[start..]);
    out
}

/// Render a string according to `spec`.
///
/// `s` is the raw byte content (not NUL-terminated). Precision truncates.
pub fn format_str<S: Sink + ?Sized>(s: &[u8], spec: &FormatSpec<'_>, out: &mut S) -> Result<(), i32> {
    let max_len = match spec.precision {
        Precision::Fixed(p) => p,
        _ => s.len(),
    };
    let field = Field {
        body: &s[..s.len().min(max_len)],
        ..Field::default()
    };
    emit_field(out, spec, &field, false)
}

/// `%ls`: wide characters up to the terminator, each narrowed to one byte.
fn format_wide_str<S: Sink + ?Sized>(
    ws: &[u32],
    spec: &FormatSpec<'_>,
    out: &mut S,
) -> Result<(), i32> {
    let limit = match spec.precision {
        Precision::Fixed(p) => p,
        _ => usize::MAX,
    };
    let narrow = ws
        .iter()
        .take_while(|&&wc| wc != 0)
        .take(limit)
        .map(|&wc| encode_wide(wc))
        .collect::<Result<Vec<u8>, i32>>()?;
    format_str(&narrow, spec, out)
}

/// Render a character according to `spec`.
pub fn format_char<S: Sink + ?Sized>(c: u8, spec: &FormatSpec<'_>, out: &mut S) -> Result<(), i32> {
    let field = Field {
        body: &[c],
        ..Field::default()
    };
    emit_field(out, spec, &field, false)
}

/// Render a pointer as `0x...` hex, or `(nil)`.
pub fn format_pointer<S: Sink + ?Sized>(
    addr: usize,
    spec: &FormatSpec<'_>,
    out: &mut S,
) -> Result<(), i32> {
    let mut digits = [0u8; 64];
    let field = if addr == 0 {
        Field {
            body: NULL_PTR,
            ..Field::default()
        }
    } else {
        let count = render_digits(addr as u64, 16, false, &mut digits);
        Field {
            prefix: b"0x",
            body: &digits[64 - count..],
            ..Field::default()
        }
    };
    emit_field(out, spec, &field, false)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn resolve_width(spec: &FormatSpec<'_>) -> usize {
    match spec.width {
        Width::Fixed(w) => w,
        _ => 0,
    }
}

/// Render `value` in the given `base` into the END of `buf`.
/// Returns the number of digits written. Digits are placed right-aligned.
fn render_digits(mut value: u64, base: u64, uppercase: bool, buf: &mut [u8; 64]) -> usize {
    if value == 0 {
        buf[63] = b'0';
        return 1;
    }
    let alpha = if uppercase { b'A' } else { b'a' };
    let mut pos = 64;
    while value > 0 {
        pos -= 1;
        let digit = (value % base) as u8;
        buf[pos] = if digit < 10 {
            b'0' + digit
        } else {
            alpha + (digit - 10)
        };
        value /= base;
    }
    64 - pos
}

/// Streams `count` copies of `byte` in fixed-size chunks.
fn pad<S: Sink + ?Sized>(out: &mut S, byte: u8, count: usize) -> Result<(), i32> {
    const CHUNK: usize = 256;
    let block = [byte; CHUNK];
    let mut left = count;
    while left > 0 {
        let n = left.min(CHUNK);
        out.write_bytes(&block[..n])?;
        left -= n;
    }
    Ok(())
}

fn to_int(result: Result<usize, i32>) -> i32 {
    errno::report(
        result.and_then(|n| i32::try_from(n).map_err(|_| errno::EOVERFLOW)),
        -1,
    )
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// `printf`: formats to standard output.
pub fn printf(fmt: &[u8], args: &[FormatArg<'_>]) -> i32 {
    fprintf(&stdout(), fmt, args)
}

/// `vprintf`.
pub fn vprintf(fmt: &[u8], ap: ArgCursor<'_, '_>) -> i32 {
    printf(fmt, ap.remaining())
}

/// `fprintf`: formats to `stream` under its lock.
pub fn fprintf(stream: &Stream, fmt: &[u8], args: &[FormatArg<'_>]) -> i32 {
    let guard = stream.lock();
    fprintf_unlocked(&guard, fmt, args)
}

/// `vfprintf`.
pub fn vfprintf(stream: &Stream, fmt: &[u8], ap: ArgCursor<'_, '_>) -> i32 {
    fprintf(stream, fmt, ap.remaining())
}

/// `fprintf` on a stream the caller already holds locked.
pub fn fprintf_unlocked(guard: &StreamGuard<'_>, fmt: &[u8], args: &[FormatArg<'_>]) -> i32 {
    to_int(
        guard
            .orient(CharWidth::Narrow)
            .and_then(|()| format_into(StreamSink::new(guard), fmt, args)),
    )
}

/// `dprintf`: unbuffered output to a descriptor-like writer.
pub fn dprintf<W: Write>(fd: W, fmt: &[u8], args: &[FormatArg<'_>]) -> i32 {
    to_int(format_into(FdSink::new(fd), fmt, args))
}

/// `vdprintf`.
pub fn vdprintf<W: Write>(fd: W, fmt: &[u8], ap: ArgCursor<'_, '_>) -> i32 {
    dprintf(fd, fmt, ap.remaining())
}

/// `sprintf`: replaces the contents of `dest` with the NUL-terminated
/// output. Returns the length excluding the NUL.
pub fn sprintf(dest: &mut Vec<u8>, fmt: &[u8], args: &[FormatArg<'_>]) -> i32 {
    dest.clear();
    to_int(format_into(UnboundedBuf::new(dest), fmt, args))
}

/// `vsprintf`.
pub fn vsprintf(dest: &mut Vec<u8>, fmt: &[u8], ap: ArgCursor<'_, '_>) -> i32 {
    sprintf(dest, fmt, ap.remaining())
}

/// `snprintf`: writes at most `dest.len() - 1` bytes plus a NUL and returns
/// the length the full output would have had.
pub fn snprintf(dest: &mut [u8], fmt: &[u8], args: &[FormatArg<'_>]) -> i32 {
    to_int(format_into(BoundedBuf::new(dest), fmt, args))
}

/// `vsnprintf`.
pub fn vsnprintf(dest: &mut [u8], fmt: &[u8], ap: ArgCursor<'_, '_>) -> i32 {
    snprintf(dest, fmt, ap.remaining())
}

/// `asprintf`: the output in a freshly allocated buffer (without NUL).
pub fn asprintf(fmt: &[u8], args: &[FormatArg<'_>]) -> Result<Vec<u8>, i32> {
    let mut buf = Vec::new();
    format_into(UnboundedBuf::new(&mut buf), fmt, args)?;
    buf.pop();
    Ok(buf)
}

/// `vasprintf`.
pub fn vasprintf(fmt: &[u8], ap: ArgCursor<'_, '_>) -> Result<Vec<u8>, i32> {
    asprintf(fmt, ap.remaining())
}

/// `fwprintf`: formats a wide format string to a wide-oriented stream.
///
/// Every character of the format must be representable in one byte;
/// others fail with `EILSEQ`.
pub fn fwprintf(stream: &Stream, fmt: &[u32], args: &[FormatArg<'_>]) -> i32 {
    let guard = stream.lock();
    let narrow = fmt
        .iter()
        .take_while(|&&wc| wc != 0)
        .map(|&wc| encode_wide(wc))
        .collect::<Result<Vec<u8>, i32>>();
    to_int(narrow.and_then(|fmt| {
        guard.orient(CharWidth::Wide)?;
        format_into(WideStreamSink::new(&guard), &fmt, args)
    }))
}

/// `vfwprintf`.
pub fn vfwprintf(stream: &Stream, fmt: &[u32], ap: ArgCursor<'_, '_>) -> i32 {
    fwprintf(stream, fmt, ap.remaining())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::locale::{LC_ALL_MASK, newlocale};

    fn render(fmt: &str, args: &[FormatArg<'_>]) -> String {
        let out = asprintf(fmt.as_bytes(), args).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn german() -> Locale {
        newlocale(LC_ALL_MASK, "de_DE", None).unwrap().resolve()
    }

    fn spec_for(directive: &str) -> FormatSpec<'_> {
        parse_format_spec(directive.as_bytes(), Dialect::Printf).unwrap().0
    }

    #[test]
    fn test_format_signed_basic() {
        let mut buf = Vec::new();
        format_signed(42, &spec_for("d"), &Locale::POSIX, &mut buf).unwrap();
        assert_eq!(buf, b"42");
    }

    #[test]
    fn test_format_signed_negative() {
        let mut buf = Vec::new();
        format_signed(-42, &spec_for("d"), &Locale::POSIX, &mut buf).unwrap();
        assert_eq!(buf, b"-42");
    }

    #[test]
    fn test_format_signed_width_pad() {
        assert_eq!(render("[%5d]", &[FormatArg::Int(42)]), "[   42]");
        assert_eq!(render("[%-5d]", &[FormatArg::Int(42)]), "[42   ]");
        assert_eq!(render("[%05d]", &[FormatArg::Int(-42)]), "[-0042]");
    }

    #[test]
    fn test_precision_overrides_zero_flag() {
        assert_eq!(render("[%08.3d]", &[FormatArg::Int(7)]), "[     007]");
    }

    #[test]
    fn test_precision_zero_int() {
        assert_eq!(render("[%.0d]", &[FormatArg::Int(0)]), "[]");
        assert_eq!(render("[%5.0d]", &[FormatArg::Int(0)]), "[     ]");
        assert_eq!(render("[%+.0d]", &[FormatArg::Int(0)]), "[+]");
    }

    #[test]
    fn test_force_sign() {
        assert_eq!(render("%+d %+d", &[FormatArg::Int(5), FormatArg::Int(-5)]), "+5 -5");
        assert_eq!(render("% d", &[FormatArg::Int(5)]), " 5");
        assert_eq!(render("%+u", &[FormatArg::Uint(5)]), "5");
    }

    #[test]
    fn test_i64_min() {
        assert_eq!(
            render("%lld", &[FormatArg::Int(i64::MIN)]),
            "-9223372036854775808"
        );
    }

    #[test]
    fn test_length_truncation() {
        assert_eq!(render("%hhd", &[FormatArg::Int(300)]), "44");
        assert_eq!(render("%hu", &[FormatArg::Int(-1)]), "65535");
        assert_eq!(render("%d", &[FormatArg::Int(1 << 32)]), "0");
        assert_eq!(render("%u", &[FormatArg::Int(-1)]), "4294967295");
        assert_eq!(render("%lu", &[FormatArg::Int(-1)]), "18446744073709551615");
    }

    #[test]
    fn test_format_unsigned_hex() {
        assert_eq!(render("%x", &[FormatArg::Uint(255)]), "ff");
        assert_eq!(render("%#X", &[FormatArg::Uint(255)]), "0XFF");
        assert_eq!(render("%#x", &[FormatArg::Uint(0)]), "0");
        assert_eq!(render("%#010x", &[FormatArg::Uint(255)]), "0x000000ff");
    }

    #[test]
    fn test_format_unsigned_octal() {
        assert_eq!(render("%o", &[FormatArg::Uint(8)]), "10");
        assert_eq!(render("%#o", &[FormatArg::Uint(8)]), "010");
        assert_eq!(render("%#o", &[FormatArg::Uint(0)]), "0");
        assert_eq!(render("%#.0o", &[FormatArg::Uint(0)]), "0");
        assert_eq!(render("%#.4o", &[FormatArg::Uint(8)]), "0010");
    }

    #[test]
    fn test_format_str_basic() {
        assert_eq!(render("[%s]", &[FormatArg::Str(Some(b"hello\0"))]), "[hello]");
        assert_eq!(render("[%7s]", &[FormatArg::Str(Some(b"abc"))]), "[    abc]");
        assert_eq!(render("[%-7s]", &[FormatArg::Str(Some(b"abc"))]), "[abc    ]");
    }

    #[test]
    fn test_format_str_precision_truncate() {
        assert_eq!(render("%.3s", &[FormatArg::Str(Some(b"abcdef\0"))]), "abc");
        assert_eq!(render("%.10s", &[FormatArg::Str(Some(b"ab\0zz"))]), "ab");
    }

    #[test]
    fn test_null_string_and_pointer() {
        assert_eq!(render("%s", &[FormatArg::Str(None)]), "(null)");
        assert_eq!(render("%.3s", &[FormatArg::Str(None)]), "(nu");
        assert_eq!(render("%p", &[FormatArg::Pointer(0)]), "(nil)");
        assert_eq!(render("%8p", &[FormatArg::Pointer(0)]), "   (nil)");
    }

    #[test]
    fn test_format_pointer_nonzero() {
        assert_eq!(render("%p", &[FormatArg::Pointer(0x1234)]), "0x1234");
        assert_eq!(render("%-8p|", &[FormatArg::Pointer(0xab)]), "0xab    |");
    }

    #[test]
    fn test_format_char() {
        assert_eq!(render("%c%c", &[FormatArg::Int(65), FormatArg::Int(0x142)]), "AB");
        assert_eq!(render("[%3c]", &[FormatArg::Int(b'x' as i64)]), "[  x]");
    }

    #[test]
    fn test_wide_char_and_string() {
        assert_eq!(render("%lc", &[FormatArg::Int(0x41)]), "A");
        let wide = [0x68, 0x69, 0, 0x7a];
        assert_eq!(render("%ls", &[FormatArg::WideStr(Some(&wide))]), "hi");
        assert_eq!(render("%.1ls", &[FormatArg::WideStr(Some(&wide))]), "h");
        assert_eq!(
            asprintf(b"%lc", &[FormatArg::Int(0x20AC)]),
            Err(errno::EILSEQ)
        );
    }

    #[test]
    fn test_format_float_basic() {
        assert_eq!(render("%f", &[FormatArg::Float(1.5)]), "1.500000");
        assert_eq!(render("%.2f", &[FormatArg::Float(-0.125)]), "-0.12");
        assert_eq!(render("%e", &[FormatArg::Float(1234.5)]), "1.234500e+03");
        assert_eq!(render("%g", &[FormatArg::Float(0.5)]), "0.5");
        assert_eq!(render("%G", &[FormatArg::Float(1e-10)]), "1E-10");
        assert_eq!(render("%a", &[FormatArg::Float(1.0)]), "0x1p+0");
        assert_eq!(render("%08.2f", &[FormatArg::Float(-3.25159)]), "-0003.25");
        assert_eq!(render("%+.1f", &[FormatArg::Float(2.0)]), "+2.0");
        assert_eq!(render("%#.0f", &[FormatArg::Float(2.0)]), "2.");
        assert_eq!(render("%f", &[FormatArg::Float(-0.0)]), "-0.000000");
    }

    #[test]
    fn test_format_float_nan_inf() {
        assert_eq!(render("%f", &[FormatArg::Float(f64::NAN)]), "nan");
        assert_eq!(render("%F", &[FormatArg::Float(f64::INFINITY)]), "INF");
        assert_eq!(render("%06f", &[FormatArg::Float(f64::NEG_INFINITY)]), "  -inf");
        assert_eq!(render("%+e", &[FormatArg::Float(f64::INFINITY)]), "+inf");
    }

    #[test]
    fn test_hex_float_zero_pads_after_prefix() {
        assert_eq!(render("%010a", &[FormatArg::Float(1.0)]), "0x00001p+0");
        assert_eq!(render("%-10a|", &[FormatArg::Float(-1.0)]), "-0x1p+0   |");
    }

    #[test]
    fn test_locale_decimal_point_and_grouping() {
        let de = german();
        let mut out = Vec::new();
        let args = [FormatArg::Float(1234567.891), FormatArg::Int(1234567)];
        format_into_l(&mut out, &de, b"%'.2f %'d %.1f", &[args[0], args[1], args[0]]).unwrap();
        assert_eq!(out, b"1.234.567,89 1.234.567 1234567,9");
    }

    #[test]
    fn test_grouping_ignored_in_c_locale() {
        assert_eq!(render("%'d", &[FormatArg::Int(1234567)]), "1234567");
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(b"1234567", &[3], b","), b"1,234,567");
        assert_eq!(group_digits(b"123", &[3], b","), b"123");
        assert_eq!(group_digits(b"1234567", &[3, 2], b","), b"12,34,567");
        assert_eq!(group_digits(b"1234567", &[3, CHAR_MAX as u8], b","), b"1234,567");
        assert_eq!(group_digits(b"1234", &[], b","), b"1234");
    }

    #[test]
    fn test_star_width_and_precision() {
        let args = [FormatArg::Int(6), FormatArg::Int(2), FormatArg::Float(3.25159)];
        assert_eq!(render("[%*.*f]", &args), "[  3.25]");
        let args = [FormatArg::Int(-4), FormatArg::Int(7)];
        assert_eq!(render("[%*d]", &args), "[7   ]");
        let args = [FormatArg::Int(-1), FormatArg::Str(Some(b"abc"))];
        assert_eq!(render("[%.*s]", &args), "[abc]");
    }

    #[test]
    fn test_positional_arguments() {
        let args = [FormatArg::Str(Some(b"world")), FormatArg::Str(Some(b"hello"))];
        assert_eq!(render("%2$s %1$s", &args), "hello world");
        let args = [FormatArg::Int(8), FormatArg::Int(42)];
        assert_eq!(render("[%2$*1$d]", &args), "[      42]");
    }

    #[test]
    fn test_count_conversion() {
        let n = Cell::new(-1);
        let h = Cell::new(-1);
        let args = [
            FormatArg::Str(Some(b"abc")),
            FormatArg::Count(&n),
            FormatArg::Count(&h),
        ];
        assert_eq!(render("%s%n!%hhn", &args), "abc!");
        assert_eq!(n.get(), 3);
        assert_eq!(h.get(), 4);
    }

    #[test]
    fn test_percent_and_malformed() {
        assert_eq!(render("100%%", &[]), "100%");
        assert_eq!(render("50%q", &[]), "50%q");
        assert_eq!(render("end%", &[]), "end%");
    }

    #[test]
    fn test_argument_mismatch_is_einval() {
        assert_eq!(asprintf(b"%d", &[FormatArg::Float(1.0)]), Err(errno::EINVAL));
        assert_eq!(asprintf(b"%d %d", &[FormatArg::Int(1)]), Err(errno::EINVAL));
        assert_eq!(asprintf(b"%1$d %3$d", &[FormatArg::Int(1)]), Err(errno::EINVAL));
    }

    #[test]
    fn test_snprintf_truncates_and_counts() {
        let mut buf = [0xAAu8; 6];
        let n = snprintf(&mut buf, b"%s-%d", &[FormatArg::Str(Some(b"abc")), FormatArg::Int(1234)]);
        assert_eq!(n, 8);
        assert_eq!(&buf, b"abc-1\0");

        let mut empty: [u8; 0] = [];
        assert_eq!(snprintf(&mut empty, b"hello", &[]), 5);
    }

    #[test]
    fn test_sprintf_replaces_contents() {
        let mut dest = b"stale".to_vec();
        assert_eq!(sprintf(&mut dest, b"%d", &[FormatArg::Int(9)]), 1);
        assert_eq!(dest, b"9\0");
    }

    #[test]
    fn test_width_past_int_max_overflows() {
        let mut buf = [0u8; 8];
        errno::set_errno(0);
        assert_eq!(snprintf(&mut buf, b"%2147483648d", &[FormatArg::Int(1)]), -1);
        assert_eq!(errno::get_errno(), errno::EOVERFLOW);
        assert_eq!(snprintf(&mut buf, b"%2147483647d", &[FormatArg::Int(1)]), i32::MAX);
    }

    #[test]
    fn test_float_precision_past_u16() {
        let mut buf = [0u8; 8];
        assert_eq!(snprintf(&mut buf, b"%.65536f", &[FormatArg::Float(1.0)]), 65538);
        assert_eq!(&buf, b"1.00000\0");

        let sci = render("%.70000e", &[FormatArg::Float(1.5)]);
        assert_eq!(sci.len(), 70006);
        assert!(sci.starts_with("1.5000"));
        assert!(sci.ends_with("000e+00"));

        let star = [FormatArg::Int(100_000), FormatArg::Float(0.25)];
        assert_eq!(render("%.*g", &star), "0.25");
        let alt = render("%#.*g", &[FormatArg::Int(100_000), FormatArg::Float(1.0)]);
        assert_eq!(alt.len(), 100_001);
        assert!(alt.bytes().skip(2).all(|b| b == b'0'));

        assert_eq!(render("%-12.66000a|", &[FormatArg::Float(1.0)]).len(), 66_000 + 8);
    }

    #[test]
    fn test_float_precision_past_int_max_overflows() {
        let mut buf = [0u8; 8];
        for fmt in [
            &b"%.2147483647f"[..],
            &b"%.2147483647e"[..],
            &b"%#.2147483647g"[..],
            &b"%.2147483647a"[..],
        ] {
            errno::set_errno(0);
            assert_eq!(snprintf(&mut buf, fmt, &[FormatArg::Float(1.0)]), -1);
            assert_eq!(errno::get_errno(), errno::EOVERFLOW);
        }
    }

    #[test]
    fn test_dprintf_writes_through() {
        let mut fd = Vec::new();
        assert_eq!(dprintf(&mut fd, b"%s=%u\n", &[FormatArg::Str(Some(b"k")), FormatArg::Uint(3)]), 4);
        assert_eq!(fd, b"k=3\n");
    }

    #[test]
    fn test_v_forms_start_at_cursor() {
        let args = [FormatArg::Int(1), FormatArg::Int(2)];
        let mut ap = ArgCursor::new(&args);
        ap.step(ArgKind::Int).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(vsnprintf(&mut buf, b"%d", ap), 1);
        assert_eq!(&buf[..2], b"2\0");
    }

    #[test]
    fn test_fprintf_to_buffered_stream() {
        let (stream, out) = Stream::memory(Vec::new(), b"w").unwrap();
        assert_eq!(fprintf(&stream, b"%s:%03d", &[FormatArg::Str(Some(b"id")), FormatArg::Int(7)]), 6);
        assert!(out.contents().is_empty());
        assert_eq!(stream.lock().flush_unlocked(), Ok(()));
        assert_eq!(out.contents(), b"id:007");
    }

    #[test]
    fn test_stream_width_latch() {
        let (stream, _) = Stream::memory(Vec::new(), b"w").unwrap();
        assert_eq!(fprintf(&stream, b"x", &[]), 1);
        errno::set_errno(0);
        let wide: Vec<u32> = "y".chars().map(u32::from).collect();
        assert_eq!(fwprintf(&stream, &wide, &[]), -1);
        assert_eq!(errno::get_errno(), errno::EINVAL);
        assert!(stream.lock().is_error());
    }

    #[test]
    fn test_fwprintf_orients_wide() {
        let (stream, out) = Stream::memory(Vec::new(), b"w").unwrap();
        let fmt: Vec<u32> = "n=%d".chars().map(u32::from).collect();
        assert_eq!(fwprintf(&stream, &fmt, &[FormatArg::Int(5)]), 3);
        assert_eq!(stream.lock().char_width(), CharWidth::Wide);
        assert_eq!(fprintf(&stream, b"z", &[]), -1);
        stream.lock().clear_err();
        stream.lock().flush_unlocked().unwrap();
        assert_eq!(out.contents(), b"n=5");
    }

    #[test]
    fn test_write_failure_latches_error_bit() {
        struct Broken;
        impl crate::stdio::file::StreamBackend for Broken {
            fn write(&mut self, _: &[u8]) -> Result<usize, i32> {
                Err(errno::EIO)
            }
        }
        let stream = Stream::open(Box::new(Broken), b"w").unwrap();
        stream.lock().set_buffering(crate::stdio::BufMode::None, 0).unwrap();
        errno::set_errno(0);
        assert_eq!(fprintf(&stream, b"%d", &[FormatArg::Int(1)]), -1);
        assert_eq!(errno::get_errno(), errno::EIO);
        assert!(stream.lock().is_error());
    }

    #[test]
    fn test_fprintf_unlocked_under_held_lock() {
        let (stream, out) = Stream::memory(Vec::new(), b"w").unwrap();
        let guard = stream.lock();
        assert_eq!(fprintf_unlocked(&guard, b"%c%c", &[FormatArg::Int(104), FormatArg::Int(105)]), 2);
        // The lock is recursive, so the locked entry point may nest.
        assert_eq!(fprintf(&stream, b"!", &[]), 1);
        guard.flush_unlocked().unwrap();
        drop(guard);
        assert_eq!(out.contents(), b"hi!");
    }
}
