//! Digit generation for `%f`, `%e`, `%g` and `%a`.
//!
//! Every function renders the magnitude of a finite value (no sign) with
//! `.` as radix character; the caller substitutes the locale's decimal point,
//! groups digits and pads.

/// Digits of an f64 past this many fraction places are always zero: the
/// smallest subnormal has 1074 of them, and no finite value needs more
/// significant digits than that either.
const MAX_EXACT: usize = 1100;

/// One rendered magnitude. `zeros` are owed between `head` and `exp`; they
/// are kept as a count so a huge precision never has to be materialized.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Digits {
    pub(crate) head: String,
    pub(crate) zeros: usize,
    pub(crate) exp: String,
}

/// `%f`: fixed-point with `precision` fraction digits.
pub(crate) fn format_f(value: f64, precision: usize, alt_form: bool) -> Digits {
    let shown = precision.min(MAX_EXACT);
    let mut head = format!("{value:.shown$}");
    if alt_form && precision == 0 {
        head.push('.');
    }
    Digits {
        head,
        zeros: precision - shown,
        exp: String::new(),
    }
}

/// `%e`: one integer digit, `precision` fraction digits, exponent of at
/// least two digits.
pub(crate) fn format_e(value: f64, precision: usize, uppercase: bool, alt_form: bool) -> Digits {
    let shown = precision.min(MAX_EXACT);
    let raw = format!("{value:.shown$e}");
    let (mantissa, exp) = split_exponent(&raw);
    let mut head = mantissa.to_owned();
    if alt_form && precision == 0 {
        head.push('.');
    }
    Digits {
        head,
        zeros: precision - shown,
        exp: exponent(exp, if uppercase { 'E' } else { 'e' }, 2),
    }
}

/// `%g`: `%e` or `%f` depending on the decimal exponent, trailing zeros
/// removed unless `alt_form`. Returns the digits and whether the fixed
/// style was chosen.
pub(crate) fn format_g(
    value: f64,
    precision: usize,
    uppercase: bool,
    alt_form: bool,
) -> (Digits, bool) {
    let p = precision.max(1);
    let exp = if value == 0.0 {
        0
    } else {
        let rounded = format!("{value:.prec$e}", prec = (p - 1).min(MAX_EXACT));
        i64::from(split_exponent(&rounded).1)
    };

    let significant = i64::try_from(p).unwrap_or(i64::MAX);
    let fixed = exp >= -4 && exp < significant;
    let mut digits = if fixed {
        let frac = usize::try_from(significant.saturating_sub(1).saturating_sub(exp)).unwrap_or(0);
        format_f(value, frac, alt_form)
    } else {
        format_e(value, p - 1, uppercase, alt_form)
    };

    if !alt_form {
        digits.zeros = 0;
        strip_trailing_zeros(&mut digits.head);
    }
    (digits, fixed)
}

/// `%a`: hexadecimal mantissa with a binary exponent.
///
/// Without a precision the shortest exact form is printed; with one, the
/// mantissa is rounded half to even.
pub(crate) fn format_a(
    value: f64,
    precision: Option<usize>,
    uppercase: bool,
    alt_form: bool,
) -> Digits {
    const FRAC_BITS: u32 = 52;
    const FRAC_DIGITS: usize = 13;

    let bits = value.to_bits();
    let biased = ((bits >> FRAC_BITS) & 0x7ff) as i32;
    let frac = bits & ((1u64 << FRAC_BITS) - 1);
    let (lead, exp) = match (biased, frac) {
        (0, 0) => (0u64, 0),
        (0, _) => (0, -1022),
        _ => (1, biased - 1023),
    };

    let mut mantissa = (lead << FRAC_BITS) | frac;
    let digits = match precision {
        Some(p) if p < FRAC_DIGITS => {
            let shift = (FRAC_DIGITS - p) as u32 * 4;
            let rem = mantissa & ((1u64 << shift) - 1);
            let half = 1u64 << (shift - 1);
            mantissa >>= shift;
            if rem > half || (rem == half && mantissa & 1 == 1) {
                mantissa += 1;
            }
            p
        }
        Some(p) => p,
        None => {
            let mut n = FRAC_DIGITS;
            while n > 0 && mantissa & 0xf == 0 {
                mantissa >>= 4;
                n -= 1;
            }
            n
        }
    };

    let kept = digits.min(FRAC_DIGITS);
    let lead_digit = mantissa >> (kept * 4);
    let frac_part = mantissa & ((1u64 << (kept * 4)) - 1);

    let mut head = String::with_capacity(kept + 4);
    head.push_str(if uppercase { "0X" } else { "0x" });
    head.push_str(&format!("{lead_digit:x}"));
    if digits > 0 || alt_form {
        head.push('.');
    }
    if kept > 0 {
        head.push_str(&format!("{frac_part:0kept$x}"));
    }
    if uppercase {
        head.make_ascii_uppercase();
    }
    Digits {
        head,
        zeros: digits - kept,
        exp: exponent(exp, if uppercase { 'P' } else { 'p' }, 1),
    }
}

/// Splits Rust's `1.5e-3` form into mantissa and exponent.
fn split_exponent(raw: &str) -> (&str, i32) {
    match raw.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (raw, 0),
    }
}

fn exponent(exp: i32, marker: char, min_digits: usize) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{marker}{sign}{:0min_digits$}", exp.unsigned_abs())
}

/// Remove trailing zeros after the decimal point.
fn strip_trailing_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}
