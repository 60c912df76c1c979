//! Argument lists for the formatted I/O engines.
//!
//! C variadic arguments are modelled as a slice of typed values
//! ([`FormatArg`]) walked by an [`ArgCursor`]. Each fetch states the kind it
//! expects; a missing argument or a kind mismatch is `EINVAL` instead of
//! undefined behaviour.
//!
//! When a format uses `%N$` references the engines pre-scan it into an
//! [`ArgPlan`] (which slot every consumer reads) and, for output, an
//! [`ArgTable`] of cursors positioned at each slot.

use std::cell::Cell;

use super::spec::{ConvKind, Dialect, FormatSpec, Precision, Width, parse_format_spec};
use crate::errno;

/// One printf argument.
///
/// Strings are borrowed NUL-terminated byte (or `u32`) slices; `None` stands
/// for a null pointer. `%n` writes through the [`Cell`].
#[derive(Debug, Clone, Copy)]
pub enum FormatArg<'a> {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(Option<&'a [u8]>),
    WideStr(Option<&'a [u32]>),
    Pointer(usize),
    Count(&'a Cell<i64>),
}

/// Argument type a conversion reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Int,
    Float,
    Str,
    WideStr,
    Pointer,
    Count,
    /// A scanf destination; checked against the conversion when stored.
    Target,
}

impl ArgKind {
    /// Kind of the value a conversion consumes, or `None` for `%%`.
    pub fn of(spec: &FormatSpec<'_>, dialect: Dialect) -> Option<ArgKind> {
        if !spec.takes_arg() {
            return None;
        }
        if dialect == Dialect::Scanf {
            return Some(ArgKind::Target);
        }
        Some(match spec.kind {
            ConvKind::Integer | ConvKind::Char => ArgKind::Int,
            ConvKind::Float(_) => ArgKind::Float,
            ConvKind::Str if spec.is_wide() => ArgKind::WideStr,
            ConvKind::Str => ArgKind::Str,
            ConvKind::Pointer => ArgKind::Pointer,
            ConvKind::Count => ArgKind::Count,
            ConvKind::Scanset | ConvKind::Percent => return None,
        })
    }

    fn accepts(self, arg: &FormatArg<'_>) -> bool {
        matches!(
            (self, arg),
            (ArgKind::Int, FormatArg::Int(_) | FormatArg::Uint(_))
                | (ArgKind::Float, FormatArg::Float(_))
                | (ArgKind::Str, FormatArg::Str(_))
                | (ArgKind::WideStr, FormatArg::WideStr(_))
                | (ArgKind::Pointer, FormatArg::Pointer(_))
                | (ArgKind::Count, FormatArg::Count(_))
        )
    }
}

/// Read position in an argument slice (`va_list`).
#[derive(Debug, Clone, Copy)]
pub struct ArgCursor<'s, 'a> {
    args: &'s [FormatArg<'a>],
    index: usize,
}

impl<'s, 'a> ArgCursor<'s, 'a> {
    pub fn new(args: &'s [FormatArg<'a>]) -> Self {
        Self { args, index: 0 }
    }

    /// Index of the next argument.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Arguments not yet taken.
    pub fn remaining(&self) -> &'s [FormatArg<'a>] {
        &self.args[self.index..]
    }

    /// Takes the next argument, which must be of `kind`.
    pub fn next_arg(&mut self, kind: ArgKind) -> Result<FormatArg<'a>, i32> {
        let arg = *self.args.get(self.index).ok_or(errno::EINVAL)?;
        if !kind.accepts(&arg) {
            return Err(errno::EINVAL);
        }
        self.index += 1;
        Ok(arg)
    }

    /// Skips one argument of `kind`.
    pub fn step(&mut self, kind: ArgKind) -> Result<(), i32> {
        self.next_arg(kind).map(|_| ())
    }
}

/// Slot assignment for a format with `%N$` references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPlan {
    /// `kinds[n - 1]` is the kind of slot `n`.
    kinds: Vec<ArgKind>,
    /// Slot read by each consumer, in format order.
    slots: Vec<usize>,
}

/// One argument read while walking a format.
struct Consumer {
    position: usize,
    kind: ArgKind,
}

/// Consumers of one directive in the order the engines read them:
/// width, precision, then the converted value.
fn consumers_of(spec: &FormatSpec<'_>, dialect: Dialect, suppressed: bool) -> Vec<Consumer> {
    let mut out = Vec::new();
    if let Width::FromArg(position) = spec.width {
        out.push(Consumer {
            position,
            kind: ArgKind::Int,
        });
    }
    if let Precision::FromArg(position) = spec.precision {
        out.push(Consumer {
            position,
            kind: ArgKind::Int,
        });
    }
    if !suppressed {
        if let Some(kind) = ArgKind::of(spec, dialect) {
            out.push(Consumer {
                position: spec.position,
                kind,
            });
        }
    }
    out
}

/// Walks every well-formed directive of `fmt`.
///
/// For scanf the `*` suppression sigil is stripped before parsing, as the
/// engine does. Malformed directives are skipped the same way the engines
/// skip them.
pub(crate) fn for_each_spec<'f>(
    fmt: &'f [u8],
    dialect: Dialect,
    mut f: impl FnMut(&FormatSpec<'f>, bool),
) {
    let mut pos = 0;
    while pos < fmt.len() {
        if fmt[pos] != b'%' {
            pos += 1;
            continue;
        }
        pos += 1;
        let suppressed = dialect == Dialect::Scanf && fmt.get(pos) == Some(&b'*');
        if suppressed {
            pos += 1;
        }
        if let Some((spec, consumed)) = parse_format_spec(&fmt[pos..], dialect) {
            f(&spec, suppressed);
            pos += consumed;
        }
    }
}

/// Whether `fmt` uses any `%N$` or `*N$` reference.
pub fn uses_positions(fmt: &[u8], dialect: Dialect) -> bool {
    let mut found = false;
    for_each_spec(fmt, dialect, |spec, _| {
        found |= spec.position != 0
            || matches!(spec.width, Width::FromArg(n) if n != 0)
            || matches!(spec.precision, Precision::FromArg(n) if n != 0);
    });
    found
}

impl ArgPlan {
    /// Classifies every consumer of `fmt` and assigns it a slot.
    ///
    /// Explicit `N$` consumers take slot `N`. Sequential consumers take the
    /// lowest slots no explicit reference names, in order of appearance.
    /// Fails with `EINVAL` when a slot is read with two different kinds or
    /// when a slot below the highest one referenced is never read.
    pub fn build(fmt: &[u8], dialect: Dialect) -> Result<Self, i32> {
        let mut consumers = Vec::new();
        for_each_spec(fmt, dialect, |spec, suppressed| {
            consumers.extend(consumers_of(spec, dialect, suppressed));
        });

        let explicit_max = consumers.iter().map(|c| c.position).max().unwrap_or(0);
        let mut explicit = vec![false; explicit_max];
        for c in consumers.iter().filter(|c| c.position != 0) {
            explicit[c.position - 1] = true;
        }

        let mut kinds: Vec<Option<ArgKind>> = Vec::new();
        let mut slots = Vec::with_capacity(consumers.len());
        let mut next_free = 1;
        for c in &consumers {
            let slot = if c.position != 0 {
                c.position
            } else {
                while explicit.get(next_free - 1).copied().unwrap_or(false) {
                    next_free += 1;
                }
                next_free += 1;
                next_free - 1
            };
            if kinds.len() < slot {
                kinds.resize(slot, None);
            }
            match kinds[slot - 1] {
                Some(kind) if kind != c.kind => return Err(errno::EINVAL),
                _ => kinds[slot - 1] = Some(c.kind),
            }
            slots.push(slot);
        }

        let kinds = kinds
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(errno::EINVAL)?;
        Ok(Self { kinds, slots })
    }

    /// Number of argument slots the format reads.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Kind of slot `n` (1-based).
    pub fn kind(&self, n: usize) -> Option<ArgKind> {
        n.checked_sub(1).and_then(|i| self.kinds.get(i)).copied()
    }

    /// Slots in consumer order.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }
}

/// Cursor copies positioned at each argument slot.
#[derive(Debug, Clone)]
pub struct ArgTable<'s, 'a> {
    cursors: Vec<ArgCursor<'s, 'a>>,
}

impl<'s, 'a> ArgTable<'s, 'a> {
    /// Builds the table by stepping a copy of `base` past each slot's kind.
    pub fn build(plan: &ArgPlan, base: ArgCursor<'s, 'a>) -> Result<Self, i32> {
        let mut cursor = base;
        let mut cursors = Vec::with_capacity(plan.len());
        for &kind in &plan.kinds {
            cursors.push(cursor);
            cursor.step(kind)?;
        }
        Ok(Self { cursors })
    }

    /// Reads slot `n` (1-based) as `kind`.
    pub fn fetch(&self, n: usize, kind: ArgKind) -> Result<FormatArg<'a>, i32> {
        let mut cursor = *n
            .checked_sub(1)
            .and_then(|i| self.cursors.get(i))
            .ok_or(errno::EINVAL)?;
        cursor.next_arg(kind)
    }
}

/// Argument source for the output engine: sequential or planned.
pub(crate) enum ArgSource<'s, 'a> {
    Sequential(ArgCursor<'s, 'a>),
    Positional {
        table: ArgTable<'s, 'a>,
        slots: std::vec::IntoIter<usize>,
    },
}

impl<'s, 'a> ArgSource<'s, 'a> {
    pub(crate) fn for_format(fmt: &[u8], args: &'s [FormatArg<'a>]) -> Result<Self, i32> {
        let cursor = ArgCursor::new(args);
        if !uses_positions(fmt, Dialect::Printf) {
            return Ok(ArgSource::Sequential(cursor));
        }
        let plan = ArgPlan::build(fmt, Dialect::Printf)?;
        let table = ArgTable::build(&plan, cursor)?;
        Ok(ArgSource::Positional {
            table,
            slots: plan.slots.into_iter(),
        })
    }

    pub(crate) fn next(&mut self, kind: ArgKind) -> Result<FormatArg<'a>, i32> {
        match self {
            ArgSource::Sequential(cursor) => cursor.next_arg(kind),
            ArgSource::Positional { table, slots } => {
                let slot = slots.next().ok_or(errno::EINVAL)?;
                table.fetch(slot, kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_checks_kinds() {
        let args = [FormatArg::Int(1), FormatArg::Float(2.0)];
        let mut cursor = ArgCursor::new(&args);
        assert!(matches!(cursor.next_arg(ArgKind::Int), Ok(FormatArg::Int(1))));
        assert_eq!(cursor.next_arg(ArgKind::Int).unwrap_err(), errno::EINVAL);
        assert_eq!(cursor.index(), 1);
        assert!(cursor.next_arg(ArgKind::Float).is_ok());
        assert_eq!(cursor.next_arg(ArgKind::Float).unwrap_err(), errno::EINVAL);
    }

    #[test]
    fn unsigned_values_satisfy_int_slots() {
        let args = [FormatArg::Uint(7)];
        let mut cursor = ArgCursor::new(&args);
        assert!(cursor.next_arg(ArgKind::Int).is_ok());
    }

    #[test]
    fn plan_orders_explicit_slots() {
        let plan = ArgPlan::build(b"%2$s %1$d", Dialect::Printf).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.kind(1), Some(ArgKind::Int));
        assert_eq!(plan.kind(2), Some(ArgKind::Str));
        assert_eq!(plan.slots(), &[2, 1]);
    }

    #[test]
    fn plan_reads_star_positions_before_value() {
        let plan = ArgPlan::build(b"%3$*1$.*2$f", Dialect::Printf).unwrap();
        assert_eq!(plan.slots(), &[1, 2, 3]);
        assert_eq!(plan.kind(3), Some(ArgKind::Float));
    }

    #[test]
    fn plan_gap_is_invalid() {
        assert_eq!(
            ArgPlan::build(b"%1$d %3$d", Dialect::Printf),
            Err(errno::EINVAL)
        );
    }

    #[test]
    fn plan_conflicting_kinds_are_invalid() {
        assert_eq!(
            ArgPlan::build(b"%1$d %1$s", Dialect::Printf),
            Err(errno::EINVAL)
        );
    }

    #[test]
    fn plan_reuse_with_same_kind_is_fine() {
        let plan = ArgPlan::build(b"%1$d %1$x", Dialect::Printf).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.slots(), &[1, 1]);
    }

    #[test]
    fn sequential_specs_take_first_unused_slots() {
        let plan = ArgPlan::build(b"%2$s %d %d", Dialect::Printf).unwrap();
        assert_eq!(plan.slots(), &[2, 1, 3]);
        assert_eq!(plan.kind(2), Some(ArgKind::Str));
        assert_eq!(plan.kind(3), Some(ArgKind::Int));
    }

    #[test]
    fn percent_escapes_consume_nothing() {
        let plan = ArgPlan::build(b"100%% %1$d", Dialect::Printf).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn scanf_suppressed_conversions_consume_nothing() {
        let plan = ArgPlan::build(b"%*d %1$d", Dialect::Scanf).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.kind(1), Some(ArgKind::Target));
    }

    #[test]
    fn table_positions_cursor_copies() {
        let args = [
            FormatArg::Int(10),
            FormatArg::Str(Some(b"x\0")),
            FormatArg::Float(1.5),
        ];
        let plan = ArgPlan::build(b"%3$f %1$d %2$s", Dialect::Printf).unwrap();
        let table = ArgTable::build(&plan, ArgCursor::new(&args)).unwrap();
        assert!(matches!(table.fetch(3, ArgKind::Float), Ok(FormatArg::Float(f)) if f == 1.5));
        assert!(matches!(table.fetch(1, ArgKind::Int), Ok(FormatArg::Int(10))));
        assert!(table.fetch(1, ArgKind::Int).is_ok());
        assert_eq!(table.fetch(4, ArgKind::Int).unwrap_err(), errno::EINVAL);
    }

    #[test]
    fn table_build_rejects_mismatched_arguments() {
        let args = [FormatArg::Float(1.0)];
        let plan = ArgPlan::build(b"%1$d", Dialect::Printf).unwrap();
        assert_eq!(
            ArgTable::build(&plan, ArgCursor::new(&args)).unwrap_err(),
            errno::EINVAL
        );
    }

    #[test]
    fn uses_positions_detects_star_references() {
        assert!(!uses_positions(b"%d %*d", Dialect::Printf));
        assert!(uses_positions(b"%*2$d", Dialect::Printf));
        assert!(uses_positions(b"%1$d", Dialect::Printf));
    }
}
