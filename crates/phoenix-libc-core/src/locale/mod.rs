//! Locale support.
//!
//! Two pieces of state decide which locale is in force:
//!
//! - the process-wide global locale, changed by [`setlocale`] and kept as six
//!   packed slot indices in one atomic word, and
//! - a thread-local current locale installed by [`uselocale`]; when unset the
//!   thread follows the global locale.
//!
//! A [`Locale`] is a plain value naming one built-in record per category, so
//! copying one never allocates and reading the global locale never locks.

mod builtin;
pub mod env;
pub mod langinfo;

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errno;

pub use builtin::{
    BUILTIN_LOCALES, BuiltinLocale, CHAR_MAX, CaseMap, ClassSet, CollationElement, CollationKey,
    CtypeInfo, Era, MessagesInfo, MonetaryInfo, NumericInfo, POSIX_INDEX, TimeInfo,
};
use env::{Environment, ProcessEnvironment};

/// POSIX locale category: string collation.
pub const LC_COLLATE: i32 = 0;
/// POSIX locale category: character classification and conversion.
pub const LC_CTYPE: i32 = 1;
/// POSIX locale category: informational and diagnostic messages.
pub const LC_MESSAGES: i32 = 2;
/// POSIX locale category: monetary formatting.
pub const LC_MONETARY: i32 = 3;
/// POSIX locale category: numeric formatting.
pub const LC_NUMERIC: i32 = 4;
/// POSIX locale category: date and time formatting.
pub const LC_TIME: i32 = 5;
/// POSIX locale category: all categories.
pub const LC_ALL: i32 = -1;

pub const LC_COLLATE_MASK: i32 = 1 << LC_COLLATE;
pub const LC_CTYPE_MASK: i32 = 1 << LC_CTYPE;
pub const LC_MESSAGES_MASK: i32 = 1 << LC_MESSAGES;
pub const LC_MONETARY_MASK: i32 = 1 << LC_MONETARY;
pub const LC_NUMERIC_MASK: i32 = 1 << LC_NUMERIC;
pub const LC_TIME_MASK: i32 = 1 << LC_TIME;
pub const LC_ALL_MASK: i32 = LC_COLLATE_MASK
    | LC_CTYPE_MASK
    | LC_MESSAGES_MASK
    | LC_MONETARY_MASK
    | LC_NUMERIC_MASK
    | LC_TIME_MASK;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// One independently settable locale category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Collate,
    Ctype,
    Messages,
    Monetary,
    Numeric,
    Time,
}

impl Category {
    /// All categories in slot order.
    pub const ALL: [Category; 6] = [
        Category::Collate,
        Category::Ctype,
        Category::Messages,
        Category::Monetary,
        Category::Numeric,
        Category::Time,
    ];

    /// Converts an `LC_*` constant. `LC_ALL` is not a single category.
    pub fn from_raw(category: i32) -> Option<Self> {
        usize::try_from(category)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// The `LC_*` constant for this category.
    pub const fn raw(self) -> i32 {
        self as i32
    }

    /// The `LC_*_MASK` bit for this category.
    pub const fn mask(self) -> i32 {
        1 << self.raw()
    }

    /// Environment variable / composite-name label, e.g. `"LC_CTYPE"`.
    pub const fn name(self) -> &'static str {
        match self {
            Category::Collate => "LC_COLLATE",
            Category::Ctype => "LC_CTYPE",
            Category::Messages => "LC_MESSAGES",
            Category::Monetary => "LC_MONETARY",
            Category::Numeric => "LC_NUMERIC",
            Category::Time => "LC_TIME",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Returns `true` if `cat` is a valid argument for [`setlocale`].
#[inline]
pub fn valid_category(cat: i32) -> bool {
    cat == LC_ALL || Category::from_raw(cat).is_some()
}

// ---------------------------------------------------------------------------
// Locale record
// ---------------------------------------------------------------------------

/// A locale: one built-in record index per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    slots: [u8; 6],
}

impl Default for Locale {
    fn default() -> Self {
        Self::POSIX
    }
}

impl Locale {
    /// The "C" locale in every category.
    pub const POSIX: Locale = Locale { slots: [0; 6] };

    /// Every category set to the built-in at `index`.
    fn uniform(index: usize) -> Self {
        Self::POSIX.with_all(LC_ALL_MASK, index)
    }

    fn with(mut self, category: Category, index: usize) -> Self {
        // Built-in tables are far smaller than a byte; see `builtin::lookup`.
        self.slots[category.slot()] = index as u8;
        self
    }

    fn with_all(self, mask: i32, index: usize) -> Self {
        Category::ALL
            .into_iter()
            .filter(|c| mask & c.mask() != 0)
            .fold(self, |acc, c| acc.with(c, index))
    }

    /// Built-in index selected for `category`.
    #[inline]
    pub fn index(&self, category: Category) -> usize {
        self.slots[category.slot()] as usize
    }

    /// Built-in record selected for `category`.
    #[inline]
    pub fn record(&self, category: Category) -> &'static BuiltinLocale {
        builtin::builtin(self.index(category))
    }

    /// Canonical name of the locale selected for `category`.
    pub fn name(&self, category: Category) -> &'static str {
        self.record(category).name
    }

    #[inline]
    pub fn ctype(&self) -> &'static CtypeInfo {
        &self.record(Category::Ctype).ctype
    }

    /// Whether classification follows the plain ASCII rules.
    #[inline]
    pub fn is_posix_ctype(&self) -> bool {
        self.index(Category::Ctype) == POSIX_INDEX
    }

    #[inline]
    pub fn numeric(&self) -> &'static NumericInfo {
        &self.record(Category::Numeric).numeric
    }

    #[inline]
    pub fn monetary(&self) -> &'static MonetaryInfo {
        &self.record(Category::Monetary).monetary
    }

    #[inline]
    pub fn time(&self) -> &'static TimeInfo {
        &self.record(Category::Time).time
    }

    #[inline]
    pub fn messages(&self) -> &'static MessagesInfo {
        &self.record(Category::Messages).messages
    }

    #[inline]
    pub fn collation(&self) -> &'static [CollationElement] {
        self.record(Category::Collate).collation
    }

    /// `setlocale(LC_ALL, NULL)` form: one name if every category agrees,
    /// otherwise `LC_COLLATE=…;LC_CTYPE=…;…`.
    pub fn composite_name(&self) -> String {
        let first = self.slots[0];
        if self.slots.iter().all(|&s| s == first) {
            return self.name(Category::Collate).to_string();
        }
        Category::ALL
            .into_iter()
            .map(|c| format!("{}={}", c.name(), self.name(c)))
            .collect::<Vec<_>>()
            .join(";")
    }

    fn pack(self) -> u64 {
        self.slots
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &s)| acc | (u64::from(s) << (i * 8)))
    }

    fn unpack(word: u64) -> Self {
        let mut slots = [0u8; 6];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = (word >> (i * 8)) as u8;
        }
        Self { slots }
    }
}

// ---------------------------------------------------------------------------
// Active locale state
// ---------------------------------------------------------------------------

/// Packed global locale; zero is "C" everywhere.
static GLOBAL_LOCALE: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static CURRENT_LOCALE: RefCell<Option<Arc<Locale>>> = const { RefCell::new(None) };
}

/// The process-wide locale set by [`setlocale`].
#[inline]
pub fn global_locale() -> Locale {
    Locale::unpack(GLOBAL_LOCALE.load(Ordering::Relaxed))
}

fn store_global(locale: Locale) {
    GLOBAL_LOCALE.store(locale.pack(), Ordering::Relaxed);
}

/// The locale in force on this thread: the one installed by [`uselocale`],
/// or the global locale when none is.
#[inline]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE
        .with(|current| current.borrow().as_deref().copied())
        .unwrap_or_else(global_locale)
}

/// Caller-visible locale object (`locale_t`).
///
/// `Global` is the `LC_GLOBAL_LOCALE` sentinel; it always tracks the live
/// global locale and can never be freed. `Object` handles come from
/// [`newlocale`] and [`duplocale`].
#[derive(Debug, Clone)]
pub enum LocaleHandle {
    Global,
    Object(Arc<Locale>),
}

/// The `LC_GLOBAL_LOCALE` sentinel.
pub const LC_GLOBAL_LOCALE: LocaleHandle = LocaleHandle::Global;

impl LocaleHandle {
    /// The locale this handle denotes right now.
    pub fn resolve(&self) -> Locale {
        match self {
            LocaleHandle::Global => global_locale(),
            LocaleHandle::Object(locale) => **locale,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, LocaleHandle::Global)
    }
}

/// Handles compare by identity, like the pointers they stand for.
impl PartialEq for LocaleHandle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LocaleHandle::Global, LocaleHandle::Global) => true,
            (LocaleHandle::Object(a), LocaleHandle::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.composite_name())
    }
}

fn resolve_name(env: &dyn Environment, category: Category, name: &str) -> Option<usize> {
    if name.is_empty() {
        builtin::lookup(&env::locale_name_for(env, category))
    } else {
        builtin::lookup(name)
    }
}

/// Applies a `setlocale(LC_ALL, …)` argument, which may be a composite name.
fn apply_all(env: &dyn Environment, base: Locale, name: &str) -> Option<Locale> {
    if name.contains('=') {
        let mut locale = base;
        for part in name.split(';') {
            let (cat, value) = part.split_once('=')?;
            let category = Category::from_name(cat)?;
            locale = locale.with(category, resolve_name(env, category, value)?);
        }
        return Some(locale);
    }
    Category::ALL.into_iter().try_fold(base, |acc, c| {
        resolve_name(env, c, name).map(|index| acc.with(c, index))
    })
}

// ---------------------------------------------------------------------------
// Public operations
// ---------------------------------------------------------------------------

/// `setlocale`: query (`locale == None`) or change the global locale.
///
/// Returns the resulting locale name for `category`, or `None` when the
/// category or name is not recognized (the global locale is then unchanged).
pub fn setlocale(category: i32, locale: Option<&str>) -> Option<String> {
    setlocale_with_env(&ProcessEnvironment, category, locale)
}

/// [`setlocale`] with an explicit environment for empty names.
pub fn setlocale_with_env(
    env: &dyn Environment,
    category: i32,
    locale: Option<&str>,
) -> Option<String> {
    let current = global_locale();
    if category == LC_ALL {
        let Some(name) = locale else {
            return Some(current.composite_name());
        };
        let updated = apply_all(env, current, name)?;
        store_global(updated);
        return Some(updated.composite_name());
    }

    let category = Category::from_raw(category)?;
    let Some(name) = locale else {
        return Some(current.name(category).to_string());
    };
    let index = resolve_name(env, category, name)?;
    let updated = current.with(category, index);
    store_global(updated);
    Some(updated.name(category).to_string())
}

/// `newlocale`: builds a locale object from `base` (or from "C") with the
/// categories in `category_mask` switched to `locale`.
///
/// A `base` object that is not shared elsewhere is updated in place and
/// returned; a shared one is copied first.
pub fn newlocale(
    category_mask: i32,
    locale: &str,
    base: Option<LocaleHandle>,
) -> Result<LocaleHandle, i32> {
    newlocale_with_env(&ProcessEnvironment, category_mask, locale, base)
}

/// [`newlocale`] with an explicit environment for empty names.
pub fn newlocale_with_env(
    env: &dyn Environment,
    category_mask: i32,
    locale: &str,
    base: Option<LocaleHandle>,
) -> Result<LocaleHandle, i32> {
    if category_mask & !LC_ALL_MASK != 0 {
        return Err(errno::EINVAL);
    }
    let mut record = match base {
        None => Arc::new(Locale::POSIX),
        Some(LocaleHandle::Global) => return Err(errno::EINVAL),
        Some(LocaleHandle::Object(record)) => record,
    };
    let mut updated = *record;
    for category in Category::ALL {
        if category_mask & category.mask() != 0 {
            let index = resolve_name(env, category, locale).ok_or(errno::EINVAL)?;
            updated = updated.with(category, index);
        }
    }
    *Arc::make_mut(&mut record) = updated;
    Ok(LocaleHandle::Object(record))
}

/// `duplocale`: an independent object with the same category slots.
///
/// Duplicating `LC_GLOBAL_LOCALE` snapshots the current global locale.
/// Records are reference counted and allocation failure aborts the process,
/// so this never reports `ENOMEM`; the `Result` keeps the C contract.
pub fn duplocale(locale: &LocaleHandle) -> Result<LocaleHandle, i32> {
    Ok(LocaleHandle::Object(Arc::new(locale.resolve())))
}

/// `freelocale`: releases a locale object. The global sentinel is refused.
pub fn freelocale(locale: LocaleHandle) -> Result<(), i32> {
    match locale {
        LocaleHandle::Global => Err(errno::EINVAL),
        LocaleHandle::Object(record) => {
            drop(record);
            Ok(())
        }
    }
}

/// `uselocale`: installs `new` for this thread and returns the previous
/// setting. `None` only queries; `Some(LC_GLOBAL_LOCALE)` makes the thread
/// follow the global locale again.
pub fn uselocale(new: Option<&LocaleHandle>) -> LocaleHandle {
    CURRENT_LOCALE.with(|current| {
        let previous = match current.borrow().as_ref() {
            Some(record) => LocaleHandle::Object(Arc::clone(record)),
            None => LocaleHandle::Global,
        };
        match new {
            None => {}
            Some(LocaleHandle::Global) => *current.borrow_mut() = None,
            Some(LocaleHandle::Object(record)) => {
                *current.borrow_mut() = Some(Arc::clone(record));
            }
        }
        previous
    })
}

/// Returns `true` if `name` refers to the minimal POSIX "C" locale.
#[inline]
pub fn is_c_locale(name: &str) -> bool {
    builtin::lookup(name) == Some(POSIX_INDEX)
}

// ---------------------------------------------------------------------------
// localeconv
// ---------------------------------------------------------------------------

/// Numeric and monetary formatting conventions (mirrors POSIX `struct lconv`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleConv {
    pub decimal_point: Vec<u8>,
    pub thousands_sep: Vec<u8>,
    pub grouping: Vec<u8>,
    pub int_curr_symbol: Vec<u8>,
    pub currency_symbol: Vec<u8>,
    pub mon_decimal_point: Vec<u8>,
    pub mon_thousands_sep: Vec<u8>,
    pub mon_grouping: Vec<u8>,
    pub positive_sign: Vec<u8>,
    pub negative_sign: Vec<u8>,
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

impl LocaleConv {
    /// Numeric fields from `locale`'s numeric slot, monetary fields from its
    /// monetary slot.
    pub fn of(locale: Locale) -> Self {
        let n = locale.numeric();
        let m = locale.monetary();
        Self {
            decimal_point: n.decimal_point.to_vec(),
            thousands_sep: n.thousands_sep.to_vec(),
            grouping: n.grouping.to_vec(),
            int_curr_symbol: m.int_curr_symbol.to_vec(),
            currency_symbol: m.currency_symbol.to_vec(),
            mon_decimal_point: m.mon_decimal_point.to_vec(),
            mon_thousands_sep: m.mon_thousands_sep.to_vec(),
            mon_grouping: m.mon_grouping.to_vec(),
            positive_sign: m.positive_sign.to_vec(),
            negative_sign: m.negative_sign.to_vec(),
            int_frac_digits: m.int_frac_digits,
            frac_digits: m.frac_digits,
            p_cs_precedes: m.p_cs_precedes,
            p_sep_by_space: m.p_sep_by_space,
            n_cs_precedes: m.n_cs_precedes,
            n_sep_by_space: m.n_sep_by_space,
            p_sign_posn: m.p_sign_posn,
            n_sign_posn: m.n_sign_posn,
            int_p_cs_precedes: m.int_p_cs_precedes,
            int_p_sep_by_space: m.int_p_sep_by_space,
            int_n_cs_precedes: m.int_n_cs_precedes,
            int_n_sep_by_space: m.int_n_sep_by_space,
            int_p_sign_posn: m.int_p_sign_posn,
            int_n_sign_posn: m.int_n_sign_posn,
        }
    }
}

/// `localeconv` for the locale in force on this thread.
pub fn localeconv() -> LocaleConv {
    LocaleConv::of(current_locale())
}

/// `localeconv_l`.
pub fn localeconv_l(locale: &LocaleHandle) -> LocaleConv {
    LocaleConv::of(locale.resolve())
}

/// Returns the `LocaleConv` for the POSIX "C" locale.
pub fn c_locale_conv() -> LocaleConv {
    LocaleConv::of(Locale::POSIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn german() -> usize {
        builtin::lookup("de_DE").unwrap()
    }

    // ── categories ──────────────────────────────────────────────────

    #[test]
    fn category_constants_have_expected_values() {
        assert_eq!(LC_COLLATE_MASK, 0x01);
        assert_eq!(LC_CTYPE_MASK, 0x02);
        assert_eq!(LC_MESSAGES_MASK, 0x04);
        assert_eq!(LC_MONETARY_MASK, 0x08);
        assert_eq!(LC_NUMERIC_MASK, 0x10);
        assert_eq!(LC_TIME_MASK, 0x20);
        assert_eq!(LC_ALL_MASK, 0x3F);
    }

    #[test]
    fn valid_category_accepts_all_defined_categories() {
        for cat in [LC_COLLATE, LC_CTYPE, LC_MESSAGES, LC_MONETARY, LC_NUMERIC, LC_TIME, LC_ALL] {
            assert!(valid_category(cat));
        }
        assert!(!valid_category(6));
        assert!(!valid_category(-2));
        assert!(!valid_category(i32::MAX));
    }

    #[test]
    fn category_round_trips_through_raw() {
        for c in Category::ALL {
            assert_eq!(Category::from_raw(c.raw()), Some(c));
            assert_eq!(Category::from_name(c.name()), Some(c));
        }
    }

    // ── locale record ───────────────────────────────────────────────

    #[test]
    fn pack_unpack_is_lossless() {
        let l = Locale::POSIX
            .with(Category::Numeric, german())
            .with(Category::Time, german());
        assert_eq!(Locale::unpack(l.pack()), l);
        assert_eq!(Locale::POSIX.pack(), 0);
    }

    #[test]
    fn composite_name_collapses_when_uniform() {
        assert_eq!(Locale::POSIX.composite_name(), "C");
        assert_eq!(Locale::uniform(german()).composite_name(), "de_DE.ISO-8859-1");
        let mixed = Locale::POSIX.with(Category::Numeric, german());
        assert_eq!(
            mixed.composite_name(),
            "LC_COLLATE=C;LC_CTYPE=C;LC_MESSAGES=C;LC_MONETARY=C;\
             LC_NUMERIC=de_DE.ISO-8859-1;LC_TIME=C"
        );
    }

    #[test]
    fn composite_name_is_accepted_back() {
        let no_env = |_: &str| None;
        let mixed = Locale::POSIX.with(Category::Ctype, german());
        let parsed = apply_all(&no_env, Locale::POSIX, &mixed.composite_name());
        assert_eq!(parsed, Some(mixed));
        assert_eq!(apply_all(&no_env, Locale::POSIX, "LC_BOGUS=C"), None);
        assert_eq!(apply_all(&no_env, Locale::POSIX, "LC_CTYPE=xx"), None);
    }

    // ── newlocale / duplocale / freelocale ──────────────────────────

    #[test]
    fn newlocale_rejects_unknown_mask_bits() {
        assert_eq!(newlocale(0x40, "C", None), Err(errno::EINVAL));
        assert_eq!(newlocale(-1, "C", None), Err(errno::EINVAL));
    }

    #[test]
    fn newlocale_rejects_unknown_name() {
        assert_eq!(newlocale(LC_ALL_MASK, "xx_XX", None), Err(errno::EINVAL));
    }

    #[test]
    fn newlocale_sets_only_masked_slots() {
        let h = newlocale(LC_NUMERIC_MASK, "de_DE", None).unwrap();
        let l = h.resolve();
        assert_eq!(l.index(Category::Numeric), german());
        assert_eq!(l.index(Category::Ctype), POSIX_INDEX);
        assert_eq!(l.numeric().decimal_point, b",");
    }

    #[test]
    fn newlocale_updates_unshared_base_in_place() {
        let base = newlocale(LC_CTYPE_MASK, "de_DE", None).unwrap();
        let LocaleHandle::Object(ref arc) = base else {
            panic!("expected object")
        };
        let before = Arc::as_ptr(arc);
        let updated = newlocale(LC_TIME_MASK, "de_DE", Some(base)).unwrap();
        let LocaleHandle::Object(ref arc) = updated else {
            panic!("expected object")
        };
        assert_eq!(Arc::as_ptr(arc), before);
        assert_eq!(updated.resolve().index(Category::Ctype), german());
        assert_eq!(updated.resolve().index(Category::Time), german());
    }

    #[test]
    fn newlocale_copies_shared_base() {
        let base = newlocale(LC_CTYPE_MASK, "de_DE", None).unwrap();
        let keep = base.clone();
        let updated = newlocale(LC_CTYPE_MASK, "C", Some(base)).unwrap();
        assert_ne!(updated, keep);
        assert_eq!(keep.resolve().index(Category::Ctype), german());
        assert_eq!(updated.resolve().index(Category::Ctype), POSIX_INDEX);
    }

    #[test]
    fn newlocale_refuses_global_base() {
        assert_eq!(
            newlocale(LC_CTYPE_MASK, "C", Some(LC_GLOBAL_LOCALE)),
            Err(errno::EINVAL)
        );
    }

    #[test]
    fn newlocale_empty_name_reads_environment() {
        let env = |name: &str| (name == "LC_MONETARY").then(|| "de_DE".to_string());
        let h = newlocale_with_env(&env, LC_ALL_MASK, "", None).unwrap();
        let l = h.resolve();
        assert_eq!(l.index(Category::Monetary), german());
        assert_eq!(l.index(Category::Numeric), POSIX_INDEX);
    }

    #[test]
    fn duplocale_copies_slots_and_is_independent() {
        let original = newlocale(LC_ALL_MASK, "de_DE", None).unwrap();
        let dup = duplocale(&original).unwrap();
        assert_eq!(dup.resolve(), original.resolve());
        assert_ne!(dup, original);
        freelocale(dup).unwrap();
        assert_eq!(original.resolve(), Locale::uniform(german()));
    }

    #[test]
    fn duplocale_of_global_yields_an_owned_object() {
        let dup = duplocale(&LC_GLOBAL_LOCALE).unwrap();
        assert!(!dup.is_global());
        freelocale(dup).unwrap();
    }

    #[test]
    fn freelocale_refuses_global() {
        assert_eq!(freelocale(LC_GLOBAL_LOCALE), Err(errno::EINVAL));
    }

    // ── uselocale ───────────────────────────────────────────────────

    #[test]
    fn uselocale_installs_and_restores() {
        std::thread::spawn(|| {
            let de = newlocale(LC_ALL_MASK, "de_DE", None).unwrap();
            assert_eq!(uselocale(None), LC_GLOBAL_LOCALE);
            let prev = uselocale(Some(&de));
            assert_eq!(prev, LC_GLOBAL_LOCALE);
            assert_eq!(uselocale(None), de);
            assert_eq!(current_locale(), Locale::uniform(german()));
            let prev = uselocale(Some(&LC_GLOBAL_LOCALE));
            assert_eq!(prev, de);
            assert_eq!(uselocale(None), LC_GLOBAL_LOCALE);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn freed_locale_stays_alive_while_in_use() {
        std::thread::spawn(|| {
            let de = newlocale(LC_NUMERIC_MASK, "de_DE", None).unwrap();
            uselocale(Some(&de));
            freelocale(de).unwrap();
            assert_eq!(current_locale().numeric().decimal_point, b",");
            uselocale(Some(&LC_GLOBAL_LOCALE));
        })
        .join()
        .unwrap();
    }

    // ── localeconv ──────────────────────────────────────────────────

    #[test]
    fn c_locale_conv_matches_posix() {
        let conv = c_locale_conv();
        assert_eq!(conv.decimal_point, b".");
        assert!(conv.thousands_sep.is_empty());
        assert!(conv.grouping.is_empty());
        assert!(conv.currency_symbol.is_empty());
        assert_eq!(conv.frac_digits, CHAR_MAX);
        assert_eq!(conv.int_n_sign_posn, CHAR_MAX);
    }

    #[test]
    fn localeconv_mixes_numeric_and_monetary_slots() {
        let h = newlocale(LC_MONETARY_MASK, "de_DE", None).unwrap();
        let conv = localeconv_l(&h);
        assert_eq!(conv.decimal_point, b".");
        assert_eq!(conv.mon_decimal_point, b",");
        assert_eq!(conv.currency_symbol, b"EUR");
        assert_eq!(conv.frac_digits, 2);
    }

    #[test]
    fn is_c_locale_recognises_aliases() {
        assert!(is_c_locale("C"));
        assert!(is_c_locale("POSIX"));
        assert!(!is_c_locale("de_DE"));
        assert!(!is_c_locale(""));
    }
}
