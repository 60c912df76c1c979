//! `<langinfo.h>`: locale items by number.

use std::borrow::Cow;

use super::{Locale, LocaleHandle, current_locale};

/// Item selector for [`nl_langinfo`].
pub type NlItem = i32;

pub const CODESET: NlItem = 0;
pub const D_T_FMT: NlItem = 1;
pub const D_FMT: NlItem = 2;
pub const T_FMT: NlItem = 3;
pub const T_FMT_AMPM: NlItem = 4;
pub const AM_STR: NlItem = 5;
pub const PM_STR: NlItem = 6;
pub const DAY_1: NlItem = 7;
pub const DAY_2: NlItem = 8;
pub const DAY_3: NlItem = 9;
pub const DAY_4: NlItem = 10;
pub const DAY_5: NlItem = 11;
pub const DAY_6: NlItem = 12;
pub const DAY_7: NlItem = 13;
pub const ABDAY_1: NlItem = 14;
pub const ABDAY_2: NlItem = 15;
pub const ABDAY_3: NlItem = 16;
pub const ABDAY_4: NlItem = 17;
pub const ABDAY_5: NlItem = 18;
pub const ABDAY_6: NlItem = 19;
pub const ABDAY_7: NlItem = 20;
pub const MON_1: NlItem = 21;
pub const MON_2: NlItem = 22;
pub const MON_3: NlItem = 23;
pub const MON_4: NlItem = 24;
pub const MON_5: NlItem = 25;
pub const MON_6: NlItem = 26;
pub const MON_7: NlItem = 27;
pub const MON_8: NlItem = 28;
pub const MON_9: NlItem = 29;
pub const MON_10: NlItem = 30;
pub const MON_11: NlItem = 31;
pub const MON_12: NlItem = 32;
pub const ABMON_1: NlItem = 33;
pub const ABMON_2: NlItem = 34;
pub const ABMON_3: NlItem = 35;
pub const ABMON_4: NlItem = 36;
pub const ABMON_5: NlItem = 37;
pub const ABMON_6: NlItem = 38;
pub const ABMON_7: NlItem = 39;
pub const ABMON_8: NlItem = 40;
pub const ABMON_9: NlItem = 41;
pub const ABMON_10: NlItem = 42;
pub const ABMON_11: NlItem = 43;
pub const ABMON_12: NlItem = 44;
pub const ERA: NlItem = 45;
pub const ERA_D_FMT: NlItem = 46;
pub const ERA_D_T_FMT: NlItem = 47;
pub const ERA_T_FMT: NlItem = 48;
pub const ALT_DIGITS: NlItem = 49;
pub const RADIXCHAR: NlItem = 50;
pub const THOUSEP: NlItem = 51;
pub const CRNCYSTR: NlItem = 52;
pub const YESEXPR: NlItem = 53;
pub const NOEXPR: NlItem = 54;
pub const YESSTR: NlItem = 55;
pub const NOSTR: NlItem = 56;

/// Looks `item` up in `locale`. Unknown items yield an empty string.
///
/// Each item comes from the category that owns it, so a mixed locale can
/// answer `RADIXCHAR` from one built-in and `DAY_1` from another.
pub fn langinfo_of(locale: &Locale, item: NlItem) -> Cow<'static, [u8]> {
    let time = locale.time();
    let index = |first: NlItem| (item - first) as usize;
    let bytes: &'static [u8] = match item {
        CODESET => locale.record(super::Category::Ctype).codeset.as_bytes(),
        D_T_FMT => time.d_t_fmt,
        D_FMT => time.d_fmt,
        T_FMT => time.t_fmt,
        T_FMT_AMPM => time.t_fmt_ampm,
        AM_STR => time.am,
        PM_STR => time.pm,
        DAY_1..=DAY_7 => time.day[index(DAY_1)],
        ABDAY_1..=ABDAY_7 => time.abday[index(ABDAY_1)],
        MON_1..=MON_12 => time.mon[index(MON_1)],
        ABMON_1..=ABMON_12 => time.abmon[index(ABMON_1)],
        ERA => {
            let eras: Vec<String> = time.eras.iter().map(|e| e.describe()).collect();
            return Cow::Owned(eras.join(";").into_bytes());
        }
        ERA_D_FMT => time.era_d_fmt,
        ERA_D_T_FMT => time.era_d_t_fmt,
        ERA_T_FMT => time.era_t_fmt,
        ALT_DIGITS => time.alt_digits,
        RADIXCHAR => locale.numeric().decimal_point,
        THOUSEP => locale.numeric().thousands_sep,
        CRNCYSTR => return Cow::Owned(currency_string(locale)),
        YESEXPR => locale.messages().yesexpr,
        NOEXPR => locale.messages().noexpr,
        YESSTR => locale.messages().yesstr,
        NOSTR => locale.messages().nostr,
        _ => b"",
    };
    Cow::Borrowed(bytes)
}

/// `CRNCYSTR`: the currency symbol prefixed by `-` when it precedes the
/// value and `+` when it follows.
fn currency_string(locale: &Locale) -> Vec<u8> {
    let monetary = locale.monetary();
    let marker = if monetary.p_cs_precedes == 0 { b'+' } else { b'-' };
    let mut out = Vec::with_capacity(monetary.currency_symbol.len() + 1);
    out.push(marker);
    out.extend_from_slice(monetary.currency_symbol);
    out
}

/// `nl_langinfo` for the locale in force on this thread.
pub fn nl_langinfo(item: NlItem) -> Cow<'static, [u8]> {
    langinfo_of(&current_locale(), item)
}

/// `nl_langinfo_l`.
pub fn nl_langinfo_l(item: NlItem, locale: &LocaleHandle) -> Cow<'static, [u8]> {
    langinfo_of(&locale.resolve(), item)
}
