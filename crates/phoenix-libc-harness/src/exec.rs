//! Executes a single fixture case against phoenix-libc-core.
//!
//! Every case runs under an explicit locale object, so printf, scanf and
//! ctype cases never depend on the process-global locale. `setlocale` cases
//! are the exception: they drive the global locale and restore it afterwards,
//! one at a time under [`GLOBAL_LOCALE`].

use phoenix_libc_core::ctype::{self, CharClass};
use phoenix_libc_core::errno;
use phoenix_libc_core::locale::{self, LC_ALL, LC_ALL_MASK, Locale, LocaleHandle, langinfo};
use phoenix_libc_core::stdio::printf::format_into_l;
use phoenix_libc_core::stdio::scanf::scan_from_l;
use phoenix_libc_core::stdio::sink::BoundedBuf;
use phoenix_libc_core::stdio::source::StrSource;
use phoenix_libc_core::stdio::{FormatArg, ScanArg};
use phoenix_libc_core::string;
use phoenix_libc_core::wctype;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::HarnessError;

/// Held while a case changes the process-global locale.
pub static GLOBAL_LOCALE: Mutex<()> = Mutex::new(());

/// Default `snprintf` destination size.
const DEFAULT_BUF: usize = 512;

/// Result of running one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Rendered output compared against `expected_output`.
    pub output: String,
    /// Integer return of the call, when it has one.
    pub ret: Option<i64>,
    /// errno observed after the call (0 when untouched).
    pub errno: i32,
}

/// A printf argument as written in fixture JSON: `{"int": -42}`,
/// `{"str": null}`, `{"wide_str": "abc"}` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureArg {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(Option<String>),
    WideStr(Option<String>),
    Pointer(usize),
}

/// Runs `function` with `inputs` under `locale` ("C" when `None`).
pub fn execute_fixture_case(
    function: &str,
    inputs: &Value,
    locale: Option<&str>,
) -> Result<Execution, HarnessError> {
    let handle = locale::newlocale(LC_ALL_MASK, locale.unwrap_or("C"), None).map_err(|_| {
        HarnessError::bad_input(function, format!("unknown locale {:?}", locale.unwrap_or("C")))
    })?;

    errno::set_errno(0);
    match function {
        "snprintf" => run_snprintf(function, inputs, &handle.resolve()),
        "sscanf" => run_sscanf(function, inputs, &handle.resolve()),
        "toupper" | "tolower" => {
            let c = int_input(function, inputs, "c")?;
            let mapped = if function == "toupper" {
                ctype::to_upper_l(c, &handle)
            } else {
                ctype::to_lower_l(c, &handle)
            };
            Ok(plain(mapped.to_string(), Some(i64::from(mapped))))
        }
        "iswctype" => {
            let wc = int_input(function, inputs, "wc")? as u32;
            let class = wctype::wctype_l(str_input(function, inputs, "class")?, &handle);
            let hit = wctype::iswctype_l(wc, class, &handle);
            Ok(plain((hit != 0).to_string(), Some(i64::from(hit))))
        }
        "setlocale" => run_setlocale(function, inputs),
        "localeconv" => {
            let conv = locale::localeconv_l(&handle);
            Ok(plain(
                format!(
                    "{}|{}|{:?}",
                    lossy(&conv.decimal_point),
                    lossy(&conv.thousands_sep),
                    conv.grouping
                ),
                None,
            ))
        }
        "nl_langinfo" => {
            let name = str_input(function, inputs, "item")?;
            let item = langinfo_item(name)
                .ok_or_else(|| HarnessError::bad_input(function, format!("unknown item {name}")))?;
            Ok(plain(lossy(&langinfo::nl_langinfo_l(item, &handle)), None))
        }
        "strcoll" => {
            let a = str_input(function, inputs, "a")?;
            let b = str_input(function, inputs, "b")?;
            let order = string::strcoll_l(a.as_bytes(), b.as_bytes(), &handle).signum();
            Ok(plain(order.to_string(), Some(i64::from(order))))
        }
        other => match other.strip_prefix("is").and_then(CharClass::from_name) {
            Some(class) => {
                let c = int_input(function, inputs, "c")?;
                let hit = ctype::is_class_in(class, c, &handle.resolve());
                Ok(plain(hit.to_string(), None))
            }
            None => Err(HarnessError::UnknownFunction(other.to_string())),
        },
    }
}

fn plain(output: String, ret: Option<i64>) -> Execution {
    Execution {
        output,
        ret,
        errno: errno::get_errno(),
    }
}

fn failed(code: i32) -> Execution {
    Execution {
        output: String::new(),
        ret: Some(-1),
        errno: code,
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(string::c_str(bytes)).into_owned()
}

fn field<'v>(function: &str, inputs: &'v Value, key: &str) -> Result<&'v Value, HarnessError> {
    inputs
        .get(key)
        .ok_or_else(|| HarnessError::bad_input(function, format!("missing '{key}'")))
}

fn str_input<'v>(function: &str, inputs: &'v Value, key: &str) -> Result<&'v str, HarnessError> {
    field(function, inputs, key)?
        .as_str()
        .ok_or_else(|| HarnessError::bad_input(function, format!("'{key}' must be a string")))
}

fn int_input(function: &str, inputs: &Value, key: &str) -> Result<i32, HarnessError> {
    field(function, inputs, key)?
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| HarnessError::bad_input(function, format!("'{key}' must be an int")))
}

// ---------------------------------------------------------------------------
// printf
// ---------------------------------------------------------------------------

fn run_snprintf(function: &str, inputs: &Value, locale: &Locale) -> Result<Execution, HarnessError> {
    let fmt = str_input(function, inputs, "format")?;
    let args: Vec<FixtureArg> = match inputs.get("args") {
        Some(args) => serde_json::from_value(args.clone())?,
        None => Vec::new(),
    };
    let size = match inputs.get("size") {
        Some(size) => size
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| HarnessError::bad_input(function, "'size' must be unsigned"))?,
        None => DEFAULT_BUF,
    };

    // Wide strings need NUL-terminated u32 storage that outlives the args.
    let wide: Vec<Option<Vec<u32>>> = args
        .iter()
        .map(|arg| match arg {
            FixtureArg::WideStr(Some(s)) => {
                Some(s.chars().map(u32::from).chain(std::iter::once(0)).collect())
            }
            _ => None,
        })
        .collect();
    let format_args: Vec<FormatArg<'_>> = args
        .iter()
        .zip(&wide)
        .map(|(arg, wide)| match arg {
            FixtureArg::Int(v) => FormatArg::Int(*v),
            FixtureArg::Uint(v) => FormatArg::Uint(*v),
            FixtureArg::Float(v) => FormatArg::Float(*v),
            FixtureArg::Str(s) => FormatArg::Str(s.as_deref().map(str::as_bytes)),
            FixtureArg::WideStr(_) => FormatArg::WideStr(wide.as_deref()),
            FixtureArg::Pointer(p) => FormatArg::Pointer(*p),
        })
        .collect();

    let mut buf = vec![0u8; size];
    match format_into_l(BoundedBuf::new(&mut buf), locale, fmt.as_bytes(), &format_args) {
        Ok(n) => Ok(plain(lossy(&buf), Some(n as i64))),
        Err(code) => Ok(failed(code)),
    }
}

// ---------------------------------------------------------------------------
// scanf
// ---------------------------------------------------------------------------

/// Owned storage behind one scanf destination.
#[derive(Debug)]
enum Slot {
    SChar(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    LongLong(i64),
    ULongLong(u64),
    Size(usize),
    Pointer(usize),
    Float(f32),
    Double(f64),
    LongDouble(f64),
    Chars(Vec<u8>),
    WideChars(Vec<u32>),
    Alloc(Vec<u8>),
}

impl Slot {
    /// Parses a target name: `int`, `ulong`, `double`, `chars:16`, ...
    fn parse(name: &str) -> Option<Self> {
        let (kind, len) = match name.split_once(':') {
            Some((kind, len)) => (kind, Some(len.parse::<usize>().ok()?)),
            None => (name, None),
        };
        Some(match (kind, len) {
            ("schar", None) => Slot::SChar(0),
            ("uchar", None) => Slot::UChar(0),
            ("short", None) => Slot::Short(0),
            ("ushort", None) => Slot::UShort(0),
            ("int", None) => Slot::Int(0),
            ("uint", None) => Slot::UInt(0),
            ("long", None) => Slot::Long(0),
            ("ulong", None) => Slot::ULong(0),
            ("llong", None) => Slot::LongLong(0),
            ("ullong", None) => Slot::ULongLong(0),
            ("size", None) => Slot::Size(0),
            ("ptr", None) => Slot::Pointer(0),
            ("float", None) => Slot::Float(0.0),
            ("double", None) => Slot::Double(0.0),
            ("ldouble", None) => Slot::LongDouble(0.0),
            ("chars", Some(n)) => Slot::Chars(vec![0; n]),
            ("wchars", Some(n)) => Slot::WideChars(vec![0; n]),
            ("alloc", None) => Slot::Alloc(Vec::new()),
            _ => return None,
        })
    }

    fn as_arg(&mut self) -> ScanArg<'_> {
        match self {
            Slot::SChar(v) => ScanArg::SChar(v),
            Slot::UChar(v) => ScanArg::UChar(v),
            Slot::Short(v) => ScanArg::Short(v),
            Slot::UShort(v) => ScanArg::UShort(v),
            Slot::Int(v) => ScanArg::Int(v),
            Slot::UInt(v) => ScanArg::UInt(v),
            Slot::Long(v) => ScanArg::Long(v),
            Slot::ULong(v) => ScanArg::ULong(v),
            Slot::LongLong(v) => ScanArg::LongLong(v),
            Slot::ULongLong(v) => ScanArg::ULongLong(v),
            Slot::Size(v) => ScanArg::Size(v),
            Slot::Pointer(v) => ScanArg::Pointer(v),
            Slot::Float(v) => ScanArg::Float(v),
            Slot::Double(v) => ScanArg::Double(v),
            Slot::LongDouble(v) => ScanArg::LongDouble(v),
            Slot::Chars(v) => ScanArg::Chars(v),
            Slot::WideChars(v) => ScanArg::WideChars(v),
            Slot::Alloc(v) => ScanArg::Alloc(v),
        }
    }

    fn render(&self) -> String {
        match self {
            Slot::SChar(v) => v.to_string(),
            Slot::UChar(v) => v.to_string(),
            Slot::Short(v) => v.to_string(),
            Slot::UShort(v) => v.to_string(),
            Slot::Int(v) => v.to_string(),
            Slot::UInt(v) => v.to_string(),
            Slot::Long(v) | Slot::LongLong(v) => v.to_string(),
            Slot::ULong(v) | Slot::ULongLong(v) => v.to_string(),
            Slot::Size(v) => v.to_string(),
            Slot::Pointer(v) => format!("{v:#x}"),
            Slot::Float(v) => v.to_string(),
            Slot::Double(v) | Slot::LongDouble(v) => v.to_string(),
            Slot::Chars(v) => lossy(v),
            Slot::WideChars(v) => v
                .iter()
                .take_while(|&&wc| wc != 0)
                .map(|&wc| char::from_u32(wc).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
            Slot::Alloc(v) => String::from_utf8_lossy(v).into_owned(),
        }
    }
}

fn run_sscanf(function: &str, inputs: &Value, locale: &Locale) -> Result<Execution, HarnessError> {
    let input = str_input(function, inputs, "input")?;
    let fmt = str_input(function, inputs, "format")?;
    let names: Vec<String> = match inputs.get("targets") {
        Some(targets) => serde_json::from_value(targets.clone())?,
        None => Vec::new(),
    };
    let mut slots = names
        .iter()
        .map(|name| {
            Slot::parse(name)
                .ok_or_else(|| HarnessError::bad_input(function, format!("unknown target {name}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let result = {
        let mut args: Vec<ScanArg<'_>> = slots.iter_mut().map(Slot::as_arg).collect();
        scan_from_l(StrSource::new(input.as_bytes()), locale, fmt.as_bytes(), &mut args)
    };
    let ret = match result {
        Ok(Some(n)) => n as i64,
        Ok(None) => -1,
        Err(code) => return Ok(failed(code)),
    };
    let output = slots.iter().map(Slot::render).collect::<Vec<_>>().join("|");
    Ok(plain(output, Some(ret)))
}

// ---------------------------------------------------------------------------
// locale
// ---------------------------------------------------------------------------

fn category(name: &str) -> Option<i32> {
    Some(match name {
        "LC_ALL" => LC_ALL,
        "LC_COLLATE" => locale::LC_COLLATE,
        "LC_CTYPE" => locale::LC_CTYPE,
        "LC_MESSAGES" => locale::LC_MESSAGES,
        "LC_MONETARY" => locale::LC_MONETARY,
        "LC_NUMERIC" => locale::LC_NUMERIC,
        "LC_TIME" => locale::LC_TIME,
        _ => return None,
    })
}

fn langinfo_item(name: &str) -> Option<langinfo::NlItem> {
    Some(match name {
        "CODESET" => langinfo::CODESET,
        "D_T_FMT" => langinfo::D_T_FMT,
        "D_FMT" => langinfo::D_FMT,
        "T_FMT" => langinfo::T_FMT,
        "DAY_1" => langinfo::DAY_1,
        "ABDAY_1" => langinfo::ABDAY_1,
        "MON_1" => langinfo::MON_1,
        "ABMON_1" => langinfo::ABMON_1,
        "RADIXCHAR" => langinfo::RADIXCHAR,
        "THOUSEP" => langinfo::THOUSEP,
        "CRNCYSTR" => langinfo::CRNCYSTR,
        "YESEXPR" => langinfo::YESEXPR,
        "NOEXPR" => langinfo::NOEXPR,
        _ => return None,
    })
}

/// Sets (or queries) the global locale, then restores the previous one.
fn run_setlocale(function: &str, inputs: &Value) -> Result<Execution, HarnessError> {
    let name = str_input(function, inputs, "category")?;
    let cat = category(name)
        .ok_or_else(|| HarnessError::bad_input(function, format!("unknown category {name}")))?;
    let target = match field(function, inputs, "locale")? {
        Value::Null => None,
        Value::String(s) => Some(s.as_str()),
        _ => return Err(HarnessError::bad_input(function, "'locale' must be a string or null")),
    };

    let _serial = GLOBAL_LOCALE.lock();
    let saved = locale::setlocale(LC_ALL, None);
    let result = locale::setlocale(cat, target);
    if let Some(saved) = saved.as_deref() {
        locale::setlocale(LC_ALL, Some(saved));
    }
    Ok(plain(result.unwrap_or_else(|| "(null)".to_string()), None))
}

/// Thread-local locale override; drops back to the previous setting.
pub struct ThreadLocaleGuard {
    previous: LocaleHandle,
}

impl ThreadLocaleGuard {
    pub fn install(name: &str) -> Result<Self, HarnessError> {
        let handle = locale::newlocale(LC_ALL_MASK, name, None)
            .map_err(|_| HarnessError::bad_input("uselocale", format!("unknown locale {name:?}")))?;
        Ok(Self {
            previous: locale::uselocale(Some(&handle)),
        })
    }
}

impl Drop for ThreadLocaleGuard {
    fn drop(&mut self) {
        locale::uselocale(Some(&self.previous));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snprintf_case_reports_output_and_return() {
        let run = execute_fixture_case(
            "snprintf",
            &json!({"format": "%s=%05.1f", "args": [{"str": "x"}, {"float": 2.5}]}),
            None,
        )
        .unwrap();
        assert_eq!(run.output, "x=002.5");
        assert_eq!(run.ret, Some(7));
        assert_eq!(run.errno, 0);
    }

    #[test]
    fn snprintf_truncates_to_size() {
        let run = execute_fixture_case(
            "snprintf",
            &json!({"format": "abcdef", "size": 4}),
            None,
        )
        .unwrap();
        assert_eq!(run.output, "abc");
        assert_eq!(run.ret, Some(6));
    }

    #[test]
    fn snprintf_error_captures_errno() {
        let run = execute_fixture_case(
            "snprintf",
            &json!({"format": "%s", "args": [{"int": 1}]}),
            None,
        )
        .unwrap();
        assert_eq!(run.ret, Some(-1));
        assert_eq!(run.errno, errno::EINVAL);
    }

    #[test]
    fn wide_string_argument() {
        let run = execute_fixture_case(
            "snprintf",
            &json!({"format": "[%ls]", "args": [{"wide_str": "hi"}]}),
            None,
        )
        .unwrap();
        assert_eq!(run.output, "[hi]");
    }

    #[test]
    fn locale_changes_radix() {
        let run = execute_fixture_case(
            "snprintf",
            &json!({"format": "%.2f", "args": [{"float": 1.5}]}),
            Some("de_DE"),
        )
        .unwrap();
        assert_eq!(run.output, "1,50");
    }

    #[test]
    fn sscanf_renders_targets() {
        let run = execute_fixture_case(
            "sscanf",
            &json!({"input": "12 abc 0.5", "format": "%d %s %lf", "targets": ["int", "chars:8", "double"]}),
            None,
        )
        .unwrap();
        assert_eq!(run.output, "12|abc|0.5");
        assert_eq!(run.ret, Some(3));
    }

    #[test]
    fn sscanf_empty_input_is_eof() {
        let run = execute_fixture_case(
            "sscanf",
            &json!({"input": "", "format": "%d", "targets": ["int"]}),
            None,
        )
        .unwrap();
        assert_eq!(run.ret, Some(-1));
    }

    #[test]
    fn ctype_predicates_follow_locale() {
        let c_run = execute_fixture_case("isalpha", &json!({"c": 0xE4}), None).unwrap();
        assert_eq!(c_run.output, "false");
        let de_run = execute_fixture_case("isalpha", &json!({"c": 0xE4}), Some("de_DE")).unwrap();
        assert_eq!(de_run.output, "true");
    }

    #[test]
    fn unknown_function_and_bad_input() {
        assert!(matches!(
            execute_fixture_case("gets", &json!({}), None),
            Err(HarnessError::UnknownFunction(_))
        ));
        assert!(matches!(
            execute_fixture_case("isdigit", &json!({"c": "x"}), None),
            Err(HarnessError::BadInput { .. })
        ));
        assert!(matches!(
            execute_fixture_case("isdigit", &json!({"c": 48}), Some("xx_YY")),
            Err(HarnessError::BadInput { .. })
        ));
    }

    #[test]
    fn unknown_scan_target_is_rejected() {
        assert!(matches!(
            execute_fixture_case(
                "sscanf",
                &json!({"input": "1", "format": "%d", "targets": ["quad"]}),
                None
            ),
            Err(HarnessError::BadInput { .. })
        ));
    }

    #[test]
    fn thread_guard_restores_previous() {
        let before = locale::current_locale().composite_name();
        {
            let _guard = ThreadLocaleGuard::install("de_DE").unwrap();
            assert_eq!(locale::current_locale().numeric().decimal_point, b",");
        }
        assert_eq!(locale::current_locale().composite_name(), before);
    }

    #[test]
    fn setlocale_cases_restore_global_under_contention() {
        let set = json!({"category": "LC_NUMERIC", "locale": "de_DE"});
        let query = json!({"category": "LC_ALL", "locale": null});
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let run = execute_fixture_case("setlocale", &set, None).unwrap();
                        assert_eq!(run.output, "de_DE.ISO-8859-1");
                        let run = execute_fixture_case("setlocale", &query, None).unwrap();
                        assert_eq!(run.output, "C");
                    }
                });
            }
        });
        assert_eq!(locale::setlocale(LC_ALL, None).as_deref(), Some("C"));
    }
}
