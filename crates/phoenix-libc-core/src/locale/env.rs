//! Environment lookup for empty locale names.
//!
//! `setlocale(cat, "")` and `newlocale(mask, "", base)` pick their locale
//! from the process environment with the POSIX precedence
//! `LC_ALL` > `LC_<CATEGORY>` > `LANG`, falling back to "C" when none is
//! set. Empty variables count as unset.

use super::Category;

/// Name used when the environment selects nothing.
pub const DEFAULT_LOCALE_NAME: &str = "C";

/// Lookup-by-name collaborator.
pub trait Environment {
    /// Value of `name`, or `None` when it is unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> Environment for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Locale name the environment assigns to `category`.
pub fn locale_name_for(env: &dyn Environment, category: Category) -> String {
    ["LC_ALL", category.name(), "LANG"]
        .into_iter()
        .find_map(|var| env.var(var).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_LOCALE_NAME.to_string())
}
