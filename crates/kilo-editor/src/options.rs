//! Viewer options: the `--set` system.
//!
//! Options are given on the command line as `--set name=value`. Parsing
//! is split in two: [`parse_set`] turns the text into a [`SetDirective`],
//! and [`Options::apply`] validates it against the known options.
//!
//! | Full name | Abbrev | Type    | Default | Range   |
//! |-----------|--------|---------|---------|---------|
//! | `tabstop` | `ts`   | integer | 8       | 1..=32  |

use thiserror::Error;

use crate::document::DEFAULT_TAB_STOP;

/// Smallest accepted tab stop.
pub const MIN_TAB_STOP: usize = 1;

/// Largest accepted tab stop.
pub const MAX_TAB_STOP: usize = 32;

/// A parsed `name=value` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDirective {
    pub name: String,
    pub value: String,
}

/// Why a directive was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),

    #[error("option {0} needs a value (name=value)")]
    MissingValue(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: String,
        value: usize,
        min: usize,
        max: usize,
    },
}

/// Returns `true` if `name` is a known numeric option (full name or abbreviation).
#[must_use]
pub fn is_numeric_option(name: &str) -> bool {
    matches!(name, "tabstop" | "ts")
}

/// Parse one `name=value` argument.
///
/// # Errors
///
/// [`OptionError::MissingValue`] if there is no `=` or nothing after it.
pub fn parse_set(arg: &str) -> Result<SetDirective, OptionError> {
    let arg = arg.trim();
    match arg.split_once('=') {
        Some((name, value)) if !value.is_empty() => Ok(SetDirective {
            name: name.to_string(),
            value: value.to_string(),
        }),
        Some((name, _)) => Err(OptionError::MissingValue(name.to_string())),
        None => Err(OptionError::MissingValue(arg.to_string())),
    }
}

/// Viewer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Columns per tab stop.
    pub tabstop: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tabstop: DEFAULT_TAB_STOP,
        }
    }
}

impl Options {
    /// Parse and apply one `name=value` argument.
    ///
    /// # Errors
    ///
    /// See [`parse_set`] and [`apply`](Self::apply).
    pub fn set(&mut self, arg: &str) -> Result<(), OptionError> {
        let directive = parse_set(arg)?;
        self.apply(&directive)
    }

    /// Apply a parsed directive. On error, nothing changes.
    ///
    /// # Errors
    ///
    /// Unknown names, non-numeric values, and values outside the
    /// option's range.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<(), OptionError> {
        let SetDirective { name, value } = directive;
        if !is_numeric_option(name) {
            return Err(OptionError::Unknown(name.clone()));
        }

        let n: usize = value.parse().map_err(|_| OptionError::InvalidValue {
            name: name.clone(),
            value: value.clone(),
        })?;
        if !(MIN_TAB_STOP..=MAX_TAB_STOP).contains(&n) {
            return Err(OptionError::OutOfRange {
                name: name.clone(),
                value: n,
                min: MIN_TAB_STOP,
                max: MAX_TAB_STOP,
            });
        }

        self.tabstop = n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── parse_set ─────────────────────────────────────────────────────────

    #[test]
    fn parse_assignment() {
        assert_eq!(
            parse_set("tabstop=4"),
            Ok(SetDirective {
                name: "tabstop".into(),
                value: "4".into(),
            })
        );
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(parse_set("  ts=2 ").unwrap().value, "2");
    }

    #[test]
    fn parse_without_value() {
        assert_eq!(
            parse_set("tabstop"),
            Err(OptionError::MissingValue("tabstop".into()))
        );
        assert_eq!(
            parse_set("tabstop="),
            Err(OptionError::MissingValue("tabstop".into()))
        );
    }

    // ── Options ───────────────────────────────────────────────────────────

    #[test]
    fn default_tabstop_is_eight() {
        assert_eq!(Options::default().tabstop, 8);
    }

    #[test]
    fn set_full_name_and_abbrev() {
        let mut opts = Options::default();
        opts.set("tabstop=4").unwrap();
        assert_eq!(opts.tabstop, 4);
        opts.set("ts=2").unwrap();
        assert_eq!(opts.tabstop, 2);
    }

    #[test]
    fn set_range_bounds() {
        let mut opts = Options::default();
        opts.set("ts=1").unwrap();
        opts.set("ts=32").unwrap();
        assert_eq!(opts.tabstop, 32);

        assert_eq!(
            opts.set("ts=0"),
            Err(OptionError::OutOfRange {
                name: "ts".into(),
                value: 0,
                min: 1,
                max: 32,
            })
        );
        assert!(opts.set("ts=33").is_err());
        assert_eq!(opts.tabstop, 32);
    }

    #[test]
    fn set_unknown_option() {
        let mut opts = Options::default();
        assert_eq!(
            opts.set("number=1"),
            Err(OptionError::Unknown("number".into()))
        );
    }

    #[test]
    fn set_non_numeric_value() {
        let mut opts = Options::default();
        assert_eq!(
            opts.set("ts=wide"),
            Err(OptionError::InvalidValue {
                name: "ts".into(),
                value: "wide".into(),
            })
        );
        assert!(opts.set("ts=-1").is_err());
        assert_eq!(opts, Options::default());
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            OptionError::Unknown("foo".into()).to_string(),
            "unknown option: foo"
        );
        assert_eq!(
            OptionError::OutOfRange {
                name: "tabstop".into(),
                value: 40,
                min: 1,
                max: 32,
            }
            .to_string(),
            "tabstop must be between 1 and 32, got 40"
        );
    }
}
