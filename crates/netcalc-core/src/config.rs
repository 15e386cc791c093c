//! Environment configuration
//!
//! Settings are read from environment variables; command-line flags take
//! precedence and are applied by the caller.

use crate::{NetcalcError, Result};
use std::env;
use tracing::debug;

/// Prefix length applied when an input omits `/prefix`
pub const DEFAULT_PREFIX: u8 = 24;

/// Overrides [`DEFAULT_PREFIX`]
pub const PREFIX_ENV: &str = "NETCALC_DEFAULT_PREFIX";

/// Log filter directive (e.g. `debug`, `netcalc_cidr=trace`)
pub const LOG_ENV: &str = "NETCALC_LOG";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix used when the input has none
    pub default_prefix: u8,
    /// Log filter, if configured
    pub log_filter: Option<String>,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_filter = log_filter_from_lookup(&lookup);
        let default_prefix = match non_empty(&lookup, PREFIX_ENV) {
            Some(value) => parse_prefix(&value)?,
            None => DEFAULT_PREFIX,
        };

        debug!(default_prefix, ?log_filter, "loaded settings");

        Ok(Self {
            default_prefix,
            log_filter,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_prefix: DEFAULT_PREFIX,
            log_filter: None,
        }
    }
}

/// Log filter from the process environment
///
/// Independent of the other settings, so logging can be set up before
/// they are validated.
pub fn log_filter_from_env() -> Option<String> {
    log_filter_from_lookup(|key| env::var(key).ok())
}

/// Log filter through an arbitrary variable lookup
pub fn log_filter_from_lookup<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(&lookup, LOG_ENV)
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_prefix(value: &str) -> Result<u8> {
    let digits = value.trim();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NetcalcError::Config(format!(
            "{} must be a number, got '{}'",
            PREFIX_ENV, value
        )));
    }

    let prefix: u32 = digits.parse().map_err(|_| {
        NetcalcError::Config(format!("{} is too large: '{}'", PREFIX_ENV, value))
    })?;

    if prefix > 32 {
        return Err(NetcalcError::InvalidPrefix(prefix));
    }

    Ok(prefix as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_prefix, 24);
    }

    #[test]
    fn test_prefix_override() {
        let settings =
            Settings::from_lookup(lookup_from(&[(PREFIX_ENV, "16"), (LOG_ENV, "debug")])).unwrap();
        assert_eq!(settings.default_prefix, 16);
        assert_eq!(settings.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_empty_values_ignored() {
        let settings =
            Settings::from_lookup(lookup_from(&[(PREFIX_ENV, " "), (LOG_ENV, "")])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(matches!(
            Settings::from_lookup(lookup_from(&[(PREFIX_ENV, "33")])),
            Err(NetcalcError::InvalidPrefix(33))
        ));
        assert!(matches!(
            Settings::from_lookup(lookup_from(&[(PREFIX_ENV, "abc")])),
            Err(NetcalcError::Config(_))
        ));
    }

    #[test]
    fn test_prefix_must_be_plain_digits() {
        for bad in ["+16", "-0", "1 6", "0x10"] {
            assert!(
                matches!(
                    Settings::from_lookup(lookup_from(&[(PREFIX_ENV, bad)])),
                    Err(NetcalcError::Config(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }

        let settings = Settings::from_lookup(lookup_from(&[(PREFIX_ENV, " 08 ")])).unwrap();
        assert_eq!(settings.default_prefix, 8);
    }

    #[test]
    fn test_log_filter_ignores_bad_prefix() {
        let lookup = lookup_from(&[(PREFIX_ENV, "99"), (LOG_ENV, "netcalc_cidr=debug")]);
        assert_eq!(
            log_filter_from_lookup(&lookup).as_deref(),
            Some("netcalc_cidr=debug")
        );
        assert!(Settings::from_lookup(&lookup).is_err());

        assert_eq!(log_filter_from_lookup(lookup_from(&[(LOG_ENV, "  ")])), None);
    }
}
