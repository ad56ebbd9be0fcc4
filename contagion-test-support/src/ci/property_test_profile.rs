//! Property-test run profile shared by every contagion suite.
//!
//! CI raises case counts through `PROGTEST_CASES`; `CONTAGION_PBT_FORK`
//! isolates cases in subprocesses when a suite needs it.

use std::env;

/// Environment variable overriding proptest case counts.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable toggling proptest process forking.
pub const CONTAGION_PBT_FORK_ENV_KEY: &str = "CONTAGION_PBT_FORK";

/// Resolved case count and fork flag for a property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Reads overrides from the process environment.
    ///
    /// Unparseable overrides are logged and replaced by the defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use contagion_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self::load_with_lookup(default_cases, default_fork, &|key| env::var(key).ok())
    }

    fn load_with_lookup<F>(default_cases: u32, default_fork: bool, lookup: &F) -> Self
    where
        F: Fn(&'static str) -> Option<String>,
    {
        Self {
            cases: resolve(lookup, PROGTEST_CASES_ENV_KEY, default_cases, parse_cases),
            fork: resolve(lookup, CONTAGION_PBT_FORK_ENV_KEY, default_fork, parse_flag),
        }
    }

    /// Cases to run per property.
    #[must_use]
    pub const fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether cases run in forked subprocesses.
    #[must_use]
    pub const fn fork(&self) -> bool {
        self.fork
    }
}

fn resolve<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
    parse: fn(&str) -> Result<T, &'static str>,
) -> T
where
    F: Fn(&'static str) -> Option<String>,
    T: Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason,
            "ignoring invalid property-test override",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, &'static str> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("cases must be positive"),
        Ok(cases) => Ok(cases),
        Err(_) => Err("cases must be an unsigned integer"),
    }
}

fn parse_flag(raw: &str) -> Result<bool, &'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected true/false, 1/0, yes/no or on/off"),
    }
}
