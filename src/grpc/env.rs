//! Helpers for reading configuration from environment-style lookups.

use std::time::Duration;

use crate::grpc::error::ConfigError;

/// Reads a single configuration variable. `std::env::var(..).ok()` in the binaries, a map in tests.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn millis(lookup: Lookup<'_>, var: &'static str) -> Result<Option<Duration>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|source| ConfigError::InvalidMillis {
                    var,
                    value: value.clone(),
                    source,
                })
        })
        .transpose()
}
