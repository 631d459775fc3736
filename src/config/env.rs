//! `${NAME}` references in config values.

use regex::Regex;
use std::sync::LazyLock;

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{(?P<name>\w+)\}$").unwrap_or_else(|e| panic!("invalid env pattern: {e}"))
});

/// Resolve a config value that may reference the local environment.
///
/// `${NAME}` becomes the value of `NAME` (empty when unset); anything else
/// is returned verbatim.
pub fn resolve_env_value(value: &str) -> String {
    match ENV_REFERENCE.captures(value) {
        Some(caps) => std::env::var(&caps["name"]).unwrap_or_default(),
        None => value.to_string(),
    }
}
