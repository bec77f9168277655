//! Environment lookup helpers shared by the `from_env` constructors

use std::env;

use crate::{Error, Result};

/// First non-empty value among the given variable names
pub fn optional(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Like [`optional`] but a missing value is a configuration error naming every alias
pub fn require(names: &[&str]) -> Result<String> {
    optional(names).ok_or_else(|| {
        Error::Configuration(format!(
            "{} environment variable not found",
            names.join(" or ")
        ))
    })
}

/// Parse a variable, falling back to `default` when unset
pub fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match optional(&[name]) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Configuration(format!("{} has an invalid value: {}", name, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_names_all_aliases() {
        let err = require(&["FRAG_TEST_MISSING_A", "FRAG_TEST_MISSING_B"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: FRAG_TEST_MISSING_A or FRAG_TEST_MISSING_B environment variable not found"
        );
    }

    #[test]
    fn test_parse_or_default_when_unset() {
        let dims: usize = parse_or("FRAG_TEST_MISSING_DIMS", 1536).unwrap();
        assert_eq!(dims, 1536);
    }
}
