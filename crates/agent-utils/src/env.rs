//! Environment variable helpers

use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// A variable was present but could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value '{value}' for {key}: {reason}")]
pub struct EnvError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Look up `key` through `lookup` and parse it
///
/// Missing and blank variables yield `Ok(None)`. `lookup` is usually
/// `|k| std::env::var(k).ok()`; tests pass a map instead.
pub fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| EnvError {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_present() {
        let lookup = lookup_from(&[("POOL", " 12 ")]);
        assert_eq!(parse_var::<u32, _>(&lookup, "POOL"), Ok(Some(12)));
    }

    #[test]
    fn test_missing_and_blank() {
        let lookup = lookup_from(&[("BLANK", "  ")]);
        assert_eq!(parse_var::<u32, _>(&lookup, "BLANK"), Ok(None));
        assert_eq!(parse_var::<u32, _>(&lookup, "MISSING"), Ok(None));
    }

    #[test]
    fn test_invalid_value() {
        let lookup = lookup_from(&[("POOL", "many")]);
        let err = parse_var::<u32, _>(&lookup, "POOL").unwrap_err();
        assert_eq!(err.key, "POOL");
        assert!(err.to_string().contains("many"));
    }
}
