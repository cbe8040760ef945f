//! Parsing of `key=value` build arguments as passed through `--build-arg`.

use std::{collections::BTreeMap, fmt};

pub type BuildArgMap = BTreeMap<String, String>;

const SEPARATOR: char = '=';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildArgError {
    /// The token does not contain a separator.
    Malformed,
    /// The token starts with the separator.
    EmptyKey,
}

impl fmt::Display for BuildArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildArgError::Malformed => "each build-arg must take the form key=value",
            BuildArgError::EmptyKey => "build-arg must have a non-empty key",
        })
    }
}

impl std::error::Error for BuildArgError {}

/// Splits a single token on its first separator. Any further separators are part of the value.
pub fn parse_one(token: &str) -> Result<(String, String), BuildArgError> {
    let (key, value) = token
        .split_once(SEPARATOR)
        .ok_or(BuildArgError::Malformed)?;
    if key.is_empty() {
        return Err(BuildArgError::EmptyKey);
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Parses every token into a map. Parsing stops at the first invalid token. When a key occurs more than once, the
/// last occurrence wins.
pub fn parse<I, S>(tokens: I) -> Result<BuildArgMap, BuildArgError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| parse_one(token.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_parts() {
        let map = parse(["k=v"]).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["k"], "v");
    }

    #[test]
    fn parse_no_separator() {
        let error = parse(["kv"]).unwrap_err();
        assert_eq!(error, BuildArgError::Malformed);
        assert_eq!(
            error.to_string(),
            "each build-arg must take the form key=value"
        );
    }

    #[test]
    fn parse_empty_key() {
        let error = parse(["=v"]).unwrap_err();
        assert_eq!(error, BuildArgError::EmptyKey);
        assert_eq!(error.to_string(), "build-arg must have a non-empty key");
    }

    #[test]
    fn parse_multiple_separators() {
        let map = parse(["k=v=z"]).unwrap();
        assert_eq!(map["k"], "v=z");
    }

    #[test]
    fn parse_empty_value() {
        let map = parse(["k="]).unwrap();
        assert_eq!(map["k"], "");
    }

    #[test]
    fn parse_one_entry_per_unique_key() {
        let map = parse(["a=1", "b=2", "a=3", "c=4"]).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map["a"], "3");
        assert_eq!(map["b"], "2");
        assert_eq!(map["c"], "4");
    }

    #[test]
    fn parse_stops_at_first_invalid_token() {
        assert_eq!(
            parse(["a=1", "=2", "b"]).unwrap_err(),
            BuildArgError::EmptyKey
        );
        assert_eq!(
            parse(["a=1", "b", "=2"]).unwrap_err(),
            BuildArgError::Malformed
        );
    }

    #[test]
    fn parse_nothing() {
        assert!(parse(std::iter::empty::<&str>()).unwrap().is_empty());
    }
}
