//! Decides which of the declared functions get built.

use std::collections::BTreeMap;

use regex::Regex;

use crate::stack::FunctionSpec;

/// Returns the names of the functions that have no language. Building any of them is impossible because their
/// template was never resolved, so their presence is an error for the whole run.
pub fn missing_language(functions: &BTreeMap<String, FunctionSpec>) -> Vec<&str> {
    functions
        .iter()
        .filter(|(_, function)| function.language.is_empty())
        .map(|(name, _)| name.as_str())
        .collect()
}

/// Returns every function that has a language and is not marked with `skip_build`.
pub fn select(functions: &BTreeMap<String, FunctionSpec>) -> Vec<&FunctionSpec> {
    functions
        .values()
        .filter(|function| !function.language.is_empty() && !function.skip_build)
        .collect()
}

/// Restricts a run to the functions whose names match a wildcard and/or a regular expression.
#[derive(Debug, Default, Clone)]
pub struct NameFilter {
    wildcard: Option<Regex>,
    regex: Option<Regex>,
}

impl NameFilter {
    /// `wildcard` must match the whole name where `*` matches any sequence of characters. `regex` may match any part
    /// of the name.
    pub fn new(wildcard: Option<&str>, regex: Option<&str>) -> Result<Self, regex::Error> {
        Ok(Self {
            wildcard: wildcard.map(wildcard_to_regex).transpose()?,
            regex: regex.map(Regex::new).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.wildcard.is_none() && self.regex.is_none()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.wildcard.as_ref().map_or(true, |re| re.is_match(name))
            && self.regex.as_ref().map_or(true, |re| re.is_match(name))
    }
}

fn wildcard_to_regex(wildcard: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(wildcard.len() + 2);
    pattern.push('^');
    for (index, part) in wildcard.split('*').enumerate() {
        if index != 0 {
            pattern.push_str(".*");
        }
        pattern.push_str(&regex::escape(part));
    }
    pattern.push('$');
    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Stack;

    fn stack() -> Stack {
        Stack::from_functions([
            FunctionSpec::new("build-me", "./a", "a", "go"),
            FunctionSpec::new("skip-me", "./b", "b", "go").with_skip_build(true),
            FunctionSpec::new("no-lang", "./c", "c", ""),
            FunctionSpec::new("no-lang-skip", "./d", "d", "").with_skip_build(true),
        ])
    }

    #[test]
    fn missing_language_ignores_skip_build() {
        assert_eq!(
            missing_language(&stack().functions),
            ["no-lang", "no-lang-skip"]
        );
    }

    #[test]
    fn select_eligible_functions() {
        let stack = stack();
        let selected = select(&stack.functions)
            .into_iter()
            .map(|function| function.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(selected, ["build-me"]);
    }

    #[test]
    fn select_all_skipped() {
        let stack = Stack::from_functions([
            FunctionSpec::new("a", "./a", "a", "go").with_skip_build(true),
            FunctionSpec::new("b", "./b", "b", "go").with_skip_build(true),
        ]);
        assert!(select(&stack.functions).is_empty());
        assert!(missing_language(&stack.functions).is_empty());
    }

    #[test]
    fn name_filter_wildcard() {
        let filter = NameFilter::new(Some("api-*"), None).unwrap();
        assert!(filter.matches("api-users"));
        assert!(filter.matches("api-"));
        assert!(!filter.matches("web-api-users"));
        assert!(!filter.matches("api"));

        let filter = NameFilter::new(Some("*.v1"), None).unwrap();
        assert!(filter.matches("users.v1"));
        assert!(!filter.matches("usersxv1"));
    }

    #[test]
    fn name_filter_regex() {
        let filter = NameFilter::new(None, Some("users|orders")).unwrap();
        assert!(filter.matches("api-users"));
        assert!(filter.matches("orders"));
        assert!(!filter.matches("payments"));
    }

    #[test]
    fn name_filter_combined() {
        let filter = NameFilter::new(Some("api-*"), Some("users$")).unwrap();
        assert!(filter.matches("api-users"));
        assert!(!filter.matches("api-orders"));
        assert!(!filter.matches("web-users"));
    }

    #[test]
    fn name_filter_empty_matches_everything() {
        let filter = NameFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches("anything"));
    }

    #[test]
    fn name_filter_invalid_regex() {
        assert!(NameFilter::new(None, Some("(")).is_err());
    }
}
