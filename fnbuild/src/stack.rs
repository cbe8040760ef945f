//! The stack file declares the functions to build.
//!
//! ```yaml
//! functions:
//!   hello:
//!     lang: python3
//!     handler: ./hello
//!     image: registry.example.com/hello:0.1
//!     build_args:
//!       PIP_INDEX: https://pypi.example.com
//! ```
//!
//! Keys that are not relevant to building, such as `provider` or `version`, are ignored.

use std::{
    collections::BTreeMap,
    fmt, io,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;

use crate::build_arg::BuildArgMap;

pub const DEFAULT_PATH: &str = "stack.yml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FunctionSpec {
    /// Populated from the key under which the function is declared.
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub handler: String,

    #[serde(default)]
    pub image: String,

    /// An empty language means the function can not be built.
    #[serde(default, rename = "lang")]
    pub language: String,

    #[serde(default)]
    pub skip_build: bool,

    #[serde(default)]
    pub build_args: BuildArgMap,

    #[serde(default)]
    pub build_options: Vec<String>,
}

impl FunctionSpec {
    pub fn new(
        name: impl Into<String>,
        handler: impl Into<String>,
        image: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            handler: handler.into(),
            image: image.into(),
            language: language.into(),
            ..Default::default()
        }
    }

    pub fn with_skip_build(self, skip_build: bool) -> Self {
        Self { skip_build, ..self }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Stack {
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionSpec>,
}

impl Stack {
    pub fn from_functions<I: IntoIterator<Item = FunctionSpec>>(functions: I) -> Self {
        Self {
            functions: functions
                .into_iter()
                .map(|function| (function.name.clone(), function))
                .collect(),
        }
    }

    pub fn parse(source: &str) -> Result<Self, Error> {
        let mut stack: Stack = serde_yaml::from_str(source).map_err(|error| Error {
            path: None,
            kind: ErrorKind::Yaml(error),
        })?;
        for (name, function) in &mut stack.functions {
            function.name.clone_from(name);
        }
        Ok(stack)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("loading stack file {path:?}...");
        let source = std::fs::read_to_string(path).map_err(|error| Error {
            path: Some(path.to_owned()),
            kind: ErrorKind::Io(error),
        })?;
        let stack = Self::parse(&source).map_err(|error| Error {
            path: Some(path.to_owned()),
            ..error
        })?;
        debug!(
            "stack file {path:?} declares {count} functions",
            count = stack.functions.len()
        );
        Ok(stack)
    }

    /// Retains only the functions for which `predicate` returns true.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut predicate: F) {
        self.functions.retain(|name, _| predicate(name));
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    Io(io::Error),
    Yaml(serde_yaml::Error),
}

#[derive(Debug)]
pub struct Error {
    pub path: Option<PathBuf>,
    pub kind: ErrorKind,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "failed to load stack file {path:?}: ")?,
            None => f.write_str("failed to parse stack file: ")?,
        }
        match &self.kind {
            ErrorKind::Io(error) => write!(f, "{error}"),
            ErrorKind::Yaml(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(error) => Some(error),
            ErrorKind::Yaml(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stack_file() {
        let stack = Stack::parse(
            r#"
version: 1.0
provider:
  name: openfaas
functions:
  first:
    lang: python3
    handler: ./first
    image: registry.io/first:0.1
    build_args:
      PIP_INDEX: https://pypi.example.com
    build_options: [dev, gcc]
  second:
    lang: go
    handler: ./second
    image: second
    skip_build: true
  third:
    handler: ./third
    image: third
"#,
        )
        .unwrap();

        assert_eq!(stack.functions.len(), 3);

        let first = &stack.functions["first"];
        assert_eq!(first.name, "first");
        assert_eq!(first.language, "python3");
        assert_eq!(first.handler, "./first");
        assert_eq!(first.image, "registry.io/first:0.1");
        assert!(!first.skip_build);
        assert_eq!(first.build_args["PIP_INDEX"], "https://pypi.example.com");
        assert_eq!(first.build_options, ["dev", "gcc"]);

        let second = &stack.functions["second"];
        assert_eq!(second.name, "second");
        assert!(second.skip_build);

        let third = &stack.functions["third"];
        assert_eq!(third.language, "");
    }

    #[test]
    fn parse_stack_file_without_functions() {
        let stack = Stack::parse("version: 1.0\n").unwrap();
        assert!(stack.functions.is_empty());
    }

    #[test]
    fn parse_invalid_stack_file() {
        let error = Stack::parse("functions: [1, 2]").unwrap_err();
        assert!(error.path.is_none());
        assert!(matches!(error.kind, ErrorKind::Yaml(_)));
        assert!(error
            .to_string()
            .starts_with("failed to parse stack file: "));
    }

    #[test]
    fn load_missing_stack_file() {
        let path = Path::new("/nonexistent/stack.yml");
        let error = Stack::load(path).unwrap_err();
        assert_eq!(error.path.as_deref(), Some(path));
        assert!(matches!(error.kind, ErrorKind::Io(_)));
    }

    #[test]
    fn retain_functions() {
        let mut stack = Stack::from_functions([
            FunctionSpec::new("a", "./a", "a", "go"),
            FunctionSpec::new("b", "./b", "b", "go"),
        ]);
        stack.retain(|name| name == "b");
        assert_eq!(stack.functions.keys().collect::<Vec<_>>(), ["b"]);
    }
}
