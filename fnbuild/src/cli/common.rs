use std::path::{Path, PathBuf};

use clap::Args;
use constcat::concat;
use log::warn;

use crate::{
    select::NameFilter,
    stack::{self, Stack},
    Result,
};

#[derive(Debug, Args)]
pub struct StackArgs {
    #[arg(short = 'f', long = "yaml", value_name = "PATH", help = concat!("Path to the stack file [default: ", stack::DEFAULT_PATH, "]"))]
    pub yaml: Option<PathBuf>,

    /// Only consider functions whose name matches this wildcard, where `*` matches any sequence of characters.
    #[arg(long = "filter", value_name = "WILDCARD")]
    pub filter: Option<String>,

    /// Only consider functions whose name matches this regular expression.
    #[arg(long = "regex", value_name = "REGEX")]
    pub regex: Option<String>,
}

impl StackArgs {
    pub fn path(&self) -> &Path {
        self.yaml
            .as_deref()
            .unwrap_or(Path::new(stack::DEFAULT_PATH))
    }

    pub fn name_filter(&self) -> Result<NameFilter> {
        Ok(NameFilter::new(
            self.filter.as_deref(),
            self.regex.as_deref(),
        )?)
    }
}

/// Drops the functions that do not match the filter.
pub fn apply_filter(stack: &mut Stack, filter: &NameFilter) {
    if filter.is_empty() {
        return;
    }

    let declared = stack.functions.len();
    stack.retain(|name| filter.matches(name));
    if stack.functions.is_empty() && declared != 0 {
        warn!("none of the {declared} declared functions match the filter");
    }
}
