use std::fmt;

use super::common::StackArgs;
use crate::{
    select::NameFilter,
    stack::{FunctionSpec, Stack},
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Build,
    Skip,
    MissingLanguage,
    Filtered,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Build => "build",
            Status::Skip => "skip",
            Status::MissingLanguage => "missing language",
            Status::Filtered => "filtered",
        })
    }
}

fn status(function: &FunctionSpec, filter: &NameFilter) -> Status {
    if !filter.matches(&function.name) {
        Status::Filtered
    } else if function.language.is_empty() {
        Status::MissingLanguage
    } else if function.skip_build {
        Status::Skip
    } else {
        Status::Build
    }
}

pub fn list(args: StackArgs) -> Result<()> {
    use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

    let stack = Stack::load(args.path())?;
    let filter = args.name_filter()?;

    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["name", "lang", "image", "handler", "status"]
                .into_iter()
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold)),
        );

    for function in stack.functions.values() {
        let status = status(function, &filter);
        let status_cell = match status {
            Status::Build => Cell::new(status).fg(Color::Green),
            Status::MissingLanguage => Cell::new(status).fg(Color::Red),
            Status::Skip | Status::Filtered => Cell::new(status),
        };
        table.add_row([
            Cell::new(&function.name),
            Cell::new(&function.language),
            Cell::new(&function.image),
            Cell::new(&function.handler),
            status_cell,
        ]);
    }

    println!("{table}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_works() {
        let filter = NameFilter::new(Some("api-*"), None).unwrap();

        let function = FunctionSpec::new("api-users", "./users", "users", "go");
        assert_eq!(status(&function, &filter), Status::Build);
        assert_eq!(
            status(&function.clone().with_skip_build(true), &filter),
            Status::Skip
        );

        let function = FunctionSpec::new("api-orders", "./orders", "orders", "");
        assert_eq!(status(&function, &filter), Status::MissingLanguage);

        let function = FunctionSpec::new("web", "./web", "web", "");
        assert_eq!(status(&function, &filter), Status::Filtered);
    }
}
