use clap::Args;
use log::debug;

use super::common::{self, StackArgs};
use crate::{
    build_arg,
    builder::DockerBuilder,
    orchestrator::{self, BuildOptions, BuildPolicy, Report},
    stack::{FunctionSpec, Stack},
    tag::TagFormat,
    Result,
};

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Image to build when building a single function without a stack file.
    #[arg(long = "image")]
    pub image: Option<String>,

    /// Directory with the function's source when building a single function without a stack file.
    #[arg(long = "handler")]
    pub handler: Option<String>,

    /// Name of the function when building a single function without a stack file.
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Language template of the function when building a single function without a stack file.
    #[arg(long = "lang")]
    pub language: Option<String>,

    /// Do not use the build cache.
    #[arg(long = "no-cache", default_value_t)]
    pub no_cache: bool,

    /// Squash the image layers into a single layer.
    #[arg(long = "squash", default_value_t)]
    pub squash: bool,

    /// Prepare the builds without running them.
    #[arg(long = "shrinkwrap", default_value_t)]
    pub shrinkwrap: bool,

    /// Build argument passed to every build, may be repeated. Takes precedence over the build arguments in the stack
    /// file.
    #[arg(short = 'b', long = "build-arg", value_name = "KEY=VALUE")]
    pub build_args: Vec<String>,

    /// Additional package to install in every image, may be repeated.
    #[arg(short = 'o', long = "build-option", value_name = "OPTION")]
    pub build_options: Vec<String>,

    /// How to derive the image tag.
    #[arg(long = "tag", value_enum, default_value_t)]
    pub tag: TagFormat,

    /// The number of builds to run at the same time.
    #[arg(long = "parallel", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub parallel: u32,

    /// Keep starting builds after a build has failed instead of stopping at the first failure.
    #[arg(long = "shuttle-errors", default_value_t)]
    pub shuttle_errors: bool,
}

impl BuildArgs {
    fn single_function(&self) -> Result<Option<FunctionSpec>> {
        let flags = [
            ("--image", &self.image),
            ("--handler", &self.handler),
            ("--name", &self.name),
            ("--lang", &self.language),
        ];

        if flags.iter().all(|(_, value)| value.is_none()) {
            return Ok(None);
        }

        let missing = flags
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(flag, _)| *flag)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(format!(
                "building a single function requires {missing}",
                missing = missing.join(", ")
            )
            .into());
        }

        Ok(Some(FunctionSpec::new(
            self.name.as_deref().unwrap_or_default(),
            self.handler.as_deref().unwrap_or_default(),
            self.image.as_deref().unwrap_or_default(),
            self.language.as_deref().unwrap_or_default(),
        )))
    }

    /// Reads the stack file unless a single function is described by the flags and no stack file was given explicitly.
    fn stack(&self) -> Result<Stack> {
        let mut stack = match &self.stack.yaml {
            Some(path) => Stack::load(path)?,
            None => match self.single_function()? {
                Some(function) => {
                    debug!("building single function {:?}", function.name);
                    Stack::from_functions([function])
                }
                None => Stack::load(self.stack.path())?,
            },
        };
        common::apply_filter(&mut stack, &self.stack.name_filter()?);
        Ok(stack)
    }

    fn policy(&self) -> Result<BuildPolicy> {
        Ok(
            BuildPolicy::new(self.parallel as usize, self.shuttle_errors).with_options(
                BuildOptions {
                    no_cache: self.no_cache,
                    squash: self.squash,
                    shrinkwrap: self.shrinkwrap,
                    build_args: build_arg::parse(&self.build_args)?,
                    build_options: self.build_options.clone(),
                    tag: self.tag.resolve()?,
                },
            ),
        )
    }
}

pub fn build(args: BuildArgs) -> Result<()> {
    let policy = args.policy()?;
    let stack = args.stack()?;

    match orchestrator::run(&stack.functions, &policy, &DockerBuilder) {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(error) => {
            if let Some(report) = error.report() {
                print_summary(report);
            }
            Err(error.into())
        }
    }
}

fn print_summary(report: &Report) {
    use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

    if report.outcomes.is_empty() {
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["function", "result", "duration"]
                .into_iter()
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold)),
        );

    for outcome in &report.outcomes {
        let result = match &outcome.result {
            Ok(()) => Cell::new("built").fg(Color::Green),
            Err(failure) => Cell::new(failure).fg(Color::Red),
        };
        table.add_row([
            Cell::new(&outcome.name),
            result,
            Cell::new(format!("{:.1?}", outcome.elapsed)),
        ]);
    }

    println!("{table}");

    if report.not_started != 0 {
        println!(
            "{count} functions were not built because an earlier build failed, pass `--shuttle-errors` to build them anyway",
            count = report.not_started
        );
    }
}
