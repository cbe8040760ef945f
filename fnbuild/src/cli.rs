mod build;
mod common;
mod list;

use clap::{Parser, Subcommand};

use crate::{version::VERSION, Result};

#[derive(Debug, Parser)]
#[command(version = VERSION, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the container images of the functions in the stack file
    Build(build::BuildArgs),

    /// List the functions in the stack file and whether they would be built
    List(common::StackArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Build(args) => {
                build::build(args)?;
            }
            Commands::List(args) => {
                list::list(args)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_accepts_stack_args() {
        let cli = Cli::try_parse_from(["fnbuild", "list", "-f", "functions.yml"]).unwrap();
        assert!(matches!(cli.command, Commands::List(_)));
    }
}
