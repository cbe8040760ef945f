use crate::{build_arg::BuildArgMap, process};

/// Build argument through which the language templates receive extra packages to install.
pub const ADDITIONAL_PACKAGE: &str = "ADDITIONAL_PACKAGE";

pub struct BuildArgs<'a> {
    pub image: &'a str,
    pub context: &'a str,
    pub no_cache: bool,
    pub squash: bool,
    pub build_args: &'a BuildArgMap,
    pub additional_packages: &'a [String],
}

pub fn build_command(args: &BuildArgs) -> process::Command {
    let mut command = process::command!("docker", "build", "--tag", args.image);

    if args.no_cache {
        command = command.arg("--no-cache");
    }

    if args.squash {
        command = command.arg("--squash");
    }

    for (key, value) in args.build_args {
        command = process::args!(command, "--build-arg", format!("{key}={value}"));
    }

    if !args.additional_packages.is_empty() {
        command = process::args!(
            command,
            "--build-arg",
            format!(
                "{ADDITIONAL_PACKAGE}={packages}",
                packages = args.additional_packages.join(" ")
            )
        );
    }

    command.arg(args.context)
}
