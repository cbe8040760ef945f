use log::{debug, info};

use super::{BuildArgs, Builder};
use crate::{docker, Result};

pub struct DockerBuilder;

// This conversion is necessary because the build arguments of a function may differ from the build arguments accepted
// by the docker command line abstraction.
fn into_docker_args<'a>(args: BuildArgs<'a>, image: &'a str) -> docker::BuildArgs<'a> {
    let BuildArgs {
        handler,
        no_cache,
        squash,
        build_args,
        build_options,
        ..
    } = args;
    docker::BuildArgs {
        image,
        context: handler,
        no_cache,
        squash,
        build_args,
        additional_packages: build_options,
    }
}

impl Builder for DockerBuilder {
    fn build(&self, args: BuildArgs<'_>) -> Result<()> {
        let image = args.tag.apply(args.image);
        debug!(
            "building function {name:?} ({language}) as {image:?}",
            name = args.name,
            language = args.language
        );

        let command = docker::build_command(&into_docker_args(args, &image));
        if args.shrinkwrap {
            info!(
                "shrinkwrapped function {name:?}, build it with `{command:?}`",
                name = args.name
            );
            return Ok(());
        }

        command.status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_arg::BuildArgMap, tag::ImageTag};

    #[test]
    fn shrinkwrap_does_not_run_docker() {
        let build_args = BuildArgMap::new();
        DockerBuilder
            .build(BuildArgs {
                image: "hello:0.1",
                handler: "./hello",
                name: "hello",
                language: "python3",
                no_cache: false,
                squash: false,
                shrinkwrap: true,
                build_args: &build_args,
                build_options: &[],
                tag: &ImageTag::Declared,
            })
            .unwrap();
    }
}
