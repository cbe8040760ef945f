mod docker;

pub use docker::*;

use crate::{build_arg::BuildArgMap, tag::ImageTag, Result};

/// Everything needed to build the image of a single function.
#[derive(Debug, Clone, Copy)]
pub struct BuildArgs<'a> {
    pub image: &'a str,
    pub handler: &'a str,
    pub name: &'a str,
    pub language: &'a str,
    pub no_cache: bool,
    pub squash: bool,
    pub shrinkwrap: bool,
    pub build_args: &'a BuildArgMap,
    pub build_options: &'a [String],
    pub tag: &'a ImageTag,
}

/// Builds the image of a single function. A builder is shared by all workers of a run, hence the `Sync` bound.
pub trait Builder: Sync {
    fn build(&self, args: BuildArgs<'_>) -> Result<()>;
}

impl<F> Builder for F
where
    F: Fn(BuildArgs<'_>) -> Result<()> + Sync,
{
    fn build(&self, args: BuildArgs<'_>) -> Result<()> {
        self(args)
    }
}
