pub(crate) mod docker;
pub(crate) mod git;
pub(crate) mod process;
pub(crate) mod version;

pub mod build_arg;
pub mod builder;
pub mod cli;
pub mod orchestrator;
pub mod select;
pub mod stack;
pub mod tag;

pub type Result<T, E = Box<dyn std::error::Error + Send + Sync + 'static>> =
    std::result::Result<T, E>;
