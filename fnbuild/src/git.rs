use log::debug;

use crate::{process, Result};

fn stdout_of(output: std::process::Output) -> Result<String> {
    Ok(String::from_utf8(output.stdout)?.trim().to_owned())
}

/// Returns the abbreviated hash of `HEAD`.
pub fn short_commit_hash() -> Result<String> {
    let hash = stdout_of(process::command!("git", "rev-parse", "--short", "HEAD").output()?)?;
    debug!("git short commit hash: {hash}");
    Ok(hash)
}

/// Returns the name of the checked out branch.
pub fn branch() -> Result<String> {
    let branch = stdout_of(process::command!("git", "rev-parse", "--abbrev-ref", "HEAD").output()?)?;
    debug!("git branch: {branch}");
    if branch == "HEAD" {
        return Err("can not determine the git branch, HEAD is detached".into());
    }
    Ok(branch)
}

/// Describes `HEAD` relative to the most recent tag, falling back to the abbreviated commit hash.
pub fn describe() -> Result<String> {
    let description =
        stdout_of(process::command!("git", "describe", "--tags", "--always").output()?)?;
    debug!("git describe: {description}");
    Ok(description)
}
