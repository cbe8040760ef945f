//! Derives image tags from the state of the git checkout.

use std::{borrow::Cow, fmt};

use clap::ValueEnum;

use crate::{git, Result};

const TAG_PREFIX: char = ':';
const PATH_SEPARATOR: char = '/';
const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Default, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TagFormat {
    /// Use the image exactly as declared.
    #[default]
    Latest,
    /// Append the short commit hash to the declared tag.
    Sha,
    /// Append the branch name and the short commit hash to the declared tag.
    Branch,
    /// Replace the declared tag with the output of `git describe --tags --always`.
    Describe,
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagFormat::Latest => "latest",
            TagFormat::Sha => "sha",
            TagFormat::Branch => "branch",
            TagFormat::Describe => "describe",
        })
    }
}

impl TagFormat {
    /// Queries git in the current directory, unless the format is [`TagFormat::Latest`], and returns the tag to apply
    /// to every image of the run.
    pub fn resolve(self) -> Result<ImageTag> {
        Ok(match self {
            TagFormat::Latest => ImageTag::Declared,
            TagFormat::Sha => ImageTag::Suffix(git::short_commit_hash()?),
            TagFormat::Branch => {
                let branch = git::branch()?.replace(PATH_SEPARATOR, "-");
                let hash = git::short_commit_hash()?;
                ImageTag::Suffix(format!("{branch}-{hash}"))
            }
            TagFormat::Describe => ImageTag::Replace(git::describe()?),
        })
    }
}

/// A resolved [`TagFormat`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum ImageTag {
    /// Keep the image reference as declared.
    #[default]
    Declared,
    /// Append to the declared tag, or to `latest` when there is none.
    Suffix(String),
    /// Replace the declared tag.
    Replace(String),
}

impl ImageTag {
    pub fn apply<'a>(&self, image: &'a str) -> Cow<'a, str> {
        match self {
            ImageTag::Declared => Cow::Borrowed(image),
            ImageTag::Suffix(suffix) => Cow::Owned(with_tag_suffix(image, suffix)),
            ImageTag::Replace(tag) => Cow::Owned(with_tag(image, tag)),
        }
    }
}

/// Splits an image reference into its repository and its tag. A colon only starts a tag when it follows the last
/// slash, otherwise it separates a registry host from its port.
fn split_tag(image: &str) -> (&str, Option<&str>) {
    let path_start = image.rfind(PATH_SEPARATOR).map_or(0, |index| index + 1);
    match image[path_start..].find(TAG_PREFIX) {
        Some(index) => {
            let index = path_start + index;
            (&image[..index], Some(&image[index + TAG_PREFIX.len_utf8()..]))
        }
        None => (image, None),
    }
}

fn with_tag_suffix(image: &str, suffix: &str) -> String {
    let (repository, tag) = split_tag(image);
    let tag = tag.unwrap_or(DEFAULT_TAG);
    format!("{repository}{TAG_PREFIX}{tag}-{suffix}")
}

fn with_tag(image: &str, tag: &str) -> String {
    let (repository, _) = split_tag(image);
    format!("{repository}{TAG_PREFIX}{tag}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tag_works() {
        assert_eq!(split_tag("hello"), ("hello", None));
        assert_eq!(split_tag("hello:0.1"), ("hello", Some("0.1")));
        assert_eq!(
            split_tag("reg.io:5000/org/hello"),
            ("reg.io:5000/org/hello", None)
        );
        assert_eq!(
            split_tag("reg.io:5000/org/hello:0.1"),
            ("reg.io:5000/org/hello", Some("0.1"))
        );
    }

    #[test]
    fn with_tag_suffix_works() {
        assert_eq!(with_tag_suffix("hello", "abc1234"), "hello:latest-abc1234");
        assert_eq!(
            with_tag_suffix("reg.io:5000/hello:0.1", "main-abc1234"),
            "reg.io:5000/hello:0.1-main-abc1234"
        );
    }

    #[test]
    fn with_tag_works() {
        assert_eq!(with_tag("hello", "v1.2.0"), "hello:v1.2.0");
        assert_eq!(
            with_tag("reg.io:5000/hello:0.1", "v1.2.0-3-gabc1234"),
            "reg.io:5000/hello:v1.2.0-3-gabc1234"
        );
    }

    #[test]
    fn latest_resolves_without_git() {
        assert_eq!(TagFormat::Latest.resolve().unwrap(), ImageTag::Declared);
    }

    #[test]
    fn image_tag_apply_works() {
        assert_eq!(ImageTag::Declared.apply("reg.io/hello:0.1"), "reg.io/hello:0.1");
        assert_eq!(
            ImageTag::Suffix("main-abc1234".to_owned()).apply("reg.io/hello"),
            "reg.io/hello:latest-main-abc1234"
        );
        assert_eq!(
            ImageTag::Replace("v1.2.0".to_owned()).apply("reg.io:5000/hello:0.1"),
            "reg.io:5000/hello:v1.2.0"
        );
    }
}
