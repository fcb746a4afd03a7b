//! Repository reference submitted with a build request

use serde::{Deserialize, Serialize};
use std::fmt;

/// What to build: a git URL plus optional branch and tag.
///
/// Nothing is validated: a missing or bad URL or ref shows up later as a
/// failed build. Empty `branch`/`tag` strings are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Anything `git clone` accepts (remote URL or local path)
    #[serde(default)]
    pub url: String,

    /// Branch checked out after the tag
    #[serde(default)]
    pub branch: Option<String>,

    /// Tag checked out right after cloning
    #[serde(default)]
    pub tag: Option<String>,
}

impl Repository {
    /// Reference the default branch of `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            branch: None,
            tag: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Branch to check out, if any
    pub fn branch(&self) -> Option<&str> {
        non_empty(self.branch.as_deref())
    }

    /// Tag to check out, if any
    pub fn tag(&self) -> Option<&str> {
        non_empty(self.tag.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)?;
        if let Some(branch) = self.branch() {
            write!(f, " - branch: {}", branch)?;
        }
        if let Some(tag) = self.tag() {
            write!(f, " - tag: {}", tag)?;
        }
        Ok(())
    }
}
