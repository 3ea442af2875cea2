//! Hierarchical job locators.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Path-like identifier of a job within the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(Vec<String>);

impl Locator {
    /// Creates a locator from its segments.
    pub fn new<S, I>(segments: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the segments in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns a new locator with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Locator {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Locator(segments)
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}
