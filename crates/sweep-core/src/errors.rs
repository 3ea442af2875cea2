//! Error families raised while loading, resolving and compiling sweeps.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and context carried by every [`SweepError`].
///
/// Codes are stable kebab-case identifiers (`axis-empty`,
/// `duplicate-locator`, ...) that tests and callers match on; messages are
/// for humans only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable code.
    pub code: String,
    /// Human readable diagnostic.
    pub message: String,
    /// Where the error happened: axis, task, locator, path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    /// How to fix the sweep definition, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a payload without context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records where the error happened. A repeated key keeps the newest value.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            write!(f, " | context: [{}]", pairs.join(", "))?;
        }
        match &self.hint {
            Some(hint) => write!(f, " | hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Error type of every sweep crate.
///
/// Variants name the error family. `Config` errors abort compilation before
/// any job reaches the execution engine; `Engine` errors are surfaced from
/// the engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SweepError {
    /// Invalid sweep definition, parameter files or override tables.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Structural problems while assembling the job graph.
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Failures reported by the execution engine.
    #[error("engine error: {0}")]
    Engine(ErrorInfo),
    /// Serialization, schema and file system errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl SweepError {
    /// Returns the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SweepError::Config(info)
            | SweepError::Graph(info)
            | SweepError::Engine(info)
            | SweepError::Serde(info) => info,
        }
    }

    /// Returns true for configuration errors.
    pub fn is_config(&self) -> bool {
        matches!(self, SweepError::Config(_))
    }

    /// Adds a context entry while keeping the error family.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            SweepError::Config(info) => SweepError::Config(info.with_context(key, value)),
            SweepError::Graph(info) => SweepError::Graph(info.with_context(key, value)),
            SweepError::Engine(info) => SweepError::Engine(info.with_context(key, value)),
            SweepError::Serde(info) => SweepError::Serde(info.with_context(key, value)),
        }
    }
}
