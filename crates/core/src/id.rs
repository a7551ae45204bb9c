//! Namespaced identifiers.
//!
//! Blocks and items are addressed by `namespace:path` strings such as
//! `minecraft:hopper`. The item catalog is keyed by namespace first, so the
//! two halves are kept apart after parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace assumed when an identifier omits one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Error returned when parsing an invalid [`NamespacedId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NamespacedIdError {
    message: String,
}

impl NamespacedIdError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An identifier of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespacedId {
    namespace: String,
    path: String,
}

impl NamespacedId {
    /// Parse an identifier, falling back to [`DEFAULT_NAMESPACE`].
    pub fn parse(input: &str) -> Result<Self, NamespacedIdError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(NamespacedIdError::new("identifier cannot be empty"));
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns, p),
            None => (DEFAULT_NAMESPACE, input),
        };

        validate_namespace(namespace)?;
        validate_path(path)?;

        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Identifier namespace (`minecraft` for vanilla content).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier path (`hopper` in `minecraft:hopper`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Compare against a raw `namespace:path` string without allocating.
    pub fn matches(&self, raw: &str) -> bool {
        match raw.split_once(':') {
            Some((ns, p)) => ns == self.namespace && p == self.path,
            None => self.namespace == DEFAULT_NAMESPACE && raw == self.path,
        }
    }
}

impl fmt::Display for NamespacedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for NamespacedId {
    type Err = NamespacedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NamespacedId {
    type Error = NamespacedIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NamespacedId> for String {
    fn from(value: NamespacedId) -> Self {
        value.to_string()
    }
}

fn validate_namespace(ns: &str) -> Result<(), NamespacedIdError> {
    if ns.is_empty() {
        return Err(NamespacedIdError::new("identifier namespace cannot be empty"));
    }
    if !ns
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
    {
        return Err(NamespacedIdError::new(format!(
            "identifier namespace {ns:?} has invalid characters (allowed: a-z0-9_.-)"
        )));
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<(), NamespacedIdError> {
    if path.is_empty() {
        return Err(NamespacedIdError::new("identifier path cannot be empty"));
    }
    if !path
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'))
    {
        return Err(NamespacedIdError::new(format!(
            "identifier path {path:?} has invalid characters (allowed: a-z0-9_./-)"
        )));
    }
    Ok(())
}
