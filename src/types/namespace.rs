// ABOUTME: Kubernetes namespace validation.
// ABOUTME: Namespaces are RFC 1123 labels, at most 63 characters.

use std::fmt;
use thiserror::Error;

pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("namespace cannot be empty")]
    Empty,

    #[error("namespace exceeds maximum length of 63 characters")]
    TooLong,

    #[error("namespace cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("namespace cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("invalid character in namespace: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(value: &str) -> Result<Self, NamespaceError> {
        if value.is_empty() {
            return Err(NamespaceError::Empty);
        }

        if value.len() > 63 {
            return Err(NamespaceError::TooLong);
        }

        if value.starts_with('-') {
            return Err(NamespaceError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(NamespaceError::EndsWithHyphen);
        }

        for c in value.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(NamespaceError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
