// ABOUTME: DNS-compatible workload name validation.
// ABOUTME: Follows the RFC 1123 subdomain rules Kubernetes applies to object names.

use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 253;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceNameError {
    #[error("resource name cannot be empty")]
    Empty,

    #[error("resource name exceeds maximum length of 253 characters")]
    TooLong,

    #[error("resource name must start and end with an alphanumeric character")]
    BadBoundary,

    #[error("resource name must be lowercase")]
    NotLowercase,

    #[error("invalid character in resource name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(value: &str) -> Result<Self, ResourceNameError> {
        if value.is_empty() {
            return Err(ResourceNameError::Empty);
        }

        if value.len() > MAX_LEN {
            return Err(ResourceNameError::TooLong);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ResourceNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '.' {
                return Err(ResourceNameError::InvalidChar(c));
            }
        }

        let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        if !value.starts_with(alnum) || !value.ends_with(alnum) {
            return Err(ResourceNameError::BadBoundary);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
