// ABOUTME: Immutable identity of a monitored workload.
// ABOUTME: Parses "kind/name" and "namespace/kind/name" forms.

use std::fmt;
use thiserror::Error;

use super::kind::{ParseResourceKindError, ResourceKind};
use super::namespace::{Namespace, NamespaceError};
use super::resource_name::{ResourceName, ResourceNameError};

#[derive(Debug, Error)]
pub enum ParseResourceIdError {
    #[error("expected kind/name or namespace/kind/name, got '{0}'")]
    Format(String),

    #[error(transparent)]
    Kind(#[from] ParseResourceKindError),

    #[error(transparent)]
    Name(#[from] ResourceNameError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

/// Identity of one workload. Fields are private so an id never changes once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    namespace: Namespace,
    kind: ResourceKind,
    name: ResourceName,
}

impl ResourceId {
    pub fn new(namespace: Namespace, kind: ResourceKind, name: ResourceName) -> Self {
        Self {
            namespace,
            kind,
            name,
        }
    }

    /// Convenience constructor for deployments.
    pub fn deployment(namespace: &str, name: &str) -> Result<Self, ParseResourceIdError> {
        Ok(Self::new(
            Namespace::new(namespace)?,
            ResourceKind::Deployment,
            ResourceName::new(name)?,
        ))
    }

    /// Parse `kind/name` (using `default_namespace`) or `namespace/kind/name`.
    pub fn parse(value: &str, default_namespace: &Namespace) -> Result<Self, ParseResourceIdError> {
        let parts: Vec<&str> = value.trim().split('/').collect();
        match parts.as_slice() {
            [kind, name] => Ok(Self::new(
                default_namespace.clone(),
                kind.parse()?,
                ResourceName::new(name)?,
            )),
            [namespace, kind, name] => Ok(Self::new(
                Namespace::new(namespace)?,
                kind.parse()?,
                ResourceName::new(name)?,
            )),
            _ => Err(ParseResourceIdError::Format(value.to_string())),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &ResourceName {
        &self.name
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.kind, self.name)
    }
}
