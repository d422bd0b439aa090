// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles namespaces, per-kind deadlines, and resource lists.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::status::Target;
use crate::types::{Namespace, ResourceId, ResourceKind, ResourceName};

pub fn deserialize_namespace<'de, D>(deserializer: D) -> std::result::Result<Namespace, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Namespace::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_kind_deadlines<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<ResourceKind, Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: HashMap<ResourceKind, humantime_serde::Serde<Duration>> =
        HashMap::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into_inner())).collect())
}

pub fn deserialize_resources<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NonEmpty<ResourceEntry>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<ResourceEntry>> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(values) => NonEmpty::from_vec(values)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("resources list cannot be empty")),
    }
}

/// One configured resource, either `kind/name`, `namespace/kind/name`, or a map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResourceEntry {
    Simple(String),
    Detailed {
        #[serde(default)]
        kind: ResourceKind,
        name: String,
        #[serde(default)]
        namespace: Option<String>,
        #[serde(default, with = "humantime_serde")]
        deadline: Option<Duration>,
    },
}

impl ResourceEntry {
    pub fn to_target(&self, default_namespace: &Namespace) -> Result<Target> {
        match self {
            ResourceEntry::Simple(s) => Ok(Target::new(ResourceId::parse(s, default_namespace)?)),
            ResourceEntry::Detailed {
                kind,
                name,
                namespace,
                deadline,
            } => {
                let namespace = match namespace {
                    Some(ns) => Namespace::new(ns).map_err(|e| Error::InvalidConfig(e.to_string()))?,
                    None => default_namespace.clone(),
                };
                let name = ResourceName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;
                Ok(Target {
                    id: ResourceId::new(namespace, *kind, name),
                    deadline: *deadline,
                })
            }
        }
    }
}
