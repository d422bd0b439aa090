// ABOUTME: Workload kinds that support rollout status queries.
// ABOUTME: Parses the short and plural spellings kubectl accepts.

use serde::de::{self, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported resource kind: {0}")]
pub struct ParseResourceKindError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ResourceKind {
    #[default]
    Deployment,
    StatefulSet,
    DaemonSet,
}

impl ResourceKind {
    /// Name passed to `kubectl rollout status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "deployment",
            ResourceKind::StatefulSet => "statefulset",
            ResourceKind::DaemonSet => "daemonset",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ParseResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" | "deployments" | "deploy" => Ok(ResourceKind::Deployment),
            "statefulset" | "statefulsets" | "sts" => Ok(ResourceKind::StatefulSet),
            "daemonset" | "daemonsets" | "ds" => Ok(ResourceKind::DaemonSet),
            _ => Err(ParseResourceKindError(s.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
