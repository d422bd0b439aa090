// ABOUTME: Configuration types and parsing for rollcheck.yml.
// ABOUTME: Handles discovery, validation, and conversion into check settings.

mod deserialize;
mod init;

pub use deserialize::ResourceEntry;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::status::{CheckSettings, ClassifyOptions, DeadlinePolicy, PollSettings, ReportFormat, Target};
use crate::types::{Namespace, ResourceKind};
use deserialize::{deserialize_kind_deadlines, deserialize_namespace, deserialize_resources};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "rollcheck.yml";
pub const CONFIG_FILENAME_ALT: &str = "rollcheck.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".rollcheck/config.yml";

/// Overrides the configured kubectl binary.
pub const KUBECTL_ENV: &str = "ROLLCHECK_KUBECTL";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub kube_context: Option<String>,

    #[serde(default = "default_kubectl")]
    pub kubectl: String,

    #[serde(default, deserialize_with = "deserialize_namespace")]
    pub namespace: Namespace,

    #[serde(default = "default_deadline", with = "humantime_serde")]
    pub deadline: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,

    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    #[serde(default, deserialize_with = "deserialize_kind_deadlines")]
    pub kind_deadlines: HashMap<ResourceKind, Duration>,

    #[serde(default)]
    pub fail_fast: bool,

    #[serde(default)]
    pub tolerate_failures: bool,

    #[serde(default, deserialize_with = "deserialize_resources")]
    pub resources: Option<NonEmpty<ResourceEntry>>,

    #[serde(default)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_deadline() -> Duration {
    Duration::from_secs(600)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_probe_timeout() -> Duration {
    Duration::from_millis(1500)
}

fn default_max_concurrent_probes() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Config {
            kube_context: None,
            kubectl: default_kubectl(),
            namespace: Namespace::default(),
            deadline: default_deadline(),
            poll_interval: default_poll_interval(),
            probe_timeout: default_probe_timeout(),
            max_concurrent_probes: default_max_concurrent_probes(),
            kind_deadlines: HashMap::new(),
            fail_fast: false,
            tolerate_failures: false,
            resources: None,
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`Config::discover`], but falls back to defaults when no file exists.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll_interval must be greater than zero".into()));
        }
        if self.max_concurrent_probes == 0 {
            return Err(Error::InvalidConfig(
                "max_concurrent_probes must be at least 1".into(),
            ));
        }
        if self.probe_timeout >= self.poll_interval {
            return Err(Error::InvalidConfig(format!(
                "probe_timeout ({:?}) must be shorter than poll_interval ({:?})",
                self.probe_timeout, self.poll_interval
            )));
        }
        if self.kubectl.trim().is_empty() {
            return Err(Error::InvalidConfig("kubectl cannot be empty".into()));
        }
        self.targets().map(|_| ())
    }

    /// kubectl binary, honouring the environment override.
    pub fn kubectl_binary(&self) -> String {
        match std::env::var(KUBECTL_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => self.kubectl.clone(),
        }
    }

    pub fn deadline_policy(&self) -> DeadlinePolicy {
        self.kind_deadlines
            .iter()
            .fold(DeadlinePolicy::new(self.deadline), |policy, (kind, d)| {
                policy.with_kind(*kind, *d)
            })
    }

    pub fn check_settings(&self) -> CheckSettings {
        CheckSettings {
            poll: PollSettings {
                interval: self.poll_interval,
                classify: ClassifyOptions {
                    tolerate_failures: self.tolerate_failures,
                },
            },
            max_concurrent_probes: self.max_concurrent_probes,
            fail_fast: self.fail_fast,
            deadlines: self.deadline_policy(),
        }
    }

    /// Resolve the configured resources against the default namespace.
    pub fn targets(&self) -> Result<Vec<Target>> {
        match &self.resources {
            None => Ok(Vec::new()),
            Some(entries) => entries
                .iter()
                .map(|entry| entry.to_target(&self.namespace))
                .collect(),
        }
    }

    pub fn template() -> Self {
        Config {
            resources: NonEmpty::from_vec(vec![ResourceEntry::Simple(
                "deployment/my-app".to_string(),
            )]),
            ..Config::default()
        }
    }
}
