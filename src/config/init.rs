// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates rollcheck.yml template files.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config, ResourceEntry};

/// Write a template config into `dir`, returning the path written.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&Config::template());
    std::fs::write(&config_path, yaml)?;

    Ok(config_path)
}

fn generate_template_yaml(config: &Config) -> String {
    let resources: String = config
        .resources
        .iter()
        .flat_map(|entries| entries.iter())
        .filter_map(|entry| match entry {
            ResourceEntry::Simple(s) => Some(format!("  - {s}\n")),
            ResourceEntry::Detailed { .. } => None,
        })
        .collect();

    format!(
        r#"# kube_context: my-cluster
namespace: {}
deadline: {}
poll_interval: {}
max_concurrent_probes: {}
# Stop checking the remaining resources after the first failure
fail_fast: false
# Keep retrying generic kubectl errors until the deadline
tolerate_failures: false
resources:
{}"#,
        config.namespace,
        humantime_serde::re::humantime::format_duration(config.deadline),
        humantime_serde::re::humantime::format_duration(config.poll_interval),
        config.max_concurrent_probes,
        resources
    )
}
