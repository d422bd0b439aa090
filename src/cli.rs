// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use rollcheck::config::OutputFormat;

#[derive(Parser)]
#[command(name = "rollcheck")]
#[command(about = "Wait for Kubernetes rollouts to stabilize")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rollcheck.yml configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Wait until the given workloads finish rolling out
    Check(CheckArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Resources as kind/name or namespace/kind/name (overrides the config list)
    pub resources: Vec<String>,

    /// Config file (default: discovered in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Namespace for resources given without one
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Kube context passed to kubectl
    #[arg(long)]
    pub context: Option<String>,

    /// Default deadline per resource, e.g. 90s or 5m
    #[arg(long, value_parser = parse_duration)]
    pub deadline: Option<Duration>,

    /// Delay between probes of one resource
    #[arg(long, value_parser = parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Maximum number of kubectl probes in flight
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Cancel remaining resources after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    #[arg(long, value_enum)]
    pub output: Option<OutputArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Text,
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

fn parse_duration(value: &str) -> Result<Duration, humantime_serde::re::humantime::DurationError> {
    humantime_serde::re::humantime::parse_duration(value)
}
