// ABOUTME: Entry point for the rollcheck CLI application.
// ABOUTME: Parses arguments, wires Ctrl-C to cancellation, and maps the verdict to an exit code.

mod cli;

use clap::Parser;
use cli::{CheckArgs, Cli, Commands};
use rollcheck::config::{self, Config};
use rollcheck::diagnostics::{Diagnostics, Warning};
use rollcheck::error::{Error, Result};
use rollcheck::output::{Output, OutputMode};
use rollcheck::status::{ClusterHandle, StatusMonitor, Target, cancel_pair};
use rollcheck::types::{Namespace, ResourceId};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            let path = config::init_config(&cwd, force)?;
            let output = Output::new(if cli.quiet {
                OutputMode::Quiet
            } else {
                OutputMode::Normal
            });
            output.success(&format!("Created {}", path.display()));
            Ok(())
        }
        Commands::Check(args) => check(args, cli.quiet).await,
    }
}

/// Merge command-line overrides into the discovered config.
fn resolve_config(args: &CheckArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover_or_default(&env::current_dir()?)?,
    };

    if let Some(ns) = &args.namespace {
        config.namespace = Namespace::new(ns).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }
    if let Some(context) = &args.context {
        config.kube_context = Some(context.clone());
    }
    if let Some(deadline) = args.deadline {
        config.deadline = deadline;
    }
    if let Some(interval) = args.poll_interval {
        config.poll_interval = interval;
        config.probe_timeout = config.probe_timeout.min(interval.mul_f64(0.75));
    }
    if let Some(max) = args.max_concurrent {
        config.max_concurrent_probes = max;
    }
    if let Some(output) = args.output {
        config.output = output.into();
    }
    config.fail_fast |= args.fail_fast;

    config.validate()?;
    Ok(config)
}

async fn check(args: CheckArgs, quiet: bool) -> Result<()> {
    let config = resolve_config(&args)?;

    let targets: Vec<Target> = if args.resources.is_empty() {
        config.targets()?
    } else {
        args.resources
            .iter()
            .map(|r| ResourceId::parse(r, &config.namespace).map(Target::new))
            .collect::<std::result::Result<_, _>>()?
    };
    if targets.is_empty() {
        return Err(Error::NoResources);
    }

    let output = Output::new(OutputMode::from_flags(quiet, config.output));
    let reporter = output.reporter();
    let handle = Arc::new(ClusterHandle::new(
        config.kubectl_binary(),
        config.kube_context.clone(),
    ));
    let monitor = StatusMonitor::kubectl(
        handle,
        config.probe_timeout,
        config.check_settings(),
        reporter.clone(),
    );

    let (cancel, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let requested = targets.len();
    let result = monitor.check(targets, token).await;
    monitor.release().await;
    let result = result?;

    let mut diagnostics = Diagnostics::default();
    if result.total() < requested {
        diagnostics.warn(Warning::duplicate_resources(requested - result.total()));
    }
    if reporter.failed_writes() > 0 {
        diagnostics.warn(Warning::report_write(reporter.failed_writes()));
    }

    let result = result.into_result()?;
    output.success(&format!("{} resource(s) rolled out", result.total()));
    Ok(())
}
