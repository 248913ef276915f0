mod config;

use config::NexusConfig;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use log::LevelFilter;
use nexus_pm::{BatchCoordinator, TargetConfig};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "nexus-fetch")]
#[command(about = "Download and unpack artifacts from a Nexus repository")]
#[command(version)]
struct Args {
    /// Targets to run (default: every target in the config file)
    #[arg(value_name = "TARGET")]
    targets: Vec<String>,

    /// Configuration file (default: nexus.toml, searched upward from the working directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep downloaded archives instead of unpacking them
    #[arg(long)]
    no_unpack: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Increase verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Apply command-line overrides on top of a merged target
    fn apply_overrides(&self, mut target: TargetConfig) -> TargetConfig {
        if self.no_unpack {
            target.unpack = Some(false);
        }
        if self.insecure {
            target.strict_ssl = Some(false);
        }
        target
    }
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| match record.level() {
            log::Level::Error => writeln!(buf, "{} {}", style(">>").red(), record.args()),
            log::Level::Warn => writeln!(buf, "{} {}", style(">>").yellow(), record.args()),
            log::Level::Info => writeln!(buf, "{} {}", style(">>").green(), record.args()),
            _ => writeln!(buf, "{} {}", style(">>").dim(), record.args()),
        })
        .init();
}

fn load_config(args: &Args) -> Result<NexusConfig> {
    match &args.config {
        Some(path) => NexusConfig::load_file(path),
        None => NexusConfig::load_from_cwd()?
            .with_context(|| format!("No {} found in this or any parent directory", config::CONFIG_FILE_NAME)),
    }
}

async fn run(args: Args) -> Result<bool> {
    let config = load_config(&args)?;
    let targets = config.select(&args.targets)?;

    let mut all_succeeded = true;
    for (name, target) in targets {
        let target = args.apply_overrides(target);
        let coordinator = BatchCoordinator::from_target(&name, &target)
            .with_context(|| format!("Invalid target '{}'", name))?;
        let requests = target.requests();

        log::debug!("Running target {} ({} artifacts)", name, requests.len());
        let outcome = coordinator.run(&requests).await;

        let installed = outcome.installed().count();
        let failed = outcome.failures().count();
        if outcome.failed() {
            all_succeeded = false;
            eprintln!(
                "{} target {}: {} installed, {} failed",
                style("Error:").red().bold(),
                name,
                installed,
                failed
            );
        } else {
            log::info!("Target {}: {} installed", name, installed);
        }
    }

    Ok(all_succeeded)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level());

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from(["nexus-fetch", "web", "tools", "--insecure", "-vv"]);
        assert_eq!(args.targets, vec!["web", "tools"]);
        assert!(args.insecure);
        assert_eq!(args.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn test_quiet_log_level() {
        let args = Args::parse_from(["nexus-fetch", "-q"]);
        assert_eq!(args.log_level(), LevelFilter::Error);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["nexus-fetch", "--no-unpack", "--insecure"]);
        let target = TargetConfig { unpack: Some(true), ..TargetConfig::default() };

        let target = args.apply_overrides(target);
        assert_eq!(target.unpack, Some(false));
        assert_eq!(target.strict_ssl, Some(false));
    }

    #[test]
    fn test_no_overrides_keep_target() {
        let args = Args::parse_from(["nexus-fetch"]);
        let target = TargetConfig { strict_ssl: Some(true), ..TargetConfig::default() };
        assert_eq!(args.apply_overrides(target).strict_ssl, Some(true));
    }
}
