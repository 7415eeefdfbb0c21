#![allow(clippy::print_stderr, clippy::print_stdout)]

mod args;

use crate::args::Cli;
use anyhow::{Context, Result, bail};
use pbuild::Outcome;
use pbuild::domain::config::{GeneratorConfig, LogConfig, LogRotation};
use pbuild::kernel::config::load_config;
use pbuild::kernel::context::BuildContext;
use pbuild_logger::{LogFile, Logger, Rotation, level_from_verbosity};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse_known(std::env::args_os());

    let mut config: GeneratorConfig =
        load_config(cli.settings.as_deref()).context("Critical: Configuration is malformed")?;
    cli.apply(&mut config);

    let _logger = Logger::builder()
        .name("pbuild")
        .console(true)
        .level(level_from_verbosity(cli.verbose))
        .filter(config.log.filter.clone())
        .file(log_file(&config.log))
        .init()?;

    let Some(feature) = cli.feature.as_deref() else {
        bail!("No feature given, pass --feature <id> (see -? for usage)");
    };
    debug!(
        install = %config.site.install.display(),
        output = %config.output.directory.display(),
        configs = config.site.configs.len(),
        "Effective configuration"
    );

    let outcome = pbuild::generate(&config, feature, &cli.feature_version, BuildContext::new())
        .with_context(|| format!("Generation of {feature} failed"))?;

    print_outcome(feature, &outcome);
    Ok(())
}

fn log_file(log: &LogConfig) -> Option<LogFile> {
    let directory = log.directory.as_ref()?;
    let rotation = match log.rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Minutely => Rotation::MINUTELY,
    };
    Some(LogFile::new(directory).with_rotation(rotation).with_max_files(log.max_files).with_json(log.json))
}

fn print_outcome(feature: &str, outcome: &Outcome) {
    let report = &outcome.report;

    if !report.problems.is_empty() {
        eprintln!("{} problem(s):", report.problems.len());
        for problem in report.problems.iter() {
            eprintln!("  {problem}");
        }
    }

    if report.cancelled {
        println!("Generation of {feature} cancelled");
        return;
    }

    let generated = report.feature.as_ref().map_or_else(|| feature.to_owned(), ToString::to_string);
    println!(
        "Generated {generated}: {} component(s), {} plan(s), {} absorbed",
        report.emitted.len(),
        outcome.written.len(),
        report.absorbed.len()
    );
}
