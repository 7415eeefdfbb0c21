//! # CLI Argument Definitions
//!
//! Flags of the `pbuild` command. Unknown flags are dropped before parsing, so wrapper
//! scripts may pass options meant for other tools anywhere on the command line.

use clap::{Arg, ArgAction, Command, CommandFactory, Parser};
use pbuild::domain::Config;
use pbuild::domain::config::GeneratorConfig;
use std::ffi::OsString;
use std::path::PathBuf;

const ANY: &str = "*";

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "pbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generates build plans for a feature and everything it contains")]
#[command(disable_help_flag = true)]
pub(crate) struct Cli {
    /// Print help
    #[arg(short = '?', long = "help", action = ArgAction::Help)]
    pub(crate) help: Option<bool>,

    /// Id of the root feature
    #[arg(long)]
    pub(crate) feature: Option<String>,

    /// Requested version of the root feature (highest when omitted)
    #[arg(long = "feature-version", default_value = "")]
    pub(crate) feature_version: String,

    /// Install location holding feature.toml and bundle.toml descriptors
    #[arg(long)]
    pub(crate) install: Option<PathBuf>,

    /// Target operating system
    #[arg(long)]
    pub(crate) os: Option<String>,

    /// Target windowing system
    #[arg(long)]
    pub(crate) ws: Option<String>,

    /// Target architecture
    #[arg(long)]
    pub(crate) arch: Option<String>,

    /// Target locale
    #[arg(long)]
    pub(crate) nl: Option<String>,

    /// Additional configuration to build for, as `os,ws,arch` (repeatable)
    #[arg(long = "config", value_name = "OS,WS,ARCH")]
    pub(crate) configs: Vec<Config>,

    /// Replaces the `qualifier` placeholder of feature versions
    #[arg(long)]
    pub(crate) stamp: Option<String>,

    /// Comma-separated development classpath entries
    #[arg(long = "dev", value_delimiter = ',')]
    pub(crate) dev_entries: Vec<String>,

    /// Output directory for build plans
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,

    /// Settings file (toml or json)
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,

    /// Generate nested features too
    #[arg(long)]
    pub(crate) recursive: bool,

    /// Append generated qualifier suffixes to feature versions
    #[arg(long)]
    pub(crate) qualifier: bool,

    /// Also write the build log into this directory
    #[arg(long = "log-dir")]
    pub(crate) log_dir: Option<PathBuf>,

    /// Write the build log as JSON lines
    #[arg(long = "log-json")]
    pub(crate) log_json: bool,

    /// Log directives replacing RUST_LOG (e.g. pbuild_director=debug)
    #[arg(long = "log-filter")]
    pub(crate) log_filter: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = ArgAction::Count)]
    pub(crate) verbose: u8,
}

impl Cli {
    /// Parses `args` after dropping the flags this command does not know.
    pub(crate) fn parse_known<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut command = Self::command();
        command.build();
        Self::parse_from(known_args(&command, args.into_iter().map(Into::into)))
    }

    /// The configuration given through `--os`, `--ws` and `--arch`, if any axis is set.
    fn platform(&self) -> Option<Config> {
        if self.os.is_none() && self.ws.is_none() && self.arch.is_none() {
            return None;
        }
        let axis = |value: Option<&str>| value.unwrap_or(ANY).to_owned();
        Some(Config::new(axis(self.os.as_deref()), axis(self.ws.as_deref()), axis(self.arch.as_deref())))
    }

    /// Applies the flags on top of the loaded configuration.
    pub(crate) fn apply(&self, config: &mut GeneratorConfig) {
        let site = &mut config.site;
        if let Some(install) = &self.install {
            site.install.clone_from(install);
        }
        if let Some(platform) = self.platform() {
            site.configs.push(platform);
        }
        site.configs.extend(self.configs.iter().cloned());
        if self.nl.is_some() {
            site.nl.clone_from(&self.nl);
        }
        if self.stamp.is_some() {
            site.build_stamp.clone_from(&self.stamp);
        }
        if !self.dev_entries.is_empty() {
            site.dev_entries =
                self.dev_entries.iter().map(|e| e.trim()).filter(|e| !e.is_empty()).map(str::to_owned).collect();
        }

        if let Some(output) = &self.output {
            config.output.directory.clone_from(output);
        }
        if self.recursive {
            config.generation.included_features = true;
        }
        if self.qualifier {
            config.generation.version_suffix = true;
        }

        let log = &mut config.log;
        if self.log_dir.is_some() {
            log.directory.clone_from(&self.log_dir);
        }
        if self.log_json {
            log.json = true;
        }
        if self.log_filter.is_some() {
            log.filter.clone_from(&self.log_filter);
        }
    }
}

/// Keeps the program name, the flags `command` knows and the values they take.
fn known_args(command: &Command, mut args: impl Iterator<Item = OsString>) -> Vec<OsString> {
    let mut kept: Vec<OsString> = args.next().into_iter().collect();
    let mut value_follows = false;

    for arg in args {
        if value_follows {
            value_follows = false;
            kept.push(arg);
            continue;
        }
        if let Some(takes_next) = classify(command, &arg.to_string_lossy()) {
            value_follows = takes_next;
            kept.push(arg);
        }
    }
    kept
}

/// `None` for anything `command` does not know, else whether the next token is its value.
fn classify(command: &Command, token: &str) -> Option<bool> {
    if let Some(long) = token.strip_prefix("--") {
        let (name, inline) = long.split_once('=').map_or((long, false), |(name, _)| (name, true));
        let arg = command.get_arguments().find(|a| a.get_long() == Some(name))?;
        return Some(takes_value(arg) && !inline);
    }

    let shorts = token.strip_prefix('-').filter(|s| !s.is_empty())?;
    for (at, c) in shorts.char_indices() {
        let arg = command.get_arguments().find(|a| a.get_short() == Some(c))?;
        if takes_value(arg) {
            return Some(at + c.len_utf8() == shorts.len());
        }
    }
    Some(false)
}

fn takes_value(arg: &Arg) -> bool {
    arg.get_action().takes_values()
}
