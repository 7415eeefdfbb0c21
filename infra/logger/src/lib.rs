//! # Logger
//!
//! Tracing bootstrap for the `pbuild` binaries: a compact stderr layer, an optional build
//! log file and one [`EnvFilter`] in front of both.
//!
//! ## Architecture
//!
//! 1.  **Level:** the default directive, usually derived from `-v` through
//!     [`level_from_verbosity`]. `RUST_LOG` is honoured unless an explicit filter is given.
//! 2.  **Filter:** [`LoggerBuilder::filter`] takes module directives such as
//!     `"pbuild_director=debug,pbuild_resolver=info"`.
//! 3.  **Build log:** [`LogFile`] adds a non-blocking file layer, plain text or JSON lines,
//!     optionally rotated. The returned [`Logger`] owns its flush guard.
//!
//! ## Example
//!
//! ```rust
//! # use pbuild_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("pbuild")
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fs;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Rotated build logs kept by default.
pub const DEFAULT_MAX_FILES: usize = 5;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Maps the number of `-v` occurrences on a command line to a level.
///
/// `0` keeps warnings and errors only, `1` adds info, `2` debug, anything above is trace.
#[must_use]
pub const fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The build log file: `<directory>/<name>.log`, or dated files when rotated.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub directory: PathBuf,
    pub rotation: Rotation,
    pub max_files: usize,
    /// Write JSON lines instead of plain text.
    pub json: bool,
}

impl LogFile {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into(), rotation: Rotation::NEVER, max_files: DEFAULT_MAX_FILES, json: false }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn layer<S>(&self, name: &str) -> Result<(BoxedLayer<S>, WorkerGuard), LoggerError>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        fs::create_dir_all(&self.directory)
            .context(format!("Failed to create log directory: {}", self.directory.display()))?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(name)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(&self.directory)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        let layer = if self.json { layer.json().boxed() } else { layer.boxed() };
        Ok((layer, guard))
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// Configures the global subscriber. A name is required before [`LoggerBuilder::init`].
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    name: N,
    level: LevelFilter,
    console: bool,
    filter: Option<String>,
    file: Option<LogFile>,
}

impl LoggerBuilder<NoName> {
    /// Names the logger. The name prefixes the build log file.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder {
            name: WithName(name.into()),
            level: self.level,
            console: self.console,
            filter: self.filter,
            file: self.file,
        }
    }
}

impl LoggerBuilder<WithName> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Enables or disables the stderr layer.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Module directives replacing `RUST_LOG`. Invalid directives fail [`LoggerBuilder::init`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Also writes the build log to `file`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn file(mut self, file: Option<LogFile>) -> Self {
        self.file = file;
        self
    }

    /// Installs the global tracing subscriber.
    ///
    /// Keep the returned [`Logger`] alive until the run ends so that buffered file lines are
    /// flushed.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, an invalid filter, zero kept
    ///   files or when neither console nor file output is enabled.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] when the log file cannot be opened.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let name = self.name.0.trim();
        if name.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Logger name cannot be empty".into(),
                context: None,
            });
        }
        if !self.console && self.file.is_none() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging layers enabled. Enable console or file output.".into(),
                context: None,
            });
        }

        let filter = env_filter(self.level, self.filter.as_deref())?;
        let mut layers = Vec::new();
        if self.console {
            layers.push(fmt::layer().compact().with_writer(std::io::stderr).with_ansi(true).boxed());
        }
        let guard = match &self.file {
            Some(file) => {
                let (layer, guard) = file.layer(name)?;
                layers.push(layer);
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        Ok(Logger { guard })
    }
}

/// A handle to the initialized logging system.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`]: console on, `INFO`, no file.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn builder() -> LoggerBuilder {
        LoggerBuilder { name: NoName, level: LevelFilter::INFO, console: true, filter: None, file: None }
    }

    /// Whether a build log file is being written.
    #[must_use]
    pub const fn writes_file(&self) -> bool {
        self.guard.is_some()
    }
}

fn env_filter(level: LevelFilter, directives: Option<&str>) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(level.into());
    let Some(directives) = directives else {
        return Ok(builder.from_env_lossy());
    };
    builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("Invalid log filter '{directives}': {e}").into(),
        context: None,
    })
}
