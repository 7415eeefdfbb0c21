use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Environment prefix of configuration overrides (`PBUILD__SECTION__KEY`).
pub const ENV_PREFIX: &str = "PBUILD";

/// Custom error type for config loading.
#[pbuild_derive::pbuild_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads the generator configuration, combining an optional settings file with environment overrides.
///
/// Layers, lowest priority first:
/// 1. **Defaults**: whatever `T::default()` provides through `#[serde(default)]`.
/// 2. **Settings File**: `path`, when given. Its format follows the extension (`.toml`, `.json`).
/// 3. **Environment Overrides**: variables prefixed with `PBUILD__`; nested keys use double
///    underscores (e.g., `PBUILD__QUALIFIER__MAX_GENERATED_LENGTH=20`).
///
/// Command line flags are applied on top by the caller.
///
/// # Errors
/// This function will return an error if:
/// * The given settings file cannot be found or parsed.
/// * The merged values do not match the structure of type `T`.
///
/// # Example
/// ```rust
/// use pbuild_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct Settings {
///     #[serde(default)]
///     stamp: Option<String>,
/// }
///
/// let cfg: Settings = load_config(None::<&str>).unwrap_or_default();
/// assert!(cfg.stamp.is_none());
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let mut builder = Config::builder();

    if let Some(path) = path.as_ref() {
        let path: &Path = path.as_ref();
        info!(path = %path.display(), "Loading generator settings");
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
