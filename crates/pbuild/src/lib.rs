//! Facade crate for the build generator.
//! Re-exports the domain, kernel and feature slices and composes them into a single run.
//! Keep this crate thin: it should compose other crates, not implement generation logic.
//!
//! ## Usage
//! - Load a [`domain::config::GeneratorConfig`] with [`kernel::config::load_config`].
//! - Call [`generate`] with the root feature id and requested version.

use pbuild_director::{AssemblyLedger, BuildDirector, GenerationReport, PlanEmitter, PlanSettings};
use pbuild_domain::config::GeneratorConfig;
use pbuild_kernel::context::BuildContext;
use pbuild_resolver::SiteLoader;
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::info;

pub use pbuild_director as director;
pub use pbuild_domain as domain;
pub use pbuild_kernel as kernel;
pub use pbuild_qualifier as qualifier;
pub use pbuild_resolver as resolver;

/// Failure of a whole run.
#[pbuild_derive::pbuild_error]
pub enum RunError {
    #[error("Loading the site failed{}: {source}", format_context(.context))]
    Load { source: pbuild_resolver::ResolveError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Generate { source: pbuild_director::DirectorError, context: Option<Cow<'static, str>> },
}

/// What a run produced.
#[derive(Debug)]
pub struct Outcome {
    pub report: GenerationReport,
    pub ledger: AssemblyLedger,
    /// Plan files written, in emission order. The assembly ledger comes last.
    pub written: Vec<PathBuf>,
}

/// Generates build plans for feature `id` at `version` (empty for the highest version).
///
/// The site is loaded from `config.site.install`, plans are written below
/// `config.output.directory`. A cancelled run writes no assembly ledger.
///
/// # Errors
/// * [`RunError::Load`] when the install location cannot be read.
/// * [`RunError::Generate`] for any fatal generation failure.
pub fn generate(
    config: &GeneratorConfig,
    id: &str,
    version: &str,
    ctx: BuildContext,
) -> Result<Outcome, RunError> {
    let registry = SiteLoader::new()
        .with_build_stamp(config.site.build_stamp.clone())
        .load(&config.site.install)
        .context(config.site.install.display().to_string())?;

    let settings =
        PlanSettings { dev_entries: config.site.dev_entries.clone(), nl: config.site.nl.clone() };
    let emitter = PlanEmitter::new(&config.output.directory).with_settings(settings);

    let mut director = BuildDirector::from_config(&registry, config, emitter);
    let report = director.generate_root(id, version, ctx)?;

    let (mut emitter, ledger) = director.into_parts();
    if !report.cancelled {
        emitter.write_assembly(&ledger)?;
    }
    info!(feature = %id, plans = emitter.written().len(), "Build plans written");

    Ok(Outcome { report, ledger, written: emitter.written().to_vec() })
}
