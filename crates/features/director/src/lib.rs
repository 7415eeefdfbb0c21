//! # Build Generation
//!
//! Walks a feature tree depth-first and turns it into build units: one per distinct
//! component, one per feature, plus the per-configuration assembly ledger.
//!
//! ## Architecture
//!
//! 1.  **Director ([`director`]):** [`BuildDirector`] owns all per-run state. Nested features
//!     are generated before their parent, so a parent's qualifier suffix sees the rewritten
//!     versions of its children. Optional nested features that cannot be found are absorbed
//!     and reported; every other failure aborts the run.
//! 2.  **Emission ([`emitter`]):** the [`ScriptEmitter`] collaborator receives each component
//!     at most once per run. [`PlanEmitter`] writes JSON build plans, [`RecordingEmitter`]
//!     keeps them in memory.
//! 3.  **Assembly ([`assembly`]):** what has to be packaged for each requested configuration.

pub mod assembly;
pub mod director;
pub mod emitter;
mod error;

pub use crate::assembly::{AssemblyLedger, ConfigAssembly};
pub use crate::director::{
    ABSORBED_OPTIONAL_FEATURE, AbsorbedFailure, BuildDirector, GenerationReport, MISSING_BUILD_PROPERTIES,
};
pub use crate::emitter::{
    ASSEMBLY_FILE, ComponentPlan, FeaturePlan, PLAN_FILE, PlanEmitter, PlanSettings, RecordingEmitter, ScriptEmitter,
};
pub use crate::error::{DirectorError, DirectorErrorExt};
