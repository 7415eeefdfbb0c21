//! # Feature Entry Resolution
//!
//! Resolves the plugin entries of a feature to concrete components and keeps track, for the
//! whole run, of which entries referenced which component.
//!
//! ## Architecture
//!
//! 1.  **Registry ([`registry`]):** the read-only lookup interface over bundles and features,
//!     with an in-memory implementation.
//! 2.  **Site ([`site`]):** the per-run overlay. Generated source features and plugins, and
//!     features whose version was rewritten, shadow the registry for the rest of the run.
//! 3.  **Resolver ([`resolver`]):** [`FeatureEntryResolver::compute_elements`] walks the
//!     plugin entries of a feature, honouring platform filters, optional entries and the
//!     `generate.plugin@<id>` build property.
//! 4.  **Loading ([`loader`]):** builds a registry from `feature.toml` / `bundle.toml`
//!     descriptors found below an install location.
//! 5.  **Source generation ([`source`]):** the collaborator producing source features and
//!     plugins.

mod error;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod site;
pub mod source;

pub use crate::error::{ResolveError, ResolveErrorExt};
pub use crate::loader::SiteLoader;
pub use crate::registry::{Bundle, ComponentKey, InMemoryRegistry, Registry};
pub use crate::resolver::{FeatureEntryResolver, ResolvedComponent};
pub use crate::site::Site;
pub use crate::source::{DefaultSourceGenerator, GeneratedSource, SourceGenerator, SourceRequest};
