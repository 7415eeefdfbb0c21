//! # Domain Models
//!
//! Plain data records shared by every slice of the build generator: versions and version
//! requests, features and their entries, target platform configurations, per-feature build
//! properties and the generator configuration.
//! Keep it lean: no I/O and no registry access, just data and the parsing rules that belong
//! to it.

pub mod config;
mod error;
pub mod feature;
pub mod flags;
pub mod platform;
pub mod properties;
pub mod version;

pub use crate::error::{DomainError, DomainErrorExt};
pub use crate::feature::{EntryKind, Feature, FeatureEntry, FeatureKey};
pub use crate::flags::GenerationFlags;
pub use crate::platform::{Config, PlatformFilter, select_configs};
pub use crate::properties::BuildProperties;
pub use crate::version::{QUALIFIER_TOKEN, Version, VersionSpec};
