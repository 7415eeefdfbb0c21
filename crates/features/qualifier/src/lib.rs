//! # Version Qualifiers
//!
//! Computes the deterministic, order-preserving qualifier suffix a feature receives from the
//! versions of the plugins and nested features it contains.
//!
//! * [`codec`]: pure encoding functions. Numbers become length-prefixed base-64 strings whose
//!   byte order follows numeric order; lists of qualifiers fold into per-position weight sums.
//! * [`synthesizer`]: gathers the contributing versions of a feature through a
//!   [`pbuild_resolver::Registry`] and assembles the suffix.
//!
//! Installing the suffix (`<context part>-<suffix>`) is left to
//! [`pbuild_domain::Feature::apply_qualifier_suffix`], which rewrites a version at most once.

pub mod codec;
mod error;
pub mod synthesizer;

pub use crate::error::{QualifierError, QualifierErrorExt};
pub use crate::synthesizer::{QUALIFIER_SUFFIX_VERSION, QualifierSettings, QualifierSynthesizer};
