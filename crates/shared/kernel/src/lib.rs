//! Kernel utilities shared across slices.
//! Keep this crate lightweight: it owns the pieces of a generation run that are not part of
//! the feature model itself.
//!
//! ## Run context
//! ```rust
//! use pbuild_kernel::context::BuildContext;
//!
//! let mut ctx = BuildContext::new();
//! let token = ctx.cancellation();
//! assert!(!ctx.is_cancelled());
//! token.cancel();
//! assert!(ctx.is_cancelled());
//! ctx.problems_mut().warn("missing_properties", "org.demo.feature", "no build properties");
//! assert_eq!(ctx.problems().warnings().count(), 1);
//! ```
//!
//! ## Config loading
//! ```rust,ignore
//! use pbuild_domain::config::GeneratorConfig;
//! use pbuild_kernel::config::load_config;
//!
//! let cfg: GeneratorConfig = load_config(Some("pbuild.toml")).unwrap();
//! ```
pub mod config;
pub mod context;
pub mod problems;

pub use pbuild_domain as domain;
