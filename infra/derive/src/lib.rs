#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the build generator workspace.
//!
//! ## Usage
//! Every crate that declares an error enum depends on this one:
//! ```toml
//! [dependencies]
//! pbuild-derive.workspace = true
//! thiserror.workspace = true
//! ```
//!
//! The macro docstring example is `ignore`d to avoid compiling in this crate; the
//! `tests/ui` cases exercise it for real.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for defining the error enum of a crate.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Reason Codes**: Generates `code()` returning the `snake_case` variant name. Callers that
///   need to branch on a failure kind match on the variant; the code exists for logs and
///   problem reports.
/// * **Internal Fallback**: Provides `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]`, and must carry a `context` field.
/// 4. Tuple or unit variants are rejected to keep error wiring explicit.
/// 5. One annotated enum per module (a private `format_context` helper is emitted next to it).
///
/// # Example
///
/// ```rust,ignore
/// use pbuild_derive::pbuild_error;
/// use std::borrow::Cow;
///
/// #[pbuild_error]
/// pub enum SiteError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Plugin not found{}: {id}", format_context(.context))]
///     MissingPlugin { id: String, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &std::path::Path) -> Result<String, SiteError> {
///     std::fs::read_to_string(path).context("Reading descriptor")
/// }
///
/// assert_eq!(SiteError::MissingPlugin { id: "a".into(), context: None }.code(), "missing_plugin");
/// ```
#[proc_macro_attribute]
pub fn pbuild_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
