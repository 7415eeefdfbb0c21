use pbuild_domain::DomainError;
use std::borrow::Cow;

/// Error types specific to qualifier synthesis.
#[pbuild_derive::pbuild_error]
pub enum QualifierError {
    /// An entry version that does not parse, even with the placeholder token stripped.
    #[error("Malformed version{}: {source}", format_context(.context))]
    MalformedVersion { source: DomainError, context: Option<Cow<'static, str>> },
}
