use std::borrow::Cow;

/// Parse failures of domain values.
#[pbuild_derive::pbuild_error]
pub enum DomainError {
    /// A version string that does not follow `major.minor.micro[.qualifier]`.
    #[error("Malformed version '{input}'{}: {reason}", format_context(.context))]
    MalformedVersion {
        input: String,
        reason: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// A configuration string that is not an `os,ws,arch` triple.
    #[error("Malformed configuration '{input}'{}", format_context(.context))]
    MalformedConfig { input: String, context: Option<Cow<'static, str>> },
}
