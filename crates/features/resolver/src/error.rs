use pbuild_domain::DomainError;
use std::borrow::Cow;

/// Error types specific to feature resolution and site loading.
#[pbuild_derive::pbuild_error]
pub enum ResolveError {
    /// A required plugin entry that nothing in the site satisfies.
    #[error("Missing plugin {id}_{version}{}", format_context(.context))]
    MissingComponent { id: String, version: String, context: Option<Cow<'static, str>> },

    /// A feature that nothing in the site satisfies.
    #[error("Missing feature {id}_{version}{}", format_context(.context))]
    MissingFeature { id: String, version: String, context: Option<Cow<'static, str>> },

    #[error("Malformed version{}: {source}", format_context(.context))]
    MalformedVersion { source: DomainError, context: Option<Cow<'static, str>> },

    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Failed to walk the install location{}: {source}", format_context(.context))]
    Walk { source: walkdir::Error, context: Option<Cow<'static, str>> },

    /// A `feature.toml` or `bundle.toml` that does not deserialize.
    #[error("Invalid descriptor{}: {source}", format_context(.context))]
    Descriptor { source: toml::de::Error, context: Option<Cow<'static, str>> },

    #[error("Source generation failed{}: {message}", format_context(.context))]
    Generation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Generation cancelled{}", format_context(.context))]
    Cancelled { context: Option<Cow<'static, str>> },
}

impl ResolveError {
    pub(crate) fn missing_feature(id: impl Into<String>, version: impl std::fmt::Display) -> Self {
        Self::MissingFeature { id: id.into(), version: version.to_string(), context: None }
    }

    pub(crate) fn cancelled(subject: &str) -> Self {
        Self::Cancelled { context: Some(Cow::Owned(subject.to_owned())) }
    }
}
