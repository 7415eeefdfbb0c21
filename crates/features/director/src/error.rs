use pbuild_qualifier::QualifierError;
use pbuild_resolver::ResolveError;
use std::borrow::Cow;

/// Error types of a generation run.
#[pbuild_derive::pbuild_error]
pub enum DirectorError {
    #[error("{source}{}", format_context(.context))]
    Resolve { source: ResolveError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Qualifier { source: QualifierError, context: Option<Cow<'static, str>> },

    /// The script emitter refused a build unit.
    #[error("Script emission failed{}: {message}", format_context(.context))]
    Emit { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialize { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Generation cancelled{}", format_context(.context))]
    Cancelled { context: Option<Cow<'static, str>> },
}

impl DirectorError {
    /// A feature could not be found. The only failure an optional feature entry absorbs.
    #[must_use]
    pub const fn is_missing_feature(&self) -> bool {
        matches!(self, Self::Resolve { source: ResolveError::MissingFeature { .. }, .. })
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled { .. } | Self::Resolve { source: ResolveError::Cancelled { .. }, .. }
        )
    }

    pub(crate) fn cancelled(subject: &str) -> Self {
        Self::Cancelled { context: Some(Cow::Owned(subject.to_owned())) }
    }
}
