use pbuild_derive::pbuild_error;
use std::borrow::Cow;

#[pbuild_error]
pub enum ResolveError {
    #[error("Missing plugin{}: {id}_{version}", format_context(.context))]
    MissingComponent { id: String, version: String, context: Option<Cow<'static, str>> },

    #[error("Missing feature{}: {id}", format_context(.context))]
    MissingFeature { id: String, context: Option<Cow<'static, str>> },

    #[error("Cancelled")]
    Cancelled {},
}

fn main() {
    let missing = ResolveError::MissingComponent {
        id: "org.demo.a".to_owned(),
        version: "1.0.0".to_owned(),
        context: None,
    };
    assert_eq!(missing.code(), "missing_component");
    assert_eq!(missing.to_string(), "Missing plugin: org.demo.a_1.0.0");

    let with_context: Result<(), ResolveError> =
        Err(ResolveError::MissingFeature { id: "f".to_owned(), context: None });
    let err = with_context.context("Generating root").unwrap_err();
    assert_eq!(err.code(), "missing_feature");
    assert_eq!(err.to_string(), "Missing feature (Generating root): f");

    assert_eq!(ResolveError::Cancelled {}.code(), "cancelled");
}
