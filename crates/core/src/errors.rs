use thiserror::Error;

/// Boundary-rejection errors for the document/patch engine.
///
/// Everything here is a malformed *input* problem: the engine itself never
/// raises for missing patch targets or unknown document ids (those degrade to
/// no-ops and `None` returns).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("document representation is not a JSON object")]
    NotAnObject,
    #[error("document representation missing required key `{0}`")]
    MissingKey(&'static str),
    #[error("document key `{key}` has unexpected shape: {detail}")]
    MalformedKey { key: &'static str, detail: String },
    #[error("unknown patch operation `{0}`")]
    UnknownOperation(String),
    #[error("unknown edit intent `{0}`")]
    UnknownIntent(String),
    #[error("unknown locale `{0}`")]
    UnknownLocale(String),
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::DomainError;

    #[test]
    fn errors_render_actionable_messages() {
        assert_eq!(
            DomainError::MissingKey("id").to_string(),
            "document representation missing required key `id`"
        );
        assert_eq!(
            DomainError::UnknownOperation("rotate_block".to_string()).to_string(),
            "unknown patch operation `rotate_block`"
        );
        assert_eq!(
            DomainError::ConfidenceOutOfRange(1.5).to_string(),
            "confidence 1.5 is outside [0, 1]"
        );
    }
}
