//! Error types for event validation.

/// Errors raised while validating or encoding an event.
///
/// Both variants are the caller's fault and are raised synchronously from
/// the submission path; nothing downstream of validation ever surfaces an
/// error back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A required meta field is missing or ill-typed.
    #[error("invalid event metadata: {0}")]
    Meta(String),
    /// A name or property value violates the schema rules.
    #[error("illegal event data: {0}")]
    IllegalData(String),
}
