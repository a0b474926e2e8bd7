use thiserror::Error;

/// Failures the coverage pipeline distinguishes between.
///
/// Parameter errors stop a run before any document is read; the other two
/// are reported against the document they came from while the rest of the
/// batch keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoverageError {
    #[error("document '{document}' is unreadable: {reason}")]
    DocumentUnreadable { document: String, reason: String },

    #[error("malformed visit date '{value}' in line '{line}'")]
    MalformedDate { value: String, line: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl CoverageError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DocumentUnreadable { .. } => "document_unreadable",
            Self::MalformedDate { .. } => "malformed_date",
            Self::InvalidParameter(_) => "invalid_parameter",
        }
    }
}
