//! Multipart part representations, from raw headers to the resolved log entry.

use super::decision::UploadDecision;
use std::fmt;

/// Header metadata of one multipart section, as seen before its body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartMeta {
    /// Form name from `Content-Disposition`, if any.
    pub name: Option<String>,

    /// Declared `Content-Type` of the part, if any.
    pub content_type: Option<String>,

    /// Submitted `filename` from `Content-Disposition`, if any.
    pub file_name: Option<String>,
}

/// Classification of a part. Decided once, solely by the declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    Field {
        name: Option<String>,
    },
    File {
        name: Option<String>,
        content_type: String,
        file_name: Option<String>,
    },
}

/// A part after its body has been consumed, ready to be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestedPart {
    Field {
        name: Option<String>,
        value: String,
    },
    File {
        name: Option<String>,
        content_type: String,
        file_name: Option<String>,
        size: u64,
        decision: UploadDecision,
    },
}

/// Absent header values are written as `null`.
fn or_null(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("null")
}

impl fmt::Display for IngestedPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestedPart::Field { name, value } => {
                write!(f, "paramName={} paramValue={}", or_null(name), value)
            }
            IngestedPart::File {
                name,
                content_type,
                file_name,
                size,
                decision,
            } => write!(
                f,
                "paramName={} contentType={} fileName={} fileSize={} decision={}",
                or_null(name),
                content_type,
                or_null(file_name),
                size,
                decision
            ),
        }
    }
}
