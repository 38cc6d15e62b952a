//! Outcome of the size policy for a single file part.

use std::fmt;

/// What happens to the bytes of one file part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDecision {
    /// Zero-length part. Nothing to keep, still reported.
    Skipped,
    /// Within both limits; handed to the configured store.
    Persisted,
    /// Over the per-part or per-request byte limit.
    Rejected,
}

impl UploadDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadDecision::Skipped => "skipped",
            UploadDecision::Persisted => "persisted",
            UploadDecision::Rejected => "rejected",
        }
    }
}

impl fmt::Display for UploadDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
