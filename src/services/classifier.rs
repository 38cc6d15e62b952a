//! Part classification.
//!
//! A part with no declared content type is a plain form field; anything with a
//! content type is a file, whether or not a filename was submitted.

use crate::models::part::{PartKind, PartMeta};

/// Classify a part from its headers. Total and side-effect free.
pub fn classify(meta: &PartMeta) -> PartKind {
    match &meta.content_type {
        None => PartKind::Field {
            name: meta.name.clone(),
        },
        Some(content_type) => PartKind::File {
            name: meta.name.clone(),
            content_type: content_type.clone(),
            file_name: meta.file_name.clone(),
        },
    }
}
