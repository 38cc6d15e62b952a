//! JSON acknowledgment body.
//!
//! The default escaping replaces newlines and nothing else, so a value holding
//! a double quote or backslash yields invalid JSON. Clients already parse this
//! exact shape; `JsonEscape::Full` opts into a proper serializer.

use clap::ValueEnum;
use serde_json::json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum JsonEscape {
    /// Escape `\n` only.
    #[default]
    Newlines,
    /// Escape everything JSON requires.
    Full,
}

/// Wrap the rendered log as `{"msg":"..."}`.
pub fn encode(log_text: &str, escape: JsonEscape) -> String {
    match escape {
        JsonEscape::Newlines => format!("{{\"msg\":\"{}\"}}", log_text.replace('\n', "\\n")),
        JsonEscape::Full => json!({ "msg": log_text }).to_string(),
    }
}
