//! Parsing helpers for structured model output.

mod parser;
mod response;

pub use parser::{extract_json_string, parse_with_fallback};
pub use response::{default_true, LlmResponse};
