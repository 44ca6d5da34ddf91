use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::LlmResponse;

lazy_static! {
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();
    static ref JS_STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("unterminated code block in model output")]
    UnterminatedBlock,

    #[error("model output could not be repaired: {0}")]
    Unrepairable(String),
}

/// Pull the JSON object out of free-form model text.
///
/// Accepts a fenced ```json block, any fenced block, a bare object, or an
/// object embedded in prose (first `{` through last `}`).
pub fn extract_json_string(text: &str) -> Result<String, ParseError> {
    if let Some(rest) = text.split("```json").nth(1) {
        return rest
            .split("```")
            .next()
            .map(|s| s.trim().to_string())
            .ok_or(ParseError::UnterminatedBlock);
    }

    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        if let Some(newline) = after_fence.find('\n') {
            let body = &after_fence[newline + 1..];
            if let Some(end) = body.find("```") {
                return Ok(body[..end].trim().to_string());
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(text[start..=end].to_string()),
        _ => Err(ParseError::NoJson),
    }
}

/// `{"a": 1,}` -> `{"a": 1}`
pub fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").to_string()
}

/// `"a" + "b"` -> `"ab"`
pub fn fix_js_string_concatenation(json_str: &str) -> String {
    JS_STRING_CONCAT_RE.replace_all(json_str, "").to_string()
}

fn repair_json(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    match result {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

fn try_parse<T: LlmResponse>(text: &str) -> Result<T, ParseError> {
    let json_str = extract_json_string(text)?;

    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    let fixed = fix_trailing_commas(&fix_js_string_concatenation(&json_str));
    if let Ok(parsed) = serde_json::from_str::<T>(&fixed) {
        tracing::debug!("Model output parsed after quick fixes");
        return Ok(parsed);
    }

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("Model output parsed after llm_json repair");
            return Ok(parsed);
        }
    }

    Err(ParseError::Unrepairable(
        json_str.chars().take(200).collect::<String>(),
    ))
}

/// Parse model output into `T`, falling back to `T::default()` marked as failed
pub fn parse_with_fallback<T: LlmResponse>(text: &str) -> T {
    match try_parse::<T>(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!("Model output parsing failed, using fallback: {}", err);
            let mut fallback = T::default();
            fallback.mark_as_fallback(err.to_string());
            fallback
        }
    }
}
