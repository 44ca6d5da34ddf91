use base64::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::ALLOWED_PHOTO_MIME_TYPES;

lazy_static! {
    /// Any run of whitespace, used to collapse keywords to single-spaced tokens
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Check that a coordinate pair is a valid WGS84 position
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), String> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {} is out of range", latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {} is out of range", longitude));
    }
    Ok(())
}

pub fn is_allowed_photo_type(mime_type: &str) -> bool {
    ALLOWED_PHOTO_MIME_TYPES.contains(&mime_type)
}

/// File extension for an accepted photo MIME type
pub fn photo_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Encode an identifier as an object key segment. URL-safe base64 keeps
/// distinct ids distinct and never yields `/` or `.`.
pub fn encode_key_segment(value: &str) -> String {
    if value.is_empty() {
        // 9 chars is not a length unpadded base64 can produce
        return "anonymous".to_string();
    }
    BASE64_URL_SAFE_NO_PAD.encode(value)
}
