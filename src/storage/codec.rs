//! Value ↔ payload encoding
//!
//! Values are stored as compact JSON. `serde_json` writes no insignificant
//! whitespace and, without `preserve_order`, emits object keys in sorted order,
//! so equal values always encode to the same string.
//!
//! The payload handed to the backend is framed as `<tag>:<json>`, where `<tag>`
//! is the entry's [`EntryCategory`] letter.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::category::EntryCategory;

const FRAME_SEPARATOR: char = ':';

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Corrupt payload: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Serialize a value to its canonical JSON string
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(CodecError::Encode)
}

/// Parse JSON back into a value; any failure means the payload is corrupt
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| CodecError::Corrupt(e.to_string()))
}

/// Prefix encoded JSON with the category tag
pub fn frame(category: EntryCategory, json: &str) -> String {
    let mut payload = String::with_capacity(json.len() + 2);
    payload.push(category.tag());
    payload.push(FRAME_SEPARATOR);
    payload.push_str(json);
    payload
}

/// Split a stored payload into its category and JSON body
pub fn unframe(payload: &str) -> Result<(EntryCategory, &str)> {
    let mut chars = payload.chars();
    let tag = chars
        .next()
        .ok_or_else(|| CodecError::Corrupt("empty payload".to_string()))?;
    if chars.next() != Some(FRAME_SEPARATOR) {
        return Err(CodecError::Corrupt("missing category frame".to_string()));
    }

    let category = EntryCategory::from_tag(tag)
        .ok_or_else(|| CodecError::Corrupt(format!("unknown category tag '{tag}'")))?;

    // Tag and separator are both ASCII when we get here
    Ok((category, &payload[2..]))
}

/// Unframe and decode in one step
pub fn decode_payload<T: DeserializeOwned>(payload: &str) -> Result<(EntryCategory, T)> {
    let (category, json) = unframe(payload)?;
    Ok((category, decode(json)?))
}
