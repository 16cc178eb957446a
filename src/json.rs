//! Lenient field decoding for the site's JSON replies.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// Accepts a JSON string or number for a `String` field.
///
/// The site documents these identifiers as strings but has been seen sending
/// bare numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Unsigned(value) => value.to_string(),
        TextOrNumber::Signed(value) => value.to_string(),
        TextOrNumber::Float(value) => value.to_string(),
    })
}
