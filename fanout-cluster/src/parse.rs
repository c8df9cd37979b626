//! Narrow parser for the scheduler tools' free-text key:value replies

use crate::error::ClusterError;

/// Extract the value for `key` from a `key: value` block
///
/// Key match is case-insensitive and the first hit wins; surrounding
/// whitespace is trimmed. Lines without a colon are skipped.
pub fn parse_field<'a>(blob: &'a str, key: &str) -> Option<&'a str> {
    for line in blob.lines() {
        if let Some((k, v)) = line.split_once(':') {
            if k.trim().eq_ignore_ascii_case(key) {
                return Some(v.trim());
            }
        }
    }
    None
}

/// Like [`parse_field`] but a missing key is an error
pub fn require_field<'a>(blob: &'a str, key: &str) -> Result<&'a str, ClusterError> {
    parse_field(blob, key).ok_or_else(|| ClusterError::MissingField {
        field: key.to_string(),
    })
}
