// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Helpers for the stored profile-photo JSON.

use serde_json::Value;

/// Extract `thumbnailUrl` from a stored profile-photo document.
///
/// Clients have stored both a JSON object and a JSON string wrapping an
/// object, so both are accepted. Anything missing or malformed yields an
/// empty string.
pub fn thumbnail_url(profile_photo: Option<&str>) -> String {
    let Some(raw) = profile_photo.filter(|s| !s.trim().is_empty()) else {
        return String::new();
    };

    let parsed = match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner),
        other => other,
    };

    match parsed {
        Ok(value) => value
            .get("thumbnailUrl")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        Err(e) => {
            tracing::debug!(error = %e, "Profile photo JSON is not valid");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHOTO: &str = r#"{"profilePhotoUrl":"https://example.com/p.jpeg","thumbnailUrl":"https://example.com/t.jpeg"}"#;

    #[test]
    fn test_thumbnail_from_object() {
        assert_eq!(thumbnail_url(Some(PHOTO)), "https://example.com/t.jpeg");
    }

    #[test]
    fn test_thumbnail_from_string_wrapped_object() {
        let wrapped = serde_json::to_string(PHOTO).unwrap();
        assert_eq!(thumbnail_url(Some(&wrapped)), "https://example.com/t.jpeg");
    }

    #[test]
    fn test_thumbnail_missing_or_invalid() {
        assert_eq!(thumbnail_url(None), "");
        assert_eq!(thumbnail_url(Some("")), "");
        assert_eq!(thumbnail_url(Some("{not json")), "");
        assert_eq!(thumbnail_url(Some(r#"{"profilePhotoUrl":"x"}"#)), "");
    }
}
