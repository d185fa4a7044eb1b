use serde::Deserialize;

/// Error body returned by the API on rejected requests, e.g.
/// `{"error": "Video already liked"}`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message from a raw response body. Falls back to the
    /// trimmed body text when it is not a JSON error object.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed
                .error
                .or(parsed.message)
                .unwrap_or_else(|| body.trim().to_string()),
            Err(_) => body.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_prefers_error_field() {
        assert_eq!(
            ErrorBody::message_from(r#"{"error":"Like not found"}"#),
            "Like not found"
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"message":"Video liked successfully"}"#),
            "Video liked successfully"
        );
        assert_eq!(ErrorBody::message_from("  <html>nope</html> "), "<html>nope</html>");
        assert_eq!(ErrorBody::message_from(""), "");
    }
}
