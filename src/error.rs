use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} (status={status})")]
    Api { status: StatusCode, message: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

impl Error {
    pub fn api(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "Unknown error".to_string());

        Error::Api { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(error) => error.status(),
            _ => None,
        }
    }
}

pub(crate) fn truncate_for_log(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }

    input.chars().take(max_chars).collect::<String>() + "..."
}

#[cfg(test)]
mod tests {
    use super::{truncate_for_log, Error};
    use reqwest::StatusCode;

    fn message_of(error: Error) -> String {
        match error {
            Error::Api { message, .. } => message,
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn api_error_prefers_body_message() {
        let error = Error::api(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Application name is taken"}"#,
        );
        assert_eq!(error.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(message_of(error), "Application name is taken");
    }

    #[test]
    fn api_error_falls_back_to_status_reason() {
        let error = Error::api(StatusCode::FORBIDDEN, "<html>nope</html>");
        assert_eq!(message_of(error), "Forbidden");

        let error = Error::api(StatusCode::NOT_FOUND, r#"{"message": 17}"#);
        assert_eq!(message_of(error), "Not Found");
    }

    #[test]
    fn api_error_without_reason_is_unknown() {
        let status = StatusCode::from_u16(599).expect("valid status code");
        let error = Error::api(status, "");
        assert_eq!(message_of(error), "Unknown error");
    }

    #[test]
    fn truncates_long_bodies() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdefghij", 4), "abcd...");
    }
}
