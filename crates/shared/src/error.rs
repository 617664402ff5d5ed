use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    Validation,
    RateLimited,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorCode::Unauthorized,
            404 => ErrorCode::NotFound,
            400 | 413 | 415 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            500..=599 => ErrorCode::Internal,
            _ => ErrorCode::Unknown,
        }
    }
}

/// Body returned by the evaluation service alongside a non-2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    /// Server-supplied message, or the generic status-derived one.
    pub fn message_or_status(&self, status: u16) -> String {
        match self.error.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => status_message(status),
        }
    }
}

pub fn status_message(status: u16) -> String {
    format!("API error: {status}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_not_found_and_server_errors() {
        assert_eq!(ErrorCode::from_status(404), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Internal);
        assert_eq!(ErrorCode::from_status(418), ErrorCode::Unknown);
    }

    #[test]
    fn blank_server_message_falls_back_to_status() {
        assert_eq!(ErrorBody::new("  ").message_or_status(500), "API error: 500");
        assert_eq!(ErrorBody::default().message_or_status(404), "API error: 404");
        assert_eq!(
            ErrorBody::new("image unreadable").message_or_status(422),
            "image unreadable"
        );
    }
}
