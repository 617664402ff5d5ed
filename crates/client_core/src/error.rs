use shared::error::ErrorCode;
use thiserror::Error;

pub const MISSING_IMAGES_MESSAGE: &str = "Please select both images";

#[derive(Debug, Clone, Error)]
pub enum EvaluationError {
    /// Local precondition failure; never reaches the network.
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Remote {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("network error: {0}")]
    Transport(String),
}

impl EvaluationError {
    pub fn missing_images() -> Self {
        Self::Validation(MISSING_IMAGES_MESSAGE.to_string())
    }

    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            code: ErrorCode::from_status(status),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Remote {
                code: ErrorCode::NotFound,
                ..
            }
        )
    }

    /// Text shown in the session's error view.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Remote { message, .. } => message.clone(),
            Self::Transport(detail) => format!("Network error: {detail}"),
        }
    }
}

impl From<reqwest::Error> for EvaluationError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Transport(format!("malformed response: {value}"));
        }
        Self::Transport(value.to_string())
    }
}
