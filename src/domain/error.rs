use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Message safe to show to API clients.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation { message } => message,
        }
    }
}
