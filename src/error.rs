use thiserror::Error;

pub const EMPTY_MESSAGE: &str = "Message cannot be empty";
pub const GENERIC_SEND_FAILURE: &str = "Failed to send message";

/// Errors a send can settle with. Both kinds reach the user as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", .0.as_deref().unwrap_or(GENERIC_SEND_FAILURE))]
    SendFailed(Option<String>),
}

impl ChatError {
    pub fn empty_message() -> Self {
        ChatError::Validation(EMPTY_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ChatError::empty_message().to_string(), "Message cannot be empty");
        assert_eq!(ChatError::SendFailed(None).to_string(), "Failed to send message");
        assert_eq!(
            ChatError::SendFailed(Some("recipient unreachable".to_string())).to_string(),
            "recipient unreachable"
        );
    }
}
