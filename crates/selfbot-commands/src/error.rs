use selfbot_core::ServiceError;

/// Failure of a command, split by who should see it.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Bad input or nothing to act on. Shown to the user verbatim.
    #[error("{0}")]
    User(String),

    /// A remote call failed. Logged in full; the user only sees a generic
    /// wrapper (see [`CommandError::user_message`]).
    #[error(transparent)]
    System(#[from] ServiceError),
}

impl CommandError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User(message.into())
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    /// Text to put in front of the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::User(message) => message.clone(),
            Self::System(e) => format!("An internal error occurred: {e}"),
        }
    }
}
