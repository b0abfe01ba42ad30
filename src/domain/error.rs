use thiserror::Error;

pub const MSG_INVALID_URL: &str = "Invalid Instagram URL";
pub const MSG_PRIVATE: &str = "Private / unavailable video";
pub const MSG_BACKEND: &str = "Server waking up, please wait.";
pub const MSG_GENERIC: &str = "Something went wrong. Please try again.";
pub const MSG_SAVE_FAILED: &str = "Could not save the video. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Invalid Instagram URL")]
    InvalidInput,

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("No video found or private content")]
    NoVideoFound,

    #[error("{0}")]
    Unknown(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// The one sentence shown to the user. Never includes the cause text.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InvalidInput => MSG_INVALID_URL,
            AppError::NoVideoFound => MSG_PRIVATE,
            AppError::BackendUnavailable(_) => MSG_BACKEND,
            AppError::Io(_) => MSG_SAVE_FAILED,
            AppError::Unknown(cause) => classify_cause(cause),
        }
    }
}

/// Maps a free-form cause onto one of the user-facing categories.
pub fn classify_cause(cause: &str) -> &'static str {
    let cause = cause.to_lowercase();
    let has = |needle: &str| cause.contains(needle);

    if has("valid") {
        MSG_INVALID_URL
    } else if has("private") || has("not found") || has("no video") {
        MSG_PRIVATE
    } else if has("backend unavailable") || has("timeout") || has("timed out") || has("fetch") {
        MSG_BACKEND
    } else {
        MSG_GENERIC
    }
}
