//! Error types for CemtrAS
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Errors fall into four families: configuration problems (missing or
//! invalid credentials), local validation failures, provider failures
//! returned by the hosted model, and storage failures. Provider failures are
//! classified into [`ProviderError`] at the point the HTTP response is
//! inspected, so callers never need to match on message text.

use thiserror::Error;

/// Main error type for CemtrAS operations
#[derive(Error, Debug)]
pub enum CemtrasError {
    /// Configuration-related errors (missing credential, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local persistence errors (user record or chat history)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sled::Error> for CemtrasError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Classified failure of a single model call
///
/// Each variant corresponds to one user-facing message. None of them are
/// retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The API credential is missing, malformed, or rejected
    #[error("invalid or missing API credential: {0}")]
    Configuration(String),

    /// The provider reported quota or rate-limit exhaustion
    #[error("provider quota exhausted: {0}")]
    RateLimited(String),

    /// The provider refused the prompt or the answer on safety grounds
    #[error("content blocked by safety filters: {0}")]
    ContentBlocked(String),

    /// The provider answered successfully but returned no text
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// Any other network, HTTP, or decoding failure
    #[error("technical failure: {0}")]
    Technical(String),
}

impl ProviderError {
    /// Human-readable message shown to the user for this failure
    ///
    /// # Examples
    ///
    /// ```
    /// use cemtras::error::ProviderError;
    ///
    /// let err = ProviderError::RateLimited("429".to_string());
    /// assert!(err.user_message().contains("quota"));
    /// ```
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => {
                "Invalid API key. Please check your Gemini API key configuration."
            }
            Self::RateLimited(_) => {
                "API quota exceeded. Please try again later or check your billing settings."
            }
            Self::ContentBlocked(_) => {
                "Content was blocked by safety filters. Please rephrase your question."
            }
            Self::EmptyResponse | Self::Technical(_) => {
                "Technical system error occurred. Please try again or contact support."
            }
        }
    }
}

/// Local validation failures
///
/// These block only the offending action and never reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Display name shorter than the minimum after trimming
    #[error("Name must be at least {min} characters long")]
    NameTooShort {
        /// Minimum accepted length
        min: usize,
    },

    /// Message empty after trimming
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// Message longer than the configured character limit
    #[error("Message is too long ({len} characters, maximum is {max})")]
    MessageTooLong {
        /// Length of the rejected message in characters
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Attachment MIME type outside the allow-list
    #[error("File '{name}' has unsupported type '{mime_type}'")]
    UnsupportedFileType {
        /// File name as selected
        name: String,
        /// Inferred MIME type
        mime_type: String,
    },

    /// Attachment larger than the configured ceiling
    #[error("File '{name}' is too large ({size} bytes, maximum is {max} bytes)")]
    FileTooLarge {
        /// File name as selected
        name: String,
        /// Actual size in bytes
        size: u64,
        /// Configured ceiling in bytes
        max: u64,
    },
}

/// Message shown when no model credential is configured
pub const MISSING_API_KEY_MESSAGE: &str =
    "GEMINI_API_KEY is not configured. Please set GEMINI_API_KEY in your environment variables.";

/// Failure of a chat session operation
///
/// This is what the session banner displays. A configuration error is
/// persistent until the credential is fixed; the other kinds can be dismissed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No usable model credential
    #[error("{0}")]
    Configuration(String),

    /// A send was attempted while an error banner is still shown
    #[error("Dismiss the current error with /dismiss before sending another message")]
    ErrorActive,

    /// A send was attempted while a response is still pending
    #[error("A response is still pending; wait for it before sending again")]
    Busy,

    /// The message or an attachment failed local validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The model call failed
    #[error("{}", .0.user_message())]
    Provider(#[from] ProviderError),
}

impl SessionError {
    /// Error raised when a send is attempted without a credential
    pub fn missing_credential() -> Self {
        Self::Configuration(MISSING_API_KEY_MESSAGE.to_string())
    }

    /// Whether `dismiss_error` leaves this error in place
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result type alias for CemtrAS operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
