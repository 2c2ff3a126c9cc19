//! Status codes shared by the registry, the transport, and the API.
//!
//! Every failure is a `(code, message)` pair. The same value is returned
//! from library calls, logged by background tasks, and serialized verbatim
//! into API responses.

use serde::{Deserialize, Serialize};

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// Malformed endpoint, address, or request field.
    InvalidArgument,
    /// The operation referenced a client, node, topic or service that does not exist.
    NotFound,
    /// The operation would duplicate an existing registration.
    AlreadyExists,
    /// Transport-level failure. The message carries the platform error text.
    NetworkError,
    /// A frame arrived that could not be decoded.
    DataLoss,
    /// An operation was cut short, e.g. a message larger than the channel allows.
    Aborted,
    /// An invariant was violated or a resource pool was exhausted.
    Internal,
    /// The operation exists but is not implemented.
    Unimplemented,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(Code::AlreadyExists, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(Code::NetworkError, message)
    }

    pub fn data_loss(message: impl Into<String>) -> Self {
        Self::new(Code::DataLoss, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(Code::Aborted, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(Code::Unimplemented, message)
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for Status {
    fn from(e: std::io::Error) -> Self {
        Status::network(e.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(e: serde_json::Error) -> Self {
        Status::data_loss(e.to_string())
    }
}
