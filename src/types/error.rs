use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Every kind of failure a client of the ShabdSetu API may observe.
///
/// It is serialized as the `type` field of every error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
    Internal,
    InvalidOperation,
    InvalidRecipient,
    InvalidRequest,
    NotFound,
    ReadonlyMode,
    ServiceUnavailable,
    Unauthorized,
    UpstreamFailure,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => f.write_str("Failed to perform request"),
            Self::InvalidOperation => f.write_str("This operation is not allowed"),
            Self::InvalidRecipient => f.write_str("Invalid email recipient"),
            Self::InvalidRequest => f.write_str("User performed request with invalid body"),
            Self::NotFound => f.write_str("Resource not found"),
            Self::ReadonlyMode => f.write_str("Attempt to write read-only database"),
            Self::ServiceUnavailable => f.write_str("Service is not available"),
            Self::Unauthorized => f.write_str("Authentication required"),
            Self::UpstreamFailure => f.write_str("Upstream service failed to process request"),
        }
    }
}
