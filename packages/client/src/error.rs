//! Error types for the keys client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error reported by the service in a response body, or detected
/// locally in place of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Numeric error code (`errorCode`).
    #[serde(rename = "errorCode")]
    pub code: u64,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// The key or condition that caused the error, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,

    /// Cluster index at the time of the error, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
}

impl ServiceError {
    /// Code raised locally when `update_dir` is called without a TTL.
    pub const TTL_REQUIRED: u64 = 204;

    /// Code raised when the transport has no base URL.
    pub const BASE_URL_NOT_SET: u64 = 205;

    pub fn new(code: u64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
            index: None,
        }
    }

    pub(crate) fn ttl_required() -> Self {
        Self::new(Self::TTL_REQUIRED, "TTL is required")
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)?;
        if let Some(cause) = &self.cause {
            write!(f, " [{}]", cause)?;
        }
        Ok(())
    }
}

/// Errors returned by [`EtcdClient`](crate::EtcdClient) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The key or directory does not exist, or an update precondition
    /// failed.
    #[error("key not found: {0}")]
    KeyNotFound(ServiceError),

    /// A create-only write found the key already present.
    #[error("key exists: {0}")]
    KeyExists(ServiceError),

    /// Any other service-reported error, or a required parameter was
    /// missing.
    #[error("service error: {0}")]
    Service(ServiceError),

    /// The HTTP executor has no base URL configured.
    #[error("base URL not set on HTTP executor")]
    MissingBaseUrl,

    /// Configuration could not be parsed.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] etcdkv_http::Error),

    /// The response body was not valid JSON of the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// The numeric code for service-level errors.
    pub fn code(&self) -> Option<u64> {
        match self {
            Error::KeyNotFound(e) | Error::KeyExists(e) | Error::Service(e) => Some(e.code),
            Error::MissingBaseUrl => Some(ServiceError::BASE_URL_NOT_SET),
            _ => None,
        }
    }

    /// The service error carried by this error, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Error::KeyNotFound(e) | Error::KeyExists(e) | Error::Service(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
