//! CloudSearch API error types.
//!
//! This module defines the error type shared by the configuration API client and
//! the document service client, and maps remote `Error` objects onto it.

use thiserror::Error;

use crate::types::RemoteError;

/// Remote error codes that mean the credentials were rejected.
const AUTHENTICATION_CODES: &[&str] = &[
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "MissingAuthenticationToken",
    "IncompleteSignature",
    "AccessDenied",
    "UnrecognizedClientException",
];

/// Errors from CloudSearch API calls.
///
/// The first four variants form the taxonomy surfaced to callers: bad
/// credentials, unknown domain, a request the service accepted but could not
/// apply, and no usable response at all.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CloudSearchError {
    /// The credentials were rejected.
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// The named domain does not exist.
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// The service echoed back a request it could not apply.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// No response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service returned an `Error` object or a failing status.
    #[error("Service error {code}: {message}")]
    Service { code: String, message: String },

    /// The response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The request was rejected locally before being sent.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CloudSearchError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a malformed request error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    /// Classify a remote `Error` object.
    pub fn from_remote(error: &RemoteError) -> Self {
        let code = error.code.as_str();
        if AUTHENTICATION_CODES.contains(&code) {
            Self::NotAuthenticated(error.message.clone())
        } else if code == "ResourceNotFound" {
            Self::DomainNotFound(error.message.clone())
        } else {
            Self::Service {
                code: error.code.clone(),
                message: error.message.clone(),
            }
        }
    }

    /// Whether the failure means the sync cycle cannot proceed until credentials change.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::NotAuthenticated(_))
    }
}

impl From<reqwest::Error> for CloudSearchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
