//! Error types for reauth.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage, and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for reauth operations.
///
/// Callers that own a request pipeline use [`Error::is_auth_failure`] to
/// decide whether a failure belongs to the refresh coordinator or should be
/// propagated unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (invalid credentials, terminated session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (non-success HTTP status, unexpected responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Credential store errors.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation errors (invalid URL, header, method).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if the server rejected the request's credential.
    ///
    /// Only these failures may be routed into the refresh coordinator.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::Protocol(e) if e.is_auth_error())
    }

    /// Returns true if this error means the session has been torn down.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionExpired))
    }

    /// Returns the HTTP status carried by a protocol error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Response body could not be read or decoded.
    #[error("invalid response body: {message}")]
    Body { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session was terminated; the user must log in again.
    #[error("session expired")]
    SessionExpired,

    /// Refresh token is invalid, expired, or missing.
    #[error("refresh token invalid")]
    RefreshTokenInvalid,

    /// No credential is stored.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The request was not replayed after a refresh because its method is
    /// not idempotent.
    #[error("refusing to replay non-idempotent {method} request")]
    ReplayRefused { method: String },
}

/// Protocol-level errors from HTTP responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error code from the response body (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Create a protocol error carrying only a status code.
    pub fn status(status: u16) -> Self {
        Self::new(status, None, None)
    }

    /// Check if this is an authorization failure (401-class).
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.error.as_deref() == Some("invalid_token")
    }
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Stored data could not be decoded.
    #[error("corrupt credential data: {message}")]
    Corrupt { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API or token endpoint URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// Invalid HTTP method.
    #[error("invalid HTTP method '{value}'")]
    Method { value: String },

    /// Invalid header name or value.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
