//! Error types for the MC protocol client.

use std::io;
use thiserror::Error;

/// Result type alias for MC protocol operations.
pub type Result<T> = std::result::Result<T, McError>;

/// Errors that can occur while talking to a PLC.
#[derive(Debug, Error)]
pub enum McError {
    /// The socket could not be created or connected.
    #[error("cannot establish connection to {addr}: {source}")]
    Connection {
        /// The `host:port` that was being connected to.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Transport mode other than TCP or UDP.
    #[error("unsupported mode '{mode}': expected TCP or UDP")]
    UnsupportedMode {
        /// The rejected mode string.
        mode: String,
    },

    /// Sending the request frame failed. Never retried.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// Receiving the response failed on both attempts.
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    /// No response arrived within the timeout on both attempts.
    #[error("receive timed out")]
    Timeout,

    /// Other I/O error, e.g. closing an already closed connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The PLC answered with a non-zero end code.
    #[error("PLC end code {code}")]
    EndCode {
        /// End code as sent by the PLC (normally 4 hex characters).
        code: String,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Invalid response received from PLC.
    #[error("Invalid response: {reason}")]
    InvalidResponse {
        /// Description of the response error.
        reason: String,
    },
}

impl McError {
    /// Creates a new `EndCode` error.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::end_code("C059");
    /// assert!(err.is_device_error());
    /// ```
    pub fn end_code(code: impl Into<String>) -> Self {
        Self::EndCode { code: code.into() }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::invalid_parameter("count", "must be greater than 0");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures of the channel itself (connect, send,
    /// receive, timeout, close).
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// assert!(McError::Timeout.is_transport());
    /// assert!(!McError::end_code("C059").is_transport());
    /// ```
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Send(_) | Self::Receive(_) | Self::Timeout | Self::Io(_)
        )
    }

    /// Returns `true` when the PLC received the request and reported an error status.
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::EndCode { .. })
    }
}
