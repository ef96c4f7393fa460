//! Error types for Nucleo protocol operations.

use thiserror::Error;

/// Result type alias for Nucleo operations.
pub type Result<T> = std::result::Result<T, NucleoError>;

/// Error types for Nucleo board communication.
#[derive(Error, Debug)]
pub enum NucleoError {
    /// Endpoint string is not of the form `host:port`
    #[error("Invalid endpoint {0:?}: expected exactly one ':' (host:port)")]
    InvalidEndpoint(String),

    /// Port part of the endpoint is not a valid port number
    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    /// Host lookup returned no usable address
    #[error("Could not resolve {0}")]
    Resolve(String),

    /// Connection was not established within the connect timeout
    #[error("Connection to {endpoint} timed out after {timeout_ms} ms")]
    ConnectTimeout {
        /// Endpoint that was being connected to
        endpoint: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// Connection was refused or otherwise failed
    #[error("Connection failed: {0}")]
    Connect(#[source] std::io::Error),

    /// No reply arrived within the read timeout
    #[error("Timeout waiting for response")]
    ReadTimeout,

    /// General I/O error during write or read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file problem
    #[error("Config error: {0}")]
    Config(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NucleoError {
    /// Whether this error came from the transport (connect, write or read).
    ///
    /// All of these end polling the same way; the variants only differ in
    /// what gets reported.
    pub fn is_communication_failure(&self) -> bool {
        matches!(
            self,
            NucleoError::Resolve(_)
                | NucleoError::ConnectTimeout { .. }
                | NucleoError::Connect(_)
                | NucleoError::ReadTimeout
                | NucleoError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_transport_errors_are_communication_failures() {
        let errors = [
            NucleoError::ConnectTimeout {
                endpoint: "10.0.0.1:61".to_string(),
                timeout_ms: 1000,
            },
            NucleoError::Connect(io::Error::from(io::ErrorKind::ConnectionRefused)),
            NucleoError::ReadTimeout,
            NucleoError::Io(io::Error::from(io::ErrorKind::ConnectionReset)),
            NucleoError::Resolve("nowhere:61".to_string()),
        ];
        for e in &errors {
            assert!(e.is_communication_failure(), "{e}");
        }
    }

    #[test]
    fn test_config_errors_are_not_communication_failures() {
        assert!(!NucleoError::InvalidEndpoint("a:b:c".into()).is_communication_failure());
        assert!(!NucleoError::InvalidPort("abc".into()).is_communication_failure());
        assert!(!NucleoError::Config("missing".into()).is_communication_failure());
    }

    #[test]
    fn test_timeout_message() {
        let e = NucleoError::ConnectTimeout {
            endpoint: "192.168.137.120:61".to_string(),
            timeout_ms: 1000,
        };
        assert_eq!(
            e.to_string(),
            "Connection to 192.168.137.120:61 timed out after 1000 ms"
        );
    }
}
