//! Error types for the Doctoc MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Doctoc MCP Server
#[derive(Error, Debug)]
pub enum DoctocMcpError {
    /// Remote API errors (Doctoc or Unipile)
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised by the backend clients.
///
/// Never retried. The pricing fallback is the only caller that intercepts one
/// of these and tries an alternate path.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote answered with a non-success HTTP status
    #[error("{service} API error: {status} {status_text} - {body}")]
    RemoteCall {
        service: &'static str,
        endpoint: String,
        status: u16,
        status_text: String,
        body: String,
    },

    /// The request could not be completed (DNS, connect, timeout)
    #[error("{service} request to {endpoint} failed: {source}")]
    Transport {
        service: &'static str,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered 2xx with a body that is not JSON
    #[error("{service} API returned an unreadable {status} response from {endpoint}: {source}")]
    InvalidBody {
        service: &'static str,
        endpoint: String,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// Both the pricing endpoint and its appointment-type fallback failed
    #[error("Prices unavailable ({primary}); fallback failed: {fallback}")]
    FallbackExhausted {
        primary: String,
        #[source]
        fallback: Box<ApiError>,
    },
}

impl ApiError {
    /// HTTP status received from the remote, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RemoteCall { status, .. } | ApiError::InvalidBody { status, .. } => {
                Some(*status)
            }
            ApiError::Transport { .. } => None,
            ApiError::FallbackExhausted { fallback, .. } => fallback.status(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidEnvVar { var: String, value: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },
}

/// Result type alias for server-level operations
pub type Result<T> = std::result::Result<T, DoctocMcpError>;

/// Result type alias for backend client calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_call_display() {
        let err = ApiError::RemoteCall {
            service: "Doctoc",
            endpoint: "getPricesAPI".to_string(),
            status: 404,
            status_text: "Not Found".to_string(),
            body: "no such function".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Doctoc API error: 404 Not Found - no such function"
        );
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_fallback_exhausted_carries_fallback_status() {
        let err = ApiError::FallbackExhausted {
            primary: "Doctoc API error: 501 Not Implemented - ".to_string(),
            fallback: Box::new(ApiError::RemoteCall {
                service: "Doctoc",
                endpoint: "manageUserInfoAPI".to_string(),
                status: 500,
                status_text: "Internal Server Error".to_string(),
                body: String::new(),
            }),
        };
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("fallback failed"));
    }

    #[test]
    fn test_error_conversion() {
        let err: DoctocMcpError = ConfigError::InvalidEnvVar {
            var: "PORT".to_string(),
            value: "abc".to_string(),
        }
        .into();
        assert!(matches!(err, DoctocMcpError::Config(_)));
    }

    #[test]
    fn test_invalid_body_keeps_status() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = ApiError::InvalidBody {
            service: "Unipile",
            endpoint: "/chats".to_string(),
            status: 200,
            source,
        };

        assert_eq!(err.status(), Some(200));
        assert!(err
            .to_string()
            .starts_with("Unipile API returned an unreadable 200 response from /chats"));
    }

    #[test]
    fn test_tool_error_messages() {
        let err = McpError::UnknownTool { name: "nope".to_string() };
        assert_eq!(err.to_string(), "Unknown tool: nope");

        let err = McpError::InvalidArguments { message: "missing field `dayKey`".to_string() };
        assert_eq!(err.to_string(), "Invalid arguments: missing field `dayKey`");
    }
}
