//! Configuration management for the Doctoc MCP Server
//!
//! Reads credentials and transport settings from the environment once at
//! startup. The resulting [`Config`] is passed explicitly to both clients.

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default Doctoc Cloud Functions host
pub const DEFAULT_DOCTOC_API_URL: &str = "https://us-central1-doctoc-platform.cloudfunctions.net";

/// Default port for the HTTP transport
pub const DEFAULT_PORT: u16 = 3000;

/// Transport the MCP server listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout
    #[default]
    Stdio,
    /// Stateless JSON-RPC over `POST /mcp`
    Http,
}

/// Credentials for the Doctoc practice-management API
#[derive(Debug, Clone, Default)]
pub struct DoctocCredentials {
    /// Base URL, endpoint names are appended as a path segment
    pub api_url: String,

    /// Bearer token
    pub api_token: String,

    /// Organization id merged into every request body as `orgID`
    pub org_id: String,
}

/// Credentials for the Unipile messaging API
#[derive(Debug, Clone, Default)]
pub struct UnipileCredentials {
    /// Account DSN (base URL)
    pub dsn: String,

    /// Value of the `X-API-KEY` header
    pub api_key: String,
}

/// Configuration for the Doctoc MCP Server
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub doctoc: DoctocCredentials,

    pub unipile: UnipileCredentials,

    pub transport: Transport,

    /// Port for the HTTP transport
    pub port: u16,

    /// Client-side timeout for outbound calls; `None` leaves the transport default
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let transport = match var("TRANSPORT").as_deref() {
            Some("http") => Transport::Http,
            _ => Transport::Stdio,
        };

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: "PORT".to_string(),
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        // Zero would make every outbound call time out immediately
        let request_timeout = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidEnvVar {
                        var: "REQUEST_TIMEOUT_SECS".to_string(),
                        value: raw,
                    }
                    .into())
                }
            },
            None => None,
        };

        Ok(Self {
            doctoc: DoctocCredentials {
                api_url: var("DOCTOC_API_URL").unwrap_or_else(|| DEFAULT_DOCTOC_API_URL.to_string()),
                api_token: var("DOCTOC_API_TOKEN").unwrap_or_default(),
                org_id: var("DOCTOC_ORG_ID").unwrap_or_default(),
            },
            unipile: UnipileCredentials {
                dsn: var("UNIPILE_DSN").unwrap_or_default(),
                api_key: var("UNIPILE_API_KEY").unwrap_or_default(),
            },
            transport,
            port,
            request_timeout,
        })
    }

    /// Names of credential variables that are empty
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            ("DOCTOC_API_TOKEN", self.doctoc.api_token.is_empty()),
            ("DOCTOC_ORG_ID", self.doctoc.org_id.is_empty()),
            ("UNIPILE_DSN", self.unipile.dsn.is_empty()),
            ("UNIPILE_API_KEY", self.unipile.api_key.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }
}
