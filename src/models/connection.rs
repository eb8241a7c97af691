//! Connection-related data models.
//!
//! This module defines types for PostgreSQL connection parameters and state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default PostgreSQL server port.
pub const DEFAULT_PG_PORT: u16 = 5432;

/// Default connection name used when the caller does not provide one.
pub const DEFAULT_CONNECTION_NAME: &str = "default";

/// Parameters for opening a PostgreSQL session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConnectParams {
    /// Database host
    pub host: String,
    /// Database port. Default: 5432
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name
    pub database: String,
    /// Username
    pub user: String,
    /// Password - never logged
    pub password: String,
}

fn default_port() -> u16 {
    DEFAULT_PG_PORT
}

impl ConnectParams {
    /// Display-safe summary of the connection target (no credentials).
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Build connection parameters from a `postgres://` URL.
    ///
    /// Used for connections preconfigured on the command line. The URL must
    /// carry a host, a database path segment, and a username; the password
    /// defaults to empty when omitted.
    pub fn from_url(url: &url::Url) -> Result<Self, String> {
        let scheme = url.scheme().to_lowercase();
        if scheme != "postgres" && scheme != "postgresql" {
            return Err(format!("Unsupported scheme '{}': expected postgres://", scheme));
        }

        let host = url
            .host_str()
            .ok_or_else(|| "URL is missing a host".to_string())?
            .to_string();
        let database = url
            .path()
            .trim_start_matches('/')
            .to_string();
        if database.is_empty() {
            return Err("URL is missing a database name".to_string());
        }
        let user = url.username().to_string();
        if user.is_empty() {
            return Err("URL is missing a username".to_string());
        }

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PG_PORT),
            database,
            user,
            password: url.password().unwrap_or("").to_string(),
        })
    }
}

/// Summary of an active connection, as reported by list_connections.
/// Never exposes credentials.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ConnectionSummary {
    /// Caller-chosen connection name
    pub name: String,
    /// `current_database()` as reported by the session, or the lookup error
    pub database: Option<String>,
    /// `current_user` as reported by the session
    pub user: Option<String>,
    /// Per-entry introspection error, if the session could not be queried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the connection was registered
    pub connected_at: chrono::DateTime<chrono::Utc>,
}

/// Information returned after a successful connect.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub server_version: Option<String>,
}

/// Result of a health probe against a named connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// Carries the underlying failure message
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}
