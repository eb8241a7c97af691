//! Connection lifecycle tools.
//!
//! Implements `postgres_connect`, `postgres_disconnect`,
//! `postgres_list_connections`, and `postgres_health_check` on top of the
//! connection registry.

use crate::db::ConnectionRegistry;
use crate::error::PgResult;
use crate::models::{ConnectParams, DEFAULT_CONNECTION_NAME, DEFAULT_PG_PORT, HealthStatus};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

fn default_connection_name() -> String {
    DEFAULT_CONNECTION_NAME.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PG_PORT
}

/// Input for the postgres_connect tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConnectInput {
    /// Database host
    pub host: String,
    /// Database port. Default: 5432
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name
    pub database: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Name to register this connection under. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
}

/// Input for tools that only take a connection name.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConnectionNameInput {
    /// Name of the connection. Default: "default"
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
}

/// Handler for connection lifecycle tools.
pub struct ConnectionToolHandler {
    registry: Arc<ConnectionRegistry>,
}

impl ConnectionToolHandler {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Open a connection and register it under the given name.
    pub async fn connect(&self, input: ConnectInput) -> PgResult<String> {
        let params = ConnectParams {
            host: input.host,
            port: input.port,
            database: input.database,
            user: input.user,
            password: input.password,
        };

        let info = self.registry.connect(&input.connection_name, params).await?;

        let mut message = format!(
            "Successfully connected to database '{}' on {}:{} as '{}'",
            info.database, info.host, info.port, info.user
        );
        if let Some(version) = &info.server_version {
            message.push_str(&format!("\nServer: {}", version));
        }
        Ok(message)
    }

    /// Close and remove a registered connection.
    pub async fn disconnect(&self, input: ConnectionNameInput) -> PgResult<String> {
        self.registry.disconnect(&input.connection_name).await?;
        Ok(format!(
            "Successfully disconnected from '{}'",
            input.connection_name
        ))
    }

    /// List all registered connections with a per-entry summary.
    pub async fn list_connections(&self) -> PgResult<String> {
        let summaries = self.registry.list().await;

        if summaries.is_empty() {
            return Ok("No active connections".to_string());
        }

        let mut output = format!("Active connections ({}):", summaries.len());
        for summary in summaries {
            match summary.error {
                None => output.push_str(&format!(
                    "\n- '{}': database={}, user={}, connected_at={}",
                    summary.name,
                    summary.database.as_deref().unwrap_or("?"),
                    summary.user.as_deref().unwrap_or("?"),
                    summary.connected_at.to_rfc3339()
                )),
                Some(error) => output.push_str(&format!(
                    "\n- '{}': error: {}",
                    summary.name, error
                )),
            }
        }
        Ok(output)
    }

    /// Probe a connection with a trivial round-trip query.
    pub async fn health_check(&self, input: ConnectionNameInput) -> PgResult<String> {
        let status = self.registry.health(&input.connection_name).await?;
        info!(
            connection_name = %input.connection_name,
            healthy = status.is_healthy(),
            "Health check"
        );

        match status {
            HealthStatus::Healthy => Ok(format!(
                "Connection '{}' is healthy",
                input.connection_name
            )),
            HealthStatus::Unhealthy(message) => Ok(format!(
                "Connection '{}' is unhealthy: {}",
                input.connection_name, message
            )),
        }
    }
}
