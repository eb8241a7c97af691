//! Connection registry.
//!
//! An in-process mapping from a caller-chosen connection name to an open
//! PostgreSQL pool. The registry owns session lifecycle and is the single
//! source of truth for whether a name is usable: a name present here always
//! refers to a pool that was successfully opened and not yet closed.
//!
//! The registry is an explicitly owned object shared via `Arc`, not ambient
//! process state; interior mutation is guarded by `tokio::sync::RwLock`.

use crate::error::{PgError, PgResult};
use crate::models::{ConnectParams, ConnectionInfo, ConnectionSummary, HealthStatus};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug)]
struct RegistryEntry {
    pool: PgPool,
    params: ConnectParams,
    connected_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    entries: Arc<RwLock<HashMap<String, RegistryEntry>>>,
}

impl ConnectionRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Open a session and register it under `name`.
    ///
    /// On failure the registry is left unchanged. On success, a prior entry
    /// under the same name is closed before it is replaced, so reconnecting
    /// under a live name never leaks the old session.
    pub async fn connect(&self, name: &str, params: ConnectParams) -> PgResult<ConnectionInfo> {
        info!(
            connection_name = %name,
            target = %params.target(),
            "Connecting to PostgreSQL"
        );

        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .database(&params.database)
            .username(&params.user)
            .password(&params.password);

        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| {
                PgError::connection(e.to_string(), connection_suggestion(&e))
            })?;

        let server_version = get_server_version(&pool).await;

        let replaced = {
            let mut entries = self.entries.write().await;
            entries.insert(
                name.to_string(),
                RegistryEntry {
                    pool,
                    params: params.clone(),
                    connected_at: chrono::Utc::now(),
                },
            )
        };

        // Close the displaced pool outside the lock
        if let Some(old) = replaced {
            warn!(connection_name = %name, "Replacing existing connection, closing prior session");
            old.pool.close().await;
        }

        info!(
            connection_name = %name,
            server_version = ?server_version,
            "Connected successfully"
        );

        Ok(ConnectionInfo {
            name: name.to_string(),
            host: params.host,
            port: params.port,
            database: params.database,
            user: params.user,
            server_version,
        })
    }

    /// Close and remove the entry for `name`.
    pub async fn disconnect(&self, name: &str) -> PgResult<()> {
        let removed = {
            let mut entries = self.entries.write().await;
            entries.remove(name)
        };

        match removed {
            Some(entry) => {
                entry.pool.close().await;
                info!(connection_name = %name, "Disconnected");
                Ok(())
            }
            None => Err(PgError::connection_not_found(name)),
        }
    }

    /// Look up the pool registered under `name`.
    pub async fn get(&self, name: &str) -> PgResult<PgPool> {
        let entries = self.entries.read().await;
        match entries.get(name) {
            Some(entry) => Ok(entry.pool.clone()),
            None => Err(PgError::connection_not_found(name)),
        }
    }

    /// Check if a connection exists.
    pub async fn exists(&self, name: &str) -> bool {
        let entries = self.entries.read().await;
        entries.contains_key(name)
    }

    /// Get the number of active connections.
    pub async fn connection_count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    /// List all active connections with a per-entry introspection summary.
    ///
    /// Each entry is probed with `SELECT current_database(), current_user`;
    /// a failing entry reports its error without aborting the others.
    pub async fn list(&self) -> Vec<ConnectionSummary> {
        let probes: Vec<(String, PgPool, chrono::DateTime<chrono::Utc>)> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.pool.clone(), entry.connected_at))
                .collect()
        };

        let mut summaries = Vec::with_capacity(probes.len());
        for (name, pool, connected_at) in probes {
            let summary = match sqlx::query_as::<_, (String, String)>(
                "SELECT current_database(), current_user",
            )
            .fetch_one(&pool)
            .await
            {
                Ok((database, user)) => ConnectionSummary {
                    name,
                    database: Some(database),
                    user: Some(user),
                    error: None,
                    connected_at,
                },
                Err(e) => ConnectionSummary {
                    name,
                    database: None,
                    user: None,
                    error: Some(e.to_string()),
                    connected_at,
                },
            };
            summaries.push(summary);
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Probe the connection with a trivial round-trip query.
    ///
    /// Runs `SELECT 1` and confirms the expected scalar; any execution error
    /// or mismatch is unhealthy with the underlying message.
    pub async fn health(&self, name: &str) -> PgResult<HealthStatus> {
        let pool = self.get(name).await?;

        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
            Ok(1) => {
                debug!(connection_name = %name, "Health check passed");
                Ok(HealthStatus::Healthy)
            }
            Ok(other) => Ok(HealthStatus::Unhealthy(format!(
                "Unexpected health probe result: {}",
                other
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    /// Get the registered parameters for a connection (no password exposure
    /// beyond what the caller supplied).
    pub async fn get_params(&self, name: &str) -> PgResult<ConnectParams> {
        let entries = self.entries.read().await;
        match entries.get(name) {
            Some(entry) => Ok(entry.params.clone()),
            None => Err(PgError::connection_not_found(name)),
        }
    }

    /// Close all connections and clear the registry.
    pub async fn close_all(&self) {
        let mut entries = self.entries.write().await;
        for (name, entry) in entries.drain() {
            info!(connection_name = %name, "Closing connection");
            entry.pool.close().await;
        }
        info!("All connections closed");
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the server version from a freshly connected pool.
async fn get_server_version(pool: &PgPool) -> Option<String> {
    match sqlx::query_scalar::<_, String>("SELECT version()")
        .fetch_one(pool)
        .await
    {
        Ok(version) => {
            debug!(version = %version, "Got server version");
            Some(version)
        }
        Err(e) => {
            warn!(error = %e, "Failed to get server version");
            None
        }
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the PostgreSQL server is running and accessible".to_string();
    }

    if error_str.contains("authentication") || error_str.contains("password") {
        return "Verify the username and password".to_string();
    }

    if error_str.contains("does not exist") {
        return "Check that the database name exists".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    "Verify the host, port, database, user, and password".to_string()
}
