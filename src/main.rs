//! PostgreSQL MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to connect to PostgreSQL databases and work with their schemas and data.

use clap::Parser;
use pg_mcp_server::config::{Config, TransportMode};
use pg_mcp_server::db::ConnectionRegistry;
use pg_mcp_server::mcp::ServiceSettings;
use pg_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting PostgreSQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let registry = Arc::new(ConnectionRegistry::new());

    // Register preconfigured connections before accepting requests
    let preconfigured = config.parse_databases()?;
    if !preconfigured.is_empty() {
        info!(
            count = preconfigured.len(),
            "Connecting to preconfigured databases"
        );
        for conn in preconfigured {
            info!(name = %conn.name, target = %conn.params.target(), "Connecting");
            registry.connect(&conn.name, conn.params).await?;
        }
    }

    let settings = ServiceSettings {
        timeout_secs: config.query_timeout,
        default_row_limit: config.row_limit,
        strict_clauses: config.strict_clauses,
    };

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(registry, settings);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                registry,
                settings,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
