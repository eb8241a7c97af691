//! MCP service implementation using rmcp.
//!
//! This module defines the PgService struct with the fixed catalog of
//! fourteen PostgreSQL tools exposed via the MCP protocol using the rmcp
//! framework's macros. Every tool responds with a single text block; errors
//! cross the boundary as MCP error data, never as panics.

use crate::db::{ConnectionRegistry, StatementExecutor};
use crate::tools::connection::{ConnectInput, ConnectionNameInput, ConnectionToolHandler};
use crate::tools::data::{
    DataToolHandler, DeleteDataInput, InsertDataInput, TableDataInput, UpdateDataInput,
};
use crate::tools::query::{ExecuteQueryInput, QueryToolHandler};
use crate::tools::schema::{DescribeTableInput, ListTablesInput, SchemaToolHandler};
use crate::tools::table::{BackupTableInput, CreateTableInput, DropTableInput, TableToolHandler};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// Runtime settings the service passes down to its tool handlers.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Statement timeout in seconds
    pub timeout_secs: u64,
    /// Default row limit for fetched results
    pub default_row_limit: u32,
    /// Reject raw SQL clause fragments in structured tools
    pub strict_clauses: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            timeout_secs: crate::models::DEFAULT_STATEMENT_TIMEOUT_SECS as u64,
            default_row_limit: crate::models::DEFAULT_QUERY_ROW_LIMIT,
            strict_clauses: false,
        }
    }
}

#[derive(Clone)]
pub struct PgService {
    /// Shared connection registry for all database operations
    registry: Arc<ConnectionRegistry>,
    settings: ServiceSettings,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl PgService {
    pub fn new(registry: Arc<ConnectionRegistry>, settings: ServiceSettings) -> Self {
        Self {
            registry,
            settings,
            tool_router: Self::tool_router(),
        }
    }

    fn executor(&self) -> StatementExecutor {
        StatementExecutor::with_defaults(self.settings.timeout_secs, self.settings.default_row_limit)
    }

    fn connection_handler(&self) -> ConnectionToolHandler {
        ConnectionToolHandler::new(self.registry.clone())
    }

    fn query_handler(&self) -> QueryToolHandler {
        QueryToolHandler::new(self.registry.clone(), self.executor())
    }

    fn schema_handler(&self) -> SchemaToolHandler {
        SchemaToolHandler::new(self.registry.clone(), self.executor())
    }

    fn data_handler(&self) -> DataToolHandler {
        DataToolHandler::new(
            self.registry.clone(),
            self.executor(),
            self.settings.strict_clauses,
        )
    }

    fn table_handler(&self) -> TableToolHandler {
        TableToolHandler::new(
            self.registry.clone(),
            self.executor(),
            self.settings.strict_clauses,
        )
    }
}

fn text_result(message: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(message)])
}

#[tool_router]
impl PgService {
    #[tool(
        description = "Connect to a PostgreSQL database.\nRegisters the connection under connection_name (default: \"default\") for use by the other tools.\nReconnecting under an existing name replaces the prior connection."
    )]
    async fn postgres_connect(
        &self,
        Parameters(input): Parameters<ConnectInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.connection_handler().connect(input).await?;
        Ok(text_result(message))
    }

    #[tool(description = "Close a registered PostgreSQL connection.")]
    async fn postgres_disconnect(
        &self,
        Parameters(input): Parameters<ConnectionNameInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.connection_handler().disconnect(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "List all active PostgreSQL connections with their database, user, and connect time."
    )]
    async fn postgres_list_connections(&self) -> Result<CallToolResult, McpError> {
        let message = self.connection_handler().list_connections().await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Execute an arbitrary SQL statement on a registered connection.\nSet fetch_results=false for statements without a result set (DDL, maintenance commands).\nFetched results are limited (default 1000 rows, max 10000)."
    )]
    async fn postgres_execute_query(
        &self,
        Parameters(input): Parameters<ExecuteQueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.query_handler().execute_query(input).await?;
        Ok(text_result(message))
    }

    #[tool(description = "List tables and views in a schema (default: \"public\").")]
    async fn postgres_list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.schema_handler().list_tables(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Describe the columns of a table: name, type, nullability, default, and size/precision."
    )]
    async fn postgres_describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.schema_handler().describe_table(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Read rows from a table with optional WHERE / ORDER BY fragments and LIMIT/OFFSET paging (default limit 100)."
    )]
    async fn postgres_table_data(
        &self,
        Parameters(input): Parameters<TableDataInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.data_handler().table_data(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Create a table from column definitions ({name, type, not_null, default, primary_key}).\nUses IF NOT EXISTS by default."
    )]
    async fn postgres_create_table(
        &self,
        Parameters(input): Parameters<CreateTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.table_handler().create_table(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Drop a table.\nUses IF EXISTS by default; set cascade=true to also drop dependent objects."
    )]
    async fn postgres_drop_table(
        &self,
        Parameters(input): Parameters<DropTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.table_handler().drop_table(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Insert one row or many rows into a table.\nAll rows are inserted in a single transaction; a failure rolls back the whole batch.\nOptional on_conflict fragment, e.g. \"(id) DO NOTHING\"."
    )]
    async fn postgres_insert_data(
        &self,
        Parameters(input): Parameters<InsertDataInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.data_handler().insert_data(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Update rows matching a WHERE clause.\nNew values are passed as bound parameters; the WHERE clause is required."
    )]
    async fn postgres_update_data(
        &self,
        Parameters(input): Parameters<UpdateDataInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.data_handler().update_data(input).await?;
        Ok(text_result(message))
    }

    #[tool(description = "Delete rows matching a WHERE clause. The WHERE clause is required.")]
    async fn postgres_delete_data(
        &self,
        Parameters(input): Parameters<DeleteDataInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.data_handler().delete_data(input).await?;
        Ok(text_result(message))
    }

    #[tool(
        description = "Copy a table into a new backup table (CREATE TABLE ... AS SELECT *) in the same schema."
    )]
    async fn postgres_backup_table(
        &self,
        Parameters(input): Parameters<BackupTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.table_handler().backup_table(input).await?;
        Ok(text_result(message))
    }

    #[tool(description = "Check that a registered connection still responds to queries.")]
    async fn postgres_health_check(
        &self,
        Parameters(input): Parameters<ConnectionNameInput>,
    ) -> Result<CallToolResult, McpError> {
        let message = self.connection_handler().health_check(input).await?;
        Ok(text_result(message))
    }
}

#[tool_handler]
impl ServerHandler for PgService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pg-mcp-server".to_owned(),
                title: Some("PostgreSQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "PostgreSQL tools for connecting to databases and working with their data.\n\
                \n\
                ## Workflow\n\
                1. Call `postgres_connect` with host/database/user/password to open a connection\n\
                2. Run other tools against it; they default to connection_name \"default\"\n\
                3. Register multiple connections under different names to work with several databases\n\
                4. Call `postgres_disconnect` when done\n\
                \n\
                ## Notes\n\
                - `postgres_execute_query` runs arbitrary SQL; set fetch_results=false for DDL\n\
                - Data tools (`postgres_table_data`, `postgres_insert_data`, ...) validate and quote\n\
                  schema/table/column names; WHERE and ORDER BY fragments are passed through as-is\n\
                - `postgres_insert_data` accepts a single row object or an array of rows and inserts\n\
                  them atomically\n\
                - If you see \"No connection found\", call `postgres_connect` (or\n\
                  `postgres_list_connections` to see what is registered)"
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> PgService {
        PgService::new(
            Arc::new(ConnectionRegistry::new()),
            ServiceSettings::default(),
        )
    }

    #[test]
    fn test_service_creation() {
        let _service = create_test_service();
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "pg-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.is_some());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ServiceSettings::default();
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.default_row_limit, 1000);
        assert!(!settings.strict_clauses);
    }
}
