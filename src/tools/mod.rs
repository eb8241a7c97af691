//! Tool handlers.
//!
//! Each handler owns the logic for a group of related tools and returns the
//! final response text; the MCP service layer only wires inputs in and wraps
//! the text (or error) for the transport.

pub mod connection;
pub mod data;
pub mod format;
pub mod query;
pub mod schema;
pub mod table;

pub use connection::ConnectionToolHandler;
pub use data::DataToolHandler;
pub use query::QueryToolHandler;
pub use schema::SchemaToolHandler;
pub use table::TableToolHandler;
