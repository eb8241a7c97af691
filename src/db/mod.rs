//! Database layer: connection registry, statement assembly and execution,
//! and PostgreSQL type decoding.

pub mod executor;
pub mod registry;
pub mod statements;
pub mod types;

pub use executor::StatementExecutor;
pub use registry::ConnectionRegistry;
