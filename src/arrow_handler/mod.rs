//! Arrow IPC snapshot of a loaded table
pub mod builder;
pub mod parser;

// Re-export commonly used functions
pub use builder::{build_record_batch, snapshot_bytes, table_schema, write_snapshot};
pub use parser::{parse_snapshot, read_snapshot};
