//! # Agens Graph
//!
//! AgensGraph sessions over tokio-postgres.
//!
//! Provides the [`Connection`] seam, a [`Cursor`] that executes commands
//! and keeps a call history, and the [`Graph`] session with label catalog
//! lookups, lazy entity resolution, subgraph queries and graph import.

pub mod connection;
pub mod cursor;
pub mod graph;

pub use connection::{connect, Connection, PgConnection};
pub use cursor::{AlterGraphCommand, AlterLabelCommand, Cursor, HistoryEntry};
pub use graph::{Graph, ImportProgress};
