//! Agens Core Library
//!
//! IO-free building blocks for AgensGraph clients: command builders,
//! value objects decoded from the server's text format, subgraphs and
//! their in-memory graph conversions.

pub mod config;
pub mod cypher;
pub mod ddl;
pub mod entity;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod import;
pub mod literal;
pub mod row;
pub mod subgraph;

pub use config::{ConnectionConfig, GraphOptions, DEFAULT_HISTORY_LIMIT};
pub use entity::{Edge, Entity, GraphId, GraphPath, Properties, Vertex};
pub use error::{AgensError, AgensResult};
pub use export::{AttrMap, ExportOptions, JsonEdge, JsonGraph, JsonNode};
pub use hierarchy::LabelHierarchy;
pub use import::{EntityPlan, ImportOptions};
pub use row::{FromText, ResultSet, Row};
pub use subgraph::Subgraph;
