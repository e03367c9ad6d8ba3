//! Graph session.
//!
//! A [`Graph`] owns a [`Cursor`] bound to one graph: opening it creates the
//! graph if needed, resolves its catalog oid and points `graph_path` at it.
//! Everything else (counting, label catalog lookups, entity creation, lazy
//! property resolution, subgraph materialization and import) goes through
//! the cursor.

use std::collections::{BTreeMap, HashMap, HashSet};

use agens_core::cypher::{self, Direction, PatternFilter, SubgraphQuery, WhereClause};
use agens_core::ddl::{self, LabelColumn, LabelKind};
use agens_core::export::{AttrMap, ExportOptions, JsonGraph};
use agens_core::import::{self, ImportOptions};
use agens_core::{
    AgensError, ConnectionConfig, Edge, Entity, GraphId, GraphOptions, LabelHierarchy, Properties,
    Row, Subgraph, Vertex,
};
use anyhow::{Context, Result};
use petgraph::graph::{DiGraph, Graph as PetGraph, IndexType};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::connection::{self, Connection, PgConnection};
use crate::cursor::Cursor;

/// Progress of an import, reported after every created entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub created: usize,
    pub total: usize,
}

/// A session bound to one graph.
pub struct Graph<C> {
    cursor: Cursor<C>,
    name: String,
    graphid: u32,
}

fn into_properties(value: Option<Value>) -> Properties {
    match value {
        Some(Value::Object(map)) => map,
        _ => Properties::new(),
    }
}

fn attrs_to_properties(attrs: &AttrMap) -> Properties {
    attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// `id(v), label(v), properties(v)`
fn vertex_from_row(row: &Row) -> Result<Vertex> {
    let mut vertex = Vertex::new(row.get(0)?);
    if let Some(label) = row.get_opt::<String>(1)? {
        vertex.set_label(label);
    }
    vertex.set_properties(into_properties(row.get_opt(2)?));
    Ok(vertex)
}

/// `id(e), id(s), id(t), label(e), properties(e)`
fn edge_from_row(row: &Row) -> Result<Edge> {
    let mut edge = Edge::new(row.get(0)?, row.get(1)?, row.get(2)?);
    if let Some(label) = row.get_opt::<String>(3)? {
        edge.set_label(label);
    }
    edge.set_properties(into_properties(row.get_opt(4)?));
    Ok(edge)
}

/// Endpoint ids of `edges`, first occurrence order.
fn endpoint_ids(edges: &[Edge]) -> Vec<GraphId> {
    let mut seen = HashSet::new();
    edges
        .iter()
        .flat_map(|e| [e.sid(), e.tid()])
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Repeat a single value `n` times, or require exactly `n` values.
fn broadcast<T: Clone>(values: &[T], n: usize, what: &str) -> Result<Vec<Option<T>>> {
    match values.len() {
        0 => Ok(vec![None; n]),
        1 => Ok(vec![Some(values[0].clone()); n]),
        len if len == n => Ok(values.iter().cloned().map(Some).collect()),
        len => Err(AgensError::validation(format!("expected 1 or {} {}, got {}", n, what, len)).into()),
    }
}

impl Graph<PgConnection> {
    /// Connect and open a graph. The graph owner defaults to the connecting user.
    pub async fn connect(config: &ConnectionConfig, mut opts: GraphOptions) -> Result<Self> {
        if opts.authorization.is_none() {
            opts.authorization = Some(config.user.clone());
        }
        let conn = connection::connect(config).await?;
        Self::open(conn, opts).await
    }

    /// Connect to a graph that must already exist.
    pub async fn connect_existing(config: &ConnectionConfig, opts: GraphOptions) -> Result<Self> {
        let conn = connection::connect(config).await?;
        Self::open_existing(conn, opts).await
    }

    /// End the session and close the connection.
    pub async fn close(self) -> Result<()> {
        info!(graph = %self.name, "Closing graph session");
        self.cursor.into_connection().close().await
    }
}

impl<C: Connection> Graph<C> {
    /// Open a graph over an established connection.
    pub async fn open(conn: C, opts: GraphOptions) -> Result<Self> {
        Self::open_with_cursor(Cursor::new(conn), opts).await
    }

    pub async fn open_with_cursor(mut cursor: Cursor<C>, opts: GraphOptions) -> Result<Self> {
        let GraphOptions {
            name,
            authorization,
            replace,
            history_limit,
        } = opts;
        cursor.set_history_limit(history_limit);

        if replace {
            cursor
                .drop_graph(&name, true)
                .await
                .with_context(|| format!("Failed to drop graph '{}'", name))?;
            info!(graph = %name, "Dropped existing graph");
        }
        cursor
            .create_graph(&name, true, authorization.as_deref())
            .await
            .with_context(|| format!("Failed to create graph '{}'", name))?;
        Self::attach(cursor, name).await
    }

    /// Open a graph without creating it; a missing graph is an error.
    /// `authorization` and `replace` are ignored.
    pub async fn open_existing(conn: C, opts: GraphOptions) -> Result<Self> {
        let cursor = Cursor::new(conn).history_limit(opts.history_limit);
        Self::attach(cursor, opts.name).await
    }

    /// Resolve the graph oid and point `graph_path` at it.
    async fn attach(mut cursor: Cursor<C>, name: String) -> Result<Self> {
        let graphid: u32 = cursor
            .query_scalar(&ddl::graph_oid(&name))
            .await
            .with_context(|| format!("Graph '{}' does not exist", name))?;
        cursor.set_graph_path(&name).await?;

        info!(graph = %name, graphid, "Graph session opened");
        Ok(Self {
            cursor,
            name,
            graphid,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Oid of the graph in `ag_graph`, the key of its labels in `ag_label`.
    pub fn graphid(&self) -> u32 {
        self.graphid
    }

    pub fn cursor(&self) -> &Cursor<C> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor<C> {
        &mut self.cursor
    }

    pub fn into_cursor(self) -> Cursor<C> {
        self.cursor
    }

    pub async fn graph_path(&mut self) -> Result<Option<String>> {
        self.cursor.graph_path().await
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.cursor.commit().await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.cursor.rollback().await
    }

    // ------------------------------------------------------------------------
    // Counting
    // ------------------------------------------------------------------------

    /// Number of vertices.
    pub async fn nv(&mut self) -> Result<u64> {
        self.numv(None, &Properties::new(), None).await
    }

    /// Number of edges.
    pub async fn ne(&mut self) -> Result<u64> {
        self.nume(None, &Properties::new(), None).await
    }

    pub async fn numv(
        &mut self,
        label: Option<&str>,
        properties: &Properties,
        where_clause: Option<&WhereClause>,
    ) -> Result<u64> {
        let filter = PatternFilter {
            label: label.map(str::to_string),
            properties: properties.clone(),
        };
        self.cursor
            .query_scalar(&cypher::count_vertices(&filter, where_clause))
            .await
    }

    pub async fn nume(
        &mut self,
        label: Option<&str>,
        properties: &Properties,
        where_clause: Option<&WhereClause>,
    ) -> Result<u64> {
        let filter = PatternFilter {
            label: label.map(str::to_string),
            properties: properties.clone(),
        };
        self.cursor
            .query_scalar(&cypher::count_edges(&filter, where_clause))
            .await
    }

    // ------------------------------------------------------------------------
    // Label catalog
    // ------------------------------------------------------------------------

    pub async fn labels(&mut self, kind: LabelKind) -> Result<Vec<String>> {
        let rows = self.cursor.query(&ddl::label_names(self.graphid, kind)).await?;
        rows.iter()
            .map(|row| row.get::<String>(0).map_err(Into::into))
            .collect()
    }

    pub async fn vlabels(&mut self) -> Result<Vec<String>> {
        self.labels(LabelKind::Vertex).await
    }

    pub async fn elabels(&mut self) -> Result<Vec<String>> {
        self.labels(LabelKind::Edge).await
    }

    pub async fn label_id(&mut self, kind: LabelKind, name: &str) -> Result<u32> {
        self.cursor
            .query_scalar(&ddl::label_id(self.graphid, name, kind))
            .await
            .with_context(|| format!("Unknown {} '{}'", kind, name))
    }

    async fn label_column_map(&mut self, kind: LabelKind, column: LabelColumn) -> Result<BTreeMap<u32, String>> {
        let rows = self
            .cursor
            .query(&ddl::label_column_map(self.graphid, kind, column))
            .await?;
        let mut map = BTreeMap::new();
        for row in &rows {
            map.insert(row.get::<u32>(0)?, row.get::<String>(1)?);
        }
        Ok(map)
    }

    /// Label id → label name.
    pub async fn label_ids(&mut self, kind: LabelKind) -> Result<BTreeMap<u32, String>> {
        self.label_column_map(kind, LabelColumn::Labid).await
    }

    /// Backing relation oid → label name.
    pub async fn label_relids(&mut self, kind: LabelKind) -> Result<BTreeMap<u32, String>> {
        self.label_column_map(kind, LabelColumn::Relid).await
    }

    /// Inheritance between the labels of one kind.
    pub async fn label_inheritance(&mut self, kind: LabelKind) -> Result<LabelHierarchy> {
        let relids = self.label_relids(kind).await?;
        let rows = self
            .cursor
            .query(&ddl::label_inheritance(self.graphid, kind))
            .await?;

        let mut pairs = Vec::new();
        for row in &rows {
            let parent = row.get::<u32>(0)?;
            let child = row.get::<u32>(1)?;
            match (relids.get(&parent), relids.get(&child)) {
                (Some(p), Some(c)) => pairs.push((p.clone(), c.clone())),
                _ => debug!(parent, child, "Skipping inheritance outside the graph"),
            }
        }

        let mut hierarchy = LabelHierarchy::from_pairs(pairs);
        for label in relids.into_values() {
            hierarchy.add_label(label);
        }
        Ok(hierarchy)
    }

    // ------------------------------------------------------------------------
    // Entity creation
    // ------------------------------------------------------------------------

    /// Create a vertex; the returned value caches the given label and properties.
    pub async fn create_node(&mut self, label: Option<&str>, properties: &Properties) -> Result<Vertex> {
        let id: GraphId = self
            .cursor
            .query_scalar(&cypher::create_vertex(label, properties))
            .await?;
        let mut vertex = Vertex::new(id).with_properties(properties.clone());
        if let Some(label) = label {
            vertex.set_label(label);
        }
        Ok(vertex)
    }

    /// Create `n` vertices. `labels` and `properties` each hold zero values,
    /// one value shared by all vertices, or exactly `n` values.
    pub async fn create_nodes(&mut self, n: usize, labels: &[&str], properties: &[Properties]) -> Result<Vec<Vertex>> {
        let labels = broadcast(labels, n, "labels")?;
        let properties = broadcast(properties, n, "property maps")?;
        let mut vertices = Vec::with_capacity(n);
        for (label, props) in labels.into_iter().zip(properties) {
            let props = props.unwrap_or_default();
            vertices.push(self.create_node(label, &props).await?);
        }
        Ok(vertices)
    }

    /// Create an edge; without a target the edge loops back to `source`.
    pub async fn create_edge(
        &mut self,
        source: &Vertex,
        label: Option<&str>,
        target: Option<&Vertex>,
        properties: &Properties,
    ) -> Result<Edge> {
        let Some(target) = target else {
            return self.create_self_loop(source, label, properties).await;
        };
        let id: GraphId = self
            .cursor
            .query_scalar(&cypher::create_edge(&source.id(), label, &target.id(), properties))
            .await?;
        Ok(Self::created_edge(id, source.id(), target.id(), label, properties))
    }

    pub async fn create_self_loop(&mut self, vertex: &Vertex, label: Option<&str>, properties: &Properties) -> Result<Edge> {
        let id: GraphId = self
            .cursor
            .query_scalar(&cypher::create_self_loop(&vertex.id(), label, properties))
            .await?;
        Ok(Self::created_edge(id, vertex.id(), vertex.id(), label, properties))
    }

    fn created_edge(id: GraphId, sid: GraphId, tid: GraphId, label: Option<&str>, properties: &Properties) -> Edge {
        let mut edge = Edge::new(id, sid, tid).with_properties(properties.clone());
        if let Some(label) = label {
            edge.set_label(label);
        }
        edge
    }

    // ------------------------------------------------------------------------
    // Lazy resolution
    // ------------------------------------------------------------------------

    /// A property from the cache, or from the server on a miss. Never caches.
    pub async fn vertex_property(&mut self, vertex: &Vertex, key: &str) -> Result<Option<Value>> {
        if let Some(value) = vertex.get_cached(key) {
            return Ok(Some(value.clone()));
        }
        let row = self.cursor.query_one(&cypher::vertex_property(&vertex.id(), key)).await?;
        Ok(row.get_opt::<Value>(0)?)
    }

    /// Label from the cache, or from the server (stored when `cache` is set).
    pub async fn vertex_label(&mut self, vertex: &mut Vertex, cache: bool) -> Result<Option<String>> {
        if let Some(label) = vertex.label() {
            return Ok(Some(label.to_string()));
        }
        let row = self.cursor.query_one(&cypher::vertex_label(&vertex.id())).await?;
        let label = row.get_opt::<String>(0)?;
        if cache {
            if let Some(label) = &label {
                vertex.set_label(label.clone());
            }
        }
        Ok(label)
    }

    /// Server copy of all properties; the cache is left alone.
    pub async fn vertex_properties(&mut self, vertex: &Vertex) -> Result<Properties> {
        let row = self.cursor.query_one(&cypher::vertex_properties(&vertex.id())).await?;
        Ok(into_properties(row.get_opt(0)?))
    }

    /// Replace the cached label and properties with the server's.
    pub async fn refresh_vertex(&mut self, vertex: &mut Vertex) -> Result<()> {
        let row = self
            .cursor
            .query_one(&cypher::vertices_by_ids(&[vertex.id()]))
            .await
            .with_context(|| format!("Vertex {} not found", vertex.id()))?;
        let fresh = vertex_from_row(&row)?;
        if let Some(label) = fresh.label() {
            vertex.set_label(label);
        }
        vertex.set_properties(fresh.properties().clone());
        Ok(())
    }

    pub async fn edge_property(&mut self, edge: &Edge, key: &str) -> Result<Option<Value>> {
        if let Some(value) = edge.get_cached(key) {
            return Ok(Some(value.clone()));
        }
        let props = self.edge_properties(edge).await?;
        Ok(props.get(key).cloned())
    }

    pub async fn edge_label(&mut self, edge: &mut Edge, cache: bool) -> Result<Option<String>> {
        if let Some(label) = edge.label() {
            return Ok(Some(label.to_string()));
        }
        let row = self.cursor.query_one(&cypher::edge_label(&edge.id())).await?;
        let label = row.get_opt::<String>(0)?;
        if cache {
            if let Some(label) = &label {
                edge.set_label(label.clone());
            }
        }
        Ok(label)
    }

    pub async fn edge_properties(&mut self, edge: &Edge) -> Result<Properties> {
        let row = self.cursor.query_one(&cypher::edge_properties(&edge.id())).await?;
        Ok(into_properties(row.get_opt(0)?))
    }

    pub async fn refresh_edge(&mut self, edge: &mut Edge) -> Result<()> {
        let row = self
            .cursor
            .query_one(&cypher::edges_by_ids(&[edge.id()]))
            .await
            .with_context(|| format!("Edge {} not found", edge.id()))?;
        let fresh = edge_from_row(&row)?;
        if let Some(label) = fresh.label() {
            edge.set_label(label);
        }
        edge.set_properties(fresh.properties().clone());
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Subgraphs
    // ------------------------------------------------------------------------

    /// Vertices by id, with label and properties.
    pub async fn vertices(&mut self, ids: &[GraphId]) -> Result<Vec<Vertex>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.cursor.query(&cypher::vertices_by_ids(ids)).await?;
        rows.iter().map(vertex_from_row).collect()
    }

    async fn edges(&mut self, command: &str) -> Result<Vec<Edge>> {
        let rows = self.cursor.query(command).await?;
        rows.iter().map(edge_from_row).collect()
    }

    /// Every vertex and edge found in any cell of the result.
    ///
    /// Endpoints of returned edges are not fetched, so the result may not
    /// be normalized.
    pub async fn subgraph_query(&mut self, command: &str) -> Result<Subgraph> {
        let rows = self.cursor.query(command).await?;
        Ok(rows.iter().flat_map(Row::entities).collect())
    }

    /// Edges matching `query` together with their endpoint vertices.
    pub async fn subgraph(&mut self, query: &SubgraphQuery) -> Result<Subgraph> {
        let edges = self.edges(&query.render()).await?;
        self.with_endpoints(edges).await
    }

    /// Fetch the endpoints of `edges`. The result is flagged normalized only
    /// when the server returned every endpoint.
    async fn with_endpoints(&mut self, edges: Vec<Edge>) -> Result<Subgraph> {
        let ids = endpoint_ids(&edges);
        let vertices = self.vertices(&ids).await?;
        let fetched: HashSet<GraphId> = vertices.iter().map(Vertex::id).collect();
        let missing = ids.iter().filter(|id| !fetched.contains(id)).count();
        if missing > 0 {
            warn!(missing, "Endpoint vertices missing from fetch");
        }
        debug!(vertices = vertices.len(), edges = edges.len(), "Subgraph fetched");
        Ok(Subgraph::new(vertices, edges, (missing == 0).then_some(true)))
    }

    /// The vertices with `ids` and every edge between them.
    pub async fn node_induced_subgraph(&mut self, ids: &[GraphId]) -> Result<Subgraph> {
        if ids.is_empty() {
            return Ok(Subgraph::new(Vec::new(), Vec::new(), Some(true)));
        }
        let vertices = self.vertices(ids).await?;
        let edges = self.edges(&cypher::edges_between(ids)).await?;
        Ok(Subgraph::new(vertices, edges, Some(true)))
    }

    /// The edges with `ids` and their endpoints.
    pub async fn edge_induced_subgraph(&mut self, ids: &[GraphId]) -> Result<Subgraph> {
        if ids.is_empty() {
            return Ok(Subgraph::new(Vec::new(), Vec::new(), Some(true)));
        }
        let edges = self.edges(&cypher::edges_by_ids(ids)).await?;
        self.with_endpoints(edges).await
    }

    /// Node-induced for vertices, edge-induced for edges. Mixed input is rejected.
    pub async fn induced_subgraph(&mut self, entities: &[Entity]) -> Result<Subgraph> {
        let vertex_ids: Vec<GraphId> = entities
            .iter()
            .filter(|e| matches!(e, Entity::Vertex(_)))
            .map(Entity::id)
            .collect();
        if vertex_ids.len() == entities.len() {
            return self.node_induced_subgraph(&vertex_ids).await;
        }
        if vertex_ids.is_empty() {
            let edge_ids: Vec<GraphId> = entities.iter().map(Entity::id).collect();
            return self.edge_induced_subgraph(&edge_ids).await;
        }
        Err(AgensError::validation("induced subgraph needs only vertices or only edges").into())
    }

    /// Distinct vertices within `depth` hops of `vertex`.
    pub async fn neighbors(&mut self, vertex: &GraphId, depth: u32, direction: Direction) -> Result<Vec<Vertex>> {
        let rows = self.cursor.query(&cypher::neighbors(vertex, depth, direction)).await?;
        rows.iter().map(vertex_from_row).collect()
    }

    /// Node-induced subgraph on `vertex` and its neighbors.
    pub async fn neighborhood_graph(&mut self, vertex: &GraphId, depth: u32, direction: Direction) -> Result<Subgraph> {
        let mut ids = vec![*vertex];
        ids.extend(self.neighbors(vertex, depth, direction).await?.iter().map(Vertex::id));
        self.node_induced_subgraph(&ids).await
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    pub async fn to_petgraph(&mut self, query: &SubgraphQuery, opts: &ExportOptions) -> Result<DiGraph<AttrMap, AttrMap>> {
        Ok(self.subgraph(query).await?.to_petgraph(opts))
    }

    pub async fn to_json_graph(&mut self, query: &SubgraphQuery) -> Result<JsonGraph> {
        Ok(self.subgraph(query).await?.to_json_graph())
    }

    // ------------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------------

    /// Create one vertex per node and one edge per edge of `graph`.
    pub async fn create_from_petgraph<Ty, Ix>(
        &mut self,
        graph: &PetGraph<AttrMap, AttrMap, Ty, Ix>,
        opts: &ImportOptions,
    ) -> Result<Subgraph>
    where
        Ty: EdgeType,
        Ix: IndexType,
    {
        self.create_from_petgraph_with(graph, opts, |_| {}).await
    }

    pub async fn create_from_petgraph_with<Ty, Ix, F>(
        &mut self,
        graph: &PetGraph<AttrMap, AttrMap, Ty, Ix>,
        opts: &ImportOptions,
        mut progress: F,
    ) -> Result<Subgraph>
    where
        Ty: EdgeType,
        Ix: IndexType,
        F: FnMut(ImportProgress),
    {
        let stripper = opts.stripper()?;
        let total = graph.node_count() + graph.edge_count();
        let mut created = 0;

        let mut vertices = Vec::with_capacity(graph.node_count());
        for index in graph.node_indices() {
            let plan = import::plan_vertex(attrs_to_properties(&graph[index]), opts, stripper.as_ref())?;
            vertices.push(self.create_node(plan.label.as_deref(), &plan.properties).await?);
            created += 1;
            progress(ImportProgress { created, total });
        }

        let mut edges = Vec::with_capacity(graph.edge_count());
        for edge in graph.edge_references() {
            let plan = import::plan_edge(attrs_to_properties(edge.weight()), opts, stripper.as_ref())?;
            let source = &vertices[edge.source().index()];
            let target = &vertices[edge.target().index()];
            edges.push(
                self.create_edge(source, plan.label.as_deref(), Some(target), &plan.properties)
                    .await?,
            );
            created += 1;
            progress(ImportProgress { created, total });
        }

        info!(graph = %self.name, vertices = vertices.len(), edges = edges.len(), "Imported petgraph");
        Ok(Subgraph::new(vertices, edges, Some(true)))
    }

    /// Create the vertices and edges of a node-link document.
    ///
    /// A node's own `label` takes precedence over `node_label` but not over
    /// a label attribute; edges behave the same way.
    pub async fn create_from_json_graph(&mut self, doc: &JsonGraph, opts: &ImportOptions) -> Result<Subgraph> {
        self.create_from_json_graph_with(doc, opts, |_| {}).await
    }

    pub async fn create_from_json_graph_with<F>(
        &mut self,
        doc: &JsonGraph,
        opts: &ImportOptions,
        mut progress: F,
    ) -> Result<Subgraph>
    where
        F: FnMut(ImportProgress),
    {
        let stripper = opts.stripper()?;
        let total = doc.nodes.len() + doc.edges.len();
        let mut created = 0;

        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(doc.nodes.len());
        let mut vertices = Vec::with_capacity(doc.nodes.len());
        for node in &doc.nodes {
            if by_id.contains_key(node.id.as_str()) {
                return Err(AgensError::validation(format!("duplicate node id '{}'", node.id)).into());
            }
            let plan = import::plan_entity(
                node.properties.clone(),
                opts.node_label_attr.as_deref(),
                node.label.as_deref().or(opts.node_label.as_deref()),
                stripper.as_ref(),
            )?;
            by_id.insert(node.id.as_str(), vertices.len());
            vertices.push(self.create_node(plan.label.as_deref(), &plan.properties).await?);
            created += 1;
            progress(ImportProgress { created, total });
        }

        let mut edges = Vec::with_capacity(doc.edges.len());
        for edge in &doc.edges {
            let endpoint = |id: &str| {
                by_id.get(id).copied().ok_or_else(|| {
                    AgensError::validation(format!("edge references unknown node '{}'", id))
                })
            };
            let source = endpoint(edge.source.as_str())?;
            let target = endpoint(edge.target.as_str())?;
            let plan = import::plan_entity(
                edge.properties.clone(),
                opts.edge_label_attr.as_deref(),
                edge.label.as_deref().or(opts.edge_label.as_deref()),
                stripper.as_ref(),
            )?;
            let created_edge = self
                .create_edge(
                    &vertices[source],
                    plan.label.as_deref(),
                    Some(&vertices[target]),
                    &plan.properties,
                )
                .await?;
            edges.push(created_edge);
            created += 1;
            progress(ImportProgress { created, total });
        }

        info!(graph = %self.name, vertices = vertices.len(), edges = edges.len(), "Imported JSON graph");
        Ok(Subgraph::new(vertices, edges, Some(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::ScriptedConnection;
    use agens_core::export::{JsonEdge, JsonNode};
    use serde_json::json;

    fn props(v: Value) -> Properties {
        v.as_object().cloned().unwrap()
    }

    async fn open(conn: &ScriptedConnection) -> Graph<ScriptedConnection> {
        conn.push_empty().push_scalar("16384").push_empty();
        Graph::open(conn.clone(), GraphOptions::new("trek").authorization("kirk"))
            .await
            .unwrap()
    }

    /// Commands sent after the three opening ones.
    fn session_commands(conn: &ScriptedConnection) -> Vec<String> {
        conn.sent().split_off(3)
    }

    #[tokio::test]
    async fn test_open_sequence() {
        let conn = ScriptedConnection::new();
        let graph = open(&conn).await;
        assert_eq!(graph.name(), "trek");
        assert_eq!(graph.graphid(), 16384);
        assert_eq!(
            conn.sent(),
            vec![
                "CREATE GRAPH IF NOT EXISTS trek AUTHORIZATION kirk;",
                "SELECT oid FROM pg_catalog.ag_graph WHERE graphname = 'trek';",
                "SET graph_path = trek;",
            ]
        );
    }

    #[tokio::test]
    async fn test_open_with_replace_drops_first() {
        let conn = ScriptedConnection::new();
        conn.push_empty().push_empty().push_scalar("7").push_empty();
        let graph = Graph::open(conn.clone(), GraphOptions::new("g").replace(true))
            .await
            .unwrap();
        assert_eq!(graph.graphid(), 7);
        let sent = conn.sent();
        assert_eq!(sent[0], "DROP GRAPH IF EXISTS g CASCADE;");
        assert_eq!(sent[1], "CREATE GRAPH IF NOT EXISTS g;");
    }

    #[tokio::test]
    async fn test_open_applies_history_limit() {
        let conn = ScriptedConnection::new();
        conn.push_empty().push_scalar("7").push_empty();
        let graph = Graph::open(conn.clone(), GraphOptions::new("g").history_limit(Some(1)))
            .await
            .unwrap();
        assert_eq!(graph.cursor().history().len(), 1);
        assert_eq!(graph.cursor().last_query(), Some("SET graph_path = g;"));
    }

    #[tokio::test]
    async fn test_open_existing_never_creates() {
        let conn = ScriptedConnection::new();
        conn.push_scalar("16384").push_empty();
        let graph = Graph::open_existing(conn.clone(), GraphOptions::new("trek").replace(true))
            .await
            .unwrap();
        assert_eq!(graph.graphid(), 16384);
        assert_eq!(
            conn.sent(),
            vec![
                "SELECT oid FROM pg_catalog.ag_graph WHERE graphname = 'trek';",
                "SET graph_path = trek;",
            ]
        );

        let conn = ScriptedConnection::new();
        conn.push_empty();
        let err = Graph::open_existing(conn.clone(), GraphOptions::new("terk"))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("Graph 'terk' does not exist"));
        assert_eq!(conn.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_open_fails_without_catalog_entry() {
        let conn = ScriptedConnection::new();
        conn.push_empty().push_empty();
        assert!(Graph::open(conn.clone(), GraphOptions::new("g")).await.is_err());
    }

    #[tokio::test]
    async fn test_counts() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_scalar("3").push_scalar("2");
        assert_eq!(graph.nv().await.unwrap(), 3);
        let where_clause = WhereClause::raw("e.weight > 1");
        assert_eq!(
            graph
                .nume(Some("knows"), &Properties::new(), Some(&where_clause))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            session_commands(&conn),
            vec![
                "MATCH (v) RETURN count(v);",
                "MATCH ()-[e:knows]->() WHERE e.weight > 1 RETURN count(e);",
            ]
        );
    }

    #[tokio::test]
    async fn test_label_inheritance_maps_relids() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_rows(
            &["relid", "labname"],
            vec![
                vec![Some("100"), Some("lifeform")],
                vec![Some("101"), Some("humanoid")],
                vec![Some("102"), Some("human")],
                vec![Some("103"), Some("ship")],
            ],
        )
        .push_rows(
            &["inhparent", "relid"],
            vec![
                vec![Some("100"), Some("101")],
                vec![Some("101"), Some("102")],
                vec![Some("9"), Some("100")],
            ],
        );
        let hierarchy = graph.label_inheritance(LabelKind::Vertex).await.unwrap();
        assert_eq!(hierarchy.ancestors("human"), vec!["humanoid", "lifeform"]);
        assert_eq!(hierarchy.roots(), vec!["lifeform", "ship"]);
    }

    #[tokio::test]
    async fn test_create_node_and_edges() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_scalar("3.1").push_scalar("3.2").push_scalar("4.1").push_scalar("4.2");

        let tom = graph
            .create_node(Some("person"), &props(json!({"name": "Tom"})))
            .await
            .unwrap();
        let pat = graph.create_node(Some("person"), &Properties::new()).await.unwrap();
        let knows = graph
            .create_edge(&tom, Some("knows"), Some(&pat), &Properties::new())
            .await
            .unwrap();
        let selfie = graph.create_edge(&tom, None, None, &Properties::new()).await.unwrap();

        assert_eq!(tom.id(), GraphId::new(3, 1));
        assert_eq!(tom.get_cached("name"), Some(&json!("Tom")));
        assert_eq!((knows.sid(), knows.tid()), (tom.id(), pat.id()));
        assert!(selfie.is_self_loop());

        let sent = session_commands(&conn);
        assert_eq!(sent[0], "CREATE (v:person {name: 'Tom'}) RETURN id(v);");
        assert!(sent[2].contains("CREATE (s)-[e:knows]->(t) RETURN id(e);"));
        assert!(sent[3].contains("CREATE (v)-[e]->(v) RETURN id(e);"));
    }

    #[tokio::test]
    async fn test_create_nodes_validates_lengths() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        assert!(graph.create_nodes(3, &["a", "b"], &[]).await.is_err());
        assert!(session_commands(&conn).is_empty());

        conn.push_scalar("3.1").push_scalar("3.2");
        let created = graph.create_nodes(2, &["a"], &[]).await.unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|v| v.label() == Some("a")));
    }

    #[tokio::test]
    async fn test_uncached_lookup_does_not_cache() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        let vertex = Vertex::new(GraphId::new(3, 1)).with_properties(props(json!({"name": "Tom"})));

        assert_eq!(graph.vertex_property(&vertex, "name").await.unwrap(), Some(json!("Tom")));
        assert!(session_commands(&conn).is_empty());

        conn.push_scalar("42");
        assert_eq!(graph.vertex_property(&vertex, "age").await.unwrap(), Some(json!(42)));
        assert_eq!(vertex.get_cached("age"), None);
        assert_eq!(
            session_commands(&conn),
            vec!["MATCH (v) WHERE id(v) = CAST('3.1' AS graphid) RETURN v->>'age';"]
        );
    }

    #[tokio::test]
    async fn test_label_cache_flag() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        let mut vertex = Vertex::new(GraphId::new(3, 1));
        conn.push_scalar("person").push_scalar("person");

        assert_eq!(graph.vertex_label(&mut vertex, false).await.unwrap().as_deref(), Some("person"));
        assert_eq!(vertex.label(), None);
        graph.vertex_label(&mut vertex, true).await.unwrap();
        assert_eq!(vertex.label(), Some("person"));
        graph.vertex_label(&mut vertex, true).await.unwrap();
        assert_eq!(session_commands(&conn).len(), 2);
    }

    #[tokio::test]
    async fn test_subgraph_two_phase() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_rows(
            &["id", "id", "id", "label", "properties"],
            vec![
                vec![Some("4.1"), Some("3.1"), Some("3.2"), Some("knows"), Some(r#"{"since": 2010}"#)],
                vec![Some("4.2"), Some("3.2"), Some("3.1"), Some("knows"), Some("{}")],
            ],
        )
        .push_rows(
            &["id", "label", "properties"],
            vec![
                vec![Some("3.1"), Some("person"), Some(r#"{"name": "Tom"}"#)],
                vec![Some("3.2"), Some("person"), Some(r#"{"name": "Pat"}"#)],
            ],
        );

        let query = SubgraphQuery::new().edge(PatternFilter::new().label("knows"));
        let sub = graph.subgraph(&query).await.unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.edge_count(), 2);
        assert!(sub.normalized());
        assert_eq!(sub.edges()[0].get_cached("since"), Some(&json!(2010)));

        let sent = session_commands(&conn);
        assert!(sent[0].starts_with("MATCH (s)-[e:knows]->(t)"));
        assert_eq!(
            sent[1],
            "MATCH (v) WHERE id(v) IN [CAST('3.1' AS graphid), CAST('3.2' AS graphid)] \
             RETURN id(v), label(v), properties(v);"
        );
    }

    #[tokio::test]
    async fn test_subgraph_with_missing_endpoint_is_not_normalized() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_rows(
            &["id", "id", "id", "label", "properties"],
            vec![vec![Some("4.1"), Some("3.1"), Some("3.2"), Some("knows"), Some("{}")]],
        )
        .push_rows(
            &["id", "label", "properties"],
            vec![vec![Some("3.1"), Some("person"), Some("{}")]],
        );

        let sub = graph.subgraph(&SubgraphQuery::new()).await.unwrap();
        assert_eq!(sub.len(), 1);
        assert!(!sub.normalized());
        assert!(!sub.is_normalized());
    }

    #[tokio::test]
    async fn test_subgraph_query_collects_entity_cells() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_rows(
            &["v", "e"],
            vec![
                vec![Some(r#"person[3.1]{"name": "Tom"}"#), Some("knows[4.1][3.1,3.2]{}")],
                vec![Some(r#"person[3.1]{"name": "Tom"}"#), Some("7")],
            ],
        );
        let sub = graph.subgraph_query("MATCH (v)-[e]->() RETURN v, e").await.unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.edge_count(), 1);
        assert!(!sub.normalized());
    }

    #[tokio::test]
    async fn test_induced_subgraph_rejects_mixed_entities() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        let v = Vertex::new(GraphId::new(3, 1));
        let e = Edge::new(GraphId::new(4, 1), GraphId::new(3, 1), GraphId::new(3, 1));
        let mixed = vec![Entity::from(v), Entity::from(e)];
        assert!(graph.induced_subgraph(&mixed).await.is_err());
        let empty = graph.induced_subgraph(&[]).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_neighborhood_graph_includes_center() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_rows(
            &["id", "label", "properties"],
            vec![vec![Some("3.2"), Some("person"), Some("{}")]],
        );
        graph
            .neighborhood_graph(&GraphId::new(3, 1), 1, Direction::Outgoing)
            .await
            .unwrap();
        let sent = session_commands(&conn);
        assert!(sent[0].starts_with("MATCH (v)-[*1..1]->(n)"));
        assert!(sent[1].contains("CAST('3.1' AS graphid), CAST('3.2' AS graphid)"));
        assert!(sent[2].starts_with("MATCH (s)-[e]->(t) WHERE id(s) IN"));
    }

    #[tokio::test]
    async fn test_create_from_json_graph() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_scalar("3.1").push_scalar("3.2").push_scalar("4.1");
        let doc = JsonGraph {
            directed: true,
            nodes: vec![
                JsonNode {
                    id: "a".to_string(),
                    label: None,
                    properties: props(json!({"node type": "tf gene"})),
                },
                JsonNode {
                    id: "b".to_string(),
                    label: Some("protein".to_string()),
                    properties: Properties::new(),
                },
            ],
            edges: vec![JsonEdge {
                id: None,
                source: "a".to_string(),
                target: "b".to_string(),
                label: None,
                properties: Properties::new(),
            }],
        };
        let opts = ImportOptions::default()
            .node_label("gene")
            .edge_label("regulates")
            .strip_attrs(true);

        let mut seen = Vec::new();
        let sub = graph
            .create_from_json_graph_with(&doc, &opts, |p| seen.push(p.created))
            .await
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.vertices()[0].get_cached("node_type"), Some(&json!("tf_gene")));
        assert_eq!(sub.vertices()[1].label(), Some("protein"));
        assert_eq!(sub.edges()[0].label(), Some("regulates"));

        let sent = session_commands(&conn);
        assert!(sent[0].starts_with("CREATE (v:gene "));
        assert!(sent[1].starts_with("CREATE (v:protein)"));
    }

    #[tokio::test]
    async fn test_json_import_quotes_labels_with_spaces() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_scalar("3.1").push_scalar("3.2").push_scalar("4.1");
        let doc: JsonGraph = serde_json::from_str(
            r#"{"nodes": [{"id": "a", "label": "tf gene"}, {"id": "b", "properties": {"kind": "target gene"}}],
                "edges": [{"source": "a", "target": "b", "label": "binds to"}]}"#,
        )
        .unwrap();
        let opts = ImportOptions::default().node_label_attr("kind");

        let sub = graph.create_from_json_graph(&doc, &opts).await.unwrap();
        assert_eq!(sub.vertices()[0].label(), Some("tf gene"));
        assert_eq!(sub.vertices()[1].label(), Some("target gene"));

        let sent = session_commands(&conn);
        assert_eq!(sent[0], "CREATE (v:`tf gene`) RETURN id(v);");
        assert_eq!(sent[1], "CREATE (v:`target gene`) RETURN id(v);");
        assert!(sent[2].contains("CREATE (s)-[e:`binds to`]->(t) RETURN id(e);"));
    }

    #[tokio::test]
    async fn test_json_import_rejects_unknown_endpoint() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        let doc: JsonGraph =
            serde_json::from_str(r#"{"nodes": [], "edges": [{"source": "x", "target": "y"}]}"#).unwrap();
        assert!(graph
            .create_from_json_graph(&doc, &ImportOptions::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_create_from_petgraph() {
        let conn = ScriptedConnection::new();
        let mut graph = open(&conn).await;
        conn.push_scalar("3.1").push_scalar("3.2").push_scalar("4.1");

        let mut g: DiGraph<AttrMap, AttrMap> = DiGraph::new();
        let mut a_attrs = AttrMap::new();
        a_attrs.insert("kind".to_string(), json!("city"));
        let a = g.add_node(a_attrs);
        let b = g.add_node(AttrMap::new());
        g.add_edge(a, b, AttrMap::new());

        let opts = ImportOptions::default().node_label_attr("kind").node_label("place");
        let sub = graph.create_from_petgraph(&g, &opts).await.unwrap();
        assert_eq!(sub.vertices()[0].label(), Some("city"));
        assert_eq!(sub.vertices()[1].label(), Some("place"));
        assert_eq!(sub.edges()[0].tid(), GraphId::new(3, 2));
    }
}
