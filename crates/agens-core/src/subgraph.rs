//! Client-side bundles of fetched vertices and edges.

use std::collections::{BTreeSet, HashMap};

use crate::entity::{Edge, Entity, GraphId, Vertex};

/// Vertices and edges fetched from the server.
///
/// Both collections keep insertion order and never hold two entities with
/// the same id. The `normalized` flag records whether every edge endpoint
/// is known to be among the vertices; `None` means "not known yet".
#[derive(Debug, Clone, Default)]
pub struct Subgraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    vertex_pos: HashMap<GraphId, usize>,
    edge_pos: HashMap<GraphId, usize>,
    normalized: Option<bool>,
}

impl Subgraph {
    /// Build a subgraph; later duplicates of an id are dropped.
    pub fn new<V, E>(vertices: V, edges: E, normalized: Option<bool>) -> Self
    where
        V: IntoIterator<Item = Vertex>,
        E: IntoIterator<Item = Edge>,
    {
        let mut sub = Self::default();
        for v in vertices {
            sub.push_vertex(v);
        }
        for e in edges {
            sub.push_edge(e);
        }
        sub.normalized = normalized;
        sub
    }

    fn push_vertex(&mut self, vertex: Vertex) -> bool {
        if self.vertex_pos.contains_key(&vertex.id()) {
            return false;
        }
        self.vertex_pos.insert(vertex.id(), self.vertices.len());
        self.vertices.push(vertex);
        true
    }

    fn push_edge(&mut self, edge: Edge) -> bool {
        if self.edge_pos.contains_key(&edge.id()) {
            return false;
        }
        self.edge_pos.insert(edge.id(), self.edges.len());
        self.edges.push(edge);
        true
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_vertex(&self, id: &GraphId) -> bool {
        self.vertex_pos.contains_key(id)
    }

    pub fn contains_edge(&self, id: &GraphId) -> bool {
        self.edge_pos.contains_key(id)
    }

    pub fn vertex(&self, id: &GraphId) -> Option<&Vertex> {
        self.vertex_pos.get(id).map(|&i| &self.vertices[i])
    }

    pub fn edge(&self, id: &GraphId) -> Option<&Edge> {
        self.edge_pos.get(id).map(|&i| &self.edges[i])
    }

    /// Position of a vertex in [`Subgraph::vertices`].
    pub fn vertex_index(&self, id: &GraphId) -> Option<usize> {
        self.vertex_pos.get(id).copied()
    }

    /// Union of the cached property keys of all vertices.
    pub fn cached_vertex_property_keys(&self) -> BTreeSet<String> {
        self.vertices
            .iter()
            .flat_map(|v| v.cached_keys().cloned())
            .collect()
    }

    /// Union of the cached property keys of all edges.
    pub fn cached_edge_property_keys(&self) -> BTreeSet<String> {
        self.edges
            .iter()
            .flat_map(|e| e.cached_keys().cloned())
            .collect()
    }

    pub fn add(&mut self, entity: Entity) {
        match entity {
            Entity::Vertex(v) => self.add_vertex(v),
            Entity::Edge(e) => self.add_edge(e),
        }
    }

    pub fn extend<I: IntoIterator<Item = Entity>>(&mut self, entities: I) {
        for entity in entities {
            self.add(entity);
        }
    }

    /// Add a vertex unless one with the same id is present.
    pub fn add_vertex(&mut self, vertex: Vertex) {
        self.push_vertex(vertex);
    }

    /// Add an edge along with stubs for endpoints that are not present yet.
    pub fn add_edge(&mut self, edge: Edge) {
        let source = edge.source();
        let target = edge.target();
        if self.push_edge(edge) {
            self.push_vertex(source);
            self.push_vertex(target);
        }
    }

    /// The flag if known, otherwise computed.
    pub fn normalized(&self) -> bool {
        match self.normalized {
            Some(flag) => flag,
            None => self.is_normalized(),
        }
    }

    /// True when every edge endpoint is among the vertices.
    pub fn is_normalized(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.contains_vertex(&e.sid()) && self.contains_vertex(&e.tid()))
    }

    /// Add stubs for missing edge endpoints.
    pub fn normalize(&mut self) {
        let missing: Vec<Vertex> = self
            .edges
            .iter()
            .flat_map(|e| [e.source(), e.target()])
            .filter(|v| !self.contains_vertex(&v.id()))
            .collect();
        for v in missing {
            self.push_vertex(v);
        }
        self.normalized = Some(true);
    }

    /// Replace a vertex with a fuller copy of the same id (e.g. after refetching).
    pub fn update_vertex(&mut self, vertex: Vertex) -> bool {
        match self.vertex_pos.get(&vertex.id()) {
            Some(&i) => {
                self.vertices[i] = vertex;
                true
            }
            None => false,
        }
    }

    /// Ids of vertices that only exist as stubs (no label, nothing cached).
    pub fn stub_vertex_ids(&self) -> Vec<GraphId> {
        self.vertices
            .iter()
            .filter(|v| v.label().is_none() && v.properties().is_empty())
            .map(|v| v.id())
            .collect()
    }
}

impl FromIterator<Entity> for Subgraph {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut sub = Subgraph::default();
        for entity in iter {
            match entity {
                Entity::Vertex(v) => {
                    sub.push_vertex(v);
                }
                Entity::Edge(e) => {
                    sub.push_edge(e);
                }
            }
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vertex(idx: u64) -> Vertex {
        Vertex::new(GraphId::new(3, idx)).with_label("person")
    }

    fn edge(idx: u64, s: u64, t: u64) -> Edge {
        Edge::new(GraphId::new(4, idx), GraphId::new(3, s), GraphId::new(3, t)).with_label("knows")
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let first = vertex(1).with_properties(json!({"name": "Tom"}).as_object().cloned().unwrap());
        let sub = Subgraph::new(vec![first, vertex(1), vertex(2)], vec![edge(1, 1, 2), edge(1, 1, 2)], None);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.vertices()[0].get_cached("name"), Some(&json!("Tom")));
    }

    #[test]
    fn test_normalization() {
        let mut sub = Subgraph::new(vec![vertex(1)], vec![edge(1, 1, 2)], None);
        assert!(!sub.normalized());
        assert!(!sub.is_normalized());
        sub.normalize();
        assert!(sub.normalized());
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.stub_vertex_ids(), vec![GraphId::new(3, 2)]);
    }

    #[test]
    fn test_explicit_flag_wins() {
        let sub = Subgraph::new(vec![vertex(1)], vec![edge(1, 1, 2)], Some(true));
        assert!(sub.normalized());
        assert!(!sub.is_normalized());
    }

    #[test]
    fn test_add_edge_adds_endpoints() {
        let mut sub = Subgraph::default();
        sub.add_vertex(vertex(1));
        sub.add(Entity::Edge(edge(7, 1, 3)));
        assert_eq!(sub.len(), 2);
        assert!(sub.contains_vertex(&GraphId::new(3, 3)));
        assert_eq!(sub.vertex(&GraphId::new(3, 1)).and_then(|v| v.label()), Some("person"));
        assert!(sub.is_normalized());
    }

    #[test]
    fn test_cached_keys() {
        let a = vertex(1).with_properties(json!({"name": "Tom", "age": 3}).as_object().cloned().unwrap());
        let b = vertex(2).with_properties(json!({"name": "Pat", "city": "X"}).as_object().cloned().unwrap());
        let sub = Subgraph::new(vec![a, b], vec![], None);
        let keys: Vec<String> = sub.cached_vertex_property_keys().into_iter().collect();
        assert_eq!(keys, vec!["age", "city", "name"]);
        assert!(sub.cached_edge_property_keys().is_empty());
    }

    #[test]
    fn test_from_iter_and_update() {
        let mut sub: Subgraph = vec![Entity::Vertex(vertex(1)), Entity::Edge(edge(1, 1, 2))]
            .into_iter()
            .collect();
        assert_eq!(sub.len(), 1);
        assert!(!sub.normalized());
        assert!(sub.update_vertex(vertex(1).with_label("human")));
        assert_eq!(sub.vertices()[0].label(), Some("human"));
        assert!(!sub.update_vertex(vertex(9)));
    }
}
