//! Conversion of subgraphs into in-memory graph structures.
//!
//! Three shapes are supported: attributed petgraph graphs, weighted
//! petgraph graphs keyed by [`GraphId`], and a serializable node-link
//! JSON document.

use std::borrow::Cow;
use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Edge, GraphId, Properties, Vertex};
use crate::subgraph::Subgraph;

/// Attributes of an exported vertex or edge.
pub type AttrMap = BTreeMap<String, Value>;

/// How labels and properties are laid out in exported attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Attribute holding the vertex label.
    pub node_label_key: String,
    /// Attribute holding the edge label.
    pub edge_label_key: String,
    /// One attribute per vertex property instead of a single `properties` map.
    pub expand_node_properties: bool,
    pub expand_edge_properties: bool,
    /// Prefix for property attributes, joined with `_`.
    pub node_property_prefix: Option<String>,
    pub edge_property_prefix: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            node_label_key: "label".to_string(),
            edge_label_key: "label".to_string(),
            expand_node_properties: false,
            expand_edge_properties: false,
            node_property_prefix: None,
            edge_property_prefix: None,
        }
    }
}

impl ExportOptions {
    pub fn expand_properties(mut self) -> Self {
        self.expand_node_properties = true;
        self.expand_edge_properties = true;
        self
    }

    pub fn node_label_key(mut self, key: impl Into<String>) -> Self {
        self.node_label_key = key.into();
        self
    }

    pub fn edge_property_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.edge_property_prefix = Some(prefix.into());
        self
    }
}

fn prefixed(prefix: &Option<String>, key: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}_{}", p, key),
        _ => key.to_string(),
    }
}

fn attributes(
    label_key: &str,
    label: Option<&str>,
    properties: &Properties,
    expand_keys: Option<&[String]>,
    prefix: &Option<String>,
) -> AttrMap {
    let mut attrs = AttrMap::new();
    attrs.insert(
        label_key.to_string(),
        label.map(|l| Value::String(l.to_string())).unwrap_or(Value::Null),
    );
    match expand_keys {
        Some(keys) => {
            for key in keys {
                let value = properties.get(key).cloned().unwrap_or(Value::Null);
                attrs.insert(prefixed(prefix, key), value);
            }
        }
        None => {
            attrs.insert(
                prefixed(prefix, "properties"),
                Value::Object(properties.clone()),
            );
        }
    }
    attrs
}

impl Subgraph {
    fn as_normalized(&self) -> Cow<'_, Subgraph> {
        if self.normalized() {
            Cow::Borrowed(self)
        } else {
            let mut sub = self.clone();
            sub.normalize();
            Cow::Owned(sub)
        }
    }

    /// Directed petgraph with attribute maps.
    ///
    /// Vertex `i` of the result is `self.vertices()[i]` (after normalization).
    pub fn to_petgraph(&self, opts: &ExportOptions) -> DiGraph<AttrMap, AttrMap> {
        let sub = self.as_normalized();
        let node_keys: Option<Vec<String>> = opts
            .expand_node_properties
            .then(|| sub.cached_vertex_property_keys().into_iter().collect());
        let edge_keys: Option<Vec<String>> = opts
            .expand_edge_properties
            .then(|| sub.cached_edge_property_keys().into_iter().collect());

        let mut graph = DiGraph::with_capacity(sub.len(), sub.edge_count());
        for v in sub.vertices() {
            graph.add_node(attributes(
                &opts.node_label_key,
                v.label(),
                v.properties(),
                node_keys.as_deref(),
                &opts.node_property_prefix,
            ));
        }
        for e in sub.edges() {
            let (Some(s), Some(t)) = (sub.vertex_index(&e.sid()), sub.vertex_index(&e.tid())) else {
                continue;
            };
            graph.add_edge(
                NodeIndex::new(s),
                NodeIndex::new(t),
                attributes(
                    &opts.edge_label_key,
                    e.label(),
                    e.properties(),
                    edge_keys.as_deref(),
                    &opts.edge_property_prefix,
                ),
            );
        }
        graph
    }

    /// Undirected variant of [`Subgraph::to_petgraph`].
    pub fn to_petgraph_undirected(&self, opts: &ExportOptions) -> UnGraph<AttrMap, AttrMap> {
        self.to_petgraph(opts).into_edge_type()
    }

    /// Weighted graph with vertex ids as node weights.
    ///
    /// The edge weight is read from `weight_attr` when given; a missing or
    /// non-numeric value falls back to `default_weight`.
    pub fn to_weighted(&self, weight_attr: Option<&str>, default_weight: f64) -> DiGraph<GraphId, f64> {
        let sub = self.as_normalized();
        let mut graph = DiGraph::with_capacity(sub.len(), sub.edge_count());
        for v in sub.vertices() {
            graph.add_node(v.id());
        }
        for e in sub.edges() {
            let (Some(s), Some(t)) = (sub.vertex_index(&e.sid()), sub.vertex_index(&e.tid())) else {
                continue;
            };
            let weight = weight_attr
                .and_then(|attr| e.get_cached(attr))
                .and_then(Value::as_f64)
                .unwrap_or(default_weight);
            graph.add_edge(NodeIndex::new(s), NodeIndex::new(t), weight);
        }
        graph
    }

    /// Node-link JSON document.
    pub fn to_json_graph(&self) -> JsonGraph {
        JsonGraph::from_subgraph(self)
    }
}

/// A vertex in a [`JsonGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// An edge in a [`JsonGraph`]; `source`/`target` refer to node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// Node-link graph document, used for exports and imports.
///
/// Node ids are free-form strings on import; exported documents use graphids.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JsonGraph {
    #[serde(default = "default_directed")]
    pub directed: bool,
    #[serde(default)]
    pub nodes: Vec<JsonNode>,
    #[serde(default)]
    pub edges: Vec<JsonEdge>,
}

fn default_directed() -> bool {
    true
}

impl JsonGraph {
    pub fn from_subgraph(sub: &Subgraph) -> Self {
        let sub = sub.as_normalized();
        Self {
            directed: true,
            nodes: sub.vertices().iter().map(JsonNode::from).collect(),
            edges: sub.edges().iter().map(JsonEdge::from).collect(),
        }
    }
}

impl From<&Vertex> for JsonNode {
    fn from(v: &Vertex) -> Self {
        Self {
            id: v.id().to_string(),
            label: v.label().map(str::to_string),
            properties: v.properties().clone(),
        }
    }
}

impl From<&Edge> for JsonEdge {
    fn from(e: &Edge) -> Self {
        Self {
            id: Some(e.id().to_string()),
            source: e.sid().to_string(),
            target: e.tid().to_string(),
            label: e.label().map(str::to_string),
            properties: e.properties().clone(),
        }
    }
}
