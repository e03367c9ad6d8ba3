//! Graph entity value objects and their text decoding.
//!
//! AgensGraph renders its graph types as text:
//!
//! ```text
//! graphid    3.1
//! vertex     person[3.1]{"name": "Tom"}
//! edge       knows[4.1][3.1,3.2]{"since": "forever"}
//! graphpath  [person[3.1]{...},knows[4.1][3.1,3.2]{},person[3.2]{...}]
//! ```
//!
//! Entities carry a property cache filled from whatever the server
//! returned. Equality and hashing only look at the id.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AgensError, AgensResult};

/// Properties of a vertex or edge.
pub type Properties = Map<String, Value>;

static VERTEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([^\[\]]*)\[(\d+\.\d+)\](\{.*\})$").expect("vertex pattern is valid")
});

static EDGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([^\[\]]*)\[(\d+\.\d+)\]\[(\d+\.\d+),(\d+\.\d+)\](\{.*\})$")
        .expect("edge pattern is valid")
});

// ----------------------------------------------------------------------------
// GraphId
// ----------------------------------------------------------------------------

/// AgensGraph entity identifier: `<label id>.<local id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId {
    oid: u32,
    index: u64,
}

impl GraphId {
    pub fn new(oid: u32, index: u64) -> Self {
        Self { oid, index }
    }

    /// Label id part.
    pub fn oid(&self) -> u32 {
        self.oid
    }

    /// Local id part.
    pub fn index(&self) -> u64 {
        self.index
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.oid, self.index)
    }
}

impl FromStr for GraphId {
    type Err = AgensError;

    fn from_str(s: &str) -> AgensResult<Self> {
        let s = s.trim();
        let (oid, index) = s
            .split_once('.')
            .ok_or_else(|| AgensError::InvalidGraphId(s.to_string()))?;
        let oid = oid
            .parse()
            .map_err(|_| AgensError::InvalidGraphId(s.to_string()))?;
        let index = index
            .parse()
            .map_err(|_| AgensError::InvalidGraphId(s.to_string()))?;
        Ok(Self { oid, index })
    }
}

impl Serialize for GraphId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GraphId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn parse_properties(json: &str, err: impl Fn() -> AgensError) -> AgensResult<Properties> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(err()),
    }
}

// ----------------------------------------------------------------------------
// Vertex
// ----------------------------------------------------------------------------

/// A vertex with an optional label and a property cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    id: GraphId,
    label: Option<String>,
    #[serde(default)]
    properties: Properties,
}

impl Vertex {
    /// A vertex stub that only knows its id.
    pub fn new(id: GraphId) -> Self {
        Self {
            id,
            label: None,
            properties: Properties::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn oid(&self) -> u32 {
        self.id.oid()
    }

    pub fn index(&self) -> u64 {
        self.id.index()
    }

    /// Cached label, if known.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Keys present in the property cache.
    pub fn cached_keys(&self) -> impl Iterator<Item = &String> {
        self.properties.keys()
    }

    pub fn get_cached(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The property cache.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn cache_property(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Replace the property cache.
    pub fn set_properties(&mut self, properties: Properties) {
        self.properties = properties;
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl FromStr for Vertex {
    type Err = AgensError;

    fn from_str(s: &str) -> AgensResult<Self> {
        let bad = || AgensError::InvalidVertex(s.to_string());
        let caps = VERTEX_RE.captures(s.trim()).ok_or_else(bad)?;
        let label = caps[1].to_string();
        let id: GraphId = caps[2].parse().map_err(|_| bad())?;
        let properties = parse_properties(&caps[3], bad)?;
        Ok(Self {
            id,
            label: Some(label),
            properties,
        })
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]{}",
            self.label.as_deref().unwrap_or(""),
            self.id,
            Value::Object(self.properties.clone())
        )
    }
}

// ----------------------------------------------------------------------------
// Edge
// ----------------------------------------------------------------------------

/// A directed edge between two vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    id: GraphId,
    sid: GraphId,
    tid: GraphId,
    label: Option<String>,
    #[serde(default)]
    properties: Properties,
}

impl Edge {
    pub fn new(id: GraphId, sid: GraphId, tid: GraphId) -> Self {
        Self {
            id,
            sid,
            tid,
            label: None,
            properties: Properties::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Start vertex id.
    pub fn sid(&self) -> GraphId {
        self.sid
    }

    /// End vertex id.
    pub fn tid(&self) -> GraphId {
        self.tid
    }

    /// Stub of the start vertex.
    pub fn source(&self) -> Vertex {
        Vertex::new(self.sid)
    }

    /// Stub of the end vertex.
    pub fn target(&self) -> Vertex {
        Vertex::new(self.tid)
    }

    pub fn is_self_loop(&self) -> bool {
        self.sid == self.tid
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn cached_keys(&self) -> impl Iterator<Item = &String> {
        self.properties.keys()
    }

    pub fn get_cached(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn cache_property(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    pub fn set_properties(&mut self, properties: Properties) {
        self.properties = properties;
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl FromStr for Edge {
    type Err = AgensError;

    fn from_str(s: &str) -> AgensResult<Self> {
        let bad = || AgensError::InvalidEdge(s.to_string());
        let caps = EDGE_RE.captures(s.trim()).ok_or_else(bad)?;
        let label = caps[1].to_string();
        let id: GraphId = caps[2].parse().map_err(|_| bad())?;
        let sid: GraphId = caps[3].parse().map_err(|_| bad())?;
        let tid: GraphId = caps[4].parse().map_err(|_| bad())?;
        let properties = parse_properties(&caps[5], bad)?;
        Ok(Self {
            id,
            sid,
            tid,
            label: Some(label),
            properties,
        })
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}][{},{}]{}",
            self.label.as_deref().unwrap_or(""),
            self.id,
            self.sid,
            self.tid,
            Value::Object(self.properties.clone())
        )
    }
}

// ----------------------------------------------------------------------------
// Entity / GraphPath
// ----------------------------------------------------------------------------

/// Either kind of graph entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Vertex(Vertex),
    Edge(Edge),
}

impl Entity {
    pub fn id(&self) -> GraphId {
        match self {
            Entity::Vertex(v) => v.id(),
            Entity::Edge(e) => e.id(),
        }
    }

    /// Classify a text cell as a vertex or an edge.
    pub fn parse_any(text: &str) -> Option<Entity> {
        let text = text.trim();
        if !text.ends_with('}') {
            return None;
        }
        if let Ok(v) = text.parse::<Vertex>() {
            return Some(Entity::Vertex(v));
        }
        text.parse::<Edge>().ok().map(Entity::Edge)
    }
}

impl From<Vertex> for Entity {
    fn from(v: Vertex) -> Self {
        Entity::Vertex(v)
    }
}

impl From<Edge> for Entity {
    fn from(e: Edge) -> Self {
        Entity::Edge(e)
    }
}

/// A path: vertices and edges alternating, starting and ending with a vertex.
///
/// There is always exactly one more vertex than there are edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPath")]
pub struct GraphPath {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct RawPath {
    vertices: Vec<Vertex>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl TryFrom<RawPath> for GraphPath {
    type Error = AgensError;

    fn try_from(raw: RawPath) -> AgensResult<Self> {
        GraphPath::new(raw.vertices, raw.edges)
    }
}

impl GraphPath {
    pub fn new(vertices: Vec<Vertex>, edges: Vec<Edge>) -> AgensResult<Self> {
        if vertices.len() != edges.len() + 1 {
            return Err(AgensError::InvalidPath(format!(
                "{} vertices for {} edges",
                vertices.len(),
                edges.len()
            )));
        }
        Ok(Self { vertices, edges })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn start(&self) -> &Vertex {
        &self.vertices[0]
    }

    pub fn end(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 1]
    }

    /// Entities in path order.
    pub fn entities(&self) -> Vec<Entity> {
        let mut out = Vec::with_capacity(self.vertices.len() + self.edges.len());
        for (i, v) in self.vertices.iter().enumerate() {
            out.push(Entity::Vertex(v.clone()));
            if let Some(e) = self.edges.get(i) {
                out.push(Entity::Edge(e.clone()));
            }
        }
        out
    }
}

/// Split `s` at commas that are not nested in brackets, braces or JSON strings.
fn split_top_level(s: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || in_string {
        return None;
    }
    parts.push(&s[start..]);
    Some(parts)
}

impl FromStr for GraphPath {
    type Err = AgensError;

    fn from_str(s: &str) -> AgensResult<Self> {
        let bad = || AgensError::InvalidPath(s.to_string());
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(bad)?;
        let parts = split_top_level(inner).ok_or_else(bad)?;
        if parts.len() % 2 == 0 {
            return Err(bad());
        }

        let mut vertices = Vec::with_capacity(parts.len() / 2 + 1);
        let mut edges = Vec::with_capacity(parts.len() / 2);
        for (i, part) in parts.iter().enumerate() {
            if i % 2 == 0 {
                vertices.push(part.parse::<Vertex>().map_err(|_| bad())?);
            } else {
                edges.push(part.parse::<Edge>().map_err(|_| bad())?);
            }
        }
        Self::new(vertices, edges).map_err(|_| bad())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graphid_parse_and_display() {
        let id: GraphId = "3.17".parse().unwrap();
        assert_eq!(id.oid(), 3);
        assert_eq!(id.index(), 17);
        assert_eq!(id.to_string(), "3.17");
        assert!("3".parse::<GraphId>().is_err());
        assert!("a.b".parse::<GraphId>().is_err());
        assert!("3.-1".parse::<GraphId>().is_err());
    }

    #[test]
    fn test_graphid_ordering() {
        let a = GraphId::new(3, 10);
        let b = GraphId::new(4, 1);
        assert!(a < b);
        assert!(GraphId::new(3, 2) < GraphId::new(3, 10));
    }

    #[test]
    fn test_vertex_parse() {
        let v: Vertex = r#"person[3.1]{"name": "Tom", "age": 30}"#.parse().unwrap();
        assert_eq!(v.id(), GraphId::new(3, 1));
        assert_eq!(v.label(), Some("person"));
        assert_eq!(v.get_cached("name"), Some(&json!("Tom")));
        assert_eq!(v.get_cached("age"), Some(&json!(30)));
    }

    #[test]
    fn test_vertex_brackets_inside_properties() {
        let v: Vertex = r#"gene[5.2]{"note": "see [1.2], {x}", "list": [1, 2]}"#.parse().unwrap();
        assert_eq!(v.label(), Some("gene"));
        assert_eq!(v.get_cached("note"), Some(&json!("see [1.2], {x}")));
    }

    #[test]
    fn test_vertex_rejects_edge_text() {
        assert!(r#"knows[4.1][3.1,3.2]{}"#.parse::<Vertex>().is_err());
        assert!("not a vertex".parse::<Vertex>().is_err());
        assert!("person[3.1][1, 2]".parse::<Vertex>().is_err());
    }

    #[test]
    fn test_edge_parse() {
        let e: Edge = r#"knows[4.1][3.1,3.2]{"since": "forever"}"#.parse().unwrap();
        assert_eq!(e.id(), GraphId::new(4, 1));
        assert_eq!(e.sid(), GraphId::new(3, 1));
        assert_eq!(e.tid(), GraphId::new(3, 2));
        assert_eq!(e.label(), Some("knows"));
        assert_eq!(e.get_cached("since"), Some(&json!("forever")));
        assert!(!e.is_self_loop());
    }

    #[test]
    fn test_edge_endpoint_stubs_are_bare() {
        let e: Edge = r#"knows[4.1][3.1,3.2]{"since": "forever"}"#.parse().unwrap();
        let source = e.source();
        assert_eq!(source.id(), GraphId::new(3, 1));
        assert_eq!(source.label(), None);
        assert!(source.properties().is_empty());
    }

    #[test]
    fn test_equality_by_id_only() {
        let a = Vertex::new(GraphId::new(3, 1)).with_label("person");
        let b = Vertex::new(GraphId::new(3, 1));
        assert_eq!(a, b);
        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_display_round_trip() {
        let text = r#"person[3.1]{"name":"Tom"}"#;
        let v: Vertex = text.parse().unwrap();
        assert_eq!(v.to_string(), text);
        let text = r#"knows[4.1][3.1,3.2]{}"#;
        let e: Edge = text.parse().unwrap();
        assert_eq!(e.to_string(), text);
    }

    #[test]
    fn test_parse_any() {
        assert!(matches!(Entity::parse_any(r#"person[3.1]{}"#), Some(Entity::Vertex(_))));
        assert!(matches!(Entity::parse_any(r#"knows[4.1][3.1,3.2]{}"#), Some(Entity::Edge(_))));
        assert!(Entity::parse_any("Tom").is_none());
        assert!(Entity::parse_any("{\"a\": 1}").is_none());
    }

    #[test]
    fn test_path_parse() {
        let text = r#"[person[3.1]{"name": "Tom, Jr."},knows[4.1][3.1,3.2]{},person[3.2]{"name": "Summer"}]"#;
        let path: GraphPath = text.parse().unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path.vertices().len(), 2);
        assert_eq!(path.start().get_cached("name"), Some(&json!("Tom, Jr.")));
        assert_eq!(path.end().id(), GraphId::new(3, 2));
        assert_eq!(path.entities().len(), 3);
    }

    #[test]
    fn test_path_single_vertex_and_errors() {
        let path: GraphPath = "[person[3.1]{}]".parse().unwrap();
        assert!(path.is_empty());
        assert!("[person[3.1]{},knows[4.1][3.1,3.2]{}]".parse::<GraphPath>().is_err());
        assert!("person[3.1]{}".parse::<GraphPath>().is_err());
        assert!("[person[3.1]{\"a\": \"]".parse::<GraphPath>().is_err());
    }

    #[test]
    fn test_path_deserialize_checks_shape() {
        assert!(serde_json::from_str::<GraphPath>(r#"{"vertices": [], "edges": []}"#).is_err());

        let path: GraphPath = "[person[3.1]{},knows[4.1][3.1,3.2]{},person[3.2]{}]".parse().unwrap();
        let text = serde_json::to_string(&path).unwrap();
        let back: GraphPath = serde_json::from_str(&text).unwrap();
        assert_eq!(back.end().id(), GraphId::new(3, 2));

        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["edges"] = json!([]);
        assert!(serde_json::from_value::<GraphPath>(value).is_err());
        assert!(GraphPath::new(Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn test_graphid_serde_as_string() {
        let id = GraphId::new(3, 9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"3.9\"");
        let back: GraphId = serde_json::from_str("\"3.9\"").unwrap();
        assert_eq!(back, id);
    }
}
