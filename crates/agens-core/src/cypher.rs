//! Cypher command builders.
//!
//! Entities are addressed by id through `id(x) = CAST('<graphid>' AS graphid)`
//! comparisons. Property maps are rendered with [`crate::literal`].

use serde::{Deserialize, Serialize};

use crate::entity::{GraphId, Properties};
use crate::literal::{format_identifier, format_properties, quote_string};

/// `id(var) = CAST('x.y' AS graphid)`
pub fn match_id(var: &str, id: &GraphId) -> String {
    format!("id({}) = CAST('{}' AS graphid)", var, id)
}

fn cast_id(id: &GraphId) -> String {
    format!("CAST('{}' AS graphid)", id)
}

fn id_list(ids: &[GraphId]) -> String {
    let ids: Vec<String> = ids.iter().map(cast_id).collect();
    format!("[{}]", ids.join(", "))
}

/// `var[:label] [{...}]`: the inside of a node or relationship pattern.
fn pattern_body(var: &str, label: Option<&str>, properties: &Properties) -> String {
    let mut body = var.to_string();
    if let Some(label) = label {
        body.push(':');
        body.push_str(&format_identifier(label));
    }
    let props = format_properties(properties);
    if !props.is_empty() {
        body.push(' ');
        body.push_str(&props);
    }
    body
}

/// Label and property filter of one pattern element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternFilter {
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl PatternFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    fn render(&self, var: &str) -> String {
        pattern_body(var, self.label.as_deref(), &self.properties)
    }
}

// ----------------------------------------------------------------------------
// Entity creation
// ----------------------------------------------------------------------------

/// `CREATE (v[:label] [{...}]) RETURN id(v)`
pub fn create_vertex(label: Option<&str>, properties: &Properties) -> String {
    format!(
        "CREATE ({}) RETURN id(v)",
        pattern_body("v", label, properties)
    )
}

/// `MATCH (s), (t) WHERE ... CREATE (s)-[e[:label] [{...}]]->(t) RETURN id(e)`
pub fn create_edge(
    source: &GraphId,
    label: Option<&str>,
    target: &GraphId,
    properties: &Properties,
) -> String {
    format!(
        "MATCH (s), (t) WHERE {} AND {} CREATE (s)-[{}]->(t) RETURN id(e)",
        match_id("s", source),
        match_id("t", target),
        pattern_body("e", label, properties)
    )
}

/// `MATCH (v) WHERE ... CREATE (v)-[e...]->(v) RETURN id(e)`
pub fn create_self_loop(vertex: &GraphId, label: Option<&str>, properties: &Properties) -> String {
    format!(
        "MATCH (v) WHERE {} CREATE (v)-[{}]->(v) RETURN id(e)",
        match_id("v", vertex),
        pattern_body("e", label, properties)
    )
}

/// `CREATE (source)-[:elabel]->(target)` from two node patterns.
pub fn create_path(source: &PatternFilter, elabel: &str, target: &PatternFilter) -> String {
    format!(
        "CREATE ({})-[:{}]->({})",
        source.render(""),
        format_identifier(elabel),
        target.render("")
    )
}

// ----------------------------------------------------------------------------
// Counting
// ----------------------------------------------------------------------------

fn where_suffix(where_clause: Option<&WhereClause>) -> String {
    match where_clause.map(WhereClause::render) {
        Some(expr) if !expr.is_empty() => format!(" WHERE {}", expr),
        _ => String::new(),
    }
}

/// `MATCH (v[:label] [{...}]) [WHERE ...] RETURN count(v)`
pub fn count_vertices(filter: &PatternFilter, where_clause: Option<&WhereClause>) -> String {
    format!(
        "MATCH ({}){} RETURN count(v)",
        filter.render("v"),
        where_suffix(where_clause)
    )
}

/// `MATCH ()-[e[:label] [{...}]]->() [WHERE ...] RETURN count(e)`
pub fn count_edges(filter: &PatternFilter, where_clause: Option<&WhereClause>) -> String {
    format!(
        "MATCH ()-[{}]->(){} RETURN count(e)",
        filter.render("e"),
        where_suffix(where_clause)
    )
}

// ----------------------------------------------------------------------------
// Entity lookups
// ----------------------------------------------------------------------------

/// `MATCH (v) WHERE ... RETURN v->>'key'`
pub fn vertex_property(id: &GraphId, key: &str) -> String {
    format!(
        "MATCH (v) WHERE {} RETURN v->>{}",
        match_id("v", id),
        quote_string(key)
    )
}

pub fn vertex_label(id: &GraphId) -> String {
    format!("MATCH (v) WHERE {} RETURN label(v)", match_id("v", id))
}

pub fn vertex_properties(id: &GraphId) -> String {
    format!("MATCH (v) WHERE {} RETURN properties(v)", match_id("v", id))
}

pub fn edge_label(id: &GraphId) -> String {
    format!("MATCH ()-[e]->() WHERE {} RETURN label(e)", match_id("e", id))
}

pub fn edge_properties(id: &GraphId) -> String {
    format!(
        "MATCH ()-[e]->() WHERE {} RETURN properties(e)",
        match_id("e", id)
    )
}

/// `MATCH (v) WHERE id(v) IN [...] RETURN id(v), label(v), properties(v)`
pub fn vertices_by_ids(ids: &[GraphId]) -> String {
    format!(
        "MATCH (v) WHERE id(v) IN {} RETURN id(v), label(v), properties(v)",
        id_list(ids)
    )
}

const EDGE_RETURN: &str = "RETURN id(e), id(s), id(t), label(e), properties(e)";

/// Edges with both endpoints among `ids` (node-induced subgraph).
pub fn edges_between(ids: &[GraphId]) -> String {
    let list = id_list(ids);
    format!(
        "MATCH (s)-[e]->(t) WHERE id(s) IN {} AND id(t) IN {} {}",
        list, list, EDGE_RETURN
    )
}

/// Edges by id (edge-induced subgraph).
pub fn edges_by_ids(ids: &[GraphId]) -> String {
    format!(
        "MATCH (s)-[e]->(t) WHERE id(e) IN {} {}",
        id_list(ids),
        EDGE_RETURN
    )
}

/// Edge direction relative to a start vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

impl Direction {
    pub fn from_flags(incoming: bool, outgoing: bool) -> Self {
        match (incoming, outgoing) {
            (true, false) => Direction::Incoming,
            (false, true) => Direction::Outgoing,
            _ => Direction::Both,
        }
    }

    fn arrows(&self, rel: &str) -> String {
        match self {
            Direction::Outgoing => format!("-[{}]->", rel),
            Direction::Incoming => format!("<-[{}]-", rel),
            Direction::Both => format!("-[{}]-", rel),
        }
    }
}

/// Distinct vertices reachable within `depth` hops.
pub fn neighbors(id: &GraphId, depth: u32, direction: Direction) -> String {
    let depth = depth.max(1);
    format!(
        "MATCH (v){}(n) WHERE {} AND NOT {} \
         RETURN DISTINCT id(n), label(n), properties(n)",
        direction.arrows(&format!("*1..{}", depth)),
        match_id("v", id),
        match_id("n", id)
    )
}

// ----------------------------------------------------------------------------
// WHERE clauses and subgraph matching
// ----------------------------------------------------------------------------

/// A boolean term: a single expression or a group joined by the inner operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Term {
    Expr(String),
    Group(Vec<String>),
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Expr(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Expr(s)
    }
}

impl From<Vec<&str>> for Term {
    fn from(v: Vec<&str>) -> Self {
        Term::Group(v.into_iter().map(str::to_string).collect())
    }
}

/// A `WHERE` expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WhereClause {
    Raw(String),
    /// Terms joined with `AND`; groups joined with `OR`.
    Cnf(Vec<Term>),
    /// Terms joined with `OR`; groups joined with `AND`.
    Dnf(Vec<Term>),
}

impl WhereClause {
    pub fn raw(expr: impl Into<String>) -> Self {
        WhereClause::Raw(expr.into())
    }

    pub fn render(&self) -> String {
        match self {
            WhereClause::Raw(expr) => expr.clone(),
            WhereClause::Cnf(terms) => render_normal_form(terms, "OR", "AND"),
            WhereClause::Dnf(terms) => render_normal_form(terms, "AND", "OR"),
        }
    }
}

fn render_normal_form(terms: &[Term], inner: &str, outer: &str) -> String {
    let inner = format!(" {} ", inner);
    let outer = format!(" {} ", outer);
    let rendered: Vec<String> = terms
        .iter()
        .map(|term| match term {
            Term::Expr(expr) => expr.clone(),
            Term::Group(exprs) => {
                let exprs: Vec<String> = exprs.iter().map(|e| format!("({})", e)).collect();
                format!("({})", exprs.join(&inner))
            }
        })
        .collect();
    rendered.join(&outer)
}

/// A `(s)-[e]->(t)` pattern match returning edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgraphQuery {
    #[serde(default)]
    pub source: PatternFilter,
    #[serde(default)]
    pub edge: PatternFilter,
    #[serde(default)]
    pub target: PatternFilter,
    pub where_clause: Option<WhereClause>,
}

impl SubgraphQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, filter: PatternFilter) -> Self {
        self.source = filter;
        self
    }

    pub fn edge(mut self, filter: PatternFilter) -> Self {
        self.edge = filter;
        self
    }

    pub fn target(mut self, filter: PatternFilter) -> Self {
        self.target = filter;
        self
    }

    pub fn filter(mut self, where_clause: WhereClause) -> Self {
        self.where_clause = Some(where_clause);
        self
    }

    /// `MATCH (s...)-[e...]->(t...) [WHERE ...] RETURN id(e), id(s), id(t), label(e), properties(e)`
    pub fn render(&self) -> String {
        format!(
            "MATCH ({})-[{}]->({}){} {}",
            self.source.render("s"),
            self.edge.render("e"),
            self.target.render("t"),
            where_suffix(self.where_clause.as_ref()),
            EDGE_RETURN
        )
    }
}
