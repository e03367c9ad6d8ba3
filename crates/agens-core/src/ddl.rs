//! AgensGraph DDL command builders.
//!
//! Every builder returns the command text without a trailing `;`; the
//! cursor terminates statements when it sends them.
//!
//! Syntax reference:
//! <http://www.agensgraph.com/agensgraph-docs/agensgraph_DDL.html>

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AgensError, AgensResult};
use crate::literal::{quote_sql_identifier as ident, quote_sql_string};

/// Vertex or edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    Vertex,
    Edge,
}

impl LabelKind {
    /// Keyword used in DDL (`VLABEL` / `ELABEL`).
    pub fn keyword(&self) -> &'static str {
        match self {
            LabelKind::Vertex => "VLABEL",
            LabelKind::Edge => "ELABEL",
        }
    }

    /// Value of `ag_label.labkind`.
    pub fn catalog_kind(&self) -> &'static str {
        match self {
            LabelKind::Vertex => "v",
            LabelKind::Edge => "e",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "v" | "vertex" | "vlabel" | "node" => Some(Self::Vertex),
            "e" | "edge" | "elabel" | "relationship" => Some(Self::Edge),
            _ => None,
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// ----------------------------------------------------------------------------
// Graphs
// ----------------------------------------------------------------------------

/// `CREATE GRAPH [IF NOT EXISTS] name [AUTHORIZATION role]`
pub fn create_graph(name: &str, if_not_exists: bool, authorization: Option<&str>) -> String {
    let mut cmd = vec!["CREATE GRAPH"];
    if if_not_exists {
        cmd.push("IF NOT EXISTS");
    }
    let name = ident(name);
    cmd.push(&name);
    let role = authorization.map(ident);
    if let Some(role) = &role {
        cmd.push("AUTHORIZATION");
        cmd.push(role);
    }
    cmd.join(" ")
}

/// `DROP GRAPH [IF EXISTS] name CASCADE`
///
/// Objects depending on the graph are dropped with it.
pub fn drop_graph(name: &str, if_exists: bool) -> String {
    let mut cmd = vec!["DROP GRAPH"];
    if if_exists {
        cmd.push("IF EXISTS");
    }
    let name = ident(name);
    cmd.push(&name);
    cmd.push("CASCADE");
    cmd.join(" ")
}

/// `ALTER GRAPH name ...` commands.
#[derive(Debug, Clone)]
pub struct AlterGraph {
    base: String,
}

impl AlterGraph {
    pub fn new(name: &str) -> Self {
        Self {
            base: format!("ALTER GRAPH {}", ident(name)),
        }
    }

    pub fn rename(&self, new_name: &str) -> String {
        format!("{} RENAME TO {}", self.base, ident(new_name))
    }

    /// `new_owner` may be a role, `CURRENT_USER` or `SESSION_USER`.
    pub fn owner_to(&self, new_owner: &str) -> String {
        format!("{} OWNER TO {}", self.base, ident(new_owner))
    }
}

pub fn show_graph_path() -> String {
    "SHOW graph_path".to_string()
}

pub fn set_graph_path(name: &str) -> String {
    format!("SET graph_path = {}", ident(name))
}

// ----------------------------------------------------------------------------
// Labels
// ----------------------------------------------------------------------------

/// Options for `CREATE VLABEL` / `CREATE ELABEL`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelOptions {
    pub if_not_exists: bool,
    /// Unlogged labels skip the write-ahead log; faster but not crash-safe.
    pub unlogged: bool,
    /// Create the label with an invalid index until reindexed.
    pub disable_index: bool,
    /// Parent labels. Data of the new label is included in scans of its parents.
    pub inherits: Vec<String>,
    pub storage_parameter: Option<String>,
    pub tablespace: Option<String>,
}

impl LabelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn unlogged(mut self) -> Self {
        self.unlogged = true;
        self
    }

    pub fn disable_index(mut self) -> Self {
        self.disable_index = true;
        self
    }

    pub fn inherits<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherits.extend(parents.into_iter().map(Into::into));
        self
    }

    pub fn storage_parameter(mut self, param: impl Into<String>) -> Self {
        self.storage_parameter = Some(param.into());
        self
    }

    pub fn tablespace(mut self, tablespace: impl Into<String>) -> Self {
        self.tablespace = Some(tablespace.into());
        self
    }
}

/// `CREATE [UNLOGGED] {V|E}LABEL [IF NOT EXISTS] name [DISABLE INDEX]
///  [INHERITS (parent, ...)] [WITH (storage_parameter)] [TABLESPACE ts]`
pub fn create_label(kind: LabelKind, name: &str, opts: &LabelOptions) -> String {
    let mut cmd = vec!["CREATE".to_string()];
    if opts.unlogged {
        cmd.push("UNLOGGED".to_string());
    }
    cmd.push(kind.keyword().to_string());
    if opts.if_not_exists {
        cmd.push("IF NOT EXISTS".to_string());
    }
    cmd.push(ident(name).into_owned());
    if opts.disable_index {
        cmd.push("DISABLE INDEX".to_string());
    }
    if !opts.inherits.is_empty() {
        let parents: Vec<_> = opts.inherits.iter().map(|p| ident(p)).collect();
        cmd.push(format!("INHERITS ({})", parents.join(", ")));
    }
    if let Some(param) = &opts.storage_parameter {
        cmd.push(format!("WITH ({})", param));
    }
    if let Some(tablespace) = &opts.tablespace {
        cmd.push("TABLESPACE".to_string());
        cmd.push(ident(tablespace).into_owned());
    }
    cmd.join(" ")
}

/// `DROP {V|E}LABEL [IF EXISTS] name [CASCADE]`
pub fn drop_label(kind: LabelKind, name: &str, if_exists: bool, cascade: bool) -> String {
    let mut cmd = vec!["DROP", kind.keyword()];
    if if_exists {
        cmd.push("IF EXISTS");
    }
    let name = ident(name);
    cmd.push(&name);
    if cascade {
        cmd.push("CASCADE");
    }
    cmd.join(" ")
}

/// Storage mode for `ALTER ... SET STORAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Plain,
    External,
    Extended,
    Main,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Plain => "PLAIN",
            StorageMode::External => "EXTERNAL",
            StorageMode::Extended => "EXTENDED",
            StorageMode::Main => "MAIN",
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = AgensError;

    fn from_str(s: &str) -> AgensResult<Self> {
        match s.to_uppercase().as_str() {
            "PLAIN" => Ok(Self::Plain),
            "EXTERNAL" => Ok(Self::External),
            "EXTENDED" => Ok(Self::Extended),
            "MAIN" => Ok(Self::Main),
            other => Err(AgensError::validation(format!("unknown storage mode '{}'", other))),
        }
    }
}

/// `ALTER {V|E}LABEL [IF EXISTS] name ...` commands.
#[derive(Debug, Clone)]
pub struct AlterLabel {
    base: String,
}

impl AlterLabel {
    pub fn new(kind: LabelKind, name: &str, if_exists: bool) -> Self {
        let mut base = format!("ALTER {} ", kind.keyword());
        if if_exists {
            base.push_str("IF EXISTS ");
        }
        base.push_str(&ident(name));
        Self { base }
    }

    fn action(&self, action: &str) -> String {
        format!("{} {}", self.base, action)
    }

    pub fn rename(&self, new_name: &str) -> String {
        self.action(&format!("RENAME TO {}", ident(new_name)))
    }

    pub fn owner_to(&self, new_owner: &str) -> String {
        self.action(&format!("OWNER TO {}", ident(new_owner)))
    }

    pub fn set_storage(&self, mode: StorageMode) -> String {
        self.action(&format!("SET STORAGE {}", mode.as_str()))
    }

    pub fn set_tablespace(&self, tablespace: &str) -> String {
        self.action(&format!("SET TABLESPACE {}", ident(tablespace)))
    }

    pub fn cluster_on(&self, index_name: &str) -> String {
        self.action(&format!("CLUSTER ON {}", ident(index_name)))
    }

    pub fn set_without_cluster(&self) -> String {
        self.action("SET WITHOUT CLUSTER")
    }

    pub fn set_logged(&self) -> String {
        self.action("SET LOGGED")
    }

    pub fn set_unlogged(&self) -> String {
        self.action("SET UNLOGGED")
    }

    pub fn inherit(&self, parent: &str) -> String {
        self.action(&format!("INHERIT {}", ident(parent)))
    }

    pub fn no_inherit(&self, parent: &str) -> String {
        self.action(&format!("NO INHERIT {}", ident(parent)))
    }

    pub fn disable_index(&self) -> String {
        self.action("DISABLE INDEX")
    }
}

// ----------------------------------------------------------------------------
// Property indexes and constraints
// ----------------------------------------------------------------------------

/// Sort order of an index element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Placement of NULLs in an index element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// One element of a property index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexElement {
    target: IndexTarget,
    pub collation: Option<String>,
    pub opclass: Option<String>,
    pub order: Option<SortOrder>,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, PartialEq)]
enum IndexTarget {
    Property(String),
    Expression(String),
}

impl IndexElement {
    /// Index a property (attribute expression such as `name` or `name.first`).
    pub fn property(attr: impl Into<String>) -> Self {
        Self::with_target(IndexTarget::Property(attr.into()))
    }

    /// Index an arbitrary expression; rendered in parentheses.
    pub fn expression(expr: impl Into<String>) -> Self {
        Self::with_target(IndexTarget::Expression(expr.into()))
    }

    fn with_target(target: IndexTarget) -> Self {
        Self {
            target,
            collation: None,
            opclass: None,
            order: None,
            nulls: None,
        }
    }

    pub fn collate(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn opclass(mut self, opclass: impl Into<String>) -> Self {
        self.opclass = Some(opclass.into());
        self
    }

    pub fn desc(mut self) -> Self {
        self.order = Some(SortOrder::Desc);
        self
    }

    pub fn asc(mut self) -> Self {
        self.order = Some(SortOrder::Asc);
        self
    }

    pub fn nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    fn render(&self) -> String {
        let mut parts = vec![match &self.target {
            IndexTarget::Property(attr) => attr.clone(),
            IndexTarget::Expression(expr) => format!("({})", expr),
        }];
        if let Some(collation) = &self.collation {
            parts.push(format!("COLLATE {}", collation));
        }
        if let Some(opclass) = &self.opclass {
            parts.push(opclass.clone());
        }
        match self.order {
            Some(SortOrder::Asc) => parts.push("ASC".to_string()),
            Some(SortOrder::Desc) => parts.push("DESC".to_string()),
            None => {}
        }
        match self.nulls {
            Some(NullsOrder::First) => parts.push("NULLS FIRST".to_string()),
            Some(NullsOrder::Last) => parts.push("NULLS LAST".to_string()),
            None => {}
        }
        parts.join(" ")
    }
}

/// A `CREATE PROPERTY INDEX` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyIndex {
    pub label: String,
    pub name: Option<String>,
    pub unique: bool,
    pub concurrently: bool,
    pub if_not_exists: bool,
    pub method: Option<String>,
    pub elements: Vec<IndexElement>,
    pub storage_parameters: Vec<(String, String)>,
    pub tablespace: Option<String>,
    pub predicate: Option<String>,
}

impl PropertyIndex {
    pub fn on(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn concurrently(mut self) -> Self {
        self.concurrently = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Index method, e.g. `btree`, `gin`.
    pub fn using(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn element(mut self, element: IndexElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.storage_parameters.push((key.into(), value.to_string()));
        self
    }

    pub fn tablespace(mut self, tablespace: impl Into<String>) -> Self {
        self.tablespace = Some(tablespace.into());
        self
    }

    /// Partial index predicate.
    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }
}

/// `CREATE [UNIQUE] PROPERTY INDEX [CONCURRENTLY] [[IF NOT EXISTS] name] ON label
///  [USING method] (element [, ...]) [WITH (...)] [TABLESPACE ts] [WHERE predicate]`
pub fn create_property_index(index: &PropertyIndex) -> AgensResult<String> {
    if index.elements.is_empty() {
        return Err(AgensError::validation(
            "a property index needs at least one element",
        ));
    }
    if index.if_not_exists && index.name.is_none() {
        return Err(AgensError::validation(
            "IF NOT EXISTS requires an index name",
        ));
    }

    let mut cmd = vec!["CREATE".to_string()];
    if index.unique {
        cmd.push("UNIQUE".to_string());
    }
    cmd.push("PROPERTY INDEX".to_string());
    if index.concurrently {
        cmd.push("CONCURRENTLY".to_string());
    }
    if let Some(name) = &index.name {
        if index.if_not_exists {
            cmd.push("IF NOT EXISTS".to_string());
        }
        cmd.push(ident(name).into_owned());
    }
    cmd.push("ON".to_string());
    cmd.push(ident(&index.label).into_owned());
    if let Some(method) = &index.method {
        cmd.push("USING".to_string());
        cmd.push(method.clone());
    }
    let elements: Vec<String> = index.elements.iter().map(IndexElement::render).collect();
    cmd.push(format!("({})", elements.join(", ")));
    if !index.storage_parameters.is_empty() {
        let params: Vec<String> = index
            .storage_parameters
            .iter()
            .map(|(k, v)| format!("{} = {}", k, v))
            .collect();
        cmd.push(format!("WITH ({})", params.join(", ")));
    }
    if let Some(tablespace) = &index.tablespace {
        cmd.push("TABLESPACE".to_string());
        cmd.push(ident(tablespace).into_owned());
    }
    if let Some(predicate) = &index.predicate {
        cmd.push("WHERE".to_string());
        cmd.push(predicate.clone());
    }
    Ok(cmd.join(" "))
}

/// `DROP PROPERTY INDEX [IF EXISTS] name [CASCADE]`
pub fn drop_property_index(name: &str, if_exists: bool, cascade: bool) -> String {
    let mut cmd = vec!["DROP PROPERTY INDEX"];
    if if_exists {
        cmd.push("IF EXISTS");
    }
    let name = ident(name);
    cmd.push(&name);
    if cascade {
        cmd.push("CASCADE");
    }
    cmd.join(" ")
}

/// `CREATE CONSTRAINT name ON label ASSERT field_expr IS UNIQUE`
pub fn create_unique_constraint(name: &str, label: &str, field_expr: &str) -> String {
    format!("CREATE CONSTRAINT {} ON {} ASSERT {} IS UNIQUE", ident(name), ident(label), field_expr)
}

/// `CREATE CONSTRAINT name ON label ASSERT check_expr`
pub fn create_check_constraint(name: &str, label: &str, check_expr: &str) -> String {
    format!("CREATE CONSTRAINT {} ON {} ASSERT {}", ident(name), ident(label), check_expr)
}

/// `DROP CONSTRAINT name ON label`
pub fn drop_constraint(name: &str, label: &str) -> String {
    format!("DROP CONSTRAINT {} ON {}", ident(name), ident(label))
}

// ----------------------------------------------------------------------------
// Catalog queries
// ----------------------------------------------------------------------------

/// Object id of a graph in `ag_graph`; `ag_label.graphid` refers to it.
pub fn graph_oid(name: &str) -> String {
    format!(
        "SELECT oid FROM pg_catalog.ag_graph WHERE graphname = {}",
        quote_sql_string(name)
    )
}

/// Names of all labels of one kind in a graph.
pub fn label_names(graphid: u32, kind: LabelKind) -> String {
    format!(
        "SELECT labname FROM pg_catalog.ag_label WHERE graphid = {} AND labkind = '{}' ORDER BY labname",
        graphid,
        kind.catalog_kind()
    )
}

/// Label id of a single label.
pub fn label_id(graphid: u32, name: &str, kind: LabelKind) -> String {
    format!(
        "SELECT labid FROM pg_catalog.ag_label WHERE graphid = {} AND labname = {} AND labkind = '{}'",
        graphid,
        quote_sql_string(name),
        kind.catalog_kind()
    )
}

/// Catalog column usable as a label key in [`label_column_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColumn {
    /// Label id, the first part of every graphid of the label.
    Labid,
    /// Relation oid of the table backing the label.
    Relid,
}

impl LabelColumn {
    fn as_str(&self) -> &'static str {
        match self {
            LabelColumn::Labid => "labid",
            LabelColumn::Relid => "relid",
        }
    }
}

/// `(column, labname)` pairs for every label of one kind.
pub fn label_column_map(graphid: u32, kind: LabelKind, column: LabelColumn) -> String {
    format!(
        "SELECT {}, labname FROM pg_catalog.ag_label WHERE graphid = {} AND labkind = '{}'",
        column.as_str(),
        graphid,
        kind.catalog_kind()
    )
}

/// `(inhparent, relid)` pairs describing label inheritance.
pub fn label_inheritance(graphid: u32, kind: LabelKind) -> String {
    format!(
        "SELECT inhparent, relid FROM pg_catalog.ag_label AS labels \
         INNER JOIN pg_catalog.pg_inherits AS inheritance \
         ON labels.relid = inheritance.inhrelid \
         AND labels.labkind = '{}' AND labels.graphid = {}",
        kind.catalog_kind(),
        graphid
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_graph() {
        assert_eq!(create_graph("g", false, None), "CREATE GRAPH g");
        assert_eq!(
            create_graph("g", true, Some("alice")),
            "CREATE GRAPH IF NOT EXISTS g AUTHORIZATION alice"
        );
    }

    #[test]
    fn test_drop_graph_always_cascades() {
        assert_eq!(drop_graph("g", false), "DROP GRAPH g CASCADE");
        assert_eq!(drop_graph("g", true), "DROP GRAPH IF EXISTS g CASCADE");
    }

    #[test]
    fn test_alter_graph() {
        let alter = AlterGraph::new("x");
        assert_eq!(alter.rename("y"), "ALTER GRAPH x RENAME TO y");
        assert_eq!(alter.owner_to("CURRENT_USER"), "ALTER GRAPH x OWNER TO CURRENT_USER");
        assert_eq!(set_graph_path("net"), "SET graph_path = net");
    }

    #[test]
    fn test_create_label_minimal() {
        assert_eq!(
            create_label(LabelKind::Vertex, "person", &LabelOptions::new()),
            "CREATE VLABEL person"
        );
        assert_eq!(
            create_label(LabelKind::Edge, "knows", &LabelOptions::new().if_not_exists()),
            "CREATE ELABEL IF NOT EXISTS knows"
        );
    }

    #[test]
    fn test_create_label_all_options() {
        let opts = LabelOptions::new()
            .unlogged()
            .if_not_exists()
            .disable_index()
            .inherits(["humanoid", "telepathic"])
            .storage_parameter("fillfactor = 70")
            .tablespace("fast");
        assert_eq!(
            create_label(LabelKind::Vertex, "vulcan", &opts),
            "CREATE UNLOGGED VLABEL IF NOT EXISTS vulcan DISABLE INDEX \
             INHERITS (humanoid, telepathic) WITH (fillfactor = 70) TABLESPACE fast"
        );
    }

    #[test]
    fn test_drop_label() {
        assert_eq!(drop_label(LabelKind::Vertex, "person", false, false), "DROP VLABEL person");
        assert_eq!(
            drop_label(LabelKind::Edge, "knows", true, true),
            "DROP ELABEL IF EXISTS knows CASCADE"
        );
    }

    #[test]
    fn test_alter_label_actions() {
        let alter = AlterLabel::new(LabelKind::Vertex, "person", true);
        assert_eq!(alter.rename("human"), "ALTER VLABEL IF EXISTS person RENAME TO human");
        assert_eq!(alter.set_storage(StorageMode::Main), "ALTER VLABEL IF EXISTS person SET STORAGE MAIN");
        assert_eq!(alter.no_inherit("lifeform"), "ALTER VLABEL IF EXISTS person NO INHERIT lifeform");

        let alter = AlterLabel::new(LabelKind::Edge, "knows", false);
        assert_eq!(alter.set_without_cluster(), "ALTER ELABEL knows SET WITHOUT CLUSTER");
        assert_eq!(alter.cluster_on("knows_idx"), "ALTER ELABEL knows CLUSTER ON knows_idx");
        assert_eq!(alter.disable_index(), "ALTER ELABEL knows DISABLE INDEX");
        assert_eq!(alter.set_unlogged(), "ALTER ELABEL knows SET UNLOGGED");
    }

    #[test]
    fn test_storage_mode_parse() {
        assert_eq!("extended".parse::<StorageMode>().unwrap(), StorageMode::Extended);
        assert!("bogus".parse::<StorageMode>().is_err());
    }

    #[test]
    fn test_property_index_simple() {
        let index = PropertyIndex::on("person").element(IndexElement::property("name"));
        assert_eq!(
            create_property_index(&index).unwrap(),
            "CREATE PROPERTY INDEX ON person (name)"
        );
    }

    #[test]
    fn test_property_index_full() {
        let index = PropertyIndex::on("person")
            .unique()
            .concurrently()
            .name("person_name_idx")
            .if_not_exists()
            .using("btree")
            .element(IndexElement::expression("lower(name)").collate("\"C\"").desc().nulls(NullsOrder::Last))
            .element(IndexElement::property("age"))
            .with("fillfactor", 80)
            .tablespace("fast")
            .predicate("age > 18");
        assert_eq!(
            create_property_index(&index).unwrap(),
            "CREATE UNIQUE PROPERTY INDEX CONCURRENTLY IF NOT EXISTS person_name_idx ON person \
             USING btree ((lower(name)) COLLATE \"C\" DESC NULLS LAST, age) \
             WITH (fillfactor = 80) TABLESPACE fast WHERE age > 18"
        );
    }

    #[test]
    fn test_property_index_validation() {
        assert!(create_property_index(&PropertyIndex::on("person")).is_err());
        let index = PropertyIndex::on("person")
            .if_not_exists()
            .element(IndexElement::property("name"));
        assert!(create_property_index(&index).is_err());
    }

    #[test]
    fn test_constraints() {
        assert_eq!(
            create_unique_constraint("uniq_name", "person", "name"),
            "CREATE CONSTRAINT uniq_name ON person ASSERT name IS UNIQUE"
        );
        assert_eq!(
            create_check_constraint("adult", "person", "age >= 18"),
            "CREATE CONSTRAINT adult ON person ASSERT age >= 18"
        );
        assert_eq!(drop_constraint("adult", "person"), "DROP CONSTRAINT adult ON person");
    }

    #[test]
    fn test_names_are_quoted_when_not_plain() {
        assert_eq!(
            create_graph("road net", true, Some("data team")),
            "CREATE GRAPH IF NOT EXISTS \"road net\" AUTHORIZATION \"data team\""
        );
        assert_eq!(drop_graph("road net", true), "DROP GRAPH IF EXISTS \"road net\" CASCADE");
        assert_eq!(set_graph_path("road net"), "SET graph_path = \"road net\"");
        assert_eq!(
            create_label(LabelKind::Vertex, "tf gene", &LabelOptions::new().inherits(["bio entity"])),
            "CREATE VLABEL \"tf gene\" INHERITS (\"bio entity\")"
        );
        assert_eq!(drop_label(LabelKind::Vertex, "x\"y", false, false), "DROP VLABEL \"x\"\"y\"");
        assert_eq!(
            AlterLabel::new(LabelKind::Edge, "binds to", false).rename("regulates"),
            "ALTER ELABEL \"binds to\" RENAME TO regulates"
        );
        assert_eq!(
            create_unique_constraint("uniq name", "tf gene", "name"),
            "CREATE CONSTRAINT \"uniq name\" ON \"tf gene\" ASSERT name IS UNIQUE"
        );
    }

    #[test]
    fn test_catalog_queries_quote_names() {
        assert_eq!(
            graph_oid("it's"),
            "SELECT oid FROM pg_catalog.ag_graph WHERE graphname = 'it''s'"
        );
        assert_eq!(
            label_id(16384, "person", LabelKind::Vertex),
            "SELECT labid FROM pg_catalog.ag_label WHERE graphid = 16384 AND labname = 'person' AND labkind = 'v'"
        );
        assert!(label_inheritance(7, LabelKind::Edge).contains("labels.labkind = 'e' AND labels.graphid = 7"));
    }
}
