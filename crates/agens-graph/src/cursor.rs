//! Command execution with a per-cursor call history.
//!
//! Every command goes through [`Cursor::execute`], which terminates it
//! with `;`, records it in the history and logs it. The DDL wrappers below
//! are thin shells over the builders in [`agens_core::ddl`].

use agens_core::cypher::{self, PatternFilter};
use agens_core::ddl::{self, AlterGraph, AlterLabel, LabelKind, LabelOptions, PropertyIndex, StorageMode};
use agens_core::{AgensError, FromText, ResultSet, Row, DEFAULT_HISTORY_LIMIT};
use std::collections::VecDeque;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::connection::Connection;

/// One executed command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub executed_at: DateTime<Utc>,
    pub command: String,
}

/// Sends commands over a [`Connection`] and remembers what it sent.
pub struct Cursor<C> {
    conn: C,
    history: VecDeque<HistoryEntry>,
    history_limit: Option<usize>,
    verbose: bool,
}

fn terminate(command: &str) -> String {
    let trimmed = command.trim_end();
    if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{};", trimmed)
    }
}

impl<C: Connection> Cursor<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            history: VecDeque::new(),
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
            verbose: false,
        }
    }

    /// Log commands at `info` instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Keep at most `limit` commands, dropping the oldest; `None` keeps all
    /// and `Some(0)` turns recording off.
    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.set_history_limit(limit);
        self
    }

    pub fn set_history_limit(&mut self, limit: Option<usize>) {
        self.history_limit = limit;
        self.trim_history();
    }

    fn trim_history(&mut self) {
        if let Some(limit) = self.history_limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }
    }

    fn record(&mut self, command: &str) {
        if self.history_limit == Some(0) {
            return;
        }
        self.history.push_back(HistoryEntry {
            executed_at: Utc::now(),
            command: command.to_string(),
        });
        self.trim_history();
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn into_connection(self) -> C {
        self.conn
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Send one command.
    pub async fn execute(&mut self, command: &str) -> Result<ResultSet> {
        let command = terminate(command);
        if self.verbose {
            info!(command = %command, "Executing");
        } else {
            debug!(command = %command, "Executing");
        }
        self.record(&command);

        let result = self
            .conn
            .simple_query(&command)
            .await
            .with_context(|| format!("Failed to execute: {}", command))?;
        debug!(rows = result.rows.len(), affected = ?result.affected, "Command complete");
        Ok(result)
    }

    /// Send several commands in order, stopping at the first failure.
    pub async fn execute_batch<I, S>(&mut self, commands: I) -> Result<Vec<ResultSet>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        for command in commands {
            results.push(self.execute(command.as_ref()).await?);
        }
        Ok(results)
    }

    pub async fn query(&mut self, command: &str) -> Result<Vec<Row>> {
        Ok(self.execute(command).await?.rows)
    }

    /// First row of the result; an empty result is an error.
    pub async fn query_one(&mut self, command: &str) -> Result<Row> {
        self.query(command)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AgensError::not_found(format!("no rows returned by: {}", command)).into())
    }

    /// First column of the first row.
    pub async fn query_scalar<T: FromText>(&mut self, command: &str) -> Result<T> {
        let row = self.query_one(command).await?;
        Ok(row.get(0)?)
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    /// Recorded commands, oldest first.
    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn last_query(&self) -> Option<&str> {
        self.history.back().map(|h| h.command.as_str())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ------------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------------

    pub async fn begin(&mut self) -> Result<()> {
        self.execute("BEGIN").await.map(drop)
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT").await.map(drop)
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK").await.map(drop)
    }

    // ------------------------------------------------------------------------
    // Graphs
    // ------------------------------------------------------------------------

    pub async fn create_graph(&mut self, name: &str, if_not_exists: bool, authorization: Option<&str>) -> Result<()> {
        self.execute(&ddl::create_graph(name, if_not_exists, authorization)).await?;
        Ok(())
    }

    /// Drops the graph and everything in it.
    pub async fn drop_graph(&mut self, name: &str, if_exists: bool) -> Result<()> {
        self.execute(&ddl::drop_graph(name, if_exists)).await?;
        Ok(())
    }

    pub fn alter_graph(&mut self, name: &str) -> AlterGraphCommand<'_, C> {
        AlterGraphCommand {
            cursor: self,
            builder: AlterGraph::new(name),
        }
    }

    /// Current `graph_path`, `None` when unset.
    pub async fn graph_path(&mut self) -> Result<Option<String>> {
        let path: Option<String> = self
            .query(&ddl::show_graph_path())
            .await?
            .first()
            .map(|row| row.get_opt::<String>(0))
            .transpose()?
            .flatten();
        Ok(path.filter(|p| !p.is_empty()))
    }

    pub async fn set_graph_path(&mut self, name: &str) -> Result<()> {
        self.execute(&ddl::set_graph_path(name)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------------

    pub async fn create_label(&mut self, kind: LabelKind, name: &str, opts: &LabelOptions) -> Result<()> {
        self.execute(&ddl::create_label(kind, name, opts)).await?;
        Ok(())
    }

    pub async fn create_vlabel(&mut self, name: &str, opts: &LabelOptions) -> Result<()> {
        self.create_label(LabelKind::Vertex, name, opts).await
    }

    pub async fn create_elabel(&mut self, name: &str, opts: &LabelOptions) -> Result<()> {
        self.create_label(LabelKind::Edge, name, opts).await
    }

    pub async fn drop_label(&mut self, kind: LabelKind, name: &str, if_exists: bool, cascade: bool) -> Result<()> {
        self.execute(&ddl::drop_label(kind, name, if_exists, cascade)).await?;
        Ok(())
    }

    pub async fn drop_vlabel(&mut self, name: &str, if_exists: bool, cascade: bool) -> Result<()> {
        self.drop_label(LabelKind::Vertex, name, if_exists, cascade).await
    }

    pub async fn drop_elabel(&mut self, name: &str, if_exists: bool, cascade: bool) -> Result<()> {
        self.drop_label(LabelKind::Edge, name, if_exists, cascade).await
    }

    pub fn alter_label(&mut self, kind: LabelKind, name: &str) -> AlterLabelCommand<'_, C> {
        AlterLabelCommand {
            cursor: self,
            kind,
            name: name.to_string(),
            if_exists: false,
        }
    }

    pub fn alter_vlabel(&mut self, name: &str) -> AlterLabelCommand<'_, C> {
        self.alter_label(LabelKind::Vertex, name)
    }

    pub fn alter_elabel(&mut self, name: &str) -> AlterLabelCommand<'_, C> {
        self.alter_label(LabelKind::Edge, name)
    }

    // ------------------------------------------------------------------------
    // Indexes and constraints
    // ------------------------------------------------------------------------

    pub async fn create_property_index(&mut self, index: &PropertyIndex) -> Result<()> {
        let command = ddl::create_property_index(index)?;
        self.execute(&command).await?;
        Ok(())
    }

    pub async fn drop_property_index(&mut self, name: &str, if_exists: bool, cascade: bool) -> Result<()> {
        self.execute(&ddl::drop_property_index(name, if_exists, cascade)).await?;
        Ok(())
    }

    pub async fn create_unique_constraint(&mut self, name: &str, label: &str, field_expr: &str) -> Result<()> {
        self.execute(&ddl::create_unique_constraint(name, label, field_expr)).await?;
        Ok(())
    }

    pub async fn create_check_constraint(&mut self, name: &str, label: &str, check_expr: &str) -> Result<()> {
        self.execute(&ddl::create_check_constraint(name, label, check_expr)).await?;
        Ok(())
    }

    pub async fn drop_constraint(&mut self, name: &str, label: &str) -> Result<()> {
        self.execute(&ddl::drop_constraint(name, label)).await?;
        Ok(())
    }

    /// `CREATE (source)-[:elabel]->(target)`
    pub async fn create_path(&mut self, source: &PatternFilter, elabel: &str, target: &PatternFilter) -> Result<()> {
        self.execute(&cypher::create_path(source, elabel, target)).await?;
        Ok(())
    }
}

/// Pending `ALTER GRAPH`.
pub struct AlterGraphCommand<'a, C> {
    cursor: &'a mut Cursor<C>,
    builder: AlterGraph,
}

impl<C: Connection> AlterGraphCommand<'_, C> {
    pub async fn rename(self, new_name: &str) -> Result<()> {
        self.cursor.execute(&self.builder.rename(new_name)).await?;
        Ok(())
    }

    pub async fn owner_to(self, new_owner: &str) -> Result<()> {
        self.cursor.execute(&self.builder.owner_to(new_owner)).await?;
        Ok(())
    }
}

/// Pending `ALTER VLABEL` / `ALTER ELABEL`.
pub struct AlterLabelCommand<'a, C> {
    cursor: &'a mut Cursor<C>,
    kind: LabelKind,
    name: String,
    if_exists: bool,
}

impl<C: Connection> AlterLabelCommand<'_, C> {
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    async fn run(self, action: impl FnOnce(&AlterLabel) -> String) -> Result<()> {
        let builder = AlterLabel::new(self.kind, &self.name, self.if_exists);
        self.cursor.execute(&action(&builder)).await?;
        Ok(())
    }

    pub async fn rename(self, new_name: &str) -> Result<()> {
        self.run(|b| b.rename(new_name)).await
    }

    pub async fn owner_to(self, new_owner: &str) -> Result<()> {
        self.run(|b| b.owner_to(new_owner)).await
    }

    pub async fn set_storage(self, mode: StorageMode) -> Result<()> {
        self.run(|b| b.set_storage(mode)).await
    }

    pub async fn set_tablespace(self, tablespace: &str) -> Result<()> {
        self.run(|b| b.set_tablespace(tablespace)).await
    }

    pub async fn cluster_on(self, index_name: &str) -> Result<()> {
        self.run(|b| b.cluster_on(index_name)).await
    }

    pub async fn set_without_cluster(self) -> Result<()> {
        self.run(|b| b.set_without_cluster()).await
    }

    pub async fn set_logged(self) -> Result<()> {
        self.run(|b| b.set_logged()).await
    }

    pub async fn set_unlogged(self) -> Result<()> {
        self.run(|b| b.set_unlogged()).await
    }

    pub async fn inherit(self, parent: &str) -> Result<()> {
        self.run(|b| b.inherit(parent)).await
    }

    pub async fn no_inherit(self, parent: &str) -> Result<()> {
        self.run(|b| b.no_inherit(parent)).await
    }

    pub async fn disable_index(self) -> Result<()> {
        self.run(|b| b.disable_index()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::ScriptedConnection;
    use agens_core::ddl::{IndexElement, NullsOrder};

    fn cursor() -> (Cursor<ScriptedConnection>, ScriptedConnection) {
        let conn = ScriptedConnection::new();
        (Cursor::new(conn.clone()), conn)
    }

    #[tokio::test]
    async fn test_execute_terminates_and_records() {
        let (mut cur, conn) = cursor();
        cur.execute("MATCH (v) RETURN v").await.unwrap();
        cur.execute("SET graph_path = g;  ").await.unwrap();

        assert_eq!(conn.sent(), vec!["MATCH (v) RETURN v;", "SET graph_path = g;"]);
        assert_eq!(cur.history().len(), 2);
        assert_eq!(cur.last_query(), Some("SET graph_path = g;"));
        cur.clear_history();
        assert!(cur.history().is_empty());
        assert_eq!(cur.last_query(), None);
    }

    #[tokio::test]
    async fn test_history_is_per_cursor() {
        let (mut a, _) = cursor();
        let (mut b, _) = cursor();
        a.execute("BEGIN").await.unwrap();
        b.execute("COMMIT").await.unwrap();
        b.execute("BEGIN").await.unwrap();
        assert_eq!(a.history().len(), 1);
        assert_eq!(b.history().len(), 2);
    }

    #[tokio::test]
    async fn test_history_limit_drops_oldest() {
        let (cur, _) = cursor();
        let mut cur = cur.history_limit(Some(2));
        for n in 1..=3 {
            cur.execute(&format!("MATCH (v) RETURN {}", n)).await.unwrap();
        }
        let kept: Vec<&str> = cur.history().iter().map(|h| h.command.as_str()).collect();
        assert_eq!(kept, vec!["MATCH (v) RETURN 2;", "MATCH (v) RETURN 3;"]);

        cur.set_history_limit(Some(1));
        assert_eq!(cur.history().len(), 1);
        assert_eq!(cur.last_query(), Some("MATCH (v) RETURN 3;"));
    }

    #[tokio::test]
    async fn test_history_limit_zero_disables_recording() {
        let (cur, conn) = cursor();
        let mut cur = cur.history_limit(Some(0));
        cur.execute("BEGIN").await.unwrap();
        assert!(cur.history().is_empty());
        assert_eq!(conn.sent(), vec!["BEGIN;"]);

        let (cur, _) = cursor();
        let mut cur = cur.history_limit(None);
        for _ in 0..(DEFAULT_HISTORY_LIMIT + 5) {
            cur.execute("BEGIN").await.unwrap();
        }
        assert_eq!(cur.history().len(), DEFAULT_HISTORY_LIMIT + 5);
    }

    #[tokio::test]
    async fn test_failed_command_is_still_recorded() {
        let (mut cur, conn) = cursor();
        conn.push_error("syntax error");
        let err = cur.execute("CREATE GRAPH").await.unwrap_err();
        assert!(err.to_string().contains("CREATE GRAPH;"));
        assert_eq!(cur.history().len(), 1);
    }

    #[tokio::test]
    async fn test_query_helpers() {
        let (mut cur, conn) = cursor();
        conn.push_scalar("42").push_empty();
        assert_eq!(cur.query_scalar::<i64>("MATCH (v) RETURN count(v)").await.unwrap(), 42);
        assert!(cur.query_one("MATCH (v) RETURN v").await.is_err());
    }

    #[tokio::test]
    async fn test_graph_path() {
        let (mut cur, conn) = cursor();
        conn.push_rows(&["graph_path"], vec![vec![Some("network")]])
            .push_rows(&["graph_path"], vec![vec![Some("")]]);
        assert_eq!(cur.graph_path().await.unwrap().as_deref(), Some("network"));
        assert_eq!(cur.graph_path().await.unwrap(), None);
        assert_eq!(conn.sent()[0], "SHOW graph_path;");
    }

    #[tokio::test]
    async fn test_ddl_wrappers() {
        let (mut cur, conn) = cursor();
        cur.create_graph("g", true, Some("alice")).await.unwrap();
        cur.alter_graph("g").rename("h").await.unwrap();
        cur.create_vlabel("person", &LabelOptions::new().if_not_exists()).await.unwrap();
        cur.drop_elabel("knows", true, false).await.unwrap();
        cur.alter_vlabel("person").if_exists().set_storage(StorageMode::Main).await.unwrap();
        cur.alter_elabel("knows").no_inherit("rel").await.unwrap();
        cur.create_unique_constraint("uniq_name", "person", "name").await.unwrap();
        cur.drop_graph("h", true).await.unwrap();

        assert_eq!(
            conn.sent(),
            vec![
                "CREATE GRAPH IF NOT EXISTS g AUTHORIZATION alice;",
                "ALTER GRAPH g RENAME TO h;",
                "CREATE VLABEL IF NOT EXISTS person;",
                "DROP ELABEL IF EXISTS knows;",
                "ALTER VLABEL IF EXISTS person SET STORAGE MAIN;",
                "ALTER ELABEL knows NO INHERIT rel;",
                "CREATE CONSTRAINT uniq_name ON person ASSERT name IS UNIQUE;",
                "DROP GRAPH IF EXISTS h CASCADE;",
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_property_index_is_not_sent() {
        let (mut cur, conn) = cursor();
        let index = PropertyIndex::on("person").if_not_exists();
        assert!(cur.create_property_index(&index).await.is_err());
        assert!(conn.sent().is_empty());

        let index = PropertyIndex::on("person")
            .name("person_name")
            .element(IndexElement::property("name").nulls(NullsOrder::Last));
        cur.create_property_index(&index).await.unwrap();
        assert_eq!(conn.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transactions() {
        let (mut cur, conn) = cursor();
        cur.begin().await.unwrap();
        cur.rollback().await.unwrap();
        cur.commit().await.unwrap();
        assert_eq!(conn.sent(), vec!["BEGIN;", "ROLLBACK;", "COMMIT;"]);
    }
}
