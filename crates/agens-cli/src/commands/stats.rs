//! Graph statistics.

use anyhow::Result;
use colored::Colorize;

use agens_core::ddl::LabelKind;
use agens_graph::{Connection, Graph};

use super::label::label_rows;
use super::Settings;
use crate::output;

/// Entity totals and per-label counts of one graph.
#[derive(Debug, PartialEq)]
struct GraphStats {
    vertices: u64,
    edges: u64,
    vlabels: Vec<(String, Option<u64>)>,
    elabels: Vec<(String, Option<u64>)>,
}

async fn gather<C: Connection>(graph: &mut Graph<C>) -> Result<GraphStats> {
    Ok(GraphStats {
        vertices: graph.nv().await?,
        edges: graph.ne().await?,
        vlabels: label_rows(graph, LabelKind::Vertex, true).await?,
        elabels: label_rows(graph, LabelKind::Edge, true).await?,
    })
}

pub async fn execute(settings: &Settings) -> Result<()> {
    let mut graph = settings.existing_graph().await?;
    let stats = gather(&mut graph).await?;

    println!("{} {}", "Graph".bold(), graph.name().cyan());
    println!("  oid:      {}", graph.graphid());
    println!("  vertices: {}", stats.vertices.to_string().green());
    println!("  edges:    {}", stats.edges.to_string().green());
    println!();

    output::print_labels(LabelKind::Vertex, &stats.vlabels);
    println!();
    output::print_labels(LabelKind::Edge, &stats.elabels);

    graph.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use agens_core::GraphOptions;
    use agens_graph::connection::testing::ScriptedConnection;

    #[tokio::test]
    async fn test_gather_counts_every_label() {
        let conn = ScriptedConnection::new();
        conn.push_scalar("16384").push_empty();
        let mut graph = Graph::open_existing(conn.clone(), GraphOptions::new("trek")).await.unwrap();

        conn.push_scalar("5")
            .push_scalar("2")
            .push_rows(&["labname"], vec![vec![Some("person")], vec![Some("ship")]])
            .push_scalar("4")
            .push_scalar("1")
            .push_rows(&["labname"], vec![vec![Some("serves_on")]])
            .push_scalar("2");

        let stats = gather(&mut graph).await.unwrap();
        assert_eq!(
            stats,
            GraphStats {
                vertices: 5,
                edges: 2,
                vlabels: vec![("person".to_string(), Some(4)), ("ship".to_string(), Some(1))],
                elabels: vec![("serves_on".to_string(), Some(2))],
            }
        );

        let sent = conn.sent();
        assert!(sent[2].starts_with("MATCH (v) RETURN count(v)"));
        assert!(sent[3].starts_with("MATCH ()-[e]->() RETURN count(e)"));
        assert!(sent[8].starts_with("MATCH ()-[e:serves_on]->() RETURN count(e)"));
    }

    #[tokio::test]
    async fn test_gather_on_empty_graph() {
        let conn = ScriptedConnection::new();
        conn.push_scalar("16384").push_empty();
        let mut graph = Graph::open_existing(conn.clone(), GraphOptions::new("trek")).await.unwrap();
        conn.push_scalar("0").push_scalar("0").push_empty().push_empty();

        let stats = gather(&mut graph).await.unwrap();
        assert_eq!(stats.vertices, 0);
        assert!(stats.vlabels.is_empty());
        assert!(stats.elabels.is_empty());
    }
}
